//! Test doubles: a scriptable host connection, an event-recording handler,
//! and a client-side frame builder.

use std::cell::RefCell;
use std::rc::Rc;

use bytes::{BufMut, BytesMut};

use crate::handler::{MessageFlags, SocketHandler};
use crate::host::{Connection, SendError};
use crate::socket::SocketCtx;

/// Everything a connection wrote. Kept behind an `Rc` so tests can inspect
/// the wire after the connection has been moved into the server.
#[derive(Default)]
pub(crate) struct HostLog {
    pub(crate) sent: Vec<u8>,
    pub(crate) flushes: usize,
    pub(crate) status: Option<u16>,
    pub(crate) headers: Vec<(String, String)>,
    pub(crate) headers_ended: bool,
    pub(crate) streaming: bool,
}

impl HostLog {
    pub(crate) fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }
}

pub(crate) struct MockConn {
    path: String,
    request_headers: Vec<(String, String)>,
    pub(crate) log: Rc<RefCell<HostLog>>,
    fail_sends: bool,
    capacity: usize,
    /// Tag pushed to a shared journal on every send, for ordering tests.
    journal: Option<(&'static str, Rc<RefCell<Vec<&'static str>>>)>,
}

impl MockConn {
    pub(crate) fn new(path: &str) -> Self {
        Self {
            path: path.to_owned(),
            request_headers: Vec::new(),
            log: Rc::new(RefCell::new(HostLog::default())),
            fail_sends: false,
            capacity: 4096,
            journal: None,
        }
    }

    /// A connection carrying a well-formed upgrade request.
    pub(crate) fn upgrade(path: &str, key: &str) -> Self {
        Self::new(path)
            .with_header("Upgrade", "websocket")
            .with_header("Sec-WebSocket-Key", key)
    }

    pub(crate) fn with_header(mut self, name: &str, value: &str) -> Self {
        self.request_headers
            .push((name.to_owned(), value.to_owned()));
        self
    }

    pub(crate) fn failing_sends(mut self) -> Self {
        self.fail_sends = true;
        self
    }

    pub(crate) fn journaled(
        mut self,
        tag: &'static str,
        journal: Rc<RefCell<Vec<&'static str>>>,
    ) -> Self {
        self.journal = Some((tag, journal));
        self
    }
}

impl Connection for MockConn {
    fn send(&mut self, data: &[u8]) -> Result<usize, SendError> {
        if self.fail_sends {
            return Err(SendError);
        }
        if let Some((tag, journal)) = &self.journal {
            journal.borrow_mut().push(tag);
        }
        let mut log = self.log.borrow_mut();
        log.sent.extend_from_slice(data);
        Ok(self.capacity.saturating_sub(log.sent.len()))
    }

    fn flush(&mut self) {
        self.log.borrow_mut().flushes += 1;
    }

    fn request_header(&self, name: &str) -> Option<&str> {
        self.request_headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    fn path(&self) -> &str {
        &self.path
    }

    fn start_response(&mut self, status: u16) {
        self.log.borrow_mut().status = Some(status);
    }

    fn header(&mut self, name: &str, value: &str) {
        self.log
            .borrow_mut()
            .headers
            .push((name.to_owned(), value.to_owned()));
    }

    fn end_headers(&mut self) {
        self.log.borrow_mut().headers_ended = true;
    }

    fn set_streaming(&mut self) {
        self.log.borrow_mut().streaming = true;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Event {
    Connect,
    Receive { data: Vec<u8>, flags: MessageFlags },
    Sent,
    Close,
}

/// Handler that records every callback it sees.
pub(crate) struct Recorder {
    events: Rc<RefCell<Vec<Event>>>,
}

impl Recorder {
    pub(crate) fn new() -> (Self, Rc<RefCell<Vec<Event>>>) {
        let events = Rc::new(RefCell::new(Vec::new()));
        (
            Self {
                events: events.clone(),
            },
            events,
        )
    }
}

impl SocketHandler<MockConn> for Recorder {
    fn on_connect(&mut self, _ctx: &mut SocketCtx<'_, MockConn>) {
        self.events.borrow_mut().push(Event::Connect);
    }

    fn on_receive(&mut self, _ctx: &mut SocketCtx<'_, MockConn>, data: &[u8], flags: MessageFlags) {
        self.events.borrow_mut().push(Event::Receive {
            data: data.to_vec(),
            flags,
        });
    }

    fn on_sent(&mut self, _ctx: &mut SocketCtx<'_, MockConn>) {
        self.events.borrow_mut().push(Event::Sent);
    }

    fn on_close(&mut self, _ctx: &mut SocketCtx<'_, MockConn>) {
        self.events.borrow_mut().push(Event::Close);
    }
}

/// Build a frame the way a client would put it on the wire.
pub(crate) fn client_frame(opcode: u8, fin: bool, mask: Option<[u8; 4]>, payload: &[u8]) -> Vec<u8> {
    let mut frame = BytesMut::new();
    frame.put_u8(if fin { 0x80 | opcode } else { opcode });
    let mask_bit = if mask.is_some() { 0x80 } else { 0x00 };
    if payload.len() > 65535 {
        frame.put_u8(mask_bit | 127);
        frame.put_u64(payload.len() as u64);
    } else if payload.len() > 125 {
        frame.put_u8(mask_bit | 126);
        frame.put_u16(payload.len() as u16);
    } else {
        frame.put_u8(mask_bit | payload.len() as u8);
    }
    match mask {
        Some(key) => {
            frame.put_slice(&key);
            for (i, &byte) in payload.iter().enumerate() {
                frame.put_u8(byte ^ key[i & 3]);
            }
        }
        None => frame.put_slice(payload),
    }
    frame.to_vec()
}
