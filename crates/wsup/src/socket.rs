//! Per-socket state and the receive driver.
//!
//! A [`Socket`] owns the host connection, the application handler chosen at
//! handshake time, and the frame decoder. [`Socket::feed`] is the heart of
//! the crate: it walks one delivery of bytes, advancing the decoder through
//! header bytes one at a time and consuming payload in bulk runs, and reacts
//! to each completed run — answering pings, echoing closes, or handing data
//! to the handler.

use tracing::{debug, warn};

use crate::Result;
use crate::close::CloseCode;
use crate::codec::{Decoder, Stage};
use crate::frame::{FrameHead, OpCode};
use crate::handler::{MessageFlags, SocketHandler};
use crate::host::{Connection, Flow};
use crate::registry::SocketId;

/// Control frames carry at most this much payload.
const MAX_CONTROL_PAYLOAD: u64 = 125;

pub(crate) struct Socket<C: Connection> {
    conn: C,
    handler: Box<dyn SocketHandler<C>>,
    decoder: Decoder,
    closed_here: bool,
    /// Request path captured at handshake, used for broadcast filtering.
    path: String,
    id: SocketId,
}

impl<C: Connection> Socket<C> {
    pub(crate) fn new(conn: C, handler: Box<dyn SocketHandler<C>>, id: SocketId) -> Self {
        let path = conn.path().to_owned();
        Self {
            conn,
            handler,
            decoder: Decoder::new(),
            closed_here: false,
            path,
            id,
        }
    }

    pub(crate) fn path(&self) -> &str {
        &self.path
    }

    pub(crate) fn send(&mut self, payload: &[u8], flags: MessageFlags) -> Result<usize> {
        send_message(&mut self.conn, payload, flags)
    }

    pub(crate) fn close(&mut self, code: CloseCode) -> Result<()> {
        send_close(&mut self.conn, &mut self.closed_here, code)
    }

    pub(crate) fn connect(&mut self) {
        let (handler, mut ctx) = self.split();
        handler.on_connect(&mut ctx);
    }

    pub(crate) fn sent(&mut self) {
        let (handler, mut ctx) = self.split();
        handler.on_sent(&mut ctx);
    }

    pub(crate) fn close_notify(&mut self) {
        let (handler, mut ctx) = self.split();
        handler.on_close(&mut ctx);
    }

    fn split(&mut self) -> (&mut dyn SocketHandler<C>, SocketCtx<'_, C>) {
        let Self {
            conn,
            handler,
            closed_here,
            path,
            id,
            ..
        } = self;
        (
            handler.as_mut(),
            SocketCtx {
                conn,
                closed_here,
                path: path.as_str(),
                id: *id,
            },
        )
    }

    /// Consume one delivery of received bytes.
    ///
    /// Header bytes advance the decoder a byte at a time; once a header is
    /// complete the rest of the delivery is taken in one run per frame,
    /// unmasked in place, and dispatched. A run may be empty when the header
    /// finished on the delivery's last byte; dispatch still happens so that
    /// ping replies and receive callbacks are not delayed until more bytes
    /// arrive.
    ///
    /// Returns [`Flow::Done`] when the socket is finished — a close frame
    /// arrived or the peer broke protocol — and the caller must tear it
    /// down. No more bytes may be fed after that.
    pub(crate) fn feed(&mut self, data: &mut [u8]) -> Flow {
        let Self {
            conn,
            handler,
            decoder,
            closed_here,
            path,
            id,
        } = self;

        let mut at = 0;
        while at < data.len() {
            if decoder.stage() != Stage::Payload {
                let stage = decoder.step(data[at]);
                at += 1;
                if stage != Stage::Payload {
                    continue;
                }
            }

            let run = decoder.begin_run(data.len() - at);
            decoder.unmask(&mut data[at..at + run]);
            let payload = &data[at..at + run];
            let first = decoder.first_chunk();

            match decoder.opcode() {
                Ok(OpCode::Ping) => {
                    if decoder.remaining() > MAX_CONTROL_PAYLOAD {
                        warn!(len = decoder.remaining(), "oversized ping frame");
                        if let Err(err) = send_close(conn, closed_here, CloseCode::Protocol) {
                            debug!(%err, "failed to send close frame");
                        }
                        return Flow::Done;
                    }
                    // The pong header announces the full ping length up
                    // front; payload runs are echoed as they arrive. The
                    // host flushes once this delivery returns.
                    if first {
                        let head =
                            FrameHead::new(OpCode::Pong, true, decoder.remaining() as usize);
                        if let Err(err) = conn.send(head.as_bytes()) {
                            debug!(%err, "failed to send pong header");
                        }
                    }
                    if !payload.is_empty() {
                        if let Err(err) = conn.send(payload) {
                            debug!(%err, "failed to echo ping payload");
                        }
                    }
                }
                Ok(op @ (OpCode::Text | OpCode::Binary | OpCode::Continuation)) => {
                    if !decoder.masked() {
                        // Clients must mask; answer the violation with 1002.
                        warn!("unmasked data frame from client");
                        if let Err(err) = send_close(conn, closed_here, CloseCode::Protocol) {
                            debug!(%err, "failed to send close frame");
                        }
                        return Flow::Done;
                    }
                    let flags = MessageFlags {
                        binary: op == OpCode::Binary,
                        more: !decoder.fin(),
                        continuation: op == OpCode::Continuation,
                    };
                    let mut ctx = SocketCtx {
                        conn: &mut *conn,
                        closed_here: &mut *closed_here,
                        path: path.as_str(),
                        id: *id,
                    };
                    handler.on_receive(&mut ctx, payload, flags);
                }
                Ok(OpCode::Close) => {
                    let code = if payload.len() >= 2 {
                        CloseCode::from(u16::from_be_bytes([payload[0], payload[1]]))
                    } else {
                        CloseCode::Normal
                    };
                    debug!(?code, "received close frame");
                    if !*closed_here {
                        if let Err(err) = send_close(conn, closed_here, code) {
                            debug!(%err, "failed to echo close frame");
                        }
                    }
                    return Flow::Done;
                }
                Ok(OpCode::Pong) | Err(_) => {
                    // Nothing to do with these; drain the payload.
                    if first {
                        warn!(opcode = decoder.opcode_raw(), "unhandled opcode");
                    }
                }
            }

            decoder.finish_run(run);
            at += run;
        }
        Flow::More
    }
}

/// Capability handed to handler callbacks: send and close on the socket the
/// callback runs for, plus the socket's id and the request path it was
/// opened on.
pub struct SocketCtx<'a, C: Connection> {
    pub(crate) conn: &'a mut C,
    pub(crate) closed_here: &'a mut bool,
    pub(crate) path: &'a str,
    pub(crate) id: SocketId,
}

impl<C: Connection> SocketCtx<'_, C> {
    /// Handle of the socket this callback runs for. The same id the host got
    /// from [`Server::handshake`](crate::Server::handshake).
    pub fn id(&self) -> SocketId {
        self.id
    }

    /// Path of the HTTP request this socket was upgraded on.
    pub fn path(&self) -> &str {
        self.path
    }

    /// Send a message frame. Returns the connection's remaining outbound
    /// buffer space, so callers can pace themselves.
    pub fn send(&mut self, payload: &[u8], flags: MessageFlags) -> Result<usize> {
        send_message(self.conn, payload, flags)
    }

    /// Start a close for this socket. The first call wins; repeats are
    /// no-ops.
    pub fn close(&mut self, code: CloseCode) -> Result<()> {
        send_close(self.conn, self.closed_here, code)
    }
}

pub(crate) fn send_message<C: Connection>(
    conn: &mut C,
    payload: &[u8],
    flags: MessageFlags,
) -> Result<usize> {
    let opcode = if flags.continuation {
        OpCode::Continuation
    } else if flags.binary {
        OpCode::Binary
    } else {
        OpCode::Text
    };
    let head = FrameHead::new(opcode, !flags.more, payload.len());
    let mut space = conn.send(head.as_bytes())?;
    if !payload.is_empty() {
        space = conn.send(payload)?;
    }
    conn.flush();
    Ok(space)
}

pub(crate) fn send_close<C: Connection>(
    conn: &mut C,
    closed_here: &mut bool,
    code: CloseCode,
) -> Result<()> {
    if *closed_here {
        return Ok(());
    }
    *closed_here = true;
    let head = FrameHead::new(OpCode::Close, true, 2);
    conn.send(head.as_bytes())?;
    conn.send(&u16::from(code).to_be_bytes())?;
    conn.flush();
    Ok(())
}
