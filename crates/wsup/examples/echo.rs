//! Runs a complete socket session against an in-memory host connection.
//!
//! This example shows the full embedding sequence:
//! - Negotiate the upgrade and install a handler
//! - Feed received bytes through the server, including split deliveries
//! - Answer pings and walk through the close handshake
//!
//! Everything here is synchronous; a real host would call the same methods
//! from its receive and disconnect callbacks.

use wsup::{Connection, Flow, MessageFlags, SendError, Server, SocketCtx, SocketHandler};

/// Stand-in for the embedding server's per-connection state.
struct DemoConn {
    path: &'static str,
    headers: Vec<(&'static str, &'static str)>,
    out: Vec<u8>,
}

impl Connection for DemoConn {
    fn send(&mut self, data: &[u8]) -> Result<usize, SendError> {
        self.out.extend_from_slice(data);
        Ok(4096usize.saturating_sub(self.out.len()))
    }

    fn flush(&mut self) {
        if !self.out.is_empty() {
            tracing::info!(frame = ?self.out, "wire out");
            self.out.clear();
        }
    }

    fn request_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| *v)
    }

    fn path(&self) -> &str {
        self.path
    }

    fn start_response(&mut self, status: u16) {
        tracing::info!(status, "response");
    }

    fn header(&mut self, name: &str, value: &str) {
        tracing::info!(name, value, "response header");
    }

    fn end_headers(&mut self) {}

    fn set_streaming(&mut self) {}
}

/// Greets on connect and echoes every message back.
struct Echo;

impl SocketHandler<DemoConn> for Echo {
    fn on_connect(&mut self, ctx: &mut SocketCtx<'_, DemoConn>) {
        tracing::info!(path = ctx.path(), "socket open");
        let _ = ctx.send(b"welcome", MessageFlags::default());
    }

    fn on_receive(&mut self, ctx: &mut SocketCtx<'_, DemoConn>, data: &[u8], flags: MessageFlags) {
        tracing::info!(data = %String::from_utf8_lossy(data), ?flags, "message in");
        if !data.is_empty() {
            let _ = ctx.send(data, flags);
        }
    }

    fn on_close(&mut self, ctx: &mut SocketCtx<'_, DemoConn>) {
        tracing::info!(path = ctx.path(), "socket closed");
    }
}

/// Mask a payload the way a client does before it hits the wire.
fn masked(opcode: u8, key: [u8; 4], payload: &[u8]) -> Vec<u8> {
    let mut frame = vec![0x80 | opcode, 0x80 | payload.len() as u8];
    frame.extend_from_slice(&key);
    frame.extend(
        payload
            .iter()
            .enumerate()
            .map(|(i, &byte)| byte ^ key[i & 3]),
    );
    frame
}

fn main() -> wsup::Result<()> {
    tracing_subscriber::fmt::init();

    let conn = DemoConn {
        path: "/echo",
        headers: vec![
            ("Upgrade", "websocket"),
            ("Sec-WebSocket-Key", "dGhlIHNhbXBsZSBub25jZQ=="),
        ],
        out: Vec::new(),
    };

    let mut server = Server::new();
    let id = server.handshake(conn, Box::new(Echo))?;

    let key = [0x37, 0xfa, 0x21, 0x3d];

    // A text message, delivered in one piece.
    let mut hello = masked(0x1, key, b"Hello");
    assert_eq!(server.on_bytes(id, &mut hello), Flow::More);

    // The same message again, this time trickling in byte by byte.
    for byte in masked(0x1, key, b"Hello") {
        assert_eq!(server.on_bytes(id, &mut [byte]), Flow::More);
    }

    // A ping; the pong is queued and would ride the host's next flush.
    let mut ping = masked(0x9, key, b"keepalive");
    assert_eq!(server.on_bytes(id, &mut ping), Flow::More);

    // Push a frame to everyone on the path.
    server.broadcast("/echo", b"tick", MessageFlags::default());

    // The peer hangs up.
    let mut close = masked(0x8, key, &1001u16.to_be_bytes());
    assert_eq!(server.on_bytes(id, &mut close), Flow::Done);
    assert_eq!(server.socket_count(), 0);

    Ok(())
}
