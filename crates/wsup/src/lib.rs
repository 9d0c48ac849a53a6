//! Server-side WebSocket protocol layer for callback-driven embedded HTTP
//! servers.
//!
//! `wsup` owns everything between "a client asked to upgrade" and "the socket
//! is gone": handshake negotiation, incremental frame decoding across
//! arbitrarily fragmented deliveries, in-place unmasking, ping/pong and close
//! handling, per-URL broadcast, and a registry of live sockets. It is sans-IO:
//! it never opens a socket, never blocks, and never spawns. The embedding
//! server hands it bytes and a [`Connection`] implementation; it hands back
//! frames through that same connection and events through a per-socket
//! [`SocketHandler`].
//!
//! The crate is built for hosts with a single cooperative execution context —
//! every operation runs to completion inside whichever host callback invoked
//! it. There are no locks and no interior mutability; the [`Server`] value is
//! threaded through every call by `&mut`.
//!
//! Key properties:
//!
//! - **Chunk tolerance**: a frame may arrive split at any byte boundary across
//!   any number of deliveries, including inside the header; decoding results
//!   are identical to single-delivery results.
//! - **Zero copy**: payloads are unmasked in place in the host's receive
//!   buffer and handed to the handler as slices of it.
//! - **Stable handles**: sockets are addressed by generational [`SocketId`]s,
//!   so a handle to a torn-down socket misses instead of aliasing a newer
//!   connection that reused its slot.
//!
//! # Example
//!
//! ```no_run
//! use wsup::{Connection, Flow, MessageFlags, SendError, Server, SocketCtx, SocketHandler};
//!
//! // The embedding server exposes one of these per connection.
//! struct HostConn {
//!     path: String,
//!     headers: Vec<(String, String)>,
//!     out: Vec<u8>,
//! }
//!
//! impl Connection for HostConn {
//!     fn send(&mut self, data: &[u8]) -> Result<usize, SendError> {
//!         self.out.extend_from_slice(data);
//!         Ok(2048usize.saturating_sub(self.out.len()))
//!     }
//!     fn flush(&mut self) {}
//!     fn request_header(&self, name: &str) -> Option<&str> {
//!         self.headers
//!             .iter()
//!             .find(|(n, _)| n.eq_ignore_ascii_case(name))
//!             .map(|(_, v)| v.as_str())
//!     }
//!     fn path(&self) -> &str {
//!         &self.path
//!     }
//!     fn start_response(&mut self, _status: u16) {}
//!     fn header(&mut self, _name: &str, _value: &str) {}
//!     fn end_headers(&mut self) {}
//!     fn set_streaming(&mut self) {}
//! }
//!
//! // Echo whatever the peer sends.
//! struct Echo;
//!
//! impl SocketHandler<HostConn> for Echo {
//!     fn on_receive(&mut self, ctx: &mut SocketCtx<'_, HostConn>, data: &[u8], flags: MessageFlags) {
//!         let _ = ctx.send(data, flags);
//!     }
//! }
//!
//! fn main() -> wsup::Result<()> {
//!     let conn = HostConn {
//!         path: "/echo".into(),
//!         headers: vec![
//!             ("Upgrade".into(), "websocket".into()),
//!             ("Sec-WebSocket-Key".into(), "dGhlIHNhbXBsZSBub25jZQ==".into()),
//!         ],
//!         out: Vec::new(),
//!     };
//!
//!     let mut server = Server::new();
//!     let id = server.handshake(conn, Box::new(Echo))?;
//!
//!     // Feed bytes as the host receives them; stop on `Done`.
//!     let mut delivery = [0x81, 0x85, 0x37, 0xfa, 0x21, 0x3d, 0x7f, 0x9f, 0x4d, 0x51, 0x58];
//!     match server.on_bytes(id, &mut delivery) {
//!         Flow::More => { /* keep the connection */ }
//!         Flow::Done => { /* socket torn down */ }
//!     }
//!     Ok(())
//! }
//! ```

mod close;
mod codec;
mod frame;
mod handler;
mod handshake;
mod host;
mod mask;
#[cfg(test)]
mod mock;
mod registry;
mod server;
mod socket;

pub use close::CloseCode;
pub use handler::{MessageFlags, SocketHandler};
pub use host::{Connection, Flow, SendError};
pub use registry::SocketId;
pub use server::Server;
pub use socket::SocketCtx;

use thiserror::Error;

/// Result type for protocol operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced to the embedding host.
///
/// Wire-level protocol violations are not in here: they are answered with
/// close code 1002 and teardown, and [`Server::on_bytes`] reports
/// [`Flow::Done`] instead of failing.
#[derive(Error, Debug)]
pub enum Error {
    /// Missing or invalid "Upgrade: websocket" header.
    #[error("Invalid upgrade header")]
    InvalidUpgradeHeader,

    /// The "Sec-WebSocket-Key" header is missing.
    #[error("Missing Sec-WebSocket-Key header")]
    MissingSecWebSocketKey,

    /// The operation addressed a socket that no longer exists.
    #[error("Unknown socket")]
    UnknownSocket,

    /// The host's outbound buffer rejected a write.
    #[error(transparent)]
    Send(#[from] SendError),
}
