//! The seam between the protocol layer and the embedding HTTP server.
//!
//! The host owns the transport, its buffers, and HTTP parsing. This module
//! defines what the protocol layer needs from it: one [`Connection`] value per
//! upgraded connection, moved into the layer at handshake and dropped at
//! teardown.

use thiserror::Error;

/// The host's outbound buffer cannot take the write.
///
/// The frame being written may have been partially queued; the host decides
/// whether to drop the connection or retry after draining.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("outbound buffer overflow")]
pub struct SendError;

/// What [`Server::on_bytes`](crate::Server::on_bytes) tells the host after a
/// delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Keep delivering bytes for this connection.
    More,
    /// The socket is gone; deliver nothing further.
    Done,
}

/// Per-connection services the embedding HTTP server provides.
///
/// All methods are called from the host's own callbacks, in the host's single
/// execution context; implementations must not block.
///
/// `send` queues into the connection's outbound buffer. The protocol layer
/// flushes explicitly after application sends and close frames; control
/// replies emitted while decoding are left queued, and the host is expected to
/// flush them when its receive callback returns.
pub trait Connection {
    /// Queue bytes for transmission. Returns the buffer capacity left after
    /// the write.
    fn send(&mut self, data: &[u8]) -> Result<usize, SendError>;

    /// Push queued output toward the transport.
    fn flush(&mut self);

    /// Look up a request header by name (case-insensitive).
    fn request_header(&self, name: &str) -> Option<&str>;

    /// Path of the request this connection was upgraded on.
    fn path(&self) -> &str;

    /// Begin the HTTP response with a status code.
    fn start_response(&mut self, status: u16);

    /// Emit one response header.
    fn header(&mut self, name: &str, value: &str);

    /// Finish the response header block.
    fn end_headers(&mut self);

    /// Switch the connection to raw streaming: no transfer encoding, frames
    /// go on the wire exactly as written.
    fn set_streaming(&mut self);
}
