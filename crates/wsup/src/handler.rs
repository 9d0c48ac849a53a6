//! Application callbacks.

use crate::host::Connection;
use crate::socket::SocketCtx;

/// Shape of a delivered message chunk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MessageFlags {
    /// Binary frame rather than text.
    pub binary: bool,
    /// The message continues past this frame (FIN clear).
    pub more: bool,
    /// This frame continues an earlier one rather than starting a message.
    pub continuation: bool,
}

/// Per-socket application logic, chosen at handshake time.
///
/// All callbacks run synchronously on the host's single execution context,
/// so they must not block. Each receives a [`SocketCtx`] through which it
/// may send messages or initiate a close on its own socket.
pub trait SocketHandler<C: Connection> {
    /// The socket finished its handshake. Runs before the socket becomes
    /// visible to broadcasts, so an early broadcast cannot race the greeting
    /// sent from here.
    fn on_connect(&mut self, _ctx: &mut SocketCtx<'_, C>) {}

    /// A chunk of message payload arrived.
    ///
    /// Large or split deliveries surface as several calls carrying the same
    /// `flags`; `data` may be empty when a frame's payload has not arrived
    /// yet. `flags.more` tells whether the message continues past this
    /// frame, `flags.continuation` whether the frame itself continues an
    /// earlier one.
    fn on_receive(&mut self, _ctx: &mut SocketCtx<'_, C>, _data: &[u8], _flags: MessageFlags) {}

    /// The host drained this socket's outbound buffer.
    fn on_sent(&mut self, _ctx: &mut SocketCtx<'_, C>) {}

    /// The socket is going away. Last call for this socket; the transport
    /// may already be gone, so sends from here can fail.
    fn on_close(&mut self, _ctx: &mut SocketCtx<'_, C>) {}
}
