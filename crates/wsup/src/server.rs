//! Server state: handshake entry, the byte pump, and socket addressing.

use tracing::{debug, warn};

use crate::close::CloseCode;
use crate::handler::{MessageFlags, SocketHandler};
use crate::handshake;
use crate::host::{Connection, Flow};
use crate::registry::{Registry, SocketId};
use crate::socket::Socket;
use crate::{Error, Result};

/// All live sockets and the operations the host drives them with.
///
/// One value per embedding server, threaded through every host callback by
/// `&mut`. No locks, no interior mutability; every operation runs to
/// completion before the next one starts.
pub struct Server<C: Connection> {
    registry: Registry<Socket<C>>,
}

impl<C: Connection> Default for Server<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Connection> Server<C> {
    pub fn new() -> Self {
        Self {
            registry: Registry::new(),
        }
    }

    /// Negotiate the upgrade on a fresh HTTP connection.
    ///
    /// On success the 101 response is written through `conn`, the handler's
    /// `on_connect` runs (before the socket is visible to broadcasts), and
    /// the socket joins the registry. Deliveries for the connection then go
    /// to [`Server::on_bytes`] under the returned id.
    ///
    /// On failure a plain 500 response is written and the error returned;
    /// the connection was never a socket and no id exists for it.
    pub fn handshake(
        &mut self,
        mut conn: C,
        handler: Box<dyn SocketHandler<C>>,
    ) -> Result<SocketId> {
        let accept = match handshake::validate(&conn) {
            Ok(accept) => accept,
            Err(err) => {
                debug!(%err, path = conn.path(), "upgrade rejected");
                conn.start_response(500);
                conn.end_headers();
                return Err(err);
            }
        };

        conn.set_streaming();
        conn.start_response(101);
        conn.header("Upgrade", "websocket");
        conn.header("Connection", "upgrade");
        conn.header("Sec-WebSocket-Accept", &accept);
        conn.end_headers();

        // The connect callback runs before the socket is registered, so the
        // socket is built inside the insert with its final id.
        let id = self.registry.insert_with(|id| {
            let mut socket = Socket::new(conn, handler, id);
            socket.connect();
            socket
        });
        debug!(?id, "socket open");
        Ok(id)
    }

    /// Feed one delivery of received bytes to a socket.
    ///
    /// `data` is the host's receive buffer for this delivery; masked
    /// payloads are unmasked in place. [`Flow::Done`] means the socket was
    /// torn down — close handshake completed, protocol violation, or the id
    /// was already dead — and nothing further may be delivered under it.
    pub fn on_bytes(&mut self, id: SocketId, data: &mut [u8]) -> Flow {
        let Some(socket) = self.registry.get_mut(id) else {
            debug!(?id, "bytes for unknown socket");
            return Flow::Done;
        };
        match socket.feed(data) {
            Flow::More => Flow::More,
            Flow::Done => {
                self.teardown(id);
                Flow::Done
            }
        }
    }

    /// The host drained a socket's outbound buffer; lets the handler top it
    /// up. [`Flow::Done`] only when the id is dead.
    pub fn sent(&mut self, id: SocketId) -> Flow {
        let Some(socket) = self.registry.get_mut(id) else {
            return Flow::Done;
        };
        socket.sent();
        Flow::More
    }

    /// The transport dropped out from under a socket. Runs the handler's
    /// `on_close` and forgets the socket; nothing is written.
    pub fn connection_closed(&mut self, id: SocketId) {
        debug!(?id, "transport closed");
        self.teardown(id);
    }

    /// Send one message frame on a socket. Returns the connection's
    /// remaining outbound buffer space.
    pub fn send(&mut self, id: SocketId, payload: &[u8], flags: MessageFlags) -> Result<usize> {
        let socket = self.registry.get_mut(id).ok_or(Error::UnknownSocket)?;
        socket.send(payload, flags)
    }

    /// Start a graceful close: write a close frame carrying `code` and flush
    /// it. The socket stays registered until the peer's close reply or the
    /// transport drop arrives; repeat calls write nothing.
    pub fn close(&mut self, id: SocketId, code: CloseCode) -> Result<()> {
        let socket = self.registry.get_mut(id).ok_or(Error::UnknownSocket)?;
        socket.close(code)
    }

    /// Send one message to every socket opened on `url`, oldest first.
    ///
    /// Returns the number of sockets addressed. A socket whose connection
    /// rejects the write is logged and still counted; its close runs through
    /// the normal teardown paths, not through here.
    pub fn broadcast(&mut self, url: &str, payload: &[u8], flags: MessageFlags) -> usize {
        let mut count = 0;
        for id in self.registry.snapshot() {
            let Some(socket) = self.registry.get_mut(id) else {
                continue;
            };
            if socket.path() != url {
                continue;
            }
            if let Err(err) = socket.send(payload, flags) {
                warn!(?id, %err, "broadcast send failed");
            }
            count += 1;
        }
        debug!(url, count, "broadcast");
        count
    }

    /// Ids of the live sockets opened on `url`, oldest first.
    pub fn sockets_at(&self, url: &str) -> Vec<SocketId> {
        self.registry
            .snapshot()
            .into_iter()
            .filter(|id| {
                self.registry
                    .get(*id)
                    .is_some_and(|socket| socket.path() == url)
            })
            .collect()
    }

    pub fn socket_count(&self) -> usize {
        self.registry.len()
    }

    fn teardown(&mut self, id: SocketId) {
        let Some(socket) = self.registry.get_mut(id) else {
            return;
        };
        socket.close_notify();
        self.registry.remove(id);
        debug!(?id, "socket gone");
    }
}
