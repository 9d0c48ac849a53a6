//! Upgrade negotiation.

use sha1::{Digest, Sha1};

use crate::host::Connection;
use crate::{Error, Result};

/// Validate a client's upgrade request and compute the accept token for it.
///
/// Checks what the protocol requires of an embedded server and nothing more:
/// an `Upgrade: websocket` header (any case) and a `Sec-WebSocket-Key`.
pub(crate) fn validate<C: Connection>(conn: &C) -> Result<String> {
    let upgrade = conn
        .request_header("Upgrade")
        .ok_or(Error::InvalidUpgradeHeader)?;
    if !upgrade.eq_ignore_ascii_case("websocket") {
        return Err(Error::InvalidUpgradeHeader);
    }
    let key = conn
        .request_header("Sec-WebSocket-Key")
        .ok_or(Error::MissingSecWebSocketKey)?;
    Ok(accept_key(key.as_bytes()))
}

pub(crate) fn accept_key(key: &[u8]) -> String {
    use base64::prelude::*;
    let mut sha1 = Sha1::new();
    sha1.update(key);
    sha1.update(b"258EAFA5-E914-47DA-95CA-C5AB0DC85B11"); // magic string
    let result = sha1.finalize();
    BASE64_STANDARD.encode(&result[..])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockConn;

    #[test]
    fn accept_key_known_answer() {
        assert_eq!(
            accept_key(b"dGhlIHNhbXBsZSBub25jZQ=="),
            "s3pPLMBiTxaQ9kYGzzhZRbK+xOo="
        );
    }

    #[test]
    fn accepts_case_insensitive_upgrade() {
        let conn = MockConn::new("/ws")
            .with_header("Upgrade", "WebSocket")
            .with_header("Sec-WebSocket-Key", "x");
        assert!(validate(&conn).is_ok());
    }

    #[test]
    fn rejects_non_websocket_upgrade() {
        let conn = MockConn::new("/ws")
            .with_header("Upgrade", "h2c")
            .with_header("Sec-WebSocket-Key", "x");
        assert!(matches!(validate(&conn), Err(Error::InvalidUpgradeHeader)));
    }

    #[test]
    fn requires_upgrade_header() {
        let conn = MockConn::new("/ws");
        assert!(matches!(validate(&conn), Err(Error::InvalidUpgradeHeader)));
    }

    #[test]
    fn requires_key() {
        let conn = MockConn::new("/ws").with_header("Upgrade", "websocket");
        assert!(matches!(validate(&conn), Err(Error::MissingSecWebSocketKey)));
    }
}
