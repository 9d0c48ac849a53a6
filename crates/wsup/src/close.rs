//! Close codes carried in close-frame payloads.

/// Status code sent or received in a close frame (RFC 6455 §7.4).
///
/// Converts losslessly to and from the wire `u16`, so echoing a peer's code
/// preserves it exactly even when it falls in a reserved range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseCode {
    /// 1000, normal closure.
    Normal,
    /// 1001, endpoint going away.
    Away,
    /// 1002, protocol error. Every violation this crate detects answers with it.
    Protocol,
    /// 1003, unacceptable data type.
    Unsupported,
    /// 1005, reserved: no status code was present.
    Status,
    /// 1006, reserved: abnormal closure without a close frame.
    Abnormal,
    /// 1007, payload inconsistent with the message type.
    Invalid,
    /// 1008, policy violation.
    Policy,
    /// 1009, message too big to process.
    Size,
    /// 1010, a required extension was not negotiated.
    Extension,
    /// 1011, unexpected server condition.
    Error,
    /// 1012, service is restarting.
    Restart,
    /// 1013, try again later.
    Again,
    /// 1015, reserved: TLS handshake failure.
    Tls,
    /// 1016..=2999, reserved for future protocol use.
    Reserved(u16),
    /// 3000..=3999, registered with IANA.
    Iana(u16),
    /// 4000..=4999, private use.
    Library(u16),
    /// Anything outside the defined ranges.
    Bad(u16),
}

impl From<u16> for CloseCode {
    fn from(code: u16) -> Self {
        match code {
            1000 => CloseCode::Normal,
            1001 => CloseCode::Away,
            1002 => CloseCode::Protocol,
            1003 => CloseCode::Unsupported,
            1005 => CloseCode::Status,
            1006 => CloseCode::Abnormal,
            1007 => CloseCode::Invalid,
            1008 => CloseCode::Policy,
            1009 => CloseCode::Size,
            1010 => CloseCode::Extension,
            1011 => CloseCode::Error,
            1012 => CloseCode::Restart,
            1013 => CloseCode::Again,
            1015 => CloseCode::Tls,
            1016..=2999 => CloseCode::Reserved(code),
            3000..=3999 => CloseCode::Iana(code),
            4000..=4999 => CloseCode::Library(code),
            _ => CloseCode::Bad(code),
        }
    }
}

impl From<CloseCode> for u16 {
    fn from(code: CloseCode) -> Self {
        match code {
            CloseCode::Normal => 1000,
            CloseCode::Away => 1001,
            CloseCode::Protocol => 1002,
            CloseCode::Unsupported => 1003,
            CloseCode::Status => 1005,
            CloseCode::Abnormal => 1006,
            CloseCode::Invalid => 1007,
            CloseCode::Policy => 1008,
            CloseCode::Size => 1009,
            CloseCode::Extension => 1010,
            CloseCode::Error => 1011,
            CloseCode::Restart => 1012,
            CloseCode::Again => 1013,
            CloseCode::Tls => 1015,
            CloseCode::Reserved(code)
            | CloseCode::Iana(code)
            | CloseCode::Library(code)
            | CloseCode::Bad(code) => code,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn named_codes_round_trip() {
        for code in [1000u16, 1001, 1002, 1003, 1005, 1006, 1007, 1008, 1009, 1010, 1011, 1012, 1013, 1015]
        {
            assert_eq!(u16::from(CloseCode::from(code)), code);
        }
        assert_eq!(CloseCode::from(1002), CloseCode::Protocol);
        assert_eq!(u16::from(CloseCode::Protocol), 1002);
    }

    #[test]
    fn ranged_codes_round_trip() {
        assert_eq!(CloseCode::from(1016), CloseCode::Reserved(1016));
        assert_eq!(CloseCode::from(2999), CloseCode::Reserved(2999));
        assert_eq!(CloseCode::from(3000), CloseCode::Iana(3000));
        assert_eq!(CloseCode::from(4321), CloseCode::Library(4321));
        for code in [0u16, 999, 1004, 1014, 5000, u16::MAX] {
            assert_eq!(CloseCode::from(code), CloseCode::Bad(code));
            assert_eq!(u16::from(CloseCode::from(code)), code);
        }
    }
}
