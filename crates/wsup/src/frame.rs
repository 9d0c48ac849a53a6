//! Frame-level constants and header serialization.

/// Final-fragment bit in the flags byte.
pub(crate) const FIN: u8 = 0x80;
/// Low nibble of the flags byte.
pub(crate) const OPCODE_MASK: u8 = 0x0f;
/// Mask bit in the length byte.
pub(crate) const MASKED: u8 = 0x80;
/// 7-bit length field in the length byte.
pub(crate) const LEN_MASK: u8 = 0x7f;

/// Largest header this layer reads or writes: flags byte, 127-marker length
/// byte, 8 extended-length bytes, 4 masking-key bytes.
pub(crate) const MAX_HEAD: usize = 14;

/// Frame opcode (RFC 6455 §5.2).
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum OpCode {
    Continuation = 0x0,
    Text = 0x1,
    Binary = 0x2,
    Close = 0x8,
    Ping = 0x9,
    Pong = 0xa,
}

impl From<OpCode> for u8 {
    fn from(opcode: OpCode) -> Self {
        opcode as u8
    }
}

impl TryFrom<u8> for OpCode {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, u8> {
        match value {
            0x0 => Ok(OpCode::Continuation),
            0x1 => Ok(OpCode::Text),
            0x2 => Ok(OpCode::Binary),
            0x8 => Ok(OpCode::Close),
            0x9 => Ok(OpCode::Ping),
            0xa => Ok(OpCode::Pong),
            other => Err(other),
        }
    }
}

/// Serialized frame header.
///
/// Server frames are never masked, so of the [`MAX_HEAD`] buffer at most
/// 10 bytes are ever used on the write side: the length ladder is a single
/// byte up to 125, marker 126 plus two big-endian bytes up to 65535, and
/// marker 127 plus eight big-endian bytes beyond that.
pub(crate) struct FrameHead {
    buf: [u8; MAX_HEAD],
    len: usize,
}

impl FrameHead {
    /// Encode a header announcing `len` payload bytes.
    ///
    /// `fin` is clear when more fragments of the message follow.
    pub(crate) fn new(opcode: OpCode, fin: bool, len: usize) -> Self {
        let mut buf = [0u8; MAX_HEAD];
        buf[0] = u8::from(opcode) | if fin { FIN } else { 0 };
        let used = if len > 65535 {
            buf[1] = 127;
            buf[2..10].copy_from_slice(&(len as u64).to_be_bytes());
            10
        } else if len > 125 {
            buf[1] = 126;
            buf[2..4].copy_from_slice(&(len as u16).to_be_bytes());
            4
        } else {
            buf[1] = len as u8;
            2
        };
        Self { buf, len: used }
    }

    pub(crate) fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.len]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod opcode {
        use super::*;

        #[test]
        fn known_values_round_trip() {
            for raw in [0x0u8, 0x1, 0x2, 0x8, 0x9, 0xa] {
                let opcode = OpCode::try_from(raw).unwrap();
                assert_eq!(u8::from(opcode), raw);
            }
        }

        #[test]
        fn unknown_values_are_reported() {
            for raw in [0x3u8, 0x4, 0x5, 0x6, 0x7, 0xb, 0xf] {
                assert_eq!(OpCode::try_from(raw), Err(raw));
            }
        }
    }

    mod head {
        use super::*;

        #[test]
        fn short_lengths_use_one_byte() {
            let head = FrameHead::new(OpCode::Text, true, 0);
            assert_eq!(head.as_bytes(), &[0x81, 0]);
            let head = FrameHead::new(OpCode::Binary, true, 125);
            assert_eq!(head.as_bytes(), &[0x82, 125]);
        }

        #[test]
        fn medium_lengths_use_the_126_ladder() {
            let head = FrameHead::new(OpCode::Text, true, 126);
            assert_eq!(head.as_bytes(), &[0x81, 126, 0x00, 0x7e]);
            let head = FrameHead::new(OpCode::Text, true, 65535);
            assert_eq!(head.as_bytes(), &[0x81, 126, 0xff, 0xff]);
        }

        #[test]
        fn long_lengths_use_the_127_ladder() {
            let head = FrameHead::new(OpCode::Binary, true, 65536);
            assert_eq!(
                head.as_bytes(),
                &[0x82, 127, 0, 0, 0, 0, 0x00, 0x01, 0x00, 0x00]
            );
        }

        #[test]
        fn fin_clear_marks_more_fragments() {
            let head = FrameHead::new(OpCode::Text, false, 2);
            assert_eq!(head.as_bytes(), &[0x01, 2]);
        }

        #[test]
        fn continuation_frames_keep_opcode_zero() {
            let head = FrameHead::new(OpCode::Continuation, true, 3);
            assert_eq!(head.as_bytes(), &[0x80, 3]);
        }

        #[test]
        fn mask_bit_is_never_set() {
            for len in [0usize, 125, 126, 65535, 65536] {
                let head = FrameHead::new(OpCode::Pong, true, len);
                assert_eq!(head.as_bytes()[1] & MASKED, 0);
            }
        }
    }
}
