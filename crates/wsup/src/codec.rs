//! Incremental frame decoding.
//!
//! One [`Decoder`] lives per socket and survives across deliveries: the host
//! may hand over a frame one byte at a time, or many frames at once, and the
//! parse resumes exactly where the previous delivery stopped. Header bytes
//! advance the state machine one stage per byte; payload bytes are consumed
//! in bulk runs by the caller, which reports them back through
//! [`Decoder::finish_run`].
//!
//! The decoder is pure bookkeeping. What a frame *means* — answering pings,
//! echoing closes, invoking callbacks — is the caller's business; this module
//! only tracks where in a frame the byte stream currently is.

use crate::frame::{self, OpCode};
use crate::mask::apply_mask;

/// Parse position within a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Stage {
    /// Expecting the flags byte: FIN bit plus opcode.
    Flags,
    /// Expecting the length byte: mask bit plus 7-bit length code.
    Len0,
    /// Accumulating a big-endian extended length; `left` bytes to go
    /// (starts at 2 for code 126, 8 for code 127).
    ExtLen { left: u8 },
    /// Collecting the 4-byte masking key; `filled` bytes captured so far.
    Mask { filled: u8 },
    /// Consuming payload bytes in bulk runs.
    Payload,
}

/// Resumable frame parser.
#[derive(Debug)]
pub(crate) struct Decoder {
    stage: Stage,
    /// Flags byte captured at [`Stage::Flags`].
    flags: u8,
    /// Length byte captured at [`Stage::Len0`]; holds the mask bit.
    len0: u8,
    /// Payload bytes the current frame still owes.
    remaining: u64,
    mask: [u8; 4],
    /// Key rotation carried between payload runs, always in `0..4`.
    mask_offset: u8,
    /// Set once a payload run of the current frame has been consumed, so
    /// later runs of the same frame skip first-chunk side effects.
    mid_payload: bool,
}

impl Decoder {
    pub(crate) fn new() -> Self {
        Self {
            stage: Stage::Flags,
            flags: 0,
            len0: 0,
            remaining: 0,
            mask: [0; 4],
            mask_offset: 0,
            mid_payload: false,
        }
    }

    pub(crate) fn stage(&self) -> Stage {
        self.stage
    }

    /// Advance the header parse by exactly one byte and return the stage the
    /// decoder is in afterwards. Reaching [`Stage::Payload`] means the header
    /// is complete and payload scanning must begin immediately — even when
    /// the frame is empty or the delivery ends here.
    pub(crate) fn step(&mut self, byte: u8) -> Stage {
        self.stage = match self.stage {
            Stage::Flags => {
                self.flags = byte;
                self.mask_offset = 0;
                self.mid_payload = false;
                Stage::Len0
            }
            Stage::Len0 => {
                self.len0 = byte;
                match byte & frame::LEN_MASK {
                    126 => {
                        self.remaining = 0;
                        Stage::ExtLen { left: 2 }
                    }
                    127 => {
                        self.remaining = 0;
                        Stage::ExtLen { left: 8 }
                    }
                    short => {
                        self.remaining = u64::from(short);
                        self.after_length()
                    }
                }
            }
            Stage::ExtLen { left } => {
                self.remaining = self.remaining << 8 | u64::from(byte);
                if left > 1 {
                    Stage::ExtLen { left: left - 1 }
                } else {
                    self.after_length()
                }
            }
            Stage::Mask { filled } => {
                self.mask[usize::from(filled)] = byte;
                if filled < 3 {
                    Stage::Mask { filled: filled + 1 }
                } else {
                    Stage::Payload
                }
            }
            // Payload bytes are consumed in runs, never fed through here.
            Stage::Payload => Stage::Payload,
        };
        self.stage
    }

    fn after_length(&self) -> Stage {
        if self.masked() {
            Stage::Mask { filled: 0 }
        } else {
            Stage::Payload
        }
    }

    /// Payload bytes the current frame still owes.
    pub(crate) fn remaining(&self) -> u64 {
        self.remaining
    }

    pub(crate) fn fin(&self) -> bool {
        self.flags & frame::FIN != 0
    }

    /// Raw opcode nibble of the current frame.
    pub(crate) fn opcode_raw(&self) -> u8 {
        self.flags & frame::OPCODE_MASK
    }

    /// Convenience over [`Self::opcode_raw`].
    pub(crate) fn opcode(&self) -> Result<OpCode, u8> {
        OpCode::try_from(self.opcode_raw())
    }

    pub(crate) fn masked(&self) -> bool {
        self.len0 & frame::MASKED != 0
    }

    /// Whether the next payload run is the first of this frame.
    pub(crate) fn first_chunk(&self) -> bool {
        !self.mid_payload
    }

    /// Size of the payload run to take out of `available` bytes.
    pub(crate) fn begin_run(&self, available: usize) -> usize {
        self.remaining.min(available as u64) as usize
    }

    /// Unmask a payload run in place. No-op when the frame's mask bit is
    /// clear; the key rotation persists across runs of the same frame.
    pub(crate) fn unmask(&mut self, run: &mut [u8]) {
        if self.masked() {
            self.mask_offset = apply_mask(run, self.mask, self.mask_offset);
        }
    }

    /// Account a consumed payload run. Returns to [`Stage::Flags`] exactly
    /// when the frame is exhausted; otherwise marks the frame as mid-payload
    /// so later runs skip first-chunk side effects.
    pub(crate) fn finish_run(&mut self, len: usize) {
        self.remaining -= len as u64;
        if self.remaining == 0 {
            self.stage = Stage::Flags;
            self.mid_payload = false;
        } else {
            self.mid_payload = true;
        }
    }
}
