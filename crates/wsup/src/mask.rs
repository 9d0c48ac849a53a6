//! Payload (un)masking.

/// XORs `buf` in place with the masking key, starting the key rotation at
/// `offset`, and returns the rotation to resume the next run with.
///
/// Masking is symmetric, so the same call masks and unmasks. A frame's
/// payload may arrive split across several deliveries; the returned offset
/// carries `counter mod 4` between the runs so the key rotation continues
/// where the previous run stopped.
pub(crate) fn apply_mask(buf: &mut [u8], mask: [u8; 4], offset: u8) -> u8 {
    let start = usize::from(offset & 3);
    for (i, byte) in buf.iter_mut().enumerate() {
        *byte ^= mask[(start + i) & 3];
    }
    ((start + buf.len()) & 3) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_key_is_identity() {
        let mut data = *b"hello world";
        let next = apply_mask(&mut data, [0; 4], 0);
        assert_eq!(&data, b"hello world");
        assert_eq!(next, (b"hello world".len() & 3) as u8);
    }

    #[test]
    fn round_trip_restores_payload() {
        let mask = [0x37, 0xfa, 0x21, 0x3d];
        for len in 0..=64 {
            let original: Vec<u8> = (0..len as u8).collect();
            let mut data = original.clone();
            apply_mask(&mut data, mask, 0);
            if len > 0 {
                assert_ne!(data, original);
            }
            apply_mask(&mut data, mask, 0);
            assert_eq!(data, original);
        }
    }

    #[test]
    fn split_runs_equal_one_run() {
        let mask = [0xa1, 0x02, 0xc3, 0x44];
        let payload: Vec<u8> = (0..41u8).map(|b| b.wrapping_mul(7)).collect();

        let mut whole = payload.clone();
        apply_mask(&mut whole, mask, 0);

        for split in 0..=payload.len() {
            let mut parts = payload.clone();
            let (a, b) = parts.split_at_mut(split);
            let carried = apply_mask(a, mask, 0);
            apply_mask(b, mask, carried);
            assert_eq!(parts, whole, "split at {split}");
        }
    }

    #[test]
    fn offset_is_taken_mod_4() {
        let mask = [1, 2, 3, 4];
        let mut a = *b"abcdef";
        let mut b = *b"abcdef";
        apply_mask(&mut a, mask, 2);
        apply_mask(&mut b, mask, 6);
        assert_eq!(a, b);
    }
}
