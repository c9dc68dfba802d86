//! Content hashing for change detection.
//!
//! Wraps blake3 into a compact `u64` digest, used to decide whether the
//! config file actually changed on a reload event.

/// Compute a 64-bit content hash.
///
/// Truncating blake3 to 8 bytes is plenty for change detection; this is
/// not used for anything security-sensitive.
pub fn compute(bytes: &[u8]) -> u64 {
    let hash = blake3::hash(bytes);
    let mut buf = [0u8; 8];
    buf.copy_from_slice(&hash.as_bytes()[..8]);
    u64::from_le_bytes(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_input_same_hash() {
        assert_eq!(compute(b"hello"), compute(b"hello"));
    }

    #[test]
    fn test_different_input_different_hash() {
        assert_ne!(compute(b"hello"), compute(b"hello!"));
    }

    #[test]
    fn test_empty_input() {
        // Stable and non-zero for empty content
        assert_eq!(compute(b""), compute(b""));
    }
}
