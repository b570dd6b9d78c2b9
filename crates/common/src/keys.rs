//! Order-preserving key codec
//!
//! The backing store orders entries lexicographically on raw bytes and has
//! no comparator hook, so numeric ordering on signed 64-bit keys is
//! established structurally: keys are stored sign-flipped big-endian, which
//! makes byte order equal integer order and puts negative keys before
//! non-negative ones. Equal integers always encode to equal bytes.

use crate::error::{Error, Result};
use crate::reserved::Key;

/// Every encoded key is exactly 8 bytes.
pub const ENCODED_KEY_LEN: usize = 8;

const SIGN_BIT: u64 = 1 << 63;

/// Encode a key for storage.
#[inline]
pub fn encode_key(key: Key) -> [u8; ENCODED_KEY_LEN] {
    ((key as u64) ^ SIGN_BIT).to_be_bytes()
}

/// Decode a stored key.
#[inline]
pub fn decode_key(bytes: &[u8]) -> Result<Key> {
    let array: [u8; ENCODED_KEY_LEN] = bytes
        .try_into()
        .map_err(|_| Error::ArgsWrong("stored key is not 8 bytes"))?;
    Ok((u64::from_be_bytes(array) ^ SIGN_BIT) as Key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip() {
        for key in [i64::MIN, -1_000_000, -1, 0, 1, 42, 1_000_000, i64::MAX] {
            assert_eq!(decode_key(&encode_key(key)).unwrap(), key);
        }
    }

    #[test]
    fn byte_order_equals_numeric_order() {
        let keys = [i64::MIN, -(1 << 40), -2, -1, 0, 1, 2, 1 << 40, i64::MAX];
        for window in keys.windows(2) {
            assert!(
                encode_key(window[0]) < encode_key(window[1]),
                "{} must sort before {}",
                window[0],
                window[1]
            );
        }
    }

    #[test]
    fn negatives_precede_non_negatives() {
        assert!(encode_key(-1) < encode_key(0));
        assert!(encode_key(i64::MIN) < encode_key(i64::MAX));
    }

    #[test]
    fn short_input_is_rejected() {
        assert!(decode_key(&[1, 2, 3]).is_err());
    }
}
