//! Fixed-width encoding helpers for numeric values.
//!
//! Unsigned 64-bit integers are stored as 8 bytes, little-endian. Decoding
//! rejects values of any other length rather than silently truncating.

use crate::error::{StoreError, StoreResult};

/// Width in bytes of an encoded u64 value.
pub const U64_LEN: usize = 8;

/// Encodes a u64 as 8 little-endian bytes.
#[must_use]
pub fn encode_u64(value: u64) -> [u8; U64_LEN] {
    value.to_le_bytes()
}

/// Decodes 8 little-endian bytes into a u64.
///
/// # Errors
///
/// Returns [`StoreError::Decode`] if `data` is not exactly 8 bytes.
pub fn decode_u64(data: &[u8]) -> StoreResult<u64> {
    let bytes: [u8; U64_LEN] = data
        .try_into()
        .map_err(|_| StoreError::decode(format!("expected {} bytes, got {}", U64_LEN, data.len())))?;
    Ok(u64::from_le_bytes(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn u64_round_trips() {
        for value in [0, 1, 255, 256, u64::MAX] {
            assert_eq!(decode_u64(&encode_u64(value)).unwrap(), value);
        }
    }

    #[test]
    fn encoding_is_little_endian() {
        assert_eq!(encode_u64(1), [1, 0, 0, 0, 0, 0, 0, 0]);
        assert_eq!(encode_u64(0x0102), [2, 1, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn short_value_fails_to_decode() {
        let result = decode_u64(&[1, 2, 3]);
        assert!(matches!(result, Err(StoreError::Decode { .. })));
    }

    #[test]
    fn long_value_fails_to_decode() {
        let result = decode_u64(&[0; 9]);
        assert!(matches!(result, Err(StoreError::Decode { .. })));
    }
}
