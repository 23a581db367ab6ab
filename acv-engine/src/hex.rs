//! Lowercase hex codec, bit-length aware for sub-byte payloads.
//!
//! Output is always lowercase with no separators or `0x` prefix. Decoding
//! rejects odd-length input unless the caller declared a payload of four
//! bits or fewer, in which case a single hex digit is accepted and lands
//! in the high nibble (CFB1 payloads are MSB-aligned).

use acv_prelude::{AcvpError, Result};

/// Encode `src` as a lowercase hex string.
#[must_use]
pub fn bytes_to_hex(src: &[u8]) -> String {
    hex::encode(src)
}

/// Number of bytes needed to carry `bits` bits.
#[must_use]
pub const fn bits_to_bytes(bits: usize) -> usize {
    (bits + 7) / 8
}

/// Decode a hex string into `dst`, returning the number of bytes written.
///
/// # Errors
///
/// Returns `InvalidArg` on non-hex characters, odd length, or when the
/// decoded value does not fit in `dst`.
pub fn hex_to_bytes(src: &str, dst: &mut [u8]) -> Result<usize> {
    if src.len() % 2 != 0 {
        return Err(AcvpError::InvalidArg(format!(
            "odd-length hex string ({} chars)",
            src.len()
        )));
    }
    let nbytes = src.len() / 2;
    if nbytes > dst.len() {
        return Err(AcvpError::InvalidArg(format!(
            "hex value too long: {} bytes, capacity {}",
            nbytes,
            dst.len()
        )));
    }
    hex::decode_to_slice(src, &mut dst[..nbytes])
        .map_err(|e| AcvpError::InvalidArg(format!("invalid hex: {e}")))?;
    Ok(nbytes)
}

/// Decode a hex string carrying a declared number of payload bits.
///
/// Behaves like [`hex_to_bytes`] except that a single hex digit is
/// accepted when `bits <= 4`; the digit occupies the high nibble.
///
/// # Errors
///
/// Returns `InvalidArg` on non-hex characters, on odd length when more
/// than four bits were declared, or on overflow of `dst`.
pub fn hex_to_bytes_with_bits(src: &str, dst: &mut [u8], bits: usize) -> Result<usize> {
    if src.len() == 1 && bits <= 4 {
        let digit = u8::from_str_radix(src, 16)
            .map_err(|e| AcvpError::InvalidArg(format!("invalid hex: {e}")))?;
        if dst.is_empty() {
            return Err(AcvpError::InvalidArg("hex value too long: capacity 0".to_string()));
        }
        dst[0] = digit << 4;
        return Ok(1);
    }
    hex_to_bytes(src, dst)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn encode_is_lowercase() {
        assert_eq!(bytes_to_hex(&[0xAB, 0xCD, 0x01]), "abcd01");
    }

    #[test]
    fn round_trip_identity() {
        let hex_in = "0011223344556677";
        let mut buf = [0u8; 16];
        let n = hex_to_bytes(hex_in, &mut buf).unwrap();
        assert_eq!(n, 8);
        assert_eq!(bytes_to_hex(&buf[..n]), hex_in);
    }

    #[test]
    fn uppercase_input_decodes() {
        let mut buf = [0u8; 4];
        let n = hex_to_bytes("F8A0", &mut buf).unwrap();
        assert_eq!(&buf[..n], &[0xF8, 0xA0]);
    }

    #[test]
    fn odd_length_rejected() {
        let mut buf = [0u8; 4];
        let err = hex_to_bytes("abc", &mut buf).unwrap_err();
        assert!(matches!(err, AcvpError::InvalidArg(_)));
    }

    #[test]
    fn non_hex_rejected() {
        let mut buf = [0u8; 4];
        assert!(hex_to_bytes("zz", &mut buf).is_err());
    }

    #[test]
    fn overflow_rejected() {
        let mut buf = [0u8; 1];
        assert!(hex_to_bytes("aabb", &mut buf).is_err());
    }

    #[test]
    fn single_digit_allowed_for_sub_nibble_payload() {
        let mut buf = [0u8; 1];
        let n = hex_to_bytes_with_bits("8", &mut buf, 1).unwrap();
        assert_eq!(n, 1);
        assert_eq!(buf[0], 0x80);
    }

    #[test]
    fn single_digit_rejected_for_wider_payload() {
        let mut buf = [0u8; 1];
        assert!(hex_to_bytes_with_bits("8", &mut buf, 5).is_err());
    }

    #[test]
    fn bit_rounding() {
        assert_eq!(bits_to_bytes(0), 0);
        assert_eq!(bits_to_bytes(1), 1);
        assert_eq!(bits_to_bytes(5), 1);
        assert_eq!(bits_to_bytes(8), 1);
        assert_eq!(bits_to_bytes(9), 2);
        assert_eq!(bits_to_bytes(64), 8);
    }
}
