// Field encodings shared by the transaction and block wire layouts.
//
// Two integer encodings coexist on the wire and both are kept for compatibility
// with peers speaking the same scheme:
// - digit-string: 32 ASCII decimal digits, zero-padded on the left
//   (nonce, amount, timestamp)
// - hex-int: a 32-byte big-endian unsigned integer (height, GetBlock height)
use crate::error::{BlockchainError, Result};
use num_bigint::BigUint;

/// Width in bytes of every fixed-size field
pub const FIELD_LEN: usize = 32;

/// Largest value a 32-digit field can carry
pub const MAX_DIGIT_VALUE: u128 = 99_999_999_999_999_999_999_999_999_999_999;

pub fn encode_digit_string(value: u128) -> Result<[u8; FIELD_LEN]> {
    if value > MAX_DIGIT_VALUE {
        return Err(BlockchainError::MalformedPayload(format!(
            "{value} does not fit in {FIELD_LEN} decimal digits"
        )));
    }
    let text = format!("{value:0width$}", width = FIELD_LEN);
    let mut field = [0u8; FIELD_LEN];
    field.copy_from_slice(text.as_bytes());
    Ok(field)
}

pub fn decode_digit_string(field: &[u8]) -> Result<u128> {
    expect_field_len(field)?;
    if let Some(bad) = field.iter().find(|b| !b.is_ascii_digit()) {
        return Err(BlockchainError::MalformedPayload(format!(
            "digit-string field contains non-digit byte 0x{bad:02x}"
        )));
    }
    // 32 digits always fit in a u128, the error arm is unreachable in practice
    let text = std::str::from_utf8(field)
        .map_err(|e| BlockchainError::MalformedPayload(format!("invalid digit-string: {e}")))?;
    text.parse::<u128>()
        .map_err(|e| BlockchainError::MalformedPayload(format!("invalid digit-string: {e}")))
}

pub fn encode_hex_int(value: u64) -> [u8; FIELD_LEN] {
    let mut field = [0u8; FIELD_LEN];
    field[FIELD_LEN - 8..].copy_from_slice(&value.to_be_bytes());
    field
}

pub fn decode_hex_int(field: &[u8]) -> Result<u64> {
    expect_field_len(field)?;
    let (high, low) = field.split_at(FIELD_LEN - 8);
    if high.iter().any(|b| *b != 0) {
        return Err(BlockchainError::MalformedPayload(
            "hex-int field exceeds 64 bits".to_string(),
        ));
    }
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(low);
    Ok(u64::from_be_bytes(bytes))
}

/// Decimal rendering of a byte run read as one big-endian unsigned integer
pub fn big_endian_decimal(bytes: &[u8]) -> String {
    BigUint::from_bytes_be(bytes).to_string()
}

pub fn expect_len(bytes: &[u8], expected: usize, what: &str) -> Result<()> {
    if bytes.len() != expected {
        return Err(BlockchainError::MalformedPayload(format!(
            "{what} must be {expected} bytes, got {}",
            bytes.len()
        )));
    }
    Ok(())
}

fn expect_field_len(field: &[u8]) -> Result<()> {
    expect_len(field, FIELD_LEN, "field")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digit_string_is_left_padded_ascii() {
        let field = encode_digit_string(500).unwrap();
        assert_eq!(&field[..29], "0".repeat(29).as_bytes());
        assert_eq!(&field[29..], b"500");
        assert_eq!(decode_digit_string(&field).unwrap(), 500);
    }

    #[test]
    fn test_digit_string_limits() {
        let field = encode_digit_string(MAX_DIGIT_VALUE).unwrap();
        assert_eq!(field, [b'9'; FIELD_LEN]);
        assert_eq!(decode_digit_string(&field).unwrap(), MAX_DIGIT_VALUE);
        assert!(encode_digit_string(MAX_DIGIT_VALUE + 1).is_err());
    }

    #[test]
    fn test_digit_string_right_padding_changes_value() {
        // "1" followed by 31 '0' bytes reads as 10^31, not 1
        let mut field = [b'0'; FIELD_LEN];
        field[0] = b'1';
        assert_eq!(
            decode_digit_string(&field).unwrap(),
            10_000_000_000_000_000_000_000_000_000_000
        );
    }

    #[test]
    fn test_digit_string_rejects_non_digits() {
        let mut field = [b'0'; FIELD_LEN];
        field[5] = 0;
        assert!(matches!(
            decode_digit_string(&field),
            Err(BlockchainError::MalformedPayload(_))
        ));
        assert!(decode_digit_string(&[b'1'; 31]).is_err());
    }

    #[test]
    fn test_hex_int_big_endian() {
        let field = encode_hex_int(0x0102);
        assert_eq!(field[30], 0x01);
        assert_eq!(field[31], 0x02);
        assert_eq!(decode_hex_int(&field).unwrap(), 0x0102);

        let mut wide = [0u8; FIELD_LEN];
        wide[0] = 1;
        assert!(decode_hex_int(&wide).is_err());
    }

    #[test]
    fn test_big_endian_decimal() {
        assert_eq!(big_endian_decimal(&[]), "0");
        assert_eq!(big_endian_decimal(&[0x00, 0x01, 0x00]), "256");
        assert_eq!(
            big_endian_decimal(&[0xff; 16]),
            u128::MAX.to_string()
        );
    }
}
