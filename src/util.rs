use ethers_core::types::{Address, U256};

use crate::error::EncodingError;

/// Width in bytes of the `sequence` and `amount` fields.
pub const UINT_WIDTH: usize = 32;

/// Parse a non-negative integer given as decimal or 0x-hex, of any length.
/// Values that need more than 32 bytes are rejected, never truncated.
pub fn parse_uint_field(field: &'static str, s: &str) -> Result<U256, EncodingError> {
    let t = s.trim();
    let invalid = || EncodingError::InvalidNumber {
        field,
        input: s.to_string(),
    };

    if let Some(x) = t.strip_prefix("0x").or_else(|| t.strip_prefix("0X")) {
        if x.is_empty() {
            return Err(invalid());
        }
        // hex::decode wants an even number of digits
        let padded = if x.len() % 2 == 1 {
            format!("0{x}")
        } else {
            x.to_string()
        };
        let bytes = hex::decode(padded).map_err(|_| invalid())?;
        return uint_from_be_slice(field, &bytes);
    }

    if t.is_empty() || !t.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    // only digits left, so the one remaining failure is overflow
    U256::from_dec_str(t).map_err(|_| EncodingError::FieldOverflow {
        field,
        width: UINT_WIDTH,
    })
}

/// Big-endian magnitude of any length; leading zero bytes do not count toward the width.
pub fn uint_from_be_slice(field: &'static str, bytes: &[u8]) -> Result<U256, EncodingError> {
    let first = bytes.iter().position(|b| *b != 0).unwrap_or(bytes.len());
    let significant = &bytes[first..];
    if significant.len() > UINT_WIDTH {
        return Err(EncodingError::FieldOverflow {
            field,
            width: UINT_WIDTH,
        });
    }
    Ok(U256::from_big_endian(significant))
}

pub fn parse_addr(s: &str) -> Result<Address, EncodingError> {
    let bytes = hex_to_bytes(s).map_err(|e| EncodingError::InvalidRecipient(e.to_string()))?;
    if bytes.len() != Address::len_bytes() {
        return Err(EncodingError::InvalidRecipient(format!(
            "expected 20 bytes, got {}",
            bytes.len()
        )));
    }
    Ok(Address::from_slice(&bytes))
}

pub fn hex_to_bytes(s: &str) -> Result<Vec<u8>, hex::FromHexError> {
    let t = s.trim();
    let t = t
        .strip_prefix("0x")
        .or_else(|| t.strip_prefix("0X"))
        .unwrap_or(t);
    hex::decode(t)
}

pub fn bytes_to_0x(v: &[u8]) -> String {
    format!("0x{}", hex::encode(v))
}

pub fn u256_to_be32(x: U256) -> [u8; 32] {
    let mut b = [0u8; 32];
    x.to_big_endian(&mut b);
    b
}
