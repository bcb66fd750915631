use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::EncodingError;
use crate::types::PaymentAuthorization;
use crate::util::{u256_to_be32, UINT_WIDTH};

pub const RECIPIENT_WIDTH: usize = 20;
pub const METHOD_WIDTH: usize = 1;
pub const ENCODED_LEN: usize = RECIPIENT_WIDTH + METHOD_WIDTH + UINT_WIDTH + UINT_WIDTH;

/// Field order of the encoded authorization. Every field has a fixed width in
/// both layouts, so each is injective.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Layout {
    /// `recipient(20) || method(1) || sequence(32) || amount(32)`
    #[default]
    Canonical,
    /// `recipient(20) || sequence(32) || method(1) || amount(32)`, the
    /// `abi.encodePacked(sender, paymentNumber, paymentMethod, chargeAmount)`
    /// order checked by the deployed payments contract.
    ContractPacked,
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Layout::Canonical => f.write_str("canonical"),
            Layout::ContractPacked => f.write_str("contract_packed"),
        }
    }
}

impl FromStr for Layout {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "canonical" => Ok(Layout::Canonical),
            "contract_packed" | "packed" => Ok(Layout::ContractPacked),
            other => Err(format!(
                "unknown layout '{other}' (expected canonical or contract_packed)"
            )),
        }
    }
}

/// Serialize an authorization into its fixed 85-byte layout.
///
/// Integers are big-endian and left-padded with zeros to 32 bytes. The
/// `Result` is kept for callers that treat the encoder as fallible; an
/// authorization can only be built with in-width values.
pub fn encode(
    auth: &PaymentAuthorization,
    layout: Layout,
) -> Result<[u8; ENCODED_LEN], EncodingError> {
    let recipient = auth.recipient();
    let method = [auth.method()];
    let sequence = u256_to_be32(auth.sequence());
    let amount = u256_to_be32(auth.amount());

    let parts: [&[u8]; 4] = match layout {
        Layout::Canonical => [recipient.as_bytes(), &method, &sequence, &amount],
        Layout::ContractPacked => [recipient.as_bytes(), &sequence, &method, &amount],
    };

    let mut out = [0u8; ENCODED_LEN];
    let mut at = 0;
    for part in parts {
        out[at..at + part.len()].copy_from_slice(part);
        at += part.len();
    }
    debug_assert_eq!(at, ENCODED_LEN);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethers_core::types::U256;

    fn auth(method: u8, sequence: u64, amount: u64) -> PaymentAuthorization {
        PaymentAuthorization::parse(
            "0xa1d9e8788414eA9827f9639c4bd81bA8f3A29758",
            method,
            &sequence.to_string(),
            &amount.to_string(),
        )
        .unwrap()
    }

    #[test]
    fn test_canonical_field_offsets() {
        let enc = encode(&auth(3, 0x0102, 0x0a0b), Layout::Canonical).unwrap();
        assert_eq!(enc.len(), 85);
        assert_eq!(hex::encode(&enc[..20]), "a1d9e8788414ea9827f9639c4bd81ba8f3a29758");
        assert_eq!(enc[20], 3);
        assert!(enc[21..51].iter().all(|b| *b == 0));
        assert_eq!(&enc[51..53], &[0x01, 0x02]);
        assert!(enc[53..83].iter().all(|b| *b == 0));
        assert_eq!(&enc[83..85], &[0x0a, 0x0b]);
    }

    #[test]
    fn test_contract_packed_field_offsets() {
        let enc = encode(&auth(3, 0x0102, 0x0a0b), Layout::ContractPacked).unwrap();
        assert!(enc[20..50].iter().all(|b| *b == 0));
        assert_eq!(&enc[50..52], &[0x01, 0x02]);
        assert_eq!(enc[52], 3);
        assert_eq!(&enc[83..85], &[0x0a, 0x0b]);
    }

    #[test]
    fn test_layouts_differ_only_in_order() {
        let a = auth(10, 10, 10);
        let canonical = encode(&a, Layout::Canonical).unwrap();
        let packed = encode(&a, Layout::ContractPacked).unwrap();
        assert_ne!(canonical, packed);
        let mut c = canonical.to_vec();
        let mut p = packed.to_vec();
        c.sort_unstable();
        p.sort_unstable();
        assert_eq!(c, p);
    }

    #[test]
    fn test_max_values_encode() {
        let a = PaymentAuthorization::new(Default::default(), 0xff, U256::MAX, U256::MAX);
        let enc = encode(&a, Layout::Canonical).unwrap();
        assert!(enc[20..].iter().all(|b| *b == 0xff));
    }

    #[test]
    fn test_method_and_sequence_do_not_alias() {
        // method=1, sequence=0 vs method=0, sequence=1 must not collide
        let x = encode(&auth(1, 0, 0), Layout::Canonical).unwrap();
        let y = encode(&auth(0, 1, 0), Layout::Canonical).unwrap();
        assert_ne!(x, y);
        let x = encode(&auth(1, 0, 0), Layout::ContractPacked).unwrap();
        let y = encode(&auth(0, 1, 0), Layout::ContractPacked).unwrap();
        assert_ne!(x, y);
    }

    #[test]
    fn test_layout_from_str() {
        assert_eq!("canonical".parse::<Layout>().unwrap(), Layout::Canonical);
        assert_eq!("contract-packed".parse::<Layout>().unwrap(), Layout::ContractPacked);
        assert!("json".parse::<Layout>().is_err());
    }
}
