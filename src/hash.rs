use ethers_core::types::H256;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tiny_keccak::{Hasher, Keccak};

use crate::encoding::{encode, Layout};
use crate::error::EncodingError;
use crate::types::PaymentAuthorization;

/// Prefix wallets prepend before hashing a 32-byte message (EIP-191, version 0x45).
pub const PERSONAL_MESSAGE_PREFIX: &[u8] = b"\x19Ethereum Signed Message:\n32";

/// Which 32-byte digest of the encoded authorization gets signed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DigestScheme {
    /// `keccak256(encoded)`
    #[default]
    Raw,
    /// `keccak256(PERSONAL_MESSAGE_PREFIX || keccak256(encoded))`
    PersonalMessage,
}

impl fmt::Display for DigestScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DigestScheme::Raw => f.write_str("raw"),
            DigestScheme::PersonalMessage => f.write_str("personal_message"),
        }
    }
}

impl FromStr for DigestScheme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "raw" => Ok(DigestScheme::Raw),
            "personal_message" | "personal" | "eip191" => Ok(DigestScheme::PersonalMessage),
            other => Err(format!(
                "unknown digest scheme '{other}' (expected raw or personal_message)"
            )),
        }
    }
}

pub fn keccak256(parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = Keccak::v256();
    for part in parts {
        hasher.update(part);
    }
    let mut out = [0u8; 32];
    hasher.finalize(&mut out);
    out
}

/// The digest a signer signs for `auth`, and a verifier recomputes.
pub fn payment_hash(
    auth: &PaymentAuthorization,
    layout: Layout,
    digest: DigestScheme,
) -> Result<H256, EncodingError> {
    let encoded = encode(auth, layout)?;
    let inner = keccak256(&[&encoded]);
    let out = match digest {
        DigestScheme::Raw => inner,
        DigestScheme::PersonalMessage => keccak256(&[PERSONAL_MESSAGE_PREFIX, &inner]),
    };
    Ok(H256::from(out))
}
