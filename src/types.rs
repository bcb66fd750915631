use ethers_core::types::{Address, Signature, H256, U256};
use serde::{Deserialize, Serialize};

use crate::encoding::Layout;
use crate::error::{EncodingError, MessageFormatError};
use crate::hash::DigestScheme;
use crate::util::{
    bytes_to_0x, hex_to_bytes, parse_addr, parse_uint_field, u256_to_be32, uint_from_be_slice,
};

/// Public name of a signer: the 20-byte address derived from its public key.
pub type Identity = Address;

/// What is being authorized. Immutable once built; every constructor enforces
/// the 32-byte width of `sequence` and `amount`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PaymentAuthorization {
    recipient: Address,
    method: u8,
    sequence: U256,
    amount: U256,
}

impl PaymentAuthorization {
    /// `U256` already fits the field width, so this cannot fail.
    pub fn new(recipient: Address, method: u8, sequence: U256, amount: U256) -> Self {
        Self {
            recipient,
            method,
            sequence,
            amount,
        }
    }

    /// Build from user input: 0x-hex recipient, decimal or 0x-hex integers of any length.
    pub fn parse(
        recipient: &str,
        method: u8,
        sequence: &str,
        amount: &str,
    ) -> Result<Self, EncodingError> {
        Ok(Self {
            recipient: parse_addr(recipient)?,
            method,
            sequence: parse_uint_field("sequence", sequence)?,
            amount: parse_uint_field("amount", amount)?,
        })
    }

    /// Build from big-endian magnitudes of arbitrary length.
    pub fn from_be_bytes(
        recipient: [u8; 20],
        method: u8,
        sequence: &[u8],
        amount: &[u8],
    ) -> Result<Self, EncodingError> {
        Ok(Self {
            recipient: Address::from(recipient),
            method,
            sequence: uint_from_be_slice("sequence", sequence)?,
            amount: uint_from_be_slice("amount", amount)?,
        })
    }

    pub fn recipient(&self) -> Address {
        self.recipient
    }

    pub fn method(&self) -> u8 {
        self.method
    }

    pub fn sequence(&self) -> U256 {
        self.sequence
    }

    pub fn amount(&self) -> U256 {
        self.amount
    }
}

/// An authorization together with the signature over it.
///
/// `hash` is the digest that was signed. It is kept for audit only; verification
/// always recomputes it from the authorization fields, `layout` and `digest`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "SignedPaymentMessageJson", try_from = "SignedPaymentMessageJson")]
pub struct SignedPaymentMessage {
    pub authorization: PaymentAuthorization,
    /// `r`, `s` and `v`, with `v` = recovery id + 27.
    pub signature: Signature,
    pub hash: H256,
    pub layout: Layout,
    pub digest: DigestScheme,
}

/// Wire shape, field order preserved in the JSON output.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct SignedPaymentMessageJson {
    recipient: String,
    method: u8,
    sequence: String,
    amount: String,
    #[serde(default)]
    layout: Layout,
    #[serde(default)]
    digest: DigestScheme,
    h: String,
    r: String,
    s: String,
    v: u64,
}

impl From<SignedPaymentMessage> for SignedPaymentMessageJson {
    fn from(m: SignedPaymentMessage) -> Self {
        let auth = m.authorization;
        Self {
            recipient: bytes_to_0x(auth.recipient.as_bytes()),
            method: auth.method,
            sequence: auth.sequence.to_string(),
            amount: auth.amount.to_string(),
            layout: m.layout,
            digest: m.digest,
            h: bytes_to_0x(m.hash.as_bytes()),
            r: bytes_to_0x(&u256_to_be32(m.signature.r)),
            s: bytes_to_0x(&u256_to_be32(m.signature.s)),
            v: m.signature.v,
        }
    }
}

impl TryFrom<SignedPaymentMessageJson> for SignedPaymentMessage {
    type Error = MessageFormatError;

    fn try_from(j: SignedPaymentMessageJson) -> Result<Self, Self::Error> {
        let authorization =
            PaymentAuthorization::parse(&j.recipient, j.method, &j.sequence, &j.amount)?;
        let hash = H256::from(word32("h", &j.h)?);
        let signature = Signature {
            r: U256::from_big_endian(&word32("r", &j.r)?),
            s: U256::from_big_endian(&word32("s", &j.s)?),
            v: j.v,
        };
        Ok(Self {
            authorization,
            signature,
            hash,
            layout: j.layout,
            digest: j.digest,
        })
    }
}

fn word32(name: &'static str, s: &str) -> Result<[u8; 32], MessageFormatError> {
    let bytes = hex_to_bytes(s).map_err(|_| MessageFormatError::Word(name))?;
    bytes.try_into().map_err(|_| MessageFormatError::Word(name))
}
