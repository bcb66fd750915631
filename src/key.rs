use bech32::{decode as bech32_decode, FromBase32, Variant};
use k256::ecdsa::{SigningKey, VerifyingKey};
use std::fmt;
use zeroize::Zeroizing;

use crate::error::InvalidKeyError;
use crate::hash::keccak256;
use crate::types::Identity;
use crate::util::hex_to_bytes;

/// Decrypted private key bytes; zeroed when dropped.
pub type RawKey = Zeroizing<Vec<u8>>;

/// A secp256k1 private key and the identity it signs as.
///
/// Not `Clone`, never serialized, and its `Debug` output shows only the
/// identity. The scalar lives inside [`SigningKey`], which zeroes it on drop.
pub struct KeyMaterial {
    signing_key: SigningKey,
    identity: Identity,
}

impl KeyMaterial {
    pub fn from_bytes(raw: &[u8]) -> Result<Self, InvalidKeyError> {
        if raw.len() != 32 {
            return Err(InvalidKeyError::WrongLength(raw.len()));
        }
        let signing_key = SigningKey::from_slice(raw).map_err(|_| InvalidKeyError::OutOfRange)?;
        let identity = identity_of(signing_key.verifying_key());
        Ok(Self {
            signing_key,
            identity,
        })
    }

    pub fn identity(&self) -> Identity {
        self.identity
    }

    pub(crate) fn signing_key(&self) -> &SigningKey {
        &self.signing_key
    }
}

impl fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyMaterial")
            .field("identity", &self.identity)
            .field("signing_key", &"***REDACTED***")
            .finish()
    }
}

/// Address of a public key: last 20 bytes of keccak256(X || Y).
pub fn identity_of(vk: &VerifyingKey) -> Identity {
    let uncompressed = vk.to_encoded_point(false);
    let xy = &uncompressed.as_bytes()[1..]; // drop 0x04
    let hash = keccak256(&[xy]);
    Identity::from_slice(&hash[12..])
}

/// Parse a secret key typed by an operator as either:
/// - hex (64 hex chars, optional 0x/0X prefix), or
/// - bech32 "nsec1..." (payload must be exactly 32 bytes)
pub fn raw_key_from_input(input: &str) -> Result<RawKey, InvalidKeyError> {
    let s = input.trim();

    if s.to_ascii_lowercase().starts_with("nsec1") {
        let (hrp, data, variant) =
            bech32_decode(s).map_err(|e| InvalidKeyError::Malformed(format!("nsec: {e}")))?;
        if variant != Variant::Bech32 {
            return Err(InvalidKeyError::Malformed("nsec: invalid bech32 variant".into()));
        }
        if hrp.to_ascii_lowercase() != "nsec" {
            return Err(InvalidKeyError::Malformed(format!(
                "nsec: invalid human-readable part '{hrp}'"
            )));
        }
        let bytes = Zeroizing::new(
            Vec::<u8>::from_base32(&data)
                .map_err(|e| InvalidKeyError::Malformed(format!("nsec payload: {e}")))?,
        );
        if bytes.len() != 32 {
            return Err(InvalidKeyError::WrongLength(bytes.len()));
        }
        return Ok(bytes);
    }

    let bytes = Zeroizing::new(
        hex_to_bytes(s).map_err(|e| InvalidKeyError::Malformed(format!("hex: {e}")))?,
    );
    if bytes.len() != 32 {
        return Err(InvalidKeyError::WrongLength(bytes.len()));
    }
    Ok(bytes)
}
