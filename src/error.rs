//! Error taxonomy for keystore loading, signing and verification.

use std::path::PathBuf;
use thiserror::Error;

use crate::encoding::Layout;
use crate::hash::DigestScheme;

/// The keystore could not be opened (bad passphrase, corrupt or unknown file).
#[derive(Debug, Error)]
pub enum DecryptionError {
    #[error("reading keystore {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{0} is not a recognized keystore (expected Web3 v3 JSON or a sealed envelope)")]
    UnrecognizedFormat(PathBuf),
    #[error("web3 keystore: {0}")]
    Web3(String),
    #[error("envelope: {0}")]
    Envelope(String),
    #[error("decrypted payload: {0}")]
    Payload(String),
}

/// Decrypted bytes are not a usable secp256k1 private scalar.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InvalidKeyError {
    #[error("private key must be exactly 32 bytes (got {0})")]
    WrongLength(usize),
    #[error("private key is zero or not below the curve order")]
    OutOfRange,
    #[error("private key input: {0}")]
    Malformed(String),
}

/// A payment field does not fit its fixed serialization width, or could not be parsed.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EncodingError {
    #[error("{field} does not fit in {width} bytes")]
    FieldOverflow { field: &'static str, width: usize },
    #[error("{field}: invalid number {input:?}")]
    InvalidNumber { field: &'static str, input: String },
    #[error("recipient: {0}")]
    InvalidRecipient(String),
}

/// The curve operation kept producing a degenerate signature.
#[derive(Debug, Error)]
pub enum SigningError {
    #[error("signing failed after {attempts} attempts: {reason}")]
    Exhausted { attempts: usize, reason: String },
}

/// The signature is malformed and no identity can be recovered from it.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RecoveryError {
    #[error("signature component {0} is zero or not below the curve order")]
    ScalarOutOfRange(&'static str),
    #[error("signature s value is in the upper half of the curve order")]
    HighS,
    #[error("invalid recovery indicator {0} (expected 0, 1, 27 or 28)")]
    InvalidRecoveryIndicator(u64),
    #[error("no public key recovers from this signature")]
    Unrecoverable,
    #[error("message declares layout {declared}, verifier expects {expected}")]
    LayoutMismatch { expected: Layout, declared: Layout },
    #[error("message declares digest {declared}, verifier expects {expected}")]
    DigestMismatch {
        expected: DigestScheme,
        declared: DigestScheme,
    },
    #[error(transparent)]
    Encoding(#[from] EncodingError),
}

/// A signed message in wire form has a field that does not parse.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MessageFormatError {
    #[error(transparent)]
    Field(#[from] EncodingError),
    #[error("{0}: expected 32 bytes of 0x-hex")]
    Word(&'static str),
}

/// Failure of writing a sealed envelope keystore.
#[derive(Debug, Error)]
pub enum SealError {
    #[error(transparent)]
    InvalidKey(#[from] InvalidKeyError),
    #[error("key derivation: {0}")]
    Kdf(String),
    #[error("encrypt: {0}")]
    Encrypt(String),
    #[error("payload: {0}")]
    Payload(#[from] serde_json::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Failure of [`crate::signing::Signer::sign`].
#[derive(Debug, Error)]
pub enum SignError {
    #[error(transparent)]
    Encoding(#[from] EncodingError),
    #[error(transparent)]
    Signing(#[from] SigningError),
}

/// Failure of loading a signer straight from a keystore file.
#[derive(Debug, Error)]
pub enum KeyLoadError {
    #[error(transparent)]
    Decryption(#[from] DecryptionError),
    #[error(transparent)]
    InvalidKey(#[from] InvalidKeyError),
}
