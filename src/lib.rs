//! Offline signing and verification of payment authorizations.
//!
//! An authorization (recipient, method, sequence, amount) is packed into a
//! fixed 85-byte layout, hashed with keccak256 and signed with secp256k1
//! ECDSA. Anyone holding the signature and the fields can recover the
//! signer's 20-byte identity and compare it with the one they expect.
//!
//! ```no_run
//! use payment_signer::{verify_message, PaymentAuthorization, Signer, VerifyOptions};
//!
//! # fn main() -> anyhow::Result<()> {
//! let signer = Signer::new(&[0x11; 32])?;
//! let auth = PaymentAuthorization::parse(
//!     "0x2011000000000000000000000000000000000001",
//!     1,
//!     "7",
//!     "1000000000000000000",
//! )?;
//! let msg = signer.sign_authorization(&auth)?;
//! assert!(verify_message(&msg, signer.identity(), VerifyOptions::default())?);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod defaults;
pub mod encoding;
pub mod error;
pub mod hash;
pub mod key;
pub mod keystore;
pub mod signing;
pub mod types;
pub mod util;
pub mod verify;

pub use encoding::{encode, Layout, ENCODED_LEN};
pub use error::{
    DecryptionError, EncodingError, InvalidKeyError, KeyLoadError, MessageFormatError,
    RecoveryError, SealError, SignError, SigningError,
};
pub use hash::{payment_hash, DigestScheme};
pub use key::KeyMaterial;
pub use signing::{NoncePolicy, Signer, SignerOptions};
pub use types::{Identity, PaymentAuthorization, SignedPaymentMessage};
pub use verify::{recover_identity, verify, verify_authorization, verify_message, VerifyOptions};
