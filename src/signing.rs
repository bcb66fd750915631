use ethers_core::types::{Address, Signature, H256, U256};
use k256::ecdsa::signature::hazmat::RandomizedPrehashSigner;
use k256::ecdsa::{RecoveryId, Signature as EcdsaSignature};
use rand_core::OsRng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, warn};

use crate::encoding::Layout;
use crate::error::{InvalidKeyError, KeyLoadError, SignError, SigningError};
use crate::hash::{payment_hash, DigestScheme};
use crate::key::KeyMaterial;
use crate::keystore;
use crate::types::{Identity, PaymentAuthorization, SignedPaymentMessage};

/// Upper bound on signing attempts before a degenerate result becomes fatal.
pub const MAX_SIGNING_ATTEMPTS: usize = 3;

/// Offset added to the recovery id in the `v` byte.
pub const V_OFFSET: u64 = 27;

/// Where the per-signature ECDSA nonce comes from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoncePolicy {
    /// RFC 6979: derived from the private key and the digest. Same input, same signature.
    #[default]
    Deterministic,
    /// RFC 6979 hedged with 32 fresh bytes from the OS on every call.
    Random,
}

impl fmt::Display for NoncePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NoncePolicy::Deterministic => f.write_str("deterministic"),
            NoncePolicy::Random => f.write_str("random"),
        }
    }
}

impl FromStr for NoncePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "deterministic" | "rfc6979" => Ok(NoncePolicy::Deterministic),
            "random" | "hedged" => Ok(NoncePolicy::Random),
            other => Err(format!(
                "unknown nonce policy '{other}' (expected deterministic or random)"
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignerOptions {
    #[serde(default)]
    pub layout: Layout,
    #[serde(default)]
    pub digest: DigestScheme,
    #[serde(default)]
    pub nonce: NoncePolicy,
}

/// Signs payment authorizations with one key for its whole lifetime.
///
/// `sign` takes `&self` and keeps no counters, so one `Signer` can be shared
/// across threads. The key is released when the `Signer` is dropped.
#[derive(Debug)]
pub struct Signer {
    key: KeyMaterial,
    options: SignerOptions,
}

impl Signer {
    pub fn new(raw_key: &[u8]) -> Result<Self, InvalidKeyError> {
        Self::with_options(raw_key, SignerOptions::default())
    }

    pub fn with_options(raw_key: &[u8], options: SignerOptions) -> Result<Self, InvalidKeyError> {
        let key = KeyMaterial::from_bytes(raw_key)?;
        debug!(
            identity = ?key.identity(),
            layout = %options.layout,
            digest = %options.digest,
            nonce = %options.nonce,
            "signer ready"
        );
        Ok(Self { key, options })
    }

    /// Decrypt a keystore and build a signer from it. The decrypted bytes are
    /// zeroed before this returns, on success and on error.
    pub fn from_keystore(
        path: &Path,
        passphrase: &[u8],
        options: SignerOptions,
    ) -> Result<Self, KeyLoadError> {
        let raw = keystore::decrypt(path, passphrase)?;
        Ok(Self::with_options(&raw, options)?)
    }

    pub fn identity(&self) -> Identity {
        self.key.identity()
    }

    pub fn options(&self) -> SignerOptions {
        self.options
    }

    pub fn sign(
        &self,
        recipient: Address,
        method: u8,
        sequence: U256,
        amount: U256,
    ) -> Result<SignedPaymentMessage, SignError> {
        self.sign_authorization(&PaymentAuthorization::new(recipient, method, sequence, amount))
    }

    pub fn sign_authorization(
        &self,
        auth: &PaymentAuthorization,
    ) -> Result<SignedPaymentMessage, SignError> {
        let hash = payment_hash(auth, self.options.layout, self.options.digest)?;
        let (sig, recid) = self.sign_digest(&hash)?;

        let rs = sig.to_bytes();
        let signature = Signature {
            r: U256::from_big_endian(&rs[..32]),
            s: U256::from_big_endian(&rs[32..]),
            v: u64::from(recid.to_byte()) + V_OFFSET,
        };

        debug!(
            identity = ?self.identity(),
            recipient = ?auth.recipient(),
            method = auth.method(),
            sequence = %auth.sequence(),
            hash = ?hash,
            "signed payment authorization"
        );

        Ok(SignedPaymentMessage {
            authorization: *auth,
            signature,
            hash,
            layout: self.options.layout,
            digest: self.options.digest,
        })
    }

    fn sign_digest(&self, digest: &H256) -> Result<(EcdsaSignature, RecoveryId), SigningError> {
        let key = self.key.signing_key();
        let prehash = digest.as_bytes();
        let policy = self.options.nonce;

        with_retries(|attempt| {
            // A deterministic nonce would fail the same way again, so retries are hedged.
            let (sig, recid) = if policy == NoncePolicy::Deterministic && attempt == 0 {
                key.sign_prehash_recoverable(prehash)
                    .map_err(|e| e.to_string())?
            } else {
                let sig: EcdsaSignature =
                    RandomizedPrehashSigner::<EcdsaSignature>::sign_prehash_with_rng(
                        key,
                        &mut OsRng,
                        prehash,
                    )
                    .map_err(|e| e.to_string())?;
                let sig = sig.normalize_s().unwrap_or(sig);
                let recid =
                    RecoveryId::trial_recovery_from_prehash(key.verifying_key(), prehash, &sig)
                        .map_err(|e| e.to_string())?;
                (sig, recid)
            };
            // ids 2 and 3 cannot be expressed as v = 27/28
            if recid.is_x_reduced() {
                return Err("r overflowed the curve order".to_string());
            }
            Ok((sig, recid))
        })
    }
}

/// Run `attempt` until it succeeds, at most [`MAX_SIGNING_ATTEMPTS`] times.
fn with_retries<T, F>(mut attempt: F) -> Result<T, SigningError>
where
    F: FnMut(usize) -> Result<T, String>,
{
    let mut reason = String::new();
    for n in 0..MAX_SIGNING_ATTEMPTS {
        match attempt(n) {
            Ok(v) => return Ok(v),
            Err(e) => {
                warn!(attempt = n + 1, error = %e, "degenerate signature, retrying with a fresh nonce");
                reason = e;
            }
        }
    }
    Err(SigningError::Exhausted {
        attempts: MAX_SIGNING_ATTEMPTS,
        reason,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::parse_addr;
    use crate::verify::{recover_identity, verify_message, VerifyOptions};

    const KEY: &str = "4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318";

    fn signer(nonce: NoncePolicy) -> Signer {
        let options = SignerOptions {
            nonce,
            ..Default::default()
        };
        Signer::with_options(&hex::decode(KEY).unwrap(), options).unwrap()
    }

    fn zero_auth() -> PaymentAuthorization {
        PaymentAuthorization::new(
            parse_addr("0x2011000000000000000000000000000000000000").unwrap(),
            0,
            U256::zero(),
            U256::zero(),
        )
    }

    #[test]
    fn test_deterministic_signatures_repeat() {
        let s = signer(NoncePolicy::Deterministic);
        let a = s.sign_authorization(&zero_auth()).unwrap();
        let b = s.sign_authorization(&zero_auth()).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.signature.to_vec(), b.signature.to_vec());
    }

    #[test]
    fn test_random_signatures_differ_but_verify() {
        let s = signer(NoncePolicy::Random);
        let a = s.sign_authorization(&zero_auth()).unwrap();
        let b = s.sign_authorization(&zero_auth()).unwrap();
        assert_ne!(a.signature, b.signature);
        assert_eq!(a.hash, b.hash);
        assert!(verify_message(&a, s.identity(), VerifyOptions::default()).unwrap());
        assert!(verify_message(&b, s.identity(), VerifyOptions::default()).unwrap());
    }

    #[test]
    fn test_matches_ethers_sign_hash() {
        let s = signer(NoncePolicy::Deterministic);
        let msg = s.sign_authorization(&zero_auth()).unwrap();
        let wallet = ethers_signers::LocalWallet::from_bytes(&hex::decode(KEY).unwrap()).unwrap();
        let theirs = wallet.sign_hash(msg.hash).unwrap();
        assert_eq!(msg.signature, theirs);
    }

    #[test]
    fn test_v_is_offset_recovery_id() {
        let s = signer(NoncePolicy::Random);
        for i in 0..8u64 {
            let auth = PaymentAuthorization::new(Address::zero(), 1, U256::from(i), U256::from(i));
            let msg = s.sign_authorization(&auth).unwrap();
            assert!(msg.signature.v == 27 || msg.signature.v == 28);
        }
    }

    #[test]
    fn test_signatures_are_low_s() {
        let half_order = U256::from_str_radix(
            "7fffffffffffffffffffffffffffffff5d576e7357a4501ddfe92f46681b20a0",
            16,
        )
        .unwrap();
        let s = signer(NoncePolicy::Random);
        for i in 0..16u64 {
            let auth = PaymentAuthorization::new(Address::zero(), 0, U256::from(i), U256::zero());
            let msg = s.sign_authorization(&auth).unwrap();
            assert!(msg.signature.s <= half_order);
        }
    }

    #[test]
    fn test_personal_message_digest_recovers_with_ethers() {
        let options = SignerOptions {
            layout: Layout::ContractPacked,
            digest: DigestScheme::PersonalMessage,
            nonce: NoncePolicy::Deterministic,
        };
        let s = Signer::with_options(&hex::decode(KEY).unwrap(), options).unwrap();
        let msg = s.sign_authorization(&zero_auth()).unwrap();
        let recovered = msg.signature.recover(msg.hash).unwrap();
        assert_eq!(recovered, s.identity());
        let opts = VerifyOptions {
            layout: Layout::ContractPacked,
            digest: DigestScheme::PersonalMessage,
        };
        assert_eq!(
            recover_identity(&zero_auth(), &msg.signature, opts).unwrap(),
            s.identity()
        );
    }

    #[test]
    fn test_shared_across_threads() {
        let s = signer(NoncePolicy::Random);
        std::thread::scope(|scope| {
            let handles: Vec<_> = (0..4u64)
                .map(|t| {
                    let s = &s;
                    scope.spawn(move || {
                        let auth = PaymentAuthorization::new(
                            Address::repeat_byte(t as u8),
                            t as u8,
                            U256::from(t),
                            U256::from(1000 + t),
                        );
                        let msg = s.sign_authorization(&auth).unwrap();
                        verify_message(&msg, s.identity(), VerifyOptions::default()).unwrap()
                    })
                })
                .collect();
            for h in handles {
                assert!(h.join().unwrap());
            }
        });
    }

    #[test]
    fn test_random_policy_recovery_id_matches_key() {
        let s = signer(NoncePolicy::Random);
        let vk = s.key.signing_key().verifying_key();
        for i in 0..16u64 {
            let auth = PaymentAuthorization::new(Address::zero(), 2, U256::from(i), U256::one());
            let hash = payment_hash(&auth, Layout::Canonical, DigestScheme::Raw).unwrap();
            let (sig, recid) = s.sign_digest(&hash).unwrap();
            assert!(sig.normalize_s().is_none());
            let recovered =
                k256::ecdsa::VerifyingKey::recover_from_prehash(hash.as_bytes(), &sig, recid)
                    .unwrap();
            assert_eq!(&recovered, vk);
        }
    }

    #[test]
    fn test_retry_recovers_from_transient_failure() {
        let mut calls = 0;
        let out = with_retries(|n| {
            calls += 1;
            if n < 2 {
                Err("degenerate".to_string())
            } else {
                Ok(n)
            }
        })
        .unwrap();
        assert_eq!(out, 2);
        assert_eq!(calls, 3);
    }

    #[test]
    fn test_retry_is_bounded() {
        let mut calls = 0;
        let err = with_retries::<(), _>(|_| {
            calls += 1;
            Err("zero point".to_string())
        })
        .unwrap_err();
        assert_eq!(calls, MAX_SIGNING_ATTEMPTS);
        let SigningError::Exhausted { attempts, reason } = err;
        assert_eq!(attempts, MAX_SIGNING_ATTEMPTS);
        assert_eq!(reason, "zero point");
    }

    #[test]
    fn test_sign_fields_equals_sign_authorization() {
        let s = signer(NoncePolicy::Deterministic);
        let auth = zero_auth();
        let a = s
            .sign(auth.recipient(), auth.method(), auth.sequence(), auth.amount())
            .unwrap();
        assert_eq!(a, s.sign_authorization(&auth).unwrap());
    }
}
