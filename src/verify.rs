//! Recovery of the signer's identity from a signed authorization.
//!
//! Nothing supplied alongside a signature is trusted: the digest is always
//! recomputed from the authorization fields, and the recovered identity is
//! compared to the expected one in constant time. A well-formed signature by
//! someone else is `Ok(false)`; only malformed input is an error.

use ethers_core::types::{Address, Signature, U256};
use k256::ecdsa::{RecoveryId, Signature as EcdsaSignature, VerifyingKey};
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;
use tracing::{debug, warn};

use crate::encoding::Layout;
use crate::error::RecoveryError;
use crate::hash::{payment_hash, DigestScheme};
use crate::key::identity_of;
use crate::signing::{SignerOptions, V_OFFSET};
use crate::types::{Identity, PaymentAuthorization, SignedPaymentMessage};
use crate::util::u256_to_be32;

/// secp256k1 group order n.
const CURVE_ORDER: U256 = U256([
    0xbfd2_5e8c_d036_4141,
    0xbaae_dce6_af48_a03b,
    0xffff_ffff_ffff_fffe,
    0xffff_ffff_ffff_ffff,
]);

/// floor(n / 2); larger `s` values are the malleable twin of a valid signature.
const HALF_ORDER: U256 = U256([
    0xdfe9_2f46_681b_20a0,
    0x5d57_6e73_57a4_501d,
    0xffff_ffff_ffff_ffff,
    0x7fff_ffff_ffff_ffff,
]);

/// How the verifier rebuilds the digest. Must match what the signer used.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyOptions {
    #[serde(default)]
    pub layout: Layout,
    #[serde(default)]
    pub digest: DigestScheme,
}

impl From<SignerOptions> for VerifyOptions {
    fn from(o: SignerOptions) -> Self {
        Self {
            layout: o.layout,
            digest: o.digest,
        }
    }
}

/// Identity whose key produced `signature` over `auth`.
pub fn recover_identity(
    auth: &PaymentAuthorization,
    signature: &Signature,
    options: VerifyOptions,
) -> Result<Identity, RecoveryError> {
    let (sig, recid) = parse_signature(signature)?;
    let hash = payment_hash(auth, options.layout, options.digest)?;
    let vk = VerifyingKey::recover_from_prehash(hash.as_bytes(), &sig, recid)
        .map_err(|_| RecoveryError::Unrecoverable)?;
    Ok(identity_of(&vk))
}

pub fn verify_authorization(
    auth: &PaymentAuthorization,
    signature: &Signature,
    expected: Identity,
    options: VerifyOptions,
) -> Result<bool, RecoveryError> {
    let recovered = recover_identity(auth, signature, options)?;
    let matched: bool = recovered.as_bytes().ct_eq(expected.as_bytes()).into();
    debug!(?expected, ?recovered, matched, "checked payment signature");
    Ok(matched)
}

/// Verify with the default layout and digest.
pub fn verify(
    recipient: Address,
    method: u8,
    sequence: U256,
    amount: U256,
    signature: &Signature,
    expected: Identity,
) -> Result<bool, RecoveryError> {
    let auth = PaymentAuthorization::new(recipient, method, sequence, amount);
    verify_authorization(&auth, signature, expected, VerifyOptions::default())
}

/// Verify a received message under the verifier's own `options`.
///
/// The layout and digest a message declares are checked against `options`
/// and never used to rebuild the hash: the two layouts can encode different
/// authorizations to the same bytes. The carried `hash` is ignored; a
/// mismatch with the recomputed one is logged.
pub fn verify_message(
    msg: &SignedPaymentMessage,
    expected: Identity,
    options: VerifyOptions,
) -> Result<bool, RecoveryError> {
    if msg.layout != options.layout {
        return Err(RecoveryError::LayoutMismatch {
            expected: options.layout,
            declared: msg.layout,
        });
    }
    if msg.digest != options.digest {
        return Err(RecoveryError::DigestMismatch {
            expected: options.digest,
            declared: msg.digest,
        });
    }
    let recomputed = payment_hash(&msg.authorization, options.layout, options.digest)?;
    if recomputed != msg.hash {
        warn!(carried = ?msg.hash, ?recomputed, "signed message carries a stale or forged hash");
    }
    verify_authorization(&msg.authorization, &msg.signature, expected, options)
}

fn parse_signature(signature: &Signature) -> Result<(EcdsaSignature, RecoveryId), RecoveryError> {
    let parity = match signature.v {
        0 | 1 => signature.v,
        v @ (27 | 28) => v - V_OFFSET,
        other => return Err(RecoveryError::InvalidRecoveryIndicator(other)),
    };
    check_scalar("r", signature.r)?;
    check_scalar("s", signature.s)?;
    if signature.s > HALF_ORDER {
        return Err(RecoveryError::HighS);
    }

    let mut rs = [0u8; 64];
    rs[..32].copy_from_slice(&u256_to_be32(signature.r));
    rs[32..].copy_from_slice(&u256_to_be32(signature.s));
    let sig = EcdsaSignature::from_slice(&rs).map_err(|_| RecoveryError::Unrecoverable)?;
    let recid = RecoveryId::from_byte(parity as u8)
        .ok_or(RecoveryError::InvalidRecoveryIndicator(signature.v))?;
    Ok((sig, recid))
}

fn check_scalar(name: &'static str, x: U256) -> Result<(), RecoveryError> {
    if x.is_zero() || x >= CURVE_ORDER {
        return Err(RecoveryError::ScalarOutOfRange(name));
    }
    Ok(())
}
