//! Central place for default values.
//! Update these and the library, config loader and CLI all pick them up.

use crate::encoding::Layout;
use crate::hash::DigestScheme;
use crate::signing::NoncePolicy;

pub struct Defaults;

impl Defaults {
    /* Signing */
    pub const LAYOUT: Layout = Layout::Canonical;
    pub const DIGEST: DigestScheme = DigestScheme::Raw;
    pub const NONCE: NoncePolicy = NoncePolicy::Deterministic;

    /* Output */
    pub const OUT_DIR: &'static str = "./signed_payments";
    pub const SEALED_KEY_OUT_DIR: &'static str = "./sealed_keys";

    /* Secrets */
    pub const PASSPHRASE_ENV: &'static str = "PAYMENT_SIGNER_PASSPHRASE";
    pub const CONFIG_ENV: &'static str = "PAYMENT_SIGNER_CONFIG";
    pub const KEY_ENV: &'static str = "PAYMENT_SIGNER_KEY";

    /* Envelope Argon2id costs */
    pub const ARGON2_T_COST: u32 = 3;
    pub const ARGON2_M_COST_KIB: u32 = 262_144; // 256 MiB
    pub const ARGON2_P_COST: u8 = 1;

    pub const LOG_LEVEL: &'static str = "info";
}
