//! Sealed envelope keystore: Argon2id + XChaCha20-Poly1305.
//!
//! File layout (little-endian integers):
//! `[8B noise?][u8 version][u8 kdf_id][u32 t_cost][u32 m_cost_kib][u8 p_cost]`
//! `[u8 salt_len][salt][u8 nonce_len=24][nonce][ciphertext || tag]`
//!
//! The whole header, noise included, is the AEAD associated data. The
//! plaintext is a JSON object carrying `private_key_hex`.

use argon2::{Algorithm, Argon2, Params, Version};
use chacha20poly1305::aead::{Aead, KeyInit, Payload};
use chacha20poly1305::{XChaCha20Poly1305, XNonce};
use rand_chacha::ChaCha20Rng;
use rand_core::{RngCore, SeedableRng};
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::{BufWriter, Write};
use std::path::Path;
use zeroize::{Zeroize, Zeroizing};

use crate::defaults::Defaults;
use crate::error::{DecryptionError, SealError};
use crate::key::{raw_key_from_input, KeyMaterial, RawKey};
use crate::util::bytes_to_0x;

const VERSION: u8 = 1;
const KDF_ID_ARGON2ID: u8 = 1;
const NONCE_LEN: usize = 24;
const SALT_LEN: usize = 16;
const NOISE_LEN: usize = 8;
const TAG_LEN: usize = 16;

/// Upper bounds on header costs; a header asking for more is corrupt or hostile.
const MAX_T_COST: u32 = 64;
const MAX_M_COST_KIB: u32 = 4 * 1024 * 1024; // 4 GiB
const MAX_P_COST: u8 = 16;

/// Argon2id cost and header options for [`seal`].
#[derive(Debug, Clone)]
pub struct SealOptions {
    pub nickname: String,
    /// iterations
    pub t_cost: u32,
    /// memory in KiB
    pub m_cost_kib: u32,
    /// parallelism
    pub p_cost: u8,
    /// Prepend 8 random bytes so the file does not start with a fixed header.
    pub add_noise_prefix: bool,
}

impl Default for SealOptions {
    fn default() -> Self {
        Self {
            nickname: "payment-signer".to_string(),
            t_cost: Defaults::ARGON2_T_COST,
            m_cost_kib: Defaults::ARGON2_M_COST_KIB,
            p_cost: Defaults::ARGON2_P_COST,
            add_noise_prefix: true,
        }
    }
}

#[derive(Serialize)]
struct SealedPayload<'a> {
    key_pair_nickname: &'a str,
    private_key_hex: &'a str,
    eth_address: String,
}

#[derive(Deserialize)]
struct OpenedPayload {
    private_key_hex: String,
}

#[derive(Debug)]
struct Header {
    /// Exact bytes used as AAD (includes optional noise).
    aad_len: usize,
    t_cost: u32,
    m_cost_kib: u32,
    p_cost: u8,
    salt: Vec<u8>,
    nonce: Vec<u8>,
}

fn take<'a>(buf: &'a [u8], i: &mut usize, n: usize) -> Option<&'a [u8]> {
    let s = buf.get(*i..*i + n)?;
    *i += n;
    Some(s)
}

/// Attempt to parse a header at the given offset (0 or 8).
fn try_parse_header_at(buf: &[u8], off: usize) -> Option<Header> {
    let mut i = off;

    let version = take(buf, &mut i, 1)?[0];
    let kdf_id = take(buf, &mut i, 1)?[0];
    if version != VERSION || kdf_id != KDF_ID_ARGON2ID {
        return None;
    }
    let t_cost = u32::from_le_bytes(take(buf, &mut i, 4)?.try_into().ok()?);
    let m_cost_kib = u32::from_le_bytes(take(buf, &mut i, 4)?.try_into().ok()?);
    let p_cost = take(buf, &mut i, 1)?[0];
    let salt_len = take(buf, &mut i, 1)?[0] as usize;
    let salt = take(buf, &mut i, salt_len)?.to_vec();
    let nonce_len = take(buf, &mut i, 1)?[0] as usize;
    let nonce = take(buf, &mut i, nonce_len)?.to_vec();

    // AAD is the entire prefix up to the end of the parsed header
    Some(Header {
        aad_len: i,
        t_cost,
        m_cost_kib,
        p_cost,
        salt,
        nonce,
    })
}

/// Parse the header, trying without noise first, then with 8-byte noise.
fn parse_header(buf: &[u8]) -> Option<Header> {
    try_parse_header_at(buf, 0).or_else(|| try_parse_header_at(buf, NOISE_LEN))
}

pub(crate) fn looks_like_envelope(buf: &[u8]) -> bool {
    parse_header(buf).is_some()
}

fn check_costs(t_cost: u32, m_cost_kib: u32, p_cost: u8) -> Result<(), String> {
    if t_cost > MAX_T_COST {
        return Err(format!("t_cost {t_cost} exceeds {MAX_T_COST}"));
    }
    if m_cost_kib > MAX_M_COST_KIB {
        return Err(format!("m_cost {m_cost_kib} KiB exceeds {MAX_M_COST_KIB} KiB"));
    }
    if p_cost > MAX_P_COST {
        return Err(format!("p_cost {p_cost} exceeds {MAX_P_COST}"));
    }
    Ok(())
}

fn derive_key(
    passphrase: &[u8],
    salt: &[u8],
    t_cost: u32,
    m_cost_kib: u32,
    p_cost: u8,
) -> Result<Zeroizing<[u8; 32]>, String> {
    check_costs(t_cost, m_cost_kib, p_cost)?;
    let params = Params::new(m_cost_kib, t_cost, u32::from(p_cost), None)
        .map_err(|e| format!("invalid Argon2 params: {e}"))?;
    let argon = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);
    let mut key = Zeroizing::new([0u8; 32]);
    argon
        .hash_password_into(passphrase, salt, &mut *key)
        .map_err(|e| format!("Argon2 error: {e}"))?;
    Ok(key)
}

/// Decrypt an envelope already read into memory.
pub fn open(data: &[u8], passphrase: &[u8]) -> Result<RawKey, DecryptionError> {
    let header = parse_header(data).ok_or_else(|| {
        DecryptionError::Envelope("not a recognized header (version/kdf/structure mismatch)".into())
    })?;
    if header.nonce.len() != NONCE_LEN {
        return Err(DecryptionError::Envelope(format!(
            "unexpected nonce length {} (expected {NONCE_LEN})",
            header.nonce.len()
        )));
    }
    check_costs(header.t_cost, header.m_cost_kib, header.p_cost)
        .map_err(|e| DecryptionError::Envelope(format!("refusing header costs: {e}")))?;
    let ciphertext = &data[header.aad_len..];
    if ciphertext.len() < TAG_LEN {
        return Err(DecryptionError::Envelope("ciphertext too short (missing tag)".into()));
    }

    let key = derive_key(
        passphrase,
        &header.salt,
        header.t_cost,
        header.m_cost_kib,
        header.p_cost,
    )
    .map_err(DecryptionError::Envelope)?;
    let cipher = XChaCha20Poly1305::new((&*key).into());
    let plaintext = Zeroizing::new(
        cipher
            .decrypt(
                XNonce::from_slice(&header.nonce),
                Payload {
                    aad: &data[..header.aad_len],
                    msg: ciphertext,
                },
            )
            .map_err(|_| {
                DecryptionError::Envelope("decrypt failed (wrong passphrase or tampered file)".into())
            })?,
    );

    let mut payload: OpenedPayload = serde_json::from_slice(&plaintext)
        .map_err(|e| DecryptionError::Payload(e.to_string()))?;
    let raw = raw_key_from_input(&payload.private_key_hex)
        .map_err(|e| DecryptionError::Payload(e.to_string()));
    payload.private_key_hex.zeroize();
    raw
}

/// Encrypt `raw_key` into a new envelope file. Never overwrites an existing file.
pub fn seal(
    path: &Path,
    raw_key: &[u8],
    passphrase: &[u8],
    opts: &SealOptions,
) -> Result<(), SealError> {
    // refuse to seal something that is not a usable key
    let identity = KeyMaterial::from_bytes(raw_key)?.identity();
    let private_key_hex = Zeroizing::new(bytes_to_0x(raw_key));
    let payload = Zeroizing::new(serde_json::to_string_pretty(&SealedPayload {
        key_pair_nickname: &opts.nickname,
        private_key_hex: &private_key_hex,
        eth_address: bytes_to_0x(identity.as_bytes()),
    })?);

    let mut rng = ChaCha20Rng::from_entropy();
    let mut salt = [0u8; SALT_LEN];
    rng.fill_bytes(&mut salt);
    let mut nonce = [0u8; NONCE_LEN];
    rng.fill_bytes(&mut nonce);

    let mut header =
        Vec::with_capacity(NOISE_LEN + 1 + 1 + 4 + 4 + 1 + 1 + SALT_LEN + 1 + NONCE_LEN);
    if opts.add_noise_prefix {
        let mut noise = [0u8; NOISE_LEN];
        rng.fill_bytes(&mut noise);
        header.extend_from_slice(&noise);
    }
    header.push(VERSION);
    header.push(KDF_ID_ARGON2ID);
    header.extend_from_slice(&opts.t_cost.to_le_bytes());
    header.extend_from_slice(&opts.m_cost_kib.to_le_bytes());
    header.push(opts.p_cost);
    header.push(SALT_LEN as u8);
    header.extend_from_slice(&salt);
    header.push(NONCE_LEN as u8);
    header.extend_from_slice(&nonce);

    let key = derive_key(passphrase, &salt, opts.t_cost, opts.m_cost_kib, opts.p_cost)
        .map_err(SealError::Kdf)?;
    let cipher = XChaCha20Poly1305::new((&*key).into());
    let ciphertext = cipher
        .encrypt(
            XNonce::from_slice(&nonce),
            Payload {
                aad: &header,
                msg: payload.as_bytes(),
            },
        )
        .map_err(|e| SealError::Encrypt(e.to_string()))?;

    let f = OpenOptions::new().write(true).create_new(true).open(path)?;
    let mut w = BufWriter::new(f);
    w.write_all(&header)?;
    w.write_all(&ciphertext)?;
    w.flush()?;
    Ok(())
}
