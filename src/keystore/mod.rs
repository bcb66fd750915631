//! Keystore loading. Two on-disk formats are recognized by content, not by
//! file extension: Web3 Secret Storage v3 JSON and the sealed envelope.

pub mod envelope;
mod web3;

use std::fmt;
use std::fs;
use std::path::Path;
use tracing::info;
use zeroize::Zeroizing;

use crate::error::DecryptionError;
use crate::key::RawKey;

pub use envelope::{seal, SealOptions};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeystoreFormat {
    Web3,
    Envelope,
}

impl fmt::Display for KeystoreFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeystoreFormat::Web3 => f.write_str("web3 v3 json"),
            KeystoreFormat::Envelope => f.write_str("argon2id + xchacha20-poly1305 envelope"),
        }
    }
}

/// Recognize the keystore format from file contents.
pub fn detect(data: &[u8]) -> Option<KeystoreFormat> {
    match data.iter().find(|b| !b.is_ascii_whitespace()) {
        Some(b'{') => Some(KeystoreFormat::Web3),
        _ if envelope::looks_like_envelope(data) => Some(KeystoreFormat::Envelope),
        _ => None,
    }
}

/// Decrypt the keystore at `path` and return the raw private key bytes.
pub fn decrypt(path: &Path, passphrase: &[u8]) -> Result<RawKey, DecryptionError> {
    let data = Zeroizing::new(fs::read(path).map_err(|source| DecryptionError::Io {
        path: path.to_path_buf(),
        source,
    })?);
    let format =
        detect(&data).ok_or_else(|| DecryptionError::UnrecognizedFormat(path.to_path_buf()))?;
    info!(path = %path.display(), %format, "opening keystore");

    match format {
        KeystoreFormat::Web3 => web3::open(path, passphrase),
        KeystoreFormat::Envelope => envelope::open(&data, passphrase),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethers_signers::LocalWallet;
    use rand_core::OsRng;

    fn cheap() -> SealOptions {
        SealOptions {
            nickname: "test".into(),
            t_cost: 1,
            m_cost_kib: 64,
            p_cost: 1,
            add_noise_prefix: true,
        }
    }

    #[test]
    fn test_detect() {
        assert_eq!(detect(b"  \n{\"version\":3}"), Some(KeystoreFormat::Web3));
        assert_eq!(detect(b"plain text"), None);
        assert_eq!(detect(b""), None);
    }

    #[test]
    fn test_decrypt_envelope() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("k.enc");
        let key = [0x22u8; 32];
        seal(&path, &key, b"pw", &cheap()).unwrap();
        assert_eq!(decrypt(&path, b"pw").unwrap().as_slice(), &key);
    }

    #[test]
    fn test_decrypt_web3() {
        let dir = tempfile::tempdir().unwrap();
        LocalWallet::new_keystore(dir.path(), &mut OsRng, "pw", Some("k.json")).unwrap();
        assert_eq!(decrypt(&dir.path().join("k.json"), b"pw").unwrap().len(), 32);
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = decrypt(&dir.path().join("absent"), b"pw").unwrap_err();
        assert!(matches!(err, DecryptionError::Io { .. }));
    }

    #[test]
    fn test_unrecognized_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        fs::write(&path, "not a keystore").unwrap();
        let err = decrypt(&path, b"pw").unwrap_err();
        assert!(matches!(err, DecryptionError::UnrecognizedFormat(_)));
    }
}
