//! Web3 Secret Storage v3 JSON (scrypt or pbkdf2, aes-128-ctr).

use ethers_signers::LocalWallet;
use std::path::Path;
use zeroize::{Zeroize, Zeroizing};

use crate::error::DecryptionError;
use crate::key::RawKey;

pub(crate) fn open(path: &Path, passphrase: &[u8]) -> Result<RawKey, DecryptionError> {
    let wallet = LocalWallet::decrypt_keystore(path, passphrase)
        .map_err(|e| DecryptionError::Web3(e.to_string()))?;
    let mut bytes = wallet.signer().to_bytes();
    let raw = Zeroizing::new(bytes.to_vec());
    bytes.as_mut_slice().zeroize();
    Ok(raw)
}
