use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::info;
use zeroize::Zeroizing;

use payment_signer::defaults::Defaults;
use payment_signer::key::{raw_key_from_input, KeyMaterial};
use payment_signer::keystore::{self, SealOptions};

pub fn run(
    key: &str,
    passphrase: &str,
    out: Option<PathBuf>,
    opts: &SealOptions,
) -> Result<PathBuf> {
    let raw = raw_key_from_input(key).context("parsing key")?;
    let identity = KeyMaterial::from_bytes(&raw)?.identity();

    let path = out.unwrap_or_else(|| {
        Path::new(Defaults::SEALED_KEY_OUT_DIR).join(format!("{identity:#x}.enc"))
    });
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating directory {}", parent.display()))?;
        }
    }

    let passphrase = Zeroizing::new(passphrase.as_bytes().to_vec());
    keystore::seal(&path, &raw, &passphrase, opts)
        .with_context(|| format!("sealing key into {}", path.display()))?;
    info!(identity = ?identity, path = %path.display(), "sealed key");
    println!("{identity:#x} -> {}", path.display());
    Ok(path)
}
