//! Optional TOML configuration for the operator CLI.
//!
//! ```toml
//! keystore = "./keys/signer.json"
//! layout = "contract_packed"
//! digest = "raw"
//! nonce = "deterministic"
//! out_dir = "./signed_payments"
//! ```
//!
//! Every key is optional and command-line flags win over the file. The
//! keystore passphrase has no config key: unknown keys, `passphrase`
//! included, are rejected.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

use crate::defaults::Defaults;
use crate::encoding::Layout;
use crate::hash::DigestScheme;
use crate::signing::{NoncePolicy, SignerOptions};
use crate::verify::VerifyOptions;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parsing {path}: {message}")]
    Parse { path: PathBuf, message: String },
    #[error("validation error: {0}")]
    Validation(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SignerConfig {
    pub keystore: Option<PathBuf>,
    pub layout: Option<Layout>,
    pub digest: Option<DigestScheme>,
    pub nonce: Option<NoncePolicy>,
    pub out_dir: Option<PathBuf>,
}

impl SignerConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&text).map_err(|e| match e {
            ConfigError::Parse { message, .. } => ConfigError::Parse {
                path: path.to_path_buf(),
                message,
            },
            other => other,
        })?;
        debug!(path = %path.display(), ?config, "loaded config");
        Ok(config)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text).map_err(|e| ConfigError::Parse {
            path: PathBuf::new(),
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.keystore.as_ref().is_some_and(|p| p.as_os_str().is_empty()) {
            return Err(ConfigError::Validation("keystore path cannot be empty".into()));
        }
        if self.out_dir.as_ref().is_some_and(|p| p.as_os_str().is_empty()) {
            return Err(ConfigError::Validation("out_dir cannot be empty".into()));
        }
        Ok(())
    }

    /// Signer options: flag, then file, then built-in default.
    pub fn signer_options(
        &self,
        layout: Option<Layout>,
        digest: Option<DigestScheme>,
        nonce: Option<NoncePolicy>,
    ) -> SignerOptions {
        SignerOptions {
            layout: layout.or(self.layout).unwrap_or(Defaults::LAYOUT),
            digest: digest.or(self.digest).unwrap_or(Defaults::DIGEST),
            nonce: nonce.or(self.nonce).unwrap_or(Defaults::NONCE),
        }
    }

    pub fn verify_options(
        &self,
        layout: Option<Layout>,
        digest: Option<DigestScheme>,
    ) -> VerifyOptions {
        self.signer_options(layout, digest, None).into()
    }

    pub fn keystore(&self, flag: Option<PathBuf>) -> Option<PathBuf> {
        flag.or_else(|| self.keystore.clone())
    }

    pub fn out_dir(&self, flag: Option<PathBuf>) -> PathBuf {
        flag.or_else(|| self.out_dir.clone())
            .unwrap_or_else(|| PathBuf::from(Defaults::OUT_DIR))
    }
}
