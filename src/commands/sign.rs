use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use payment_signer::{PaymentAuthorization, SignedPaymentMessage, Signer};

use crate::output::{filename_for, write_json};

/// One entry of a batch file. Integers may be JSON numbers or decimal/0x-hex strings.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PaymentRequest {
    pub recipient: String,
    pub method: u8,
    pub sequence: Uint,
    pub amount: Uint,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum Uint {
    Num(u64),
    Str(String),
}

impl Uint {
    fn as_text(&self) -> String {
        match self {
            Uint::Num(n) => n.to_string(),
            Uint::Str(s) => s.clone(),
        }
    }
}

impl PaymentRequest {
    fn authorization(&self) -> Result<PaymentAuthorization> {
        Ok(PaymentAuthorization::parse(
            &self.recipient,
            self.method,
            &self.sequence.as_text(),
            &self.amount.as_text(),
        )?)
    }
}

pub fn load_batch(path: &Path) -> Result<Vec<PaymentAuthorization>> {
    let text = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let items: Vec<PaymentRequest> =
        serde_json::from_str(&text).context("parsing batch JSON (array)")?;
    items
        .iter()
        .enumerate()
        .map(|(i, it)| it.authorization().with_context(|| format!("batch entry #{i}")))
        .collect()
}

pub fn sign_all(
    signer: &Signer,
    auths: &[PaymentAuthorization],
) -> Result<Vec<SignedPaymentMessage>> {
    auths
        .iter()
        .enumerate()
        .map(|(i, a)| {
            signer
                .sign_authorization(a)
                .with_context(|| format!("signing entry #{i}"))
        })
        .collect()
}

/// Single authorizations go to their own file; a batch goes to one array file.
pub fn emit(
    messages: &[SignedPaymentMessage],
    batch: Option<&Path>,
    out_dir: &Path,
    to_stdout: bool,
) -> Result<Option<PathBuf>> {
    if to_stdout {
        let json = match (batch, messages) {
            (None, [one]) => serde_json::to_string_pretty(one)?,
            _ => serde_json::to_string_pretty(messages)?,
        };
        println!("{json}");
        return Ok(None);
    }

    let written = match (batch, messages) {
        (None, [one]) => write_json(out_dir.join(filename_for(one)), one, true)?,
        (batch, _) => {
            let stem = batch
                .and_then(|p| p.file_stem())
                .and_then(|s| s.to_str())
                .unwrap_or("batch");
            write_json(out_dir.join(format!("{stem}_signed.json")), messages, true)?
        }
    };
    info!(count = messages.len(), path = %written.display(), "wrote signed payments");
    Ok(Some(written))
}
