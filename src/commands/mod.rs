pub mod address;
pub mod hash;
pub mod seal;
pub mod sign;
pub mod verify;

use anyhow::{anyhow, bail, Context, Result};
use std::path::PathBuf;
use zeroize::Zeroizing;

use payment_signer::config::SignerConfig;
use payment_signer::key::raw_key_from_input;
use payment_signer::{PaymentAuthorization, Signer, SignerOptions};

use crate::cli::{KeyArgs, PaymentArgs};

/// Build a signer from `--key`, or from a keystore named by flag or config.
pub fn load_signer(
    key: KeyArgs,
    config: &SignerConfig,
    options: SignerOptions,
) -> Result<Signer> {
    let KeyArgs {
        keystore,
        passphrase,
        key,
    } = key;
    let passphrase = passphrase.map(Zeroizing::new);

    if let Some(input) = key.map(Zeroizing::new) {
        let raw = raw_key_from_input(&input).context("parsing --key")?;
        return Ok(Signer::with_options(&raw, options)?);
    }

    let path: PathBuf = config
        .keystore(keystore)
        .ok_or_else(|| anyhow!("no key given: pass --keystore or --key, or set it in the config"))?;
    let Some(passphrase) = passphrase else {
        bail!("keystore {} needs a passphrase (--passphrase or env)", path.display());
    };
    Signer::from_keystore(&path, passphrase.as_bytes(), options)
        .with_context(|| format!("loading signer from {}", path.display()))
}

/// All four payment flags, or an error naming the missing one.
pub fn authorization_from_args(args: &PaymentArgs) -> Result<PaymentAuthorization> {
    let required = |flag: &str| anyhow!("--{flag} is required");
    let recipient = args.recipient.as_deref().ok_or_else(|| required("recipient"))?;
    let method = args.method.ok_or_else(|| required("method"))?;
    let sequence = args.sequence.as_deref().ok_or_else(|| required("sequence"))?;
    let amount = args.amount.as_deref().ok_or_else(|| required("amount"))?;
    Ok(PaymentAuthorization::parse(recipient, method, sequence, amount)?)
}
