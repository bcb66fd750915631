use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

mod cli;
mod commands;
mod output;

use payment_signer::config::SignerConfig;
use payment_signer::defaults::Defaults;
use payment_signer::keystore::SealOptions;
use zeroize::Zeroizing;

use crate::cli::{Cli, Command};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // stdout carries JSON, so logs go to stderr
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let config = match &cli.config {
        Some(path) => SignerConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => SignerConfig::default(),
    };

    match cli.cmd {
        Command::Sign {
            key,
            payment,
            batch,
            digest,
            nonce,
            out_dir,
            stdout,
        } => {
            let options = config.signer_options(digest.layout, digest.digest, nonce);
            let signer = commands::load_signer(key, &config, options)?;
            let auths = match &batch {
                Some(path) => commands::sign::load_batch(path)?,
                None => vec![commands::authorization_from_args(&payment)?],
            };
            let messages = commands::sign::sign_all(&signer, &auths)?;
            let out_dir = config.out_dir(out_dir);
            let written = commands::sign::emit(&messages, batch.as_deref(), &out_dir, stdout)?;
            if let Some(path) = written {
                println!("✓ Wrote {}", path.display());
            }
            Ok(())
        }

        Command::Verify {
            message,
            identity,
            digest,
        } => {
            let options = config.verify_options(digest.layout, digest.digest);
            commands::verify::run(&message, &identity, options)
        }

        Command::Hash {
            payment,
            digest,
            show_encoding,
        } => {
            let auth = commands::authorization_from_args(&payment)?;
            let options = config.verify_options(digest.layout, digest.digest);
            commands::hash::run(&auth, options.layout, options.digest, show_encoding)
        }

        Command::Address { key } => {
            let signer = commands::load_signer(key, &config, Default::default())?;
            commands::address::run(&signer);
            Ok(())
        }

        Command::Seal {
            key,
            passphrase,
            out,
            nickname,
            t_cost,
            m_cost_kib,
        } => {
            let key = Zeroizing::new(key);
            let passphrase = Zeroizing::new(passphrase);
            let opts = SealOptions {
                nickname,
                t_cost,
                m_cost_kib,
                p_cost: Defaults::ARGON2_P_COST,
                add_noise_prefix: true,
            };
            commands::seal::run(&key, &passphrase, out, &opts)?;
            Ok(())
        }
    }
}
