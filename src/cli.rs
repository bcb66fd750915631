use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use payment_signer::defaults::Defaults;
use payment_signer::{DigestScheme, Layout, NoncePolicy};

/// Offline signer for payment authorizations
#[derive(Parser, Debug)]
#[command(version, about = "Sign and verify payment authorizations offline")]
pub struct Cli {
    /// Optional TOML config (keystore, layout, digest, nonce, out_dir)
    #[arg(long, global = true, env = Defaults::CONFIG_ENV)]
    pub config: Option<PathBuf>,

    /// Log filter when RUST_LOG is unset (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = Defaults::LOG_LEVEL)]
    pub log_level: String,

    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Sign one authorization given by flags, or every entry of a batch JSON array
    Sign {
        #[command(flatten)]
        key: KeyArgs,

        #[command(flatten)]
        payment: PaymentArgs,

        /// JSON array of {recipient, method, sequence, amount}
        #[arg(long, conflicts_with_all = ["recipient", "method", "sequence", "amount"])]
        batch: Option<PathBuf>,

        #[command(flatten)]
        digest: DigestArgs,

        /// deterministic (RFC 6979) or random (hedged)
        #[arg(long)]
        nonce: Option<NoncePolicy>,

        /// Directory for signed JSON files (never overwritten)
        #[arg(long)]
        out_dir: Option<PathBuf>,

        /// Print to stdout instead of writing files
        #[arg(long)]
        stdout: bool,
    },

    /// Check a signed message JSON (object or array) against an identity
    Verify {
        /// Signed message file, or "-" for stdin
        #[arg(long)]
        message: PathBuf,

        /// Expected signer address (0x-hex)
        #[arg(long)]
        identity: String,

        /// Layout and digest the signer is known to use; messages declaring others fail
        #[command(flatten)]
        digest: DigestArgs,
    },

    /// Print the digest a signer would sign, without signing
    Hash {
        #[command(flatten)]
        payment: PaymentArgs,

        #[command(flatten)]
        digest: DigestArgs,

        /// Also print the 85-byte encoding
        #[arg(long)]
        show_encoding: bool,
    },

    /// Print the identity (address) held by a key
    Address {
        #[command(flatten)]
        key: KeyArgs,
    },

    /// Wrap a raw private key into a sealed envelope keystore
    Seal {
        /// 64 hex chars (optional 0x) or nsec1...
        #[arg(long, env = Defaults::KEY_ENV, hide_env_values = true)]
        key: String,

        /// Passphrase for the new keystore
        #[arg(long, env = Defaults::PASSPHRASE_ENV, hide_env_values = true)]
        passphrase: String,

        /// Output file (default: <sealed key dir>/<address>.enc)
        #[arg(long)]
        out: Option<PathBuf>,

        #[arg(long, default_value = "payment-signer")]
        nickname: String,

        /// Argon2id iterations
        #[arg(long, default_value_t = Defaults::ARGON2_T_COST)]
        t_cost: u32,

        /// Argon2id memory in KiB
        #[arg(long, default_value_t = Defaults::ARGON2_M_COST_KIB)]
        m_cost_kib: u32,
    },
}

/// Where the private key comes from.
#[derive(Args, Debug)]
pub struct KeyArgs {
    /// Web3 v3 JSON or sealed envelope keystore
    #[arg(long)]
    pub keystore: Option<PathBuf>,

    /// Keystore passphrase
    #[arg(long, env = Defaults::PASSPHRASE_ENV, hide_env_values = true)]
    pub passphrase: Option<String>,

    /// Raw key (hex or nsec1...) instead of a keystore; for testing
    #[arg(long, conflicts_with = "keystore")]
    pub key: Option<String>,
}

#[derive(Args, Debug)]
pub struct PaymentArgs {
    /// Recipient address (0x-hex, 20 bytes)
    #[arg(long)]
    pub recipient: Option<String>,

    /// Payment method tag (0-255)
    #[arg(long)]
    pub method: Option<u8>,

    /// Sequence number, decimal or 0x-hex
    #[arg(long)]
    pub sequence: Option<String>,

    /// Amount, decimal or 0x-hex
    #[arg(long)]
    pub amount: Option<String>,
}

#[derive(Args, Debug)]
pub struct DigestArgs {
    /// canonical or contract_packed
    #[arg(long)]
    pub layout: Option<Layout>,

    /// raw or personal_message
    #[arg(long)]
    pub digest: Option<DigestScheme>,
}
