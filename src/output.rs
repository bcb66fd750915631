use anyhow::{bail, Context, Result};
use serde::Serialize;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use payment_signer::SignedPaymentMessage;

/// Maximum number of " (n)" suffixes tried before giving up.
const MAX_SUFFIX: usize = 10_000;

/// Write `value` as JSON to `out_path`, never replacing an existing file:
/// if the name is taken, " (1)", " (2)", ... is inserted before the extension.
/// `pretty` selects indented or compact output.
///
/// Returns the path actually written.
pub fn write_json<P: AsRef<Path>, T: Serialize + ?Sized>(
    out_path: P,
    value: &T,
    pretty: bool,
) -> Result<PathBuf> {
    let out_path = out_path.as_ref();

    if let Some(parent) = out_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating parent directory {}", parent.display()))?;
        }
    }

    // Serialize before touching the filesystem so a failure leaves no empty file
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };

    for n in 0..MAX_SUFFIX {
        let candidate = suffixed(out_path, n);
        // create_new fails on an existing file, so nothing is replaced
        let mut f = match OpenOptions::new().write(true).create_new(true).open(&candidate) {
            Ok(f) => f,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
            Err(e) => {
                return Err(e).with_context(|| format!("creating {}", candidate.display()))
            }
        };
        f.write_all(json.as_bytes())
            .and_then(|_| f.flush())
            .with_context(|| format!("writing {}", candidate.display()))?;
        return Ok(candidate);
    }

    bail!(
        "{} and {MAX_SUFFIX} numbered variants already exist",
        out_path.display()
    )
}

/// `dir/stem.ext` for `n == 0`, else `dir/stem (n).ext`.
fn suffixed(path: &Path, n: usize) -> PathBuf {
    if n == 0 {
        return path.to_path_buf();
    }
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("file");
    let name = match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => format!("{stem} ({n}).{ext}"),
        None => format!("{stem} ({n})"),
    };
    path.with_file_name(name)
}

/// "pay_{recipient}_seq_{sequence}.json", recipient abbreviated.
pub fn filename_for(msg: &SignedPaymentMessage) -> String {
    let recipient = hex::encode(msg.authorization.recipient().as_bytes());
    format!(
        "pay_{}_seq_{}.json",
        abbrev_hex(&recipient),
        msg.authorization.sequence()
    )
}

/// Abbreviate a long hex string as "first8..last8".
fn abbrev_hex(x: &str) -> String {
    if x.len() > 16 {
        format!("{}..{}", &x[..8], &x[x.len() - 8..])
    } else {
        x.to_string()
    }
}
