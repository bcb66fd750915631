use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::fs;
use std::io::{self, Read};
use std::path::Path;
use tracing::warn;

use payment_signer::util::parse_addr;
use payment_signer::{verify_message, Identity, SignedPaymentMessage, VerifyOptions};

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(SignedPaymentMessage),
    Many(Vec<SignedPaymentMessage>),
}

pub fn read_messages(path: &Path) -> Result<Vec<SignedPaymentMessage>> {
    let text = if path == Path::new("-") {
        let mut s = String::new();
        io::stdin().read_to_string(&mut s).context("reading stdin")?;
        s
    } else {
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?
    };
    let parsed: OneOrMany = serde_json::from_str(&text).context("parsing signed message JSON")?;
    Ok(match parsed {
        OneOrMany::One(m) => vec![m],
        OneOrMany::Many(v) => v,
    })
}

/// Number of messages that did not verify. Malformed signatures, and messages
/// declaring a layout or digest other than `options`, count as failures.
pub fn check_all(
    messages: &[SignedPaymentMessage],
    expected: Identity,
    options: VerifyOptions,
) -> usize {
    let mut failed = 0;
    for (i, m) in messages.iter().enumerate() {
        let outcome = match verify_message(m, expected, options) {
            Ok(true) => "valid".to_string(),
            Ok(false) => {
                failed += 1;
                "INVALID: signed by a different identity".to_string()
            }
            Err(e) => {
                failed += 1;
                warn!(entry = i, error = %e, "malformed signature");
                format!("INVALID: {e}")
            }
        };
        println!(
            "#{i} recipient={:#x} sequence={} {outcome}",
            m.authorization.recipient(),
            m.authorization.sequence()
        );
    }
    failed
}

pub fn run(message: &Path, identity: &str, options: VerifyOptions) -> Result<()> {
    let expected = parse_addr(identity).context("parsing --identity")?;
    let messages = read_messages(message)?;
    let failed = check_all(&messages, expected, options);
    if failed > 0 {
        bail!("{failed} of {} signatures did not verify", messages.len());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use payment_signer::{PaymentAuthorization, Signer};

    fn signed(seq: &str) -> SignedPaymentMessage {
        let signer = Signer::new(&[0x44; 32]).unwrap();
        let auth = PaymentAuthorization::parse(
            "0x2011000000000000000000000000000000000001",
            3,
            seq,
            "10",
        )
        .unwrap();
        signer.sign_authorization(&auth).unwrap()
    }

    #[test]
    fn test_reads_object_or_array() {
        let dir = tempfile::tempdir().unwrap();
        let one = dir.path().join("one.json");
        let many = dir.path().join("many.json");
        fs::write(&one, serde_json::to_string(&signed("1")).unwrap()).unwrap();
        fs::write(&many, serde_json::to_string(&vec![signed("1"), signed("2")]).unwrap()).unwrap();
        assert_eq!(read_messages(&one).unwrap().len(), 1);
        assert_eq!(read_messages(&many).unwrap().len(), 2);
    }

    #[test]
    fn test_tampered_amount_fails() {
        let signer = Signer::new(&[0x44; 32]).unwrap();
        let good = signed("5");
        let mut value = serde_json::to_value(&good).unwrap();
        value["amount"] = serde_json::Value::String("11".into());
        let tampered: SignedPaymentMessage = serde_json::from_value(value).unwrap();
        assert_eq!(check_all(&[good, tampered], signer.identity(), VerifyOptions::default()), 1);
    }

    #[test]
    fn test_declared_layout_is_not_trusted() {
        let signer = Signer::new(&[0x44; 32]).unwrap();
        let mut value = serde_json::to_value(signed("5")).unwrap();
        // same 85 bytes under the packed layout, different authorization
        value["method"] = serde_json::Value::from(5);
        value["sequence"] = serde_json::Value::String("0".into());
        value["layout"] = serde_json::Value::String("contract_packed".into());
        let forged: SignedPaymentMessage = serde_json::from_value(value).unwrap();
        assert_eq!(check_all(&[forged], signer.identity(), VerifyOptions::default()), 1);
    }

    #[test]
    fn test_run_exits_with_error_on_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("m.json");
        fs::write(&path, serde_json::to_string(&signed("1")).unwrap()).unwrap();
        let stranger = Signer::new(&[0x45; 32]).unwrap().identity();
        assert!(run(&path, &format!("{stranger:#x}"), VerifyOptions::default()).is_err());
        let owner = Signer::new(&[0x44; 32]).unwrap().identity();
        assert!(run(&path, &format!("{owner:#x}"), VerifyOptions::default()).is_ok());
    }
}
