use anyhow::Result;

use payment_signer::util::bytes_to_0x;
use payment_signer::{encode, payment_hash, PaymentAuthorization};
use payment_signer::{DigestScheme, Layout};

/// `(encoding, digest)` as 0x-hex.
pub fn describe(
    auth: &PaymentAuthorization,
    layout: Layout,
    digest: DigestScheme,
) -> Result<(String, String)> {
    let encoded = encode(auth, layout)?;
    let hash = payment_hash(auth, layout, digest)?;
    Ok((bytes_to_0x(&encoded), bytes_to_0x(hash.as_bytes())))
}

pub fn run(
    auth: &PaymentAuthorization,
    layout: Layout,
    digest: DigestScheme,
    show_encoding: bool,
) -> Result<()> {
    let (encoded, hash) = describe(auth, layout, digest)?;
    if show_encoding {
        println!("encoding: {encoded}");
        println!("{digest} hash: {hash}");
    } else {
        println!("{hash}");
    }
    Ok(())
}
