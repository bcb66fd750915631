use payment_signer::Signer;

pub fn run(signer: &Signer) {
    println!("{:#x}", signer.identity());
}
