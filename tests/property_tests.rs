use ethers_core::types::{Address, U256};
use proptest::prelude::*;

use payment_signer::{
    encode, payment_hash, recover_identity, verify_authorization, DigestScheme, Layout,
    PaymentAuthorization, Signer, VerifyOptions,
};

fn any_authorization() -> impl Strategy<Value = PaymentAuthorization> {
    (
        any::<[u8; 20]>(),
        any::<u8>(),
        any::<[u8; 32]>(),
        any::<[u8; 32]>(),
    )
        .prop_map(|(r, m, s, a)| {
            PaymentAuthorization::new(
                Address::from(r),
                m,
                U256::from_big_endian(&s),
                U256::from_big_endian(&a),
            )
        })
}

fn any_layout() -> impl Strategy<Value = Layout> {
    prop_oneof![Just(Layout::Canonical), Just(Layout::ContractPacked)]
}

fn signer() -> Signer {
    Signer::new(&[0x5a; 32]).unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_sign_then_verify(auth in any_authorization(), layout in any_layout()) {
        let options = payment_signer::SignerOptions { layout, ..Default::default() };
        let s = Signer::with_options(&[0x5a; 32], options).unwrap();
        let msg = s.sign_authorization(&auth).unwrap();
        let verify = VerifyOptions { layout, digest: DigestScheme::Raw };
        prop_assert_eq!(recover_identity(&auth, &msg.signature, verify).unwrap(), s.identity());
    }

    #[test]
    fn prop_encoding_is_injective(
        a in any_authorization(),
        b in any_authorization(),
        layout in any_layout(),
    ) {
        prop_assume!(a != b);
        prop_assert_ne!(encode(&a, layout).unwrap(), encode(&b, layout).unwrap());
        prop_assert_ne!(
            payment_hash(&a, layout, DigestScheme::Raw).unwrap(),
            payment_hash(&b, layout, DigestScheme::Raw).unwrap()
        );
    }

    #[test]
    fn prop_any_bit_flip_breaks_verification(auth in any_authorization(), bit in 0usize..680) {
        let s = signer();
        let msg = s.sign_authorization(&auth).unwrap();

        let mut bytes = encode(&auth, Layout::Canonical).unwrap();
        bytes[bit / 8] ^= 1 << (bit % 8);
        let flipped = PaymentAuthorization::from_be_bytes(
            bytes[..20].try_into().unwrap(),
            bytes[20],
            &bytes[21..53],
            &bytes[53..85],
        )
        .unwrap();

        let ok = verify_authorization(
            &flipped,
            &msg.signature,
            s.identity(),
            VerifyOptions::default(),
        );
        // a different digest may also recover no key at all
        prop_assert!(!matches!(ok, Ok(true)));
    }

    #[test]
    fn prop_distinct_authorizations_never_share_r(
        a in any_authorization(),
        b in any_authorization(),
    ) {
        prop_assume!(a != b);
        let s = signer();
        let sa = s.sign_authorization(&a).unwrap();
        let sb = s.sign_authorization(&b).unwrap();
        prop_assert_ne!(sa.signature.r, sb.signature.r);
    }

    #[test]
    fn prop_decimal_and_hex_inputs_agree(n in any::<[u8; 32]>()) {
        let value = U256::from_big_endian(&n);
        let dec = PaymentAuthorization::parse(
            "0x0000000000000000000000000000000000000001", 0, &value.to_string(), "0").unwrap();
        let hex = PaymentAuthorization::parse(
            "0x0000000000000000000000000000000000000001", 0, &format!("{value:#x}"), "0").unwrap();
        prop_assert_eq!(dec, hex);
    }
}
