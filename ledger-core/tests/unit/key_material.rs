use crate::fixtures::{ecdsa_key, ed25519_key};
use ledger_core::foundation::LedgerError;
use ledger_core::infrastructure::keys::{KeyMaterialResolver, SecretBytes, SignatureScheme, SigningKey};

fn assert_usable(resolved: &SigningKey, original: &SigningKey) {
    assert_eq!(resolved.public_key(), original.public_key());
    let signature = resolved.sign(b"transaction body");
    assert!(original.public_key().verify(b"transaction body", &signature));
}

fn attempted_formats(err: LedgerError) -> Vec<&'static str> {
    match err {
        LedgerError::KeyParse { attempts } => attempts.into_iter().map(|attempt| attempt.format).collect(),
        other => panic!("expected KeyParse, got {other}"),
    }
}

#[test]
fn resolve_when_der_hex_then_returns_usable_key_for_both_curves() {
    let resolver = KeyMaterialResolver::new();
    for original in [ed25519_key(11), ecdsa_key(12)] {
        let resolved = resolver.resolve(&original.to_der_hex()).expect("der hex");
        assert_eq!(resolved.scheme(), original.scheme());
        assert_usable(&resolved, &original);
    }
}

#[test]
fn resolve_when_raw_ecdsa_hex_then_returns_usable_key() {
    let resolver = KeyMaterialResolver::new();
    let original = ecdsa_key(13);
    let raw = original.to_raw_hex().expect("raw hex");
    for encoded in [raw.clone(), format!("0x{raw}"), format!("  {}  ", raw.to_uppercase())] {
        let resolved = resolver.resolve(&encoded).expect("raw hex");
        assert_eq!(resolved.scheme(), SignatureScheme::EcdsaSecp256k1);
        assert_usable(&resolved, &original);
    }
}

#[test]
fn resolve_when_random_keys_then_both_formats_round_trip() {
    let resolver = KeyMaterialResolver::new();
    for _ in 0..16 {
        let seed: [u8; 32] = rand::random();
        let ed = SigningKey::ed25519_from_seed(&seed);
        assert_usable(&resolver.resolve(&ed.to_der_hex()).expect("ed25519 der"), &ed);

        let Ok(ec) = SigningKey::ecdsa_from_slice(&seed) else {
            continue;
        };
        assert_usable(&resolver.resolve(&ec.to_der_hex()).expect("ecdsa der"), &ec);
        assert_usable(&resolver.resolve(&ec.to_raw_hex().expect("raw")).expect("ecdsa raw"), &ec);
    }
}

#[test]
fn resolve_when_garbage_then_key_parse_error_names_both_formats() {
    let resolver = KeyMaterialResolver::new();
    let too_short = "ab".repeat(31);
    let too_long = "ab".repeat(33);
    let cases = ["", "not-a-key", "0x", "zz11", too_short.as_str(), too_long.as_str(), "302e020100300506032b6570042204"];
    for raw in cases {
        let err = resolver.resolve(raw).expect_err("garbage must not resolve");
        assert_eq!(attempted_formats(err), vec!["der_hex", "raw_ecdsa_hex"], "input {raw:?}");
    }
}

#[test]
fn resolve_secret_when_not_utf8_then_every_format_is_reported() {
    let err = KeyMaterialResolver::new().resolve_secret(&SecretBytes::from_slice(&[0xff, 0xfe, 0x00])).expect_err("binary");
    assert_eq!(attempted_formats(err), vec!["der_hex", "raw_ecdsa_hex"]);
}

#[test]
fn key_parse_error_message_does_not_echo_the_credential() {
    let secret = "cafe".repeat(5);
    let err = KeyMaterialResolver::new().resolve(&secret).expect_err("wrong length");
    assert!(!err.to_string().contains(&secret));
}
