#![allow(dead_code)]

use ledger_core::infrastructure::keys::SigningKey;
use serde_json::{Map, Value};

pub fn ed25519_key(seed: u8) -> SigningKey {
    SigningKey::ed25519_from_seed(&[seed; 32])
}

pub fn ecdsa_key(seed: u8) -> SigningKey {
    SigningKey::ecdsa_from_slice(&[seed; 32]).expect("valid secp256k1 scalar")
}

pub fn metadata(pairs: &[(&str, &str)]) -> Map<String, Value> {
    pairs.iter().map(|(key, value)| (key.to_string(), Value::String(value.to_string()))).collect()
}
