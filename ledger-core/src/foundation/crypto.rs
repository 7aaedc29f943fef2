//! Transaction signing keys and their public halves.

use crate::foundation::LedgerError;
use ed25519_dalek::{Signer, Verifier};
use secp256k1::{ecdsa, Message, SecretKey, SECP256K1};
use serde::{Deserialize, Serialize};
use std::fmt;
use zeroize::Zeroizing;

/// PKCS#8 DER prefix of an Ed25519 private key (followed by the 32-byte seed).
pub const ED25519_DER_PREFIX: [u8; 16] = [0x30, 0x2e, 0x02, 0x01, 0x00, 0x30, 0x05, 0x06, 0x03, 0x2b, 0x65, 0x70, 0x04, 0x22, 0x04, 0x20];

/// PKCS#8 DER prefix of an ECDSA secp256k1 private key (followed by the 32-byte scalar).
pub const ECDSA_SECP256K1_DER_PREFIX: [u8; 18] =
    [0x30, 0x30, 0x02, 0x01, 0x00, 0x30, 0x07, 0x06, 0x05, 0x2b, 0x81, 0x04, 0x00, 0x0a, 0x04, 0x22, 0x04, 0x20];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignatureScheme {
    Ed25519,
    EcdsaSecp256k1,
}

impl fmt::Display for SignatureScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ed25519 => write!(f, "ed25519"),
            Self::EcdsaSecp256k1 => write!(f, "ecdsa-secp256k1"),
        }
    }
}

/// A usable private key resolved from stored credential material.
#[derive(Clone)]
pub enum SigningKey {
    Ed25519(ed25519_dalek::SigningKey),
    EcdsaSecp256k1(SecretKey),
}

impl SigningKey {
    pub fn ed25519_from_seed(seed: &[u8; 32]) -> Self {
        Self::Ed25519(ed25519_dalek::SigningKey::from_bytes(seed))
    }

    pub fn ecdsa_from_slice(bytes: &[u8]) -> Result<Self, LedgerError> {
        SecretKey::from_slice(bytes)
            .map(Self::EcdsaSecp256k1)
            .map_err(|err| LedgerError::EncodingError(format!("invalid secp256k1 secret: {err}")))
    }

    pub fn scheme(&self) -> SignatureScheme {
        match self {
            Self::Ed25519(_) => SignatureScheme::Ed25519,
            Self::EcdsaSecp256k1(_) => SignatureScheme::EcdsaSecp256k1,
        }
    }

    pub fn public_key(&self) -> PublicKey {
        match self {
            Self::Ed25519(key) => PublicKey { scheme: SignatureScheme::Ed25519, bytes: key.verifying_key().to_bytes().to_vec() },
            Self::EcdsaSecp256k1(secret) => PublicKey {
                scheme: SignatureScheme::EcdsaSecp256k1,
                bytes: secret.public_key(SECP256K1).serialize().to_vec(),
            },
        }
    }

    /// Ed25519 signs the message directly; ECDSA signs its blake3 digest (64-byte compact form).
    pub fn sign(&self, message: &[u8]) -> Vec<u8> {
        match self {
            Self::Ed25519(key) => key.sign(message).to_bytes().to_vec(),
            Self::EcdsaSecp256k1(secret) => {
                let msg = Message::from_digest(*blake3::hash(message).as_bytes());
                SECP256K1.sign_ecdsa(&msg, secret).serialize_compact().to_vec()
            }
        }
    }

    /// Hex-encoded PKCS#8 DER, the first supported credential format.
    pub fn to_der_hex(&self) -> String {
        let mut der = Zeroizing::new(Vec::with_capacity(50));
        match self {
            Self::Ed25519(key) => {
                der.extend_from_slice(&ED25519_DER_PREFIX);
                der.extend_from_slice(key.as_bytes());
            }
            Self::EcdsaSecp256k1(secret) => {
                der.extend_from_slice(&ECDSA_SECP256K1_DER_PREFIX);
                der.extend_from_slice(&secret.secret_bytes());
            }
        }
        hex::encode(der.as_slice())
    }

    /// Raw 32-byte hex, the second supported credential format. Only defined for ECDSA keys.
    pub fn to_raw_hex(&self) -> Option<String> {
        match self {
            Self::Ed25519(_) => None,
            Self::EcdsaSecp256k1(secret) => Some(hex::encode(Zeroizing::new(secret.secret_bytes()).as_slice())),
        }
    }
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SigningKey({}, public={})", self.scheme(), self.public_key())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PublicKey {
    pub scheme: SignatureScheme,
    #[serde(with = "hex_bytes")]
    pub bytes: Vec<u8>,
}

impl PublicKey {
    pub fn verify(&self, message: &[u8], signature: &[u8]) -> bool {
        match self.scheme {
            SignatureScheme::Ed25519 => {
                let Ok(key_bytes) = <[u8; 32]>::try_from(self.bytes.as_slice()) else {
                    return false;
                };
                let Ok(key) = ed25519_dalek::VerifyingKey::from_bytes(&key_bytes) else {
                    return false;
                };
                let Ok(sig) = ed25519_dalek::Signature::from_slice(signature) else {
                    return false;
                };
                key.verify(message, &sig).is_ok()
            }
            SignatureScheme::EcdsaSecp256k1 => {
                let Ok(key) = secp256k1::PublicKey::from_slice(&self.bytes) else {
                    return false;
                };
                let Ok(sig) = ecdsa::Signature::from_compact(signature) else {
                    return false;
                };
                let msg = Message::from_digest(*blake3::hash(message).as_bytes());
                SECP256K1.verify_ecdsa(&msg, &sig, &key).is_ok()
            }
        }
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.scheme, hex::encode(&self.bytes))
    }
}

mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            serializer.serialize_str(&hex::encode(bytes))
        } else {
            serializer.serialize_bytes(bytes)
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        if deserializer.is_human_readable() {
            let s = String::deserialize(deserializer)?;
            hex::decode(s).map_err(serde::de::Error::custom)
        } else {
            Vec::<u8>::deserialize(deserializer)
        }
    }
}
