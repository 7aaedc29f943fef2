//! Ordered chain of credential parsers.
//!
//! Stored credentials are not guaranteed to share one encoding, so every read goes through
//! [`KeyMaterialResolver::resolve`], which tries each registered format in order and reports every
//! rejection when none match.

use crate::foundation::util::encoding::strip_hex_prefix;
use crate::foundation::{KeyParseAttempt, LedgerError, Result};
use crate::infrastructure::keys::secret::SecretBytes;
use crate::foundation::crypto::{SigningKey, ECDSA_SECP256K1_DER_PREFIX, ED25519_DER_PREFIX};
use log::debug;
use std::sync::Arc;
use zeroize::Zeroizing;

const KEY_LEN: usize = 32;

/// One stored-credential encoding.
pub trait KeyParser: Send + Sync {
    /// Short stable name reported in `KeyParse` errors.
    fn format(&self) -> &'static str;

    fn parse(&self, raw: &str) -> std::result::Result<SigningKey, String>;
}

fn decode_hex_zeroizing(raw: &str) -> std::result::Result<Zeroizing<Vec<u8>>, String> {
    let trimmed = strip_hex_prefix(raw.trim());
    if trimmed.is_empty() {
        return Err("empty input".to_string());
    }
    hex::decode(trimmed).map(Zeroizing::new).map_err(|err| format!("not hex: {err}"))
}

/// Format A: hex-encoded PKCS#8 DER holding an Ed25519 or ECDSA secp256k1 private key.
#[derive(Debug, Default, Clone, Copy)]
pub struct DerHexParser;

impl KeyParser for DerHexParser {
    fn format(&self) -> &'static str {
        "der_hex"
    }

    fn parse(&self, raw: &str) -> std::result::Result<SigningKey, String> {
        let bytes = decode_hex_zeroizing(raw)?;
        if let Some(seed) = bytes.strip_prefix(ED25519_DER_PREFIX.as_slice()) {
            let seed: Zeroizing<[u8; KEY_LEN]> = Zeroizing::new(
                seed.try_into().map_err(|_| format!("ed25519 seed must be {KEY_LEN} bytes, got {}", seed.len()))?,
            );
            return Ok(SigningKey::ed25519_from_seed(&seed));
        }
        if let Some(scalar) = bytes.strip_prefix(ECDSA_SECP256K1_DER_PREFIX.as_slice()) {
            if scalar.len() != KEY_LEN {
                return Err(format!("secp256k1 scalar must be {KEY_LEN} bytes, got {}", scalar.len()));
            }
            return SigningKey::ecdsa_from_slice(scalar).map_err(|err| err.to_string());
        }
        Err("unrecognized DER key prefix".to_string())
    }
}

/// Format B: raw 32-byte ECDSA secp256k1 private key as hex, `0x` optional.
#[derive(Debug, Default, Clone, Copy)]
pub struct RawEcdsaHexParser;

impl KeyParser for RawEcdsaHexParser {
    fn format(&self) -> &'static str {
        "raw_ecdsa_hex"
    }

    fn parse(&self, raw: &str) -> std::result::Result<SigningKey, String> {
        let bytes = decode_hex_zeroizing(raw)?;
        if bytes.len() != KEY_LEN {
            return Err(format!("expected {KEY_LEN} bytes, got {}", bytes.len()));
        }
        SigningKey::ecdsa_from_slice(&bytes).map_err(|err| err.to_string())
    }
}

#[derive(Clone)]
pub struct KeyMaterialResolver {
    parsers: Vec<Arc<dyn KeyParser>>,
}

impl KeyMaterialResolver {
    /// DER hex first, raw ECDSA hex second.
    pub fn new() -> Self {
        Self::with_parsers(vec![Arc::new(DerHexParser), Arc::new(RawEcdsaHexParser)])
    }

    pub fn with_parsers(parsers: Vec<Arc<dyn KeyParser>>) -> Self {
        Self { parsers }
    }

    pub fn formats(&self) -> Vec<&'static str> {
        self.parsers.iter().map(|parser| parser.format()).collect()
    }

    pub fn resolve(&self, raw: &str) -> Result<SigningKey> {
        let mut attempts = Vec::with_capacity(self.parsers.len());
        for parser in &self.parsers {
            match parser.parse(raw) {
                Ok(key) => {
                    debug!("resolved signing key format={} scheme={}", parser.format(), key.scheme());
                    return Ok(key);
                }
                Err(reason) => attempts.push(KeyParseAttempt { format: parser.format(), reason }),
            }
        }
        Err(LedgerError::KeyParse { attempts })
    }

    pub fn resolve_secret(&self, secret: &SecretBytes) -> Result<SigningKey> {
        let raw = secret.expose_str().ok_or_else(|| LedgerError::KeyParse {
            attempts: self
                .parsers
                .iter()
                .map(|parser| KeyParseAttempt { format: parser.format(), reason: "credential is not utf-8".to_string() })
                .collect(),
        })?;
        self.resolve(raw)
    }
}

impl Default for KeyMaterialResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for KeyMaterialResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyMaterialResolver").field("formats", &self.formats()).finish()
    }
}
