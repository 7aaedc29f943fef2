//! Key material: stored credential decoding and transaction signing keys.

pub mod parsers;
pub mod secret;

pub use parsers::{DerHexParser, KeyMaterialResolver, KeyParser, RawEcdsaHexParser};
pub use secret::SecretBytes;
pub use crate::foundation::crypto::{PublicKey, SignatureScheme, SigningKey};
