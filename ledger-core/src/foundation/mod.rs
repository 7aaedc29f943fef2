//! Foundation layer: shared primitives grouped for the layered architecture.

pub mod constants;
pub mod crypto;
pub mod error;
pub mod types;
pub mod util;

pub use constants::*;
pub use crypto::{PublicKey, SignatureScheme, SigningKey};
pub use error::*;
pub use types::*;
pub use util::time::{format_ledger_timestamp, now_nanos};
