//! Infrastructure layer: I/O and external integrations.

pub mod config;
pub mod identity;
pub mod keys;
pub mod ledger;
pub mod logging;
