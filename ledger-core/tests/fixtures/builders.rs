#![allow(dead_code)]

use crate::fixtures::{ecdsa_key, ed25519_key, PLATFORM_ACCOUNT, PLATFORM_BALANCE, PLATFORM_SEED};
use ledger_core::foundation::{AccountId, CallerId};
use ledger_core::infrastructure::config::AppConfig;
use ledger_core::infrastructure::identity::{CallerRecord, InMemoryCallerDirectory};
use ledger_core::infrastructure::keys::SigningKey;
use ledger_core::infrastructure::ledger::{InMemoryLedger, TransactionKind};
use ledger_core::LedgerOrchestrator;
use std::sync::Arc;
use std::time::Duration;

/// How a caller's credential is stored in the directory.
#[derive(Clone, Copy, Debug)]
pub enum CredentialEncoding {
    /// Ed25519 key as hex PKCS#8 DER.
    DerHex,
    /// ECDSA secp256k1 key as `0x`-prefixed raw hex.
    RawHex,
}

pub fn platform_key() -> SigningKey {
    ed25519_key(PLATFORM_SEED)
}

pub fn platform_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.platform.account_id = PLATFORM_ACCOUNT.to_string();
    config.platform.credential = Some(platform_key().to_der_hex());
    config
}

pub struct HarnessBuilder {
    config: AppConfig,
    latency: Option<Duration>,
    platform_balance: u64,
}

impl Default for HarnessBuilder {
    fn default() -> Self {
        Self { config: platform_config(), latency: None, platform_balance: PLATFORM_BALANCE }
    }
}

impl HarnessBuilder {
    pub fn funding_cooldown_secs(mut self, secs: u64) -> Self {
        self.config.funding.cooldown_secs = secs;
        self
    }

    pub fn max_concurrency(mut self, max: usize) -> Self {
        self.config.distribution.max_concurrency = max;
        self
    }

    pub fn max_metadata_bytes(mut self, max: usize) -> Self {
        self.config.certificates.max_metadata_bytes = max;
        self
    }

    pub fn platform_balance(mut self, balance: u64) -> Self {
        self.platform_balance = balance;
        self
    }

    pub fn latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn build(self) -> Harness {
        let mut ledger = InMemoryLedger::new().with_max_metadata_bytes(self.config.certificates.max_metadata_bytes);
        if let Some(latency) = self.latency {
            ledger = ledger.with_latency(latency);
        }
        let key = platform_key();
        ledger.create_account_with_id(PLATFORM_ACCOUNT, key.public_key(), self.platform_balance).expect("platform account");
        let directory = InMemoryCallerDirectory::new();
        let orchestrator = LedgerOrchestrator::from_config(
            &self.config,
            Arc::new(ledger.clone()),
            Arc::new(ledger.clone()),
            Arc::new(directory.clone()),
        )
        .expect("orchestrator");
        Harness { ledger, directory, orchestrator: Arc::new(orchestrator), config: self.config }
    }
}

pub struct Harness {
    pub ledger: InMemoryLedger,
    pub directory: InMemoryCallerDirectory,
    pub orchestrator: Arc<LedgerOrchestrator>,
    pub config: AppConfig,
}

impl Harness {
    pub fn new() -> Self {
        HarnessBuilder::default().build()
    }

    pub fn builder() -> HarnessBuilder {
        HarnessBuilder::default()
    }

    pub fn open_account(&self, seed: u8, balance: u64) -> (AccountId, SigningKey) {
        let key = ed25519_key(seed);
        let account = self.ledger.create_account(key.public_key(), balance);
        (account, key)
    }

    /// Opens an account for `caller` and stores its credential in the directory.
    pub fn register_caller(&self, caller: &str, seed: u8, balance: u64, encoding: CredentialEncoding) -> (AccountId, SigningKey) {
        let (key, stored) = match encoding {
            CredentialEncoding::DerHex => {
                let key = ed25519_key(seed);
                let stored = key.to_der_hex();
                (key, stored)
            }
            CredentialEncoding::RawHex => {
                let key = ecdsa_key(seed);
                let stored = format!("0x{}", key.to_raw_hex().expect("ecdsa raw hex"));
                (key, stored)
            }
        };
        let account = self.ledger.create_account(key.public_key(), balance);
        self.directory.insert(CallerId::new(caller), CallerRecord::new(account, stored));
        (account, key)
    }

    pub fn submission_kinds(&self) -> Vec<TransactionKind> {
        self.ledger.submissions().into_iter().map(|record| record.kind).collect()
    }
}
