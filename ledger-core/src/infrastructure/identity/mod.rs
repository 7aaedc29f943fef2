//! Caller identity lookup, consumed from the surrounding application.

use crate::foundation::{AccountId, CallerId, Result};
use crate::infrastructure::keys::SecretBytes;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

/// A caller's own ledger account and its stored credential, in whatever encoding it was saved.
#[derive(Clone, Debug)]
pub struct CallerRecord {
    pub account_id: AccountId,
    pub encoded_credential: SecretBytes,
}

impl CallerRecord {
    pub fn new(account_id: AccountId, encoded_credential: impl Into<SecretBytes>) -> Self {
        Self { account_id, encoded_credential: encoded_credential.into() }
    }
}

#[async_trait]
pub trait CallerDirectory: Send + Sync {
    /// `Ok(None)` when the caller has no delegated account on record.
    async fn lookup(&self, caller_id: &CallerId) -> Result<Option<CallerRecord>>;
}

#[derive(Clone, Default)]
pub struct InMemoryCallerDirectory {
    inner: Arc<Mutex<HashMap<CallerId, CallerRecord>>>,
}

impl InMemoryCallerDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, caller_id: CallerId, record: CallerRecord) {
        self.inner.lock().insert(caller_id, record);
    }
}

#[async_trait]
impl CallerDirectory for InMemoryCallerDirectory {
    async fn lookup(&self, caller_id: &CallerId) -> Result<Option<CallerRecord>> {
        Ok(self.inner.lock().get(caller_id).cloned())
    }
}
