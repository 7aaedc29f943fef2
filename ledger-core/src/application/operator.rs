//! Chooses which account signs and pays for an operation.

use crate::domain::OperatorContext;
use crate::foundation::{AccountId, CallerId, LedgerError, Result};
use crate::infrastructure::identity::CallerDirectory;
use crate::infrastructure::keys::{KeyMaterialResolver, SecretBytes};
use log::{debug, warn};
use std::sync::Arc;

pub struct OperatorResolver {
    platform: OperatorContext,
    directory: Arc<dyn CallerDirectory>,
    keys: KeyMaterialResolver,
}

impl OperatorResolver {
    pub fn new(platform: OperatorContext, directory: Arc<dyn CallerDirectory>, keys: KeyMaterialResolver) -> Self {
        Self { platform, directory, keys }
    }

    pub fn platform(&self) -> OperatorContext {
        self.platform.clone()
    }

    pub fn platform_account_id(&self) -> AccountId {
        self.platform.account_id
    }

    /// Never fails: any problem with the delegated credential degrades to the platform operator.
    pub async fn resolve_operator(&self, caller_id: &CallerId, prefer_delegated: bool) -> OperatorContext {
        if !prefer_delegated {
            return self.platform();
        }
        match self.resolve_delegated(caller_id).await {
            Ok(operator) => {
                debug!("resolved delegated operator caller={} account={}", caller_id, operator.account_id);
                operator
            }
            Err(err) => {
                warn!(
                    "delegated operator unavailable; using platform operator caller={} platform_account={} error={}",
                    caller_id, self.platform.account_id, err
                );
                self.platform()
            }
        }
    }

    /// Strict variant for protocols that must act as the caller's own account.
    pub async fn resolve_delegated(&self, caller_id: &CallerId) -> Result<OperatorContext> {
        let record = self.directory.lookup(caller_id).await?.ok_or_else(|| LedgerError::CallerNotFound(caller_id.to_string()))?;
        self.from_credential(record.account_id, &record.encoded_credential)
    }

    /// Builds a delegated context from an account id and its stored credential.
    pub fn from_credential(&self, account_id: AccountId, credential: &SecretBytes) -> Result<OperatorContext> {
        let key = self.keys.resolve_secret(credential)?;
        Ok(OperatorContext::delegated(account_id, key))
    }
}
