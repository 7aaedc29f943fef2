use crate::foundation::{AccountId, PublicKey, SigningKey};

/// Account and key that sign and pay for one orchestrated protocol.
///
/// Built fresh per operation and never persisted.
#[derive(Clone, Debug)]
pub struct OperatorContext {
    pub account_id: AccountId,
    pub signing_key: SigningKey,
    pub is_delegated: bool,
}

impl OperatorContext {
    pub fn platform(account_id: AccountId, signing_key: SigningKey) -> Self {
        Self { account_id, signing_key, is_delegated: false }
    }

    pub fn delegated(account_id: AccountId, signing_key: SigningKey) -> Self {
        Self { account_id, signing_key, is_delegated: true }
    }

    pub fn public_key(&self) -> PublicKey {
        self.signing_key.public_key()
    }

    pub fn kind(&self) -> &'static str {
        if self.is_delegated {
            "delegated"
        } else {
            "platform"
        }
    }
}
