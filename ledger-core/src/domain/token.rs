use crate::foundation::{AccountId, LedgerError, TokenId};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    Fungible,
    NonFungible,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SupplyPolicy {
    Infinite,
    Finite { max_supply: u64 },
}

impl SupplyPolicy {
    pub fn max_supply(&self) -> Option<u64> {
        match self {
            Self::Infinite => None,
            Self::Finite { max_supply } => Some(*max_supply),
        }
    }

    /// Rejects a resulting total supply above the cap.
    pub fn check_total(&self, total: u64) -> Result<(), LedgerError> {
        match self {
            Self::Finite { max_supply } if total > *max_supply => {
                Err(LedgerError::SupplyExceeded { requested: total, max: *max_supply })
            }
            _ => Ok(()),
        }
    }
}

/// Issued token. Immutable after creation apart from circulating supply.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenDescriptor {
    pub token_id: TokenId,
    pub symbol: String,
    pub name: String,
    pub decimals: u32,
    pub supply_policy: SupplyPolicy,
    pub treasury_account_id: AccountId,
    pub kind: TokenKind,
}

/// Parameters of a new fungible token. Amounts are in the token's smallest unit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CreateTokenRequest {
    pub name: String,
    pub symbol: String,
    pub initial_supply: u64,
    pub decimals: u32,
    pub supply_policy: SupplyPolicy,
}

impl CreateTokenRequest {
    pub fn infinite(name: impl Into<String>, symbol: impl Into<String>, initial_supply: u64, decimals: u32) -> Self {
        Self { name: name.into(), symbol: symbol.into(), initial_supply, decimals, supply_policy: SupplyPolicy::Infinite }
    }

    pub fn finite(name: impl Into<String>, symbol: impl Into<String>, initial_supply: u64, decimals: u32, max_supply: u64) -> Self {
        Self {
            name: name.into(),
            symbol: symbol.into(),
            initial_supply,
            decimals,
            supply_policy: SupplyPolicy::Finite { max_supply },
        }
    }

    pub fn validate(&self) -> Result<(), LedgerError> {
        if self.name.trim().is_empty() {
            return Err(LedgerError::Message("token name must not be empty".to_string()));
        }
        if self.symbol.trim().is_empty() {
            return Err(LedgerError::Message("token symbol must not be empty".to_string()));
        }
        if let SupplyPolicy::Finite { max_supply: 0 } = self.supply_policy {
            return Err(LedgerError::InvalidAmount("finite max supply must be positive".to_string()));
        }
        self.supply_policy.check_total(self.initial_supply)
    }
}

/// Outcome of associating a token with an account. A repeated association is a success.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssociationStatus {
    Associated,
    AlreadyAssociated,
}

impl AssociationStatus {
    pub fn newly_associated(&self) -> bool {
        matches!(self, Self::Associated)
    }
}
