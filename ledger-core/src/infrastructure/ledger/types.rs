use crate::domain::{SupplyPolicy, TokenKind};
use crate::foundation::{AccountId, ChannelId, LedgerError, ReceiptStatus, Result, TokenId, TransactionRef};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Final outcome of one submitted transaction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionReceipt {
    pub transaction_ref: TransactionRef,
    pub status: ReceiptStatus,
    pub token_id: Option<TokenId>,
    pub topic_id: Option<ChannelId>,
    #[serde(default)]
    pub serials: Vec<u64>,
    pub topic_sequence_number: Option<u64>,
}

impl TransactionReceipt {
    pub fn new(transaction_ref: TransactionRef, status: ReceiptStatus) -> Self {
        Self { transaction_ref, status, token_id: None, topic_id: None, serials: Vec::new(), topic_sequence_number: None }
    }

    /// Converts a non-success status into its typed error (see [`LedgerError::from_receipt_status`]).
    pub fn into_result(self, operation: &str) -> Result<Self> {
        if self.status.is_success() {
            Ok(self)
        } else {
            Err(LedgerError::from_receipt_status(operation, self.status))
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountBalance {
    pub account_id: AccountId,
    pub native_balance: u64,
    /// Associated tokens and their balances; a zero entry still means associated.
    #[serde(default)]
    pub tokens: BTreeMap<TokenId, u64>,
}

impl AccountBalance {
    pub fn is_associated(&self, token_id: &TokenId) -> bool {
        self.tokens.contains_key(token_id)
    }

    pub fn token_balance(&self, token_id: &TokenId) -> Option<u64> {
        self.tokens.get(token_id).copied()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenInfo {
    pub token_id: TokenId,
    pub name: String,
    pub symbol: String,
    pub decimals: u32,
    pub total_supply: u64,
    pub supply_policy: SupplyPolicy,
    pub kind: TokenKind,
    pub treasury_account_id: AccountId,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NftInfo {
    pub token_id: TokenId,
    pub serial_number: u64,
    pub account_id: AccountId,
    pub metadata: Vec<u8>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicInfo {
    pub topic_id: ChannelId,
    pub memo: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicMessage {
    pub topic_id: ChannelId,
    pub sequence_number: u64,
    pub consensus_timestamp_nanos: u64,
    pub payer_account_id: AccountId,
    pub contents: Vec<u8>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TopicMessageQuery {
    /// Inclusive lower bound.
    pub since_sequence: Option<u64>,
    pub limit: Option<usize>,
}
