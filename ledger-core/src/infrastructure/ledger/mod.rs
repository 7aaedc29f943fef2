//! Ledger transport seams: mutating submissions and read-only queries.

use crate::foundation::{AccountId, ChannelId, Result, TokenId};
use async_trait::async_trait;

pub mod circuit_breaker;
pub mod memory;
pub mod mirror;
pub mod retry;
pub mod transaction;
pub mod types;

pub use circuit_breaker::{CircuitBreaker, CircuitBreakerConfig};
pub use memory::{InMemoryLedger, InjectedFault, SubmissionRecord};
pub use mirror::MirrorNodeClient;
pub use retry::retry_transient;
pub use transaction::{SignaturePair, SignedTransaction, TokenCreateParams, Transaction, TransactionBody, TransactionId, TransactionKind};
pub use types::{AccountBalance, NftInfo, TokenInfo, TopicInfo, TopicMessage, TopicMessageQuery, TransactionReceipt};

/// Submits signed transactions and waits for their receipts.
///
/// A ledger-level rejection comes back as `Ok` with a non-success status; `Err` means the call itself failed.
#[async_trait]
pub trait TransactionSubmitter: Send + Sync {
    async fn submit(&self, transaction: SignedTransaction) -> Result<TransactionReceipt>;
}

/// Read-only ledger state. Calls have no side effects and are safe to retry.
#[async_trait]
pub trait LedgerQuery: Send + Sync {
    async fn account_balance(&self, account_id: &AccountId) -> Result<AccountBalance>;
    async fn token_info(&self, token_id: &TokenId) -> Result<TokenInfo>;
    /// Current owner of one serial; `TokenNotFound` when the serial does not exist.
    async fn nft_info(&self, token_id: &TokenId, serial: u64) -> Result<NftInfo>;
    async fn topic_info(&self, topic_id: &ChannelId) -> Result<TopicInfo>;
    async fn topic_messages(&self, topic_id: &ChannelId, query: TopicMessageQuery) -> Result<Vec<TopicMessage>>;
}

