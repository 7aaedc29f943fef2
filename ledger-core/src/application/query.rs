//! Read-only decisions: balances, token metadata, audit channel history.

use crate::domain::{AuditMessage, AuditRecord, ChannelMessageFilter};
use crate::foundation::{format_ledger_timestamp, AccountId, ChannelId, LedgerError, Result, TokenId};
use crate::infrastructure::config::QueryConfig;
use crate::infrastructure::ledger::{retry_transient, LedgerQuery, TokenInfo, TopicMessageQuery};
use log::debug;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceReport {
    pub account_id: AccountId,
    pub native_balance: u64,
    /// Measured against the process-wide operational minimum.
    pub has_sufficient_balance: bool,
}

pub struct NetworkQueryAdapter {
    query: Arc<dyn LedgerQuery>,
    min_operational_balance: u64,
    retry_attempts: usize,
    retry_delay: Duration,
}

impl NetworkQueryAdapter {
    pub fn new(query: Arc<dyn LedgerQuery>, min_operational_balance: u64, config: &QueryConfig) -> Self {
        Self { query, min_operational_balance, retry_attempts: config.retry_attempts.max(1), retry_delay: config.retry_delay() }
    }

    pub async fn get_balance(&self, account_id: &AccountId) -> Result<BalanceReport> {
        let balance = retry_transient(self.retry_attempts, self.retry_delay, || self.query.account_balance(account_id)).await?;
        Ok(BalanceReport {
            account_id: balance.account_id,
            native_balance: balance.native_balance,
            has_sufficient_balance: balance.native_balance >= self.min_operational_balance,
        })
    }

    pub async fn get_token_info(&self, token_id: &TokenId) -> Result<TokenInfo> {
        retry_transient(self.retry_attempts, self.retry_delay, || self.query.token_info(token_id)).await
    }

    pub async fn get_nft_owner(&self, token_id: &TokenId, serial: u64) -> Result<AccountId> {
        let nft = retry_transient(self.retry_attempts, self.retry_delay, || self.query.nft_info(token_id, serial)).await?;
        Ok(nft.account_id)
    }

    /// `None` when the account is not associated with the token.
    pub async fn get_token_balance(&self, account_id: &AccountId, token_id: &TokenId) -> Result<Option<u64>> {
        let balance = retry_transient(self.retry_attempts, self.retry_delay, || self.query.account_balance(account_id)).await?;
        Ok(balance.token_balance(token_id))
    }

    pub async fn channel_exists(&self, channel_id: &ChannelId) -> Result<bool> {
        match retry_transient(self.retry_attempts, self.retry_delay, || self.query.topic_info(channel_id)).await {
            Ok(_) => Ok(true),
            Err(LedgerError::ChannelNotFound(_)) => Ok(false),
            Err(err) => Err(err),
        }
    }

    /// Decoded audit entries matching `filter`, in sequence order. Entries that are not audit messages are skipped.
    pub async fn get_channel_messages(&self, channel_id: &ChannelId, filter: &ChannelMessageFilter) -> Result<Vec<AuditRecord>> {
        let query = TopicMessageQuery { since_sequence: filter.since_sequence, limit: None };
        let messages = retry_transient(self.retry_attempts, self.retry_delay, || self.query.topic_messages(channel_id, query)).await?;
        let limit = filter.limit.unwrap_or(usize::MAX);
        let mut records = Vec::new();
        for raw in messages {
            let message = match AuditMessage::from_bytes(&raw.contents) {
                Ok(message) => message,
                Err(err) => {
                    debug!("skipping undecodable channel message channel={} sequence={} error={}", channel_id, raw.sequence_number, err);
                    continue;
                }
            };
            if !filter.matches(&message) {
                continue;
            }
            records.push(AuditRecord {
                sequence_number: raw.sequence_number,
                consensus_timestamp: format_ledger_timestamp(raw.consensus_timestamp_nanos),
                message,
            });
            if records.len() >= limit {
                break;
            }
        }
        Ok(records)
    }
}
