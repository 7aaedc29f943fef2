//! Non-atomic batch payouts with bounded concurrency.

use crate::domain::{DistributionJob, DistributionReport, Recipient, RecipientStatus, RewardKind};
use crate::foundation::{LedgerError, Result, TokenId, TransactionRef};
use crate::infrastructure::config::DistributionConfig;
use async_trait::async_trait;
use futures_util::stream::{self, StreamExt};
use log::{debug, info, warn};
use std::time::Duration;
use tokio::time::Instant;

/// Pays a single recipient of a distribution job.
#[async_trait]
pub trait RewardTransfer: Send + Sync {
    async fn pay(&self, reward_kind: RewardKind, token_id: Option<TokenId>, recipient: &Recipient) -> Result<TransactionRef>;
}

#[derive(Clone, Debug)]
pub struct DistributionCoordinator {
    max_concurrency: usize,
    deadline: Option<Duration>,
}

impl DistributionCoordinator {
    pub fn new(max_concurrency: usize, deadline: Option<Duration>) -> Self {
        Self { max_concurrency: max_concurrency.max(1), deadline }
    }

    pub fn from_config(config: &DistributionConfig) -> Self {
        Self::new(config.max_concurrency, config.deadline())
    }

    /// Pays every recipient independently and never aborts early.
    ///
    /// Once the deadline passes no further recipients are launched; in-flight payments still complete and
    /// the rest are reported as skipped.
    pub async fn distribute(&self, job: &DistributionJob, rewards: &dyn RewardTransfer) -> DistributionReport {
        let deadline = self.deadline.map(|limit| Instant::now() + limit);
        let mut slots: Vec<Option<RecipientStatus>> = vec![None; job.recipients.len()];
        debug!(
            "distribution started recipients={} reward_kind={:?} token={:?} max_concurrency={}",
            job.recipients.len(),
            job.reward_kind,
            job.token_id,
            self.max_concurrency
        );

        let mut outcomes = stream::iter(job.recipients.iter().enumerate())
            .map(|(index, recipient)| async move {
                if deadline.is_some_and(|at| Instant::now() >= at) {
                    return (index, None);
                }
                let status = match Self::pay_one(job, rewards, recipient).await {
                    Ok(transaction_ref) => RecipientStatus::Succeeded { transaction_ref },
                    Err(err) => {
                        warn!("distribution recipient failed index={} account={} amount={} error={}", index, recipient.account_id, recipient.amount, err);
                        RecipientStatus::Failed { reason: err.to_string() }
                    }
                };
                (index, Some(status))
            })
            .buffer_unordered(self.max_concurrency);

        while let Some((index, status)) = outcomes.next().await {
            slots[index] = status;
        }

        let report = DistributionReport::from_slots(&job.recipients, slots);
        info!(
            "distribution finished total={} success={} failed={} skipped={}",
            report.total, report.success_count, report.fail_count, report.skipped_count
        );
        report
    }

    async fn pay_one(job: &DistributionJob, rewards: &dyn RewardTransfer, recipient: &Recipient) -> Result<TransactionRef> {
        if recipient.amount == 0 {
            return Err(LedgerError::InvalidAmount(format!("zero amount for recipient {}", recipient.account_id)));
        }
        if job.reward_kind == RewardKind::Token && job.token_id.is_none() {
            return Err(LedgerError::Message("token distribution without a token id".to_string()));
        }
        rewards.pay(job.reward_kind, job.token_id, recipient).await
    }
}

impl Default for DistributionCoordinator {
    fn default() -> Self {
        Self::from_config(&DistributionConfig::default())
    }
}
