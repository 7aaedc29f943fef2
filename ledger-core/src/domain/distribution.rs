use crate::foundation::{AccountId, TokenId, TransactionRef};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RewardKind {
    Token,
    Native,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipient {
    pub account_id: AccountId,
    pub amount: u64,
}

impl Recipient {
    pub fn new(account_id: AccountId, amount: u64) -> Self {
        Self { account_id, amount }
    }
}

/// A non-atomic payout: every recipient succeeds or fails on its own.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistributionJob {
    pub recipients: Vec<Recipient>,
    pub reward_kind: RewardKind,
    pub token_id: Option<TokenId>,
}

impl DistributionJob {
    pub fn token(token_id: TokenId, recipients: Vec<Recipient>) -> Self {
        Self { recipients, reward_kind: RewardKind::Token, token_id: Some(token_id) }
    }

    pub fn native(recipients: Vec<Recipient>) -> Self {
        Self { recipients, reward_kind: RewardKind::Native, token_id: None }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RecipientStatus {
    Succeeded { transaction_ref: TransactionRef },
    Failed { reason: String },
    /// Not launched before the job deadline.
    Skipped,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipientOutcome {
    pub index: usize,
    pub account_id: AccountId,
    pub amount: u64,
    pub status: RecipientStatus,
}

impl RecipientOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self.status, RecipientStatus::Succeeded { .. })
    }
}

/// Aggregate of a distribution job. `success_count + fail_count == total`; skipped recipients count as failures.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistributionReport {
    pub total: usize,
    pub success_count: usize,
    pub fail_count: usize,
    pub skipped_count: usize,
    pub per_recipient_results: Vec<RecipientOutcome>,
}

impl DistributionReport {
    /// Builds a report from index-keyed slots; a slot left empty was never launched.
    pub fn from_slots(recipients: &[Recipient], slots: Vec<Option<RecipientStatus>>) -> Self {
        let per_recipient_results: Vec<RecipientOutcome> = recipients
            .iter()
            .zip(slots.into_iter().chain(std::iter::repeat(None)))
            .enumerate()
            .map(|(index, (recipient, status))| RecipientOutcome {
                index,
                account_id: recipient.account_id,
                amount: recipient.amount,
                status: status.unwrap_or(RecipientStatus::Skipped),
            })
            .collect();
        let success_count = per_recipient_results.iter().filter(|outcome| outcome.is_success()).count();
        let skipped_count = per_recipient_results.iter().filter(|outcome| outcome.status == RecipientStatus::Skipped).count();
        let total = per_recipient_results.len();
        Self { total, success_count, fail_count: total - success_count, skipped_count, per_recipient_results }
    }

    pub fn is_partial_failure(&self) -> bool {
        self.fail_count > 0 && self.success_count > 0
    }

    pub fn failures(&self) -> impl Iterator<Item = &RecipientOutcome> {
        self.per_recipient_results.iter().filter(|outcome| !outcome.is_success())
    }
}
