//! Append-only audit log on a consensus channel.

use crate::application::operator::OperatorResolver;
use crate::application::submission::submit_as;
use crate::domain::{AppendReceipt, AuditMessage, OperatorContext};
use crate::foundation::util::time::now_nanos;
use crate::foundation::{CallerId, ChannelId, LedgerError, ProtocolStep, Result};
use crate::infrastructure::ledger::{LedgerQuery, TransactionBody, TransactionReceipt, TransactionSubmitter};
use log::{debug, info, warn};
use serde_json::{Map, Value};
use std::sync::Arc;
use tokio::sync::OnceCell;

pub struct AuditChannel {
    submitter: Arc<dyn TransactionSubmitter>,
    query: Arc<dyn LedgerQuery>,
    operators: Arc<OperatorResolver>,
    preconfigured: Option<ChannelId>,
    memo: String,
    channel_id: OnceCell<ChannelId>,
}

impl AuditChannel {
    pub fn new(
        submitter: Arc<dyn TransactionSubmitter>,
        query: Arc<dyn LedgerQuery>,
        operators: Arc<OperatorResolver>,
        preconfigured: Option<ChannelId>,
        memo: impl Into<String>,
    ) -> Self {
        Self { submitter, query, operators, preconfigured, memo: memo.into(), channel_id: OnceCell::new() }
    }

    /// The resolved channel, if [`Self::ensure_channel`] has succeeded.
    pub fn channel_id(&self) -> Option<ChannelId> {
        self.channel_id.get().copied()
    }

    /// Loads `preconfigured` (or the configured id) or creates a new channel, exactly once per instance.
    ///
    /// Concurrent callers wait on the first resolution and all observe its id. A failed resolution leaves
    /// the cache empty so the next caller tries again.
    pub async fn ensure_channel(&self, preconfigured: Option<ChannelId>) -> Result<ChannelId> {
        let requested = preconfigured.or(self.preconfigured);
        let channel_id = self
            .channel_id
            .get_or_try_init(|| self.resolve_channel(requested))
            .await
            .map_err(|err| err.at_step(ProtocolStep::ChannelResolution))?;
        Ok(*channel_id)
    }

    async fn resolve_channel(&self, requested: Option<ChannelId>) -> Result<ChannelId> {
        if let Some(channel_id) = requested {
            let topic = self.query.topic_info(&channel_id).await?;
            info!("audit channel loaded channel={} memo={}", topic.topic_id, topic.memo);
            return Ok(topic.topic_id);
        }
        let platform = self.operators.platform();
        // No submit key: delegated operators must be able to append.
        let body = TransactionBody::TopicCreate { memo: self.memo.clone(), submit_key: None };
        let receipt = submit_as(self.submitter.as_ref(), &platform, &[], body).await?;
        let channel_id = receipt.topic_id.ok_or_else(|| LedgerError::Message("topic create receipt carried no topic id".to_string()))?;
        info!("audit channel created channel={} tx={} operator={}", channel_id, receipt.transaction_ref, platform.account_id);
        Ok(channel_id)
    }

    /// Appends an event attributed to `caller_id`'s delegated operator when one resolves.
    ///
    /// A failed delegated submission is retried once as the platform with `fallbackUsed: true` in the
    /// metadata. A failed platform submission is returned as is.
    pub async fn append(
        &self,
        caller_id: &CallerId,
        event_type: &str,
        subject_id: &str,
        metadata: Map<String, Value>,
    ) -> Result<AppendReceipt> {
        let channel_id = self.ensure_channel(None).await?;
        let operator = self.operators.resolve_operator(caller_id, true).await;
        let message = AuditMessage::new(event_type, subject_id, metadata, &operator, now_nanos());

        let err = match self.submit_message(channel_id, &operator, &message).await {
            Ok(receipt) => return Ok(Self::append_receipt(channel_id, receipt, false)),
            Err(err) => err,
        };
        if !operator.is_delegated || matches!(err.root_cause(), LedgerError::MessageTooLarge { .. }) {
            return Err(err);
        }

        let platform = self.operators.platform();
        warn!(
            "delegated audit append failed; retrying as platform caller={} delegated_account={} platform_account={} event_type={} error={}",
            caller_id, operator.account_id, platform.account_id, event_type, err
        );
        let fallback = message.into_fallback(&platform);
        let receipt = self.submit_message(channel_id, &platform, &fallback).await?;
        Ok(Self::append_receipt(channel_id, receipt, true))
    }

    async fn submit_message(&self, channel_id: ChannelId, operator: &OperatorContext, message: &AuditMessage) -> Result<TransactionReceipt> {
        let bytes = message.to_bytes()?;
        debug!(
            "appending audit message channel={} event_type={} subject={} operator={} bytes={}",
            channel_id,
            message.event_type,
            message.subject_id,
            operator.account_id,
            bytes.len()
        );
        let body = TransactionBody::TopicMessageSubmit { topic_id: channel_id, message: bytes };
        submit_as(self.submitter.as_ref(), operator, &[], body).await.map_err(|err| err.at_step(ProtocolStep::Submission))
    }

    fn append_receipt(channel_id: ChannelId, receipt: TransactionReceipt, fallback_used: bool) -> AppendReceipt {
        AppendReceipt {
            transaction_ref: receipt.transaction_ref,
            channel_id,
            status: receipt.status,
            sequence_number: receipt.topic_sequence_number,
            fallback_used,
        }
    }
}
