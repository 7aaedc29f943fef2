use crate::domain::operator::OperatorContext;
use crate::foundation::{format_ledger_timestamp, AccountId, ChannelId, LedgerError, ReceiptStatus, TransactionRef};
use crate::foundation::{FALLBACK_USED_KEY, MAX_CHANNEL_MESSAGE_BYTES};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperatorInfo {
    pub account_id: AccountId,
    pub is_delegated: bool,
}

impl From<&OperatorContext> for OperatorInfo {
    fn from(operator: &OperatorContext) -> Self {
        Self { account_id: operator.account_id, is_delegated: operator.is_delegated }
    }
}

/// Structured event appended to the audit channel as UTF-8 JSON.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditMessage {
    pub event_type: String,
    pub subject_id: String,
    #[serde(default)]
    pub metadata: Map<String, Value>,
    pub operator_info: OperatorInfo,
    /// `<seconds>.<nanos>` wall-clock time of the append call.
    pub timestamp: String,
}

impl AuditMessage {
    pub fn new(
        event_type: impl Into<String>,
        subject_id: impl Into<String>,
        metadata: Map<String, Value>,
        operator: &OperatorContext,
        timestamp_nanos: u64,
    ) -> Self {
        Self {
            event_type: event_type.into(),
            subject_id: subject_id.into(),
            metadata,
            operator_info: OperatorInfo::from(operator),
            timestamp: format_ledger_timestamp(timestamp_nanos),
        }
    }

    /// Re-attributes the message to `operator` and marks it as a platform fallback.
    pub fn into_fallback(mut self, operator: &OperatorContext) -> Self {
        self.metadata.insert(FALLBACK_USED_KEY.to_string(), Value::Bool(true));
        self.operator_info = OperatorInfo::from(operator);
        self
    }

    pub fn fallback_used(&self) -> bool {
        matches!(self.metadata.get(FALLBACK_USED_KEY), Some(Value::Bool(true)))
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, LedgerError> {
        let bytes = serde_json::to_vec(self)?;
        if bytes.len() > MAX_CHANNEL_MESSAGE_BYTES {
            return Err(LedgerError::MessageTooLarge { size: bytes.len(), max: MAX_CHANNEL_MESSAGE_BYTES });
        }
        Ok(bytes)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, LedgerError> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppendReceipt {
    pub transaction_ref: TransactionRef,
    pub channel_id: ChannelId,
    pub status: ReceiptStatus,
    pub sequence_number: Option<u64>,
    pub fallback_used: bool,
}

/// A decoded audit channel entry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub sequence_number: u64,
    pub consensus_timestamp: String,
    pub message: AuditMessage,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChannelMessageFilter {
    pub event_type: Option<String>,
    pub subject_id: Option<String>,
    /// Inclusive lower bound on the channel sequence number.
    pub since_sequence: Option<u64>,
    pub limit: Option<usize>,
}

impl ChannelMessageFilter {
    pub fn event_type(mut self, event_type: impl Into<String>) -> Self {
        self.event_type = Some(event_type.into());
        self
    }

    pub fn subject_id(mut self, subject_id: impl Into<String>) -> Self {
        self.subject_id = Some(subject_id.into());
        self
    }

    pub fn since_sequence(mut self, sequence: u64) -> Self {
        self.since_sequence = Some(sequence);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn matches(&self, message: &AuditMessage) -> bool {
        self.event_type.as_deref().map_or(true, |event_type| event_type == message.event_type)
            && self.subject_id.as_deref().map_or(true, |subject_id| subject_id == message.subject_id)
    }
}
