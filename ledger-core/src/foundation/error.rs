use crate::foundation::types::{ProtocolStep, ReceiptStatus};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    KeyParse,
    InsufficientBalance,
    AlreadyAssociated,
    MetadataTooLarge,
    MessageTooLarge,
    NetworkError,
    Rejected,
    ProtocolStep,
    CallerNotFound,
    ChannelNotFound,
    TokenNotFound,
    AccountNotFound,
    InvalidEntityId,
    InvalidAmount,
    SupplyExceeded,
    FundingRateLimited,
    CircuitOpen,
    ConfigError,
    EncodingError,
    SerializationError,
    Message,
}

#[derive(Debug, Clone)]
pub struct ErrorContext {
    pub code: ErrorCode,
    pub message: String,
}

/// One rejected attempt to decode a stored credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyParseAttempt {
    pub format: &'static str,
    pub reason: String,
}

fn render_attempts(attempts: &[KeyParseAttempt]) -> String {
    attempts.iter().map(|attempt| format!("{} ({})", attempt.format, attempt.reason)).collect::<Vec<_>>().join(", ")
}

static ALREADY_ASSOCIATED: ReceiptStatus = ReceiptStatus::TokenAlreadyAssociatedToAccount;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("credential matched no supported key format: {}", render_attempts(.attempts))]
    KeyParse { attempts: Vec<KeyParseAttempt> },

    #[error("{operation} rejected for insufficient balance: {status}")]
    InsufficientBalance { operation: String, status: ReceiptStatus },

    #[error("{operation} rejected: token already associated to account")]
    AlreadyAssociated { operation: String },

    #[error("metadata too large: {size} bytes exceeds max {max}")]
    MetadataTooLarge { size: usize, max: usize },

    #[error("message too large: {size} exceeds max {max}")]
    MessageTooLarge { size: usize, max: usize },

    #[error("network error during {operation}: {details}")]
    Network { operation: String, details: String },

    #[error("ledger rejected {operation}: {status}")]
    Rejected { operation: String, status: ReceiptStatus },

    #[error("{step} step failed: {source}")]
    ProtocolStep {
        step: ProtocolStep,
        #[source]
        source: Box<LedgerError>,
    },

    #[error("caller not found: {0}")]
    CallerNotFound(String),

    #[error("audit channel not found: {0}")]
    ChannelNotFound(String),

    #[error("token not found: {0}")]
    TokenNotFound(String),

    #[error("account not found: {0}")]
    AccountNotFound(String),

    #[error("invalid entity id: input={input} reason={reason}")]
    InvalidEntityId { input: String, reason: String },

    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    #[error("supply exceeded: requested total {requested} exceeds max supply {max}")]
    SupplyExceeded { requested: u64, max: u64 },

    #[error("funding rate limited for account {account}; next top-up allowed in {retry_after_secs}s")]
    FundingRateLimited { account: String, retry_after_secs: u64 },

    #[error("circuit open for {operation}")]
    CircuitOpen { operation: String },

    #[error("configuration error: {0}")]
    ConfigError(String),

    #[error("encoding error: {0}")]
    EncodingError(String),

    #[error("{format} serialization error: {details}")]
    SerializationError { format: String, details: String },

    #[error("{0}")]
    Message(String),
}

pub type Result<T> = std::result::Result<T, LedgerError>;

impl LedgerError {
    pub fn code(&self) -> ErrorCode {
        match self {
            LedgerError::KeyParse { .. } => ErrorCode::KeyParse,
            LedgerError::InsufficientBalance { .. } => ErrorCode::InsufficientBalance,
            LedgerError::AlreadyAssociated { .. } => ErrorCode::AlreadyAssociated,
            LedgerError::MetadataTooLarge { .. } => ErrorCode::MetadataTooLarge,
            LedgerError::MessageTooLarge { .. } => ErrorCode::MessageTooLarge,
            LedgerError::Network { .. } => ErrorCode::NetworkError,
            LedgerError::Rejected { .. } => ErrorCode::Rejected,
            LedgerError::ProtocolStep { .. } => ErrorCode::ProtocolStep,
            LedgerError::CallerNotFound(_) => ErrorCode::CallerNotFound,
            LedgerError::ChannelNotFound(_) => ErrorCode::ChannelNotFound,
            LedgerError::TokenNotFound(_) => ErrorCode::TokenNotFound,
            LedgerError::AccountNotFound(_) => ErrorCode::AccountNotFound,
            LedgerError::InvalidEntityId { .. } => ErrorCode::InvalidEntityId,
            LedgerError::InvalidAmount(_) => ErrorCode::InvalidAmount,
            LedgerError::SupplyExceeded { .. } => ErrorCode::SupplyExceeded,
            LedgerError::FundingRateLimited { .. } => ErrorCode::FundingRateLimited,
            LedgerError::CircuitOpen { .. } => ErrorCode::CircuitOpen,
            LedgerError::ConfigError(_) => ErrorCode::ConfigError,
            LedgerError::EncodingError(_) => ErrorCode::EncodingError,
            LedgerError::SerializationError { .. } => ErrorCode::SerializationError,
            LedgerError::Message(_) => ErrorCode::Message,
        }
    }

    pub fn context(&self) -> ErrorContext {
        ErrorContext { code: self.code(), message: self.to_string() }
    }

    pub fn network(operation: impl Into<String>, details: impl Into<String>) -> Self {
        LedgerError::Network { operation: operation.into(), details: details.into() }
    }

    /// Decodes a non-success receipt status into the typed variant for it, `Rejected` otherwise.
    pub fn from_receipt_status(operation: impl Into<String>, status: ReceiptStatus) -> Self {
        let operation = operation.into();
        match status {
            ReceiptStatus::InsufficientPayerBalance | ReceiptStatus::InsufficientAccountBalance | ReceiptStatus::InsufficientTokenBalance => {
                LedgerError::InsufficientBalance { operation, status }
            }
            ReceiptStatus::TokenAlreadyAssociatedToAccount => LedgerError::AlreadyAssociated { operation },
            status => LedgerError::Rejected { operation, status },
        }
    }

    /// Wraps `self` with the protocol step it failed in. Already-wrapped errors keep their innermost step.
    pub fn at_step(self, step: ProtocolStep) -> Self {
        match self {
            err @ LedgerError::ProtocolStep { .. } => err,
            other => LedgerError::ProtocolStep { step, source: Box::new(other) },
        }
    }

    pub fn failed_step(&self) -> Option<ProtocolStep> {
        match self {
            LedgerError::ProtocolStep { step, .. } => Some(*step),
            _ => None,
        }
    }

    /// Strips any protocol step wrapping.
    pub fn root_cause(&self) -> &LedgerError {
        match self {
            LedgerError::ProtocolStep { source, .. } => source.root_cause(),
            other => other,
        }
    }

    /// Failures worth retrying without caller intervention.
    pub fn is_transient(&self) -> bool {
        match self.root_cause() {
            LedgerError::Network { .. } | LedgerError::CircuitOpen { .. } => true,
            LedgerError::Rejected { status, .. } => matches!(status, ReceiptStatus::Other(_)),
            _ => false,
        }
    }

    pub fn receipt_status(&self) -> Option<&ReceiptStatus> {
        match self.root_cause() {
            LedgerError::Rejected { status, .. } | LedgerError::InsufficientBalance { status, .. } => Some(status),
            LedgerError::AlreadyAssociated { .. } => Some(&ALREADY_ASSOCIATED),
            _ => None,
        }
    }
}

impl From<hex::FromHexError> for LedgerError {
    fn from(err: hex::FromHexError) -> Self {
        LedgerError::EncodingError(format!("hex decode error: {}", err))
    }
}

impl From<bincode::Error> for LedgerError {
    fn from(err: bincode::Error) -> Self {
        LedgerError::SerializationError { format: "bincode".to_string(), details: err.to_string() }
    }
}

impl From<serde_json::Error> for LedgerError {
    fn from(err: serde_json::Error) -> Self {
        LedgerError::SerializationError { format: "json".to_string(), details: err.to_string() }
    }
}

impl From<figment::Error> for LedgerError {
    fn from(err: figment::Error) -> Self {
        LedgerError::ConfigError(format!("config extraction failed: {}", err))
    }
}

impl From<reqwest::Error> for LedgerError {
    fn from(err: reqwest::Error) -> Self {
        let operation = err.url().map(|url| url.path().to_string()).unwrap_or_else(|| "http".to_string());
        LedgerError::Network { operation, details: err.to_string() }
    }
}

#[macro_export]
macro_rules! serde_err {
    ($fmt:expr, $err:expr) => {
        $crate::foundation::LedgerError::SerializationError { format: $fmt.into(), details: $err.to_string() }
    };
}

// NOTE: Avoid adding generic "stringly" error conversions here.
// Use structured `LedgerError` variants at the call site to preserve context.
