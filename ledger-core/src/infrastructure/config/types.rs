use crate::foundation::{
    DEFAULT_AUDIT_CHANNEL_MEMO, DEFAULT_DISTRIBUTION_CONCURRENCY, DEFAULT_FUNDING_COOLDOWN_SECS, DEFAULT_MAX_METADATA_BYTES,
    DEFAULT_MIRROR_TIMEOUT_SECS, DEFAULT_QUERY_RETRY_ATTEMPTS, DEFAULT_QUERY_RETRY_DELAY_MS, HOLDER_TOP_UP_AMOUNT,
    MIN_OPERATIONAL_BALANCE,
};
use crate::infrastructure::ledger::CircuitBreakerConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_MIRROR_URL: &str = "http://127.0.0.1:5551";
const DEFAULT_LOG_FILTERS: &str = "info";

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub network: NetworkConfig,
    #[serde(default)]
    pub platform: PlatformConfig,
    #[serde(default)]
    pub audit: AuditConfig,
    #[serde(default)]
    pub certificates: CertificateConfig,
    #[serde(default)]
    pub funding: FundingConfig,
    #[serde(default)]
    pub distribution: DistributionConfig,
    #[serde(default)]
    pub query: QueryConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Mirror node REST base URL used for read-only queries.
    #[serde(default = "default_mirror_url")]
    pub mirror_url: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default)]
    pub circuit_breaker: CircuitBreakerConfig,
}

fn default_mirror_url() -> String {
    DEFAULT_MIRROR_URL.to_string()
}

const fn default_request_timeout_secs() -> u64 {
    DEFAULT_MIRROR_TIMEOUT_SECS
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            mirror_url: default_mirror_url(),
            request_timeout_secs: default_request_timeout_secs(),
            circuit_breaker: CircuitBreakerConfig::default(),
        }
    }
}

impl NetworkConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Platform operator. The credential is either inline or read from the named env var.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct PlatformConfig {
    #[serde(default)]
    pub account_id: String,
    #[serde(default)]
    pub credential: Option<String>,
    #[serde(default)]
    pub credential_env: Option<String>,
}

impl std::fmt::Debug for PlatformConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlatformConfig")
            .field("account_id", &self.account_id)
            .field("credential", &self.credential.as_ref().map(|_| "[REDACTED]"))
            .field("credential_env", &self.credential_env)
            .finish()
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AuditConfig {
    /// Pre-existing channel to append to; a new channel is created on first use when unset.
    #[serde(default)]
    pub channel_id: Option<String>,
    #[serde(default = "default_channel_memo")]
    pub memo: String,
}

fn default_channel_memo() -> String {
    DEFAULT_AUDIT_CHANNEL_MEMO.to_string()
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self { channel_id: None, memo: default_channel_memo() }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CertificateConfig {
    #[serde(default = "default_max_metadata_bytes")]
    pub max_metadata_bytes: usize,
}

const fn default_max_metadata_bytes() -> usize {
    DEFAULT_MAX_METADATA_BYTES
}

impl Default for CertificateConfig {
    fn default() -> Self {
        Self { max_metadata_bytes: default_max_metadata_bytes() }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FundingConfig {
    #[serde(default = "default_min_operational_balance")]
    pub min_operational_balance: u64,
    #[serde(default = "default_top_up_amount")]
    pub top_up_amount: u64,
    /// Minimum seconds between two top-ups of the same account; 0 disables the limit.
    #[serde(default = "default_cooldown_secs")]
    pub cooldown_secs: u64,
}

const fn default_min_operational_balance() -> u64 {
    MIN_OPERATIONAL_BALANCE
}

const fn default_top_up_amount() -> u64 {
    HOLDER_TOP_UP_AMOUNT
}

const fn default_cooldown_secs() -> u64 {
    DEFAULT_FUNDING_COOLDOWN_SECS
}

impl Default for FundingConfig {
    fn default() -> Self {
        Self {
            min_operational_balance: default_min_operational_balance(),
            top_up_amount: default_top_up_amount(),
            cooldown_secs: default_cooldown_secs(),
        }
    }
}

impl FundingConfig {
    pub fn cooldown(&self) -> Duration {
        Duration::from_secs(self.cooldown_secs)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DistributionConfig {
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
    /// Stop launching recipients after this many seconds.
    #[serde(default)]
    pub deadline_secs: Option<u64>,
}

const fn default_max_concurrency() -> usize {
    DEFAULT_DISTRIBUTION_CONCURRENCY
}

impl Default for DistributionConfig {
    fn default() -> Self {
        Self { max_concurrency: default_max_concurrency(), deadline_secs: None }
    }
}

impl DistributionConfig {
    pub fn deadline(&self) -> Option<Duration> {
        self.deadline_secs.map(Duration::from_secs)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct QueryConfig {
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: usize,
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

const fn default_retry_attempts() -> usize {
    DEFAULT_QUERY_RETRY_ATTEMPTS
}

const fn default_retry_delay_ms() -> u64 {
    DEFAULT_QUERY_RETRY_DELAY_MS
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self { retry_attempts: default_retry_attempts(), retry_delay_ms: default_retry_delay_ms() }
    }
}

impl QueryConfig {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub dir: Option<String>,
    #[serde(default = "default_log_filters")]
    pub filters: String,
}

fn default_log_filters() -> String {
    DEFAULT_LOG_FILTERS.to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { dir: None, filters: default_log_filters() }
    }
}
