//! System-wide constants for ledger orchestration.

/// Nanoseconds per second (10^9).
pub const NANOS_PER_SECOND: u64 = 1_000_000_000;

/// Smallest native-currency units per whole coin.
pub const NATIVE_UNITS_PER_COIN: u64 = 100_000_000;

/// Default operational minimum an account must hold to pay for its own transactions (1 coin).
pub const MIN_OPERATIONAL_BALANCE: u64 = NATIVE_UNITS_PER_COIN;

/// Fixed top-up sent from the platform account to an under-funded certificate holder (2 coins).
pub const HOLDER_TOP_UP_AMOUNT: u64 = 2 * NATIVE_UNITS_PER_COIN;

/// Minimum interval between two top-ups of the same account.
pub const DEFAULT_FUNDING_COOLDOWN_SECS: u64 = 300;

/// Maximum size of an NFT metadata pointer in bytes.
pub const DEFAULT_MAX_METADATA_BYTES: usize = 100;

/// Maximum size of a single audit channel message in bytes.
pub const MAX_CHANNEL_MESSAGE_BYTES: usize = 20 * 1024;

/// Memo attached to a newly created audit channel.
pub const DEFAULT_AUDIT_CHANNEL_MEMO: &str = "ledger-orchestrator audit log";

/// Marker added to audit metadata when the platform operator replaced a failing delegated operator.
pub const FALLBACK_USED_KEY: &str = "fallbackUsed";

/// Bounded worker count for batch distribution.
pub const DEFAULT_DISTRIBUTION_CONCURRENCY: usize = 4;

/// Read-only query retry attempts.
pub const DEFAULT_QUERY_RETRY_ATTEMPTS: usize = 3;

/// Delay between read-only query retries in milliseconds.
pub const DEFAULT_QUERY_RETRY_DELAY_MS: u64 = 250;

/// Mirror node HTTP request timeout in seconds.
pub const DEFAULT_MIRROR_TIMEOUT_SECS: u64 = 10;

/// Initial circuit breaker open duration; doubles on each consecutive re-open.
pub const CIRCUIT_BREAKER_BASE_BACKOFF_SECS: u64 = 1;

/// Flat fee the in-memory ledger charges the payer of every transaction (0.001 coin).
pub const DEFAULT_TRANSACTION_FEE: u64 = 100_000;

/// Environment override for the wall clock, used for deterministic tests.
pub const TEST_NOW_NANOS_ENV_VAR: &str = "LEDGER_TEST_NOW_NANOS";
