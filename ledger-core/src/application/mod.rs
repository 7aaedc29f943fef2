//! Orchestrated ledger protocols built on the domain and infrastructure layers.

pub mod audit_channel;
pub mod certificate;
pub mod distribution;
pub mod fungible;
pub mod operator;
pub mod orchestrator;
pub mod query;

mod submission;

pub use audit_channel::AuditChannel;
pub use certificate::CertificateService;
pub use distribution::{DistributionCoordinator, RewardTransfer};
pub use fungible::FungibleTokenService;
pub use operator::OperatorResolver;
pub use orchestrator::LedgerOrchestrator;
pub use query::{BalanceReport, NetworkQueryAdapter};
