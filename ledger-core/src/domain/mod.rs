//! Pure data types and state machines. No I/O.

pub mod audit;
pub mod certificate;
pub mod distribution;
pub mod operator;
pub mod token;

pub use audit::{AppendReceipt, AuditMessage, AuditRecord, ChannelMessageFilter, OperatorInfo};
pub use certificate::{validate_metadata_pointer, CertificateAsset, CertificateHolding, CertificateState, TransferOutcome};
pub use distribution::{DistributionJob, DistributionReport, Recipient, RecipientOutcome, RecipientStatus, RewardKind};
pub use operator::OperatorContext;
pub use token::{AssociationStatus, CreateTokenRequest, SupplyPolicy, TokenDescriptor, TokenKind};
