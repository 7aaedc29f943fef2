use crate::domain::token::AssociationStatus;
use crate::foundation::{AccountId, LedgerError, TokenId, TransactionRef};
use serde::{Deserialize, Serialize};

/// A minted non-fungible certificate. `metadata_pointer` is a compact external reference, not the content.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateAsset {
    pub token_id: TokenId,
    pub serial_number: u64,
    pub metadata_pointer: Vec<u8>,
}

impl CertificateAsset {
    pub fn metadata_lossy(&self) -> String {
        String::from_utf8_lossy(&self.metadata_pointer).into_owned()
    }
}

/// Rejects an empty or oversized pointer before anything is sent to the ledger.
pub fn validate_metadata_pointer(pointer: &[u8], max_bytes: usize) -> Result<(), LedgerError> {
    if pointer.is_empty() {
        return Err(LedgerError::Message("metadata pointer must not be empty".to_string()));
    }
    if pointer.len() > max_bytes {
        return Err(LedgerError::MetadataTooLarge { size: pointer.len(), max: max_bytes });
    }
    Ok(())
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum CertificateState {
    Unminted,
    TreasuryHeld,
    /// Transfer attempted and failed; the asset legitimately stays with the treasury.
    TransferFailed { reason: String },
    HolderHeld { holder: AccountId },
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum StateTag {
    Unminted,
    TreasuryHeld,
    TransferFailed,
    HolderHeld,
}

const VALID_TRANSITIONS: &[(StateTag, StateTag)] = &[
    (StateTag::Unminted, StateTag::TreasuryHeld),
    (StateTag::TreasuryHeld, StateTag::HolderHeld),
    (StateTag::TreasuryHeld, StateTag::TransferFailed),
    // A caller-driven retry of the whole transfer protocol.
    (StateTag::TransferFailed, StateTag::HolderHeld),
    (StateTag::TransferFailed, StateTag::TransferFailed),
];

impl CertificateState {
    fn tag(&self) -> StateTag {
        match self {
            Self::Unminted => StateTag::Unminted,
            Self::TreasuryHeld => StateTag::TreasuryHeld,
            Self::TransferFailed { .. } => StateTag::TransferFailed,
            Self::HolderHeld { .. } => StateTag::HolderHeld,
        }
    }

    pub fn can_transition_to(&self, next: &CertificateState) -> bool {
        VALID_TRANSITIONS.contains(&(self.tag(), next.tag()))
    }

    pub fn transition(self, next: CertificateState) -> Result<CertificateState, LedgerError> {
        if self.can_transition_to(&next) {
            Ok(next)
        } else {
            Err(LedgerError::Message(format!("invalid certificate transition from {:?} to {:?}", self.tag(), next.tag())))
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::HolderHeld { .. } | Self::TransferFailed { .. })
    }

    pub fn is_treasury_held(&self) -> bool {
        matches!(self, Self::TreasuryHeld | Self::TransferFailed { .. })
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "held_by", rename_all = "snake_case")]
pub enum CertificateHolding {
    Treasury { account_id: AccountId },
    Holder { account_id: AccountId },
}

/// Result of the fund, associate, transfer protocol.
///
/// Funding and association are never rolled back; `success == false` with a treasury holding is a valid end state.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TransferOutcome {
    pub asset: CertificateAsset,
    pub success: bool,
    pub holding: CertificateHolding,
    pub state: CertificateState,
    pub funded: bool,
    pub association: AssociationStatus,
    pub transaction_ref: Option<TransactionRef>,
    pub reason: Option<String>,
}
