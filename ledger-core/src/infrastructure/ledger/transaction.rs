//! Transaction bodies, ids and signing.

use crate::domain::{SupplyPolicy, TokenKind};
use crate::foundation::util::time::now_nanos;
use crate::foundation::{format_ledger_timestamp, AccountId, ChannelId, Result, TokenId, TransactionRef};
use crate::infrastructure::keys::{PublicKey, SigningKey};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static LAST_VALID_START: AtomicU64 = AtomicU64::new(0);

/// Payer plus valid-start timestamp; unique per submitted transaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransactionId {
    pub payer: AccountId,
    pub valid_start_nanos: u64,
}

impl TransactionId {
    /// Valid-start times are strictly increasing within the process so two ids never collide.
    pub fn generate(payer: AccountId) -> Self {
        let now = now_nanos();
        let mut previous = LAST_VALID_START.load(Ordering::Relaxed);
        loop {
            let next = now.max(previous.saturating_add(1));
            match LAST_VALID_START.compare_exchange_weak(previous, next, Ordering::AcqRel, Ordering::Relaxed) {
                Ok(_) => return Self { payer, valid_start_nanos: next },
                Err(actual) => previous = actual,
            }
        }
    }

    pub fn to_ref(&self) -> TransactionRef {
        TransactionRef::new(self.to_string())
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.payer, format_ledger_timestamp(self.valid_start_nanos))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    CryptoTransfer,
    TokenCreate,
    TokenAssociate,
    TokenTransfer,
    TokenMint,
    NftTransfer,
    TopicCreate,
    TopicMessageSubmit,
}

impl TransactionKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::CryptoTransfer => "crypto_transfer",
            Self::TokenCreate => "token_create",
            Self::TokenAssociate => "token_associate",
            Self::TokenTransfer => "token_transfer",
            Self::TokenMint => "token_mint",
            Self::NftTransfer => "nft_transfer",
            Self::TopicCreate => "topic_create",
            Self::TopicMessageSubmit => "topic_message_submit",
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenCreateParams {
    pub name: String,
    pub symbol: String,
    pub decimals: u32,
    pub initial_supply: u64,
    pub supply_policy: SupplyPolicy,
    pub kind: TokenKind,
    pub treasury: AccountId,
    pub supply_key: Option<PublicKey>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionBody {
    CryptoTransfer { sender: AccountId, recipient: AccountId, amount: u64 },
    TokenCreate(TokenCreateParams),
    TokenAssociate { account: AccountId, token_ids: Vec<TokenId> },
    TokenTransfer { token_id: TokenId, sender: AccountId, recipient: AccountId, amount: u64 },
    /// `amount` applies to fungible tokens; `metadata` holds one entry per serial for non-fungible ones.
    TokenMint { token_id: TokenId, amount: u64, metadata: Vec<Vec<u8>> },
    NftTransfer { token_id: TokenId, serial: u64, sender: AccountId, recipient: AccountId },
    TopicCreate { memo: String, submit_key: Option<PublicKey> },
    TopicMessageSubmit { topic_id: ChannelId, message: Vec<u8> },
}

impl TransactionBody {
    pub fn kind(&self) -> TransactionKind {
        match self {
            Self::CryptoTransfer { .. } => TransactionKind::CryptoTransfer,
            Self::TokenCreate(_) => TransactionKind::TokenCreate,
            Self::TokenAssociate { .. } => TransactionKind::TokenAssociate,
            Self::TokenTransfer { .. } => TransactionKind::TokenTransfer,
            Self::TokenMint { .. } => TransactionKind::TokenMint,
            Self::NftTransfer { .. } => TransactionKind::NftTransfer,
            Self::TopicCreate { .. } => TransactionKind::TopicCreate,
            Self::TopicMessageSubmit { .. } => TransactionKind::TopicMessageSubmit,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    pub body: TransactionBody,
}

impl Transaction {
    pub fn new(payer: AccountId, body: TransactionBody) -> Self {
        Self { id: TransactionId::generate(payer), body }
    }

    pub fn kind(&self) -> TransactionKind {
        self.body.kind()
    }

    /// Canonical bytes covered by every signature.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }

    /// Signs with every key; duplicates (same public key) sign once.
    pub fn sign(self, keys: &[&SigningKey]) -> Result<SignedTransaction> {
        let body_bytes = self.to_bytes()?;
        let mut signatures: Vec<SignaturePair> = Vec::with_capacity(keys.len());
        for key in keys {
            let public_key = key.public_key();
            if signatures.iter().any(|pair| pair.public_key == public_key) {
                continue;
            }
            signatures.push(SignaturePair { signature: key.sign(&body_bytes), public_key });
        }
        Ok(SignedTransaction { transaction: self, body_bytes, signatures })
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignaturePair {
    pub public_key: PublicKey,
    pub signature: Vec<u8>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SignedTransaction {
    pub transaction: Transaction,
    pub body_bytes: Vec<u8>,
    pub signatures: Vec<SignaturePair>,
}

impl SignedTransaction {
    pub fn id(&self) -> TransactionId {
        self.transaction.id
    }

    pub fn kind(&self) -> TransactionKind {
        self.transaction.kind()
    }

    pub fn payer(&self) -> AccountId {
        self.transaction.id.payer
    }

    /// Public keys whose signature over `body_bytes` verifies.
    pub fn verified_signers(&self) -> Vec<PublicKey> {
        self.signatures
            .iter()
            .filter(|pair| pair.public_key.verify(&self.body_bytes, &pair.signature))
            .map(|pair| pair.public_key.clone())
            .collect()
    }

    pub fn body_matches_bytes(&self) -> bool {
        self.transaction.to_bytes().map(|bytes| bytes == self.body_bytes).unwrap_or(false)
    }
}
