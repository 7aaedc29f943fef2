use crate::foundation::LedgerError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::ops::Deref;
use std::str::FromStr;

macro_rules! define_id_type {
    (string $name:ident) => {
        #[derive(Clone, Debug, Default, Eq, Hash, PartialEq, PartialOrd, Ord, Deserialize, Serialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl Deref for $name {
            type Target = str;
            fn deref(&self) -> &Self::Target {
                self.as_str()
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }
    };

    (entity $name:ident) => {
        /// Ledger entity id in `shard.realm.num` notation.
        #[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, PartialOrd, Ord)]
        pub struct $name {
            pub shard: u64,
            pub realm: u64,
            pub num: u64,
        }

        impl $name {
            pub const fn new(shard: u64, realm: u64, num: u64) -> Self {
                Self { shard, realm, num }
            }

            /// Shorthand for an entity in shard 0, realm 0.
            pub const fn from_num(num: u64) -> Self {
                Self::new(0, 0, num)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}.{}.{}", self.shard, self.realm, self.num)
            }
        }

        impl FromStr for $name {
            type Err = LedgerError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let (shard, realm, num) = parse_entity_parts(s)?;
                Ok(Self { shard, realm, num })
            }
        }

        impl TryFrom<&str> for $name {
            type Error = LedgerError;

            fn try_from(value: &str) -> Result<Self, Self::Error> {
                value.parse()
            }
        }

        impl Serialize for $name {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: Serializer,
            {
                if serializer.is_human_readable() {
                    serializer.serialize_str(&self.to_string())
                } else {
                    (self.shard, self.realm, self.num).serialize(serializer)
                }
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: Deserializer<'de>,
            {
                if deserializer.is_human_readable() {
                    let s = String::deserialize(deserializer)?;
                    s.parse().map_err(serde::de::Error::custom)
                } else {
                    let (shard, realm, num) = <(u64, u64, u64)>::deserialize(deserializer)?;
                    Ok(Self { shard, realm, num })
                }
            }
        }
    };
}

fn parse_entity_parts(input: &str) -> Result<(u64, u64, u64), LedgerError> {
    let trimmed = input.trim();
    let invalid = |reason: &str| LedgerError::InvalidEntityId { input: trimmed.to_string(), reason: reason.to_string() };
    let mut parts = trimmed.split('.');
    let (Some(shard), Some(realm), Some(num), None) = (parts.next(), parts.next(), parts.next(), parts.next()) else {
        return Err(invalid("expected shard.realm.num"));
    };
    let parse = |part: &str| {
        if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid("components must be unsigned integers"));
        }
        part.parse::<u64>().map_err(|_| invalid("component out of range"))
    };
    Ok((parse(shard)?, parse(realm)?, parse(num)?))
}

define_id_type!(string CallerId);
define_id_type!(string TransactionRef);
define_id_type!(entity AccountId);
define_id_type!(entity TokenId);
define_id_type!(entity ChannelId);

/// Step of a multi-step ledger protocol, reported with failures.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProtocolStep {
    ChannelResolution,
    Submission,
    HolderResolution,
    TokenCreation,
    Mint,
    Funding,
    Association,
    Transfer,
}

impl ProtocolStep {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ChannelResolution => "channel_resolution",
            Self::Submission => "submission",
            Self::HolderResolution => "holder_resolution",
            Self::TokenCreation => "token_creation",
            Self::Mint => "mint",
            Self::Funding => "funding",
            Self::Association => "association",
            Self::Transfer => "transfer",
        }
    }
}

impl fmt::Display for ProtocolStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Final status carried by a ledger transaction receipt.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReceiptStatus {
    Success,
    TokenAlreadyAssociatedToAccount,
    TokenNotAssociatedToAccount,
    InsufficientPayerBalance,
    InsufficientAccountBalance,
    InsufficientTokenBalance,
    InvalidSignature,
    InvalidAccountId,
    InvalidTokenId,
    InvalidTopicId,
    InvalidNftId,
    SenderDoesNotOwnNftSerialNo,
    MetadataTooLong,
    MessageSizeTooLarge,
    TokenMaxSupplyReached,
    TokenHasNoSupplyKey,
    InvalidTransactionBody,
    Other(String),
}

impl ReceiptStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

impl fmt::Display for ReceiptStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Success => "SUCCESS",
            Self::TokenAlreadyAssociatedToAccount => "TOKEN_ALREADY_ASSOCIATED_TO_ACCOUNT",
            Self::TokenNotAssociatedToAccount => "TOKEN_NOT_ASSOCIATED_TO_ACCOUNT",
            Self::InsufficientPayerBalance => "INSUFFICIENT_PAYER_BALANCE",
            Self::InsufficientAccountBalance => "INSUFFICIENT_ACCOUNT_BALANCE",
            Self::InsufficientTokenBalance => "INSUFFICIENT_TOKEN_BALANCE",
            Self::InvalidSignature => "INVALID_SIGNATURE",
            Self::InvalidAccountId => "INVALID_ACCOUNT_ID",
            Self::InvalidTokenId => "INVALID_TOKEN_ID",
            Self::InvalidTopicId => "INVALID_TOPIC_ID",
            Self::InvalidNftId => "INVALID_NFT_ID",
            Self::SenderDoesNotOwnNftSerialNo => "SENDER_DOES_NOT_OWN_NFT_SERIAL_NO",
            Self::MetadataTooLong => "METADATA_TOO_LONG",
            Self::MessageSizeTooLarge => "MESSAGE_SIZE_TOO_LARGE",
            Self::TokenMaxSupplyReached => "TOKEN_MAX_SUPPLY_REACHED",
            Self::TokenHasNoSupplyKey => "TOKEN_HAS_NO_SUPPLY_KEY",
            Self::InvalidTransactionBody => "INVALID_TRANSACTION_BODY",
            Self::Other(other) => return f.write_str(other),
        };
        f.write_str(name)
    }
}
