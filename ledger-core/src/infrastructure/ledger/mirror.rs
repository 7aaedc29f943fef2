//! Read-only queries against a mirror node REST API.

use crate::domain::{SupplyPolicy, TokenKind};
use crate::foundation::{AccountId, ChannelId, LedgerError, Result, TokenId, NANOS_PER_SECOND};
use crate::infrastructure::ledger::circuit_breaker::{CircuitBreaker, CircuitBreakerConfig};
use crate::infrastructure::ledger::types::{AccountBalance, NftInfo, TokenInfo, TopicInfo, TopicMessage, TopicMessageQuery};
use crate::infrastructure::ledger::LedgerQuery;
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use log::{debug, warn};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;

/// Mirror node page size cap.
const MAX_PAGE_LIMIT: usize = 100;

/// Pages followed by one `topic_messages` call before giving up on `links.next`.
const MAX_TOPIC_PAGES: usize = 1_000;

#[derive(Debug, Deserialize)]
struct AccountResponse {
    account: String,
    balance: BalanceBlock,
}

#[derive(Debug, Deserialize)]
struct BalanceBlock {
    balance: u64,
    #[serde(default)]
    tokens: Vec<TokenBalanceEntry>,
}

#[derive(Debug, Deserialize)]
struct TokenBalanceEntry {
    token_id: String,
    balance: u64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    token_id: String,
    name: String,
    symbol: String,
    decimals: String,
    total_supply: String,
    #[serde(default)]
    max_supply: Option<String>,
    supply_type: String,
    #[serde(rename = "type")]
    token_type: String,
    treasury_account_id: String,
}

#[derive(Debug, Deserialize)]
struct TopicResponse {
    topic_id: String,
    #[serde(default)]
    memo: String,
}

#[derive(Debug, Deserialize)]
struct NftResponse {
    token_id: String,
    serial_number: u64,
    /// Absent once the serial is burned.
    #[serde(default)]
    account_id: Option<String>,
    #[serde(default)]
    metadata: String,
}

#[derive(Debug, Deserialize)]
struct TopicMessagesResponse {
    #[serde(default)]
    messages: Vec<TopicMessageEntry>,
    #[serde(default)]
    links: PageLinks,
}

#[derive(Debug, Default, Deserialize)]
struct PageLinks {
    #[serde(default)]
    next: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TopicMessageEntry {
    consensus_timestamp: String,
    message: String,
    payer_account_id: String,
    sequence_number: u64,
    topic_id: String,
}

fn parse_u64_field(field: &str, value: &str) -> Result<u64> {
    value.trim().parse::<u64>().map_err(|err| LedgerError::SerializationError {
        format: "mirror".to_string(),
        details: format!("{field}={value}: {err}"),
    })
}

/// `<seconds>.<nanos>` as returned by the mirror node.
fn parse_consensus_timestamp(value: &str) -> Result<u64> {
    let (secs, nanos) = value.split_once('.').unwrap_or((value, "0"));
    let secs = parse_u64_field("consensus_timestamp", secs)?;
    let nanos = parse_u64_field("consensus_timestamp", nanos)?;
    Ok(secs.saturating_mul(NANOS_PER_SECOND).saturating_add(nanos))
}

fn decode_topic_message(entry: TopicMessageEntry) -> Result<TopicMessage> {
    Ok(TopicMessage {
        topic_id: entry.topic_id.parse()?,
        sequence_number: entry.sequence_number,
        consensus_timestamp_nanos: parse_consensus_timestamp(&entry.consensus_timestamp)?,
        payer_account_id: entry.payer_account_id.parse()?,
        contents: STANDARD.decode(entry.message.as_bytes()).map_err(|err| crate::serde_err!("base64", err))?,
    })
}

/// Appends one page to `out` without exceeding `limit`; returns the next page link while more are wanted.
fn collect_topic_page(page: TopicMessagesResponse, limit: usize, out: &mut Vec<TopicMessage>) -> Result<Option<String>> {
    let TopicMessagesResponse { messages, links } = page;
    for entry in messages {
        if out.len() >= limit {
            break;
        }
        out.push(decode_topic_message(entry)?);
    }
    if out.len() >= limit {
        return Ok(None);
    }
    Ok(links.next.filter(|next| !next.is_empty()))
}

/// Strips credentials from a URL before it is logged.
pub fn redact_url(url: &str) -> String {
    let Some((scheme, rest)) = url.split_once("://") else {
        return url.to_string();
    };
    let (authority, tail) = match rest.find('/') {
        Some(idx) => rest.split_at(idx),
        None => (rest, ""),
    };
    match authority.rsplit_once('@') {
        Some((_, host)) => format!("{scheme}://***@{host}{tail}"),
        None => url.to_string(),
    }
}

pub struct MirrorNodeClient {
    base_url: String,
    http: reqwest::Client,
    breaker: CircuitBreaker,
}

impl MirrorNodeClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration, breaker: CircuitBreakerConfig) -> Result<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        debug!("mirror node client created base_url={} timeout_ms={}", redact_url(&base_url), timeout.as_millis());
        Ok(Self { breaker: CircuitBreaker::new(format!("mirror:{}", redact_url(&base_url)), breaker), base_url, http })
    }

    /// Mirror `links.next` values are paths; an absolute link on the same host is reduced to one.
    fn relative_path(&self, link: &str) -> String {
        link.strip_prefix(self.base_url.as_str()).unwrap_or(link).to_string()
    }

    async fn get_json<T: DeserializeOwned>(&self, operation: &str, path: &str, not_found: LedgerError) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        let outcome = self
            .breaker
            .call(|| async {
                let response = self.http.get(&url).send().await.map_err(|err| LedgerError::network(operation, err.to_string()))?;
                match response.status() {
                    status if status.is_success() => Ok(Some(response.json::<T>().await?)),
                    StatusCode::NOT_FOUND => Ok(None),
                    status if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS => {
                        Err(LedgerError::network(operation, format!("http status {status}")))
                    }
                    status => Err(LedgerError::Message(format!("{operation} rejected with http status {status}"))),
                }
            })
            .await;
        match outcome {
            Ok(Some(body)) => Ok(body),
            Ok(None) => Err(not_found),
            Err(err) => {
                warn!("mirror node request failed operation={} url={} error={}", operation, redact_url(&url), err);
                Err(err)
            }
        }
    }
}

#[async_trait]
impl LedgerQuery for MirrorNodeClient {
    async fn account_balance(&self, account_id: &AccountId) -> Result<AccountBalance> {
        let response: AccountResponse = self
            .get_json("account_balance", &format!("/api/v1/accounts/{account_id}"), LedgerError::AccountNotFound(account_id.to_string()))
            .await?;
        let mut tokens = BTreeMap::new();
        for entry in response.balance.tokens {
            tokens.insert(entry.token_id.parse::<TokenId>()?, entry.balance);
        }
        Ok(AccountBalance { account_id: response.account.parse()?, native_balance: response.balance.balance, tokens })
    }

    async fn token_info(&self, token_id: &TokenId) -> Result<TokenInfo> {
        let response: TokenResponse =
            self.get_json("token_info", &format!("/api/v1/tokens/{token_id}"), LedgerError::TokenNotFound(token_id.to_string())).await?;
        let supply_policy = match response.supply_type.as_str() {
            "FINITE" => {
                let max = response.max_supply.as_deref().unwrap_or("0");
                SupplyPolicy::Finite { max_supply: parse_u64_field("max_supply", max)? }
            }
            _ => SupplyPolicy::Infinite,
        };
        let kind = match response.token_type.as_str() {
            "NON_FUNGIBLE_UNIQUE" => TokenKind::NonFungible,
            _ => TokenKind::Fungible,
        };
        let decimals = parse_u64_field("decimals", &response.decimals)?;
        Ok(TokenInfo {
            token_id: response.token_id.parse()?,
            name: response.name,
            symbol: response.symbol,
            decimals: u32::try_from(decimals).map_err(|_| LedgerError::InvalidAmount(format!("decimals out of range: {decimals}")))?,
            total_supply: parse_u64_field("total_supply", &response.total_supply)?,
            supply_policy,
            kind,
            treasury_account_id: response.treasury_account_id.parse()?,
        })
    }

    async fn nft_info(&self, token_id: &TokenId, serial: u64) -> Result<NftInfo> {
        let not_found = || LedgerError::TokenNotFound(format!("{token_id}/{serial}"));
        let response: NftResponse = self.get_json("nft_info", &format!("/api/v1/tokens/{token_id}/nfts/{serial}"), not_found()).await?;
        let account_id = response.account_id.filter(|account| !account.is_empty()).ok_or_else(not_found)?;
        Ok(NftInfo {
            token_id: response.token_id.parse()?,
            serial_number: response.serial_number,
            account_id: account_id.parse()?,
            metadata: STANDARD.decode(response.metadata.as_bytes()).map_err(|err| crate::serde_err!("base64", err))?,
        })
    }

    async fn topic_info(&self, topic_id: &ChannelId) -> Result<TopicInfo> {
        let response: TopicResponse =
            self.get_json("topic_info", &format!("/api/v1/topics/{topic_id}"), LedgerError::ChannelNotFound(topic_id.to_string())).await?;
        Ok(TopicInfo { topic_id: response.topic_id.parse()?, memo: response.memo })
    }

    async fn topic_messages(&self, topic_id: &ChannelId, query: TopicMessageQuery) -> Result<Vec<TopicMessage>> {
        let limit = query.limit.unwrap_or(usize::MAX);
        if limit == 0 {
            return Ok(Vec::new());
        }
        let page_size = limit.min(MAX_PAGE_LIMIT);
        let mut path = format!("/api/v1/topics/{topic_id}/messages?order=asc&limit={page_size}");
        if let Some(since) = query.since_sequence {
            path.push_str(&format!("&sequencenumber=gte:{since}"));
        }

        let mut messages = Vec::new();
        for page in 1..=MAX_TOPIC_PAGES {
            let response: TopicMessagesResponse =
                self.get_json("topic_messages", &path, LedgerError::ChannelNotFound(topic_id.to_string())).await?;
            match collect_topic_page(response, limit, &mut messages)? {
                Some(next) => {
                    debug!("following topic message page topic={} page={} collected={}", topic_id, page, messages.len());
                    path = self.relative_path(&next);
                }
                None => return Ok(messages),
            }
        }
        warn!("topic message pagination stopped topic={} pages={} collected={}", topic_id, MAX_TOPIC_PAGES, messages.len());
        Ok(messages)
    }
}
