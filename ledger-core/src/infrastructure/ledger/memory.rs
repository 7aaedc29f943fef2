//! In-process ledger used for local runs and tests.
//!
//! Signatures are verified, fees are charged, association is enforced and every submission is
//! recorded, so protocol code exercised against it behaves as it would against a real network.

use crate::domain::{SupplyPolicy, TokenKind};
use crate::foundation::util::time::now_nanos;
use crate::foundation::{AccountId, ChannelId, LedgerError, ReceiptStatus, Result, TokenId};
use crate::foundation::{DEFAULT_MAX_METADATA_BYTES, DEFAULT_TRANSACTION_FEE, MAX_CHANNEL_MESSAGE_BYTES};
use crate::infrastructure::keys::PublicKey;
use crate::infrastructure::ledger::transaction::{SignedTransaction, TokenCreateParams, TransactionBody, TransactionKind};
use crate::infrastructure::ledger::types::{AccountBalance, NftInfo, TokenInfo, TopicInfo, TopicMessage, TopicMessageQuery, TransactionReceipt};
use crate::infrastructure::ledger::{LedgerQuery, TransactionSubmitter};
use async_trait::async_trait;
use log::{debug, trace};
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

const FIRST_ENTITY_NUM: u64 = 1001;

/// A failure the ledger injects instead of executing a submission.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InjectedFault {
    Status(ReceiptStatus),
    Network(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubmissionRecord {
    pub kind: TransactionKind,
    pub payer: AccountId,
    /// `None` when the submission failed at the transport level.
    pub status: Option<ReceiptStatus>,
}

struct AccountEntry {
    key: PublicKey,
    balance: u64,
    tokens: BTreeMap<TokenId, u64>,
}

struct TokenEntry {
    name: String,
    symbol: String,
    decimals: u32,
    total_supply: u64,
    supply_policy: SupplyPolicy,
    kind: TokenKind,
    treasury: AccountId,
    supply_key: Option<PublicKey>,
    next_serial: u64,
    nft_owners: BTreeMap<u64, AccountId>,
    nft_metadata: BTreeMap<u64, Vec<u8>>,
}

struct TopicEntry {
    memo: String,
    submit_key: Option<PublicKey>,
    messages: Vec<TopicMessage>,
}

struct LedgerInner {
    next_entity_num: u64,
    accounts: HashMap<AccountId, AccountEntry>,
    tokens: HashMap<TokenId, TokenEntry>,
    topics: HashMap<ChannelId, TopicEntry>,
    queued_faults: HashMap<TransactionKind, VecDeque<InjectedFault>>,
    failing_payers: HashMap<AccountId, ReceiptStatus>,
    submissions: Vec<SubmissionRecord>,
    query_count: usize,
}

impl LedgerInner {
    fn new() -> Self {
        Self {
            next_entity_num: FIRST_ENTITY_NUM,
            accounts: HashMap::new(),
            tokens: HashMap::new(),
            topics: HashMap::new(),
            queued_faults: HashMap::new(),
            failing_payers: HashMap::new(),
            submissions: Vec::new(),
            query_count: 0,
        }
    }

    fn next_num(&mut self) -> u64 {
        let num = self.next_entity_num;
        self.next_entity_num += 1;
        num
    }

    fn take_fault(&mut self, kind: TransactionKind, payer: &AccountId) -> Option<InjectedFault> {
        if let Some(status) = self.failing_payers.get(payer) {
            return Some(InjectedFault::Status(status.clone()));
        }
        let queue = self.queued_faults.get_mut(&kind)?;
        let fault = queue.pop_front();
        if queue.is_empty() {
            self.queued_faults.remove(&kind);
        }
        fault
    }
}

/// Whether `account` exists and its key signed the transaction.
fn account_signed(inner: &LedgerInner, account: &AccountId, signers: &[PublicKey]) -> std::result::Result<(), ReceiptStatus> {
    let entry = inner.accounts.get(account).ok_or(ReceiptStatus::InvalidAccountId)?;
    if signers.contains(&entry.key) {
        Ok(())
    } else {
        Err(ReceiptStatus::InvalidSignature)
    }
}

fn associated(inner: &LedgerInner, account: &AccountId, token: &TokenId) -> std::result::Result<(), ReceiptStatus> {
    let entry = inner.accounts.get(account).ok_or(ReceiptStatus::InvalidAccountId)?;
    if entry.tokens.contains_key(token) {
        Ok(())
    } else {
        Err(ReceiptStatus::TokenNotAssociatedToAccount)
    }
}

#[derive(Clone)]
pub struct InMemoryLedger {
    inner: Arc<Mutex<LedgerInner>>,
    fee: u64,
    max_metadata_bytes: usize,
    latency: Option<Duration>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(LedgerInner::new())),
            fee: DEFAULT_TRANSACTION_FEE,
            max_metadata_bytes: DEFAULT_MAX_METADATA_BYTES,
            latency: None,
        }
    }

    pub fn with_max_metadata_bytes(mut self, max: usize) -> Self {
        self.max_metadata_bytes = max;
        self
    }

    /// Delay applied before every submission is processed.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn fee(&self) -> u64 {
        self.fee
    }

    /// Opens a new account; the ledger assigns its id.
    pub fn create_account(&self, key: PublicKey, initial_balance: u64) -> AccountId {
        let mut inner = self.inner.lock();
        let id = AccountId::from_num(inner.next_num());
        inner.accounts.insert(id, AccountEntry { key, balance: initial_balance, tokens: BTreeMap::new() });
        debug!("in-memory ledger account created account={} balance={}", id, initial_balance);
        id
    }

    /// Opens an account under a fixed id, e.g. a configured platform account.
    pub fn create_account_with_id(&self, id: AccountId, key: PublicKey, initial_balance: u64) -> Result<()> {
        let mut inner = self.inner.lock();
        if inner.accounts.contains_key(&id) {
            return Err(LedgerError::Message(format!("account {id} already exists")));
        }
        inner.accounts.insert(id, AccountEntry { key, balance: initial_balance, tokens: BTreeMap::new() });
        Ok(())
    }

    /// Fails the next submission of `kind` with `fault`. Repeated calls queue further faults.
    pub fn fail_next(&self, kind: TransactionKind, fault: InjectedFault) {
        self.inner.lock().queued_faults.entry(kind).or_default().push_back(fault);
    }

    /// Fails every submission paid by `payer` with `status` until cleared.
    pub fn fail_payer(&self, payer: AccountId, status: ReceiptStatus) {
        self.inner.lock().failing_payers.insert(payer, status);
    }

    pub fn clear_faults(&self) {
        let mut inner = self.inner.lock();
        inner.failing_payers.clear();
        inner.queued_faults.clear();
    }

    pub fn submissions(&self) -> Vec<SubmissionRecord> {
        self.inner.lock().submissions.clone()
    }

    pub fn submission_count(&self) -> usize {
        self.inner.lock().submissions.len()
    }

    pub fn submission_count_of(&self, kind: TransactionKind) -> usize {
        self.inner.lock().submissions.iter().filter(|record| record.kind == kind).count()
    }

    /// Submissions plus queries.
    pub fn network_call_count(&self) -> usize {
        let inner = self.inner.lock();
        inner.submissions.len() + inner.query_count
    }

    pub fn nft_owner(&self, token_id: &TokenId, serial: u64) -> Option<AccountId> {
        let inner = self.inner.lock();
        inner.tokens.get(token_id)?.nft_owners.get(&serial).copied()
    }

    pub fn nft_metadata(&self, token_id: &TokenId, serial: u64) -> Option<Vec<u8>> {
        let inner = self.inner.lock();
        inner.tokens.get(token_id)?.nft_metadata.get(&serial).cloned()
    }

    fn process(&self, inner: &mut LedgerInner, tx: &SignedTransaction) -> std::result::Result<TransactionReceipt, InjectedFault> {
        let transaction_ref = tx.id().to_ref();
        let reject = |status: ReceiptStatus| Ok(TransactionReceipt::new(transaction_ref.clone(), status));

        if !tx.body_matches_bytes() {
            return reject(ReceiptStatus::InvalidTransactionBody);
        }
        let signers = tx.verified_signers();
        let payer = tx.payer();
        if let Err(status) = account_signed(inner, &payer, &signers) {
            return reject(status);
        }
        if let Some(fault) = inner.take_fault(tx.kind(), &payer) {
            return match fault {
                InjectedFault::Status(status) => reject(status),
                network => Err(network),
            };
        }
        match inner.accounts.get_mut(&payer) {
            Some(entry) if entry.balance >= self.fee => entry.balance -= self.fee,
            Some(_) => return reject(ReceiptStatus::InsufficientPayerBalance),
            None => return reject(ReceiptStatus::InvalidAccountId),
        }

        let mut receipt = TransactionReceipt::new(transaction_ref, ReceiptStatus::Success);
        let outcome = match &tx.transaction.body {
            TransactionBody::CryptoTransfer { sender, recipient, amount } => {
                Self::crypto_transfer(inner, &signers, sender, recipient, *amount)
            }
            TransactionBody::TokenCreate(params) => {
                Self::token_create(inner, &signers, params).map(|token_id| receipt.token_id = Some(token_id))
            }
            TransactionBody::TokenAssociate { account, token_ids } => Self::token_associate(inner, &signers, account, token_ids),
            TransactionBody::TokenTransfer { token_id, sender, recipient, amount } => {
                Self::token_transfer(inner, &signers, token_id, sender, recipient, *amount)
            }
            TransactionBody::TokenMint { token_id, amount, metadata } => {
                self.token_mint(inner, &signers, token_id, *amount, metadata).map(|serials| receipt.serials = serials)
            }
            TransactionBody::NftTransfer { token_id, serial, sender, recipient } => {
                Self::nft_transfer(inner, &signers, token_id, *serial, sender, recipient)
            }
            TransactionBody::TopicCreate { memo, submit_key } => {
                let topic_id = ChannelId::from_num(inner.next_num());
                inner.topics.insert(topic_id, TopicEntry { memo: memo.clone(), submit_key: submit_key.clone(), messages: Vec::new() });
                receipt.topic_id = Some(topic_id);
                Ok(())
            }
            TransactionBody::TopicMessageSubmit { topic_id, message } => {
                Self::topic_submit(inner, &signers, topic_id, payer, message).map(|seq| receipt.topic_sequence_number = Some(seq))
            }
        };
        if let Err(status) = outcome {
            receipt = TransactionReceipt::new(receipt.transaction_ref, status);
        }
        Ok(receipt)
    }

    fn crypto_transfer(
        inner: &mut LedgerInner,
        signers: &[PublicKey],
        sender: &AccountId,
        recipient: &AccountId,
        amount: u64,
    ) -> std::result::Result<(), ReceiptStatus> {
        account_signed(inner, sender, signers)?;
        if !inner.accounts.contains_key(recipient) {
            return Err(ReceiptStatus::InvalidAccountId);
        }
        let from = inner.accounts.get_mut(sender).ok_or(ReceiptStatus::InvalidAccountId)?;
        if from.balance < amount {
            return Err(ReceiptStatus::InsufficientAccountBalance);
        }
        from.balance -= amount;
        let to = inner.accounts.get_mut(recipient).ok_or(ReceiptStatus::InvalidAccountId)?;
        to.balance = to.balance.saturating_add(amount);
        Ok(())
    }

    fn token_create(inner: &mut LedgerInner, signers: &[PublicKey], params: &TokenCreateParams) -> std::result::Result<TokenId, ReceiptStatus> {
        account_signed(inner, &params.treasury, signers)?;
        let initial_supply = match params.kind {
            TokenKind::Fungible => params.initial_supply,
            TokenKind::NonFungible if params.initial_supply == 0 => 0,
            TokenKind::NonFungible => return Err(ReceiptStatus::InvalidTransactionBody),
        };
        if params.supply_policy.check_total(initial_supply).is_err() {
            return Err(ReceiptStatus::TokenMaxSupplyReached);
        }
        let token_id = TokenId::from_num(inner.next_num());
        inner.tokens.insert(
            token_id,
            TokenEntry {
                name: params.name.clone(),
                symbol: params.symbol.clone(),
                decimals: params.decimals,
                total_supply: initial_supply,
                supply_policy: params.supply_policy,
                kind: params.kind,
                treasury: params.treasury,
                supply_key: params.supply_key.clone(),
                next_serial: 1,
                nft_owners: BTreeMap::new(),
                nft_metadata: BTreeMap::new(),
            },
        );
        if let Some(treasury) = inner.accounts.get_mut(&params.treasury) {
            treasury.tokens.insert(token_id, initial_supply);
        }
        Ok(token_id)
    }

    fn token_associate(
        inner: &mut LedgerInner,
        signers: &[PublicKey],
        account: &AccountId,
        token_ids: &[TokenId],
    ) -> std::result::Result<(), ReceiptStatus> {
        account_signed(inner, account, signers)?;
        if token_ids.iter().any(|token_id| !inner.tokens.contains_key(token_id)) {
            return Err(ReceiptStatus::InvalidTokenId);
        }
        let entry = inner.accounts.get_mut(account).ok_or(ReceiptStatus::InvalidAccountId)?;
        if token_ids.iter().any(|token_id| entry.tokens.contains_key(token_id)) {
            return Err(ReceiptStatus::TokenAlreadyAssociatedToAccount);
        }
        for token_id in token_ids {
            entry.tokens.insert(*token_id, 0);
        }
        Ok(())
    }

    fn token_transfer(
        inner: &mut LedgerInner,
        signers: &[PublicKey],
        token_id: &TokenId,
        sender: &AccountId,
        recipient: &AccountId,
        amount: u64,
    ) -> std::result::Result<(), ReceiptStatus> {
        match inner.tokens.get(token_id) {
            Some(token) if token.kind == TokenKind::Fungible => {}
            Some(_) => return Err(ReceiptStatus::InvalidTransactionBody),
            None => return Err(ReceiptStatus::InvalidTokenId),
        }
        account_signed(inner, sender, signers)?;
        associated(inner, sender, token_id)?;
        associated(inner, recipient, token_id)?;
        let from = inner.accounts.get_mut(sender).ok_or(ReceiptStatus::InvalidAccountId)?;
        let held = from.tokens.get(token_id).copied().unwrap_or(0);
        if held < amount {
            return Err(ReceiptStatus::InsufficientTokenBalance);
        }
        from.tokens.insert(*token_id, held - amount);
        let to = inner.accounts.get_mut(recipient).ok_or(ReceiptStatus::InvalidAccountId)?;
        let entry = to.tokens.entry(*token_id).or_insert(0);
        *entry = entry.saturating_add(amount);
        Ok(())
    }

    fn token_mint(
        &self,
        inner: &mut LedgerInner,
        signers: &[PublicKey],
        token_id: &TokenId,
        amount: u64,
        metadata: &[Vec<u8>],
    ) -> std::result::Result<Vec<u64>, ReceiptStatus> {
        let token = inner.tokens.get(token_id).ok_or(ReceiptStatus::InvalidTokenId)?;
        let supply_key = token.supply_key.as_ref().ok_or(ReceiptStatus::TokenHasNoSupplyKey)?;
        if !signers.contains(supply_key) {
            return Err(ReceiptStatus::InvalidSignature);
        }
        let minted = match token.kind {
            TokenKind::Fungible => amount,
            TokenKind::NonFungible => {
                if metadata.is_empty() {
                    return Err(ReceiptStatus::InvalidTransactionBody);
                }
                if metadata.iter().any(|entry| entry.len() > self.max_metadata_bytes) {
                    return Err(ReceiptStatus::MetadataTooLong);
                }
                metadata.len() as u64
            }
        };
        let new_total = token.total_supply.checked_add(minted).ok_or(ReceiptStatus::TokenMaxSupplyReached)?;
        if token.supply_policy.check_total(new_total).is_err() {
            return Err(ReceiptStatus::TokenMaxSupplyReached);
        }
        let treasury = token.treasury;

        let token = inner.tokens.get_mut(token_id).ok_or(ReceiptStatus::InvalidTokenId)?;
        token.total_supply = new_total;
        let mut serials = Vec::new();
        if token.kind == TokenKind::NonFungible {
            for entry in metadata {
                let serial = token.next_serial;
                token.next_serial += 1;
                token.nft_owners.insert(serial, treasury);
                token.nft_metadata.insert(serial, entry.clone());
                serials.push(serial);
            }
        }
        if let Some(account) = inner.accounts.get_mut(&treasury) {
            let held = account.tokens.entry(*token_id).or_insert(0);
            *held = held.saturating_add(minted);
        }
        Ok(serials)
    }

    fn nft_transfer(
        inner: &mut LedgerInner,
        signers: &[PublicKey],
        token_id: &TokenId,
        serial: u64,
        sender: &AccountId,
        recipient: &AccountId,
    ) -> std::result::Result<(), ReceiptStatus> {
        let token = inner.tokens.get(token_id).ok_or(ReceiptStatus::InvalidTokenId)?;
        if token.kind != TokenKind::NonFungible {
            return Err(ReceiptStatus::InvalidTransactionBody);
        }
        let owner = token.nft_owners.get(&serial).ok_or(ReceiptStatus::InvalidNftId)?;
        if owner != sender {
            return Err(ReceiptStatus::SenderDoesNotOwnNftSerialNo);
        }
        account_signed(inner, sender, signers)?;
        associated(inner, recipient, token_id)?;

        if let Some(token) = inner.tokens.get_mut(token_id) {
            token.nft_owners.insert(serial, *recipient);
        }
        for (account, delta) in [(sender, -1i64), (recipient, 1i64)] {
            if let Some(entry) = inner.accounts.get_mut(account) {
                let held = entry.tokens.entry(*token_id).or_insert(0);
                *held = held.saturating_add_signed(delta);
            }
        }
        Ok(())
    }

    fn topic_submit(
        inner: &mut LedgerInner,
        signers: &[PublicKey],
        topic_id: &ChannelId,
        payer: AccountId,
        message: &[u8],
    ) -> std::result::Result<u64, ReceiptStatus> {
        let topic = inner.topics.get_mut(topic_id).ok_or(ReceiptStatus::InvalidTopicId)?;
        if let Some(submit_key) = &topic.submit_key {
            if !signers.contains(submit_key) {
                return Err(ReceiptStatus::InvalidSignature);
            }
        }
        if message.is_empty() || message.len() > MAX_CHANNEL_MESSAGE_BYTES {
            return Err(ReceiptStatus::MessageSizeTooLarge);
        }
        let sequence_number = topic.messages.len() as u64 + 1;
        topic.messages.push(TopicMessage {
            topic_id: *topic_id,
            sequence_number,
            consensus_timestamp_nanos: now_nanos(),
            payer_account_id: payer,
            contents: message.to_vec(),
        });
        Ok(sequence_number)
    }
}

impl Default for InMemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TransactionSubmitter for InMemoryLedger {
    async fn submit(&self, transaction: SignedTransaction) -> Result<TransactionReceipt> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        let kind = transaction.kind();
        let payer = transaction.payer();
        let mut inner = self.inner.lock();
        let outcome = self.process(&mut inner, &transaction);
        let status = outcome.as_ref().ok().map(|receipt| receipt.status.clone());
        inner.submissions.push(SubmissionRecord { kind, payer, status });
        drop(inner);

        match outcome {
            Ok(receipt) => {
                trace!("in-memory ledger receipt tx={} kind={} status={}", receipt.transaction_ref, kind, receipt.status);
                Ok(receipt)
            }
            Err(InjectedFault::Network(details)) => Err(LedgerError::network(kind.as_str(), details)),
            Err(InjectedFault::Status(status)) => Err(LedgerError::from_receipt_status(kind.as_str(), status)),
        }
    }
}

#[async_trait]
impl LedgerQuery for InMemoryLedger {
    async fn account_balance(&self, account_id: &AccountId) -> Result<AccountBalance> {
        let mut inner = self.inner.lock();
        inner.query_count += 1;
        let entry = inner.accounts.get(account_id).ok_or_else(|| LedgerError::AccountNotFound(account_id.to_string()))?;
        Ok(AccountBalance { account_id: *account_id, native_balance: entry.balance, tokens: entry.tokens.clone() })
    }

    async fn token_info(&self, token_id: &TokenId) -> Result<TokenInfo> {
        let mut inner = self.inner.lock();
        inner.query_count += 1;
        let token = inner.tokens.get(token_id).ok_or_else(|| LedgerError::TokenNotFound(token_id.to_string()))?;
        Ok(TokenInfo {
            token_id: *token_id,
            name: token.name.clone(),
            symbol: token.symbol.clone(),
            decimals: token.decimals,
            total_supply: token.total_supply,
            supply_policy: token.supply_policy,
            kind: token.kind,
            treasury_account_id: token.treasury,
        })
    }

    async fn nft_info(&self, token_id: &TokenId, serial: u64) -> Result<NftInfo> {
        let mut inner = self.inner.lock();
        inner.query_count += 1;
        let not_found = || LedgerError::TokenNotFound(format!("{token_id}/{serial}"));
        let token = inner.tokens.get(token_id).ok_or_else(not_found)?;
        let account_id = token.nft_owners.get(&serial).copied().ok_or_else(not_found)?;
        let metadata = token.nft_metadata.get(&serial).cloned().unwrap_or_default();
        Ok(NftInfo { token_id: *token_id, serial_number: serial, account_id, metadata })
    }

    async fn topic_info(&self, topic_id: &ChannelId) -> Result<TopicInfo> {
        let mut inner = self.inner.lock();
        inner.query_count += 1;
        let topic = inner.topics.get(topic_id).ok_or_else(|| LedgerError::ChannelNotFound(topic_id.to_string()))?;
        Ok(TopicInfo { topic_id: *topic_id, memo: topic.memo.clone() })
    }

    async fn topic_messages(&self, topic_id: &ChannelId, query: TopicMessageQuery) -> Result<Vec<TopicMessage>> {
        let mut inner = self.inner.lock();
        inner.query_count += 1;
        let topic = inner.topics.get(topic_id).ok_or_else(|| LedgerError::ChannelNotFound(topic_id.to_string()))?;
        let since = query.since_sequence.unwrap_or(0);
        let limit = query.limit.unwrap_or(usize::MAX);
        Ok(topic.messages.iter().filter(|message| message.sequence_number >= since).take(limit).cloned().collect())
    }
}
