//! Non-fungible certificate collections, minting and delivery to holders.

use crate::application::fungible::associate_token;
use crate::application::operator::OperatorResolver;
use crate::application::query::NetworkQueryAdapter;
use crate::application::submission::submit_as;
use crate::domain::{validate_metadata_pointer, AssociationStatus, CertificateAsset, CertificateHolding, CertificateState, OperatorContext};
use crate::domain::{SupplyPolicy, TokenDescriptor, TokenKind, TransferOutcome};
use crate::foundation::{AccountId, CallerId, LedgerError, ProtocolStep, Result, TokenId};
use crate::infrastructure::config::FundingConfig;
use crate::infrastructure::ledger::{TokenCreateParams, TransactionBody, TransactionSubmitter};
use log::{debug, info, warn};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::time::Instant;

pub struct CertificateService {
    submitter: Arc<dyn TransactionSubmitter>,
    queries: Arc<NetworkQueryAdapter>,
    operators: Arc<OperatorResolver>,
    max_metadata_bytes: usize,
    funding: FundingConfig,
    funding_slots: Mutex<HashMap<AccountId, FundingSlot>>,
}

/// Last top-up of one account. Held across the balance read and the top-up so concurrent
/// deliveries to the same holder fund it at most once.
type FundingSlot = Arc<tokio::sync::Mutex<Option<Instant>>>;

impl CertificateService {
    pub fn new(
        submitter: Arc<dyn TransactionSubmitter>,
        queries: Arc<NetworkQueryAdapter>,
        operators: Arc<OperatorResolver>,
        max_metadata_bytes: usize,
        funding: FundingConfig,
    ) -> Self {
        Self { submitter, queries, operators, max_metadata_bytes, funding, funding_slots: Mutex::new(HashMap::new()) }
    }

    pub fn max_metadata_bytes(&self) -> usize {
        self.max_metadata_bytes
    }

    /// One infinite-supply non-fungible collection; the platform holds treasury and supply key.
    pub async fn create_collection(&self, name: &str, symbol_prefix: &str) -> Result<TokenDescriptor> {
        if name.trim().is_empty() || symbol_prefix.trim().is_empty() {
            return Err(LedgerError::Message("collection name and symbol prefix must not be empty".to_string()));
        }
        let platform = self.operators.platform();
        let params = TokenCreateParams {
            name: name.to_string(),
            symbol: symbol_prefix.to_string(),
            decimals: 0,
            initial_supply: 0,
            supply_policy: SupplyPolicy::Infinite,
            kind: TokenKind::NonFungible,
            treasury: platform.account_id,
            supply_key: Some(platform.public_key()),
        };
        let receipt = submit_as(self.submitter.as_ref(), &platform, &[], TransactionBody::TokenCreate(params))
            .await
            .map_err(|err| err.at_step(ProtocolStep::TokenCreation))?;
        let token_id = receipt
            .token_id
            .ok_or_else(|| LedgerError::Message("token create receipt carried no token id".to_string()).at_step(ProtocolStep::TokenCreation))?;
        info!("certificate collection created token={} symbol={} treasury={}", token_id, symbol_prefix, platform.account_id);
        Ok(TokenDescriptor {
            token_id,
            symbol: symbol_prefix.to_string(),
            name: name.to_string(),
            decimals: 0,
            supply_policy: SupplyPolicy::Infinite,
            treasury_account_id: platform.account_id,
            kind: TokenKind::NonFungible,
        })
    }

    /// Mints one certificate into the treasury. The pointer is validated before anything is sent.
    pub async fn mint(&self, collection: &TokenId, metadata_pointer: &[u8]) -> Result<CertificateAsset> {
        let mut assets = self.mint_batch(collection, &[metadata_pointer.to_vec()]).await?;
        assets.pop().ok_or_else(|| LedgerError::Message("mint receipt carried no serial".to_string()).at_step(ProtocolStep::Mint))
    }

    /// Mints several certificates in one transaction; every pointer is validated first.
    pub async fn mint_batch(&self, collection: &TokenId, metadata_pointers: &[Vec<u8>]) -> Result<Vec<CertificateAsset>> {
        if metadata_pointers.is_empty() {
            return Err(LedgerError::Message("nothing to mint".to_string()));
        }
        for pointer in metadata_pointers {
            validate_metadata_pointer(pointer, self.max_metadata_bytes)?;
        }

        let platform = self.operators.platform();
        let body = TransactionBody::TokenMint { token_id: *collection, amount: 0, metadata: metadata_pointers.to_vec() };
        let receipt =
            submit_as(self.submitter.as_ref(), &platform, &[], body).await.map_err(|err| err.at_step(ProtocolStep::Mint))?;
        if receipt.serials.len() != metadata_pointers.len() {
            return Err(LedgerError::Message(format!(
                "mint receipt carried {} serials for {} pointers",
                receipt.serials.len(),
                metadata_pointers.len()
            ))
            .at_step(ProtocolStep::Mint));
        }
        let assets: Vec<CertificateAsset> = receipt
            .serials
            .iter()
            .zip(metadata_pointers)
            .map(|(serial, pointer)| CertificateAsset { token_id: *collection, serial_number: *serial, metadata_pointer: pointer.clone() })
            .collect();
        info!("certificates minted token={} serials={:?} tx={}", collection, receipt.serials, receipt.transaction_ref);
        Ok(assets)
    }

    /// Delivers `asset` to the caller's own account; the caller must have a delegated credential on record.
    pub async fn transfer_to_holder(&self, asset: &CertificateAsset, holder_id: &CallerId) -> Result<TransferOutcome> {
        let holder = self.operators.resolve_delegated(holder_id).await.map_err(|err| err.at_step(ProtocolStep::HolderResolution))?;
        self.transfer_to_account(asset, &holder).await
    }

    /// Fund, associate, transfer.
    ///
    /// Funding and association failures are returned as errors tagged with their step. A failed final
    /// transfer is a valid outcome: `success == false`, the asset stays with the treasury and nothing
    /// done by the earlier steps is undone. An asset the holder already owns is reported as delivered
    /// without submitting anything.
    pub async fn transfer_to_account(&self, asset: &CertificateAsset, holder: &OperatorContext) -> Result<TransferOutcome> {
        let platform = self.operators.platform();
        let owner = self
            .queries
            .get_nft_owner(&asset.token_id, asset.serial_number)
            .await
            .map_err(|err| err.at_step(ProtocolStep::Transfer))?;
        if owner == holder.account_id {
            info!("certificate already delivered token={} serial={} holder={}", asset.token_id, asset.serial_number, holder.account_id);
            return Ok(TransferOutcome {
                asset: asset.clone(),
                success: true,
                holding: CertificateHolding::Holder { account_id: holder.account_id },
                state: CertificateState::HolderHeld { holder: holder.account_id },
                funded: false,
                association: AssociationStatus::AlreadyAssociated,
                transaction_ref: None,
                reason: None,
            });
        }
        if owner != platform.account_id {
            return Err(LedgerError::Message(format!(
                "certificate {}/{} is held by {}, not the treasury {}",
                asset.token_id, asset.serial_number, owner, platform.account_id
            ))
            .at_step(ProtocolStep::Transfer));
        }

        let funded = self.ensure_funded(&holder.account_id).await.map_err(|err| err.at_step(ProtocolStep::Funding))?;
        let association = associate_token(self.submitter.as_ref(), holder, &asset.token_id)
            .await
            .map_err(|err| err.at_step(ProtocolStep::Association))?;

        let body = TransactionBody::NftTransfer {
            token_id: asset.token_id,
            serial: asset.serial_number,
            sender: platform.account_id,
            recipient: holder.account_id,
        };
        match submit_as(self.submitter.as_ref(), &platform, &[], body).await {
            Ok(receipt) => {
                let state = CertificateState::TreasuryHeld.transition(CertificateState::HolderHeld { holder: holder.account_id })?;
                info!(
                    "certificate delivered token={} serial={} holder={} funded={} tx={}",
                    asset.token_id, asset.serial_number, holder.account_id, funded, receipt.transaction_ref
                );
                Ok(TransferOutcome {
                    asset: asset.clone(),
                    success: true,
                    holding: CertificateHolding::Holder { account_id: holder.account_id },
                    state,
                    funded,
                    association,
                    transaction_ref: Some(receipt.transaction_ref),
                    reason: None,
                })
            }
            Err(err) => {
                let reason = err.to_string();
                warn!(
                    "certificate transfer failed; asset stays with treasury token={} serial={} holder={} treasury={} error={}",
                    asset.token_id, asset.serial_number, holder.account_id, platform.account_id, reason
                );
                let state = CertificateState::TreasuryHeld.transition(CertificateState::TransferFailed { reason: reason.clone() })?;
                Ok(TransferOutcome {
                    asset: asset.clone(),
                    success: false,
                    holding: CertificateHolding::Treasury { account_id: platform.account_id },
                    state,
                    funded,
                    association,
                    transaction_ref: None,
                    reason: Some(reason),
                })
            }
        }
    }

    /// Tops up `account` from the platform when it is below the operational minimum. Returns whether it did.
    ///
    /// At most one top-up per account per cooldown window; a cooldown of zero disables the limit.
    async fn ensure_funded(&self, account: &AccountId) -> Result<bool> {
        let slot = self.funding_slots.lock().entry(*account).or_default().clone();
        let mut last_top_up = slot.lock().await;

        let balance = self.queries.get_balance(account).await?;
        if balance.has_sufficient_balance {
            debug!("holder balance sufficient account={} balance={}", account, balance.native_balance);
            return Ok(false);
        }

        let cooldown = self.funding.cooldown();
        if !cooldown.is_zero() {
            if let Some(last) = *last_top_up {
                let elapsed = last.elapsed();
                if elapsed < cooldown {
                    let retry_after = cooldown - elapsed;
                    warn!("holder top-up rate limited account={} balance={} retry_after_ms={}", account, balance.native_balance, retry_after.as_millis());
                    return Err(LedgerError::FundingRateLimited {
                        account: account.to_string(),
                        retry_after_secs: retry_after.as_secs().max(1),
                    });
                }
            }
        }

        let platform = self.operators.platform();
        let body = TransactionBody::CryptoTransfer { sender: platform.account_id, recipient: *account, amount: self.funding.top_up_amount };
        let receipt = submit_as(self.submitter.as_ref(), &platform, &[], body).await?;
        *last_top_up = Some(Instant::now());
        info!(
            "holder funded account={} previous_balance={} top_up={} tx={}",
            account, balance.native_balance, self.funding.top_up_amount, receipt.transaction_ref
        );
        Ok(true)
    }
}
