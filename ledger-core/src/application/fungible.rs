//! Fungible token issuance, association and transfers.

use crate::application::distribution::{DistributionCoordinator, RewardTransfer};
use crate::application::operator::OperatorResolver;
use crate::application::query::NetworkQueryAdapter;
use crate::application::submission::submit_as;
use crate::domain::{AssociationStatus, CreateTokenRequest, DistributionJob, DistributionReport, OperatorContext, Recipient, RewardKind};
use crate::domain::{TokenDescriptor, TokenKind};
use crate::foundation::{AccountId, LedgerError, ProtocolStep, Result, TokenId, TransactionRef};
use crate::infrastructure::keys::{SecretBytes, SigningKey};
use crate::infrastructure::ledger::{TokenCreateParams, TransactionBody, TransactionSubmitter};
use async_trait::async_trait;
use log::{debug, info};
use std::sync::Arc;

/// Associates `token_id` with the operator's own account, paid and signed by that account.
///
/// The ledger's "already associated" rejection is reported as [`AssociationStatus::AlreadyAssociated`].
pub(crate) async fn associate_token(
    submitter: &dyn TransactionSubmitter,
    account: &OperatorContext,
    token_id: &TokenId,
) -> Result<AssociationStatus> {
    let body = TransactionBody::TokenAssociate { account: account.account_id, token_ids: vec![*token_id] };
    match submit_as(submitter, account, &[], body).await {
        Ok(_) => {
            info!("token associated account={} token={}", account.account_id, token_id);
            Ok(AssociationStatus::Associated)
        }
        Err(err) if matches!(err.root_cause(), LedgerError::AlreadyAssociated { .. }) => {
            debug!("token already associated account={} token={}", account.account_id, token_id);
            Ok(AssociationStatus::AlreadyAssociated)
        }
        Err(err) => Err(err),
    }
}

pub struct FungibleTokenService {
    submitter: Arc<dyn TransactionSubmitter>,
    queries: Arc<NetworkQueryAdapter>,
    operators: Arc<OperatorResolver>,
    distribution: DistributionCoordinator,
}

impl FungibleTokenService {
    pub fn new(
        submitter: Arc<dyn TransactionSubmitter>,
        queries: Arc<NetworkQueryAdapter>,
        operators: Arc<OperatorResolver>,
        distribution: DistributionCoordinator,
    ) -> Self {
        Self { submitter, queries, operators, distribution }
    }

    /// Issues a fungible token with the platform as treasury and supply key. The initial supply lands in the treasury.
    pub async fn create_token(&self, request: &CreateTokenRequest) -> Result<TokenDescriptor> {
        request.validate()?;
        let platform = self.operators.platform();
        let params = TokenCreateParams {
            name: request.name.clone(),
            symbol: request.symbol.clone(),
            decimals: request.decimals,
            initial_supply: request.initial_supply,
            supply_policy: request.supply_policy,
            kind: TokenKind::Fungible,
            treasury: platform.account_id,
            supply_key: Some(platform.public_key()),
        };
        let receipt = submit_as(self.submitter.as_ref(), &platform, &[], TransactionBody::TokenCreate(params))
            .await
            .map_err(|err| err.at_step(ProtocolStep::TokenCreation))?;
        let token_id = receipt
            .token_id
            .ok_or_else(|| LedgerError::Message("token create receipt carried no token id".to_string()).at_step(ProtocolStep::TokenCreation))?;
        info!(
            "fungible token created token={} symbol={} initial_supply={} policy={:?} treasury={}",
            token_id, request.symbol, request.initial_supply, request.supply_policy, platform.account_id
        );
        Ok(TokenDescriptor {
            token_id,
            symbol: request.symbol.clone(),
            name: request.name.clone(),
            decimals: request.decimals,
            supply_policy: request.supply_policy,
            treasury_account_id: platform.account_id,
            kind: TokenKind::Fungible,
        })
    }

    /// Associates using a stored credential in either supported encoding.
    pub async fn associate(&self, account_id: AccountId, credential: &SecretBytes, token_id: &TokenId) -> Result<AssociationStatus> {
        let account = self.operators.from_credential(account_id, credential)?;
        associate_token(self.submitter.as_ref(), &account, token_id).await
    }

    pub async fn associate_with_key(&self, account_id: AccountId, signing_key: &SigningKey, token_id: &TokenId) -> Result<AssociationStatus> {
        let account = OperatorContext::delegated(account_id, signing_key.clone());
        associate_token(self.submitter.as_ref(), &account, token_id).await
    }

    fn sender_context(&self, account_id: AccountId, signing_key: &SigningKey) -> OperatorContext {
        if self.operators.platform_account_id() == account_id {
            OperatorContext::platform(account_id, signing_key.clone())
        } else {
            OperatorContext::delegated(account_id, signing_key.clone())
        }
    }

    /// Moves `amount` smallest units from `from` to `to`, paid and signed by the sender.
    pub async fn transfer(
        &self,
        token_id: &TokenId,
        from: AccountId,
        to: AccountId,
        amount: u64,
        signing_key: &SigningKey,
    ) -> Result<TransactionRef> {
        if amount == 0 {
            return Err(LedgerError::InvalidAmount("transfer amount must be positive".to_string()));
        }
        let sender = self.sender_context(from, signing_key);
        let body = TransactionBody::TokenTransfer { token_id: *token_id, sender: from, recipient: to, amount };
        let receipt = submit_as(self.submitter.as_ref(), &sender, &[], body).await?;
        debug!("token transfer token={} from={} to={} amount={} tx={}", token_id, from, to, amount, receipt.transaction_ref);
        Ok(receipt.transaction_ref)
    }

    /// Native-currency counterpart of [`Self::transfer`].
    pub async fn transfer_native(&self, from: AccountId, to: AccountId, amount: u64, signing_key: &SigningKey) -> Result<TransactionRef> {
        if amount == 0 {
            return Err(LedgerError::InvalidAmount("transfer amount must be positive".to_string()));
        }
        let sender = self.sender_context(from, signing_key);
        let body = TransactionBody::CryptoTransfer { sender: from, recipient: to, amount };
        let receipt = submit_as(self.submitter.as_ref(), &sender, &[], body).await?;
        debug!("native transfer from={} to={} amount={} tx={}", from, to, amount, receipt.transaction_ref);
        Ok(receipt.transaction_ref)
    }

    /// Mints additional supply into the treasury and returns the new total supply.
    ///
    /// A finite-supply cap is checked locally before submission.
    pub async fn mint_supply(&self, token_id: &TokenId, amount: u64) -> Result<u64> {
        if amount == 0 {
            return Err(LedgerError::InvalidAmount("mint amount must be positive".to_string()));
        }
        let info = self.queries.get_token_info(token_id).await?;
        if info.kind != TokenKind::Fungible {
            return Err(LedgerError::Message(format!("token {token_id} is not fungible")));
        }
        let requested = info.total_supply.checked_add(amount).ok_or_else(|| LedgerError::SupplyExceeded {
            requested: u64::MAX,
            max: info.supply_policy.max_supply().unwrap_or(u64::MAX),
        })?;
        info.supply_policy.check_total(requested)?;

        let platform = self.operators.platform();
        let body = TransactionBody::TokenMint { token_id: *token_id, amount, metadata: Vec::new() };
        submit_as(self.submitter.as_ref(), &platform, &[], body).await.map_err(|err| err.at_step(ProtocolStep::Mint))?;
        info!("fungible supply minted token={} amount={} total_supply={}", token_id, amount, requested);
        Ok(requested)
    }

    /// Pays every recipient from the platform account; see [`DistributionCoordinator::distribute`].
    pub async fn batch_transfer(&self, job: &DistributionJob) -> DistributionReport {
        self.distribution.distribute(job, self).await
    }
}

#[async_trait]
impl RewardTransfer for FungibleTokenService {
    async fn pay(&self, reward_kind: RewardKind, token_id: Option<TokenId>, recipient: &Recipient) -> Result<TransactionRef> {
        let platform = self.operators.platform();
        match reward_kind {
            RewardKind::Token => {
                let token_id = token_id.ok_or_else(|| LedgerError::Message("token distribution without a token id".to_string()))?;
                self.transfer(&token_id, platform.account_id, recipient.account_id, recipient.amount, &platform.signing_key).await
            }
            RewardKind::Native => {
                self.transfer_native(platform.account_id, recipient.account_id, recipient.amount, &platform.signing_key).await
            }
        }
    }
}
