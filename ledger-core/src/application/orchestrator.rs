//! Library facade over the orchestrated ledger protocols.

use crate::application::audit_channel::AuditChannel;
use crate::application::certificate::CertificateService;
use crate::application::distribution::DistributionCoordinator;
use crate::application::fungible::FungibleTokenService;
use crate::application::operator::OperatorResolver;
use crate::application::query::NetworkQueryAdapter;
use crate::domain::{AppendReceipt, CertificateAsset, CreateTokenRequest, DistributionJob, DistributionReport, OperatorContext};
use crate::domain::{TokenDescriptor, TransferOutcome};
use crate::foundation::{AccountId, CallerId, LedgerError, Result, TokenId, TransactionRef};
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::identity::CallerDirectory;
use crate::infrastructure::keys::{KeyMaterialResolver, SigningKey};
use crate::infrastructure::ledger::{LedgerQuery, MirrorNodeClient, TransactionSubmitter};
use log::info;
use serde_json::{Map, Value};
use std::sync::Arc;

pub struct LedgerOrchestrator {
    operators: Arc<OperatorResolver>,
    queries: Arc<NetworkQueryAdapter>,
    audit: AuditChannel,
    fungible: FungibleTokenService,
    certificates: CertificateService,
}

impl LedgerOrchestrator {
    /// Validates `config` and resolves the platform credential once, through the same parser chain as caller credentials.
    pub fn from_config(
        config: &AppConfig,
        submitter: Arc<dyn TransactionSubmitter>,
        query: Arc<dyn LedgerQuery>,
        directory: Arc<dyn CallerDirectory>,
    ) -> Result<Self> {
        config.validate().map_err(|errors| LedgerError::ConfigError(format!("validation failed: {}", errors.join("; "))))?;
        let keys = KeyMaterialResolver::new();
        let account_id = config.platform_account_id()?;
        let signing_key = keys.resolve_secret(&config.platform_credential()?)?;
        Self::with_platform(config, OperatorContext::platform(account_id, signing_key), submitter, query, directory, keys)
    }

    /// [`Self::from_config`] with reads served by the mirror node named in `config.network`.
    pub fn with_mirror_node(
        config: &AppConfig,
        submitter: Arc<dyn TransactionSubmitter>,
        directory: Arc<dyn CallerDirectory>,
    ) -> Result<Self> {
        let network = &config.network;
        let mirror = MirrorNodeClient::new(network.mirror_url.clone(), network.request_timeout(), network.circuit_breaker)?;
        Self::from_config(config, submitter, Arc::new(mirror), directory)
    }

    /// Wires every service around an already resolved platform operator.
    pub fn with_platform(
        config: &AppConfig,
        platform: OperatorContext,
        submitter: Arc<dyn TransactionSubmitter>,
        query: Arc<dyn LedgerQuery>,
        directory: Arc<dyn CallerDirectory>,
        keys: KeyMaterialResolver,
    ) -> Result<Self> {
        let preconfigured_channel = config.audit_channel_id()?;
        info!(
            "ledger orchestrator starting platform_account={} scheme={} audit_channel={:?} key_formats={:?}",
            platform.account_id,
            platform.signing_key.scheme(),
            preconfigured_channel,
            keys.formats()
        );
        let operators = Arc::new(OperatorResolver::new(platform, directory, keys));
        let queries = Arc::new(NetworkQueryAdapter::new(query.clone(), config.funding.min_operational_balance, &config.query));
        let audit = AuditChannel::new(submitter.clone(), query, operators.clone(), preconfigured_channel, config.audit.memo.clone());
        let fungible = FungibleTokenService::new(
            submitter.clone(),
            queries.clone(),
            operators.clone(),
            DistributionCoordinator::from_config(&config.distribution),
        );
        let certificates = CertificateService::new(
            submitter,
            queries.clone(),
            operators.clone(),
            config.certificates.max_metadata_bytes,
            config.funding.clone(),
        );
        Ok(Self { operators, queries, audit, fungible, certificates })
    }

    pub fn operators(&self) -> &OperatorResolver {
        &self.operators
    }

    pub fn queries(&self) -> &NetworkQueryAdapter {
        &self.queries
    }

    pub fn audit(&self) -> &AuditChannel {
        &self.audit
    }

    pub fn fungible(&self) -> &FungibleTokenService {
        &self.fungible
    }

    pub fn certificates(&self) -> &CertificateService {
        &self.certificates
    }

    pub async fn append(&self, caller_id: &CallerId, event_type: &str, subject_id: &str, metadata: Map<String, Value>) -> Result<AppendReceipt> {
        self.audit.append(caller_id, event_type, subject_id, metadata).await
    }

    pub async fn create_fungible_token(&self, request: &CreateTokenRequest) -> Result<TokenDescriptor> {
        self.fungible.create_token(request).await
    }

    pub async fn transfer_fungible(
        &self,
        token_id: &TokenId,
        from: AccountId,
        to: AccountId,
        amount: u64,
        signing_key: &SigningKey,
    ) -> Result<TransactionRef> {
        self.fungible.transfer(token_id, from, to, amount, signing_key).await
    }

    pub async fn distribute_batch(&self, job: &DistributionJob) -> DistributionReport {
        self.fungible.batch_transfer(job).await
    }

    pub async fn mint_certificate(&self, collection: &TokenId, metadata_pointer: &[u8]) -> Result<CertificateAsset> {
        self.certificates.mint(collection, metadata_pointer).await
    }

    pub async fn transfer_certificate_to_holder(&self, asset: &CertificateAsset, holder_id: &CallerId) -> Result<TransferOutcome> {
        self.certificates.transfer_to_holder(asset, holder_id).await
    }
}
