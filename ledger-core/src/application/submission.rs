use crate::domain::OperatorContext;
use crate::foundation::Result;
use crate::infrastructure::keys::SigningKey;
use crate::infrastructure::ledger::{Transaction, TransactionBody, TransactionReceipt, TransactionSubmitter};
use log::debug;

/// Builds, signs and submits `body` paid by `payer`; a non-success receipt becomes its typed error.
///
/// `co_signers` adds keys beyond the payer's (e.g. a treasury or supply key).
pub(crate) async fn submit_as(
    submitter: &dyn TransactionSubmitter,
    payer: &OperatorContext,
    co_signers: &[&SigningKey],
    body: TransactionBody,
) -> Result<TransactionReceipt> {
    let kind = body.kind();
    let mut keys = Vec::with_capacity(co_signers.len() + 1);
    keys.push(&payer.signing_key);
    keys.extend_from_slice(co_signers);
    let signed = Transaction::new(payer.account_id, body).sign(&keys)?;
    let tx_id = signed.id();
    debug!("submitting transaction kind={} tx={} operator={} delegated={}", kind, tx_id, payer.account_id, payer.is_delegated);
    let receipt = submitter.submit(signed).await?;
    debug!("transaction receipt kind={} tx={} status={}", kind, tx_id, receipt.status);
    receipt.into_result(kind.as_str())
}
