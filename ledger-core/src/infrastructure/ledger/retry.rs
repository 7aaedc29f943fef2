use crate::foundation::LedgerError;
use log::debug;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

/// Retries with a fixed delay, giving up immediately on errors that are not transient.
pub async fn retry_transient<F, Fut, T>(attempts: usize, delay: Duration, op: F) -> Result<T, LedgerError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, LedgerError>>,
{
    retry_when(attempts, delay, LedgerError::is_transient, op).await
}

async fn retry_when<F, Fut, T, P>(mut attempts: usize, delay: Duration, should_retry: P, mut op: F) -> Result<T, LedgerError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, LedgerError>>,
    P: Fn(&LedgerError) -> bool,
{
    let mut last_err = None;
    while attempts > 0 {
        match op().await {
            Ok(v) => return Ok(v),
            Err(err) => {
                attempts -= 1;
                if attempts == 0 || !should_retry(&err) {
                    return Err(err);
                }
                debug!("retrying after error remaining_attempts={} delay_ms={} error={}", attempts, delay.as_millis(), err);
                last_err = Some(err);
                sleep(delay).await;
            }
        }
    }
    Err(last_err.unwrap_or_else(|| LedgerError::Message("retry exhausted".to_string())))
}
