//! Deadline and cancellation bounds for collaborator calls

use crate::error::{Error, Result};
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Run a collaborator call bounded by a timeout and the turn's cancellation token
///
/// Cancellation wins over completion when both are ready. A timeout surfaces as
/// a collaborator timeout so callers can tell it apart from cancellation.
pub async fn bounded<T, F>(cancel: &CancellationToken, timeout: Duration, call: F) -> Result<T>
where
    F: Future<Output = parley_inference::Result<T>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(Error::Cancelled),
        outcome = tokio::time::timeout(timeout, call) => match outcome {
            Ok(result) => result.map_err(Error::from),
            Err(_) => Err(Error::Collaborator(parley_inference::Error::Timeout(
                timeout.as_millis() as u64,
            ))),
        },
    }
}
