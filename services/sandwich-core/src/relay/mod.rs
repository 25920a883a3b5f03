//! Relay Submitter: chain-specific bundle/tip transport with a shared retry
//! policy, generalizing a searcher-relay client shape to the three relay
//! families this engine actually talks to.

pub mod bloxroute;
pub mod flashbots;
pub mod jito;

use crate::errors::SubmitError;
use rand::Rng;
use sandwich_config::service::retry;
use sandwich_types::{Bundle, RelayName, RelaySubmission};
use std::future::Future;
use std::time::Duration;

/// One relay transport. Each submission attempt is independent; [`submit`]
/// layers the shared retry/backoff policy on top.
#[async_trait::async_trait]
pub trait RelayTransport: Send + Sync {
    fn relay_name(&self) -> RelayName;

    /// A single submission attempt. Transient failures (5xx, timeout, rate
    /// limit) should return [`SubmitError::Transient`]; policy rejections
    /// (bundle malformed, relay blacklisted the sender) must return
    /// [`SubmitError::Rejected`] so the retry loop treats them as terminal.
    async fn try_submit(&self, bundle: &Bundle) -> Result<RelaySubmissionAttempt, SubmitError>;
}

pub struct RelaySubmissionAttempt {
    pub request_id: String,
}

/// Exponential backoff with jitter (base 100ms, factor 2, ±25% jitter,
/// cap `MAX_RETRY_ATTEMPTS`). Terminal ([`SubmitError::Rejected`]) errors
/// abort immediately without retrying.
pub async fn submit_with_retry(
    transport: &dyn RelayTransport,
    bundle: &Bundle,
    timeout: Duration,
    mut on_attempt: impl FnMut(u32, Option<&str>),
) -> Result<RelaySubmission, SubmitError> {
    let mut backoff_ms = retry::BASE_BACKOFF_MS;
    let mut last_error = String::new();

    for attempt in 1..=retry::MAX_RETRY_ATTEMPTS {
        let started = std::time::Instant::now();
        let result = tokio::time::timeout(timeout, transport.try_submit(bundle)).await;

        match result {
            Ok(Ok(ok)) => {
                on_attempt(attempt, None);
                return Ok(RelaySubmission {
                    id: sandwich_types::SubmissionId::new(),
                    bundle_id: bundle.id,
                    relay_name: transport.relay_name(),
                    request_id: ok.request_id,
                    attempt,
                    latency_ms: started.elapsed().as_millis() as u64,
                    error: None,
                });
            }
            Ok(Err(SubmitError::Rejected(msg))) => {
                on_attempt(attempt, Some(&msg));
                return Err(SubmitError::Rejected(msg));
            }
            Ok(Err(e)) => {
                last_error = e.to_string();
                on_attempt(attempt, Some(&last_error));
            }
            Err(_) => {
                last_error = format!("submission timed out after {}ms", timeout.as_millis());
                on_attempt(attempt, Some(&last_error));
            }
        }

        if attempt < retry::MAX_RETRY_ATTEMPTS {
            let jitter = rand::thread_rng().gen_range(-retry::JITTER_FRACTION..=retry::JITTER_FRACTION);
            let sleep_ms = (backoff_ms as f64 * (1.0 + jitter)).max(0.0) as u64;
            tokio::time::sleep(Duration::from_millis(sleep_ms)).await;
            backoff_ms = ((backoff_ms as f64) * retry::BACKOFF_FACTOR as f64) as u64;
        }
    }

    Err(SubmitError::RetriesExhausted {
        attempts: retry::MAX_RETRY_ATTEMPTS,
    })
}

/// Races several transports concurrently for the same bundle; first success
/// wins. Duplicate landings across relays are left for the monitor/metrics
/// layer to dedup by `bundle_id`.
pub async fn submit_multi_relay(
    transports: &[Box<dyn RelayTransport>],
    bundle: &Bundle,
    timeout: Duration,
) -> Result<RelaySubmission, SubmitError> {
    if transports.is_empty() {
        return Err(SubmitError::Rejected("no relay transports configured".to_string()));
    }

    let futures = transports
        .iter()
        .map(|t| submit_with_retry(t.as_ref(), bundle, timeout, |_, _| {}));
    let results = futures_util_select_ok(futures).await;
    results
}

/// Minimal "first Ok wins, else last Err" combinator over a fixed set of
/// futures — avoids pulling in `futures::future::select_ok`'s `Unpin` bound
/// mismatch for boxed async-trait futures.
async fn futures_util_select_ok<I, F, T>(iter: I) -> Result<T, SubmitError>
where
    I: IntoIterator<Item = F>,
    F: Future<Output = Result<T, SubmitError>>,
{
    let mut futs: Vec<_> = iter.into_iter().map(Box::pin).collect();
    let mut last_error = SubmitError::Rejected("no relays attempted".to_string());
    while !futs.is_empty() {
        let (result, _index, remaining) = futures::future::select_all(futs).await;
        match result {
            Ok(value) => return Ok(value),
            Err(e) => {
                last_error = e;
                futs = remaining;
            }
        }
    }
    Err(last_error)
}
