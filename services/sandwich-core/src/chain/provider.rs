//! Weighted, health-scored provider list shared by every chain adapter.
//! Generalizes `flash_arbitrage::executor`'s primary/backup `Provider<Http>`
//! pattern (sequential failover under a per-call timeout) to an arbitrary
//! number of ranked providers with a cool-down for rate-limited entries.

use crate::errors::ChainError;
use sandwich_network::time::fast_timestamp_ns;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;
use tracing::{debug, warn};

pub const DEFAULT_MAX_FAILOVER_ATTEMPTS: usize = 3;
pub const HEALTH_PROBE_INTERVAL: Duration = Duration::from_secs(10);
const DEGRADED_COOLDOWN_NS: u64 = 30_000_000_000; // 30s

/// One RPC/WS endpoint and its rolling health state.
pub struct ProviderEntry {
    pub url: String,
    pub cost_weight: u32,
    latency_ema_ns: AtomicU64,
    healthy: AtomicBool,
    degraded_until_ns: AtomicU64,
}

impl ProviderEntry {
    pub fn new(url: impl Into<String>, cost_weight: u32) -> Self {
        Self {
            url: url.into(),
            cost_weight,
            latency_ema_ns: AtomicU64::new(0),
            healthy: AtomicBool::new(true),
            degraded_until_ns: AtomicU64::new(0),
        }
    }

    pub fn is_available(&self) -> bool {
        self.healthy.load(Ordering::Relaxed) && fast_timestamp_ns() >= self.degraded_until_ns.load(Ordering::Relaxed)
    }

    fn record_latency(&self, latency_ns: u64) {
        let prev = self.latency_ema_ns.load(Ordering::Relaxed);
        let ema = if prev == 0 {
            latency_ns
        } else {
            (prev * 4 + latency_ns) / 5
        };
        self.latency_ema_ns.store(ema, Ordering::Relaxed);
    }

    fn mark_degraded(&self) {
        self.degraded_until_ns
            .store(fast_timestamp_ns() + DEGRADED_COOLDOWN_NS, Ordering::Relaxed);
    }

    /// Called by the periodic health probe; clears the cool-down so the
    /// provider re-enters rotation.
    pub fn reset(&self) {
        self.healthy.store(true, Ordering::Relaxed);
        self.degraded_until_ns.store(0, Ordering::Relaxed);
    }
}

/// A ranked list of providers for one chain, offering per-call failover.
pub struct ProviderPool {
    chain: sandwich_types::ChainId,
    providers: Vec<ProviderEntry>,
    call_timeout: Duration,
    max_attempts: usize,
}

impl ProviderPool {
    pub fn new(
        chain: sandwich_types::ChainId,
        urls: Vec<String>,
        call_timeout: Duration,
    ) -> Self {
        let providers = urls
            .into_iter()
            .enumerate()
            .map(|(i, url)| ProviderEntry::new(url, i as u32))
            .collect();
        Self {
            chain,
            providers,
            call_timeout,
            max_attempts: DEFAULT_MAX_FAILOVER_ATTEMPTS,
        }
    }

    /// Providers ordered healthiest-first (lowest latency EMA among the
    /// currently available ones), capped at `max_attempts`.
    fn ranked_available(&self) -> Vec<&ProviderEntry> {
        let mut available: Vec<&ProviderEntry> = self.providers.iter().filter(|p| p.is_available()).collect();
        available.sort_by_key(|p| p.latency_ema_ns.load(Ordering::Relaxed));
        available.truncate(self.max_attempts);
        available
    }

    /// Runs `call` against providers in health order until one succeeds or
    /// every attempt is exhausted. `call` receives the provider's URL.
    pub async fn call_with_failover<F, Fut, T>(&self, op_name: &str, call: F) -> Result<T, ChainError>
    where
        F: Fn(&str) -> Fut,
        Fut: Future<Output = Result<T, String>>,
    {
        let candidates = self.ranked_available();
        if candidates.is_empty() {
            return Err(ChainError::Unavailable {
                chain: self.chain,
                attempted: 0,
                last_error: "no healthy providers".to_string(),
            });
        }

        let mut last_error = String::new();
        let attempted = candidates.len();
        for (i, provider) in candidates.into_iter().enumerate() {
            let start = fast_timestamp_ns();
            match tokio::time::timeout(self.call_timeout, call(&provider.url)).await {
                Ok(Ok(value)) => {
                    provider.record_latency(fast_timestamp_ns().saturating_sub(start));
                    return Ok(value);
                }
                Ok(Err(e)) => {
                    warn!(provider = i, %op_name, error = %e, "provider call failed");
                    if e.to_lowercase().contains("rate limit") {
                        provider.mark_degraded();
                    }
                    last_error = e;
                }
                Err(_) => {
                    debug!(provider = i, %op_name, "provider call timed out");
                    last_error = format!("timeout after {:?}", self.call_timeout);
                }
            }
        }

        Err(ChainError::Unavailable {
            chain: self.chain,
            attempted,
            last_error,
        })
    }

    /// Resets every degraded provider. Intended to be driven by a
    /// `tokio::time::interval(HEALTH_PROBE_INTERVAL)` background task.
    pub fn run_health_probe(&self) {
        for provider in &self.providers {
            provider.reset();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn failover_tries_next_provider_on_error() {
        let pool = ProviderPool::new(
            sandwich_types::ChainId::Ethereum,
            vec!["bad".into(), "good".into()],
            Duration::from_millis(100),
        );
        let result = pool
            .call_with_failover("test", |url| async move {
                if url == "bad" {
                    Err("connection refused".to_string())
                } else {
                    Ok(42)
                }
            })
            .await
            .unwrap();
        assert_eq!(result, 42);
    }

    #[tokio::test]
    async fn rate_limit_error_marks_provider_degraded() {
        let pool = ProviderPool::new(
            sandwich_types::ChainId::Ethereum,
            vec!["limited".into()],
            Duration::from_millis(100),
        );
        let _ = pool
            .call_with_failover("test", |_| async move { Err::<(), _>("rate limit exceeded".to_string()) })
            .await;
        assert!(!pool.providers[0].is_available());
    }

    #[tokio::test]
    async fn all_providers_exhausted_surfaces_unavailable() {
        let pool = ProviderPool::new(
            sandwich_types::ChainId::Solana,
            vec!["a".into(), "b".into()],
            Duration::from_millis(50),
        );
        let err = pool
            .call_with_failover("test", |_| async move { Err::<(), _>("boom".to_string()) })
            .await
            .unwrap_err();
        assert!(matches!(err, ChainError::Unavailable { attempted: 2, .. }));
    }
}
