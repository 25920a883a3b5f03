//! Performance Optimizer: a cross-cutting sidecar consulted by the Detector
//! and Builder. Tracks per-component latency EMAs, ranks hot pools for
//! precomputation, and raises an end-to-end latency alert.
//!
//! Reuses [`crate::chain::provider::ProviderEntry`]'s EMA (`(prev * 4 +
//! sample) / 5`), generalized from one RPC endpoint to the five pipeline
//! stages tracked here.

use dashmap::DashMap;
use sandwich_config::service::performance as defaults;
use sandwich_types::{ChainId, PoolKey};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::broadcast::Sender;

use crate::events::CoreEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    IngestionDecode,
    CacheFetch,
    Simulation,
    Build,
    Submit,
}

impl Stage {
    fn as_str(self) -> &'static str {
        match self {
            Stage::IngestionDecode => "ingestion_decode",
            Stage::CacheFetch => "cache_fetch",
            Stage::Simulation => "simulation",
            Stage::Build => "build",
            Stage::Submit => "submit",
        }
    }
}

struct LatencyEma {
    ema_ns: AtomicU64,
}

impl LatencyEma {
    fn new() -> Self {
        Self { ema_ns: AtomicU64::new(0) }
    }

    fn record(&self, sample_ns: u64) {
        let prev = self.ema_ns.load(Ordering::Relaxed);
        let next = if prev == 0 { sample_ns } else { (prev * 4 + sample_ns) / 5 };
        self.ema_ns.store(next, Ordering::Relaxed);
    }

    fn get_ms(&self) -> u64 {
        self.ema_ns.load(Ordering::Relaxed) / 1_000_000
    }
}

fn alert_threshold_ms(chain: ChainId) -> u64 {
    match chain {
        ChainId::Ethereum => defaults::LATENCY_ALERT_MS_ETHEREUM,
        ChainId::Bsc => defaults::LATENCY_ALERT_MS_BSC,
        ChainId::Solana => defaults::LATENCY_ALERT_MS_SOLANA,
    }
}

/// Per-chain EMA table for the five pipeline stages, plus a hot-pool
/// frequency counter driving precomputation.
pub struct PerformanceOptimizer {
    stage_latency: DashMap<(ChainId, Stage), LatencyEma>,
    opportunity_frequency: DashMap<PoolKey, AtomicU64>,
    precomputation_top_k: usize,
}

impl PerformanceOptimizer {
    pub fn new(precomputation_top_k: usize) -> Self {
        Self {
            stage_latency: DashMap::new(),
            opportunity_frequency: DashMap::new(),
            precomputation_top_k,
        }
    }

    pub fn record_stage_latency(&self, chain: ChainId, stage: Stage, elapsed_ns: u64) {
        self.stage_latency
            .entry((chain, stage))
            .or_insert_with(LatencyEma::new)
            .record(elapsed_ns);
    }

    pub fn stage_latency_ms(&self, chain: ChainId, stage: Stage) -> u64 {
        self.stage_latency.get(&(chain, stage)).map(|e| e.get_ms()).unwrap_or(0)
    }

    /// Sums the five stage EMAs as the end-to-end opportunity-to-submission
    /// latency estimate and emits [`CoreEvent::LatencyAlert`] if it exceeds
    /// the chain's threshold.
    pub fn check_end_to_end_latency(&self, chain: ChainId, events: &Sender<CoreEvent>) -> u64 {
        let total_ms: u64 = [Stage::IngestionDecode, Stage::CacheFetch, Stage::Simulation, Stage::Build, Stage::Submit]
            .iter()
            .map(|s| self.stage_latency_ms(chain, *s))
            .sum();

        let threshold = alert_threshold_ms(chain);
        if total_ms > threshold {
            let _ = events.send(CoreEvent::LatencyAlert {
                chain,
                stage: "end_to_end",
                latency_ms: total_ms,
                threshold_ms: threshold,
            });
        }
        total_ms
    }

    pub fn record_opportunity(&self, pool: PoolKey) {
        self.opportunity_frequency
            .entry(pool)
            .or_insert_with(|| AtomicU64::new(0))
            .fetch_add(1, Ordering::Relaxed);
    }

    /// Top-K pools by recent opportunity frequency, the precomputation set:
    /// reserves for these are pre-fetched on every block header rather than
    /// lazily on the next victim swap.
    pub fn hot_pools(&self) -> Vec<PoolKey> {
        let mut ranked: Vec<(PoolKey, u64)> = self
            .opportunity_frequency
            .iter()
            .map(|entry| (*entry.key(), entry.value().load(Ordering::Relaxed)))
            .collect();
        ranked.sort_by_key(|(_, count)| std::cmp::Reverse(*count));
        ranked.truncate(self.precomputation_top_k);
        ranked.into_iter().map(|(pool, _)| pool).collect()
    }
}

/// RAII stopwatch: records into a [`PerformanceOptimizer`] when dropped, so
/// a stage's elapsed time is captured even on an early `?`-return.
pub struct StageTimer<'a> {
    optimizer: &'a PerformanceOptimizer,
    chain: ChainId,
    stage: Stage,
    started: std::time::Instant,
}

impl<'a> StageTimer<'a> {
    pub fn start(optimizer: &'a PerformanceOptimizer, chain: ChainId, stage: Stage) -> Self {
        Self { optimizer, chain, stage, started: std::time::Instant::now() }
    }
}

impl Drop for StageTimer<'_> {
    fn drop(&mut self) {
        self.optimizer.record_stage_latency(self.chain, self.stage, self.started.elapsed().as_nanos() as u64);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sandwich_types::{Address, EvmAddress, Protocol};

    fn pool(byte: u8) -> PoolKey {
        PoolKey { chain: ChainId::Ethereum, protocol: Protocol::UniswapV2, pool_id: Address::Evm(EvmAddress::new([byte; 20])) }
    }

    #[test]
    fn hot_pools_ranked_by_frequency() {
        let optimizer = PerformanceOptimizer::new(2);
        optimizer.record_opportunity(pool(1));
        optimizer.record_opportunity(pool(1));
        optimizer.record_opportunity(pool(2));
        optimizer.record_opportunity(pool(3));
        optimizer.record_opportunity(pool(3));
        optimizer.record_opportunity(pool(3));
        let top = optimizer.hot_pools();
        assert_eq!(top.len(), 2);
        assert_eq!(top[0], pool(3));
        assert_eq!(top[1], pool(1));
    }

    #[test]
    fn end_to_end_alert_fires_past_threshold() {
        let optimizer = PerformanceOptimizer::new(8);
        optimizer.record_stage_latency(ChainId::Ethereum, Stage::IngestionDecode, 50_000_000);
        optimizer.record_stage_latency(ChainId::Ethereum, Stage::CacheFetch, 50_000_000);
        optimizer.record_stage_latency(ChainId::Ethereum, Stage::Simulation, 50_000_000);
        optimizer.record_stage_latency(ChainId::Ethereum, Stage::Build, 50_000_000);
        optimizer.record_stage_latency(ChainId::Ethereum, Stage::Submit, 50_000_000);
        let (tx, mut rx) = tokio::sync::broadcast::channel(4);
        let total = optimizer.check_end_to_end_latency(ChainId::Ethereum, &tx);
        assert_eq!(total, 250);
        assert!(matches!(rx.try_recv().unwrap(), CoreEvent::LatencyAlert { .. }));
    }

    #[test]
    fn no_alert_below_threshold() {
        let optimizer = PerformanceOptimizer::new(8);
        optimizer.record_stage_latency(ChainId::Ethereum, Stage::IngestionDecode, 1_000_000);
        let (tx, mut rx) = tokio::sync::broadcast::channel(4);
        optimizer.check_end_to_end_latency(ChainId::Ethereum, &tx);
        assert!(rx.try_recv().is_err());
    }
}
