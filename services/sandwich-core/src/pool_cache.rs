//! Pool State Cache: a `DashMap`-backed, read-mostly cache keyed by
//! `(chain, protocol, pool_id)`, generalizing a single-chain pool-state
//! manager across chains/protocols and adding single-flight fetch dedup.

use async_trait::async_trait;
use dashmap::DashMap;
use sandwich_network::time::fast_timestamp_ns;
use sandwich_types::{ChainId, Pool, PoolKey, TokenKey, TokenMeta};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use tokio::sync::Mutex;

/// Per-chain cache TTLs, milliseconds.
pub fn ttl_ms_for(chain: ChainId) -> u64 {
    match chain {
        ChainId::Ethereum => 500,
        ChainId::Bsc => 300,
        ChainId::Solana => 150,
    }
}

pub const DEFAULT_SOFT_CAP_PER_CHAIN: usize = 4096;

#[derive(Debug, thiserror::Error)]
pub enum PoolCacheError {
    #[error("fetch failed: {0}")]
    FetchFailed(String),
}

/// Fetches fresh pool/token state from chain adapters. Implemented by the
/// binary's wiring, which decodes `ChainAdapter::get_pool_state` bytes into
/// the domain model; the cache itself holds no chain I/O knowledge.
#[async_trait]
pub trait PoolFetcher: Send + Sync {
    async fn fetch_pool(&self, key: PoolKey) -> Result<Pool, PoolCacheError>;
    async fn fetch_token_meta(&self, key: TokenKey) -> Result<TokenMeta, PoolCacheError>;
}

/// In-flight fetch coordination so N concurrent readers of the same cold key
/// share one fetch rather than issuing N redundant RPC calls.
struct SingleFlight<K, V> {
    inflight: DashMap<K, Arc<Mutex<Option<V>>>>,
}

impl<K: Eq + std::hash::Hash + Clone, V: Clone> SingleFlight<K, V> {
    fn new() -> Self {
        Self {
            inflight: DashMap::new(),
        }
    }

    async fn run<F, Fut, E>(&self, key: K, fetch: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<V, E>>,
    {
        let slot = self
            .inflight
            .entry(key.clone())
            .or_insert_with(|| Arc::new(Mutex::new(None)))
            .clone();
        let mut guard = slot.lock().await;
        if let Some(value) = guard.as_ref() {
            let value = value.clone();
            drop(guard);
            self.inflight.remove_if(&key, |_, v| Arc::strong_count(v) <= 1);
            return Ok(value);
        }
        let result = fetch().await;
        if let Ok(value) = &result {
            *guard = Some(value.clone());
        }
        drop(guard);
        self.inflight.remove_if(&key, |_, v| Arc::strong_count(v) <= 1);
        result
    }
}

struct CacheEntry<V> {
    value: V,
    last_refresh_ms: u64,
    pinned: bool,
}

/// Insertion/access-order queue used for LRU eviction beyond `soft_cap`,
/// skipping pinned keys.
struct EvictionOrder<K> {
    order: StdMutex<VecDeque<K>>,
}

impl<K: Clone + Eq> EvictionOrder<K> {
    fn new() -> Self {
        Self {
            order: StdMutex::new(VecDeque::new()),
        }
    }

    fn touch(&self, key: K) {
        let mut order = self.order.lock().unwrap();
        order.retain(|k| k != &key);
        order.push_back(key);
    }

    fn evict_candidate(&self) -> Option<K> {
        let mut order = self.order.lock().unwrap();
        order.pop_front()
    }

    fn remove(&self, key: &K) {
        let mut order = self.order.lock().unwrap();
        order.retain(|k| k != key);
    }
}

/// The cache proper: one instance per running service, shared across chains.
pub struct PoolCache {
    pools: DashMap<PoolKey, CacheEntry<Pool>>,
    tokens: DashMap<TokenKey, CacheEntry<TokenMeta>>,
    pool_order: EvictionOrder<PoolKey>,
    token_order: EvictionOrder<TokenKey>,
    pool_flight: SingleFlight<PoolKey, Pool>,
    token_flight: SingleFlight<TokenKey, TokenMeta>,
    soft_cap_per_chain: usize,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl PoolCache {
    pub fn new(soft_cap_per_chain: usize) -> Self {
        Self {
            pools: DashMap::new(),
            tokens: DashMap::new(),
            pool_order: EvictionOrder::new(),
            token_order: EvictionOrder::new(),
            pool_flight: SingleFlight::new(),
            token_flight: SingleFlight::new(),
            soft_cap_per_chain,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    fn is_fresh(&self, chain: ChainId, last_refresh_ms: u64, now_ms: u64) -> bool {
        now_ms.saturating_sub(last_refresh_ms) < ttl_ms_for(chain)
    }

    /// Read-or-fetch a pool. Readers sharing a cold key pay for exactly one
    /// fetch. Writes replace the entry atomically so readers never observe a
    /// partially updated value.
    pub async fn get_pool(
        &self,
        key: PoolKey,
        fetcher: &dyn PoolFetcher,
    ) -> Result<Pool, PoolCacheError> {
        let now_ms = fast_timestamp_ns() / 1_000_000;
        if let Some(entry) = self.pools.get(&key) {
            if self.is_fresh(key.chain, entry.last_refresh_ms, now_ms) {
                self.hits.fetch_add(1, Ordering::Relaxed);
                self.pool_order.touch(key);
                return Ok(entry.value.clone());
            }
        }
        self.misses.fetch_add(1, Ordering::Relaxed);
        let pool = self
            .pool_flight
            .run(key, || fetcher.fetch_pool(key))
            .await?;
        self.pools.insert(
            key,
            CacheEntry {
                value: pool.clone(),
                last_refresh_ms: now_ms,
                pinned: false,
            },
        );
        self.pool_order.touch(key);
        self.evict_pools_if_needed();
        Ok(pool)
    }

    pub async fn get_token_meta(
        &self,
        key: TokenKey,
        fetcher: &dyn PoolFetcher,
    ) -> Result<TokenMeta, PoolCacheError> {
        let now_ms = fast_timestamp_ns() / 1_000_000;
        if let Some(entry) = self.tokens.get(&key) {
            if self.is_fresh(key.chain, entry.last_refresh_ms, now_ms) {
                self.hits.fetch_add(1, Ordering::Relaxed);
                self.token_order.touch(key);
                return Ok(entry.value.clone());
            }
        }
        self.misses.fetch_add(1, Ordering::Relaxed);
        let meta = self
            .token_flight
            .run(key, || fetcher.fetch_token_meta(key))
            .await?;
        self.tokens.insert(
            key,
            CacheEntry {
                value: meta.clone(),
                last_refresh_ms: now_ms,
                pinned: false,
            },
        );
        self.token_order.touch(key);
        self.evict_tokens_if_needed();
        Ok(meta)
    }

    /// Pins a pool so it survives LRU eviction — verified-token,
    /// high-liquidity pools are pinned so a busy block never flushes them.
    pub fn pin_pool(&self, key: PoolKey) {
        if let Some(mut entry) = self.pools.get_mut(&key) {
            entry.pinned = true;
        }
    }

    fn evict_pools_if_needed(&self) {
        let per_chain_count = |chain: ChainId| self.pools.iter().filter(|e| e.key().chain == chain).count();
        loop {
            let over_cap = [ChainId::Ethereum, ChainId::Bsc, ChainId::Solana]
                .into_iter()
                .any(|c| per_chain_count(c) > self.soft_cap_per_chain);
            if !over_cap {
                break;
            }
            let Some(candidate) = self.pool_order.evict_candidate() else {
                break;
            };
            let is_pinned = self.pools.get(&candidate).map(|e| e.pinned).unwrap_or(false);
            if is_pinned {
                self.pool_order.touch(candidate);
                continue;
            }
            self.pools.remove(&candidate);
        }
    }

    fn evict_tokens_if_needed(&self) {
        loop {
            if self.tokens.len() <= self.soft_cap_per_chain * 3 {
                break;
            }
            let Some(candidate) = self.token_order.evict_candidate() else {
                break;
            };
            let is_pinned = self.tokens.get(&candidate).map(|e| e.pinned).unwrap_or(false);
            if is_pinned {
                self.token_order.touch(candidate);
                continue;
            }
            self.tokens.remove(&candidate);
        }
    }

    pub fn invalidate_pool(&self, key: PoolKey) {
        self.pools.remove(&key);
        self.pool_order.remove(&key);
    }

    pub fn hit_rate(&self) -> f64 {
        let hits = self.hits.load(Ordering::Relaxed) as f64;
        let misses = self.misses.load(Ordering::Relaxed) as f64;
        if hits + misses == 0.0 {
            0.0
        } else {
            hits / (hits + misses)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sandwich_types::{Address, Bps, EvmAddress, NativeAmount, Protocol, UsdFixedPoint8};
    use std::sync::atomic::AtomicUsize;

    fn addr(byte: u8) -> Address {
        Address::Evm(EvmAddress::new([byte; 20]))
    }

    fn sample_key() -> PoolKey {
        PoolKey {
            chain: ChainId::Ethereum,
            protocol: Protocol::UniswapV2,
            pool_id: addr(9),
        }
    }

    fn sample_pool(key: PoolKey) -> Pool {
        Pool {
            key,
            token_a: addr(1),
            token_b: addr(2),
            reserve_a: NativeAmount::new(1_000_000),
            reserve_b: NativeAmount::new(2_000_000),
            fee_bps: Bps::new(30),
            last_refresh_ms: 0,
            liquidity_usd_estimate: UsdFixedPoint8::from_dollars(1_000_000),
            concentrated: None,
        }
    }

    struct CountingFetcher {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl PoolFetcher for CountingFetcher {
        async fn fetch_pool(&self, key: PoolKey) -> Result<Pool, PoolCacheError> {
            self.calls.fetch_add(1, Ordering::Relaxed);
            Ok(sample_pool(key))
        }
        async fn fetch_token_meta(&self, _key: TokenKey) -> Result<TokenMeta, PoolCacheError> {
            unreachable!()
        }
    }

    #[tokio::test]
    async fn second_read_within_ttl_hits_cache() {
        let cache = PoolCache::new(DEFAULT_SOFT_CAP_PER_CHAIN);
        let fetcher = CountingFetcher {
            calls: AtomicUsize::new(0),
        };
        let key = sample_key();
        cache.get_pool(key, &fetcher).await.unwrap();
        cache.get_pool(key, &fetcher).await.unwrap();
        assert_eq!(fetcher.calls.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn concurrent_cold_reads_share_one_fetch() {
        let cache = Arc::new(PoolCache::new(DEFAULT_SOFT_CAP_PER_CHAIN));
        let fetcher = Arc::new(CountingFetcher {
            calls: AtomicUsize::new(0),
        });
        let key = sample_key();
        let mut handles = Vec::new();
        for _ in 0..8 {
            let cache = cache.clone();
            let fetcher = fetcher.clone();
            handles.push(tokio::spawn(async move { cache.get_pool(key, &*fetcher).await }));
        }
        for h in handles {
            h.await.unwrap().unwrap();
        }
        assert_eq!(fetcher.calls.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn pinned_pool_survives_eviction() {
        let cache = PoolCache::new(1);
        let fetcher = CountingFetcher {
            calls: AtomicUsize::new(0),
        };
        let pinned_key = sample_key();
        cache.get_pool(pinned_key, &fetcher).await.unwrap();
        cache.pin_pool(pinned_key);

        let other_key = PoolKey {
            pool_id: addr(10),
            ..pinned_key
        };
        cache.get_pool(other_key, &fetcher).await.unwrap();

        assert!(cache.pools.contains_key(&pinned_key));
    }
}
