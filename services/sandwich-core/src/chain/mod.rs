//! Chain Adapter Layer: a uniform capability set per chain, each backed by
//! a [`provider::ProviderPool`] for RPC/WS failover.

pub mod bsc;
pub mod ethereum;
pub mod provider;
pub mod solana;

use crate::errors::ChainError;
use async_trait::async_trait;
use sandwich_types::{Address, ChainId, NativeAmount, TxId};
use std::pin::Pin;

/// Raw bytes observed on a chain's pending-transaction feed, not yet decoded
/// against a specific router ABI.
#[derive(Debug, Clone)]
pub struct RawPendingTx {
    pub tx_hash: TxId,
    pub raw: Vec<u8>,
    pub observed_at: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxStatus {
    Pending,
    Included { block_or_slot: u64 },
    Dropped,
}

pub type PendingTxStream = Pin<Box<dyn futures::Stream<Item = RawPendingTx> + Send>>;

/// Capability set every chain adapter exposes. Solana has no public
/// mempool: its adapter synthesizes `RawPendingTx` from slot/logs
/// subscriptions for imminent pre-confirmation swaps instead.
#[async_trait]
pub trait ChainAdapter: Send + Sync {
    fn chain(&self) -> ChainId;

    /// Lazy, infinite, non-restartable stream, internally multiplexed and
    /// hash-deduplicated across providers.
    async fn subscribe_pending_txs(&self) -> Result<PendingTxStream, ChainError>;

    async fn get_pool_state(&self, pool_id: Address) -> Result<Vec<u8>, ChainError>;

    async fn estimate_base_fee(&self) -> Result<NativeAmount, ChainError>;

    async fn get_block_number_or_slot(&self) -> Result<u64, ChainError>;

    async fn send_raw_tx(&self, tx: Vec<u8>) -> Result<TxId, ChainError>;

    async fn get_tx_status(&self, hash: TxId) -> Result<TxStatus, ChainError>;
}

/// Bounded LRU of recently observed `(chain, tx_hash)` pairs, so the same
/// pending transaction seen via two redundant WebSocket providers produces
/// at most one `PendingObserved` event.
pub struct PendingTxDedup {
    seen: lru::LruCache<TxId, ()>,
}

mod lru {
    use std::collections::VecDeque;
    use std::hash::Hash;
    use std::collections::HashSet;

    /// Minimal LRU-by-insertion cache: a hash set for O(1) membership plus a
    /// FIFO eviction queue. Recency-of-access is not tracked, only
    /// recency-of-insertion, which is sufficient for pure dedup.
    pub struct LruCache<K: Eq + Hash + Clone> {
        capacity: usize,
        set: HashSet<K>,
        order: VecDeque<K>,
    }

    impl<K: Eq + Hash + Clone> LruCache<K> {
        pub fn new(capacity: usize) -> Self {
            Self {
                capacity,
                set: HashSet::with_capacity(capacity),
                order: VecDeque::with_capacity(capacity),
            }
        }

        /// Returns `true` if `key` was newly inserted (i.e. not a duplicate).
        pub fn insert_if_new(&mut self, key: K) -> bool {
            if self.set.contains(&key) {
                return false;
            }
            if self.order.len() >= self.capacity {
                if let Some(oldest) = self.order.pop_front() {
                    self.set.remove(&oldest);
                }
            }
            self.order.push_back(key.clone());
            self.set.insert(key);
            true
        }
    }
}

impl PendingTxDedup {
    pub fn new(capacity: usize) -> Self {
        Self {
            seen: lru::LruCache::new(capacity),
        }
    }

    /// Returns `true` the first time `hash` is seen, `false` on repeats.
    pub fn observe(&mut self, hash: TxId) -> bool {
        self.seen.insert_if_new(hash)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sandwich_types::TxHash;

    #[test]
    fn dedup_reports_first_observation_only() {
        let mut dedup = PendingTxDedup::new(4);
        let hash = TxId::Evm(TxHash::new([1; 32]));
        assert!(dedup.observe(hash));
        assert!(!dedup.observe(hash));
    }

    #[test]
    fn dedup_evicts_oldest_beyond_capacity() {
        let mut dedup = PendingTxDedup::new(2);
        let h1 = TxId::Evm(TxHash::new([1; 32]));
        let h2 = TxId::Evm(TxHash::new([2; 32]));
        let h3 = TxId::Evm(TxHash::new([3; 32]));
        assert!(dedup.observe(h1));
        assert!(dedup.observe(h2));
        assert!(dedup.observe(h3));
        // h1 was evicted to make room for h3, so it is "new" again.
        assert!(dedup.observe(h1));
    }
}
