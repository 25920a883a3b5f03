//! Bundle Monitor: polls block/slot progression after submission and
//! drives the [`sandwich_types::Bundle`] state machine to a terminal
//! outcome, generalizing a transaction-confirmation poll loop from a single
//! transaction to a 3-leg bundle.

use crate::chain::{ChainAdapter, TxStatus};
use crate::errors::ChainError;
use crate::events::CoreEvent;
use async_trait::async_trait;
use sandwich_network::time::fast_timestamp_ns;
use sandwich_types::{Bundle, BundleState, NativeAmount, UsdFixedPoint8};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::Sender;
use tracing::{info, warn};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(400);

/// Resolves realized profit once a bundle lands. Chain-specific (reserve
/// deltas for V2, swap event logs for V3/Raydium) so the monitor itself
/// stays chain-agnostic, mirroring the [`crate::pool_cache::PoolFetcher`]
/// split between cache logic and chain I/O.
#[async_trait]
pub trait ReceiptFetcher: Send + Sync {
    async fn realized_profit(&self, bundle: &Bundle) -> Result<(NativeAmount, UsdFixedPoint8, u64), ChainError>;
}

pub struct BundleMonitor {
    adapter: Arc<dyn ChainAdapter>,
    receipts: Arc<dyn ReceiptFetcher>,
    poll_interval: Duration,
    bundle_timeout_ms: u64,
    block_horizon: u64,
}

impl BundleMonitor {
    pub fn new(
        adapter: Arc<dyn ChainAdapter>,
        receipts: Arc<dyn ReceiptFetcher>,
        bundle_timeout_ms: u64,
        block_horizon: u64,
    ) -> Self {
        Self {
            adapter,
            receipts,
            poll_interval: DEFAULT_POLL_INTERVAL,
            bundle_timeout_ms,
            block_horizon,
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Drives `bundle` from `Submitted` to a terminal state, emitting
    /// `OutcomeLanded`/`OutcomeMissed` on the shared event bus. Returns once
    /// a terminal state is reached; does not retry submission itself.
    pub async fn watch(&self, mut bundle: Bundle, events: &Sender<CoreEvent>) -> Bundle {
        let submitted_at = bundle.submitted_at.unwrap_or_else(fast_timestamp_ns);
        let target = bundle.target_block_or_slot.0;
        let deadline_block = target + self.block_horizon;

        loop {
            let now = fast_timestamp_ns();
            let elapsed_ms = (now.saturating_sub(submitted_at)) / 1_000_000;
            if elapsed_ms > self.bundle_timeout_ms {
                self.resolve(&mut bundle, BundleState::Expired, "bundle_timeout_ms exceeded".to_string(), events, now);
                return bundle;
            }

            match self.check_landed(&bundle).await {
                Ok(true) => {
                    self.emit_landed(&mut bundle, events).await;
                    return bundle;
                }
                Ok(false) => {}
                Err(e) => {
                    warn!(bundle_id = ?bundle.id, error = %e, "bundle monitor chain call failed");
                }
            }

            match self.adapter.get_block_number_or_slot().await {
                Ok(current) if current > deadline_block => {
                    self.resolve(
                        &mut bundle,
                        BundleState::Missed,
                        format!("target block/slot {target} (+{} horizon) passed without inclusion", self.block_horizon),
                        events,
                        now,
                    );
                    return bundle;
                }
                Ok(_) => {}
                Err(e) => warn!(bundle_id = ?bundle.id, error = %e, "failed to read block/slot progression"),
            }

            tokio::time::sleep(self.poll_interval).await;
        }
    }

    /// Both legs must be included, front-run strictly before back-run, per
    /// the bundle's atomic ordering (adjacent around the victim's hash).
    async fn check_landed(&self, bundle: &Bundle) -> Result<bool, ChainError> {
        let front_run_status = self.adapter.get_tx_status(bundle.txs.front_run.hash).await?;
        let back_run_status = self.adapter.get_tx_status(bundle.txs.back_run.hash).await?;

        match (front_run_status, back_run_status) {
            (TxStatus::Included { block_or_slot: front }, TxStatus::Included { block_or_slot: back }) => {
                Ok(front <= back)
            }
            _ => Ok(false),
        }
    }

    async fn emit_landed(&self, bundle: &mut Bundle, events: &Sender<CoreEvent>) {
        let now = fast_timestamp_ns();
        match self.receipts.realized_profit(bundle).await {
            Ok((profit_native, profit_usd, gas_used)) => {
                if bundle.transition(BundleState::Landed, now).is_ok() {
                    info!(bundle_id = ?bundle.id, %profit_native, "bundle landed");
                    let _ = events.send(CoreEvent::OutcomeLanded {
                        bundle_id: bundle.id,
                        realized_profit_native: profit_native,
                        realized_profit_usd: profit_usd,
                        gas_used,
                    });
                }
            }
            Err(e) => {
                warn!(bundle_id = ?bundle.id, error = %e, "landed but realized-profit computation failed");
                self.resolve(bundle, BundleState::Landed, format!("profit computation failed: {e}"), events, now);
            }
        }
    }

    fn resolve(&self, bundle: &mut Bundle, state: BundleState, reason: String, events: &Sender<CoreEvent>, now: u64) {
        if bundle.transition(state, now).is_err() {
            return;
        }
        info!(bundle_id = ?bundle.id, ?state, %reason, "bundle resolved");
        if state != BundleState::Landed {
            let _ = events.send(CoreEvent::OutcomeMissed { bundle_id: bundle.id, reason });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::{PendingTxStream, RawPendingTx};
    use sandwich_types::{Address, BundleId, BundleTx, BundleTxs, ChainId, EvmAddress, OpportunityId, TargetBlockOrSlot, TxHash, TxId};
    use std::sync::atomic::{AtomicU64, Ordering};

    struct FakeAdapter {
        front_run_included_at: Option<u64>,
        back_run_included_at: Option<u64>,
        block: AtomicU64,
    }

    #[async_trait]
    impl ChainAdapter for FakeAdapter {
        fn chain(&self) -> ChainId {
            ChainId::Ethereum
        }
        async fn subscribe_pending_txs(&self) -> Result<PendingTxStream, ChainError> {
            Ok(Box::pin(futures::stream::empty::<RawPendingTx>()))
        }
        async fn get_pool_state(&self, _pool_id: Address) -> Result<Vec<u8>, ChainError> {
            Ok(vec![])
        }
        async fn estimate_base_fee(&self) -> Result<NativeAmount, ChainError> {
            Ok(NativeAmount::ZERO)
        }
        async fn get_block_number_or_slot(&self) -> Result<u64, ChainError> {
            Ok(self.block.fetch_add(1, Ordering::SeqCst))
        }
        async fn send_raw_tx(&self, _tx: Vec<u8>) -> Result<TxId, ChainError> {
            unimplemented!()
        }
        async fn get_tx_status(&self, hash: TxId) -> Result<TxStatus, ChainError> {
            let is_front = hash == TxId::Evm(TxHash::new([1; 32]));
            let slot = if is_front { self.front_run_included_at } else { self.back_run_included_at };
            Ok(match slot {
                Some(block_or_slot) => TxStatus::Included { block_or_slot },
                None => TxStatus::Pending,
            })
        }
    }

    struct FakeReceipts;

    #[async_trait]
    impl ReceiptFetcher for FakeReceipts {
        async fn realized_profit(&self, _bundle: &Bundle) -> Result<(NativeAmount, UsdFixedPoint8, u64), ChainError> {
            Ok((NativeAmount::new(1_000_000_000_000_000_000), UsdFixedPoint8::from_dollars(3_500), 150_000))
        }
    }

    fn sample_bundle() -> Bundle {
        Bundle {
            id: BundleId::new(),
            chain: ChainId::Ethereum,
            opportunity_id: OpportunityId::new(),
            txs: BundleTxs {
                front_run: BundleTx { hash: TxId::Evm(TxHash::new([1; 32])), raw: vec![1] },
                victim: BundleTx { hash: TxId::Evm(TxHash::new([2; 32])), raw: vec![2] },
                back_run: BundleTx { hash: TxId::Evm(TxHash::new([3; 32])), raw: vec![3] },
            },
            target_block_or_slot: TargetBlockOrSlot(100),
            tip_amount: NativeAmount::ZERO,
            state: BundleState::Submitted,
            created_at: 0,
            submitted_at: Some(fast_timestamp_ns()),
            resolved_at: None,
        }
    }

    #[allow(dead_code)]
    fn addr(byte: u8) -> Address {
        Address::Evm(EvmAddress::new([byte; 20]))
    }

    #[tokio::test]
    async fn lands_when_both_legs_included_in_order() {
        let adapter = Arc::new(FakeAdapter { front_run_included_at: Some(101), back_run_included_at: Some(101), block: AtomicU64::new(99) });
        let monitor = BundleMonitor::new(adapter, Arc::new(FakeReceipts), 60_000, 1).with_poll_interval(Duration::from_millis(1));
        let (tx, mut rx) = tokio::sync::broadcast::channel(16);
        let bundle = monitor.watch(sample_bundle(), &tx).await;
        assert_eq!(bundle.state, BundleState::Landed);
        assert!(matches!(rx.try_recv().unwrap(), CoreEvent::OutcomeLanded { .. }));
    }

    #[tokio::test]
    async fn misses_when_deadline_passes_without_inclusion() {
        let adapter = Arc::new(FakeAdapter { front_run_included_at: None, back_run_included_at: None, block: AtomicU64::new(102) });
        let monitor = BundleMonitor::new(adapter, Arc::new(FakeReceipts), 60_000, 1).with_poll_interval(Duration::from_millis(1));
        let (tx, mut rx) = tokio::sync::broadcast::channel(16);
        let bundle = monitor.watch(sample_bundle(), &tx).await;
        assert_eq!(bundle.state, BundleState::Missed);
        assert!(matches!(rx.try_recv().unwrap(), CoreEvent::OutcomeMissed { .. }));
    }

    #[tokio::test]
    async fn expires_after_bundle_timeout() {
        let mut bundle = sample_bundle();
        bundle.submitted_at = Some(fast_timestamp_ns().saturating_sub(120 * 1_000_000));
        let adapter = Arc::new(FakeAdapter { front_run_included_at: None, back_run_included_at: None, block: AtomicU64::new(50) });
        let monitor = BundleMonitor::new(adapter, Arc::new(FakeReceipts), 100, 1).with_poll_interval(Duration::from_millis(1));
        let (tx, mut rx) = tokio::sync::broadcast::channel(16);
        let resolved = monitor.watch(bundle, &tx).await;
        assert_eq!(resolved.state, BundleState::Expired);
        assert!(matches!(rx.try_recv().unwrap(), CoreEvent::OutcomeMissed { .. }));
    }
}
