//! Outbound events, independently consumable by metrics/logging collaborators
//! in addition to the `tracing` spans each component emits directly.

use sandwich_types::{
    BundleId, ChainId, NativeAmount, Opportunity, OpportunityRejectReason, TxId, UsdFixedPoint8,
};

#[derive(Debug, Clone)]
pub enum CoreEvent {
    PendingObserved {
        chain: ChainId,
        tx_hash: TxId,
        latency_from_network_ms: u64,
    },
    OpportunityDetected {
        opportunity: Box<Opportunity>,
    },
    OpportunityRejected {
        victim_hash: TxId,
        reason: OpportunityRejectReason,
    },
    BundleSubmitted {
        bundle_id: BundleId,
        relay: sandwich_types::RelayName,
        attempt: u32,
        latency_ms: u64,
    },
    OutcomeLanded {
        bundle_id: BundleId,
        realized_profit_native: NativeAmount,
        realized_profit_usd: UsdFixedPoint8,
        gas_used: u64,
    },
    OutcomeMissed {
        bundle_id: BundleId,
        reason: String,
    },
    ChainPaused {
        chain: ChainId,
        reason: String,
    },
    LatencyAlert {
        chain: ChainId,
        stage: &'static str,
        latency_ms: u64,
        threshold_ms: u64,
    },
}

/// Broadcast capacity for the core event bus. Slow subscribers lag rather
/// than block the producing task; `tracing` is still emitted inline so
/// nothing is lost from logs even if a lagging subscriber drops events.
pub const EVENT_CHANNEL_CAPACITY: usize = 4096;

pub fn channel() -> (
    tokio::sync::broadcast::Sender<CoreEvent>,
    tokio::sync::broadcast::Receiver<CoreEvent>,
) {
    tokio::sync::broadcast::channel(EVENT_CHANNEL_CAPACITY)
}
