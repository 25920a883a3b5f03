//! Flashbots `eth_sendBundle` transport: the Core's primary Ethereum relay.
//! Every request is signed with a dedicated reputation key, kept distinct
//! from the per-tx signing key per Flashbots' searcher-auth convention, and
//! submitted for a configurable block horizon.

use super::{RelayTransport, RelaySubmissionAttempt};
use crate::errors::SubmitError;
use crate::signer::Signer;
use sandwich_types::{Bundle, RelayName};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Submit for target block N and N+1..=N+horizon by default.
pub const DEFAULT_BLOCK_HORIZON: u64 = 1;

#[derive(Serialize)]
struct SendBundleParams {
    txs: Vec<String>,
    #[serde(rename = "blockNumber")]
    block_number: String,
    #[serde(rename = "revertingTxHashes", skip_serializing_if = "Vec::is_empty")]
    reverting_tx_hashes: Vec<String>,
}

#[derive(Serialize)]
struct JsonRpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'static str,
    params: &'a [SendBundleParams],
}

#[derive(Deserialize)]
struct JsonRpcResponse {
    result: Option<BundleResult>,
    error: Option<JsonRpcError>,
}

#[derive(Deserialize)]
struct BundleResult {
    #[serde(rename = "bundleHash")]
    bundle_hash: String,
}

#[derive(Deserialize)]
struct JsonRpcError {
    code: i64,
    message: String,
}

pub struct FlashbotsRelay {
    http: reqwest::Client,
    relay_url: String,
    reputation_signer: Arc<dyn Signer>,
    block_horizon: u64,
}

impl FlashbotsRelay {
    pub fn new(relay_url: String, reputation_signer: Arc<dyn Signer>) -> Self {
        Self {
            http: reqwest::Client::new(),
            relay_url,
            reputation_signer,
            block_horizon: DEFAULT_BLOCK_HORIZON,
        }
    }

    pub fn with_block_horizon(mut self, horizon: u64) -> Self {
        self.block_horizon = horizon;
        self
    }

    fn encode_bundle_txs(bundle: &Bundle) -> Vec<String> {
        [&bundle.txs.front_run, &bundle.txs.victim, &bundle.txs.back_run]
            .iter()
            .map(|leg| format!("0x{}", hex::encode(&leg.raw)))
            .collect()
    }
}

#[async_trait::async_trait]
impl RelayTransport for FlashbotsRelay {
    fn relay_name(&self) -> RelayName {
        RelayName::Flashbots
    }

    async fn try_submit(&self, bundle: &Bundle) -> Result<RelaySubmissionAttempt, SubmitError> {
        let base_block = bundle.target_block_or_slot.0;
        let txs = Self::encode_bundle_txs(bundle);
        let params: Vec<SendBundleParams> = (base_block..=base_block + self.block_horizon)
            .map(|block_number| SendBundleParams {
                txs: txs.clone(),
                block_number: format!("0x{:x}", block_number),
                reverting_tx_hashes: Vec::new(),
            })
            .collect();

        let body = JsonRpcRequest {
            jsonrpc: "2.0",
            id: 1,
            method: "eth_sendBundle",
            params: &params,
        };
        let body_bytes = serde_json::to_vec(&body)
            .map_err(|e| SubmitError::Rejected(format!("failed to encode bundle request: {e}")))?;

        let signature = self
            .reputation_signer
            .sign_message(&body_bytes)
            .await
            .map_err(|e| SubmitError::Rejected(format!("reputation signer unavailable: {e}")))?;

        let response = self
            .http
            .post(&self.relay_url)
            .header("Content-Type", "application/json")
            .header("X-Flashbots-Signature", format!("0x{}", hex::encode(signature)))
            .body(body_bytes)
            .send()
            .await
            .map_err(|e| SubmitError::Transient(e.to_string()))?;

        let status = response.status();
        if status.is_server_error() || status.as_u16() == 429 {
            return Err(SubmitError::Transient(format!("relay returned {status}")));
        }
        if !status.is_success() {
            return Err(SubmitError::Rejected(format!("relay returned {status}")));
        }

        let parsed: JsonRpcResponse = response
            .json()
            .await
            .map_err(|e| SubmitError::Transient(e.to_string()))?;

        if let Some(error) = parsed.error {
            if (500..600).contains(&(error.code.unsigned_abs() as u16 as i64)) {
                return Err(SubmitError::Transient(error.message));
            }
            return Err(SubmitError::Rejected(error.message));
        }

        let result = parsed
            .result
            .ok_or_else(|| SubmitError::Rejected("relay returned no bundle hash".to_string()))?;

        Ok(RelaySubmissionAttempt { request_id: result.bundle_hash })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sandwich_types::{BundleId, BundleState, BundleTx, BundleTxs, ChainId, NativeAmount, OpportunityId, TargetBlockOrSlot, TxHash, TxId};

    fn sample_bundle() -> Bundle {
        let leg = |b: u8| BundleTx { hash: TxId::Evm(TxHash::new([b; 32])), raw: vec![b, b] };
        Bundle {
            id: BundleId::new(),
            chain: ChainId::Ethereum,
            opportunity_id: OpportunityId::new(),
            txs: BundleTxs { front_run: leg(1), victim: leg(2), back_run: leg(3) },
            target_block_or_slot: TargetBlockOrSlot(18_000_100),
            tip_amount: NativeAmount::new(0),
            state: BundleState::Pending,
            created_at: 0,
            submitted_at: None,
            resolved_at: None,
        }
    }

    #[test]
    fn encodes_three_legs_as_hex_strings() {
        let bundle = sample_bundle();
        let txs = FlashbotsRelay::encode_bundle_txs(&bundle);
        assert_eq!(txs.len(), 3);
        assert!(txs[0].starts_with("0x"));
    }

    #[test]
    fn horizon_expands_block_range() {
        let base = 18_000_100u64;
        let horizon = 2u64;
        let params: Vec<u64> = (base..=base + horizon).collect();
        assert_eq!(params, vec![18_000_100, 18_000_101, 18_000_102]);
    }
}
