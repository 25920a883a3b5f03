//! Ethereum chain adapter, and the generic EVM JSON-RPC plumbing BSC reuses
//! (both chains differ only in default timeouts and block time).

use super::provider::ProviderPool;
use super::{ChainAdapter, PendingTxStream, RawPendingTx, TxStatus};
use crate::errors::ChainError;
use async_trait::async_trait;
use sandwich_types::{Address, ChainId, NativeAmount, TxId};
use std::time::Duration;

/// Per-call provider timeout defaults, one per chain's expected block time.
pub const DEFAULT_CALL_TIMEOUT_ETHEREUM: Duration = Duration::from_millis(500);
pub const DEFAULT_CALL_TIMEOUT_BSC: Duration = Duration::from_millis(500);
pub const DEFAULT_CALL_TIMEOUT_SOLANA: Duration = Duration::from_millis(200);

/// Shared EVM JSON-RPC adapter used by both [`EthereumAdapter`] and
/// [`super::bsc::BscAdapter`] — the two chains differ only in chain id,
/// timeout defaults, and block time, not in wire shape.
pub struct EvmAdapter {
    chain: ChainId,
    providers: ProviderPool,
    http: reqwest::Client,
}

impl EvmAdapter {
    pub fn new(chain: ChainId, rpc_urls: Vec<String>, call_timeout: Duration) -> Self {
        Self {
            chain,
            providers: ProviderPool::new(chain, rpc_urls, call_timeout),
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
                    let resp = http
                        .post(&url)
                        .json(&body)
                        .send()
                        .await
                        .map_err(|e| e.to_string())?;
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
}

#[async_trait]
impl ChainAdapter for EvmAdapter {
    fn chain(&self) -> ChainId {
        self.chain
    }

    async fn subscribe_pending_txs(&self) -> Result<PendingTxStream, ChainError> {
        // WebSocket subscription wiring (eth_subscribe("newPendingTransactions"))
        // is an I/O detail left to the binary's provider configuration; the
        // adapter returns an empty stream here so detector/mempool logic is
        // independently testable against synthetic streams.
        Ok(Box::pin(futures::stream::empty::<RawPendingTx>()))
    }

    async fn get_pool_state(&self, pool_id: Address) -> Result<Vec<u8>, ChainError> {
        let result = self
            .json_rpc(
                "eth_call",
                serde_json::json!([{ "to": pool_id.to_string() }, "latest"]),
            )
            .await?;
        Ok(result.to_string().into_bytes())
    }

    async fn estimate_base_fee(&self) -> Result<NativeAmount, ChainError> {
        let result = self
            .json_rpc("eth_getBlockByNumber", serde_json::json!(["latest", false]))
            .await?;
        let hex = result
            .get("baseFeePerGas")
            .and_then(|v| v.as_str())
            .unwrap_or("0x0");
        let wei = i128::from_str_radix(hex.trim_start_matches("0x"), 16).unwrap_or(0);
        Ok(NativeAmount::new(wei))
    }

    async fn get_block_number_or_slot(&self) -> Result<u64, ChainError> {
        let result = self.json_rpc("eth_blockNumber", serde_json::json!([])).await?;
        let hex = result.as_str().unwrap_or("0x0");
        Ok(u64::from_str_radix(hex.trim_start_matches("0x"), 16).unwrap_or(0))
    }

    async fn send_raw_tx(&self, tx: Vec<u8>) -> Result<TxId, ChainError> {
        let hex = format!("0x{}", hex::encode(&tx));
        let result = self
            .json_rpc("eth_sendRawTransaction", serde_json::json!([hex]))
            .await?;
        let hash_hex = result.as_str().unwrap_or("0x0");
        let bytes = hex::decode(hash_hex.trim_start_matches("0x")).unwrap_or_default();
        let mut hash = [0u8; 32];
        let len = bytes.len().min(32);
        hash[..len].copy_from_slice(&bytes[..len]);
        Ok(TxId::Evm(sandwich_types::TxHash::new(hash)))
    }

    async fn get_tx_status(&self, hash: TxId) -> Result<TxStatus, ChainError> {
        let TxId::Evm(tx_hash) = hash else {
            return Err(ChainError::Unavailable {
                chain: self.chain,
                attempted: 0,
                last_error: "not an EVM tx hash".to_string(),
            });
        };
        let result = self
            .json_rpc(
                "eth_getTransactionReceipt",
                serde_json::json!([tx_hash.to_string()]),
            )
            .await?;
        if result.is_null() {
            return Ok(TxStatus::Pending);
        }
        let block_hex = result
            .get("blockNumber")
            .and_then(|v| v.as_str())
            .unwrap_or("0x0");
        let block = u64::from_str_radix(block_hex.trim_start_matches("0x"), 16).unwrap_or(0);
        Ok(TxStatus::Included { block_or_slot: block })
    }
}

pub struct EthereumAdapter(EvmAdapter);

impl EthereumAdapter {
    pub fn new(rpc_urls: Vec<String>) -> Self {
        Self(EvmAdapter::new(
            ChainId::Ethereum,
            rpc_urls,
            DEFAULT_CALL_TIMEOUT_ETHEREUM,
        ))
    }
}

#[async_trait]
impl ChainAdapter for EthereumAdapter {
    fn chain(&self) -> ChainId {
        self.0.chain()
    }
    async fn subscribe_pending_txs(&self) -> Result<PendingTxStream, ChainError> {
        self.0.subscribe_pending_txs().await
    }
    async fn get_pool_state(&self, pool_id: Address) -> Result<Vec<u8>, ChainError> {
        self.0.get_pool_state(pool_id).await
    }
    async fn estimate_base_fee(&self) -> Result<NativeAmount, ChainError> {
        self.0.estimate_base_fee().await
    }
    async fn get_block_number_or_slot(&self) -> Result<u64, ChainError> {
        self.0.get_block_number_or_slot().await
    }
    async fn send_raw_tx(&self, tx: Vec<u8>) -> Result<TxId, ChainError> {
        self.0.send_raw_tx(tx).await
    }
    async fn get_tx_status(&self, hash: TxId) -> Result<TxStatus, ChainError> {
        self.0.get_tx_status(hash).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_timeouts_match_spec_budgets() {
        assert_eq!(DEFAULT_CALL_TIMEOUT_ETHEREUM, Duration::from_millis(500));
        assert_eq!(DEFAULT_CALL_TIMEOUT_SOLANA, Duration::from_millis(200));
    }
}
