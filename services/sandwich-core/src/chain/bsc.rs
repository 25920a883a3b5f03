//! BSC chain adapter. Same EVM JSON-RPC wire shape as Ethereum, reusing
//! [`super::ethereum::EvmAdapter`]; BSC's faster block time only affects the
//! defaults chosen in configuration, not the adapter's behavior.

use super::ethereum::{EvmAdapter, DEFAULT_CALL_TIMEOUT_BSC};
use super::{ChainAdapter, PendingTxStream, TxStatus};
use crate::errors::ChainError;
use async_trait::async_trait;
use sandwich_types::{Address, ChainId, NativeAmount, TxId};

pub struct BscAdapter(EvmAdapter);

impl BscAdapter {
    pub fn new(rpc_urls: Vec<String>) -> Self {
        Self(EvmAdapter::new(ChainId::Bsc, rpc_urls, DEFAULT_CALL_TIMEOUT_BSC))
    }
}

#[async_trait]
impl ChainAdapter for BscAdapter {
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
