//! Signing capability interface: the Core never sees raw key material.
//! Callers supply a `Signer`; this crate ships only a test double.

use async_trait::async_trait;
use sandwich_types::ChainId;

#[derive(Debug, Clone)]
pub struct UnsignedTx {
    pub chain: ChainId,
    pub to: sandwich_types::Address,
    pub data: Vec<u8>,
    pub value: sandwich_types::NativeAmount,
    pub gas_limit: u64,
    pub max_fee_per_gas: Option<u64>,
    pub max_priority_fee_per_gas: Option<u64>,
    pub nonce: u64,
}

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
#[error("signer error: {0}")]
pub struct SignerError(pub String);

#[async_trait]
pub trait Signer: Send + Sync {
    async fn sign(&self, unsigned: UnsignedTx) -> Result<Vec<u8>, SignerError>;

    /// Signs an arbitrary message with a key distinct from the per-tx
    /// signing key — used for the Flashbots-style "reputation" identity
    /// attached to relay requests, never for on-chain txs.
    async fn sign_message(&self, message: &[u8]) -> Result<Vec<u8>, SignerError>;
}

/// Test double that signs by prepending a fixed marker byte. Never wired
/// into the default binary; tests only.
pub struct StaticSigner;

#[async_trait]
impl Signer for StaticSigner {
    async fn sign(&self, unsigned: UnsignedTx) -> Result<Vec<u8>, SignerError> {
        let mut raw = vec![0xFF];
        raw.extend_from_slice(&unsigned.data);
        Ok(raw)
    }

    async fn sign_message(&self, message: &[u8]) -> Result<Vec<u8>, SignerError> {
        let mut raw = vec![0xFE];
        raw.extend_from_slice(message);
        Ok(raw)
    }
}
