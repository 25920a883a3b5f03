//! Mempool Ingestion: decodes raw pending transactions against known router
//! ABIs/program IDs into [`PendingSwap`]. Unknown selectors/programs are
//! dropped silently and only counted; malformed paths are rejected. Output
//! is a bounded, oldest-drops-first queue so a slow detector never backs up
//! ingestion.

use crate::chain::{PendingTxDedup, RawPendingTx};
use crate::errors::DecodeError;
use sandwich_types::{Address, ChainId, EvmAddress, NativeAmount, Protocol, SolanaAddress, TxId};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, Notify};
use tracing::{debug, trace};

pub const DEFAULT_QUEUE_CAPACITY: usize = 4096;

/// EVM V2-router selectors this decoder understands. Both tokens must be
/// present in the dynamic `path` array; ETH-denominated variants (where
/// `amountIn` comes from tx value rather than calldata) are out of scope.
mod v2_selectors {
    pub const SWAP_EXACT_TOKENS_FOR_TOKENS: [u8; 4] = [0x38, 0xed, 0x17, 0x39];
    pub const SWAP_EXACT_TOKENS_FOR_TOKENS_FEE_ON_TRANSFER: [u8; 4] = [0x5c, 0x11, 0xd7, 0x95];
}

mod v3_selectors {
    pub const EXACT_INPUT_SINGLE: [u8; 4] = [0x41, 0x4b, 0xf3, 0x89];
    pub const EXACT_INPUT: [u8; 4] = [0xc0, 0x4b, 0x8d, 0x59];
}

/// Fee tiers (hundredths of a bip) this engine is willing to simulate.
const SUPPORTED_V3_FEE_TIERS: [u32; 3] = [500, 3_000, 10_000];

/// Maps a router contract address (EVM) or program id (Solana) to the
/// protocol whose ABI/instruction shape it speaks.
#[derive(Debug, Default, Clone)]
pub struct RouterRegistry {
    routers: HashMap<Address, Protocol>,
}

impl RouterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, router: Address, protocol: Protocol) -> &mut Self {
        self.routers.insert(router, protocol);
        self
    }

    pub fn protocol_for(&self, router: Address) -> Option<Protocol> {
        self.routers.get(&router).copied()
    }
}

fn read_word(data: &[u8], word_index: usize) -> Option<[u8; 32]> {
    let start = word_index * 32;
    let slice = data.get(start..start + 32)?;
    let mut word = [0u8; 32];
    word.copy_from_slice(slice);
    Some(word)
}

fn word_to_u128(word: &[u8; 32]) -> u128 {
    let mut buf = [0u8; 16];
    buf.copy_from_slice(&word[16..32]);
    u128::from_be_bytes(buf)
}

fn word_to_evm_address(word: &[u8; 32]) -> EvmAddress {
    let mut bytes = [0u8; 20];
    bytes.copy_from_slice(&word[12..32]);
    EvmAddress::new(bytes)
}

/// Decodes a dynamic `address[]` ABI parameter whose offset (relative to the
/// start of the parameter block, i.e. after the 4-byte selector) is given by
/// `offset_word`.
fn decode_address_path(data: &[u8], offset_word: &[u8; 32]) -> Option<Vec<Address>> {
    let offset_bytes = word_to_u128(offset_word) as usize;
    let offset_words = offset_bytes / 32;
    let len_word = read_word(data, offset_words)?;
    let len = word_to_u128(&len_word) as usize;
    if len < 2 || len > 8 {
        return None;
    }
    let mut path = Vec::with_capacity(len);
    for i in 0..len {
        let word = read_word(data, offset_words + 1 + i)?;
        path.push(Address::Evm(word_to_evm_address(&word)));
    }
    Some(path)
}

struct DecodedV2Params {
    amount_in: u128,
    min_amount_out: u128,
    path: Vec<Address>,
    deadline: u64,
}

fn decode_v2_params(params: &[u8]) -> Option<DecodedV2Params> {
    let amount_in = word_to_u128(&read_word(params, 0)?);
    let min_amount_out = word_to_u128(&read_word(params, 1)?);
    let path_offset = read_word(params, 2)?;
    let path = decode_address_path(params, &path_offset)?;
    let deadline = word_to_u128(&read_word(params, 4)?) as u64;
    Some(DecodedV2Params {
        amount_in,
        min_amount_out,
        path,
        deadline,
    })
}

struct DecodedV3SingleParams {
    token_in: Address,
    token_out: Address,
    fee: u32,
    deadline: u64,
    amount_in: u128,
    min_amount_out: u128,
}

fn decode_v3_single_params(params: &[u8]) -> Option<DecodedV3SingleParams> {
    let token_in = Address::Evm(word_to_evm_address(&read_word(params, 0)?));
    let token_out = Address::Evm(word_to_evm_address(&read_word(params, 1)?));
    let fee = word_to_u128(&read_word(params, 2)?) as u32;
    let deadline = word_to_u128(&read_word(params, 4)?) as u64;
    let amount_in = word_to_u128(&read_word(params, 5)?);
    let min_amount_out = word_to_u128(&read_word(params, 6)?);
    Some(DecodedV3SingleParams {
        token_in,
        token_out,
        fee,
        deadline,
        amount_in,
        min_amount_out,
    })
}

/// Decodes a multi-hop V3 `bytes path` blob: `token(20) | fee(3) | token(20)
/// | fee(3) | ... | token(20)`. Rejects any hop whose fee tier isn't in
/// [`SUPPORTED_V3_FEE_TIERS`].
fn decode_v3_multi_hop_path(path_bytes: &[u8]) -> Option<(Vec<Address>, Vec<u32>)> {
    const HOP_STRIDE: usize = 23; // 20-byte address + 3-byte fee
    if path_bytes.len() < 20 || (path_bytes.len() - 20) % HOP_STRIDE != 0 {
        return None;
    }
    let mut tokens = Vec::new();
    let mut fees = Vec::new();
    let mut offset = 0;
    loop {
        let token_bytes = path_bytes.get(offset..offset + 20)?;
        let mut addr = [0u8; 20];
        addr.copy_from_slice(token_bytes);
        tokens.push(Address::Evm(EvmAddress::new(addr)));
        offset += 20;
        if offset >= path_bytes.len() {
            break;
        }
        let fee_bytes = path_bytes.get(offset..offset + 3)?;
        let fee = u32::from_be_bytes([0, fee_bytes[0], fee_bytes[1], fee_bytes[2]]);
        if !SUPPORTED_V3_FEE_TIERS.contains(&fee) {
            return None;
        }
        fees.push(fee);
        offset += 3;
    }
    Some((tokens, fees))
}

fn decode_v3_exact_input(params: &[u8]) -> Option<(Vec<Address>, u128, u128, u64)> {
    let path_offset_word = read_word(params, 0)?;
    let path_offset_words = (word_to_u128(&path_offset_word) as usize) / 32;
    let recipient_word = read_word(params, 1)?;
    let _recipient = word_to_evm_address(&recipient_word);
    let deadline = word_to_u128(&read_word(params, 2)?) as u64;
    let amount_in = word_to_u128(&read_word(params, 3)?);
    let min_amount_out = word_to_u128(&read_word(params, 4)?);

    let path_len_word = read_word(params, path_offset_words)?;
    let path_len_bytes = word_to_u128(&path_len_word) as usize;
    let path_bytes_start = (path_offset_words + 1) * 32;
    let path_bytes = params.get(path_bytes_start..path_bytes_start + path_len_bytes)?;
    let (tokens, _fees) = decode_v3_multi_hop_path(path_bytes)?;
    Some((tokens, amount_in, min_amount_out, deadline))
}

/// Decodes one raw EVM pending transaction against the V2/V3 selectors this
/// engine supports. `raw.raw` is `[4-byte selector][ABI-encoded params]`
/// with no leading transaction envelope — callers strip that before calling.
pub fn decode_evm_swap(
    raw: &RawPendingTx,
    chain: ChainId,
    from: Address,
    router: Address,
    protocol: Protocol,
    calldata: &[u8],
    gas_price: NativeAmount,
) -> Result<sandwich_types::PendingSwap, DecodeError> {
    if calldata.len() < 4 {
        return Err(DecodeError::UnknownSelector);
    }
    let selector = [calldata[0], calldata[1], calldata[2], calldata[3]];
    let params = &calldata[4..];

    let (token_in, token_out, path, amount_in, min_amount_out, deadline) =
        if selector == v2_selectors::SWAP_EXACT_TOKENS_FOR_TOKENS
            || selector == v2_selectors::SWAP_EXACT_TOKENS_FOR_TOKENS_FEE_ON_TRANSFER
        {
            let decoded = decode_v2_params(params).ok_or(DecodeError::UnknownSelector)?;
            let token_in = *decoded.path.first().ok_or(DecodeError::UnknownSelector)?;
            let token_out = *decoded.path.last().ok_or(DecodeError::UnknownSelector)?;
            (
                token_in,
                token_out,
                decoded.path,
                decoded.amount_in,
                decoded.min_amount_out,
                decoded.deadline,
            )
        } else if selector == v3_selectors::EXACT_INPUT_SINGLE {
            let decoded = decode_v3_single_params(params).ok_or(DecodeError::UnknownSelector)?;
            if !SUPPORTED_V3_FEE_TIERS.contains(&decoded.fee) {
                return Err(DecodeError::UnsupportedFeeTier);
            }
            (
                decoded.token_in,
                decoded.token_out,
                vec![decoded.token_in, decoded.token_out],
                decoded.amount_in,
                decoded.min_amount_out,
                decoded.deadline,
            )
        } else if selector == v3_selectors::EXACT_INPUT {
            let (path, amount_in, min_amount_out, deadline) =
                decode_v3_exact_input(params).ok_or(DecodeError::UnsupportedFeeTier)?;
            let token_in = *path.first().ok_or(DecodeError::UnknownSelector)?;
            let token_out = *path.last().ok_or(DecodeError::UnknownSelector)?;
            (token_in, token_out, path, amount_in, min_amount_out, deadline)
        } else {
            return Err(DecodeError::UnknownSelector);
        };

    let swap = sandwich_types::PendingSwap {
        tx_hash: raw.tx_hash,
        chain,
        from,
        router,
        protocol,
        token_in,
        token_out,
        amount_in: NativeAmount::new(amount_in as i128),
        min_amount_out: NativeAmount::new(min_amount_out as i128),
        path,
        deadline,
        observed_at: raw.observed_at,
        gas_price,
        raw: raw.raw.clone(),
    };
    swap.validate()?;
    Ok(swap)
}

/// Solana swap instructions this engine understands, keyed by leading
/// discriminant byte of the instruction data. Raydium/Orca AMM "swap"
/// instructions share this shape: `[tag:1][amount_in:8 LE][min_out:8 LE]`.
/// Full account-metadata decoding (pool/vault resolution) happens downstream
/// against the pool cache, not here.
pub const SOLANA_SWAP_TAG: u8 = 9;

/// Encodes a Raydium/Orca-shaped swap instruction: a one-byte discriminator
/// followed by `amount_in`/`minimum_amount_out` as little-endian `u64`s. The
/// inverse of [`decode_solana_swap`]'s reading of the same wire shape.
pub fn encode_solana_swap_instruction(amount_in: u64, min_amount_out: u64) -> Vec<u8> {
    let mut data = Vec::with_capacity(17);
    data.push(SOLANA_SWAP_TAG);
    data.extend_from_slice(&amount_in.to_le_bytes());
    data.extend_from_slice(&min_amount_out.to_le_bytes());
    data
}

pub fn decode_solana_swap(
    raw: &RawPendingTx,
    from: Address,
    program_id: SolanaAddress,
    protocol: Protocol,
    instruction_data: &[u8],
    token_in: Address,
    token_out: Address,
    gas_price: NativeAmount,
) -> Result<sandwich_types::PendingSwap, DecodeError> {
    if instruction_data.len() < 17 || instruction_data[0] != SOLANA_SWAP_TAG {
        return Err(DecodeError::UnknownSelector);
    }
    let amount_in = u64::from_le_bytes(instruction_data[1..9].try_into().unwrap());
    let min_amount_out = u64::from_le_bytes(instruction_data[9..17].try_into().unwrap());

    let swap = sandwich_types::PendingSwap {
        tx_hash: raw.tx_hash,
        chain: ChainId::Solana,
        from,
        router: Address::Solana(program_id),
        protocol,
        token_in,
        token_out,
        amount_in: NativeAmount::new(amount_in as i128),
        min_amount_out: NativeAmount::new(min_amount_out as i128),
        path: vec![token_in, token_out],
        deadline: 0,
        observed_at: raw.observed_at,
        gas_price,
        raw: raw.raw.clone(),
    };
    swap.validate()?;
    Ok(swap)
}

/// Bounded queue that drops the oldest entry on overflow rather than
/// blocking the producer — the backpressure policy for a slow detector.
pub struct DropOldestQueue<T> {
    capacity: usize,
    inner: Mutex<VecDeque<T>>,
    notify: Notify,
    dropped: AtomicU64,
}

impl<T> DropOldestQueue<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            inner: Mutex::new(VecDeque::with_capacity(capacity)),
            notify: Notify::new(),
            dropped: AtomicU64::new(0),
        }
    }

    pub async fn push(&self, item: T) {
        let mut guard = self.inner.lock().await;
        if guard.len() >= self.capacity {
            guard.pop_front();
            self.dropped.fetch_add(1, Ordering::Relaxed);
        }
        guard.push_back(item);
        drop(guard);
        self.notify.notify_one();
    }

    pub async fn recv(&self) -> T {
        loop {
            {
                let mut guard = self.inner.lock().await;
                if let Some(item) = guard.pop_front() {
                    return item;
                }
            }
            self.notify.notified().await;
        }
    }

    pub fn dropped_count(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

pub type PendingSwapQueue = Arc<DropOldestQueue<sandwich_types::PendingSwap>>;

pub fn new_queue(capacity: usize) -> PendingSwapQueue {
    Arc::new(DropOldestQueue::new(capacity))
}

/// Counts why raw pending txs were dropped before reaching the queue, for
/// the "unknown selectors are dropped silently but counted" requirement.
#[derive(Debug, Default)]
pub struct IngestionMetrics {
    pub decoded: AtomicU64,
    pub unknown_selector: AtomicU64,
    pub unsupported_fee_tier: AtomicU64,
    pub malformed_path: AtomicU64,
    pub duplicate: AtomicU64,
}

/// Decodes one raw pending tx against `registry`, applies hash dedup, and
/// pushes the result onto `queue`. Intended to run inside a per-chain task
/// fed by `ChainAdapter::subscribe_pending_txs`.
pub async fn ingest_one(
    raw: RawPendingTx,
    chain: ChainId,
    dedup: &mut PendingTxDedup,
    decode: impl FnOnce(&RawPendingTx) -> Result<sandwich_types::PendingSwap, DecodeError>,
    queue: &PendingSwapQueue,
    metrics: &IngestionMetrics,
) {
    if !dedup.observe(raw.tx_hash) {
        metrics.duplicate.fetch_add(1, Ordering::Relaxed);
        trace!(?chain, "duplicate pending tx dropped");
        return;
    }
    match decode(&raw) {
        Ok(swap) => {
            metrics.decoded.fetch_add(1, Ordering::Relaxed);
            queue.push(swap).await;
        }
        Err(DecodeError::UnknownSelector) => {
            metrics.unknown_selector.fetch_add(1, Ordering::Relaxed);
        }
        Err(DecodeError::UnsupportedFeeTier) => {
            metrics.unsupported_fee_tier.fetch_add(1, Ordering::Relaxed);
        }
        Err(DecodeError::MalformedPath(e)) => {
            metrics.malformed_path.fetch_add(1, Ordering::Relaxed);
            debug!(?chain, error = %e, "malformed swap path dropped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sandwich_types::TxHash;

    fn word_u128(value: u128) -> [u8; 32] {
        let mut word = [0u8; 32];
        word[16..32].copy_from_slice(&value.to_be_bytes());
        word
    }

    fn word_address(byte: u8) -> [u8; 32] {
        let mut word = [0u8; 32];
        word[12..32].copy_from_slice(&[byte; 20]);
        word
    }

    fn build_v2_calldata(amount_in: u128, min_out: u128, path_tokens: &[u8], deadline: u64) -> Vec<u8> {
        let mut data = v2_selectors::SWAP_EXACT_TOKENS_FOR_TOKENS.to_vec();
        data.extend_from_slice(&word_u128(amount_in));
        data.extend_from_slice(&word_u128(min_out));
        data.extend_from_slice(&word_u128(160)); // offset to path, relative to params start
        data.extend_from_slice(&word_address(0xAA)); // to
        data.extend_from_slice(&word_u128(deadline as u128));
        data.extend_from_slice(&word_u128(path_tokens.len() as u128)); // path.length
        for &b in path_tokens {
            data.extend_from_slice(&word_address(b));
        }
        data
    }

    fn raw_tx(calldata: Vec<u8>) -> RawPendingTx {
        RawPendingTx {
            tx_hash: TxId::Evm(TxHash::new([1; 32])),
            raw: calldata.clone(),
            observed_at: 1,
        }
    }

    #[test]
    fn decodes_v2_swap_exact_tokens_for_tokens() {
        let calldata = build_v2_calldata(10_000_000_000_000_000_000, 19_500_000_000, &[1, 2], 1_700_000_000);
        let raw = raw_tx(calldata.clone());
        let swap = decode_evm_swap(
            &raw,
            ChainId::Ethereum,
            Address::Evm(EvmAddress::new([0xAA; 20])),
            Address::Evm(EvmAddress::new([0xBB; 20])),
            Protocol::UniswapV2,
            &calldata,
            NativeAmount::new(30_000_000_000),
        )
        .unwrap();
        assert_eq!(swap.amount_in, NativeAmount::new(10_000_000_000_000_000_000));
        assert_eq!(swap.path.len(), 2);
    }

    #[test]
    fn unknown_selector_is_rejected_not_panicked() {
        let calldata = vec![0xde, 0xad, 0xbe, 0xef, 0x00];
        let raw = raw_tx(calldata.clone());
        let err = decode_evm_swap(
            &raw,
            ChainId::Ethereum,
            Address::Evm(EvmAddress::new([0xAA; 20])),
            Address::Evm(EvmAddress::new([0xBB; 20])),
            Protocol::UniswapV2,
            &calldata,
            NativeAmount::new(30_000_000_000),
        )
        .unwrap_err();
        assert!(matches!(err, DecodeError::UnknownSelector));
    }

    #[test]
    fn v3_single_rejects_unsupported_fee_tier() {
        let mut data = v3_selectors::EXACT_INPUT_SINGLE.to_vec();
        data.extend_from_slice(&word_address(1)); // token_in
        data.extend_from_slice(&word_address(2)); // token_out
        data.extend_from_slice(&word_u128(1234)); // unsupported fee
        data.extend_from_slice(&word_address(0xAA)); // recipient
        data.extend_from_slice(&word_u128(1_700_000_000)); // deadline
        data.extend_from_slice(&word_u128(1_000_000_000_000_000_000)); // amountIn
        data.extend_from_slice(&word_u128(1_900_000_000)); // amountOutMinimum
        data.extend_from_slice(&word_u128(0)); // sqrtPriceLimitX96
        let raw = raw_tx(data.clone());
        let err = decode_evm_swap(
            &raw,
            ChainId::Ethereum,
            Address::Evm(EvmAddress::new([0xAA; 20])),
            Address::Evm(EvmAddress::new([0xBB; 20])),
            Protocol::UniswapV3,
            &data,
            NativeAmount::new(30_000_000_000),
        )
        .unwrap_err();
        assert!(matches!(err, DecodeError::UnsupportedFeeTier));
    }

    #[tokio::test]
    async fn queue_drops_oldest_on_overflow() {
        let queue: DropOldestQueue<u32> = DropOldestQueue::new(2);
        queue.push(1).await;
        queue.push(2).await;
        queue.push(3).await;
        assert_eq!(queue.dropped_count(), 1);
        assert_eq!(queue.recv().await, 2);
        assert_eq!(queue.recv().await, 3);
    }
}
