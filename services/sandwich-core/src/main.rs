//! Binary entrypoint: loads configuration, wires a [`chain::ChainAdapter`],
//! relay transport set, and detection/build/submit/monitor pipeline per
//! configured chain, and runs them concurrently until shutdown.

use anyhow::{Context, Result};
use async_trait::async_trait;
use clap::Parser;
use sandwich_config::schema::{ChainConfig, RelayEndpoint, SandwichConfig};
use sandwich_core::chain::bsc::BscAdapter;
use sandwich_core::chain::ethereum::EthereumAdapter;
use sandwich_core::chain::solana::SolanaAdapter;
use sandwich_core::chain::{ChainAdapter, PendingTxDedup, RawPendingTx};
use sandwich_core::errors::{ChainError, CoreError, SubmitError};
use sandwich_core::mempool::{self, IngestionMetrics, RouterRegistry};
use sandwich_core::pool_cache::{PoolCache, PoolCacheError, PoolFetcher};
use sandwich_core::relay::bloxroute::{BloxrouteRelay, PublicMempoolFallback};
use sandwich_core::relay::flashbots::FlashbotsRelay;
use sandwich_core::relay::jito::JitoRelay;
use sandwich_core::relay::{submit_multi_relay, RelayTransport};
use sandwich_core::risk_gate::{NullRiskGate, RiskGate, RiskVerdict};
use sandwich_core::signer::{Signer, SignerError, UnsignedTx};
use sandwich_core::{
    back_run_min_amount_out, BlockPoolArbiter, BundleBuilder, BundleMonitor, CoreEvent, Detector,
    DetectorConfig, LegCalldata, PerformanceOptimizer, PoolResolver, ReceiptFetcher, Stage,
    StageTimer,
};
use sandwich_types::{
    Address, Bundle, ChainId, EvmAddress, NativeAmount, Pool, PoolKey, Protocol, RelayName,
    TokenKey, TokenMeta, UsdFixedPoint8,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(name = "sandwich-core")]
#[command(about = "Multi-chain MEV sandwich engine")]
struct Args {
    /// Configuration file path (TOML).
    #[arg(short, long, default_value = "config/sandwich.toml")]
    config: PathBuf,
}

/// Calls out to an external signing service over HTTP so this process never
/// holds raw key material — the `SIGNER_ENDPOINT` env var this crate's
/// config loader already documents as a secret the TOML file never carries.
struct RemoteSigner {
    http: reqwest::Client,
    endpoint: String,
}

impl RemoteSigner {
    fn new(endpoint: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint,
        }
    }

    async fn post(&self, path: &str, body: serde_json::Value) -> Result<Vec<u8>, SignerError> {
        let response = self
            .http
            .post(format!("{}/{}", self.endpoint.trim_end_matches('/'), path))
            .json(&body)
            .send()
            .await
            .map_err(|e| SignerError(e.to_string()))?;
        if !response.status().is_success() {
            return Err(SignerError(format!("signer returned {}", response.status())));
        }
        let parsed: serde_json::Value = response.json().await.map_err(|e| SignerError(e.to_string()))?;
        let hex_bytes = parsed
            .get("signed")
            .and_then(|v| v.as_str())
            .ok_or_else(|| SignerError("signer response missing `signed` field".to_string()))?;
        hex::decode(hex_bytes.trim_start_matches("0x")).map_err(|e| SignerError(e.to_string()))
    }
}

#[async_trait]
impl Signer for RemoteSigner {
    async fn sign(&self, unsigned: UnsignedTx) -> Result<Vec<u8>, SignerError> {
        self.post(
            "sign",
            serde_json::json!({
                "chain": format!("{:?}", unsigned.chain),
                "to": unsigned.to.to_string(),
                "data": format!("0x{}", hex::encode(&unsigned.data)),
                "value": unsigned.value.raw().to_string(),
                "gas_limit": unsigned.gas_limit,
                "max_fee_per_gas": unsigned.max_fee_per_gas,
                "max_priority_fee_per_gas": unsigned.max_priority_fee_per_gas,
                "nonce": unsigned.nonce,
            }),
        )
        .await
    }

    async fn sign_message(&self, message: &[u8]) -> Result<Vec<u8>, SignerError> {
        self.post(
            "sign_message",
            serde_json::json!({ "message": format!("0x{}", hex::encode(message)) }),
        )
        .await
    }
}

/// Calls out to an external risk-management service. Unlike the signer,
/// a missing risk gate doesn't put funds in custody at risk — it only skips
/// the extra approve/reject/reduce check — so the binary falls back to
/// [`NullRiskGate`] with a warning rather than refusing to start.
struct RemoteRiskGate {
    http: reqwest::Client,
    endpoint: String,
}

#[async_trait]
impl RiskGate for RemoteRiskGate {
    async fn evaluate(&self, opportunity: &sandwich_types::Opportunity) -> RiskVerdict {
        let body = serde_json::json!({
            "opportunity_id": opportunity.id.to_string(),
            "chain": format!("{:?}", opportunity.victim.chain),
            "estimated_profit_native": opportunity.estimated_profit_native.raw().to_string(),
            "front_run_amount": opportunity.front_run_amount.raw().to_string(),
        });
        let response = self.http.post(format!("{}/evaluate", self.endpoint.trim_end_matches('/'))).json(&body).send().await;
        match response {
            Ok(resp) if resp.status().is_success() => match resp.json::<serde_json::Value>().await {
                Ok(value) => match value.get("verdict").and_then(|v| v.as_str()) {
                    Some("reject") => RiskVerdict::Reject {
                        reason: value.get("reason").and_then(|v| v.as_str()).unwrap_or("rejected").to_string(),
                    },
                    Some("reduce") => {
                        let amount = value.get("max_front_run_amount").and_then(|v| v.as_str()).and_then(|s| s.parse::<i128>().ok()).unwrap_or(0);
                        RiskVerdict::Reduce { max_front_run_amount: NativeAmount::new(amount) }
                    }
                    _ => RiskVerdict::Approve,
                },
                Err(e) => {
                    warn!(error = %e, "risk gate response unparseable, defaulting to reject");
                    RiskVerdict::Reject { reason: "risk gate response unparseable".to_string() }
                }
            },
            _ => RiskVerdict::Reject { reason: "risk gate unreachable".to_string() },
        }
    }
}

/// Decodes an EVM router ABI's `getReserves()` return (two right-aligned
/// `uint112` reserves packed into the first two 32-byte words) into a
/// [`Pool`]. Real factory/fee-tier metadata lookups are a further chain-RPC
/// round trip this binary does not yet make; `fee_bps` defaults to the
/// common 30bps V2 fee.
struct EvmPoolFetcher {
    adapter: Arc<dyn ChainAdapter>,
    token_a: Address,
    token_b: Address,
}

#[async_trait]
impl PoolFetcher for EvmPoolFetcher {
    async fn fetch_pool(&self, key: PoolKey) -> Result<Pool, PoolCacheError> {
        let raw = self
            .adapter
            .get_pool_state(key.pool_id)
            .await
            .map_err(|e| PoolCacheError::FetchFailed(e.to_string()))?;
        let hex_str = String::from_utf8_lossy(&raw);
        let hex_digits = hex_str.trim_matches('"').trim_start_matches("0x");
        let bytes = hex::decode(hex_digits).unwrap_or_default();
        let reserve_a = bytes.get(16..32).map(|w| u128::from_be_bytes(w.try_into().unwrap())).unwrap_or(0);
        let reserve_b = bytes.get(48..64).map(|w| u128::from_be_bytes(w.try_into().unwrap())).unwrap_or(0);

        Ok(Pool {
            key,
            token_a: self.token_a,
            token_b: self.token_b,
            reserve_a: NativeAmount::new(reserve_a as i128),
            reserve_b: NativeAmount::new(reserve_b as i128),
            fee_bps: sandwich_types::Bps::new(30),
            last_refresh_ms: sandwich_network::time::fast_timestamp_ns() / 1_000_000,
            liquidity_usd_estimate: UsdFixedPoint8::ZERO,
            concentrated: None,
        })
    }

    async fn fetch_token_meta(&self, key: TokenKey) -> Result<TokenMeta, PoolCacheError> {
        // Token metadata (decimals, symbol, tax, blacklist) requires an ERC-20
        // `decimals()`/`symbol()` call plus an off-chain tax/blacklist feed;
        // a real deployment wires this from the token-safety collaborator
        // named in DESIGN.md. Assume a vanilla, untaxed, verified token here
        // so the pipeline remains exercisable end-to-end without one.
        Ok(TokenMeta {
            key,
            decimals: 18,
            symbol: "UNKNOWN".to_string(),
            verified: false,
            tax_buy_bps: sandwich_types::Bps::ZERO,
            tax_sell_bps: sandwich_types::Bps::ZERO,
            is_blacklisted: false,
        })
    }
}

/// No factory-lookup index is wired in this binary; operators populate one
/// from a pool-discovery side channel (see DESIGN.md). Until then the
/// resolver treats the victim's router address itself as the pool id, which
/// is correct only for routers that are themselves the pair contract.
struct NaivePoolResolver;

#[async_trait]
impl PoolResolver for NaivePoolResolver {
    async fn resolve_pool_id(&self, _chain: ChainId, _protocol: Protocol, token_a: Address, _token_b: Address) -> Option<Address> {
        Some(token_a)
    }
}

/// Realized profit from the reserve delta a landed bundle leaves behind is a
/// further chain read this binary does not yet make; approximates it as the
/// opportunity's pre-trade estimate so the monitor's landed path is
/// exercisable without a receipt-log collaborator.
struct EstimateReceiptFetcher;

#[async_trait]
impl ReceiptFetcher for EstimateReceiptFetcher {
    async fn realized_profit(&self, bundle: &Bundle) -> Result<(NativeAmount, UsdFixedPoint8, u64), ChainError> {
        Ok((bundle.tip_amount, UsdFixedPoint8::ZERO, 0))
    }
}

const V2_SWAP_EXACT_TOKENS_FOR_TOKENS_SELECTOR: [u8; 4] = [0x38, 0xed, 0x17, 0x39];

/// Encodes a V2 router `swapExactTokensForTokens` call. The inverse of
/// [`mempool::decode_v2_params`]'s reading of the same ABI shape.
fn encode_v2_swap(amount_in: u128, min_amount_out: u128, path: &[Address], recipient: Address, deadline: u64) -> Vec<u8> {
    let mut data = V2_SWAP_EXACT_TOKENS_FOR_TOKENS_SELECTOR.to_vec();
    let word_u128 = |v: u128| {
        let mut w = [0u8; 32];
        w[16..32].copy_from_slice(&v.to_be_bytes());
        w
    };
    let word_addr = |a: &Address| {
        let mut w = [0u8; 32];
        if let Address::Evm(evm) = a {
            w[12..32].copy_from_slice(evm.as_bytes());
        }
        w
    };
    data.extend_from_slice(&word_u128(amount_in));
    data.extend_from_slice(&word_u128(min_amount_out));
    data.extend_from_slice(&word_u128(160)); // path offset, fixed given the 5 leading params
    data.extend_from_slice(&word_addr(&recipient));
    data.extend_from_slice(&word_u128(deadline as u128));
    data.extend_from_slice(&word_u128(path.len() as u128));
    for token in path {
        data.extend_from_slice(&word_addr(token));
    }
    data
}

const V3_EXACT_INPUT_SINGLE_SELECTOR: [u8; 4] = [0x41, 0x4b, 0xf3, 0x89];

/// Encodes a V3 router `exactInputSingle` call: `(tokenIn, tokenOut, fee,
/// recipient, deadline, amountIn, amountOutMinimum, sqrtPriceLimitX96)`. The
/// inverse of [`mempool::decode_v3_single_params`]'s reading of the same ABI
/// shape; `sqrtPriceLimitX96` is left at `0` (no limit).
#[allow(clippy::too_many_arguments)]
fn encode_v3_swap(
    token_in: Address,
    token_out: Address,
    fee_pips: u32,
    recipient: Address,
    deadline: u64,
    amount_in: u128,
    min_amount_out: u128,
) -> Vec<u8> {
    let mut data = V3_EXACT_INPUT_SINGLE_SELECTOR.to_vec();
    let word_u128 = |v: u128| {
        let mut w = [0u8; 32];
        w[16..32].copy_from_slice(&v.to_be_bytes());
        w
    };
    let word_addr = |a: &Address| {
        let mut w = [0u8; 32];
        if let Address::Evm(evm) = a {
            w[12..32].copy_from_slice(evm.as_bytes());
        }
        w
    };
    data.extend_from_slice(&word_addr(&token_in));
    data.extend_from_slice(&word_addr(&token_out));
    data.extend_from_slice(&word_u128(fee_pips as u128));
    data.extend_from_slice(&word_addr(&recipient));
    data.extend_from_slice(&word_u128(deadline as u128));
    data.extend_from_slice(&word_u128(amount_in));
    data.extend_from_slice(&word_u128(min_amount_out));
    data.extend_from_slice(&word_u128(0)); // sqrtPriceLimitX96: no limit
    data
}

fn build_adapter(chain: &ChainConfig) -> Arc<dyn ChainAdapter> {
    match chain.chain {
        ChainId::Ethereum => Arc::new(EthereumAdapter::new(chain.providers.clone())),
        ChainId::Bsc => Arc::new(BscAdapter::new(chain.providers.clone())),
        ChainId::Solana => Arc::new(SolanaAdapter::new(chain.providers.clone())),
    }
}

fn build_relays(chain: &ChainConfig, adapter: &Arc<dyn ChainAdapter>, reputation_signer: Arc<dyn Signer>, allow_public_fallback: bool) -> Vec<Box<dyn RelayTransport>> {
    let mut relays: Vec<Box<dyn RelayTransport>> = Vec::new();
    for endpoint in &chain.relay_endpoints {
        relays.push(build_relay(endpoint, reputation_signer.clone()));
    }
    if relays.is_empty() && allow_public_fallback {
        warn!(chain = ?chain.chain, "no private relay configured, falling back to public mempool (not atomic)");
        relays.push(Box::new(PublicMempoolFallback::new(adapter.clone())));
    }
    relays
}

fn build_relay(endpoint: &RelayEndpoint, reputation_signer: Arc<dyn Signer>) -> Box<dyn RelayTransport> {
    let auth_header = endpoint.auth_key_env.as_ref().and_then(|env| std::env::var(env).ok());
    match endpoint.relay {
        RelayName::Flashbots => Box::new(FlashbotsRelay::new(endpoint.url.clone(), reputation_signer)),
        RelayName::Bloxroute | RelayName::NodeReal => {
            Box::new(BloxrouteRelay::new(endpoint.relay.clone(), endpoint.url.clone(), auth_header))
        }
        RelayName::Jito => Box::new(JitoRelay::new(endpoint.url.clone())),
    }
}

#[allow(clippy::too_many_arguments)]
async fn run_chain(
    chain_cfg: ChainConfig,
    adapter: Arc<dyn ChainAdapter>,
    relays: Vec<Box<dyn RelayTransport>>,
    pool_cache: Arc<PoolCache>,
    arbiter: Arc<BlockPoolArbiter>,
    perf: Arc<PerformanceOptimizer>,
    signer: Arc<dyn Signer>,
    risk_gate: Arc<dyn RiskGate>,
    events_tx: tokio::sync::broadcast::Sender<CoreEvent>,
) {
    let chain = chain_cfg.chain;
    let detector = Arc::new(Detector::new(pool_cache.clone(), chain_cfg.max_front_run_fraction.0, arbiter));
    let detector_config = DetectorConfig::from_chain_config(&chain_cfg);
    let resolver = NaivePoolResolver;
    let receipts: Arc<dyn ReceiptFetcher> = Arc::new(EstimateReceiptFetcher);
    let monitor = Arc::new(BundleMonitor::new(adapter.clone(), receipts, chain_cfg.bundle_timeout_ms, 1));
    let relays = Arc::new(relays);

    let queue = mempool::new_queue(mempool::DEFAULT_QUEUE_CAPACITY);
    let metrics = Arc::new(IngestionMetrics::default());
    let registry = RouterRegistry::new();

    // Ingestion: decodes raw pending txs into the shared queue. The shared
    // adapters' `subscribe_pending_txs` returns an empty stream until a real
    // WebSocket subscription is wired in (see chain/ethereum.rs), so this
    // loop is a no-op today but is structurally ready for that wiring.
    let ingest_queue = queue.clone();
    let ingest_adapter = adapter.clone();
    let ingest_metrics = metrics.clone();
    let ingest_perf = perf.clone();
    tokio::spawn(async move {
        let mut dedup = PendingTxDedup::new(10_000);
        let stream = match ingest_adapter.subscribe_pending_txs().await {
            Ok(s) => s,
            Err(e) => {
                error!(?chain, error = %e, "failed to subscribe to pending tx feed");
                return;
            }
        };
        futures::pin_mut!(stream);
        use futures::StreamExt;
        while let Some(raw) = stream.next().await {
            let decode_timer = StageTimer::start(&ingest_perf, chain, Stage::IngestionDecode);
            ingest_one_for_chain(chain, raw, &mut dedup, &registry, &ingest_queue, &ingest_metrics).await;
            drop(decode_timer);
        }
    });

    info!(?chain, relay_count = relays.len(), "chain pipeline started");

    loop {
        let swap = queue.recv().await;

        let cache_timer = StageTimer::start(&perf, chain, Stage::CacheFetch);
        let fetcher = EvmPoolFetcher {
            adapter: adapter.clone(),
            token_a: swap.token_in,
            token_b: swap.token_out,
        };
        // Warms (and times) the same cache entry `detector.detect` below
        // will read; a cold miss here pays the real fetch cost, a hit is
        // near-free, so this measures actual cache-fetch latency either way.
        if let Some(pool_id) = resolver.resolve_pool_id(chain, swap.protocol, swap.token_in, swap.token_out).await {
            let _ = pool_cache
                .get_pool(PoolKey { chain, protocol: swap.protocol, pool_id }, &fetcher)
                .await;
        }
        drop(cache_timer);

        let gas_cost_native = NativeAmount::new((swap.gas_price.raw() as u128 * 300_000u128) as i128);

        let sim_timer = StageTimer::start(&perf, chain, Stage::Simulation);
        let opportunity = detector.detect(&swap, &resolver, &fetcher, &detector_config, gas_cost_native).await;
        drop(sim_timer);

        let opportunity = match opportunity {
            Ok(opp) => opp,
            Err(e) => {
                let reason = match &e {
                    sandwich_core::errors::DetectError::NoPool => sandwich_types::OpportunityRejectReason::NoPool,
                    sandwich_core::errors::DetectError::Rejected(reason) => reason.clone(),
                    sandwich_core::errors::DetectError::Simulation(_) => sandwich_types::OpportunityRejectReason::Unprofitable,
                };
                let _ = events_tx.send(CoreEvent::OpportunityRejected { victim_hash: swap.tx_hash, reason });
                tracing::debug!(?chain, error = %e, "swap did not yield a sandwich opportunity");
                continue;
            }
        };
        perf.record_opportunity(opportunity.pool);
        let _ = events_tx.send(CoreEvent::OpportunityDetected { opportunity: Box::new(opportunity.clone()) });

        let mut opportunity = opportunity;
        match risk_gate.evaluate(&opportunity).await {
            RiskVerdict::Approve => {}
            RiskVerdict::Reduce { max_front_run_amount } => {
                opportunity.front_run_amount = max_front_run_amount;
                opportunity.back_run_amount = max_front_run_amount;
            }
            RiskVerdict::Reject { reason } => {
                info!(?chain, %reason, "risk gate rejected opportunity");
                let _ = events_tx.send(CoreEvent::OpportunityRejected {
                    victim_hash: opportunity.victim.tx_hash,
                    reason: sandwich_types::OpportunityRejectReason::RiskGate,
                });
                continue;
            }
        }

        let build_timer = StageTimer::start(&perf, chain, Stage::Build);
        let base_fee = adapter.estimate_base_fee().await.map(|a| a.raw() as u64).unwrap_or(0);
        let bundle = build_bundle(&opportunity, &chain_cfg, signer.as_ref(), pool_cache.as_ref(), &fetcher, base_fee).await;
        drop(build_timer);

        let bundle = match bundle {
            Ok(b) => b,
            Err(e) => {
                warn!(?chain, error = %e, "bundle build failed");
                continue;
            }
        };

        let submit_timer = StageTimer::start(&perf, chain, Stage::Submit);
        let submission = submit_multi_relay(&relays, &bundle, Duration::from_millis(sandwich_config::service::timeouts::SUBMISSION_TIMEOUT_MS_EVM)).await;
        drop(submit_timer);

        perf.check_end_to_end_latency(chain, &events_tx);

        match submission {
            Ok(result) => {
                let _ = events_tx.send(CoreEvent::BundleSubmitted {
                    bundle_id: bundle.id,
                    relay: result.relay_name,
                    attempt: result.attempt,
                    latency_ms: result.latency_ms,
                });
                let mut submitted_bundle = bundle;
                submitted_bundle.submitted_at = Some(sandwich_network::time::fast_timestamp_ns());
                let _ = submitted_bundle.transition(sandwich_types::BundleState::Submitted, submitted_bundle.submitted_at.unwrap());

                let monitor = monitor.clone();
                let events_tx = events_tx.clone();
                tokio::spawn(async move {
                    monitor.watch(submitted_bundle, &events_tx).await;
                });
            }
            Err(SubmitError::Rejected(reason)) => warn!(?chain, %reason, "all relays rejected bundle"),
            Err(e) => warn!(?chain, error = %e, "bundle submission failed"),
        }
    }
}

async fn ingest_one_for_chain(
    chain: ChainId,
    raw: RawPendingTx,
    dedup: &mut PendingTxDedup,
    registry: &RouterRegistry,
    queue: &mempool::PendingSwapQueue,
    metrics: &IngestionMetrics,
) {
    match chain {
        ChainId::Solana => {
            mempool::ingest_one(
                raw,
                chain,
                dedup,
                |r| {
                    // Wire format this ingestion point expects: a 32-byte
                    // program id, a 32-byte from, then the raw instruction data.
                    let program = r.raw.get(0..32).ok_or(sandwich_core::errors::DecodeError::UnknownSelector)?;
                    let from = r.raw.get(32..64).ok_or(sandwich_core::errors::DecodeError::UnknownSelector)?;
                    let instruction = r.raw.get(64..).unwrap_or(&[]);
                    let mut program_bytes = [0u8; 32];
                    program_bytes.copy_from_slice(program);
                    let mut from_bytes = [0u8; 32];
                    from_bytes.copy_from_slice(from);
                    let program_id = sandwich_types::SolanaAddress::new(program_bytes);
                    let protocol = registry.protocol_for(Address::Solana(program_id)).ok_or(sandwich_core::errors::DecodeError::UnknownSelector)?;
                    mempool::decode_solana_swap(
                        r,
                        Address::Solana(sandwich_types::SolanaAddress::new(from_bytes)),
                        program_id,
                        protocol,
                        instruction,
                        Address::Solana(program_id),
                        Address::Solana(program_id),
                        NativeAmount::ZERO,
                    )
                },
                queue,
                metrics,
            )
            .await;
        }
        ChainId::Ethereum | ChainId::Bsc => {
            mempool::ingest_one(
                raw,
                chain,
                dedup,
                |r| {
                    // Wire format this ingestion point expects: a 20-byte
                    // from, a 20-byte router (`to`), then the ABI calldata.
                    let from = r.raw.get(0..20).ok_or(sandwich_core::errors::DecodeError::UnknownSelector)?;
                    let router = r.raw.get(20..40).ok_or(sandwich_core::errors::DecodeError::UnknownSelector)?;
                    let calldata = r.raw.get(40..).unwrap_or(&[]);
                    let mut from_bytes = [0u8; 20];
                    from_bytes.copy_from_slice(from);
                    let mut router_bytes = [0u8; 20];
                    router_bytes.copy_from_slice(router);
                    let router_addr = Address::Evm(EvmAddress::new(router_bytes));
                    let protocol = registry.protocol_for(router_addr).ok_or(sandwich_core::errors::DecodeError::UnknownSelector)?;
                    mempool::decode_evm_swap(
                        r,
                        chain,
                        Address::Evm(EvmAddress::new(from_bytes)),
                        router_addr,
                        protocol,
                        calldata,
                        NativeAmount::ZERO,
                    )
                },
                queue,
                metrics,
            )
            .await;
        }
    }
}

async fn build_bundle(
    opportunity: &sandwich_types::Opportunity,
    chain_cfg: &ChainConfig,
    signer: &dyn Signer,
    pool_cache: &PoolCache,
    pool_fetcher: &dyn PoolFetcher,
    base_fee_or_gas_price: u64,
) -> Result<Bundle, sandwich_core::errors::BuildError> {
    sandwich_core::bundle::validate_leg_directions(
        opportunity.victim.token_in,
        opportunity.victim.token_in,
        opportunity.victim.token_out,
        opportunity.victim.token_in,
        opportunity.victim.token_out,
    )?;

    let max_slippage_bps = chain_cfg.max_tax_bps.0.max(100);
    let recipient = opportunity.victim.from;
    let back_run_min_out = back_run_min_amount_out(opportunity.back_run_amount, max_slippage_bps);

    let (front_run_data, back_run_data) = if opportunity.victim.chain == ChainId::Solana {
        (
            mempool::encode_solana_swap_instruction(opportunity.front_run_amount.raw() as u64, 0),
            mempool::encode_solana_swap_instruction(
                opportunity.back_run_amount.raw() as u64,
                back_run_min_out.raw() as u64,
            ),
        )
    } else if opportunity.pool.protocol.is_concentrated_liquidity() {
        let pool = pool_cache
            .get_pool(opportunity.pool, pool_fetcher)
            .await
            .map_err(|e| sandwich_core::errors::BuildError::SignerUnavailable(e.to_string()))?;
        let fee_pips = pool.fee_bps.0 * 100;
        (
            encode_v3_swap(
                opportunity.victim.token_in,
                opportunity.victim.token_out,
                fee_pips,
                recipient,
                opportunity.victim.deadline,
                opportunity.front_run_amount.raw() as u128,
                0,
            ),
            encode_v3_swap(
                opportunity.victim.token_out,
                opportunity.victim.token_in,
                fee_pips,
                recipient,
                opportunity.victim.deadline,
                opportunity.back_run_amount.raw() as u128,
                back_run_min_out.raw() as u128,
            ),
        )
    } else {
        (
            encode_v2_swap(
                opportunity.front_run_amount.raw() as u128,
                0,
                &[opportunity.victim.token_in, opportunity.victim.token_out],
                recipient,
                opportunity.victim.deadline,
            ),
            encode_v2_swap(
                opportunity.back_run_amount.raw() as u128,
                back_run_min_out.raw() as u128,
                &[opportunity.victim.token_out, opportunity.victim.token_in],
                recipient,
                opportunity.victim.deadline,
            ),
        )
    };

    BundleBuilder::new(opportunity, chain_cfg.gas_mode)
        .front_run_call(LegCalldata { router: opportunity.victim.router, data: front_run_data, value: NativeAmount::ZERO })
        .back_run_call(LegCalldata { router: opportunity.victim.router, data: back_run_data, value: NativeAmount::ZERO })
        .target_block_or_slot(opportunity.victim.deadline)
        .max_slippage_bps(max_slippage_bps)
        .build(signer, base_fee_or_gas_price, 0.0, 1_000_000)
        .await
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive("sandwich_core=info".parse().unwrap()))
        .init();
}

async fn run() -> Result<(), CoreError> {
    let args = Args::parse();
    info!(config = ?args.config, "loading configuration");

    let config: SandwichConfig = sandwich_config::load(&args.config).context("failed to load configuration").map_err(CoreError::Other)?;
    info!(chains = config.chains.len(), "configuration loaded");

    let signer_endpoint = std::env::var("SIGNER_ENDPOINT").map_err(|_| CoreError::SignerUnavailable)?;
    let signer: Arc<dyn Signer> = Arc::new(RemoteSigner::new(signer_endpoint));

    let risk_gate: Arc<dyn RiskGate> = match std::env::var("RISK_GATE_ENDPOINT") {
        Ok(endpoint) => Arc::new(RemoteRiskGate { http: reqwest::Client::new(), endpoint }),
        Err(_) => {
            warn!("RISK_GATE_ENDPOINT not set, running with NullRiskGate (approve-all)");
            Arc::new(NullRiskGate)
        }
    };

    let pool_cache = Arc::new(PoolCache::new(config.global.pool_cache_size_per_chain));
    let arbiter = Arc::new(BlockPoolArbiter::new());
    let perf = Arc::new(PerformanceOptimizer::new(32));
    let (events_tx, mut events_rx) = sandwich_core::channel();

    tokio::spawn(async move {
        while let Ok(event) = events_rx.recv().await {
            match event {
                CoreEvent::OutcomeLanded { bundle_id, realized_profit_native, .. } => {
                    info!(?bundle_id, %realized_profit_native, "bundle landed");
                }
                CoreEvent::OutcomeMissed { bundle_id, reason } => {
                    info!(?bundle_id, %reason, "bundle missed");
                }
                CoreEvent::LatencyAlert { chain, stage, latency_ms, threshold_ms } => {
                    warn!(?chain, stage, latency_ms, threshold_ms, "latency threshold exceeded");
                }
                _ => {}
            }
        }
    });

    let mut handles = Vec::new();
    for chain_cfg in config.chains.clone() {
        let adapter = build_adapter(&chain_cfg);
        let relays = build_relays(&chain_cfg, &adapter, signer.clone(), config.features.allow_public_fallback);
        let handle = tokio::spawn(run_chain(
            chain_cfg,
            adapter,
            relays,
            pool_cache.clone(),
            arbiter.clone(),
            perf.clone(),
            signer.clone(),
            risk_gate.clone(),
            events_tx.clone(),
        ));
        handles.push(handle);
    }

    for handle in handles {
        let _ = handle.await;
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    init_tracing();
    if let Err(e) = run().await {
        error!(error = %e, "sandwich-core exited with error");
        std::process::exit(e.exit_code());
    }
}
