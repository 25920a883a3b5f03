//! bloXroute / NodeReal private relay transport for BSC. Both relays speak
//! a similar auth-header-gated JSON-RPC shape, so one struct serves either,
//! distinguished only by `RelayName` and endpoint URL.
//!
//! Public-mempool fallback is gated behind `allow_public_fallback` (default
//! `false`) and, unlike the private relays, cannot submit the bundle
//! atomically — each leg lands as an independent public transaction, which
//! the wiring only does when no private relay is configured.

use super::{RelayTransport, RelaySubmissionAttempt};
use crate::chain::ChainAdapter;
use crate::errors::SubmitError;
use sandwich_types::{Bundle, RelayName};
use serde_json::json;
use std::sync::Arc;

pub struct BloxrouteRelay {
    http: reqwest::Client,
    relay_url: String,
    auth_header: Option<String>,
    relay_name: RelayName,
}

impl BloxrouteRelay {
    pub fn new(relay_name: RelayName, relay_url: String, auth_header: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            relay_url,
            auth_header,
            relay_name,
        }
    }
}

#[async_trait::async_trait]
impl RelayTransport for BloxrouteRelay {
    fn relay_name(&self) -> RelayName {
        self.relay_name.clone()
    }

    async fn try_submit(&self, bundle: &Bundle) -> Result<RelaySubmissionAttempt, SubmitError> {
        let txs: Vec<String> = [&bundle.txs.front_run, &bundle.txs.victim, &bundle.txs.back_run]
            .iter()
            .map(|leg| format!("0x{}", hex::encode(&leg.raw)))
            .collect();

        let body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "blxr_submit_bundle",
            "params": {
                "transaction": txs,
                "block_number": format!("0x{:x}", bundle.target_block_or_slot.0),
            },
        });

        let mut request = self.http.post(&self.relay_url).json(&body);
        if let Some(auth) = &self.auth_header {
            request = request.header("Authorization", auth);
        }

        let response = request.send().await.map_err(|e| SubmitError::Transient(e.to_string()))?;
        let status = response.status();
        if status.is_server_error() || status.as_u16() == 429 {
            return Err(SubmitError::Transient(format!("relay returned {status}")));
        }
        if !status.is_success() {
            return Err(SubmitError::Rejected(format!("relay returned {status}")));
        }

        let parsed: serde_json::Value = response.json().await.map_err(|e| SubmitError::Transient(e.to_string()))?;
        if let Some(error) = parsed.get("error") {
            return Err(SubmitError::Rejected(error.to_string()));
        }
        let request_id = parsed
            .get("result")
            .and_then(|r| r.get("bundleHash").or_else(|| r.as_str().map(|_| r)))
            .map(|v| v.to_string())
            .unwrap_or_else(|| "unknown".to_string());

        Ok(RelaySubmissionAttempt { request_id })
    }
}

/// Submits each leg independently to the public mempool when no private
/// relay is configured and `allow_public_fallback = true`. Not atomic: a
/// competing searcher can land between the front-run and back-run legs.
pub struct PublicMempoolFallback {
    adapter: Arc<dyn ChainAdapter>,
}

impl PublicMempoolFallback {
    pub fn new(adapter: Arc<dyn ChainAdapter>) -> Self {
        Self { adapter }
    }
}

#[async_trait::async_trait]
impl RelayTransport for PublicMempoolFallback {
    fn relay_name(&self) -> RelayName {
        RelayName::Bloxroute
    }

    async fn try_submit(&self, bundle: &Bundle) -> Result<RelaySubmissionAttempt, SubmitError> {
        for leg in [&bundle.txs.front_run, &bundle.txs.victim, &bundle.txs.back_run] {
            self.adapter
                .send_raw_tx(leg.raw.clone())
                .await
                .map_err(|e| SubmitError::Transient(e.to_string()))?;
        }
        Ok(RelaySubmissionAttempt {
            request_id: format!("public:{:?}", bundle.id),
        })
    }
}
