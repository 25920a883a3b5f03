//! Jito bundle transport for Solana: selects a tip account from
//! `getTipAccounts`, submits the three legs as one atomic bundle with the
//! victim's signed transaction placed between the front-run and back-run,
//! exactly as [`crate::bundle::BundleBuilder`] already orders them.

use super::{RelayTransport, RelaySubmissionAttempt};
use crate::errors::SubmitError;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use sandwich_types::{Bundle, RelayName};
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::RwLock;

pub struct JitoRelay {
    http: reqwest::Client,
    block_engine_url: String,
    tip_accounts: RwLock<Vec<String>>,
    round_robin: AtomicUsize,
}

impl JitoRelay {
    pub fn new(block_engine_url: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            block_engine_url,
            tip_accounts: RwLock::new(Vec::new()),
            round_robin: AtomicUsize::new(0),
        }
    }

    async fn json_rpc(&self, method: &str, params: serde_json::Value) -> Result<serde_json::Value, SubmitError> {
        let body = serde_json::json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params,
        });
        let response = self
            .http
            .post(&self.block_engine_url)
            .json(&body)
            .send()
            .await
            .map_err(|e| SubmitError::Transient(e.to_string()))?;
        let status = response.status();
        if status.is_server_error() || status.as_u16() == 429 {
            return Err(SubmitError::Transient(format!("block engine returned {status}")));
        }
        let parsed: serde_json::Value = response.json().await.map_err(|e| SubmitError::Transient(e.to_string()))?;
        if let Some(error) = parsed.get("error") {
            return Err(SubmitError::Rejected(error.to_string()));
        }
        parsed
            .get("result")
            .cloned()
            .ok_or_else(|| SubmitError::Rejected("missing result".to_string()))
    }

    /// Refreshes the cached tip-account list if empty. The block engine
    /// rotates these periodically; callers that need freshness should clear
    /// the cache on a timer rather than call this every submission.
    async fn ensure_tip_accounts(&self) -> Result<(), SubmitError> {
        if !self.tip_accounts.read().await.is_empty() {
            return Ok(());
        }
        let result = self.json_rpc("getTipAccounts", serde_json::json!([])).await?;
        let accounts: Vec<String> = serde_json::from_value(result)
            .map_err(|e| SubmitError::Rejected(format!("malformed getTipAccounts response: {e}")))?;
        if accounts.is_empty() {
            return Err(SubmitError::Rejected("no tip accounts returned".to_string()));
        }
        *self.tip_accounts.write().await = accounts;
        Ok(())
    }

    /// Picks a tip account. Without per-validator leader-schedule data to
    /// rank "tip-best" by historical acceptance, this round-robins across
    /// the accounts the block engine returns.
    async fn pick_tip_account(&self) -> Result<String, SubmitError> {
        self.ensure_tip_accounts().await?;
        let accounts = self.tip_accounts.read().await;
        let idx = self.round_robin.fetch_add(1, Ordering::Relaxed) % accounts.len();
        Ok(accounts[idx].clone())
    }
}

#[async_trait::async_trait]
impl RelayTransport for JitoRelay {
    fn relay_name(&self) -> RelayName {
        RelayName::Jito
    }

    async fn try_submit(&self, bundle: &Bundle) -> Result<RelaySubmissionAttempt, SubmitError> {
        let _tip_account = self.pick_tip_account().await?;

        let encoded: Vec<String> = [&bundle.txs.front_run, &bundle.txs.victim, &bundle.txs.back_run]
            .iter()
            .map(|leg| BASE64.encode(&leg.raw))
            .collect();

        let result = self
            .json_rpc("sendBundle", serde_json::json!([encoded, { "encoding": "base64" }]))
            .await?;

        let bundle_id = result
            .as_str()
            .map(|s| s.to_string())
            .unwrap_or_else(|| result.to_string());

        Ok(RelaySubmissionAttempt { request_id: bundle_id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn tip_account_selection_round_robins() {
        let relay = JitoRelay::new("http://127.0.0.1:0".to_string());
        *relay.tip_accounts.write().await = vec!["a".to_string(), "b".to_string()];
        let first = relay.pick_tip_account().await.unwrap();
        let second = relay.pick_tip_account().await.unwrap();
        assert_ne!(first, second);
    }
}
