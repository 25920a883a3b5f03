//! `RelaySubmission`: one attempt to land a bundle through a specific relay.
//! A `Bundle` may have many submissions across retries and multi-relay racing.

use crate::identifiers::{BundleId, SubmissionId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelayName {
    Flashbots,
    Bloxroute,
    NodeReal,
    Jito,
}

impl std::fmt::Display for RelayName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RelayName::Flashbots => "flashbots",
            RelayName::Bloxroute => "bloxroute",
            RelayName::NodeReal => "nodereal",
            RelayName::Jito => "jito",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelaySubmission {
    pub id: SubmissionId,
    pub bundle_id: BundleId,
    pub relay_name: RelayName,
    pub request_id: String,
    /// 1-based attempt number for this relay (retries increment it).
    pub attempt: u32,
    pub latency_ms: u64,
    pub error: Option<String>,
}

impl RelaySubmission {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn submission_without_error_succeeded() {
        let sub = RelaySubmission {
            id: SubmissionId::new(),
            bundle_id: BundleId::new(),
            relay_name: RelayName::Flashbots,
            request_id: "req-1".into(),
            attempt: 1,
            latency_ms: 120,
            error: None,
        };
        assert!(sub.succeeded());
    }

    #[test]
    fn submission_with_error_did_not_succeed() {
        let sub = RelaySubmission {
            id: SubmissionId::new(),
            bundle_id: BundleId::new(),
            relay_name: RelayName::Flashbots,
            request_id: "req-1".into(),
            attempt: 1,
            latency_ms: 50,
            error: Some("503".into()),
        };
        assert!(!sub.succeeded());
    }
}
