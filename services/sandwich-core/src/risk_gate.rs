//! Risk Gate interface: called after detection, before build. A `Reduce`
//! verdict is honored by re-simulating at the reduced amount rather than
//! building the opportunity as originally sized.

use async_trait::async_trait;
use sandwich_types::{NativeAmount, Opportunity};

#[derive(Debug, Clone, PartialEq)]
pub enum RiskVerdict {
    Approve,
    Reject { reason: String },
    Reduce { max_front_run_amount: NativeAmount },
}

#[async_trait]
pub trait RiskGate: Send + Sync {
    async fn evaluate(&self, opportunity: &Opportunity) -> RiskVerdict;
}

/// Approve-all test double. Never wired into the default binary — a real
/// deployment always supplies an external risk gate.
pub struct NullRiskGate;

#[async_trait]
impl RiskGate for NullRiskGate {
    async fn evaluate(&self, _opportunity: &Opportunity) -> RiskVerdict {
        RiskVerdict::Approve
    }
}
