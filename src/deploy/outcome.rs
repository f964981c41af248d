// ABOUTME: Per-service rollout outcomes and the aggregated deployment result.
// ABOUTME: A deployment succeeds only if every worker succeeded.

use crate::types::{ArtifactReference, ServiceId};
use crate::upload::UploadOutcome;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RolloutStatus {
    Succeeded,
    Failed { reason: String },
}

/// Terminal status of one worker, produced exactly once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RolloutOutcome {
    pub service: ServiceId,
    pub status: RolloutStatus,
}

impl RolloutOutcome {
    pub fn succeeded(service: ServiceId) -> Self {
        Self {
            service,
            status: RolloutStatus::Succeeded,
        }
    }

    pub fn failed(service: ServiceId, reason: impl Into<String>) -> Self {
        Self {
            service,
            status: RolloutStatus::Failed {
                reason: reason.into(),
            },
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == RolloutStatus::Succeeded
    }
}

/// Aggregated verdict of one `deploy` run.
#[derive(Debug, Clone)]
pub struct DeploymentResult {
    pub upload: UploadOutcome,
    /// One outcome per service, in topology order.
    pub outcomes: Vec<RolloutOutcome>,
}

impl DeploymentResult {
    pub fn artifact(&self) -> &ArtifactReference {
        self.upload.reference()
    }

    pub fn is_success(&self) -> bool {
        self.outcomes.iter().all(RolloutOutcome::is_success)
    }

    pub fn failures(&self) -> impl Iterator<Item = &RolloutOutcome> {
        self.outcomes.iter().filter(|o| !o.is_success())
    }
}
