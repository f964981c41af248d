// ABOUTME: Rollout execution primitive used by each per-service worker.
// ABOUTME: Drives one service to a new descriptor and waits for steady state.

use async_trait::async_trait;
use std::time::Duration;

use crate::config::EnvironmentContext;
use crate::descriptor::TaskDescriptor;
use crate::types::{ArtifactReference, ClusterName, ServiceId};

/// The service a worker rolls out, with immutable copies of its inputs.
#[derive(Debug, Clone)]
pub struct RolloutTarget {
    pub cluster: ClusterName,
    pub service: ServiceId,
    pub environment: EnvironmentContext,
    pub artifact: ArtifactReference,
}

/// Updates a service to `descriptor` and blocks until it settles or fails.
#[async_trait]
pub trait RolloutExecutor: Send + Sync {
    async fn roll_out(
        &self,
        target: &RolloutTarget,
        descriptor: &TaskDescriptor,
    ) -> Result<(), RolloutError>;
}

/// Errors from a single service rollout.
#[derive(Debug, thiserror::Error)]
pub enum RolloutError {
    #[error("could not register task definition: {0}")]
    Register(String),

    #[error("could not update service: {0}")]
    Update(String),

    #[error("deployment failed: {0}")]
    Failed(String),

    #[error("service did not reach steady state within {0:?}")]
    TimedOut(Duration),

    #[error("rollout backend error: {0}")]
    Backend(String),
}
