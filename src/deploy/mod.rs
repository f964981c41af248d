// ABOUTME: Deployment orchestration across all managed services of an environment.
// ABOUTME: Exports the orchestrator, rollout seam, and per-service outcomes.

mod error;
mod orchestrator;
mod outcome;
mod palette;
mod rollout;
mod worker;

pub use error::DeployError;
pub use orchestrator::{DeploymentOrchestrator, DeploymentRequest};
pub use outcome::{DeploymentResult, RolloutOutcome, RolloutStatus};
pub use palette::{PALETTE, color_for, service_label};
pub use rollout::{RolloutError, RolloutExecutor, RolloutTarget};
