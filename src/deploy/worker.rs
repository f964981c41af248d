// ABOUTME: One concurrent rollout worker per managed service.
// ABOUTME: Generates the service's descriptor, then hands it to the rollout executor.

use colored::Color;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

use super::outcome::RolloutOutcome;
use super::palette::service_label;
use super::rollout::{RolloutExecutor, RolloutTarget};
use crate::descriptor::TaskDescriptorGenerator;
use crate::output::Output;

/// Owns clones of everything it touches so it can run on its own task.
pub(crate) struct RolloutWorker {
    pub(crate) target: RolloutTarget,
    pub(crate) env_sample: PathBuf,
    pub(crate) color: Color,
    pub(crate) generator: TaskDescriptorGenerator,
    pub(crate) executor: Arc<dyn RolloutExecutor>,
    pub(crate) output: Output,
}

impl RolloutWorker {
    /// Always yields exactly one outcome; errors become a failed outcome.
    pub(crate) async fn run(self) -> RolloutOutcome {
        let service = self.target.service.clone();
        let label = service_label(&service, self.color);

        self.output
            .progress(&format!("{label} Generating task definition"));
        let descriptor = match self
            .generator
            .generate(
                &service,
                &self.target.artifact,
                &self.env_sample,
                &self.target.environment,
            )
            .await
        {
            Ok(descriptor) => descriptor,
            Err(e) => {
                error!(%service, error = %e, "Task definition generation failed");
                self.output.error(&format!("{label} {e}"));
                return RolloutOutcome::failed(service, e.to_string());
            }
        };

        self.output.progress(&format!(
            "{label} Deploying {} to {}",
            self.target.artifact, self.target.cluster
        ));
        match self.executor.roll_out(&self.target, &descriptor).await {
            Ok(()) => {
                info!(%service, "Rollout complete");
                self.output.progress(&format!("{label} Deployed"));
                RolloutOutcome::succeeded(service)
            }
            Err(e) => {
                error!(%service, error = %e, "Rollout failed");
                self.output.error(&format!("{label} {e}"));
                RolloutOutcome::failed(service, e.to_string())
            }
        }
    }
}
