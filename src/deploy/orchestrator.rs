// ABOUTME: Top-level deployment flow for one application in one environment.
// ABOUTME: Resolves topology and version, publishes once, then rolls out every service concurrently.

use futures::future::join_all;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

use super::error::DeployError;
use super::outcome::{DeploymentResult, RolloutOutcome};
use super::palette::color_for;
use super::rollout::{RolloutExecutor, RolloutTarget};
use super::worker::RolloutWorker;
use crate::config::EnvironmentContext;
use crate::descriptor::{TaskDescriptor, TaskDescriptorGenerator, read_env_sample};
use crate::diagnostics::{Diagnostics, Warning};
use crate::output::Output;
use crate::source::VersionResolver;
use crate::stack::{StackTopology, StackTopologyResolver};
use crate::types::ApplicationName;
use crate::upload::{ArtifactUploader, UploadOutcome};

/// Inputs of one `deploy` invocation.
#[derive(Debug, Clone)]
pub struct DeploymentRequest {
    pub application: ApplicationName,
    pub environment: EnvironmentContext,
    /// Version reference; `None` deploys the working tree.
    pub version: Option<String>,
    pub env_sample: PathBuf,
    pub force_rebuild: bool,
}

pub struct DeploymentOrchestrator {
    topology: StackTopologyResolver,
    versions: VersionResolver,
    uploader: ArtifactUploader,
    generator: TaskDescriptorGenerator,
    executor: Arc<dyn RolloutExecutor>,
    output: Output,
}

impl DeploymentOrchestrator {
    pub fn new(
        topology: StackTopologyResolver,
        versions: VersionResolver,
        uploader: ArtifactUploader,
        generator: TaskDescriptorGenerator,
        executor: Arc<dyn RolloutExecutor>,
        output: Output,
    ) -> Self {
        Self {
            topology,
            versions,
            uploader,
            generator,
            executor,
            output,
        }
    }

    /// Deploy the requested version to every managed service.
    ///
    /// Returns `Err` only for failures before any worker starts. Worker
    /// failures are reported per service in the returned result.
    pub async fn run(
        &self,
        request: &DeploymentRequest,
        diag: &mut Diagnostics,
    ) -> Result<DeploymentResult, DeployError> {
        let (topology, upload) = self.prepare(request, diag).await?;

        if topology.is_empty() {
            warn!(stack = %topology.stack, "No managed services found");
            diag.warn(Warning::no_services(format!(
                "stack {} has no outputs ending in EcsServiceName; nothing was rolled out",
                topology.stack
            )));
            return Ok(DeploymentResult {
                upload,
                outcomes: Vec::new(),
            });
        }

        let artifact = upload.reference().clone();
        info!(
            %artifact,
            services = topology.services.len(),
            "Starting rollouts"
        );

        let handles: Vec<_> = topology
            .services
            .iter()
            .enumerate()
            .map(|(index, service)| {
                let worker = RolloutWorker {
                    target: RolloutTarget {
                        cluster: request.environment.cluster.clone(),
                        service: service.clone(),
                        environment: request.environment.clone(),
                        artifact: artifact.clone(),
                    },
                    env_sample: request.env_sample.clone(),
                    color: color_for(index),
                    generator: self.generator.clone(),
                    executor: Arc::clone(&self.executor),
                    output: self.output.clone(),
                };
                tokio::spawn(worker.run())
            })
            .collect();

        let joined = join_all(handles).await;
        let outcomes = topology
            .services
            .iter()
            .zip(joined)
            .map(|(service, joined)| match joined {
                Ok(outcome) => outcome,
                Err(e) => {
                    warn!(%service, error = %e, "Rollout worker aborted");
                    RolloutOutcome::failed(service.clone(), format!("worker aborted: {e}"))
                }
            })
            .collect();

        Ok(DeploymentResult { upload, outcomes })
    }

    /// Run the same preparation as [`run`](Self::run), then produce the
    /// descriptor for the first managed service without rolling anything out.
    pub async fn generate_descriptor_only(
        &self,
        request: &DeploymentRequest,
        diag: &mut Diagnostics,
    ) -> Result<TaskDescriptor, DeployError> {
        let (topology, upload) = self.prepare(request, diag).await?;

        let service = topology
            .services
            .first()
            .ok_or_else(|| DeployError::NoServices {
                stack: topology.stack.to_string(),
            })?;

        let descriptor = self
            .generator
            .generate(
                service,
                upload.reference(),
                &request.env_sample,
                &request.environment,
            )
            .await?;
        Ok(descriptor)
    }

    async fn prepare(
        &self,
        request: &DeploymentRequest,
        diag: &mut Diagnostics,
    ) -> Result<(StackTopology, UploadOutcome), DeployError> {
        let topology = self
            .topology
            .resolve(&request.environment, &request.application)
            .await?;

        if !request.env_sample.is_file() {
            return Err(DeployError::MissingConfigTemplate(
                request.env_sample.clone(),
            ));
        }
        let keys = read_env_sample(&request.env_sample)?;
        info!(keys = keys.len(), "Validated config template");

        let version = self.versions.resolve(request.version.as_deref()).await?;
        self.output
            .progress(&format!("Using artifact tag {}", version.tag()));

        let upload = self
            .uploader
            .ensure_published(&version, request.force_rebuild, diag)
            .await?;
        if upload.was_built() {
            self.output
                .progress(&format!("Pushed {}", upload.reference()));
        }

        Ok((topology, upload))
    }
}
