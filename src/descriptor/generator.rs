// ABOUTME: Generates the task descriptor for one service and one published artifact.
// ABOUTME: Checks prerequisites, then delegates field assembly to a DescriptorAssembler.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

use super::{DescriptorError, TaskDescriptor};
use crate::config::EnvironmentContext;
use crate::types::{ApplicationName, ArtifactReference, ServiceId};

/// Everything an assembler needs to produce one descriptor.
#[derive(Debug, Clone)]
pub struct DescriptorRequest {
    pub application: ApplicationName,
    pub environment: EnvironmentContext,
    pub service: ServiceId,
    pub artifact: ArtifactReference,
    pub env_sample: PathBuf,
}

/// Builds descriptor contents (resources, environment, networking).
#[async_trait]
pub trait DescriptorAssembler: Send + Sync {
    async fn assemble(&self, request: &DescriptorRequest)
    -> Result<TaskDescriptor, DescriptorError>;
}

/// Produces one descriptor per managed service.
#[derive(Clone)]
pub struct TaskDescriptorGenerator {
    assembler: Arc<dyn DescriptorAssembler>,
    application: ApplicationName,
}

impl TaskDescriptorGenerator {
    pub fn new(assembler: Arc<dyn DescriptorAssembler>, application: ApplicationName) -> Self {
        Self {
            assembler,
            application,
        }
    }

    pub async fn generate(
        &self,
        service: &ServiceId,
        artifact: &ArtifactReference,
        env_sample: &Path,
        environment: &EnvironmentContext,
    ) -> Result<TaskDescriptor, DescriptorError> {
        if !env_sample.is_file() {
            return Err(DescriptorError::MissingConfigTemplate(
                env_sample.to_path_buf(),
            ));
        }

        let request = DescriptorRequest {
            application: self.application.clone(),
            environment: environment.clone(),
            service: service.clone(),
            artifact: artifact.clone(),
            env_sample: env_sample.to_path_buf(),
        };

        debug!(%service, %artifact, "Assembling task descriptor");
        let descriptor = self.assembler.assemble(&request).await?;

        let image = artifact.to_string();
        if !descriptor.uses_image(&image) {
            return Err(DescriptorError::ImageNotApplied {
                service: service.to_string(),
                image,
            });
        }

        Ok(descriptor)
    }
}
