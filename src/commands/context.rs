// ABOUTME: Shared wiring for commands: project discovery and per-environment backends.
// ABOUTME: Builds the git, docker and AWS collaborators the pipeline components need.

use crate::cli::Cli;
use aws_config::SdkConfig;
use liftoff::aws::{
    CloudFormationStacks, EcrRegistry, EcsDescriptorAssembler, EcsRollout, sdk_config,
};
use liftoff::build::ImageBuilder;
use liftoff::config::{Config, EnvironmentContext};
use liftoff::deploy::{DeploymentOrchestrator, DeploymentRequest};
use liftoff::descriptor::TaskDescriptorGenerator;
use liftoff::docker::DockerCli;
use liftoff::error::Result;
use liftoff::output::Output;
use liftoff::registry::RegistryPublisher;
use liftoff::source::{GitCli, VersionResolver};
use liftoff::stack::StackTopologyResolver;
use liftoff::types::ApplicationName;
use liftoff::upload::ArtifactUploader;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// The project being operated on: its directory and parsed configuration.
pub struct Project {
    pub dir: PathBuf,
    pub config: Config,
    pub env_sample: PathBuf,
}

impl Project {
    pub fn discover(dir: &Path, cli: &Cli) -> Result<Self> {
        let mut config = Config::discover(dir)?;
        if let Some(ref name) = cli.name {
            config = config.with_application(name)?;
        }

        let env_sample = match cli.env_sample {
            Some(ref path) if path.is_absolute() => path.clone(),
            Some(ref path) => dir.join(path),
            None => config.env_sample_path(dir),
        };

        Ok(Self {
            dir: dir.to_path_buf(),
            config,
            env_sample,
        })
    }

    pub fn application(&self) -> &ApplicationName {
        &self.config.application
    }

    fn git(&self) -> Arc<GitCli> {
        Arc::new(GitCli::new(&self.dir).include_untracked(self.config.source.include_untracked))
    }

    pub fn versions(&self) -> Result<VersionResolver> {
        Ok(VersionResolver::new(self.git(), self.config.operator()?))
    }

    pub fn image_builder(&self) -> ImageBuilder {
        ImageBuilder::new(
            self.git(),
            Arc::new(DockerCli::default()),
            self.application().clone(),
        )
    }
}

/// AWS-side collaborators for one target environment.
pub struct Environment {
    pub context: EnvironmentContext,
    sdk: SdkConfig,
}

impl Environment {
    pub async fn connect(project: &Project, name: &str, output: &Output) -> Result<Self> {
        let context = project.config.for_environment(name)?;
        if context.is_production() {
            output.banner(&format!(
                " You are operating on PRODUCTION ({}) ",
                context.account_id
            ));
        }

        let sdk = sdk_config(&context.region).await;
        Ok(Self { context, sdk })
    }

    pub fn publisher(&self, project: &Project) -> RegistryPublisher {
        RegistryPublisher::new(
            Arc::new(EcrRegistry::new(&self.sdk)),
            Arc::new(DockerCli::default()),
            self.context.artifact_location(project.application()),
        )
    }

    pub fn uploader(&self, project: &Project) -> ArtifactUploader {
        ArtifactUploader::new(
            project.image_builder(),
            self.publisher(project),
            &project.dir,
        )
    }

    pub fn orchestrator(&self, project: &Project, output: Output) -> Result<DeploymentOrchestrator> {
        let rollout = &project.config.rollout;
        Ok(DeploymentOrchestrator::new(
            StackTopologyResolver::new(Arc::new(CloudFormationStacks::new(&self.sdk))),
            project.versions()?,
            self.uploader(project),
            TaskDescriptorGenerator::new(
                Arc::new(EcsDescriptorAssembler::new(&self.sdk)),
                project.application().clone(),
            ),
            Arc::new(EcsRollout::new(
                &self.sdk,
                rollout.poll_interval,
                rollout.timeout,
            )),
            output,
        ))
    }

    pub fn request(
        &self,
        project: &Project,
        version: Option<&str>,
        force_rebuild: bool,
    ) -> DeploymentRequest {
        DeploymentRequest {
            application: project.application().clone(),
            environment: self.context.clone(),
            version: version.map(str::to_string),
            env_sample: project.env_sample.clone(),
            force_rebuild,
        }
    }
}
