// ABOUTME: Task descriptor generation and export.
// ABOUTME: Exposes the descriptor model, env sample parsing and TaskDescriptorGenerator.

mod env_sample;
mod generator;
mod task;

pub use env_sample::{parse_env_sample, read_env_sample};
pub use generator::{DescriptorAssembler, DescriptorRequest, TaskDescriptorGenerator};
pub use task::{
    ContainerDependency, ContainerDescriptor, EXPORTED_FIELDS, EfsVolume, EnvironmentVariable,
    HealthCheck, HostVolume, InferenceAccelerator, LogConfiguration, MountPoint,
    PlacementConstraint, PortMapping, ProxyConfiguration, ResourceTag, SecretReference,
    TaskDescriptor, Volume, VolumeFrom, export_filename,
};

use std::path::PathBuf;

/// Errors from generating a task descriptor.
#[derive(Debug, thiserror::Error)]
pub enum DescriptorError {
    #[error("{} not found; create it listing the required configuration keys", .0.display())]
    MissingConfigTemplate(PathBuf),

    #[error("invalid env sample: {0}")]
    InvalidSample(#[source] dotenvy::Error),

    #[error("no configuration value stored for key(s): {}", .keys.join(", "))]
    MissingParameters { keys: Vec<String> },

    #[error("service {service} has no current task definition to derive from")]
    NoCurrentDefinition { service: String },

    #[error("descriptor for {service} does not run {image}")]
    ImageNotApplied { service: String, image: String },

    #[error("descriptor backend error: {0}")]
    Backend(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
