// ABOUTME: Error types for deployment runs.
// ABOUTME: Covers everything that aborts a run before any rollout worker starts.

use std::path::PathBuf;

use crate::descriptor::DescriptorError;
use crate::source::VersionError;
use crate::stack::StackError;
use crate::upload::UploadError;

/// Errors that abort a deployment before rollouts begin.
///
/// Failures inside a worker never surface here; they are recorded as a
/// failed [`RolloutOutcome`](super::RolloutOutcome) instead.
#[derive(Debug, thiserror::Error)]
pub enum DeployError {
    #[error(transparent)]
    Stack(#[from] StackError),

    #[error("config template not found at {}; create it with one KEY=value line per variable", .0.display())]
    MissingConfigTemplate(PathBuf),

    #[error(transparent)]
    Version(#[from] VersionError),

    #[error(transparent)]
    Upload(#[from] UploadError),

    #[error(transparent)]
    Descriptor(#[from] DescriptorError),

    #[error("stack {stack} has no managed services")]
    NoServices { stack: String },
}
