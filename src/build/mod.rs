// ABOUTME: Local image builds for a resolved artifact tag.
// ABOUTME: Defines the BuildTool seam and the checkout-scoped ImageBuilder.

mod builder;

pub use builder::ImageBuilder;

use async_trait::async_trait;
use std::path::Path;

use crate::source::SourceError;
use crate::types::LocalImage;

/// The artifact-build primitive: builds `context_dir` into a local image.
#[async_trait]
pub trait BuildTool: Send + Sync {
    async fn build(&self, image: &LocalImage, context_dir: &Path) -> Result<(), BuildError>;
}

/// Errors from building an image.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("failed to build image {image}: {reason}")]
    Failed { image: String, reason: String },

    #[error(transparent)]
    Source(#[from] SourceError),

    /// The build finished but the working tree could not be switched back.
    #[error("built image but could not restore working tree to '{reference}': {source}")]
    Restore {
        reference: String,
        source: SourceError,
    },
}
