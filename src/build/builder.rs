// ABOUTME: Builds the image for a version after temporarily checking it out.
// ABOUTME: The original branch is restored on every exit path, including build failure.

use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info};

use super::{BuildError, BuildTool};
use crate::source::{SourceControl, SourceError};
use crate::types::{ApplicationName, ArtifactTag, LocalImage};

/// A temporary checkout that remembers where the tree was before.
struct Checkout<'a> {
    source: &'a dyn SourceControl,
    original: String,
}

impl<'a> Checkout<'a> {
    async fn acquire(source: &'a dyn SourceControl, reference: &str) -> Result<Self, SourceError> {
        let original = source.current_ref().await?;
        info!(current = %original, target = reference, "Switching working tree");
        source.checkout(reference).await?;
        Ok(Self { source, original })
    }

    async fn release(self) -> Result<(), BuildError> {
        self.source
            .checkout(&self.original)
            .await
            .map(|_| ())
            .map_err(|source| BuildError::Restore {
                reference: self.original.clone(),
                source,
            })
    }

    /// Run `work` with `reference` checked out, then restore the tree.
    async fn with_checkout<F, T>(
        source: &'a dyn SourceControl,
        reference: &str,
        work: F,
    ) -> Result<T, BuildError>
    where
        F: Future<Output = Result<T, BuildError>>,
    {
        let checkout = Self::acquire(source, reference).await?;
        let result = work.await;
        let original = checkout.original.clone();

        match (result, checkout.release().await) {
            (Ok(value), Ok(())) => Ok(value),
            (Ok(_), Err(restore)) => Err(restore),
            (Err(e), Ok(())) => Err(e),
            (Err(e), Err(restore)) => {
                // The build error is what the operator needs to see first.
                error!(reference = %original, error = %restore, "Failed to restore working tree");
                Err(e)
            }
        }
    }
}

/// Produces a locally tagged image for a resolved tag.
pub struct ImageBuilder {
    source: Arc<dyn SourceControl>,
    tool: Arc<dyn BuildTool>,
    application: ApplicationName,
}

impl ImageBuilder {
    pub fn new(
        source: Arc<dyn SourceControl>,
        tool: Arc<dyn BuildTool>,
        application: ApplicationName,
    ) -> Self {
        Self {
            source,
            tool,
            application,
        }
    }

    /// Local image name a build of `tag` produces.
    pub fn local_image(&self, tag: &ArtifactTag) -> LocalImage {
        LocalImage::new(&self.application, tag.clone())
    }

    /// Build `tag` from `reference` (the tree as it stands when `None`).
    pub async fn build(
        &self,
        tag: &ArtifactTag,
        reference: Option<&str>,
        working_dir: &Path,
    ) -> Result<LocalImage, BuildError> {
        let image = self.local_image(tag);
        info!(%image, "Building image");

        match reference {
            Some(reference) => {
                Checkout::with_checkout(
                    self.source.as_ref(),
                    reference,
                    self.tool.build(&image, working_dir),
                )
                .await?
            }
            None => self.tool.build(&image, working_dir).await?,
        }

        info!(%image, "Built image");
        Ok(image)
    }
}
