// ABOUTME: Idempotent build-and-publish of the artifact for a resolved version.
// ABOUTME: Skips all work when the tag already exists in the registry unless forced.

use snafu::{ResultExt, Snafu};
use std::path::PathBuf;
use tracing::info;

use crate::build::{BuildError, ImageBuilder};
use crate::diagnostics::{Diagnostics, Warning};
use crate::registry::{PublishError, RegistryPublisher};
use crate::source::ResolvedVersion;
use crate::types::{ArtifactReference, ArtifactTag};

/// Errors from ensuring an artifact is published.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum UploadError {
    #[snafu(display("could not look up tag {tag} in the registry: {source}"))]
    Lookup { tag: String, source: PublishError },

    #[snafu(display("could not provision registry repository: {source}"))]
    Repository { source: PublishError },

    #[snafu(display("{source}"))]
    Build { source: BuildError },

    #[snafu(display("{source}"))]
    Publish { source: PublishError },
}

/// Error kind for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadErrorKind {
    /// Registry lookups or provisioning failed.
    Registry,
    /// Building the local image failed.
    Build,
    /// The local image is missing; build before pushing.
    LocalImageMissing,
    /// Login or push failed.
    Transfer,
}

impl UploadError {
    /// Returns the error kind for programmatic handling.
    pub fn kind(&self) -> UploadErrorKind {
        match self {
            UploadError::Lookup { .. } | UploadError::Repository { .. } => {
                UploadErrorKind::Registry
            }
            UploadError::Build { .. } => UploadErrorKind::Build,
            UploadError::Publish {
                source: PublishError::LocalImageMissing { .. },
            } => UploadErrorKind::LocalImageMissing,
            UploadError::Publish { .. } => UploadErrorKind::Transfer,
        }
    }
}

/// What [`ArtifactUploader::ensure_published`] had to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    /// The tag was already in the registry; nothing was built or pushed.
    AlreadyPublished(ArtifactReference),
    /// The image was built and pushed during this call.
    Published(ArtifactReference),
}

impl UploadOutcome {
    pub fn reference(&self) -> &ArtifactReference {
        match self {
            UploadOutcome::AlreadyPublished(r) | UploadOutcome::Published(r) => r,
        }
    }

    pub fn was_built(&self) -> bool {
        matches!(self, UploadOutcome::Published(_))
    }
}

/// Builds and publishes an artifact only when the registry doesn't have it.
pub struct ArtifactUploader {
    builder: ImageBuilder,
    publisher: RegistryPublisher,
    working_dir: PathBuf,
}

impl ArtifactUploader {
    pub fn new(
        builder: ImageBuilder,
        publisher: RegistryPublisher,
        working_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            builder,
            publisher,
            working_dir: working_dir.into(),
        }
    }

    pub fn publisher(&self) -> &RegistryPublisher {
        &self.publisher
    }

    /// Make sure the image for `version` is in the registry.
    ///
    /// With `force_rebuild` the image is rebuilt and pushed even if the tag exists.
    pub async fn ensure_published(
        &self,
        version: &ResolvedVersion,
        force_rebuild: bool,
        diag: &mut Diagnostics,
    ) -> Result<UploadOutcome, UploadError> {
        let tag = version.tag();
        let reference = self.publisher.location().reference(tag.clone());

        if !force_rebuild {
            let existing = self
                .publisher
                .find_image(tag)
                .await
                .context(LookupSnafu {
                    tag: tag.to_string(),
                })?;
            if existing.is_some() {
                info!(%reference, "Image found in registry");
                return Ok(UploadOutcome::AlreadyPublished(reference));
            }
            info!(%tag, "Image not found in registry, building");
        } else {
            info!(%tag, "Forced rebuild requested");
        }

        self.publisher
            .ensure_repository()
            .await
            .context(RepositorySnafu)?;

        let local = self
            .builder
            .build(tag, version.reference.as_deref(), &self.working_dir)
            .await
            .context(BuildSnafu)?;

        self.publisher.authenticate().await.context(PublishSnafu)?;
        self.publisher
            .publish(&local, &reference)
            .await
            .context(PublishSnafu)?;

        match version.version_label() {
            Ok(Some(label)) => self.tag_version(tag, &label, diag).await,
            Ok(None) => {}
            Err(e) => diag.warn(Warning::version_tag(format!(
                "Version '{}' cannot be used as an image tag ({e}); only {tag} was published",
                version.reference.as_deref().unwrap_or_default()
            ))),
        }

        Ok(UploadOutcome::Published(reference))
    }

    /// Re-publish the freshly pushed image under the caller's version label.
    ///
    /// Failure only produces a warning: the primary tag is already safe, but
    /// the label will be missing from the registry.
    async fn tag_version(&self, tag: &ArtifactTag, label: &ArtifactTag, diag: &mut Diagnostics) {
        let manifest = match self.publisher.find_image(tag).await {
            Ok(Some(manifest)) => manifest,
            Ok(None) => {
                diag.warn(Warning::version_tag(format!(
                    "Pushed {tag} but it is not visible in the registry yet; version tag {label} was not applied"
                )));
                return;
            }
            Err(e) => {
                diag.warn(Warning::version_tag(format!(
                    "Could not read back {tag} to apply version tag {label}: {e}"
                )));
                return;
            }
        };

        if let Err(e) = self.publisher.put_manifest(label, &manifest).await {
            diag.warn(Warning::version_tag(format!(
                "Could not apply version tag {label} to {tag}: {e}"
            )));
        }
    }

    /// Apply extra tags to a published artifact, best-effort.
    pub async fn add_tags(
        &self,
        tag: &ArtifactTag,
        extra: &[ArtifactTag],
        diag: &mut Diagnostics,
    ) -> usize {
        let mut applied = 0;
        for new_tag in extra {
            if self.publisher.add_tag(tag, new_tag, diag).await {
                applied += 1;
            }
        }
        applied
    }
}
