// ABOUTME: Resolves a version reference plus tree state into an artifact tag.
// ABOUTME: Refuses explicit versions on a dirty tree since the intent is ambiguous.

use std::sync::Arc;
use tracing::{debug, info};

use super::control::{SourceControl, SourceError};
use crate::types::{ArtifactTag, ArtifactTagError, CommitId};

/// Errors from version resolution.
#[derive(Debug, thiserror::Error)]
pub enum VersionError {
    /// An explicit version was requested while local changes exist.
    #[error(
        "local copy is dirty and version '{reference}' was requested; commit or stash your changes first"
    )]
    Ambiguous { reference: String },

    #[error(transparent)]
    Source(#[from] SourceError),

    #[error("cannot derive artifact tag: {0}")]
    InvalidTag(#[from] ArtifactTagError),
}

/// The immutable identity of the source tree being deployed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedVersion {
    pub commit: CommitId,
    pub dirty: bool,
    /// Operator identity appended to the tag of a dirty build.
    pub dirty_suffix: Option<String>,
    /// Version reference the caller asked for, if any.
    pub reference: Option<String>,
    tag: ArtifactTag,
}

impl ResolvedVersion {
    pub fn tag(&self) -> &ArtifactTag {
        &self.tag
    }

    /// Caller-supplied label worth publishing next to the derived tag.
    ///
    /// `Ok(None)` when no version was given or it equals the derived tag. A
    /// version that is not a valid registry tag (e.g. `feature/x`) is an error
    /// so the caller can report that the label was not published.
    pub fn version_label(&self) -> Result<Option<ArtifactTag>, ArtifactTagError> {
        let Some(reference) = self.reference.as_deref() else {
            return Ok(None);
        };
        let label = ArtifactTag::parse(reference)?;
        Ok((label != self.tag).then_some(label))
    }
}

/// Turns a version reference (or none) into a [`ResolvedVersion`].
pub struct VersionResolver {
    source: Arc<dyn SourceControl>,
    operator: String,
}

impl VersionResolver {
    pub fn new(source: Arc<dyn SourceControl>, operator: impl Into<String>) -> Self {
        Self {
            source,
            operator: operator.into(),
        }
    }

    /// Resolve `reference` (HEAD when `None` or empty) against the current tree.
    pub async fn resolve(&self, reference: Option<&str>) -> Result<ResolvedVersion, VersionError> {
        let reference = reference.map(str::trim).filter(|r| !r.is_empty());
        let dirty = self.source.is_dirty().await?;

        if let (Some(reference), true) = (reference, dirty) {
            return Err(VersionError::Ambiguous {
                reference: reference.to_string(),
            });
        }

        let commit = self.source.resolve_commit(reference.unwrap_or("HEAD")).await?;
        debug!(%commit, dirty, "Resolved commit");

        let (tag, dirty_suffix) = if dirty {
            (
                ArtifactTag::dirty(&commit, &self.operator)?,
                Some(self.operator.clone()),
            )
        } else {
            (ArtifactTag::clean(&commit)?, None)
        };

        info!(%tag, "Determined artifact tag based on current status");

        Ok(ResolvedVersion {
            commit,
            dirty,
            dirty_suffix,
            reference: reference.map(str::to_string),
            tag,
        })
    }
}
