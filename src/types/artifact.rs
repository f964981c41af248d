// ABOUTME: Artifact tags and registry references for built container images.
// ABOUTME: Handles clean/dirty tag derivation and fully-qualified image URIs.

use std::fmt;
use thiserror::Error;

use super::{ApplicationName, CommitId};

/// Marker inserted between the commit and the operator in dirty-tree tags.
pub const DIRTY_MARKER: &str = "-dirty-";

const MAX_TAG_LEN: usize = 128;

#[derive(Debug, Error)]
pub enum ArtifactTagError {
    #[error("artifact tag cannot be empty")]
    Empty,

    #[error("artifact tag exceeds maximum length of {MAX_TAG_LEN} characters")]
    TooLong,

    #[error("artifact tag cannot start with '{0}'")]
    InvalidStart(char),

    #[error("invalid character in artifact tag: '{0}'")]
    InvalidChar(char),
}

/// A registry tag identifying one immutable build of an application.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArtifactTag(String);

impl ArtifactTag {
    /// Parse a tag using the registry's tag grammar.
    pub fn parse(value: &str) -> Result<Self, ArtifactTagError> {
        let value = value.trim();
        let Some(first) = value.chars().next() else {
            return Err(ArtifactTagError::Empty);
        };

        if value.len() > MAX_TAG_LEN {
            return Err(ArtifactTagError::TooLong);
        }

        if first == '.' || first == '-' {
            return Err(ArtifactTagError::InvalidStart(first));
        }

        for c in value.chars() {
            if !c.is_ascii_alphanumeric() && c != '_' && c != '.' && c != '-' {
                return Err(ArtifactTagError::InvalidChar(c));
            }
        }

        Ok(Self(value.to_string()))
    }

    /// Tag for a clean tree: the commit itself.
    pub fn clean(commit: &CommitId) -> Result<Self, ArtifactTagError> {
        Self::parse(commit.as_str())
    }

    /// Tag for a dirty tree, namespaced by the operator who built it.
    pub fn dirty(commit: &CommitId, operator: &str) -> Result<Self, ArtifactTagError> {
        Self::parse(&format!("{}{}{}", commit, DIRTY_MARKER, operator))
    }

    pub fn is_dirty(&self) -> bool {
        self.0.contains(DIRTY_MARKER)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ArtifactTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A locally built image, named `<application>:<tag>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalImage {
    name: String,
    tag: ArtifactTag,
}

impl LocalImage {
    pub fn new(application: &ApplicationName, tag: ArtifactTag) -> Self {
        Self {
            name: application.local_image_name(),
            tag,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tag(&self) -> &ArtifactTag {
        &self.tag
    }
}

impl fmt::Display for LocalImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.name, self.tag)
    }
}

/// Where the application's images live in the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactLocation {
    pub registry_host: String,
    pub account_id: String,
    pub region: String,
    pub repository: String,
}

impl ArtifactLocation {
    /// `registry_host/repository`, without a tag.
    pub fn repository_uri(&self) -> String {
        format!("{}/{}", self.registry_host, self.repository)
    }

    pub fn reference(&self, tag: ArtifactTag) -> ArtifactReference {
        ArtifactReference {
            location: self.clone(),
            tag,
        }
    }
}

/// A fully-qualified reference to one published artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactReference {
    location: ArtifactLocation,
    tag: ArtifactTag,
}

impl ArtifactReference {
    pub fn tag(&self) -> &ArtifactTag {
        &self.tag
    }

    pub fn repository_uri(&self) -> String {
        self.location.repository_uri()
    }
}

impl fmt::Display for ArtifactReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.location.repository_uri(), self.tag)
    }
}
