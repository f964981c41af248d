// ABOUTME: Type-safe identifiers and validated domain types.
// ABOUTME: Uses phantom types to prevent ID confusion at compile time.

mod application_name;
mod artifact;
mod id;

pub use application_name::{ApplicationName, ApplicationNameError};
pub use artifact::{
    ArtifactLocation, ArtifactReference, ArtifactTag, ArtifactTagError, DIRTY_MARKER, LocalImage,
};
pub use id::{ClusterName, CommitId, ServiceId, StackName};
