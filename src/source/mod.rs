// ABOUTME: Source-control access and version resolution.
// ABOUTME: Exposes the SourceControl seam, the git implementation and VersionResolver.

mod control;
mod git;
mod resolver;

pub use control::{SourceControl, SourceError};
pub use git::GitCli;
pub use resolver::{ResolvedVersion, VersionError, VersionResolver};
