// ABOUTME: Source-control primitives used to resolve and check out versions.
// ABOUTME: Implemented by GitCli in production and by in-memory fakes in tests.

use async_trait::async_trait;

use crate::types::CommitId;

/// Source-control operations on one working tree.
#[async_trait]
pub trait SourceControl: Send + Sync {
    /// Branch name if HEAD is attached, otherwise the checked-out commit.
    async fn current_ref(&self) -> Result<String, SourceError>;

    /// Check out `reference`, returning the reference now checked out.
    async fn checkout(&self, reference: &str) -> Result<String, SourceError>;

    /// Whether the tree has uncommitted changes.
    async fn is_dirty(&self) -> Result<bool, SourceError>;

    /// Resolve a tag, branch or commit to the commit it points at.
    async fn resolve_commit(&self, reference: &str) -> Result<CommitId, SourceError>;
}

/// Errors from source-control operations.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("'{0}' is not a git tag, branch or commit")]
    UnknownReference(String),

    #[error("could not check out '{reference}': {reason}")]
    CheckoutFailed { reference: String, reason: String },

    #[error("git command failed: {0}")]
    Command(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
