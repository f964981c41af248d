// ABOUTME: SourceControl implementation that shells out to the git CLI.
// ABOUTME: Every command runs inside the configured working directory.

use async_trait::async_trait;
use std::path::PathBuf;
use std::process::{Output, Stdio};
use tokio::process::Command;
use tracing::debug;

use super::control::{SourceControl, SourceError};
use crate::types::CommitId;

/// Git working tree driven through the `git` binary.
#[derive(Debug, Clone)]
pub struct GitCli {
    repo_dir: PathBuf,
    include_untracked: bool,
}

impl GitCli {
    pub fn new(repo_dir: impl Into<PathBuf>) -> Self {
        Self {
            repo_dir: repo_dir.into(),
            include_untracked: true,
        }
    }

    /// Whether untracked files count as uncommitted changes.
    pub fn include_untracked(mut self, include: bool) -> Self {
        self.include_untracked = include;
        self
    }

    async fn git(&self, args: &[&str]) -> Result<Output, SourceError> {
        debug!(dir = %self.repo_dir.display(), ?args, "Running git");

        let output = Command::new("git")
            .args(args)
            .current_dir(&self.repo_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await?;

        Ok(output)
    }

    async fn git_stdout(&self, args: &[&str]) -> Result<String, SourceError> {
        let output = self.git(args).await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SourceError::Command(format!(
                "git {}: {}",
                args.join(" "),
                stderr.trim()
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_owned())
    }
}

#[async_trait]
impl SourceControl for GitCli {
    async fn current_ref(&self) -> Result<String, SourceError> {
        let branch = self.git(&["symbolic-ref", "--short", "-q", "HEAD"]).await?;
        if branch.status.success() {
            let name = String::from_utf8_lossy(&branch.stdout).trim().to_owned();
            if !name.is_empty() {
                return Ok(name);
            }
        }

        // Detached HEAD
        self.git_stdout(&["rev-parse", "HEAD"]).await
    }

    async fn checkout(&self, reference: &str) -> Result<String, SourceError> {
        let output = self.git(&["checkout", "--quiet", reference]).await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SourceError::CheckoutFailed {
                reference: reference.to_string(),
                reason: stderr.trim().to_string(),
            });
        }

        debug!(reference, "Checked out");
        Ok(reference.to_string())
    }

    async fn is_dirty(&self) -> Result<bool, SourceError> {
        let mut args = vec!["status", "--porcelain"];
        if !self.include_untracked {
            args.push("--untracked-files=no");
        }
        let status = self.git_stdout(&args).await?;
        Ok(!status.is_empty())
    }

    async fn resolve_commit(&self, reference: &str) -> Result<CommitId, SourceError> {
        let output = self.git(&["rev-list", "-n", "1", reference, "--"]).await?;
        let sha = String::from_utf8_lossy(&output.stdout).trim().to_owned();

        if !output.status.success() || sha.is_empty() {
            return Err(SourceError::UnknownReference(reference.to_string()));
        }

        Ok(CommitId::new(sha))
    }
}
