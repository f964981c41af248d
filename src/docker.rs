// ABOUTME: Build and transport primitives backed by the docker CLI.
// ABOUTME: Implements BuildTool and ImageTransport with tokio child processes.

use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

use crate::build::{BuildError, BuildTool};
use crate::registry::{Credentials, ImageTransport, TransportError};
use crate::types::LocalImage;

/// Drives a local docker daemon through its command-line client.
#[derive(Debug, Clone)]
pub struct DockerCli {
    binary: String,
}

impl Default for DockerCli {
    fn default() -> Self {
        Self::new("docker")
    }
}

impl DockerCli {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// Run with inherited stdout so build and push progress stays visible.
    async fn run(&self, args: &[&str], dir: Option<&Path>) -> Result<(), TransportError> {
        debug!(binary = %self.binary, ?args, "Running container CLI");

        let mut command = Command::new(&self.binary);
        command
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::piped());
        if let Some(dir) = dir {
            command.current_dir(dir);
        }

        let output = command.output().await?;
        if output.status.success() {
            Ok(())
        } else {
            Err(self.failure(args, &output.stderr))
        }
    }

    fn failure(&self, args: &[&str], stderr: &[u8]) -> TransportError {
        TransportError::Command {
            command: format!("{} {}", self.binary, args.first().copied().unwrap_or("")),
            reason: String::from_utf8_lossy(stderr).trim().to_owned(),
        }
    }
}

#[async_trait]
impl BuildTool for DockerCli {
    async fn build(&self, image: &LocalImage, context_dir: &Path) -> Result<(), BuildError> {
        let name = image.to_string();
        self.run(&["build", "-t", name.as_str(), "."], Some(context_dir))
            .await
            .map_err(|e| BuildError::Failed {
                image: name.clone(),
                reason: e.to_string(),
            })
    }
}

#[async_trait]
impl ImageTransport for DockerCli {
    async fn login(&self, credentials: &Credentials) -> Result<(), TransportError> {
        let args = [
            "login",
            "--username",
            credentials.username.as_str(),
            "--password-stdin",
            credentials.endpoint.as_str(),
        ];
        debug!(endpoint = %credentials.endpoint, "Logging in to registry");

        let mut child = Command::new(&self.binary)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()?;

        // The secret never appears on the command line.
        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(credentials.secret.as_bytes()).await?;
            stdin.shutdown().await?;
        }

        let output = child.wait_with_output().await?;
        if output.status.success() {
            Ok(())
        } else {
            Err(self.failure(&args, &output.stderr))
        }
    }

    async fn tag(&self, source: &str, target: &str) -> Result<(), TransportError> {
        self.run(&["tag", source, target], None).await
    }

    async fn push(&self, image: &str) -> Result<(), TransportError> {
        self.run(&["push", image], None).await
    }

    async fn remove(&self, image: &str) -> Result<(), TransportError> {
        self.run(&["rmi", image], None).await
    }
}
