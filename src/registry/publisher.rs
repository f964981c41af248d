// ABOUTME: Publishes locally built images into the application's registry repository.
// ABOUTME: Provisions the repository, logs in, pushes, and duplicates tags by manifest.

use std::sync::Arc;
use tracing::{info, warn};

use super::credentials::{Credentials, CredentialsError};
use super::traits::{ImageManifest, ImageTransport, RegistryApi, RegistryError, TransportError};
use crate::diagnostics::{Diagnostics, Warning};
use crate::types::{ArtifactLocation, ArtifactReference, ArtifactTag, LocalImage};

/// Errors from publishing an image.
#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("invalid registry credentials: {0}")]
    Credentials(#[from] CredentialsError),

    #[error("registry login to {endpoint} failed: {source}")]
    Authentication {
        endpoint: String,
        source: TransportError,
    },

    /// Nothing to push: the image has to be built first.
    #[error("local image {image} was not found; build it first")]
    LocalImageMissing { image: String },

    #[error("failed to push {image}: {source}")]
    Transfer {
        image: String,
        source: TransportError,
    },

    #[error("no image tagged {tag} in repository {repository}")]
    ImageNotFound { repository: String, tag: String },
}

/// Idempotent repository provisioning plus image transfer for one application.
pub struct RegistryPublisher {
    api: Arc<dyn RegistryApi>,
    transport: Arc<dyn ImageTransport>,
    location: ArtifactLocation,
}

impl RegistryPublisher {
    pub fn new(
        api: Arc<dyn RegistryApi>,
        transport: Arc<dyn ImageTransport>,
        location: ArtifactLocation,
    ) -> Self {
        Self {
            api,
            transport,
            location,
        }
    }

    pub fn location(&self) -> &ArtifactLocation {
        &self.location
    }

    /// Create the repository unless it already exists.
    pub async fn ensure_repository(&self) -> Result<(), PublishError> {
        let name = &self.location.repository;
        match self.api.create_repository(name).await {
            Ok(()) => {
                info!(repository = %name, "Repository created");
                Ok(())
            }
            Err(RegistryError::RepositoryExists(_)) => {
                info!(repository = %name, "Repository exists");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Obtain a fresh token and log the transport in with it.
    pub async fn authenticate(&self) -> Result<Credentials, PublishError> {
        info!("Attempting registry login");
        let token = self.api.authorization_token().await?;
        let credentials = Credentials::decode(&token)?;

        self.transport
            .login(&credentials)
            .await
            .map_err(|source| PublishError::Authentication {
                endpoint: credentials.endpoint.clone(),
                source,
            })?;

        info!(endpoint = %credentials.endpoint, "Registry login succeeded");
        Ok(credentials)
    }

    /// Tag `local` as `remote`, push it, then drop the remote-named local copy.
    pub async fn publish(
        &self,
        local: &LocalImage,
        remote: &ArtifactReference,
    ) -> Result<(), PublishError> {
        let local_name = local.to_string();
        let remote_name = remote.to_string();

        self.transport
            .tag(&local_name, &remote_name)
            .await
            .map_err(|_| PublishError::LocalImageMissing {
                image: local_name.clone(),
            })?;

        self.transport
            .push(&remote_name)
            .await
            .map_err(|source| PublishError::Transfer {
                image: remote_name.clone(),
                source,
            })?;

        // Non-fatal: the push already succeeded
        if let Err(e) = self.transport.remove(&remote_name).await {
            warn!(image = %remote_name, error = %e, "Failed to remove local copy");
        }

        info!(local = %local_name, remote = %remote_name, "Pushed image");
        Ok(())
    }

    /// Manifest of the image tagged `tag`, if published.
    pub async fn find_image(
        &self,
        tag: &ArtifactTag,
    ) -> Result<Option<ImageManifest>, PublishError> {
        Ok(self.api.find_image(&self.location.repository, tag).await?)
    }

    /// Store an existing manifest under another tag.
    pub async fn put_manifest(
        &self,
        tag: &ArtifactTag,
        manifest: &ImageManifest,
    ) -> Result<(), PublishError> {
        self.api
            .put_image(&self.location.repository, tag, manifest)
            .await?;
        info!(repository = %self.location.repository, %tag, "Tagged image");
        Ok(())
    }

    /// Duplicate `existing` under `new_tag` without moving layers.
    ///
    /// Best-effort: failures are recorded in `diag` and reported as `false`.
    pub async fn add_tag(
        &self,
        existing: &ArtifactTag,
        new_tag: &ArtifactTag,
        diag: &mut Diagnostics,
    ) -> bool {
        match self.try_add_tag(existing, new_tag).await {
            Ok(()) => true,
            Err(e) => {
                diag.warn(Warning::additional_tag(format!(
                    "Unable to add additional tag {new_tag}: {e}"
                )));
                false
            }
        }
    }

    async fn try_add_tag(
        &self,
        existing: &ArtifactTag,
        new_tag: &ArtifactTag,
    ) -> Result<(), PublishError> {
        let manifest =
            self.find_image(existing)
                .await?
                .ok_or_else(|| PublishError::ImageNotFound {
                    repository: self.location.repository.clone(),
                    tag: existing.to_string(),
                })?;
        self.put_manifest(new_tag, &manifest).await
    }
}
