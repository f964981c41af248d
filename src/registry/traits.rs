// ABOUTME: Registry and image-transport primitives behind the publisher.
// ABOUTME: RegistryApi talks to the registry service, ImageTransport moves image bytes.

use async_trait::async_trait;

use super::credentials::Credentials;
use crate::types::ArtifactTag;

/// Raw authorization data as returned by the registry.
#[derive(Clone)]
pub struct AuthorizationToken {
    /// Base64 of `username:secret`.
    pub token: String,
    /// Registry endpoint the token is valid for.
    pub endpoint: String,
}

impl std::fmt::Debug for AuthorizationToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthorizationToken")
            .field("token", &"<redacted>")
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

/// An image manifest, enough to re-tag an image without moving layers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageManifest {
    pub body: String,
    pub media_type: Option<String>,
}

/// Registry control-plane operations.
#[async_trait]
pub trait RegistryApi: Send + Sync {
    /// Create a repository. Fails with [`RegistryError::RepositoryExists`] if present.
    async fn create_repository(&self, name: &str) -> Result<(), RegistryError>;

    /// Fetch a short-lived authorization token.
    async fn authorization_token(&self) -> Result<AuthorizationToken, RegistryError>;

    /// Manifest of the image tagged `tag`, or `None` if the tag (or repository) is absent.
    async fn find_image(
        &self,
        repository: &str,
        tag: &ArtifactTag,
    ) -> Result<Option<ImageManifest>, RegistryError>;

    /// Store `manifest` under `tag`.
    async fn put_image(
        &self,
        repository: &str,
        tag: &ArtifactTag,
        manifest: &ImageManifest,
    ) -> Result<(), RegistryError>;
}

/// Errors from registry control-plane calls.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("repository already exists: {0}")]
    RepositoryExists(String),

    #[error("registry returned no authorization data")]
    NoAuthorizationData,

    #[error("registry request failed: {0}")]
    Api(String),
}

/// Moves images between the local image store and a registry.
#[async_trait]
pub trait ImageTransport: Send + Sync {
    async fn login(&self, credentials: &Credentials) -> Result<(), TransportError>;

    /// Add `target` as another name for the local image `source`.
    async fn tag(&self, source: &str, target: &str) -> Result<(), TransportError>;

    async fn push(&self, image: &str) -> Result<(), TransportError>;

    /// Remove a local image name.
    async fn remove(&self, image: &str) -> Result<(), TransportError>;
}

/// Errors from image transport commands.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("`{command}` failed: {reason}")]
    Command { command: String, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
