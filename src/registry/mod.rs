// ABOUTME: Container registry publishing.
// ABOUTME: Exposes registry/transport seams, credentials decoding and RegistryPublisher.

mod credentials;
mod publisher;
mod traits;

pub use credentials::{Credentials, CredentialsError};
pub use publisher::{PublishError, RegistryPublisher};
pub use traits::{
    AuthorizationToken, ImageManifest, ImageTransport, RegistryApi, RegistryError,
    TransportError,
};
