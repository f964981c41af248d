// ABOUTME: RegistryApi backed by Amazon ECR.
// ABOUTME: New repositories are created with scan-on-push enabled.

use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_ecr::Client;
use aws_sdk_ecr::types::{ImageIdentifier, ImageScanningConfiguration};
use tracing::debug;

use super::describe;
use crate::registry::{AuthorizationToken, ImageManifest, RegistryApi, RegistryError};
use crate::types::ArtifactTag;

pub struct EcrRegistry {
    client: Client,
}

impl EcrRegistry {
    pub fn new(config: &SdkConfig) -> Self {
        Self {
            client: Client::new(config),
        }
    }
}

#[async_trait]
impl RegistryApi for EcrRegistry {
    async fn create_repository(&self, name: &str) -> Result<(), RegistryError> {
        let scanning = ImageScanningConfiguration::builder()
            .scan_on_push(true)
            .build();
        match self
            .client
            .create_repository()
            .repository_name(name)
            .image_scanning_configuration(scanning)
            .send()
            .await
        {
            Ok(_) => Ok(()),
            Err(e)
                if e.as_service_error()
                    .is_some_and(|s| s.is_repository_already_exists_exception()) =>
            {
                Err(RegistryError::RepositoryExists(name.to_string()))
            }
            Err(e) => Err(RegistryError::Api(describe(&e))),
        }
    }

    async fn authorization_token(&self) -> Result<AuthorizationToken, RegistryError> {
        let output = self
            .client
            .get_authorization_token()
            .send()
            .await
            .map_err(|e| RegistryError::Api(describe(&e)))?;

        let data = output
            .authorization_data()
            .first()
            .ok_or(RegistryError::NoAuthorizationData)?;
        match (data.authorization_token(), data.proxy_endpoint()) {
            (Some(token), Some(endpoint)) => Ok(AuthorizationToken {
                token: token.to_string(),
                endpoint: endpoint.to_string(),
            }),
            _ => Err(RegistryError::NoAuthorizationData),
        }
    }

    async fn find_image(
        &self,
        repository: &str,
        tag: &ArtifactTag,
    ) -> Result<Option<ImageManifest>, RegistryError> {
        let result = self
            .client
            .batch_get_image()
            .repository_name(repository)
            .image_ids(ImageIdentifier::builder().image_tag(tag.as_str()).build())
            .send()
            .await;

        let output = match result {
            Ok(output) => output,
            Err(e)
                if e.as_service_error()
                    .is_some_and(|s| s.is_repository_not_found_exception()) =>
            {
                debug!(repository, "Repository does not exist yet");
                return Ok(None);
            }
            Err(e) => return Err(RegistryError::Api(describe(&e))),
        };

        Ok(output.images().first().and_then(|image| {
            image.image_manifest().map(|body| ImageManifest {
                body: body.to_string(),
                media_type: image.image_manifest_media_type().map(str::to_string),
            })
        }))
    }

    async fn put_image(
        &self,
        repository: &str,
        tag: &ArtifactTag,
        manifest: &ImageManifest,
    ) -> Result<(), RegistryError> {
        self.client
            .put_image()
            .repository_name(repository)
            .image_tag(tag.as_str())
            .image_manifest(&manifest.body)
            .set_image_manifest_media_type(manifest.media_type.clone())
            .send()
            .await
            .map_err(|e| RegistryError::Api(describe(&e)))?;
        Ok(())
    }
}
