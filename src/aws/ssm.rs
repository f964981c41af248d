// ABOUTME: Reads per-environment configuration from SSM Parameter Store.
// ABOUTME: Parameters live under /<environment>/<application>/ and are decrypted on read.

use aws_config::SdkConfig;
use aws_sdk_ssm::Client;
use std::collections::BTreeMap;
use tracing::debug;

use super::describe;
use crate::descriptor::DescriptorError;
use crate::types::ApplicationName;

#[derive(Clone)]
pub struct ParameterStore {
    client: Client,
}

impl ParameterStore {
    pub fn new(config: &SdkConfig) -> Self {
        Self {
            client: Client::new(config),
        }
    }

    pub fn path_prefix(environment: &str, application: &ApplicationName) -> String {
        format!("/{environment}/{application}/")
    }

    /// All parameters for the application, keyed by name without the path prefix.
    pub async fn fetch(
        &self,
        environment: &str,
        application: &ApplicationName,
    ) -> Result<BTreeMap<String, String>, DescriptorError> {
        let prefix = Self::path_prefix(environment, application);
        let mut values = BTreeMap::new();
        let mut next_token = None;

        loop {
            let page = self
                .client
                .get_parameters_by_path()
                .path(&prefix)
                .with_decryption(true)
                .set_next_token(next_token)
                .send()
                .await
                .map_err(|e| DescriptorError::Backend(describe(&e)))?;

            for parameter in page.parameters() {
                if let (Some(name), Some(value)) = (parameter.name(), parameter.value()) {
                    let key = name.strip_prefix(&prefix).unwrap_or(name);
                    values.insert(key.to_string(), value.to_string());
                }
            }

            match page.next_token() {
                Some(token) => next_token = Some(token.to_string()),
                None => break,
            }
        }

        debug!(%prefix, count = values.len(), "Fetched configuration parameters");
        Ok(values)
    }
}
