// ABOUTME: Custom serde deserializers for config types.
// ABOUTME: Validates the application name and requires at least one environment.

use serde::Deserialize;
use std::collections::BTreeMap;

use super::EnvironmentConfig;
use crate::types::ApplicationName;

pub fn deserialize_application_name<'de, D>(deserializer: D) -> Result<ApplicationName, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    ApplicationName::new(&s).map_err(serde::de::Error::custom)
}

pub fn deserialize_environments<'de, D>(
    deserializer: D,
) -> Result<BTreeMap<String, EnvironmentConfig>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let environments: BTreeMap<String, EnvironmentConfig> = BTreeMap::deserialize(deserializer)?;

    if environments.is_empty() {
        return Err(serde::de::Error::custom(
            "at least one environment is required",
        ));
    }

    if let Some(name) = environments.keys().find(|name| name.trim().is_empty()) {
        return Err(serde::de::Error::custom(format!(
            "invalid environment name: '{name}'"
        )));
    }

    Ok(environments)
}
