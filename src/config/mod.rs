// ABOUTME: Configuration types and parsing for liftoff.yml.
// ABOUTME: Handles YAML parsing, discovery, and per-environment resolution.

mod deserialize;
mod env_value;
mod environment;
mod init;

pub use env_value::EnvValue;
pub use environment::{EnvironmentConfig, EnvironmentContext};
pub use init::init_config;

use crate::error::{Error, Result};
use crate::types::ApplicationName;
use deserialize::{deserialize_application_name, deserialize_environments};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_FILENAME: &str = "liftoff.yml";
pub const CONFIG_FILENAME_ALT: &str = "liftoff.yaml";
pub const CONFIG_FILENAME_DIR: &str = ".liftoff/config.yml";

/// Default location of the sample file listing required configuration keys.
pub const DEFAULT_ENV_SAMPLE: &str = "env.sample";

/// Environment variables consulted, in order, for the operator identity.
const OPERATOR_VARS: [&str; 3] = ["USER", "LOGNAME", "USERNAME"];

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(deserialize_with = "deserialize_application_name")]
    pub application: ApplicationName,

    #[serde(default)]
    pub account_id: Option<EnvValue>,

    /// Identity embedded in dirty-tree tags. Falls back to the login name.
    #[serde(default)]
    pub operator: Option<EnvValue>,

    #[serde(default = "default_env_sample")]
    pub env_sample: PathBuf,

    #[serde(default)]
    pub source: SourceConfig,

    #[serde(default)]
    pub rollout: RolloutConfig,

    #[serde(deserialize_with = "deserialize_environments")]
    pub environments: BTreeMap<String, EnvironmentConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    /// Whether untracked files make the working tree dirty.
    #[serde(default = "default_include_untracked")]
    pub include_untracked: bool,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            include_untracked: default_include_untracked(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RolloutConfig {
    #[serde(default = "default_poll_interval", with = "humantime_serde")]
    pub poll_interval: Duration,

    #[serde(default = "default_rollout_timeout", with = "humantime_serde")]
    pub timeout: Duration,
}

impl Default for RolloutConfig {
    fn default() -> Self {
        Self {
            poll_interval: default_poll_interval(),
            timeout: default_rollout_timeout(),
        }
    }
}

fn default_env_sample() -> PathBuf {
    PathBuf::from(DEFAULT_ENV_SAMPLE)
}

fn default_include_untracked() -> bool {
    true
}

fn default_poll_interval() -> Duration {
    Duration::from_secs(5)
}

fn default_rollout_timeout() -> Duration {
    Duration::from_secs(20 * 60)
}

impl Config {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(Error::from)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn discover(dir: &Path) -> Result<Self> {
        let candidates = [
            dir.join(CONFIG_FILENAME),
            dir.join(CONFIG_FILENAME_ALT),
            dir.join(CONFIG_FILENAME_DIR),
        ];

        for path in &candidates {
            if path.exists() {
                return Self::load(path);
            }
        }

        Err(Error::ConfigNotFound(dir.to_path_buf()))
    }

    /// Replace the application name, e.g. from a `--name` flag.
    pub fn with_application(mut self, name: &str) -> Result<Self> {
        self.application =
            ApplicationName::new(name).map_err(|e| Error::InvalidConfig(e.to_string()))?;
        Ok(self)
    }

    /// Resolve one named environment into the context handed to components.
    pub fn for_environment(&self, name: &str) -> Result<EnvironmentContext> {
        let env = self
            .environments
            .get(name)
            .ok_or_else(|| Error::UnknownEnvironment(name.to_string()))?;

        let account_id = match env.account_id.as_ref().or(self.account_id.as_ref()) {
            Some(value) => value.resolve()?,
            None => {
                return Err(Error::InvalidConfig(format!(
                    "no account_id configured for environment '{name}'"
                )));
            }
        };

        Ok(EnvironmentContext::new(
            name,
            env.region.clone(),
            account_id,
            env.cluster.clone(),
        ))
    }

    /// Operator identity used to namespace dirty-tree builds.
    pub fn operator(&self) -> Result<String> {
        if let Some(ref operator) = self.operator {
            return operator.resolve();
        }

        OPERATOR_VARS
            .iter()
            .find_map(|var| std::env::var(var).ok().filter(|v| !v.is_empty()))
            .ok_or_else(|| {
                Error::InvalidConfig(
                    "cannot determine operator identity; set `operator` in liftoff.yml"
                        .to_string(),
                )
            })
    }

    /// Env sample path, resolved against the project directory when relative.
    pub fn env_sample_path(&self, project_dir: &Path) -> PathBuf {
        if self.env_sample.is_absolute() {
            self.env_sample.clone()
        } else {
            project_dir.join(&self.env_sample)
        }
    }

    pub fn template() -> Self {
        let mut environments = BTreeMap::new();
        environments.insert(
            "staging".to_string(),
            EnvironmentConfig {
                region: "us-east-1".to_string(),
                account_id: None,
                cluster: None,
            },
        );

        Config {
            application: ApplicationName::new("my-app").expect("template name is valid"),
            account_id: Some(EnvValue::from("123456789012")),
            operator: None,
            env_sample: default_env_sample(),
            source: SourceConfig::default(),
            rollout: RolloutConfig::default(),
            environments,
        }
    }
}
