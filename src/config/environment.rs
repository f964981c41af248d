// ABOUTME: Per-environment settings and the resolved environment context.
// ABOUTME: Derives registry host, cluster, stack and repository names explicitly.

use serde::Deserialize;

use super::EnvValue;
use crate::types::{ApplicationName, ArtifactLocation, ClusterName, StackName};

/// One entry of the `environments` map in the project file.
#[derive(Debug, Clone, Deserialize)]
pub struct EnvironmentConfig {
    pub region: String,

    /// Overrides the top-level `account_id` for this environment.
    #[serde(default)]
    pub account_id: Option<EnvValue>,

    /// Overrides the default `cluster-<environment>` cluster name.
    #[serde(default)]
    pub cluster: Option<String>,
}

/// Everything downstream components need to know about one environment.
///
/// Built once per invocation by [`Config::for_environment`](super::Config::for_environment)
/// and handed to each component, so nothing reads process-wide state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvironmentContext {
    pub name: String,
    pub region: String,
    pub account_id: String,
    pub cluster: ClusterName,
}

impl EnvironmentContext {
    pub fn new(
        name: impl Into<String>,
        region: impl Into<String>,
        account_id: impl Into<String>,
        cluster: Option<String>,
    ) -> Self {
        let name = name.into();
        let cluster = ClusterName::new(cluster.unwrap_or_else(|| default_cluster_name(&name)));
        Self {
            name,
            region: region.into(),
            account_id: account_id.into(),
            cluster,
        }
    }

    pub fn registry_host(&self) -> String {
        format!("{}.dkr.ecr.{}.amazonaws.com", self.account_id, self.region)
    }

    /// Name of the infrastructure stack holding the application's services.
    pub fn stack_name(&self, application: &ApplicationName) -> StackName {
        StackName::new(format!("{}-{}", application, self.name))
    }

    pub fn artifact_location(&self, application: &ApplicationName) -> ArtifactLocation {
        ArtifactLocation {
            registry_host: self.registry_host(),
            account_id: self.account_id.clone(),
            region: self.region.clone(),
            repository: application.repository_name(),
        }
    }

    pub fn is_production(&self) -> bool {
        self.name == "production"
    }
}

fn default_cluster_name(environment: &str) -> String {
    format!("cluster-{environment}")
}
