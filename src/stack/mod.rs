// ABOUTME: Resolves the managed services of an application from its environment stack.
// ABOUTME: Services are the values of stack outputs whose key ends in "EcsServiceName".

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info};

use crate::config::EnvironmentContext;
use crate::types::{ApplicationName, ServiceId, StackName};

/// Output keys ending with this marker name an ECS service.
pub const SERVICE_OUTPUT_SUFFIX: &str = "EcsServiceName";

/// One key/value output of an infrastructure stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackOutput {
    pub key: String,
    pub value: String,
}

impl StackOutput {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Infrastructure stack query primitive.
#[async_trait]
pub trait StackQuery: Send + Sync {
    /// Outputs of `stack`, in the order the backend enumerates them.
    async fn outputs(&self, stack: &StackName) -> Result<Vec<StackOutput>, StackQueryError>;
}

/// Errors reported by a [`StackQuery`] backend.
#[derive(Debug, thiserror::Error)]
pub enum StackQueryError {
    #[error("stack does not exist")]
    NotFound,

    #[error("{0}")]
    Backend(String),
}

/// Errors from resolving stack topology.
#[derive(Debug, thiserror::Error)]
pub enum StackError {
    #[error(
        "{environment} cluster not found (stack {stack}); create the environment using `create_environment` first"
    )]
    NotFound { environment: String, stack: String },

    #[error("failed to query stack {stack}: {reason}")]
    Query { stack: String, reason: String },
}

/// The managed services of one application in one environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackTopology {
    pub stack: StackName,
    /// Rollout order; only decides display colors, not precedence.
    pub services: Vec<ServiceId>,
}

impl StackTopology {
    pub fn from_outputs(stack: StackName, outputs: &[StackOutput]) -> Self {
        let services = outputs
            .iter()
            .filter(|output| output.key.ends_with(SERVICE_OUTPUT_SUFFIX))
            .map(|output| ServiceId::new(output.value.clone()))
            .collect();
        Self { stack, services }
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}

/// Queries the environment stack afresh on every call.
#[derive(Clone)]
pub struct StackTopologyResolver {
    query: Arc<dyn StackQuery>,
}

impl StackTopologyResolver {
    pub fn new(query: Arc<dyn StackQuery>) -> Self {
        Self { query }
    }

    pub async fn resolve(
        &self,
        environment: &EnvironmentContext,
        application: &ApplicationName,
    ) -> Result<StackTopology, StackError> {
        let stack = environment.stack_name(application);
        debug!(%stack, "Describing stack");

        let outputs = self.query.outputs(&stack).await.map_err(|e| match e {
            StackQueryError::NotFound => StackError::NotFound {
                environment: environment.name.clone(),
                stack: stack.to_string(),
            },
            StackQueryError::Backend(reason) => StackError::Query {
                stack: stack.to_string(),
                reason,
            },
        })?;

        let topology = StackTopology::from_outputs(stack, &outputs);
        info!(
            stack = %topology.stack,
            services = topology.services.len(),
            "Resolved stack topology"
        );
        Ok(topology)
    }
}
