// ABOUTME: StackQuery backed by CloudFormation DescribeStacks.
// ABOUTME: Maps the "does not exist" validation error to StackQueryError::NotFound.

use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_cloudformation::Client;

use super::describe;
use crate::stack::{StackOutput, StackQuery, StackQueryError};
use crate::types::StackName;

pub struct CloudFormationStacks {
    client: Client,
}

impl CloudFormationStacks {
    pub fn new(config: &SdkConfig) -> Self {
        Self {
            client: Client::new(config),
        }
    }
}

#[async_trait]
impl StackQuery for CloudFormationStacks {
    async fn outputs(&self, stack: &StackName) -> Result<Vec<StackOutput>, StackQueryError> {
        let output = self
            .client
            .describe_stacks()
            .stack_name(stack.as_str())
            .send()
            .await
            .map_err(|e| {
                let message = describe(&e);
                if message.contains("does not exist") {
                    StackQueryError::NotFound
                } else {
                    StackQueryError::Backend(message)
                }
            })?;

        let stack = output.stacks().first().ok_or(StackQueryError::NotFound)?;
        Ok(stack
            .outputs()
            .iter()
            .filter_map(|o| match (o.output_key(), o.output_value()) {
                (Some(key), Some(value)) => Some(StackOutput::new(key, value)),
                _ => None,
            })
            .collect())
    }
}
