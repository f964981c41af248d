// ABOUTME: AWS-backed implementations of the registry, stack, descriptor and rollout seams.
// ABOUTME: Every client is built for the region of the target environment.

mod cloudformation;
mod ecr;
mod ecs;
mod ssm;

pub use cloudformation::CloudFormationStacks;
pub use ecr::EcrRegistry;
pub use ecs::{EcsDescriptorAssembler, EcsRollout};
pub use ssm::ParameterStore;

use aws_config::{BehaviorVersion, Region, SdkConfig};
use aws_sdk_ecr::error::DisplayErrorContext;

/// Shared SDK configuration for `region`, using the default credential chain.
pub async fn sdk_config(region: &str) -> SdkConfig {
    aws_config::defaults(BehaviorVersion::latest())
        .region(Region::new(region.to_owned()))
        .load()
        .await
}

/// Render an SDK error with its full source chain.
pub(crate) fn describe<E: std::error::Error>(err: E) -> String {
    DisplayErrorContext(err).to_string()
}
