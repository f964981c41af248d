// ABOUTME: ECS-backed descriptor assembly and service rollout.
// ABOUTME: Derives descriptors from the running task definition and waits for steady state.

use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_ecs::Client;
use aws_sdk_ecs::types::{
    self as ecs, ContainerDefinition, DeploymentRolloutState, KeyValuePair, TaskDefinition,
    TaskDefinitionField,
};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info};

use super::describe;
use super::ssm::ParameterStore;
use crate::deploy::{RolloutError, RolloutExecutor, RolloutTarget};
use crate::descriptor::{
    ContainerDependency, ContainerDescriptor, DescriptorAssembler, DescriptorError,
    DescriptorRequest, EfsVolume, EnvironmentVariable, HealthCheck, HostVolume,
    InferenceAccelerator, LogConfiguration, MountPoint, PlacementConstraint, PortMapping,
    ProxyConfiguration, ResourceTag, SecretReference, TaskDescriptor, Volume, VolumeFrom,
    read_env_sample,
};

/// Builds descriptors from the service's current task definition.
///
/// The application container gets the new image and its environment is
/// replaced with the values stored in Parameter Store.
pub struct EcsDescriptorAssembler {
    client: Client,
    parameters: ParameterStore,
}

impl EcsDescriptorAssembler {
    pub fn new(config: &SdkConfig) -> Self {
        Self {
            client: Client::new(config),
            parameters: ParameterStore::new(config),
        }
    }

    async fn current_definition(
        &self,
        request: &DescriptorRequest,
    ) -> Result<(TaskDefinition, Vec<ecs::Tag>), DescriptorError> {
        let no_definition = || DescriptorError::NoCurrentDefinition {
            service: request.service.to_string(),
        };

        let services = self
            .client
            .describe_services()
            .cluster(request.environment.cluster.as_str())
            .services(request.service.as_str())
            .send()
            .await
            .map_err(|e| DescriptorError::Backend(describe(&e)))?;
        let arn = services
            .services()
            .first()
            .and_then(|s| s.task_definition())
            .ok_or_else(no_definition)?;

        fetch_definition(&self.client, arn)
            .await
            .map_err(DescriptorError::Backend)?
            .ok_or_else(no_definition)
    }
}

#[async_trait]
impl DescriptorAssembler for EcsDescriptorAssembler {
    async fn assemble(
        &self,
        request: &DescriptorRequest,
    ) -> Result<TaskDescriptor, DescriptorError> {
        let required = read_env_sample(&request.env_sample)?;
        let stored = self
            .parameters
            .fetch(&request.environment.name, &request.application)
            .await?;

        let missing: Vec<String> = required
            .into_iter()
            .filter(|key| !stored.contains_key(key))
            .collect();
        if !missing.is_empty() {
            return Err(DescriptorError::MissingParameters { keys: missing });
        }

        let (definition, tags) = self.current_definition(request).await?;
        let mut descriptor = descriptor_from(&definition, &tags);
        let environment: Vec<EnvironmentVariable> = stored
            .into_iter()
            .map(|(name, value)| EnvironmentVariable { name, value })
            .collect();

        let image = request.artifact.to_string();
        let repository = request.artifact.repository_uri();
        let mut applied = false;
        for container in descriptor
            .container_definitions
            .iter_mut()
            .filter(|c| c.image.starts_with(&repository))
        {
            container.image = image.clone();
            container.environment = environment.clone();
            applied = true;
        }
        if !applied {
            // Definitions that predate the repository: the first container is the app.
            if let Some(container) = descriptor.container_definitions.first_mut() {
                container.image = image;
                container.environment = environment;
            }
        }

        debug!(
            service = %request.service,
            family = %descriptor.family,
            "Assembled task descriptor"
        );
        Ok(descriptor)
    }
}

/// Registers a descriptor, points the service at it and polls until settled.
pub struct EcsRollout {
    client: Client,
    poll_interval: Duration,
    timeout: Duration,
}

impl EcsRollout {
    pub fn new(config: &SdkConfig, poll_interval: Duration, timeout: Duration) -> Self {
        Self {
            client: Client::new(config),
            poll_interval,
            timeout,
        }
    }

    /// Registers a new revision of the definition the descriptor came from.
    ///
    /// Only container images and environments are taken from the descriptor;
    /// every other field of the source revision carries over unchanged.
    async fn register(&self, descriptor: &TaskDescriptor) -> Result<String, RolloutError> {
        let source_arn = descriptor.task_definition_arn.as_deref().ok_or_else(|| {
            RolloutError::Register(format!(
                "descriptor for {} has no source task definition",
                descriptor.family
            ))
        })?;
        let (source, tags) = fetch_definition(&self.client, source_arn)
            .await
            .map_err(RolloutError::Backend)?
            .ok_or_else(|| {
                RolloutError::Register(format!("task definition {source_arn} not found"))
            })?;
        let revision = revision_of(&source, descriptor)?;

        let output = self
            .client
            .register_task_definition()
            .set_family(revision.family)
            .set_container_definitions(revision.container_definitions)
            .set_task_role_arn(revision.task_role_arn)
            .set_execution_role_arn(revision.execution_role_arn)
            .set_network_mode(revision.network_mode)
            .set_volumes(revision.volumes)
            .set_placement_constraints(revision.placement_constraints)
            .set_requires_compatibilities(revision.requires_compatibilities)
            .set_cpu(revision.cpu)
            .set_memory(revision.memory)
            .set_pid_mode(revision.pid_mode)
            .set_ipc_mode(revision.ipc_mode)
            .set_proxy_configuration(revision.proxy_configuration)
            .set_inference_accelerators(revision.inference_accelerators)
            .set_ephemeral_storage(revision.ephemeral_storage)
            .set_runtime_platform(revision.runtime_platform)
            .set_tags((!tags.is_empty()).then_some(tags))
            .send()
            .await
            .map_err(|e| RolloutError::Register(describe(&e)))?;

        output
            .task_definition()
            .and_then(|t| t.task_definition_arn())
            .map(str::to_string)
            .ok_or_else(|| RolloutError::Register("no task definition ARN returned".to_string()))
    }

    async fn wait_for_steady_state(&self, target: &RolloutTarget) -> Result<(), RolloutError> {
        let deadline = Instant::now() + self.timeout;

        loop {
            let output = self
                .client
                .describe_services()
                .cluster(target.cluster.as_str())
                .services(target.service.as_str())
                .send()
                .await
                .map_err(|e| RolloutError::Backend(describe(&e)))?;
            let service = output.services().first().ok_or_else(|| {
                RolloutError::Backend(format!("service {} not found", target.service))
            })?;

            let deployments = service.deployments();
            if let Some(primary) = deployments.iter().find(|d| d.status() == Some("PRIMARY"))
                && primary.rollout_state() == Some(&DeploymentRolloutState::Failed)
            {
                return Err(RolloutError::Failed(
                    primary
                        .rollout_state_reason()
                        .unwrap_or("deployment failed")
                        .to_string(),
                ));
            }

            debug!(
                service = %target.service,
                deployments = deployments.len(),
                running = service.running_count(),
                desired = service.desired_count(),
                "Polled service"
            );
            if deployments.len() == 1 && service.running_count() == service.desired_count() {
                return Ok(());
            }

            if Instant::now() >= deadline {
                return Err(RolloutError::TimedOut(self.timeout));
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}

#[async_trait]
impl RolloutExecutor for EcsRollout {
    async fn roll_out(
        &self,
        target: &RolloutTarget,
        descriptor: &TaskDescriptor,
    ) -> Result<(), RolloutError> {
        let arn = self.register(descriptor).await?;
        info!(service = %target.service, %arn, "Registered task definition");

        self.client
            .update_service()
            .cluster(target.cluster.as_str())
            .service(target.service.as_str())
            .task_definition(&arn)
            .send()
            .await
            .map_err(|e| RolloutError::Update(describe(&e)))?;

        self.wait_for_steady_state(target).await
    }
}

/// A task definition revision together with its resource tags.
async fn fetch_definition(
    client: &Client,
    arn: &str,
) -> Result<Option<(TaskDefinition, Vec<ecs::Tag>)>, String> {
    let output = client
        .describe_task_definition()
        .task_definition(arn)
        .include(TaskDefinitionField::Tags)
        .send()
        .await
        .map_err(|e| describe(&e))?;
    Ok(output
        .task_definition()
        .cloned()
        .map(|definition| (definition, output.tags().to_vec())))
}

/// `source` with each descriptor container's image and environment applied.
fn revision_of(
    source: &TaskDefinition,
    descriptor: &TaskDescriptor,
) -> Result<TaskDefinition, RolloutError> {
    let mut containers = source.container_definitions().to_vec();
    for update in &descriptor.container_definitions {
        let container = containers
            .iter_mut()
            .find(|c| c.name() == Some(update.name.as_str()))
            .ok_or_else(|| {
                RolloutError::Register(format!(
                    "container {} is not part of {}",
                    update.name,
                    source
                        .task_definition_arn()
                        .unwrap_or(descriptor.family.as_str())
                ))
            })?;
        let environment: Vec<KeyValuePair> = update
            .environment
            .iter()
            .map(|e| KeyValuePair::builder().name(&e.name).value(&e.value).build())
            .collect();
        if container.image() != Some(update.image.as_str())
            || container.environment() != environment.as_slice()
        {
            container.image = Some(update.image.clone());
            container.environment = Some(environment);
        }
    }

    let mut revision = source.clone();
    revision.container_definitions = Some(containers);
    Ok(revision)
}

fn descriptor_from(definition: &TaskDefinition, tags: &[ecs::Tag]) -> TaskDescriptor {
    TaskDescriptor {
        family: definition.family().unwrap_or_default().to_string(),
        container_definitions: definition
            .container_definitions()
            .iter()
            .map(container_from)
            .collect(),
        task_role_arn: definition.task_role_arn().map(str::to_string),
        execution_role_arn: definition.execution_role_arn().map(str::to_string),
        network_mode: definition.network_mode().map(|m| m.as_str().to_string()),
        cpu: definition.cpu().map(str::to_string),
        memory: definition.memory().map(str::to_string),
        requires_compatibilities: definition
            .requires_compatibilities()
            .iter()
            .map(|c| c.as_str().to_string())
            .collect(),
        volumes: definition
            .volumes()
            .iter()
            .map(|v| Volume {
                name: v.name().map(str::to_string),
                host: v.host().map(|h| HostVolume {
                    source_path: h.source_path().map(str::to_string),
                }),
                efs_volume_configuration: v.efs_volume_configuration().map(|efs| EfsVolume {
                    file_system_id: efs.file_system_id().to_string(),
                    root_directory: efs.root_directory().map(str::to_string),
                }),
            })
            .collect(),
        placement_constraints: definition
            .placement_constraints()
            .iter()
            .map(|p| PlacementConstraint {
                constraint_type: p.r#type().map(|t| t.as_str().to_string()),
                expression: p.expression().map(str::to_string),
            })
            .collect(),
        ipc_mode: definition.ipc_mode().map(|m| m.as_str().to_string()),
        pid_mode: definition.pid_mode().map(|m| m.as_str().to_string()),
        proxy_configuration: definition
            .proxy_configuration()
            .map(|p| ProxyConfiguration {
                proxy_type: p.r#type().map(|t| t.as_str().to_string()),
                container_name: p.container_name().to_string(),
                properties: p.properties().iter().filter_map(variable_from).collect(),
            }),
        inference_accelerators: definition
            .inference_accelerators()
            .iter()
            .map(|a| InferenceAccelerator {
                device_name: a.device_name().to_string(),
                device_type: a.device_type().to_string(),
            })
            .collect(),
        tags: tags
            .iter()
            .filter_map(|t| {
                Some(ResourceTag {
                    key: t.key()?.to_string(),
                    value: t.value().unwrap_or_default().to_string(),
                })
            })
            .collect(),
        task_definition_arn: definition.task_definition_arn().map(str::to_string),
        revision: Some(definition.revision()),
    }
}

fn variable_from(pair: &KeyValuePair) -> Option<EnvironmentVariable> {
    Some(EnvironmentVariable {
        name: pair.name()?.to_string(),
        value: pair.value().unwrap_or_default().to_string(),
    })
}

fn container_from(container: &ContainerDefinition) -> ContainerDescriptor {
    ContainerDescriptor {
        name: container.name().unwrap_or_default().to_string(),
        image: container.image().unwrap_or_default().to_string(),
        cpu: container.cpu(),
        memory: container.memory(),
        memory_reservation: container.memory_reservation(),
        essential: container.essential(),
        port_mappings: container
            .port_mappings()
            .iter()
            .map(|p| PortMapping {
                container_port: p.container_port(),
                host_port: p.host_port(),
                protocol: p.protocol().map(|t| t.as_str().to_string()),
            })
            .collect(),
        environment: container
            .environment()
            .iter()
            .filter_map(variable_from)
            .collect(),
        command: container.command().to_vec(),
        entry_point: container.entry_point().to_vec(),
        working_directory: container.working_directory().map(str::to_string),
        log_configuration: container.log_configuration().map(|l| LogConfiguration {
            log_driver: l.log_driver().as_str().to_string(),
            options: l
                .options()
                .map(|o| o.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
                .unwrap_or_default(),
        }),
        secrets: container
            .secrets()
            .iter()
            .map(|s| SecretReference {
                name: s.name().to_string(),
                value_from: s.value_from().to_string(),
            })
            .collect(),
        mount_points: container
            .mount_points()
            .iter()
            .map(|m| MountPoint {
                source_volume: m.source_volume().map(str::to_string),
                container_path: m.container_path().map(str::to_string),
                read_only: m.read_only(),
            })
            .collect(),
        volumes_from: container
            .volumes_from()
            .iter()
            .map(|v| VolumeFrom {
                source_container: v.source_container().map(str::to_string),
                read_only: v.read_only(),
            })
            .collect(),
        depends_on: container
            .depends_on()
            .iter()
            .map(|d| ContainerDependency {
                container_name: d.container_name().to_string(),
                condition: d.condition().as_str().to_string(),
            })
            .collect(),
        health_check: container.health_check().map(|h| HealthCheck {
            command: h.command().to_vec(),
            interval: h.interval(),
            timeout: h.timeout(),
            retries: h.retries(),
            start_period: h.start_period(),
        }),
    }
}
