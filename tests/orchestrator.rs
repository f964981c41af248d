// ABOUTME: Integration tests for the concurrent deployment orchestrator.
// ABOUTME: One worker's failure must fail the deployment without cancelling the others.

mod support;

use liftoff::build::ImageBuilder;
use liftoff::deploy::{
    DeployError, DeploymentOrchestrator, DeploymentRequest, RolloutOutcome, RolloutStatus,
};
use liftoff::descriptor::TaskDescriptorGenerator;
use liftoff::diagnostics::{Diagnostics, WarningKind};
use liftoff::output::{Output, OutputMode};
use liftoff::registry::RegistryPublisher;
use liftoff::source::{VersionError, VersionResolver};
use liftoff::stack::StackTopologyResolver;
use liftoff::types::ServiceId;
use liftoff::upload::ArtifactUploader;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use support::{
    FakeAssembler, FakeRegistry, FakeRollout, FakeSource, FakeStacks, FakeTransport,
    LocalStoreBuildTool, application, environment, location, tag,
};

const HEAD: &str = "cafebabecafebabecafebabecafebabecafebabe";

const THREE_SERVICES: &[(&str, &str)] = &[
    ("WebEcsServiceName", "svc-web"),
    ("WorkerEcsServiceName", "svc-worker"),
    ("WebURL", "https://web.example.com"),
    ("CronEcsServiceName", "svc-cron"),
];

struct Harness {
    _dir: tempfile::TempDir,
    env_sample: PathBuf,
    registry: Arc<FakeRegistry>,
    tool: Arc<LocalStoreBuildTool>,
    source: Arc<FakeSource>,
    rollout: Arc<FakeRollout>,
    orchestrator: DeploymentOrchestrator,
}

struct Setup {
    outputs: &'static [(&'static str, &'static str)],
    source: FakeSource,
    registry: FakeRegistry,
    assembler: FakeAssembler,
    rollout: FakeRollout,
    write_env_sample: bool,
}

impl Default for Setup {
    fn default() -> Self {
        Self {
            outputs: THREE_SERVICES,
            source: FakeSource::new(HEAD),
            registry: FakeRegistry::new(),
            assembler: FakeAssembler::new(),
            rollout: FakeRollout::new(),
            write_env_sample: true,
        }
    }
}

impl Setup {
    fn build(self) -> Harness {
        support::init_tracing();
        let dir = tempfile::tempdir().unwrap();
        let env_sample = dir.path().join("env.sample");
        if self.write_env_sample {
            fs::write(&env_sample, "PORT=80\nLABEL=x\n").unwrap();
        }

        let registry = Arc::new(self.registry);
        let transport = Arc::new(FakeTransport::new(registry.clone()));
        let tool = Arc::new(LocalStoreBuildTool::new(transport.clone()));
        let source = Arc::new(self.source);
        let rollout = Arc::new(self.rollout.observing(source.clone()));
        let stacks = FakeStacks::new().with_stack("dummy-staging", self.outputs);

        let uploader = ArtifactUploader::new(
            ImageBuilder::new(source.clone(), tool.clone(), application()),
            RegistryPublisher::new(registry.clone(), transport, location()),
            dir.path(),
        );
        let orchestrator = DeploymentOrchestrator::new(
            StackTopologyResolver::new(Arc::new(stacks)),
            VersionResolver::new(source.clone(), "alice"),
            uploader,
            TaskDescriptorGenerator::new(Arc::new(self.assembler), application()),
            rollout.clone(),
            Output::new(OutputMode::Quiet),
        );

        Harness {
            _dir: dir,
            env_sample,
            registry,
            tool,
            source,
            rollout,
            orchestrator,
        }
    }
}

impl Harness {
    fn request(&self, version: Option<&str>) -> DeploymentRequest {
        DeploymentRequest {
            application: application(),
            environment: environment(),
            version: version.map(str::to_string),
            env_sample: self.env_sample.clone(),
            force_rebuild: false,
        }
    }
}

fn statuses(outcomes: &[RolloutOutcome]) -> Vec<(&str, bool)> {
    outcomes
        .iter()
        .map(|o| (o.service.as_str(), o.is_success()))
        .collect()
}

#[tokio::test]
async fn all_services_roll_out_the_same_artifact() {
    let h = Setup::default().build();
    let mut diag = Diagnostics::default();

    let result = h.orchestrator.run(&h.request(None), &mut diag).await.unwrap();

    assert!(result.is_success());
    assert!(result.upload.was_built());
    assert_eq!(
        statuses(&result.outcomes),
        vec![("svc-web", true), ("svc-worker", true), ("svc-cron", true)]
    );

    let image = location().reference(tag(HEAD)).to_string();
    assert_eq!(
        h.rollout.rolled_out(),
        vec![
            ("svc-cron".to_string(), image.clone()),
            ("svc-web".to_string(), image.clone()),
            ("svc-worker".to_string(), image),
        ]
    );
    assert_eq!(h.tool.build_count(), 1);
}

#[tokio::test]
async fn one_failed_rollout_fails_deployment_but_not_siblings() {
    let h = Setup {
        rollout: FakeRollout::new().failing_for("svc-worker"),
        ..Setup::default()
    }
    .build();
    let mut diag = Diagnostics::default();

    let result = h.orchestrator.run(&h.request(None), &mut diag).await.unwrap();

    assert!(!result.is_success());
    assert_eq!(
        statuses(&result.outcomes),
        vec![("svc-web", true), ("svc-worker", false), ("svc-cron", true)]
    );
    assert_eq!(h.rollout.rolled_out().len(), 3);

    let failed: Vec<_> = result.failures().collect();
    assert_eq!(failed.len(), 1);
    match &failed[0].status {
        RolloutStatus::Failed { reason } => assert!(reason.contains("circuit breaker")),
        RolloutStatus::Succeeded => unreachable!(),
    }
}

#[tokio::test]
async fn panicking_worker_counts_as_failed() {
    let h = Setup {
        rollout: FakeRollout::new().panicking_for("svc-web"),
        ..Setup::default()
    }
    .build();
    let mut diag = Diagnostics::default();

    let result = h.orchestrator.run(&h.request(None), &mut diag).await.unwrap();

    assert!(!result.is_success());
    assert_eq!(
        statuses(&result.outcomes),
        vec![("svc-web", false), ("svc-worker", true), ("svc-cron", true)]
    );
}

#[tokio::test]
async fn descriptor_failure_skips_that_rollout_only() {
    let h = Setup {
        assembler: FakeAssembler::new().failing_for("svc-cron"),
        ..Setup::default()
    }
    .build();
    let mut diag = Diagnostics::default();

    let result = h.orchestrator.run(&h.request(None), &mut diag).await.unwrap();

    assert_eq!(
        statuses(&result.outcomes),
        vec![("svc-web", true), ("svc-worker", true), ("svc-cron", false)]
    );
    let rolled: Vec<_> = h.rollout.rolled_out().into_iter().map(|(s, _)| s).collect();
    assert_eq!(rolled, vec!["svc-web", "svc-worker"]);
}

#[tokio::test]
async fn already_published_artifact_is_not_rebuilt() {
    let h = Setup {
        registry: FakeRegistry::new().with_image("dummy-repo", HEAD),
        ..Setup::default()
    }
    .build();
    let mut diag = Diagnostics::default();

    let result = h.orchestrator.run(&h.request(None), &mut diag).await.unwrap();

    assert!(result.is_success());
    assert!(!result.upload.was_built());
    assert_eq!(h.tool.build_count(), 0);
}

#[tokio::test]
async fn missing_stack_aborts_before_build() {
    let h = Setup {
        outputs: &[],
        ..Setup::default()
    }
    .build();
    let mut request = h.request(None);
    request.environment =
        liftoff::config::EnvironmentContext::new("qa", "us-west-2", "123456789012", None);
    let mut diag = Diagnostics::default();

    let err = h.orchestrator.run(&request, &mut diag).await.unwrap_err();

    assert!(matches!(err, DeployError::Stack(_)));
    assert_eq!(h.tool.build_count(), 0);
    assert!(h.rollout.rolled_out().is_empty());
}

#[tokio::test]
async fn missing_env_sample_aborts_before_build() {
    let h = Setup {
        write_env_sample: false,
        ..Setup::default()
    }
    .build();
    let mut diag = Diagnostics::default();

    let err = h
        .orchestrator
        .run(&h.request(None), &mut diag)
        .await
        .unwrap_err();

    assert!(matches!(err, DeployError::MissingConfigTemplate(_)));
    assert_eq!(h.tool.build_count(), 0);
}

#[tokio::test]
async fn working_tree_is_restored_before_workers_start() {
    let h = Setup {
        source: FakeSource::new(HEAD).with_ref("v1", HEAD),
        ..Setup::default()
    }
    .build();
    let mut diag = Diagnostics::default();

    let result = h
        .orchestrator
        .run(&h.request(Some("v1")), &mut diag)
        .await
        .unwrap();

    assert!(result.is_success());
    assert_eq!(h.tool.build_count(), 1);
    assert_eq!(h.source.checkouts(), ["v1", "main"]);
    assert_eq!(h.source.current(), "main");
    assert_eq!(h.rollout.refs_seen(), ["main", "main", "main"]);
}

#[tokio::test]
async fn dirty_tree_with_version_aborts() {
    let h = Setup {
        source: FakeSource::new(HEAD).with_ref("v1", HEAD).dirty(),
        ..Setup::default()
    }
    .build();
    let mut diag = Diagnostics::default();

    let err = h
        .orchestrator
        .run(&h.request(Some("v1")), &mut diag)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        DeployError::Version(VersionError::Ambiguous { .. })
    ));
    assert!(h.rollout.rolled_out().is_empty());
}

#[tokio::test]
async fn stack_without_services_warns_and_succeeds() {
    let h = Setup {
        outputs: &[("VpcId", "vpc-1")],
        ..Setup::default()
    }
    .build();
    let mut diag = Diagnostics::default();

    let result = h.orchestrator.run(&h.request(None), &mut diag).await.unwrap();

    assert!(result.is_success());
    assert!(result.outcomes.is_empty());
    assert_eq!(diag.of_kind(WarningKind::NoServices).count(), 1);
}

#[tokio::test]
async fn descriptor_only_uses_first_service_and_rolls_out_nothing() {
    let h = Setup::default().build();
    let mut diag = Diagnostics::default();

    let descriptor = h
        .orchestrator
        .generate_descriptor_only(&h.request(None), &mut diag)
        .await
        .unwrap();

    assert_eq!(descriptor.family, format!("{}Family", ServiceId::new("svc-web")));
    assert!(descriptor.uses_image(&location().reference(tag(HEAD)).to_string()));
    assert!(h.rollout.rolled_out().is_empty());
    assert!(h.registry.has_image("dummy-repo", HEAD));
}

#[tokio::test]
async fn descriptor_only_without_services_fails() {
    let h = Setup {
        outputs: &[],
        ..Setup::default()
    }
    .build();
    let mut diag = Diagnostics::default();

    let err = h
        .orchestrator
        .generate_descriptor_only(&h.request(None), &mut diag)
        .await
        .unwrap_err();

    assert!(matches!(err, DeployError::NoServices { .. }));
}
