// ABOUTME: Integration tests for idempotent artifact publishing.
// ABOUTME: An already-published tag must not trigger any build, login or push.

mod support;

use liftoff::build::ImageBuilder;
use liftoff::diagnostics::{Diagnostics, WarningKind};
use liftoff::registry::RegistryPublisher;
use liftoff::source::{ResolvedVersion, VersionResolver};
use liftoff::upload::{ArtifactUploader, UploadErrorKind, UploadOutcome};
use std::sync::Arc;
use std::sync::atomic::Ordering;
use support::{FakeRegistry, FakeSource, FakeTransport, LocalStoreBuildTool, application, location, tag};

const HEAD: &str = "1234567890abcdef1234567890abcdef12345678";

struct Harness {
    registry: Arc<FakeRegistry>,
    transport: Arc<FakeTransport>,
    tool: Arc<LocalStoreBuildTool>,
    source: Arc<FakeSource>,
    uploader: ArtifactUploader,
}

fn harness(registry: FakeRegistry, transport: impl FnOnce(Arc<FakeRegistry>) -> FakeTransport) -> Harness {
    let source = Arc::new(FakeSource::new(HEAD).with_ref("v3.1", HEAD));
    harness_with_source(registry, transport, source)
}

fn harness_with_source(
    registry: FakeRegistry,
    transport: impl FnOnce(Arc<FakeRegistry>) -> FakeTransport,
    source: Arc<FakeSource>,
) -> Harness {
    let registry = Arc::new(registry);
    let transport = Arc::new(transport(registry.clone()));
    let tool = Arc::new(LocalStoreBuildTool::new(transport.clone()));
    let builder = ImageBuilder::new(source.clone(), tool.clone(), application());
    let publisher = RegistryPublisher::new(registry.clone(), transport.clone(), location());
    let uploader = ArtifactUploader::new(builder, publisher, ".");
    Harness {
        registry,
        transport,
        tool,
        source,
        uploader,
    }
}

async fn resolve(source: &Arc<FakeSource>, reference: Option<&str>) -> ResolvedVersion {
    VersionResolver::new(source.clone(), "alice")
        .resolve(reference)
        .await
        .unwrap()
}

#[tokio::test]
async fn existing_tag_skips_build_and_push() {
    support::init_tracing();
    let h = harness(FakeRegistry::new().with_image("dummy-repo", HEAD), FakeTransport::new);
    let version = resolve(&h.source, None).await;
    let mut diag = Diagnostics::default();

    let outcome = h
        .uploader
        .ensure_published(&version, false, &mut diag)
        .await
        .unwrap();

    assert_eq!(
        outcome,
        UploadOutcome::AlreadyPublished(location().reference(tag(HEAD)))
    );
    assert_eq!(h.tool.build_count(), 0);
    assert!(h.transport.pushes().is_empty());
    assert!(h.transport.logins().is_empty());
    assert_eq!(h.registry.create_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn missing_tag_is_built_and_pushed_once() {
    let h = harness(FakeRegistry::new(), FakeTransport::new);
    let version = resolve(&h.source, None).await;
    let mut diag = Diagnostics::default();

    let first = h
        .uploader
        .ensure_published(&version, false, &mut diag)
        .await
        .unwrap();
    let second = h
        .uploader
        .ensure_published(&version, false, &mut diag)
        .await
        .unwrap();

    assert!(first.was_built());
    assert!(!second.was_built());
    assert_eq!(first.reference(), second.reference());
    assert_eq!(h.tool.build_count(), 1);
    assert_eq!(h.transport.pushes().len(), 1);
    assert!(h.registry.has_repository("dummy-repo"));
    assert!(h.registry.has_image("dummy-repo", HEAD));
}

#[tokio::test]
async fn force_rebuilds_existing_tag() {
    let h = harness(FakeRegistry::new().with_image("dummy-repo", HEAD), FakeTransport::new);
    let version = resolve(&h.source, None).await;
    let mut diag = Diagnostics::default();

    let outcome = h
        .uploader
        .ensure_published(&version, true, &mut diag)
        .await
        .unwrap();

    assert!(outcome.was_built());
    assert_eq!(h.tool.build_count(), 1);
}

#[tokio::test]
async fn version_label_is_published_alongside_commit_tag() {
    let h = harness(FakeRegistry::new(), FakeTransport::new);
    let version = resolve(&h.source, Some("v3.1")).await;
    let mut diag = Diagnostics::default();

    h.uploader
        .ensure_published(&version, false, &mut diag)
        .await
        .unwrap();

    assert!(h.registry.has_image("dummy-repo", HEAD));
    assert!(h.registry.has_image("dummy-repo", "v3.1"));
    assert!(!diag.has_warnings());
}

#[tokio::test]
async fn failed_version_label_is_a_warning() {
    let h = harness(FakeRegistry::new().failing_put(), FakeTransport::new);
    let version = resolve(&h.source, Some("v3.1")).await;
    let mut diag = Diagnostics::default();

    let outcome = h
        .uploader
        .ensure_published(&version, false, &mut diag)
        .await
        .unwrap();

    assert!(outcome.was_built());
    assert_eq!(diag.of_kind(WarningKind::VersionTag).count(), 1);
}

#[tokio::test]
async fn branch_version_is_published_without_label_and_warns() {
    let source = Arc::new(FakeSource::new(HEAD).with_ref("feature/login", HEAD));
    let h = harness_with_source(FakeRegistry::new(), FakeTransport::new, source);
    let version = resolve(&h.source, Some("feature/login")).await;
    let mut diag = Diagnostics::default();

    let outcome = h
        .uploader
        .ensure_published(&version, false, &mut diag)
        .await
        .unwrap();

    assert!(outcome.was_built());
    assert!(h.registry.has_image("dummy-repo", HEAD));
    assert_eq!(diag.of_kind(WarningKind::VersionTag).count(), 1);
    assert!(diag.warnings()[0].message.contains("feature/login"));
}

#[tokio::test]
async fn lookup_failure_is_fatal() {
    let h = harness(FakeRegistry::new().failing_lookup(), FakeTransport::new);
    let version = resolve(&h.source, None).await;
    let mut diag = Diagnostics::default();

    let err = h
        .uploader
        .ensure_published(&version, false, &mut diag)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), UploadErrorKind::Registry);
    assert_eq!(h.tool.build_count(), 0);
}

#[tokio::test]
async fn push_failure_is_transfer_kind() {
    let h = harness(FakeRegistry::new(), |r| FakeTransport::new(r).failing_push());
    let version = resolve(&h.source, None).await;
    let mut diag = Diagnostics::default();

    let err = h
        .uploader
        .ensure_published(&version, false, &mut diag)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), UploadErrorKind::Transfer);
    assert!(!h.registry.has_image("dummy-repo", HEAD));
}

#[tokio::test]
async fn additional_tags_are_best_effort() {
    let h = harness(FakeRegistry::new().with_image("dummy-repo", HEAD), FakeTransport::new);
    let mut diag = Diagnostics::default();

    let applied = h
        .uploader
        .add_tags(&tag(HEAD), &[tag("latest"), tag("stable")], &mut diag)
        .await;

    assert_eq!(applied, 2);
    assert!(h.registry.has_image("dummy-repo", "latest"));
    assert!(h.registry.has_image("dummy-repo", "stable"));

    let missing = h
        .uploader
        .add_tags(&tag("deadbeef"), &[tag("broken")], &mut diag)
        .await;
    assert_eq!(missing, 0);
    assert_eq!(diag.of_kind(WarningKind::AdditionalTag).count(), 1);
}
