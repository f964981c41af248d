// ABOUTME: Test support utilities.
// ABOUTME: In-memory fakes for every collaborator seam of the deployment pipeline.

// Each test binary only uses some of these helpers, so allow dead_code.
#![allow(dead_code)]

use async_trait::async_trait;
use liftoff::build::{BuildError, BuildTool};
use liftoff::config::EnvironmentContext;
use liftoff::deploy::{RolloutError, RolloutExecutor, RolloutTarget};
use liftoff::descriptor::{
    ContainerDescriptor, DescriptorAssembler, DescriptorError, DescriptorRequest, TaskDescriptor,
};
use liftoff::registry::{
    AuthorizationToken, Credentials, ImageManifest, ImageTransport, RegistryApi, RegistryError,
    TransportError,
};
use liftoff::source::{SourceControl, SourceError};
use liftoff::stack::{StackOutput, StackQuery, StackQueryError};
use liftoff::types::{
    ApplicationName, ArtifactLocation, ArtifactTag, CommitId, LocalImage, StackName,
};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;
use std::sync::Once;
use std::sync::atomic::{AtomicUsize, Ordering};

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for tests. Safe to call multiple times.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::EnvFilter;
        let filter = EnvFilter::from_default_env().add_directive("liftoff=debug".parse().unwrap());
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init()
            .ok();
    });
}

pub fn application() -> ApplicationName {
    ApplicationName::new("dummy").unwrap()
}

pub fn environment() -> EnvironmentContext {
    EnvironmentContext::new("staging", "us-west-2", "123456789012", None)
}

pub fn location() -> ArtifactLocation {
    environment().artifact_location(&application())
}

pub fn tag(value: &str) -> ArtifactTag {
    ArtifactTag::parse(value).unwrap()
}

// ---------------------------------------------------------------------------
// Source control
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct SourceState {
    current: String,
    dirty: bool,
    refs: HashMap<String, String>,
    checkouts: Vec<String>,
    failing_checkouts: HashSet<String>,
}

/// A working tree whose refs and dirtiness are set by the test.
pub struct FakeSource {
    state: Mutex<SourceState>,
}

impl FakeSource {
    /// Clean tree on `main`, with HEAD and main pointing at `head`.
    pub fn new(head: &str) -> Self {
        let mut refs = HashMap::new();
        refs.insert("HEAD".to_string(), head.to_string());
        refs.insert("main".to_string(), head.to_string());
        Self {
            state: Mutex::new(SourceState {
                current: "main".to_string(),
                dirty: false,
                refs,
                checkouts: Vec::new(),
                failing_checkouts: HashSet::new(),
            }),
        }
    }

    pub fn with_ref(self, name: &str, commit: &str) -> Self {
        self.state
            .lock()
            .refs
            .insert(name.to_string(), commit.to_string());
        self
    }

    pub fn dirty(self) -> Self {
        self.state.lock().dirty = true;
        self
    }

    pub fn failing_checkout(self, reference: &str) -> Self {
        self.state
            .lock()
            .failing_checkouts
            .insert(reference.to_string());
        self
    }

    pub fn current(&self) -> String {
        self.state.lock().current.clone()
    }

    pub fn checkouts(&self) -> Vec<String> {
        self.state.lock().checkouts.clone()
    }
}

#[async_trait]
impl SourceControl for FakeSource {
    async fn current_ref(&self) -> Result<String, SourceError> {
        Ok(self.current())
    }

    async fn checkout(&self, reference: &str) -> Result<String, SourceError> {
        let mut state = self.state.lock();
        if state.failing_checkouts.contains(reference) {
            return Err(SourceError::CheckoutFailed {
                reference: reference.to_string(),
                reason: "simulated".to_string(),
            });
        }
        if !state.refs.contains_key(reference) {
            return Err(SourceError::UnknownReference(reference.to_string()));
        }
        state.checkouts.push(reference.to_string());
        state.current = reference.to_string();
        Ok(reference.to_string())
    }

    async fn is_dirty(&self) -> Result<bool, SourceError> {
        Ok(self.state.lock().dirty)
    }

    async fn resolve_commit(&self, reference: &str) -> Result<CommitId, SourceError> {
        let state = self.state.lock();
        let reference = if reference == "HEAD" {
            state.current.as_str()
        } else {
            reference
        };
        state
            .refs
            .get(reference)
            .map(|c| CommitId::new(c.clone()))
            .ok_or_else(|| SourceError::UnknownReference(reference.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Build tool
// ---------------------------------------------------------------------------

/// Records which ref was checked out when each build ran.
pub struct FakeBuildTool {
    source: Arc<FakeSource>,
    builds: Mutex<Vec<(String, String)>>,
    fail: bool,
}

impl FakeBuildTool {
    pub fn new(source: Arc<FakeSource>) -> Self {
        Self {
            source,
            builds: Mutex::new(Vec::new()),
            fail: false,
        }
    }

    pub fn failing(source: Arc<FakeSource>) -> Self {
        Self {
            fail: true,
            ..Self::new(source)
        }
    }

    /// `(image, ref checked out at build time)` per build.
    pub fn builds(&self) -> Vec<(String, String)> {
        self.builds.lock().clone()
    }
}

#[async_trait]
impl BuildTool for FakeBuildTool {
    async fn build(&self, image: &LocalImage, _context_dir: &Path) -> Result<(), BuildError> {
        self.builds
            .lock()
            .push((image.to_string(), self.source.current()));
        if self.fail {
            return Err(BuildError::Failed {
                image: image.to_string(),
                reason: "simulated build failure".to_string(),
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Registry holding manifests in memory.
#[derive(Default)]
pub struct FakeRegistry {
    repositories: Mutex<HashSet<String>>,
    images: Mutex<HashMap<(String, String), ImageManifest>>,
    pub create_calls: AtomicUsize,
    pub token_calls: AtomicUsize,
    fail_lookup: bool,
    fail_put: bool,
}

impl FakeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_image(self, repository: &str, tag: &str) -> Self {
        self.repositories.lock().insert(repository.to_string());
        self.images.lock().insert(
            (repository.to_string(), tag.to_string()),
            manifest(&format!("{repository}:{tag}")),
        );
        self
    }

    pub fn failing_lookup(mut self) -> Self {
        self.fail_lookup = true;
        self
    }

    pub fn failing_put(mut self) -> Self {
        self.fail_put = true;
        self
    }

    pub fn has_repository(&self, repository: &str) -> bool {
        self.repositories.lock().contains(repository)
    }

    pub fn has_image(&self, repository: &str, tag: &str) -> bool {
        self.images
            .lock()
            .contains_key(&(repository.to_string(), tag.to_string()))
    }

    /// Stand-in for a push arriving at the registry.
    pub fn receive(&self, repository: &str, tag: &str) {
        self.images.lock().insert(
            (repository.to_string(), tag.to_string()),
            manifest(&format!("{repository}:{tag}")),
        );
    }
}

pub fn manifest(body: &str) -> ImageManifest {
    ImageManifest {
        body: format!("{{\"config\":\"{body}\"}}"),
        media_type: Some("application/vnd.docker.distribution.manifest.v2+json".to_string()),
    }
}

#[async_trait]
impl RegistryApi for FakeRegistry {
    async fn create_repository(&self, name: &str) -> Result<(), RegistryError> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        if !self.repositories.lock().insert(name.to_string()) {
            return Err(RegistryError::RepositoryExists(name.to_string()));
        }
        Ok(())
    }

    async fn authorization_token(&self) -> Result<AuthorizationToken, RegistryError> {
        use base64::Engine;
        self.token_calls.fetch_add(1, Ordering::SeqCst);
        Ok(AuthorizationToken {
            token: base64::engine::general_purpose::STANDARD.encode("AWS:s3cret"),
            endpoint: "https://123456789012.dkr.ecr.us-west-2.amazonaws.com".to_string(),
        })
    }

    async fn find_image(
        &self,
        repository: &str,
        tag: &ArtifactTag,
    ) -> Result<Option<ImageManifest>, RegistryError> {
        if self.fail_lookup {
            return Err(RegistryError::Api("simulated lookup failure".to_string()));
        }
        Ok(self
            .images
            .lock()
            .get(&(repository.to_string(), tag.to_string()))
            .cloned())
    }

    async fn put_image(
        &self,
        repository: &str,
        tag: &ArtifactTag,
        manifest: &ImageManifest,
    ) -> Result<(), RegistryError> {
        if self.fail_put {
            return Err(RegistryError::Api("simulated put failure".to_string()));
        }
        self.images
            .lock()
            .insert((repository.to_string(), tag.to_string()), manifest.clone());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Image transport
// ---------------------------------------------------------------------------

/// Local image store whose pushes land in a [`FakeRegistry`].
pub struct FakeTransport {
    registry: Arc<FakeRegistry>,
    local: Mutex<HashSet<String>>,
    logins: Mutex<Vec<Credentials>>,
    pushes: Mutex<Vec<String>>,
    removals: Mutex<Vec<String>>,
    fail_push: bool,
    fail_remove: bool,
}

impl FakeTransport {
    pub fn new(registry: Arc<FakeRegistry>) -> Self {
        Self {
            registry,
            local: Mutex::new(HashSet::new()),
            logins: Mutex::new(Vec::new()),
            pushes: Mutex::new(Vec::new()),
            removals: Mutex::new(Vec::new()),
            fail_push: false,
            fail_remove: false,
        }
    }

    pub fn failing_push(mut self) -> Self {
        self.fail_push = true;
        self
    }

    pub fn failing_remove(mut self) -> Self {
        self.fail_remove = true;
        self
    }

    pub fn add_local(&self, image: &str) {
        self.local.lock().insert(image.to_string());
    }

    pub fn has_local(&self, image: &str) -> bool {
        self.local.lock().contains(image)
    }

    pub fn logins(&self) -> Vec<Credentials> {
        self.logins.lock().clone()
    }

    pub fn pushes(&self) -> Vec<String> {
        self.pushes.lock().clone()
    }

    pub fn removals(&self) -> Vec<String> {
        self.removals.lock().clone()
    }
}

fn command_error(command: &str) -> TransportError {
    TransportError::Command {
        command: command.to_string(),
        reason: "simulated".to_string(),
    }
}

#[async_trait]
impl ImageTransport for FakeTransport {
    async fn login(&self, credentials: &Credentials) -> Result<(), TransportError> {
        self.logins.lock().push(credentials.clone());
        Ok(())
    }

    async fn tag(&self, source: &str, target: &str) -> Result<(), TransportError> {
        let mut local = self.local.lock();
        if !local.contains(source) {
            return Err(command_error("docker tag"));
        }
        local.insert(target.to_string());
        Ok(())
    }

    async fn push(&self, image: &str) -> Result<(), TransportError> {
        if self.fail_push || !self.has_local(image) {
            return Err(command_error("docker push"));
        }
        self.pushes.lock().push(image.to_string());
        // host/repo:tag
        if let Some((path, tag)) = image.rsplit_once(':')
            && let Some((_, repository)) = path.split_once('/')
        {
            self.registry.receive(repository, tag);
        }
        Ok(())
    }

    async fn remove(&self, image: &str) -> Result<(), TransportError> {
        self.removals.lock().push(image.to_string());
        if self.fail_remove {
            return Err(command_error("docker rmi"));
        }
        self.local.lock().remove(image);
        Ok(())
    }
}

/// Build tool that puts the built image into a [`FakeTransport`]'s local store.
pub struct LocalStoreBuildTool {
    transport: Arc<FakeTransport>,
    pub builds: AtomicUsize,
}

impl LocalStoreBuildTool {
    pub fn new(transport: Arc<FakeTransport>) -> Self {
        Self {
            transport,
            builds: AtomicUsize::new(0),
        }
    }

    pub fn build_count(&self) -> usize {
        self.builds.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BuildTool for LocalStoreBuildTool {
    async fn build(&self, image: &LocalImage, _context_dir: &Path) -> Result<(), BuildError> {
        self.builds.fetch_add(1, Ordering::SeqCst);
        self.transport.add_local(&image.to_string());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Stack, descriptor and rollout
// ---------------------------------------------------------------------------

/// Stack outputs by stack name; unknown stacks are not found.
#[derive(Default)]
pub struct FakeStacks {
    stacks: Mutex<HashMap<String, Vec<StackOutput>>>,
    pub queries: AtomicUsize,
}

impl FakeStacks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_stack(self, name: &str, outputs: &[(&str, &str)]) -> Self {
        self.set_outputs(name, outputs);
        self
    }

    pub fn set_outputs(&self, name: &str, outputs: &[(&str, &str)]) {
        self.stacks.lock().insert(
            name.to_string(),
            outputs
                .iter()
                .map(|(k, v)| StackOutput::new(*k, *v))
                .collect(),
        );
    }
}

#[async_trait]
impl StackQuery for FakeStacks {
    async fn outputs(&self, stack: &StackName) -> Result<Vec<StackOutput>, StackQueryError> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        self.stacks
            .lock()
            .get(stack.as_str())
            .cloned()
            .ok_or(StackQueryError::NotFound)
    }
}

/// Assembles a one-container descriptor running the requested artifact.
#[derive(Default)]
pub struct FakeAssembler {
    failing: HashSet<String>,
    wrong_image: bool,
}

impl FakeAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_for(mut self, service: &str) -> Self {
        self.failing.insert(service.to_string());
        self
    }

    pub fn ignoring_image(mut self) -> Self {
        self.wrong_image = true;
        self
    }
}

#[async_trait]
impl DescriptorAssembler for FakeAssembler {
    async fn assemble(
        &self,
        request: &DescriptorRequest,
    ) -> Result<TaskDescriptor, DescriptorError> {
        if self.failing.contains(request.service.as_str()) {
            return Err(DescriptorError::NoCurrentDefinition {
                service: request.service.to_string(),
            });
        }
        let image = if self.wrong_image {
            "nginx:latest".to_string()
        } else {
            request.artifact.to_string()
        };
        Ok(TaskDescriptor {
            family: format!("{}Family", request.service),
            container_definitions: vec![ContainerDescriptor {
                name: request.application.to_string(),
                image,
                cpu: 256,
                memory: Some(512),
                essential: Some(true),
                ..Default::default()
            }],
            network_mode: Some("bridge".to_string()),
            requires_compatibilities: vec!["EC2".to_string()],
            ..Default::default()
        })
    }
}

/// Records rollouts; selected services fail or panic.
#[derive(Default)]
pub struct FakeRollout {
    failing: HashSet<String>,
    panicking: HashSet<String>,
    rolled_out: Mutex<Vec<(String, String)>>,
    source: Option<Arc<FakeSource>>,
    refs_seen: Mutex<Vec<String>>,
}

impl FakeRollout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_for(mut self, service: &str) -> Self {
        self.failing.insert(service.to_string());
        self
    }

    pub fn panicking_for(mut self, service: &str) -> Self {
        self.panicking.insert(service.to_string());
        self
    }

    /// Record the working tree's checked-out ref whenever a rollout starts.
    pub fn observing(mut self, source: Arc<FakeSource>) -> Self {
        self.source = Some(source);
        self
    }

    /// Refs that were checked out while rollouts ran.
    pub fn refs_seen(&self) -> Vec<String> {
        self.refs_seen.lock().clone()
    }

    /// `(service, image)` of every attempted rollout.
    pub fn rolled_out(&self) -> Vec<(String, String)> {
        let mut calls = self.rolled_out.lock().clone();
        calls.sort();
        calls
    }
}

#[async_trait]
impl RolloutExecutor for FakeRollout {
    async fn roll_out(
        &self,
        target: &RolloutTarget,
        descriptor: &TaskDescriptor,
    ) -> Result<(), RolloutError> {
        let service = target.service.to_string();
        let image = descriptor
            .container_definitions
            .first()
            .map(|c| c.image.clone())
            .unwrap_or_default();
        self.rolled_out.lock().push((service.clone(), image));
        if let Some(source) = &self.source {
            self.refs_seen.lock().push(source.current());
        }

        if self.panicking.contains(&service) {
            panic!("simulated worker panic for {service}");
        }
        if self.failing.contains(&service) {
            return Err(RolloutError::Failed("simulated circuit breaker".to_string()));
        }
        Ok(())
    }
}
