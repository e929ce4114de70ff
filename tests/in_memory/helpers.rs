//! Shared harness wiring for engine integration tests.

use std::sync::Arc;

use foreman::activity::adapters::memory::InMemoryActivityLog;
use foreman::actor::{CoordinatorId, WorkerId};
use foreman::intake::adapters::memory::InMemoryTaskRequestRepository;
use foreman::lease::adapters::memory::InMemoryLeaseRepository;
use foreman::lease::domain::LeasePolicy;
use foreman::orchestrator::adapters::recording::{RecordingNotifier, RecordingVcsHost};
use foreman::orchestrator::services::{OrchestrationDeps, OrchestrationService};
use foreman::review::adapters::memory::InMemorySubmissionRepository;
use foreman::task::adapters::memory::InMemoryTaskRepository;
use foreman::task::domain::{NewTask, Task, TaskTitle, WorkTarget};
use mockable::DefaultClock;
use rstest::fixture;

/// The fully in-memory service under test.
pub type TestService = OrchestrationService<
    InMemoryTaskRepository,
    InMemoryLeaseRepository,
    InMemorySubmissionRepository,
    InMemoryTaskRequestRepository,
    InMemoryActivityLog,
    RecordingVcsHost,
    RecordingNotifier,
    DefaultClock,
>;

/// Service plus handles to the collaborators tests assert against.
pub struct Harness {
    /// The orchestration service wired with in-memory adapters.
    pub service: TestService,
    /// The lease repository behind the service.
    pub leases: Arc<InMemoryLeaseRepository>,
    /// The activity log behind the service.
    pub log: Arc<InMemoryActivityLog>,
    /// The recording version-control provider.
    pub vcs: Arc<RecordingVcsHost>,
    /// The recording notification sink.
    pub notifier: Arc<RecordingNotifier>,
}

/// Provides a fresh engine for each test.
#[fixture]
pub fn harness() -> Harness {
    let leases = Arc::new(InMemoryLeaseRepository::new());
    let log = Arc::new(InMemoryActivityLog::new());
    let vcs = Arc::new(RecordingVcsHost::new());
    let notifier = Arc::new(RecordingNotifier::new());
    let service = OrchestrationService::new(OrchestrationDeps {
        tasks: Arc::new(InMemoryTaskRepository::new()),
        leases: Arc::clone(&leases),
        submissions: Arc::new(InMemorySubmissionRepository::new()),
        requests: Arc::new(InMemoryTaskRequestRepository::new()),
        log: Arc::clone(&log),
        vcs: Arc::clone(&vcs),
        notifier: Arc::clone(&notifier),
        clock: Arc::new(DefaultClock),
        lease_policy: LeasePolicy::default(),
    });
    Harness {
        service,
        leases,
        log,
        vcs,
        notifier,
    }
}

/// Builds a worker identifier.
///
/// # Errors
///
/// Returns an error for a blank name.
pub fn worker(name: &str) -> eyre::Result<WorkerId> {
    Ok(WorkerId::new(name)?)
}

/// Builds the coordinator used across tests.
///
/// # Errors
///
/// Returns an error if the identifier is rejected.
pub fn coordinator() -> eyre::Result<CoordinatorId> {
    Ok(CoordinatorId::new("lead")?)
}

/// Creates a task assigned to `assignee`, targeting `svc/api:main`.
///
/// # Errors
///
/// Returns an error if creation fails.
pub async fn assigned_task(harness: &Harness, assignee: &WorkerId) -> eyre::Result<Task> {
    let params = NewTask::new(TaskTitle::new("Ship the widget")?, "Wire it end to end")
        .with_assignee(assignee.clone())
        .with_target(WorkTarget::new("svc/api", "main")?);
    Ok(harness.service.create_task(params, &coordinator()?).await?)
}
