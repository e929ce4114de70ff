//! End-to-end tests for the orchestration facade against in-memory
//! adapters.

use std::sync::Arc;

use crate::activity::adapters::memory::InMemoryActivityLog;
use crate::activity::domain::EventKind;
use crate::actor::{CoordinatorId, WorkerId};
use crate::intake::adapters::memory::InMemoryTaskRequestRepository;
use crate::intake::domain::{NewTaskRequest, RequestStatus};
use crate::lease::adapters::memory::InMemoryLeaseRepository;
use crate::lease::domain::{LeasePolicy, LeaseStatus};
use crate::lease::ports::LeaseRepository;
use crate::orchestrator::adapters::recording::{RecordingNotifier, RecordingVcsHost, VcsCall};
use crate::orchestrator::services::{OrchestrationDeps, OrchestrationService, RequestDecision};
use crate::orchestrator::OrchestrationError;
use crate::review::adapters::memory::InMemorySubmissionRepository;
use crate::review::domain::{Submission, SubmissionStatus};
use crate::task::adapters::memory::InMemoryTaskRepository;
use crate::task::domain::{NewTask, Task, TaskDomainError, TaskState, TaskTitle, WorkTarget};
use crate::task::ports::TaskFilter;
use chrono::Duration;
use eyre::ensure;
use mockable::DefaultClock;
use rstest::{fixture, rstest};

type TestService = OrchestrationService<
    InMemoryTaskRepository,
    InMemoryLeaseRepository,
    InMemorySubmissionRepository,
    InMemoryTaskRequestRepository,
    InMemoryActivityLog,
    RecordingVcsHost,
    RecordingNotifier,
    DefaultClock,
>;

struct Harness {
    service: TestService,
    leases: Arc<InMemoryLeaseRepository>,
    log: Arc<InMemoryActivityLog>,
    vcs: Arc<RecordingVcsHost>,
    notifier: Arc<RecordingNotifier>,
}

#[fixture]
fn harness() -> Harness {
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

fn coordinator() -> eyre::Result<CoordinatorId> {
    Ok(CoordinatorId::new("lead")?)
}

async fn seeded_task(harness: &Harness, assignee: &WorkerId) -> eyre::Result<Task> {
    let params = NewTask::new(TaskTitle::new("Ship the widget")?, "Wire it end to end")
        .with_assignee(assignee.clone())
        .with_target(WorkTarget::new("svc/api", "main")?);
    Ok(harness.service.create_task(params, &coordinator()?).await?)
}

async fn submitted(harness: &Harness, author: &WorkerId) -> eyre::Result<(Task, Submission)> {
    let task = seeded_task(harness, author).await?;
    harness.service.start_task(task.id(), author, None).await?;
    let (in_review, submission) = harness
        .service
        .submit_work(task.id(), author, vec!["src/widget.rs".to_owned()])
        .await?;
    Ok((in_review, submission))
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn propose_then_approve_creates_one_task_for_proposer(
    harness: Harness,
) -> eyre::Result<()> {
    let proposer = WorkerId::new("w1")?;
    let request = harness
        .service
        .propose_task(NewTaskRequest::new(
            proposer.clone(),
            TaskTitle::new("Add retry budget")?,
            "Retries hammer the upstream",
            "Caused last week's brownout",
        ))
        .await?;
    ensure!(request.status() == RequestStatus::Pending);

    let (decided, created) = harness
        .service
        .decide_task_request(
            request.id(),
            &coordinator()?,
            RequestDecision::Approve {
                assignee: None,
                notes: None,
            },
        )
        .await?;
    ensure!(decided.status() == RequestStatus::Approved);
    let task = created.ok_or_else(|| eyre::eyre!("approval must create a task"))?;
    ensure!(task.state() == TaskState::Assigned);
    ensure!(task.assignee() == Some(&proposer));

    let repeat = harness
        .service
        .decide_task_request(
            request.id(),
            &coordinator()?,
            RequestDecision::Reject {
                notes: "changed my mind".to_owned(),
            },
        )
        .await;
    ensure!(
        matches!(repeat, Err(OrchestrationError::AlreadyDecided { .. })),
        "unexpected result: {repeat:?}"
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn rejection_requires_notes(harness: Harness) -> eyre::Result<()> {
    let proposer = WorkerId::new("w1")?;
    let request = harness
        .service
        .propose_task(NewTaskRequest::new(
            proposer,
            TaskTitle::new("Add retry budget")?,
            "description",
            "justification",
        ))
        .await?;

    let result = harness
        .service
        .decide_task_request(
            request.id(),
            &coordinator()?,
            RequestDecision::Reject {
                notes: "   ".to_owned(),
            },
        )
        .await;
    ensure!(
        matches!(result, Err(OrchestrationError::Validation(_))),
        "unexpected result: {result:?}"
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn start_grants_lease_and_creates_branch(harness: Harness) -> eyre::Result<()> {
    let worker = WorkerId::new("w1")?;
    let task = seeded_task(&harness, &worker).await?;

    let (started, lease) = harness.service.start_task(task.id(), &worker, None).await?;
    ensure!(started.state() == TaskState::InProgress);
    ensure!(started.lease_held());
    ensure!(lease.status() == LeaseStatus::Active);
    ensure!(lease.holder() == &worker);

    let calls = harness.vcs.calls()?;
    ensure!(
        matches!(
            calls.first(),
            Some(VcsCall::CreateBranch { task_id, .. }) if *task_id == task.id()
        ),
        "unexpected calls: {calls:?}"
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn start_by_non_assignee_is_rejected(harness: Harness) -> eyre::Result<()> {
    let worker = WorkerId::new("w1")?;
    let task = seeded_task(&harness, &worker).await?;

    let intruder = WorkerId::new("w2")?;
    let result = harness.service.start_task(task.id(), &intruder, None).await;
    ensure!(
        matches!(result, Err(OrchestrationError::Validation(_))),
        "unexpected result: {result:?}"
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn assign_fails_while_lease_is_unreleased(harness: Harness) -> eyre::Result<()> {
    let worker = WorkerId::new("w1")?;
    let task = seeded_task(&harness, &worker).await?;
    harness.service.start_task(task.id(), &worker, None).await?;

    let result = harness
        .service
        .assign_task(task.id(), &WorkerId::new("w2")?, &coordinator()?)
        .await;
    ensure!(
        matches!(
            result,
            Err(OrchestrationError::AlreadyAssigned { ref holder, .. })
                if holder.as_str() == "w1"
        ),
        "unexpected result: {result:?}"
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn submit_moves_task_into_review(harness: Harness) -> eyre::Result<()> {
    let worker = WorkerId::new("w1")?;
    let (task, submission) = submitted(&harness, &worker).await?;
    ensure!(task.state() == TaskState::InReview);
    ensure!(submission.status() == SubmissionStatus::Open);
    ensure!(submission.author() == &worker);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn submit_with_expired_lease_fails_without_touching_the_task(
    harness: Harness,
) -> eyre::Result<()> {
    let worker = WorkerId::new("w1")?;
    let task = seeded_task(&harness, &worker).await?;
    // Grant a lease that is already past its expiry.
    harness
        .service
        .start_task(task.id(), &worker, Some(Duration::seconds(-1)))
        .await?;

    let result = harness
        .service
        .submit_work(task.id(), &worker, vec!["src/widget.rs".to_owned()])
        .await;
    ensure!(
        matches!(
            result,
            Err(OrchestrationError::LeaseExpired { task_id, .. }) if task_id == task.id()
        ),
        "unexpected result: {result:?}"
    );

    let listed = harness
        .service
        .list_tasks(&TaskFilter {
            state: Some(TaskState::InProgress),
            assignee: None,
        })
        .await?;
    ensure!(listed.iter().any(|t| t.id() == task.id()));
    Ok(())
}

#[rstest]
#[case(true)]
#[case(false)]
#[tokio::test(flavor = "multi_thread")]
async fn completion_fires_in_either_arrival_order(
    harness: Harness,
    #[case] approve_first: bool,
) -> eyre::Result<()> {
    let worker = WorkerId::new("w1")?;
    let (task, submission) = submitted(&harness, &worker).await?;

    // Register a pending check up front so approval alone cannot satisfy
    // the gate in the approve-first leg.
    harness
        .service
        .report_check_result(submission.id(), "tests", false)
        .await?;

    let completed = if approve_first {
        harness
            .service
            .approve_submission(submission.id(), &coordinator()?)
            .await?;
        let (_, completed) = harness
            .service
            .report_check_result(submission.id(), "tests", true)
            .await?;
        completed
    } else {
        harness
            .service
            .report_check_result(submission.id(), "tests", true)
            .await?;
        let (_, completed) = harness
            .service
            .approve_submission(submission.id(), &coordinator()?)
            .await?;
        completed
    };

    let done = completed.ok_or_else(|| eyre::eyre!("gate satisfied, completion must fire"))?;
    ensure!(done.state() == TaskState::Done);

    let calls = harness.vcs.calls()?;
    ensure!(calls.iter().any(|call| matches!(
        call,
        VcsCall::Merge { submission_id } if *submission_id == submission.id()
    )));

    let events = harness.log.snapshot()?;
    let completions = events
        .iter()
        .filter(|event| event.kind() == EventKind::TaskCompleted)
        .count();
    ensure!(completions == 1, "expected one completion event");

    // The released lease blocks nothing further.
    let history = harness.service.activity_for_task(task.id()).await?;
    ensure!(!history.is_empty());
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn failing_check_blocks_completion(harness: Harness) -> eyre::Result<()> {
    let worker = WorkerId::new("w1")?;
    let (_, submission) = submitted(&harness, &worker).await?;

    harness
        .service
        .report_check_result(submission.id(), "tests", false)
        .await?;
    let (approved, completed) = harness
        .service
        .approve_submission(submission.id(), &coordinator()?)
        .await?;
    ensure!(approved.status() == SubmissionStatus::Approved);
    ensure!(completed.is_none());

    // The failing check flipping to true completes the approved submission.
    let (merged, done) = harness
        .service
        .report_check_result(submission.id(), "tests", true)
        .await?;
    ensure!(merged.status() == SubmissionStatus::Merged);
    ensure!(done.is_some_and(|task| task.state() == TaskState::Done));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn request_changes_reopens_under_the_same_lease(harness: Harness) -> eyre::Result<()> {
    let worker = WorkerId::new("w1")?;
    let (task, submission) = submitted(&harness, &worker).await?;

    let (rejected, reopened) = harness
        .service
        .request_changes(submission.id(), &coordinator()?, "needs tests")
        .await?;
    ensure!(rejected.status() == SubmissionStatus::ChangesRequested);
    ensure!(reopened.state() == TaskState::InProgress);
    ensure!(reopened.id() == task.id());
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn request_changes_requires_reason(harness: Harness) -> eyre::Result<()> {
    let worker = WorkerId::new("w1")?;
    let (_, submission) = submitted(&harness, &worker).await?;

    let result = harness
        .service
        .request_changes(submission.id(), &coordinator()?, "   ")
        .await;
    ensure!(
        matches!(result, Err(OrchestrationError::Validation(_))),
        "unexpected result: {result:?}"
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn request_changes_on_dead_lease_drops_task_to_assigned(
    harness: Harness,
) -> eyre::Result<()> {
    let worker = WorkerId::new("w1")?;
    let (task, submission) = submitted(&harness, &worker).await?;

    // Flip the lease to expired behind the facade's back, as the sweep
    // would after the TTL lapsed.
    let mut lease = harness
        .leases
        .find_unreleased_for_task(task.id())
        .await?
        .ok_or_else(|| eyre::eyre!("started task must hold a lease"))?;
    ensure!(lease.mark_expired());
    harness.leases.update(&lease).await?;

    let result = harness
        .service
        .request_changes(submission.id(), &coordinator()?, "needs tests")
        .await;
    ensure!(
        matches!(result, Err(OrchestrationError::LeaseExpired { .. })),
        "unexpected result: {result:?}"
    );

    let assigned = harness
        .service
        .list_tasks(&TaskFilter {
            state: Some(TaskState::Assigned),
            assignee: None,
        })
        .await?;
    ensure!(assigned.iter().any(|t| t.id() == task.id()));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn reassign_releases_lease_and_closes_submission(harness: Harness) -> eyre::Result<()> {
    let worker = WorkerId::new("w1")?;
    let (task, submission) = submitted(&harness, &worker).await?;

    let replacement = WorkerId::new("w2")?;
    let reassigned = harness
        .service
        .reassign_task(task.id(), &replacement, &coordinator()?)
        .await?;
    ensure!(reassigned.state() == TaskState::Assigned);
    ensure!(reassigned.assignee() == Some(&replacement));

    // The old lease no longer blocks a fresh start.
    let (restarted, lease) = harness
        .service
        .start_task(task.id(), &replacement, None)
        .await?;
    ensure!(restarted.state() == TaskState::InProgress);
    ensure!(lease.holder() == &replacement);

    // The closed submission cannot take further review actions.
    let stale = harness
        .service
        .approve_submission(submission.id(), &coordinator()?)
        .await;
    ensure!(
        matches!(stale, Err(OrchestrationError::NotReviewable(_))),
        "unexpected result: {stale:?}"
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn delete_is_gated_on_never_started(harness: Harness) -> eyre::Result<()> {
    let worker = WorkerId::new("w1")?;
    let deletable = seeded_task(&harness, &worker).await?;
    harness
        .service
        .delete_task(deletable.id(), &coordinator()?)
        .await?;

    let started = seeded_task(&harness, &worker).await?;
    harness
        .service
        .start_task(started.id(), &worker, None)
        .await?;
    let result = harness
        .service
        .delete_task(started.id(), &coordinator()?)
        .await;
    ensure!(
        matches!(
            result,
            Err(OrchestrationError::InvalidTransition(
                TaskDomainError::NotDeletable { .. }
            ))
        ),
        "unexpected result: {result:?}"
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn every_successful_operation_appends_exactly_one_event(
    harness: Harness,
) -> eyre::Result<()> {
    let worker = WorkerId::new("w1")?;
    let task = seeded_task(&harness, &worker).await?;
    harness.service.start_task(task.id(), &worker, None).await?;
    let (_, submission) = harness
        .service
        .submit_work(task.id(), &worker, vec!["src/widget.rs".to_owned()])
        .await?;
    harness
        .service
        .report_check_result(submission.id(), "tests", true)
        .await?;
    harness
        .service
        .approve_submission(submission.id(), &coordinator()?)
        .await?;

    let kinds: Vec<EventKind> = harness
        .log
        .snapshot()?
        .iter()
        .map(|event| event.kind())
        .collect();
    ensure!(
        kinds
            == vec![
                EventKind::TaskCreated,
                EventKind::TaskStarted,
                EventKind::WorkSubmitted,
                EventKind::CheckReported,
                EventKind::SubmissionApproved,
                EventKind::TaskCompleted,
            ],
        "unexpected event sequence: {kinds:?}"
    );

    // The notifier saw the same fan-out, in the same order.
    let delivered: Vec<EventKind> = harness
        .notifier
        .deliveries()?
        .iter()
        .map(|event| event.kind())
        .collect();
    ensure!(delivered == kinds);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn approval_with_no_named_checks_completes_immediately(
    harness: Harness,
) -> eyre::Result<()> {
    let worker = WorkerId::new("w1")?;
    let (_, submission) = submitted(&harness, &worker).await?;

    // An empty check map satisfies the gate vacuously.
    let (merged, completed) = harness
        .service
        .approve_submission(submission.id(), &coordinator()?)
        .await?;
    ensure!(merged.status() == SubmissionStatus::Merged);
    ensure!(completed.is_some_and(|task| task.state() == TaskState::Done));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn repeat_release_emits_no_second_event(harness: Harness) -> eyre::Result<()> {
    let worker = WorkerId::new("w1")?;
    let task = seeded_task(&harness, &worker).await?;
    let (_, lease) = harness.service.start_task(task.id(), &worker, None).await?;

    let (_, changed) = harness.service.release_lease(lease.id()).await?;
    ensure!(changed);
    let events_after_first = harness.log.len()?;

    let (_, changed_again) = harness.service.release_lease(lease.id()).await?;
    ensure!(!changed_again);
    ensure!(harness.log.len()? == events_after_first);
    Ok(())
}
