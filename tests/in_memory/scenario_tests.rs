//! End-to-end lifecycle scenarios against the in-memory engine.

use foreman::activity::domain::EventKind;
use foreman::intake::domain::{NewTaskRequest, RequestStatus};
use foreman::lease::domain::LeaseStatus;
use foreman::lease::ports::LeaseRepository;
use foreman::orchestrator::services::RequestDecision;
use foreman::orchestrator::OrchestrationError;
use foreman::review::domain::SubmissionStatus;
use foreman::task::domain::{TaskState, TaskTitle};
use foreman::task::ports::TaskFilter;
use rstest::rstest;

use super::helpers::{assigned_task, coordinator, harness, worker, Harness};

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn proposal_approval_yields_an_assigned_task(harness: Harness) -> eyre::Result<()> {
    let proposer = worker("w1")?;
    let request = harness
        .service
        .propose_task(NewTaskRequest::new(
            proposer.clone(),
            TaskTitle::new("Add retry budget")?,
            "Retries hammer the upstream",
            "Caused last week's brownout",
        ))
        .await?;

    let (decided, created) = harness
        .service
        .decide_task_request(
            request.id(),
            &coordinator()?,
            RequestDecision::Approve {
                assignee: None,
                notes: Some("go ahead".to_owned()),
            },
        )
        .await?;
    eyre::ensure!(decided.status() == RequestStatus::Approved);

    let task = created.ok_or_else(|| eyre::eyre!("approval must create a task"))?;
    eyre::ensure!(task.state() == TaskState::Assigned);
    eyre::ensure!(task.assignee() == Some(&proposer));

    let pending = harness.service.list_pending_requests().await?;
    eyre::ensure!(pending.is_empty());
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn full_lifecycle_runs_start_to_done(harness: Harness) -> eyre::Result<()> {
    let author = worker("w1")?;
    let task = assigned_task(&harness, &author).await?;

    let (started, lease) = harness.service.start_task(task.id(), &author, None).await?;
    eyre::ensure!(started.state() == TaskState::InProgress);
    eyre::ensure!(lease.status() == LeaseStatus::Active);

    let (in_review, submission) = harness
        .service
        .submit_work(task.id(), &author, vec!["src/widget.rs".to_owned()])
        .await?;
    eyre::ensure!(in_review.state() == TaskState::InReview);

    harness
        .service
        .report_check_result(submission.id(), "tests", true)
        .await?;
    let (merged, completed) = harness
        .service
        .approve_submission(submission.id(), &coordinator()?)
        .await?;
    eyre::ensure!(merged.status() == SubmissionStatus::Merged);
    let done = completed.ok_or_else(|| eyre::eyre!("gate satisfied, completion must fire"))?;
    eyre::ensure!(done.state() == TaskState::Done);

    // Completion released the lease.
    let live = harness.leases.find_live_for_task(task.id()).await?;
    eyre::ensure!(live.is_none());

    // History tells the whole story, in order.
    let kinds: Vec<EventKind> = harness
        .service
        .activity_for_task(task.id())
        .await?
        .iter()
        .map(|event| event.kind())
        .collect();
    eyre::ensure!(
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
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn expired_lease_blocks_submission_after_sweep(harness: Harness) -> eyre::Result<()> {
    let author = worker("w1")?;
    let task = assigned_task(&harness, &author).await?;
    // A grant that is already past its expiry stands in for waiting out
    // the TTL.
    harness
        .service
        .start_task(task.id(), &author, Some(chrono::Duration::seconds(-1)))
        .await?;

    let flipped = harness.service.lease_manager().sweep_now().await?;
    eyre::ensure!(flipped == 1);

    let result = harness
        .service
        .submit_work(task.id(), &author, vec!["src/widget.rs".to_owned()])
        .await;
    eyre::ensure!(
        matches!(result, Err(OrchestrationError::LeaseExpired { .. })),
        "unexpected result: {result:?}"
    );

    let kinds: Vec<EventKind> = harness
        .service
        .activity_for_task(task.id())
        .await?
        .iter()
        .map(|event| event.kind())
        .collect();
    eyre::ensure!(kinds.contains(&EventKind::LeaseExpired));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn reassign_clears_lease_and_submission(harness: Harness) -> eyre::Result<()> {
    let author = worker("w1")?;
    let task = assigned_task(&harness, &author).await?;
    harness.service.start_task(task.id(), &author, None).await?;
    harness
        .service
        .submit_work(task.id(), &author, vec!["src/widget.rs".to_owned()])
        .await?;

    let replacement = worker("w2")?;
    let reassigned = harness
        .service
        .reassign_task(task.id(), &replacement, &coordinator()?)
        .await?;
    eyre::ensure!(reassigned.state() == TaskState::Assigned);
    eyre::ensure!(reassigned.assignee() == Some(&replacement));

    // No live lease survives the reassignment.
    let live = harness.leases.find_live_for_task(task.id()).await?;
    eyre::ensure!(live.is_none());

    // The replacement can pick the task up cleanly.
    let (restarted, lease) = harness
        .service
        .start_task(task.id(), &replacement, None)
        .await?;
    eyre::ensure!(restarted.state() == TaskState::InProgress);
    eyre::ensure!(lease.holder() == &replacement);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn rejection_keeps_the_request_and_creates_nothing(harness: Harness) -> eyre::Result<()> {
    let proposer = worker("w1")?;
    let request = harness
        .service
        .propose_task(NewTaskRequest::new(
            proposer,
            TaskTitle::new("Rewrite everything in a weekend")?,
            "description",
            "it would be fun",
        ))
        .await?;

    let (decided, created) = harness
        .service
        .decide_task_request(
            request.id(),
            &coordinator()?,
            RequestDecision::Reject {
                notes: "scope far too large".to_owned(),
            },
        )
        .await?;
    eyre::ensure!(decided.status() == RequestStatus::Rejected);
    eyre::ensure!(decided.notes() == Some("scope far too large"));
    eyre::ensure!(created.is_none());

    let tasks = harness.service.list_tasks(&TaskFilter::default()).await?;
    eyre::ensure!(tasks.is_empty());
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn notifications_mirror_the_activity_log(harness: Harness) -> eyre::Result<()> {
    let author = worker("w1")?;
    let task = assigned_task(&harness, &author).await?;
    harness.service.start_task(task.id(), &author, None).await?;

    let logged: Vec<EventKind> = harness
        .log
        .snapshot()?
        .iter()
        .map(|event| event.kind())
        .collect();
    let delivered: Vec<EventKind> = harness
        .notifier
        .deliveries()?
        .iter()
        .map(|event| event.kind())
        .collect();
    eyre::ensure!(logged == delivered);
    eyre::ensure!(!harness.vcs.calls()?.is_empty());
    Ok(())
}
