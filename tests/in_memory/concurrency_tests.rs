//! Exclusivity and optimistic-conflict behaviour under concurrent calls.

use foreman::lease::ports::LeaseRepository;
use foreman::orchestrator::OrchestrationError;
use foreman::task::domain::TaskState;
use foreman::task::ports::TaskFilter;
use rstest::rstest;

use super::helpers::{assigned_task, harness, worker, Harness};

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn concurrent_starts_grant_exactly_one_lease(harness: Harness) -> eyre::Result<()> {
    let assignee = worker("w1")?;
    let task = assigned_task(&harness, &assignee).await?;

    let (first, second) = tokio::join!(
        harness.service.start_task(task.id(), &assignee, None),
        harness.service.start_task(task.id(), &assignee, None),
    );

    let outcomes = [first, second];
    let wins = outcomes.iter().filter(|outcome| outcome.is_ok()).count();
    eyre::ensure!(wins == 1, "exactly one start must win: {outcomes:?}");
    eyre::ensure!(
        outcomes.iter().any(|outcome| matches!(
            outcome,
            Err(OrchestrationError::LeaseConflict { .. })
                | Err(OrchestrationError::InvalidTransition(_))
        )),
        "the loser must fail with a conflict: {outcomes:?}"
    );

    // One live lease, task in progress.
    let live = harness.leases.find_live_for_task(task.id()).await?;
    eyre::ensure!(live.is_some());
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn start_against_a_live_lease_names_the_holder(harness: Harness) -> eyre::Result<()> {
    let assignee = worker("w1")?;
    let rival = worker("w2")?;
    let task = assigned_task(&harness, &assignee).await?;
    harness.service.start_task(task.id(), &assignee, None).await?;

    let result = harness.service.start_task(task.id(), &rival, None).await;
    eyre::ensure!(
        matches!(
            &result,
            Err(OrchestrationError::LeaseConflict { task_id, holder })
                if *task_id == task.id() && *holder == assignee
        ),
        "second start must report the lease holder: {result:?}"
    );

    let live = harness
        .leases
        .find_live_for_task(task.id())
        .await?
        .ok_or_else(|| eyre::eyre!("the original lease must survive"))?;
    eyre::ensure!(live.holder() == &assignee);
    let tasks = harness.service.list_tasks(&TaskFilter::default()).await?;
    eyre::ensure!(tasks.len() == 1);
    eyre::ensure!(tasks.iter().all(|t| t.state() == TaskState::InProgress));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn concurrent_check_reports_both_land(harness: Harness) -> eyre::Result<()> {
    let author = worker("w1")?;
    let task = assigned_task(&harness, &author).await?;
    harness.service.start_task(task.id(), &author, None).await?;
    let (_, submission) = harness
        .service
        .submit_work(task.id(), &author, vec!["src/widget.rs".to_owned()])
        .await?;

    // Both reports race on the submission's version; the loser retries.
    let (lint, tests) = tokio::join!(
        harness.service.report_check_result(submission.id(), "lint", true),
        harness.service.report_check_result(submission.id(), "tests", false),
    );
    lint?;
    tests?;

    let (updated, _) = harness
        .service
        .report_check_result(submission.id(), "tests", false)
        .await?;
    eyre::ensure!(updated.checks().len() == 2);
    eyre::ensure!(updated.checks().get("lint") == Some(&true));
    eyre::ensure!(updated.checks().get("tests") == Some(&false));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn winner_of_concurrent_start_leaves_task_in_progress(harness: Harness) -> eyre::Result<()> {
    let assignee = worker("w1")?;
    let task = assigned_task(&harness, &assignee).await?;

    let (first, second) = tokio::join!(
        harness.service.start_task(task.id(), &assignee, None),
        harness.service.start_task(task.id(), &assignee, None),
    );
    eyre::ensure!(first.is_ok() != second.is_ok());

    let stored = harness
        .service
        .list_tasks(&foreman::task::ports::TaskFilter {
            state: Some(TaskState::InProgress),
            assignee: None,
        })
        .await?;
    eyre::ensure!(stored.iter().any(|t| t.id() == task.id()));
    Ok(())
}
