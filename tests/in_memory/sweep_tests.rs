//! Lease expiry sweep and the background sweep loop.

use std::time::Duration as StdDuration;

use chrono::Duration;
use foreman::activity::domain::EventKind;
use foreman::lease::domain::LeaseStatus;
use foreman::lease::ports::LeaseRepository;
use foreman::lease::services::spawn_sweep_loop;
use rstest::rstest;

use super::helpers::{assigned_task, harness, worker, Harness};

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn sweep_flips_only_lapsed_leases(harness: Harness) -> eyre::Result<()> {
    let w1 = worker("w1")?;
    let lapsed = assigned_task(&harness, &w1).await?;
    harness
        .service
        .start_task(lapsed.id(), &w1, Some(Duration::seconds(-1)))
        .await?;

    let w2 = worker("w2")?;
    let healthy = assigned_task(&harness, &w2).await?;
    harness.service.start_task(healthy.id(), &w2, None).await?;

    let flipped = harness.service.lease_manager().sweep_now().await?;
    eyre::ensure!(flipped == 1);

    let dead = harness
        .leases
        .find_unreleased_for_task(lapsed.id())
        .await?
        .ok_or_else(|| eyre::eyre!("lapsed lease must still be on record"))?;
    eyre::ensure!(dead.status() == LeaseStatus::Expired);

    let live = harness.leases.find_live_for_task(healthy.id()).await?;
    eyre::ensure!(live.is_some());

    // The sweep swept once, so a second pass finds nothing.
    eyre::ensure!(harness.service.lease_manager().sweep_now().await? == 0);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn sweep_loop_expires_leases_in_the_background(harness: Harness) -> eyre::Result<()> {
    let author = worker("w1")?;
    let task = assigned_task(&harness, &author).await?;
    harness
        .service
        .start_task(task.id(), &author, Some(Duration::seconds(-1)))
        .await?;

    // First tick fires immediately.
    let handle = spawn_sweep_loop(
        harness.service.lease_manager(),
        StdDuration::from_millis(10),
    );
    tokio::time::sleep(StdDuration::from_millis(200)).await;
    handle.abort();

    let dead = harness
        .leases
        .find_unreleased_for_task(task.id())
        .await?
        .ok_or_else(|| eyre::eyre!("lease must still be on record"))?;
    eyre::ensure!(dead.status() == LeaseStatus::Expired);

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
