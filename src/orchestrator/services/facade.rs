//! Orchestration facade: every public operation of the engine.
//!
//! Each mutating operation follows the same shape: validate, mutate the
//! owning aggregate under compare-and-swap, append exactly one activity
//! event, then fan the event out to the notifier best-effort. Optimistic
//! conflicts are retried a bounded number of times by reloading and
//! reapplying; every other error surfaces to the caller unchanged.

use crate::activity::domain::{ActivityEvent, EventKind};
use crate::activity::ports::ActivityLog;
use crate::actor::{CoordinatorId, WorkerId};
use crate::intake::domain::{NewTaskRequest, TaskRequest, TaskRequestId};
use crate::intake::ports::TaskRequestRepository;
use crate::lease::domain::{Lease, LeaseId, LeasePolicy};
use crate::lease::ports::LeaseRepository;
use crate::lease::services::LeaseManager;
use crate::orchestrator::ports::{Notifier, VcsHost};
use crate::orchestrator::{OrchestrationError, OrchestrationResult};
use crate::review::domain::{Submission, SubmissionId};
use crate::review::ports::SubmissionRepository;
use crate::task::domain::{NewTask, Task, TaskId};
use crate::task::ports::{TaskFilter, TaskRepository};
use chrono::{DateTime, Duration, Utc};
use mockable::Clock;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, warn};

/// Actor recorded for check results pushed by the external check source.
const CHECK_SOURCE_ACTOR: &str = "check-source";

/// Actor recorded for internally triggered completion.
const ENGINE_ACTOR: &str = "orchestrator";

/// Bounded attempt count for optimistic-conflict retries.
const MAX_CONFLICT_ATTEMPTS: u32 = 3;

/// A coordinator's decision on a pending task request.
#[derive(Debug, Clone)]
pub enum RequestDecision {
    /// Approve the request, creating exactly one task.
    Approve {
        /// Assignee for the new task; the proposer when `None`.
        assignee: Option<WorkerId>,
        /// Optional decision notes.
        notes: Option<String>,
    },
    /// Reject the request.
    Reject {
        /// Mandatory explanatory notes.
        notes: String,
    },
}

/// Collaborators the orchestration service is wired with.
pub struct OrchestrationDeps<T, L, S, Q, A, V, N, C>
where
    T: TaskRepository,
    L: LeaseRepository,
    S: SubmissionRepository,
    Q: TaskRequestRepository,
    A: ActivityLog,
    V: VcsHost,
    N: Notifier,
    C: Clock + Send + Sync,
{
    /// Task repository.
    pub tasks: Arc<T>,
    /// Lease repository. Reads only; mutation goes through the manager.
    pub leases: Arc<L>,
    /// Submission repository.
    pub submissions: Arc<S>,
    /// Task request repository.
    pub requests: Arc<Q>,
    /// Append-only activity log.
    pub log: Arc<A>,
    /// Version-control provider.
    pub vcs: Arc<V>,
    /// Notification sink.
    pub notifier: Arc<N>,
    /// Clock used for every timestamp.
    pub clock: Arc<C>,
    /// Lease duration policy.
    pub lease_policy: LeasePolicy,
}

/// The engine's public surface.
///
/// Wraps the task store, lease manager, review gate, and request intake
/// behind operations matching the external API. Lease state is mutated
/// only through the embedded [`LeaseManager`]; this service reads lease
/// records directly but never writes them.
pub struct OrchestrationService<T, L, S, Q, A, V, N, C>
where
    T: TaskRepository,
    L: LeaseRepository,
    S: SubmissionRepository,
    Q: TaskRequestRepository,
    A: ActivityLog,
    V: VcsHost,
    N: Notifier,
    C: Clock + Send + Sync,
{
    tasks: Arc<T>,
    leases: Arc<L>,
    submissions: Arc<S>,
    requests: Arc<Q>,
    log: Arc<A>,
    lease_manager: Arc<LeaseManager<L, A, C>>,
    vcs: Arc<V>,
    notifier: Arc<N>,
    clock: Arc<C>,
}

impl<T, L, S, Q, A, V, N, C> OrchestrationService<T, L, S, Q, A, V, N, C>
where
    T: TaskRepository,
    L: LeaseRepository,
    S: SubmissionRepository,
    Q: TaskRequestRepository,
    A: ActivityLog,
    V: VcsHost,
    N: Notifier,
    C: Clock + Send + Sync,
{
    /// Wires the service from its collaborators.
    #[must_use]
    pub fn new(deps: OrchestrationDeps<T, L, S, Q, A, V, N, C>) -> Self {
        let lease_manager = Arc::new(LeaseManager::new(
            Arc::clone(&deps.leases),
            Arc::clone(&deps.log),
            Arc::clone(&deps.clock),
            deps.lease_policy,
        ));
        Self {
            tasks: deps.tasks,
            leases: deps.leases,
            submissions: deps.submissions,
            requests: deps.requests,
            log: deps.log,
            lease_manager,
            vcs: deps.vcs,
            notifier: deps.notifier,
            clock: deps.clock,
        }
    }

    /// Returns the embedded lease manager, for spawning the sweep loop.
    #[must_use]
    pub fn lease_manager(&self) -> Arc<LeaseManager<L, A, C>> {
        Arc::clone(&self.lease_manager)
    }

    /// Creates a pending task request on behalf of a worker.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestrationError::Validation`] for a blank
    /// justification.
    pub async fn propose_task(&self, params: NewTaskRequest) -> OrchestrationResult<TaskRequest> {
        let request = TaskRequest::new(params, &*self.clock)?;
        self.requests.store(&request).await?;
        let event = ActivityEvent::new(
            EventKind::TaskProposed,
            None,
            request.proposer().as_str(),
            json!({
                "request_id": request.id().to_string(),
                "title": request.title().as_str(),
            }),
            &*self.clock,
        );
        self.record(event).await?;
        Ok(request)
    }

    /// Decides a pending request exactly once.
    ///
    /// Approval atomically creates one task, assigned to the explicit
    /// assignee or the original proposer. Rejection records mandatory
    /// notes. Returns the decided request and the created task, if any.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestrationError::AlreadyDecided`] on a repeat decision
    /// (including one that lost a concurrent race) and
    /// [`OrchestrationError::Validation`] for blank rejection notes.
    ///
    /// The request is decided before the task is stored. Should the task
    /// store then fail, the approval stands and no task exists; the
    /// coordinator recovers by creating the task directly with
    /// [`Self::create_task`].
    pub async fn decide_task_request(
        &self,
        request_id: TaskRequestId,
        coordinator: &CoordinatorId,
        decision: RequestDecision,
    ) -> OrchestrationResult<(TaskRequest, Option<Task>)> {
        let decided = retrying(async || {
            let mut request = self.load_request(request_id).await?;
            match &decision {
                RequestDecision::Approve { notes, .. } => {
                    request.approve(notes.clone(), &*self.clock)?;
                }
                RequestDecision::Reject { notes } => {
                    request.reject(notes.clone(), &*self.clock)?;
                }
            }
            Ok(self.requests.update(&request).await?)
        })
        .await?;

        match decision {
            RequestDecision::Approve { assignee, .. } => {
                let worker = assignee.unwrap_or_else(|| decided.proposer().clone());
                let mut params = NewTask::new(decided.title().clone(), decided.description())
                    .with_assignee(worker.clone())
                    .with_complexity(decided.size_estimate());
                if let Some(target) = decided.target() {
                    params = params.with_target(target.clone());
                }
                let task = Task::new(params, &*self.clock);
                self.tasks.store(&task).await?;
                let event = ActivityEvent::new(
                    EventKind::RequestApproved,
                    Some(task.id()),
                    coordinator.as_str(),
                    json!({
                        "request_id": decided.id().to_string(),
                        "assignee": worker.as_str(),
                    }),
                    &*self.clock,
                );
                self.record(event).await?;
                Ok((decided, Some(task)))
            }
            RequestDecision::Reject { .. } => {
                let event = ActivityEvent::new(
                    EventKind::RequestRejected,
                    None,
                    coordinator.as_str(),
                    json!({
                        "request_id": decided.id().to_string(),
                        "notes": decided.notes(),
                    }),
                    &*self.clock,
                );
                self.record(event).await?;
                Ok((decided, None))
            }
        }
    }

    /// Creates a task directly, bypassing intake.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestrationError::StoreConflict`] on an identifier
    /// collision.
    pub async fn create_task(
        &self,
        params: NewTask,
        coordinator: &CoordinatorId,
    ) -> OrchestrationResult<Task> {
        let task = Task::new(params, &*self.clock);
        self.tasks.store(&task).await?;
        let event = ActivityEvent::new(
            EventKind::TaskCreated,
            Some(task.id()),
            coordinator.as_str(),
            json!({
                "state": task.state().as_str(),
                "assignee": task.assignee().map(WorkerId::as_str),
            }),
            &*self.clock,
        );
        self.record(event).await?;
        Ok(task)
    }

    /// Assigns a draft or assigned task to a worker.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestrationError::AlreadyAssigned`] when a non-released
    /// lease exists for the task and
    /// [`OrchestrationError::InvalidTransition`] when the task has moved
    /// past the assignable states.
    pub async fn assign_task(
        &self,
        task_id: TaskId,
        worker: &WorkerId,
        coordinator: &CoordinatorId,
    ) -> OrchestrationResult<Task> {
        if let Some(lease) = self.leases.find_unreleased_for_task(task_id).await? {
            return Err(OrchestrationError::AlreadyAssigned {
                task_id,
                holder: lease.holder().clone(),
            });
        }
        let task = retrying(async || {
            let mut current = self.load_task(task_id).await?;
            current.assign(worker.clone(), &*self.clock)?;
            Ok(self.tasks.update(&current).await?)
        })
        .await?;
        let event = ActivityEvent::new(
            EventKind::TaskAssigned,
            Some(task_id),
            coordinator.as_str(),
            json!({ "assignee": worker.as_str() }),
            &*self.clock,
        );
        self.record(event).await?;
        Ok(task)
    }

    /// Starts an assigned task: grants the lease, marks the task in
    /// progress, and creates the working branch when a target is set.
    ///
    /// The lease grant is the serialisation point: of two concurrent
    /// starts, exactly one obtains the lease and the other fails with
    /// [`OrchestrationError::LeaseConflict`].
    ///
    /// # Errors
    ///
    /// Returns [`OrchestrationError::LeaseConflict`] when the task is
    /// already leased (checked before the assignee guard, so a second
    /// worker's start names the holder), [`OrchestrationError::Validation`]
    /// when `worker` is not the assignee, and [`OrchestrationError::Vcs`]
    /// when branch
    /// creation fails (the lease and state change are kept; the caller
    /// retries the branch out of band).
    pub async fn start_task(
        &self,
        task_id: TaskId,
        worker: &WorkerId,
        ttl: Option<Duration>,
    ) -> OrchestrationResult<(Task, Lease)> {
        let task = self.load_task(task_id).await?;
        if let Some(existing) = self.leases.find_live_for_task(task_id).await? {
            return Err(OrchestrationError::LeaseConflict {
                task_id,
                holder: existing.holder().clone(),
            });
        }
        if task.assignee() != Some(worker) {
            return Err(OrchestrationError::Validation(format!(
                "task {task_id} is not assigned to {worker}"
            )));
        }
        let lease = self.lease_manager.grant(task_id, worker.clone(), ttl).await?;
        let attempt = retrying(async || {
            let mut current = self.load_task(task_id).await?;
            current.start(&*self.clock)?;
            Ok(self.tasks.update(&current).await?)
        })
        .await;
        let started = match attempt {
            Ok(started) => started,
            Err(err) => {
                // Undo the grant so the task is not left leased but idle.
                if let Err(release_err) = self.lease_manager.release(lease.id()).await {
                    warn!(
                        lease_id = %lease.id(),
                        error = %release_err,
                        "failed to release lease after aborted start"
                    );
                }
                return Err(err);
            }
        };
        if let Some(target) = started.target() {
            self.vcs.create_branch(target, task_id).await?;
        }
        let event = ActivityEvent::new(
            EventKind::TaskStarted,
            Some(task_id),
            worker.as_str(),
            json!({
                "lease_id": lease.id().to_string(),
                "expires_at": lease.expires_at().to_rfc3339(),
            }),
            &*self.clock,
        );
        self.record(event).await?;
        Ok((started, lease))
    }

    /// Submits completed work against an in-progress task.
    ///
    /// Creates the submission and advances the task straight into review;
    /// review entry is automatic once a submission exists.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestrationError::LeaseExpired`] when the author's
    /// lease has lapsed (the task does not change; the caller must
    /// reassign), [`OrchestrationError::LeaseConflict`] when the lease is
    /// held by someone else, and [`OrchestrationError::Validation`] for an
    /// empty changed-file list.
    pub async fn submit_work(
        &self,
        task_id: TaskId,
        author: &WorkerId,
        changed_files: Vec<String>,
    ) -> OrchestrationResult<(Task, Submission)> {
        let now = self.clock.utc();
        let lease = match self.leases.find_unreleased_for_task(task_id).await? {
            Some(held) if held.is_live(now) => held,
            Some(dead) => {
                return Err(OrchestrationError::LeaseExpired {
                    task_id,
                    lease_id: dead.id(),
                });
            }
            None => return Err(no_lease_on_record(task_id)),
        };
        if lease.holder() != author {
            return Err(OrchestrationError::LeaseConflict {
                task_id,
                holder: lease.holder().clone(),
            });
        }
        let submission = Submission::new(task_id, author.clone(), changed_files, &*self.clock)?;
        let task = retrying(async || {
            let mut current = self.load_task(task_id).await?;
            current.submit(&*self.clock)?;
            current.enter_review(&*self.clock)?;
            Ok(self.tasks.update(&current).await?)
        })
        .await?;
        self.submissions.store(&submission).await?;
        let event = ActivityEvent::new(
            EventKind::WorkSubmitted,
            Some(task_id),
            author.as_str(),
            json!({
                "submission_id": submission.id().to_string(),
                "changed_files": submission.changed_files().len(),
            }),
            &*self.clock,
        );
        self.record(event).await?;
        Ok((task, submission))
    }

    /// Records one named check result pushed by the external check source.
    ///
    /// Idempotent per name: the last report wins. When the report
    /// completes the all-true condition on an already approved submission,
    /// completion runs immediately; the completed task is returned
    /// alongside the submission.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestrationError::Validation`] for a blank check name
    /// and [`OrchestrationError::NotReviewable`] when the submission is
    /// already terminal.
    pub async fn report_check_result(
        &self,
        submission_id: SubmissionId,
        check_name: &str,
        passed: bool,
    ) -> OrchestrationResult<(Submission, Option<Task>)> {
        let submission = retrying(async || {
            let mut current = self.load_submission(submission_id).await?;
            current.record_check(check_name, passed, &*self.clock)?;
            Ok(self.submissions.update(&current).await?)
        })
        .await?;
        let event = ActivityEvent::new(
            EventKind::CheckReported,
            Some(submission.task_id()),
            CHECK_SOURCE_ACTOR,
            json!({
                "submission_id": submission_id.to_string(),
                "check": check_name.trim(),
                "passed": passed,
            }),
            &*self.clock,
        );
        self.record(event).await?;
        self.maybe_complete(submission).await
    }

    /// Approves a submission on behalf of a coordinator.
    ///
    /// When every named check is already true, completion runs
    /// immediately; the completed task is returned alongside the
    /// submission.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestrationError::NotReviewable`] unless the submission
    /// is open or has changes requested.
    pub async fn approve_submission(
        &self,
        submission_id: SubmissionId,
        coordinator: &CoordinatorId,
    ) -> OrchestrationResult<(Submission, Option<Task>)> {
        let submission = retrying(async || {
            let mut current = self.load_submission(submission_id).await?;
            current.approve(&*self.clock)?;
            Ok(self.submissions.update(&current).await?)
        })
        .await?;
        let event = ActivityEvent::new(
            EventKind::SubmissionApproved,
            Some(submission.task_id()),
            coordinator.as_str(),
            json!({
                "submission_id": submission_id.to_string(),
                "checks_passing": submission.all_checks_passing(),
            }),
            &*self.clock,
        );
        self.record(event).await?;
        self.maybe_complete(submission).await
    }

    /// Requests changes on a submission, reopening the task.
    ///
    /// The holder keeps the existing lease. When that lease has lapsed the
    /// submission status and the task's fall-back to assigned are still
    /// persisted (with their activity event) before
    /// [`OrchestrationError::LeaseExpired`] is returned, forcing the
    /// caller to reassign.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestrationError::Validation`] for a blank reason and
    /// [`OrchestrationError::NotReviewable`] unless the submission is open
    /// or approved.
    pub async fn request_changes(
        &self,
        submission_id: SubmissionId,
        coordinator: &CoordinatorId,
        reason: &str,
    ) -> OrchestrationResult<(Submission, Task)> {
        let trimmed = reason.trim();
        if trimmed.is_empty() {
            return Err(OrchestrationError::Validation(
                "a change request requires a non-empty reason".to_owned(),
            ));
        }
        let submission = retrying(async || {
            let mut current = self.load_submission(submission_id).await?;
            current.request_changes(&*self.clock)?;
            Ok(self.submissions.update(&current).await?)
        })
        .await?;
        let task_id = submission.task_id();
        let now = self.clock.utc();
        match self.leases.find_unreleased_for_task(task_id).await? {
            Some(held) if held.is_live(now) => {
                let task = retrying(async || {
                    let mut current = self.load_task(task_id).await?;
                    current.reopen(&*self.clock)?;
                    Ok(self.tasks.update(&current).await?)
                })
                .await?;
                let event = self.changes_requested_event(
                    task_id,
                    submission_id,
                    coordinator,
                    trimmed,
                    false,
                );
                self.record(event).await?;
                Ok((submission, task))
            }
            Some(dead) => {
                retrying(async || {
                    let mut current = self.load_task(task_id).await?;
                    current.fall_back_to_assigned(&*self.clock)?;
                    Ok(self.tasks.update(&current).await?)
                })
                .await?;
                let event = self.changes_requested_event(
                    task_id,
                    submission_id,
                    coordinator,
                    trimmed,
                    true,
                );
                self.record(event).await?;
                Err(OrchestrationError::LeaseExpired {
                    task_id,
                    lease_id: dead.id(),
                })
            }
            None => Err(no_lease_on_record(task_id)),
        }
    }

    /// Reassigns a non-terminal task to a new worker.
    ///
    /// Releases the current lease (if any) and closes any open submission,
    /// moving the task back to assigned. Update order is fixed: task, then
    /// lease, then submission.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestrationError::InvalidTransition`] when the task is
    /// terminal.
    pub async fn reassign_task(
        &self,
        task_id: TaskId,
        new_worker: &WorkerId,
        coordinator: &CoordinatorId,
    ) -> OrchestrationResult<Task> {
        let task = retrying(async || {
            let mut current = self.load_task(task_id).await?;
            current.reassign(new_worker.clone(), &*self.clock)?;
            Ok(self.tasks.update(&current).await?)
        })
        .await?;
        if let Some(lease) = self.leases.find_unreleased_for_task(task_id).await? {
            self.lease_manager.release(lease.id()).await?;
        }
        if let Some(open) = self.submissions.find_open_for_task(task_id).await? {
            let open_id = open.id();
            retrying(async || {
                let mut current = self
                    .submissions
                    .find_by_id(open_id)
                    .await?
                    .ok_or(OrchestrationError::SubmissionNotFound(open_id))?;
                current.close(&*self.clock)?;
                Ok(self.submissions.update(&current).await?)
            })
            .await?;
        }
        let event = ActivityEvent::new(
            EventKind::TaskReassigned,
            Some(task_id),
            coordinator.as_str(),
            json!({ "assignee": new_worker.as_str() }),
            &*self.clock,
        );
        self.record(event).await?;
        Ok(task)
    }

    /// Pushes a lease's expiry forward, capped at the policy maximum.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestrationError::LeaseNotActive`] when the lease's
    /// effective status is no longer live.
    pub async fn extend_lease(
        &self,
        lease_id: LeaseId,
        additional: Duration,
    ) -> OrchestrationResult<Lease> {
        let lease = retrying(async || Ok(self.lease_manager.extend(lease_id, additional).await?))
            .await?;
        let event = ActivityEvent::new(
            EventKind::LeaseExtended,
            Some(lease.task_id()),
            lease.holder().as_str(),
            json!({
                "lease_id": lease_id.to_string(),
                "expires_at": lease.expires_at().to_rfc3339(),
            }),
            &*self.clock,
        );
        self.record(event).await?;
        Ok(lease)
    }

    /// Releases a lease. Idempotent: releasing an already-released lease
    /// succeeds without a second event.
    ///
    /// Returns the lease and whether this call changed its status.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestrationError::LeaseNotFound`] for an unknown lease.
    pub async fn release_lease(&self, lease_id: LeaseId) -> OrchestrationResult<(Lease, bool)> {
        let (lease, changed) =
            retrying(async || Ok(self.lease_manager.release(lease_id).await?)).await?;
        if changed {
            let event = ActivityEvent::new(
                EventKind::LeaseReleased,
                Some(lease.task_id()),
                lease.holder().as_str(),
                json!({ "lease_id": lease_id.to_string() }),
                &*self.clock,
            );
            self.record(event).await?;
        }
        Ok((lease, changed))
    }

    /// Deletes a task that never progressed past assignment.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestrationError::InvalidTransition`] unless the task
    /// is in draft or assigned and has never held a lease.
    pub async fn delete_task(
        &self,
        task_id: TaskId,
        coordinator: &CoordinatorId,
    ) -> OrchestrationResult<()> {
        let task = self.load_task(task_id).await?;
        task.ensure_deletable()?;
        self.tasks.remove(task_id).await?;
        let event = ActivityEvent::new(
            EventKind::TaskDeleted,
            Some(task_id),
            coordinator.as_str(),
            json!({
                "title": task.title().as_str(),
                "state": task.state().as_str(),
            }),
            &*self.clock,
        );
        self.record(event).await?;
        Ok(())
    }

    /// Lists tasks matching the filter, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestrationError::StoreTimeout`] when the store
    /// round-trip exceeds its deadline.
    pub async fn list_tasks(&self, filter: &TaskFilter) -> OrchestrationResult<Vec<Task>> {
        Ok(self.tasks.list(filter).await?)
    }

    /// Lists pending task requests, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestrationError::StoreTimeout`] when the store
    /// round-trip exceeds its deadline.
    pub async fn list_pending_requests(&self) -> OrchestrationResult<Vec<TaskRequest>> {
        Ok(self.requests.list_pending().await?)
    }

    /// Returns the activity history for one task, in append order.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestrationError::StoreTimeout`] when the store
    /// round-trip exceeds its deadline.
    pub async fn activity_for_task(
        &self,
        task_id: TaskId,
    ) -> OrchestrationResult<Vec<ActivityEvent>> {
        Ok(self.log.for_task(task_id).await?)
    }

    /// Returns every event recorded in the half-open range `[from, to)`.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestrationError::StoreTimeout`] when the store
    /// round-trip exceeds its deadline.
    pub async fn activity_in_range(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> OrchestrationResult<Vec<ActivityEvent>> {
        Ok(self.log.in_range(from, to).await?)
    }

    /// Runs completion when the gate is satisfied.
    async fn maybe_complete(
        &self,
        submission: Submission,
    ) -> OrchestrationResult<(Submission, Option<Task>)> {
        if !submission.can_complete() {
            return Ok((submission, None));
        }
        let (merged, task) = self.complete(submission).await?;
        Ok((merged, Some(task)))
    }

    /// Completion path: merge the submission, finish the task, release the
    /// lease, append one `task_completed` event. Triggered internally by
    /// approval or a check report satisfying the gate; never called
    /// directly by the outside.
    async fn complete(&self, submission: Submission) -> OrchestrationResult<(Submission, Task)> {
        let task_id = submission.task_id();
        let mut merging = submission;
        merging.merge(&*self.clock)?;
        self.vcs.merge(merging.id()).await?;
        let merged = self.submissions.update(&merging).await?;
        let task = retrying(async || {
            let mut current = self.load_task(task_id).await?;
            current.complete(&*self.clock)?;
            Ok(self.tasks.update(&current).await?)
        })
        .await?;
        if let Some(lease) = self.leases.find_unreleased_for_task(task_id).await? {
            self.lease_manager.release(lease.id()).await?;
        }
        let event = ActivityEvent::new(
            EventKind::TaskCompleted,
            Some(task_id),
            ENGINE_ACTOR,
            json!({ "submission_id": merged.id().to_string() }),
            &*self.clock,
        );
        self.record(event).await?;
        Ok((merged, task))
    }

    fn changes_requested_event(
        &self,
        task_id: TaskId,
        submission_id: SubmissionId,
        coordinator: &CoordinatorId,
        reason: &str,
        lease_expired: bool,
    ) -> ActivityEvent {
        ActivityEvent::new(
            EventKind::ChangesRequested,
            Some(task_id),
            coordinator.as_str(),
            json!({
                "submission_id": submission_id.to_string(),
                "reason": reason,
                "lease_expired": lease_expired,
            }),
            &*self.clock,
        )
    }

    /// Appends the event, then fans it out best-effort. Notifier failure
    /// is logged and never rolls back the mutation.
    async fn record(&self, event: ActivityEvent) -> OrchestrationResult<()> {
        self.log.append(&event).await?;
        if let Err(err) = self.notifier.notify(&event).await {
            warn!(kind = %event.kind(), error = %err, "notification delivery failed");
        }
        Ok(())
    }

    async fn load_task(&self, task_id: TaskId) -> OrchestrationResult<Task> {
        self.tasks
            .find_by_id(task_id)
            .await?
            .ok_or(OrchestrationError::TaskNotFound(task_id))
    }

    async fn load_submission(&self, submission_id: SubmissionId) -> OrchestrationResult<Submission> {
        self.submissions
            .find_by_id(submission_id)
            .await?
            .ok_or(OrchestrationError::SubmissionNotFound(submission_id))
    }

    async fn load_request(&self, request_id: TaskRequestId) -> OrchestrationResult<TaskRequest> {
        self.requests
            .find_by_id(request_id)
            .await?
            .ok_or(OrchestrationError::RequestNotFound(request_id))
    }
}

/// A task in a state that requires a lease has none on record. Unreachable
/// through this facade; surfaced rather than panicking.
fn no_lease_on_record(task_id: TaskId) -> OrchestrationError {
    OrchestrationError::Validation(format!("task {task_id} has no lease on record"))
}

/// Reruns `op` on optimistic-lock conflicts, up to a bounded attempt
/// count. Each rerun reloads the aggregate, so a conflict lost to a
/// concurrent writer is reapplied against fresh state.
async fn retrying<T, Op>(mut op: Op) -> OrchestrationResult<T>
where
    Op: AsyncFnMut() -> OrchestrationResult<T>,
{
    let mut attempt = 1_u32;
    loop {
        match op().await {
            Err(err) if err.is_retryable() && attempt < MAX_CONFLICT_ATTEMPTS => {
                debug!(attempt, "store conflict, retrying");
                attempt += 1;
            }
            other => return other,
        }
    }
}
