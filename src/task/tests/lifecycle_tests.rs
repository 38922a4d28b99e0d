//! Service tests for lifecycle orchestration and cache reconciliation.

use super::support::{account, draft};
use crate::task::adapters::memory::{InMemoryLedger, LedgerState};
use crate::task::domain::{
    AccountId, Rating, TaskId, TaskKind, TaskRecord, TaskState, TransitionError,
};
use crate::task::ports::{
    GatewayError, GatewayResult, IdentityProvider, LedgerGateway, TxReference,
};
use crate::task::services::{LifecycleError, LifecycleService};
use async_trait::async_trait;
use eyre::{bail, ensure};
use mockall::mock;
use rstest::rstest;
use std::io;
use std::sync::Arc;
use tokio::sync::Notify;

type MemoryService = LifecycleService<InMemoryLedger, InMemoryLedger>;

fn service(ledger: InMemoryLedger) -> MemoryService {
    let handle = Arc::new(ledger);
    LifecycleService::new(Arc::clone(&handle), handle)
}

fn rating(value: u8) -> Rating {
    Rating::new(value).expect("valid rating")
}

async fn create_listed(svc: &MemoryService, kind: TaskKind) -> eyre::Result<TaskId> {
    svc.create_task(&draft(kind)).await?;
    let tasks = svc.cache().all_tasks();
    let Some(task) = tasks.last() else {
        bail!("expected the cache to contain the created task");
    };
    Ok(task.id())
}

mock! {
    Identity {}

    impl IdentityProvider for Identity {
        fn current_identity(&self) -> Option<AccountId>;
    }
}

/// Gateway that parks the first apply call until released, so a transition
/// can be held in flight deterministically.
#[derive(Clone)]
struct StalledGateway {
    inner: InMemoryLedger,
    entered: Arc<Notify>,
    release: Arc<Notify>,
}

impl StalledGateway {
    fn new(inner: InMemoryLedger) -> Self {
        Self {
            inner,
            entered: Arc::new(Notify::new()),
            release: Arc::new(Notify::new()),
        }
    }
}

#[async_trait]
impl LedgerGateway for StalledGateway {
    async fn fetch_all_tasks(&self) -> GatewayResult<Vec<TaskRecord>> {
        self.inner.fetch_all_tasks().await
    }

    async fn fetch_task(&self, id: TaskId) -> GatewayResult<TaskRecord> {
        self.inner.fetch_task(id).await
    }

    async fn fetch_platform_fee_percentage(
        &self,
    ) -> GatewayResult<crate::task::domain::FeePercentage> {
        self.inner.fetch_platform_fee_percentage().await
    }

    async fn fetch_rating(
        &self,
        account: &AccountId,
    ) -> GatewayResult<crate::task::domain::AccountRating> {
        self.inner.fetch_rating(account).await
    }

    async fn create_task(
        &self,
        task_draft: &crate::task::domain::TaskDraft,
        escrow: crate::task::domain::RewardAmount,
    ) -> GatewayResult<TxReference> {
        self.inner.create_task(task_draft, escrow).await
    }

    async fn apply_for_task(&self, id: TaskId) -> GatewayResult<TxReference> {
        self.entered.notify_one();
        self.release.notified().await;
        self.inner.apply_for_task(id).await
    }

    async fn assign_task(&self, id: TaskId, candidate: &AccountId) -> GatewayResult<TxReference> {
        self.inner.assign_task(id, candidate).await
    }

    async fn unassign_task(&self, id: TaskId) -> GatewayResult<TxReference> {
        self.inner.unassign_task(id).await
    }

    async fn submit_result(&self, id: TaskId, result: &str) -> GatewayResult<TxReference> {
        self.inner.submit_result(id, result).await
    }

    async fn complete_task(&self, id: TaskId, task_rating: Rating) -> GatewayResult<TxReference> {
        self.inner.complete_task(id, task_rating).await
    }

    async fn delete_task(&self, id: TaskId) -> GatewayResult<TxReference> {
        self.inner.delete_task(id).await
    }
}

/// Gateway whose writes never reach the ledger.
#[derive(Clone)]
struct FailingGateway {
    inner: InMemoryLedger,
}

impl FailingGateway {
    fn unreachable_err() -> GatewayError {
        GatewayError::network(io::Error::other("connection reset"))
    }
}

#[async_trait]
impl LedgerGateway for FailingGateway {
    async fn fetch_all_tasks(&self) -> GatewayResult<Vec<TaskRecord>> {
        self.inner.fetch_all_tasks().await
    }

    async fn fetch_task(&self, id: TaskId) -> GatewayResult<TaskRecord> {
        self.inner.fetch_task(id).await
    }

    async fn fetch_platform_fee_percentage(
        &self,
    ) -> GatewayResult<crate::task::domain::FeePercentage> {
        self.inner.fetch_platform_fee_percentage().await
    }

    async fn fetch_rating(
        &self,
        account: &AccountId,
    ) -> GatewayResult<crate::task::domain::AccountRating> {
        self.inner.fetch_rating(account).await
    }

    async fn create_task(
        &self,
        _task_draft: &crate::task::domain::TaskDraft,
        _escrow: crate::task::domain::RewardAmount,
    ) -> GatewayResult<TxReference> {
        Err(Self::unreachable_err())
    }

    async fn apply_for_task(&self, _id: TaskId) -> GatewayResult<TxReference> {
        Err(Self::unreachable_err())
    }

    async fn assign_task(
        &self,
        _id: TaskId,
        _candidate: &AccountId,
    ) -> GatewayResult<TxReference> {
        Err(Self::unreachable_err())
    }

    async fn unassign_task(&self, _id: TaskId) -> GatewayResult<TxReference> {
        Err(Self::unreachable_err())
    }

    async fn submit_result(&self, _id: TaskId, _result: &str) -> GatewayResult<TxReference> {
        Err(Self::unreachable_err())
    }

    async fn complete_task(&self, _id: TaskId, _rating: Rating) -> GatewayResult<TxReference> {
        Err(Self::unreachable_err())
    }

    async fn delete_task(&self, _id: TaskId) -> GatewayResult<TxReference> {
        Err(Self::unreachable_err())
    }
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn fcfs_apply_then_untargeted_assign_picks_the_first_applicant() -> eyre::Result<()> {
    let state = LedgerState::with_defaults();
    let author = service(state.connect(account("author.test")));
    let worker = service(state.connect(account("worker.test")));

    let id = create_listed(&author, TaskKind::FirstComeFirstServe).await?;

    worker.load_tasks().await?;
    worker.apply(id).await?;
    let Some(applied) = worker.cache().task(id) else {
        bail!("expected the applied task in the worker cache");
    };
    ensure!(applied.candidates() == [account("worker.test")]);
    ensure!(applied.state() == TaskState::Open);

    author.load_tasks().await?;
    author.assign(id, None).await?;
    let Some(assigned) = author.cache().task(id) else {
        bail!("expected the assigned task in the author cache");
    };
    ensure!(assigned.assignee() == Some(&account("worker.test")));
    ensure!(assigned.state() == TaskState::Assigned);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn selected_by_author_assign_takes_the_named_candidate() -> eyre::Result<()> {
    let state = LedgerState::with_defaults();
    let author = service(state.connect(account("author.test")));
    let first = service(state.connect(account("a.test")));
    let second = service(state.connect(account("b.test")));

    let id = create_listed(&author, TaskKind::SelectedByAuthor).await?;
    first.apply(id).await?;
    second.apply(id).await?;

    author.load_tasks().await?;
    author.assign(id, Some(&account("b.test"))).await?;
    let Some(assigned) = author.cache().task(id) else {
        bail!("expected the assigned task in the author cache");
    };
    // The second applicant may win; arrival order only binds FCFS tasks.
    ensure!(assigned.assignee() == Some(&account("b.test")));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn empty_result_submission_and_premature_completion_fail_locally() -> eyre::Result<()> {
    let state = LedgerState::with_defaults();
    let author = service(state.connect(account("author.test")));
    let worker = service(state.connect(account("worker.test")));

    let id = create_listed(&author, TaskKind::SelectedByAuthor).await?;
    worker.apply(id).await?;
    author.load_tasks().await?;
    author.assign(id, Some(&account("worker.test"))).await?;

    let blank = worker.submit_result(id, "").await;
    ensure!(matches!(
        blank,
        Err(LifecycleError::Transition(TransitionError::InvalidState { .. }))
    ));

    let premature = author.complete(id, rating(5)).await;
    ensure!(matches!(
        premature,
        Err(LifecycleError::Transition(TransitionError::InvalidState { .. }))
    ));

    // Nothing reached the ledger.
    let record = state.connect(account("author.test")).fetch_task(id).await?;
    ensure!(record.result.is_none());
    ensure!(record.completed_at.is_none());
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn completed_tasks_cannot_be_deleted() -> eyre::Result<()> {
    let state = LedgerState::with_defaults();
    let author = service(state.connect(account("author.test")));
    let worker = service(state.connect(account("worker.test")));

    let id = create_listed(&author, TaskKind::SelectedByAuthor).await?;
    worker.apply(id).await?;
    author.load_tasks().await?;
    author.assign(id, Some(&account("worker.test"))).await?;
    worker.submit_result(id, "delivered").await?;
    author.load_task(id).await?;
    author.complete(id, rating(4)).await?;

    let result = author.delete(id).await;
    ensure!(matches!(
        result,
        Err(LifecycleError::Transition(TransitionError::InvalidState {
            state: TaskState::Completed,
            ..
        }))
    ));

    let record = state.connect(account("author.test")).fetch_task(id).await?;
    ensure!(record.completed_at.is_some());
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn applying_twice_never_duplicates_a_candidate() -> eyre::Result<()> {
    let state = LedgerState::with_defaults();
    let author = service(state.connect(account("author.test")));
    let worker = service(state.connect(account("worker.test")));

    let id = create_listed(&author, TaskKind::SelectedByAuthor).await?;
    worker.load_tasks().await?;
    worker.apply(id).await?;

    let again = worker.apply(id).await;
    ensure!(matches!(
        again,
        Err(LifecycleError::Transition(TransitionError::PermissionDenied { .. }))
    ));

    let record = state.connect(account("worker.test")).fetch_task(id).await?;
    ensure!(record.candidates == vec!["worker.test".to_owned()]);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn a_second_transition_while_one_is_pending_reports_busy() -> eyre::Result<()> {
    let state = LedgerState::with_defaults();
    let author = service(state.connect(account("author.test")));
    let id = create_listed(&author, TaskKind::SelectedByAuthor).await?;

    let worker_ledger = state.connect(account("worker.test"));
    let stalled = StalledGateway::new(worker_ledger.clone());
    let worker =
        LifecycleService::new(Arc::new(stalled.clone()), Arc::new(worker_ledger));
    worker.load_tasks().await?;

    let pending = worker.clone();
    let in_flight = tokio::spawn(async move { pending.apply(id).await });
    stalled.entered.notified().await;

    let second = worker.apply(id).await;
    ensure!(matches!(second, Err(LifecycleError::Busy(busy)) if busy == id));
    // The rejected attempt left the cached task untouched.
    let Some(cached) = worker.cache().task(id) else {
        bail!("expected the task in the worker cache");
    };
    ensure!(cached.candidates().is_empty());

    stalled.release.notify_one();
    in_flight.await??;

    // The slot is free again: a repeat attempt now fails the guard, not the
    // busy check.
    let repeat = worker.apply(id).await;
    ensure!(matches!(
        repeat,
        Err(LifecycleError::Transition(TransitionError::PermissionDenied { .. }))
    ));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn a_failed_ledger_call_leaves_the_cache_untouched() -> eyre::Result<()> {
    let state = LedgerState::with_defaults();
    let author = service(state.connect(account("author.test")));
    let id = create_listed(&author, TaskKind::FirstComeFirstServe).await?;

    let author_ledger = state.connect(account("author.test"));
    let failing = LifecycleService::new(
        Arc::new(FailingGateway {
            inner: author_ledger.clone(),
        }),
        Arc::new(author_ledger),
    );
    failing.load_tasks().await?;
    failing.load_task(id).await?;
    let tasks_before = failing.cache().all_tasks();
    let focused_before = failing.cache().focused_task();

    let result = failing.delete(id).await;
    ensure!(matches!(
        result,
        Err(LifecycleError::Gateway(GatewayError::Network(_)))
    ));

    ensure!(failing.cache().all_tasks() == tasks_before);
    ensure!(failing.cache().focused_task() == focused_before);
    let record = state.connect(account("author.test")).fetch_task(id).await?;
    ensure!(record.id == id.value());
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn transitions_require_a_connected_identity() -> eyre::Result<()> {
    let state = LedgerState::with_defaults();
    let gateway = Arc::new(state.connect(account("ghost.test")));

    let mut identity = MockIdentity::new();
    identity.expect_current_identity().returning(|| None);
    let disconnected = LifecycleService::new(gateway, Arc::new(identity));

    let apply = disconnected.apply(TaskId::new(0)).await;
    ensure!(matches!(apply, Err(LifecycleError::NotAuthenticated)));

    let create = disconnected
        .create_task(&draft(TaskKind::FirstComeFirstServe))
        .await;
    ensure!(matches!(create, Err(LifecycleError::NotAuthenticated)));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn create_task_escrows_the_fee_and_refreshes_the_list() -> eyre::Result<()> {
    let state = LedgerState::with_defaults();
    let author = service(state.connect(account("author.test")));

    ensure!(author.cache().all_tasks().is_empty());
    author.create_task(&draft(TaskKind::FirstComeFirstServe)).await?;

    let tasks = author.cache().all_tasks();
    ensure!(tasks.len() == 1);
    ensure!(
        state.total_fees()
            == draft(TaskKind::FirstComeFirstServe)
                .reward()
                .platform_fee(author.platform_fee().await?)
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn delete_drops_the_task_from_cache_and_listing() -> eyre::Result<()> {
    let state = LedgerState::with_defaults();
    let author = service(state.connect(account("author.test")));

    let id = create_listed(&author, TaskKind::FirstComeFirstServe).await?;
    author.load_task(id).await?;
    ensure!(author.cache().focused_task().is_some());

    author.delete(id).await?;
    ensure!(author.cache().task(id).is_none());
    ensure!(author.cache().focused_task().is_none());
    ensure!(author.cache().all_tasks().is_empty());
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn unassign_returns_the_task_to_the_open_state() -> eyre::Result<()> {
    let state = LedgerState::with_defaults();
    let author = service(state.connect(account("author.test")));
    let worker = service(state.connect(account("worker.test")));

    let id = create_listed(&author, TaskKind::SelectedByAuthor).await?;
    worker.apply(id).await?;
    author.load_tasks().await?;
    author.assign(id, Some(&account("worker.test"))).await?;

    worker.load_tasks().await?;
    worker.unassign(id).await?;
    let Some(task) = worker.cache().task(id) else {
        bail!("expected the task in the worker cache");
    };
    ensure!(task.state() == TaskState::Open);
    ensure!(task.assignee().is_none());
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn completion_records_the_rating_against_the_assignee() -> eyre::Result<()> {
    let state = LedgerState::with_defaults();
    let author = service(state.connect(account("author.test")));
    let worker = service(state.connect(account("worker.test")));

    let id = create_listed(&author, TaskKind::FirstComeFirstServe).await?;
    worker.apply(id).await?;
    author.load_tasks().await?;
    author.assign(id, None).await?;
    worker.submit_result(id, "delivered").await?;
    author.load_task(id).await?;
    author.complete(id, rating(5)).await?;

    let Some(task) = author.cache().task(id) else {
        bail!("expected the completed task in the author cache");
    };
    ensure!(task.state() == TaskState::Completed);
    ensure!(task.completed_at().is_some());
    ensure!(task.result() == Some("delivered"));
    ensure!(author.account_rating(&account("worker.test")).await?.value() == 5);
    Ok(())
}
