//! Lifecycle orchestration: guarded transitions and cache reconciliation.

use super::store::TaskCache;
use crate::task::domain::{
    AccountId, AccountRating, FeePercentage, Rating, Task, TaskDraft, TaskId, TaskRecord,
    TransitionError,
};
use crate::task::ports::{GatewayError, IdentityProvider, LedgerGateway, TxReference};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

/// Service-level errors for lifecycle operations.
#[derive(Debug, Clone, Error)]
pub enum LifecycleError {
    /// No identity is connected.
    #[error("no identity is connected")]
    NotAuthenticated,

    /// A transition for this task is already in flight.
    #[error("a transition for task {0} is already in flight")]
    Busy(TaskId),

    /// The local guard rejected the transition before any ledger call.
    #[error(transparent)]
    Transition(#[from] TransitionError),

    /// The ledger call failed or was rejected.
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

/// Result type for lifecycle service operations.
pub type LifecycleResult<T> = Result<T, LifecycleError>;

/// Task lifecycle orchestration service.
///
/// The single writer of the [`TaskCache`]. Every transition follows the
/// same shape: take the in-flight slot for the task, resolve the connected
/// identity, run the domain guard against the last-known snapshot, submit
/// the signed ledger call, and reconcile the cache once the ledger
/// confirms. Cached state is never mutated on a failed call, so the
/// visible state cannot run ahead of the ledger.
#[derive(Clone)]
pub struct LifecycleService<G, I>
where
    G: LedgerGateway,
    I: IdentityProvider,
{
    gateway: Arc<G>,
    identity: Arc<I>,
    cache: TaskCache,
    in_flight: Arc<Mutex<HashSet<TaskId>>>,
}

/// Releases the in-flight slot when a transition settles, on both the
/// success and the failure path.
struct InFlightGuard {
    set: Arc<Mutex<HashSet<TaskId>>>,
    id: TaskId,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.set.lock().remove(&self.id);
    }
}

impl<G, I> LifecycleService<G, I>
where
    G: LedgerGateway,
    I: IdentityProvider,
{
    /// Creates a lifecycle service over a ledger gateway and identity
    /// provider.
    #[must_use]
    pub fn new(gateway: Arc<G>, identity: Arc<I>) -> Self {
        Self {
            gateway,
            identity,
            cache: TaskCache::new(),
            in_flight: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Returns the task cache read by projections and presentation.
    #[must_use]
    pub const fn cache(&self) -> &TaskCache {
        &self.cache
    }

    /// Loads the full task list into the cache.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::Gateway`] when the listing cannot be
    /// fetched or a record fails the schema.
    pub async fn load_tasks(&self) -> LifecycleResult<Vec<Task>> {
        let tasks = self.fetch_all_normalized().await?;
        self.cache.replace_all(tasks.clone());
        Ok(tasks)
    }

    /// Loads a single task into the focused cache slot.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::Gateway`] when the task cannot be fetched
    /// or fails the schema.
    pub async fn load_task(&self, id: TaskId) -> LifecycleResult<Task> {
        let task = self.fetch_normalized(id).await?;
        self.cache.focus(task.clone());
        Ok(task)
    }

    /// Reads the global platform fee percentage.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::Gateway`] when the read fails.
    pub async fn platform_fee(&self) -> LifecycleResult<FeePercentage> {
        Ok(self.gateway.fetch_platform_fee_percentage().await?)
    }

    /// Reads the aggregate rating of an account.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::Gateway`] when the read fails.
    pub async fn account_rating(&self, account: &AccountId) -> LifecycleResult<AccountRating> {
        Ok(self.gateway.fetch_rating(account).await?)
    }

    /// Creates a task, escrowing the reward plus the platform fee, and
    /// refreshes the task list.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::NotAuthenticated`] without an identity and
    /// [`LifecycleError::Gateway`] when the fee read or the submission
    /// fails.
    pub async fn create_task(&self, draft: &TaskDraft) -> LifecycleResult<TxReference> {
        let author = self.current_identity()?;
        let fee = self.gateway.fetch_platform_fee_percentage().await?;
        let escrow = draft.reward().with_fee(fee);
        let reference = self.gateway.create_task(draft, escrow).await?;
        info!(author = %author, escrow = %escrow, reference = %reference, "task created");
        self.refresh_list().await?;
        Ok(reference)
    }

    /// Applies the connected identity as a candidate.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError`] when unauthenticated, busy, rejected by
    /// the guard, or failed at the ledger.
    pub async fn apply(&self, id: TaskId) -> LifecycleResult<TxReference> {
        let actor = self.current_identity()?;
        let _guard = self.begin(id)?;
        let task = self.snapshot(id).await?;
        task.check_apply(&actor)?;
        let reference = self.submit(self.gateway.apply_for_task(id).await, id, "apply")?;
        info!(task_id = %id, actor = %actor, "applied for task");
        self.refresh_task(id).await?;
        Ok(reference)
    }

    /// Assigns the task.
    ///
    /// In first-come-first-serve mode `candidate` may be omitted; the first
    /// applicant is resolved automatically. In selected-by-author mode the
    /// author must name a candidate.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError`] when unauthenticated, busy, rejected by
    /// the guard, or failed at the ledger.
    pub async fn assign(
        &self,
        id: TaskId,
        candidate: Option<&AccountId>,
    ) -> LifecycleResult<TxReference> {
        let actor = self.current_identity()?;
        let _guard = self.begin(id)?;
        let task = self.snapshot(id).await?;
        let target = task.resolve_assignment(&actor, candidate)?;
        let reference = self.submit(self.gateway.assign_task(id, &target).await, id, "assign")?;
        info!(task_id = %id, assignee = %target, "task assigned");
        self.refresh_list().await?;
        self.refresh_task(id).await?;
        Ok(reference)
    }

    /// Releases the current assignee, returning the task to the open state.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError`] when unauthenticated, busy, rejected by
    /// the guard, or failed at the ledger.
    pub async fn unassign(&self, id: TaskId) -> LifecycleResult<TxReference> {
        let actor = self.current_identity()?;
        let _guard = self.begin(id)?;
        let task = self.snapshot(id).await?;
        task.check_unassign(&actor)?;
        let reference = self.submit(self.gateway.unassign_task(id).await, id, "unassign")?;
        info!(task_id = %id, actor = %actor, "task unassigned");
        self.refresh_list().await?;
        self.refresh_task(id).await?;
        Ok(reference)
    }

    /// Submits the work result for an assigned task.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError`] when unauthenticated, busy, rejected by
    /// the guard, or failed at the ledger.
    pub async fn submit_result(&self, id: TaskId, result: &str) -> LifecycleResult<TxReference> {
        let actor = self.current_identity()?;
        let _guard = self.begin(id)?;
        let task = self.snapshot(id).await?;
        task.check_submit_result(&actor, result)?;
        let reference = self.submit(self.gateway.submit_result(id, result).await, id, "submit")?;
        info!(task_id = %id, "result submitted");
        self.refresh_task(id).await?;
        Ok(reference)
    }

    /// Rates the assignee and completes the task, releasing the escrowed
    /// reward.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError`] when unauthenticated, busy, rejected by
    /// the guard, or failed at the ledger.
    pub async fn complete(&self, id: TaskId, rating: Rating) -> LifecycleResult<TxReference> {
        let actor = self.current_identity()?;
        let _guard = self.begin(id)?;
        let task = self.snapshot(id).await?;
        task.check_complete(&actor)?;
        let reference =
            self.submit(self.gateway.complete_task(id, rating).await, id, "complete")?;
        info!(task_id = %id, rating = rating.value(), "task completed");
        self.refresh_task(id).await?;
        Ok(reference)
    }

    /// Deletes the task, refunding the escrow to the author.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError`] when unauthenticated, busy, rejected by
    /// the guard, or failed at the ledger.
    pub async fn delete(&self, id: TaskId) -> LifecycleResult<TxReference> {
        let actor = self.current_identity()?;
        let _guard = self.begin(id)?;
        let task = self.snapshot(id).await?;
        task.check_delete(&actor)?;
        let reference = self.submit(self.gateway.delete_task(id).await, id, "delete")?;
        info!(task_id = %id, "task deleted");
        self.cache.remove(id);
        self.refresh_list().await?;
        Ok(reference)
    }

    fn current_identity(&self) -> LifecycleResult<AccountId> {
        self.identity
            .current_identity()
            .ok_or(LifecycleError::NotAuthenticated)
    }

    /// Takes the in-flight slot for a task, or reports it busy.
    fn begin(&self, id: TaskId) -> LifecycleResult<InFlightGuard> {
        let mut set = self.in_flight.lock();
        if !set.insert(id) {
            return Err(LifecycleError::Busy(id));
        }
        drop(set);
        Ok(InFlightGuard {
            set: Arc::clone(&self.in_flight),
            id,
        })
    }

    /// Settles a gateway write, logging rejections without reinterpreting
    /// them.
    fn submit(
        &self,
        outcome: Result<TxReference, GatewayError>,
        id: TaskId,
        action: &'static str,
    ) -> LifecycleResult<TxReference> {
        outcome.map_err(|err| {
            warn!(task_id = %id, action, error = %err, "ledger call failed");
            LifecycleError::Gateway(err)
        })
    }

    /// Returns the guard snapshot: the cached task, or a fresh fetch when
    /// the cache has never seen it.
    async fn snapshot(&self, id: TaskId) -> LifecycleResult<Task> {
        if let Some(task) = self.cache.task(id) {
            return Ok(task);
        }
        self.fetch_normalized(id).await
    }

    async fn fetch_normalized(&self, id: TaskId) -> LifecycleResult<Task> {
        let record = self.gateway.fetch_task(id).await?;
        Ok(record.normalize().map_err(GatewayError::from)?)
    }

    async fn fetch_all_normalized(&self) -> LifecycleResult<Vec<Task>> {
        let records = self.gateway.fetch_all_tasks().await?;
        let tasks = records
            .iter()
            .map(TaskRecord::normalize)
            .collect::<Result<Vec<_>, _>>()
            .map_err(GatewayError::from)?;
        Ok(tasks)
    }

    async fn refresh_task(&self, id: TaskId) -> LifecycleResult<()> {
        let task = self.fetch_normalized(id).await?;
        self.cache.upsert(&task);
        Ok(())
    }

    async fn refresh_list(&self) -> LifecycleResult<()> {
        let tasks = self.fetch_all_normalized().await?;
        self.cache.replace_all(tasks);
        Ok(())
    }
}
