//! In-memory ledger with the contract's authoritative semantics.
//!
//! Backs service tests and local development: monotonic task-id assignment,
//! escrow and fee bookkeeping, ledger-side authorization rules, and
//! running-average ratings, all without a network. Rejections carry the
//! ledger's own reason strings so gateway error paths behave as they do
//! against the real contract.

use crate::task::domain::{
    AccountId, AccountRating, FeePercentage, Rating, RewardAmount, TaskDraft, TaskId, TaskKind,
    TaskRecord,
};
use crate::task::ports::{
    GatewayError, GatewayResult, IdentityProvider, LedgerGateway, TxReference,
};
use async_trait::async_trait;
use mockable::{Clock, DefaultClock};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// Fee percentage of a freshly deployed ledger.
fn default_fee() -> FeePercentage {
    match FeePercentage::new(1) {
        Ok(fee) => fee,
        Err(_) => panic!("default fee percentage is valid"),
    }
}

/// Tunable parameters of a simulated ledger deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSettings {
    /// Platform fee percentage applied to every reward.
    pub platform_fee_percentage: FeePercentage,
}

impl Default for LedgerSettings {
    fn default() -> Self {
        Self {
            platform_fee_percentage: default_fee(),
        }
    }
}

#[derive(Debug, Default)]
struct ContractState {
    tasks: BTreeMap<u64, TaskRecord>,
    ratings: HashMap<String, AccountRating>,
    settings: LedgerSettings,
    total_fees: u128,
    next_task_id: u64,
}

/// Shared authoritative state, one per simulated contract deployment.
///
/// Multiple actors connect to the same deployment through
/// [`LedgerState::connect`]; every handle observes the same tasks and
/// ratings, as every wallet does against the real contract.
pub struct LedgerState {
    inner: Mutex<ContractState>,
    clock: Arc<dyn Clock + Send + Sync>,
}

impl LedgerState {
    /// Creates a deployment with explicit settings and clock.
    #[must_use]
    pub fn new(settings: LedgerSettings, clock: Arc<dyn Clock + Send + Sync>) -> Arc<Self> {
        Arc::new(Self {
            inner: Mutex::new(ContractState {
                settings,
                ..ContractState::default()
            }),
            clock,
        })
    }

    /// Creates a deployment with default settings and the system clock.
    #[must_use]
    pub fn with_defaults() -> Arc<Self> {
        Self::new(LedgerSettings::default(), Arc::new(DefaultClock))
    }

    /// Connects an actor to the deployment.
    #[must_use]
    pub fn connect(self: &Arc<Self>, actor: AccountId) -> InMemoryLedger {
        InMemoryLedger {
            state: Arc::clone(self),
            actor,
        }
    }

    /// Returns the platform fees accumulated so far.
    #[must_use]
    pub fn total_fees(&self) -> RewardAmount {
        RewardAmount::from_native(self.inner.lock().total_fees)
    }

    fn now_nanos(&self) -> u64 {
        let nanos = self.clock.utc().timestamp_nanos_opt().unwrap_or_default();
        u64::try_from(nanos).unwrap_or_default()
    }
}

/// Per-actor handle onto a shared in-memory ledger deployment.
#[derive(Clone)]
pub struct InMemoryLedger {
    state: Arc<LedgerState>,
    actor: AccountId,
}

impl InMemoryLedger {
    fn mint() -> TxReference {
        TxReference::new(Uuid::new_v4().to_string())
    }
}

fn task_mut(state: &mut ContractState, id: TaskId) -> GatewayResult<&mut TaskRecord> {
    state
        .tasks
        .get_mut(&id.value())
        .ok_or_else(|| GatewayError::rejected(format!("task {id} not found")))
}

fn stored_kind(record: &TaskRecord) -> GatewayResult<TaskKind> {
    TaskKind::try_from(record.task_type.as_str())
        .map_err(|err| GatewayError::rejected(err.to_string()))
}

impl IdentityProvider for InMemoryLedger {
    fn current_identity(&self) -> Option<AccountId> {
        Some(self.actor.clone())
    }
}

#[async_trait]
impl LedgerGateway for InMemoryLedger {
    async fn fetch_all_tasks(&self) -> GatewayResult<Vec<TaskRecord>> {
        let inner = self.state.inner.lock();
        Ok(inner.tasks.values().cloned().collect())
    }

    async fn fetch_task(&self, id: TaskId) -> GatewayResult<TaskRecord> {
        let inner = self.state.inner.lock();
        inner
            .tasks
            .get(&id.value())
            .cloned()
            .ok_or_else(|| GatewayError::rejected(format!("task {id} not found")))
    }

    async fn fetch_platform_fee_percentage(&self) -> GatewayResult<FeePercentage> {
        Ok(self.state.inner.lock().settings.platform_fee_percentage)
    }

    async fn fetch_rating(&self, account: &AccountId) -> GatewayResult<AccountRating> {
        let inner = self.state.inner.lock();
        Ok(inner
            .ratings
            .get(account.as_str())
            .copied()
            .unwrap_or(AccountRating::UNRATED))
    }

    async fn create_task(
        &self,
        draft: &TaskDraft,
        escrow: RewardAmount,
    ) -> GatewayResult<TxReference> {
        let mut inner = self.state.inner.lock();
        if !draft.reward().covers_storage_floor() {
            return Err(GatewayError::rejected(
                "reward does not cover the storage cost",
            ));
        }
        let fee = draft
            .reward()
            .platform_fee(inner.settings.platform_fee_percentage);
        let expected = draft.reward().with_fee(inner.settings.platform_fee_percentage);
        if escrow != expected {
            return Err(GatewayError::rejected(format!(
                "invalid escrow attached: {} native units required",
                expected.native()
            )));
        }
        let id = inner.next_task_id;
        inner.next_task_id += 1;
        let record = TaskRecord {
            id,
            title: draft.title().to_owned(),
            description: draft.description().to_owned(),
            task_type: draft.kind().as_code().to_owned(),
            author: self.actor.as_str().to_owned(),
            assignee: None,
            candidates: Vec::new(),
            created_at: self.state.now_nanos(),
            completed_at: None,
            reward: draft.reward().native().to_string(),
            result: None,
        };
        inner.tasks.insert(id, record);
        inner.total_fees += fee.native();
        debug!(task_id = id, author = %self.actor, "task listed");
        Ok(Self::mint())
    }

    async fn apply_for_task(&self, id: TaskId) -> GatewayResult<TxReference> {
        let mut inner = self.state.inner.lock();
        let task = task_mut(&mut inner, id)?;
        if task.completed_at.is_some() {
            return Err(GatewayError::rejected("task already completed"));
        }
        if task.assignee.is_some() {
            return Err(GatewayError::rejected("task already assigned"));
        }
        if task.author == self.actor.as_str() {
            return Err(GatewayError::rejected(
                "the author cannot apply for their own task",
            ));
        }
        if task.candidates.iter().any(|c| c == self.actor.as_str()) {
            return Err(GatewayError::rejected("account already applied"));
        }
        task.candidates.push(self.actor.as_str().to_owned());
        debug!(task_id = id.value(), account = %self.actor, "candidate applied");
        Ok(Self::mint())
    }

    async fn assign_task(&self, id: TaskId, candidate: &AccountId) -> GatewayResult<TxReference> {
        let mut inner = self.state.inner.lock();
        let task = task_mut(&mut inner, id)?;
        if task.author != self.actor.as_str() {
            return Err(GatewayError::rejected("only the author may assign"));
        }
        if task.assignee.is_some() {
            return Err(GatewayError::rejected("task already assigned"));
        }
        match stored_kind(task)? {
            TaskKind::FirstComeFirstServe => {
                // Strict queue: the head applicant takes the assignment.
                if task.candidates.first().map(String::as_str) != Some(candidate.as_str()) {
                    return Err(GatewayError::rejected(
                        "only the first applicant may be assigned",
                    ));
                }
            }
            TaskKind::SelectedByAuthor => {
                // The ledger lets the author bring in any identity here,
                // applicant or not.
            }
        }
        task.assignee = Some(candidate.as_str().to_owned());
        debug!(task_id = id.value(), assignee = %candidate, "task assigned");
        Ok(Self::mint())
    }

    async fn unassign_task(&self, id: TaskId) -> GatewayResult<TxReference> {
        let mut inner = self.state.inner.lock();
        let task = task_mut(&mut inner, id)?;
        if task.completed_at.is_some() {
            return Err(GatewayError::rejected("task already completed"));
        }
        let Some(assignee) = task.assignee.as_deref() else {
            return Err(GatewayError::rejected("task is not assigned"));
        };
        if task.author != self.actor.as_str() && assignee != self.actor.as_str() {
            return Err(GatewayError::rejected(
                "only the author or the assignee may unassign",
            ));
        }
        task.assignee = None;
        debug!(task_id = id.value(), "task unassigned");
        Ok(Self::mint())
    }

    async fn submit_result(&self, id: TaskId, result: &str) -> GatewayResult<TxReference> {
        let mut inner = self.state.inner.lock();
        let task = task_mut(&mut inner, id)?;
        if task.assignee.as_deref() != Some(self.actor.as_str()) {
            return Err(GatewayError::rejected(
                "only the assignee may submit a result",
            ));
        }
        if task.result.is_some() {
            return Err(GatewayError::rejected("result already submitted"));
        }
        if result.is_empty() {
            return Err(GatewayError::rejected("result cannot be empty"));
        }
        task.result = Some(result.to_owned());
        debug!(task_id = id.value(), "result submitted");
        Ok(Self::mint())
    }

    async fn complete_task(&self, id: TaskId, rating: Rating) -> GatewayResult<TxReference> {
        let now = self.state.now_nanos();
        let mut inner = self.state.inner.lock();
        let task = task_mut(&mut inner, id)?;
        if task.author != self.actor.as_str() {
            return Err(GatewayError::rejected("only the author may complete"));
        }
        if task.result.is_none() {
            return Err(GatewayError::rejected("result is not submitted yet"));
        }
        if task.completed_at.is_some() {
            return Err(GatewayError::rejected("task already completed"));
        }
        let Some(assignee) = task.assignee.clone() else {
            return Err(GatewayError::rejected("task is not assigned"));
        };
        task.completed_at = Some(now);
        let folded = inner
            .ratings
            .get(&assignee)
            .copied()
            .unwrap_or(AccountRating::UNRATED)
            .fold(rating);
        inner.ratings.insert(assignee, folded);
        debug!(task_id = id.value(), rating = rating.value(), "task completed");
        Ok(Self::mint())
    }

    async fn delete_task(&self, id: TaskId) -> GatewayResult<TxReference> {
        let mut inner = self.state.inner.lock();
        let task = task_mut(&mut inner, id)?;
        if task.author != self.actor.as_str() {
            return Err(GatewayError::rejected("only the author may delete"));
        }
        if task.completed_at.is_some() {
            return Err(GatewayError::rejected("completed tasks cannot be deleted"));
        }
        inner.tasks.remove(&id.value());
        debug!(task_id = id.value(), "task deleted");
        Ok(Self::mint())
    }
}
