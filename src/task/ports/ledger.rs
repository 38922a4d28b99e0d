//! Ledger gateway port: the typed request/response boundary to the
//! marketplace contract.

use crate::task::domain::{
    AccountId, AccountRating, FeePercentage, Rating, RecordError, RewardAmount, TaskDraft, TaskId,
    TaskRecord,
};
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Result type for ledger gateway operations.
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Reference to a settled ledger transaction.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TxReference(String);

impl TxReference {
    /// Wraps a transaction hash returned by the ledger.
    #[must_use]
    pub fn new(hash: impl Into<String>) -> Self {
        Self(hash.into())
    }

    /// Returns the transaction hash as `str`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TxReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Errors surfaced by ledger gateway implementations.
#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    /// No signed identity is available for the call.
    #[error("no authenticated identity is available")]
    NotAuthenticated,

    /// The ledger rejected the call; the reason is passed through verbatim.
    #[error("ledger rejected the call: {reason}")]
    Rejected {
        /// The ledger's own rejection reason.
        reason: String,
    },

    /// The gateway call did not complete.
    #[error("ledger unreachable: {0}")]
    Network(Arc<dyn std::error::Error + Send + Sync>),

    /// A ledger payload did not match the expected schema.
    #[error(transparent)]
    Schema(#[from] RecordError),
}

impl GatewayError {
    /// Builds a rejection carrying the ledger's reason.
    pub fn rejected(reason: impl Into<String>) -> Self {
        Self::Rejected {
            reason: reason.into(),
        }
    }

    /// Wraps a transport error.
    pub fn network(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Network(Arc::new(err))
    }
}

/// Fixed RPC surface of the marketplace contract.
///
/// Read methods have no side effects and may be issued by any identity.
/// Write methods require a signed actor, settle asynchronously, and may be
/// rejected by the ledger's own rules; no method retries implicitly — the
/// caller decides.
#[async_trait]
pub trait LedgerGateway: Send + Sync {
    /// Returns every task currently listed, in ledger order (newest last).
    async fn fetch_all_tasks(&self) -> GatewayResult<Vec<TaskRecord>>;

    /// Returns a single task record.
    async fn fetch_task(&self, id: TaskId) -> GatewayResult<TaskRecord>;

    /// Returns the global platform fee percentage.
    async fn fetch_platform_fee_percentage(&self) -> GatewayResult<FeePercentage>;

    /// Returns the aggregate rating of an account (zero when unrated).
    async fn fetch_rating(&self, account: &AccountId) -> GatewayResult<AccountRating>;

    /// Creates a task, attaching `escrow` (reward plus platform fee).
    async fn create_task(
        &self,
        draft: &TaskDraft,
        escrow: RewardAmount,
    ) -> GatewayResult<TxReference>;

    /// Applies the signed identity as a candidate.
    async fn apply_for_task(&self, id: TaskId) -> GatewayResult<TxReference>;

    /// Assigns the task to `candidate`.
    async fn assign_task(&self, id: TaskId, candidate: &AccountId) -> GatewayResult<TxReference>;

    /// Clears the task's assignee.
    async fn unassign_task(&self, id: TaskId) -> GatewayResult<TxReference>;

    /// Submits the work result.
    async fn submit_result(&self, id: TaskId, result: &str) -> GatewayResult<TxReference>;

    /// Records the rating and completes the task, paying out the reward.
    async fn complete_task(&self, id: TaskId, rating: Rating) -> GatewayResult<TxReference>;

    /// Deletes the task and refunds the escrowed reward to the author.
    async fn delete_task(&self, id: TaskId) -> GatewayResult<TxReference>;
}
