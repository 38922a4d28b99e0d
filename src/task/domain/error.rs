//! Error types for domain validation and transition guards.

use super::{AccountId, TaskId, TaskState, TransitionKind};
use thiserror::Error;

/// Errors returned while constructing domain task values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TaskDomainError {
    /// The account identifier is empty or contains whitespace.
    #[error("invalid account id '{0}'")]
    InvalidAccountId(String),

    /// The rating is outside the 1..=5 range.
    #[error("invalid rating {0}, expected 1..=5")]
    InvalidRating(u8),

    /// The aggregate account rating is outside the 0..=5 range.
    #[error("invalid account rating {0}, expected 0..=5")]
    InvalidAccountRating(u8),

    /// The platform fee percentage is not below 100.
    #[error("invalid platform fee percentage {0}, expected 0..100")]
    InvalidFeePercentage(u8),

    /// The task title is empty after trimming.
    #[error("task title must not be empty")]
    EmptyTitle,

    /// The task description is empty after trimming.
    #[error("task description must not be empty")]
    EmptyDescription,

    /// The reward does not cover the ledger's storage cost floor.
    #[error("reward of {0} native units does not cover the storage cost floor")]
    RewardBelowFloor(u128),
}

/// Error returned while parsing task kind codes from ledger records.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown task kind code: {0}")]
pub struct ParseTaskKindError(pub String);

/// A transition attempt rejected by the local guard before any ledger call.
///
/// Guards run against the last-known task snapshot, so a doomed transaction
/// is never submitted and the caller gets a precise reason instead of an
/// opaque ledger rejection.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransitionError {
    /// The acting identity is not allowed to perform the transition.
    #[error("{actor} may not {action} task {task_id}: {rule}")]
    PermissionDenied {
        /// Task the transition targeted.
        task_id: TaskId,
        /// Transition that was attempted.
        action: TransitionKind,
        /// Identity that attempted it.
        actor: AccountId,
        /// Actor rule that failed.
        rule: &'static str,
    },

    /// The task is not in a state that admits the transition.
    #[error("cannot {action} task {task_id} in state {state}: {rule}")]
    InvalidState {
        /// Task the transition targeted.
        task_id: TaskId,
        /// Transition that was attempted.
        action: TransitionKind,
        /// State the task was in.
        state: TaskState,
        /// Precondition that failed.
        rule: &'static str,
    },
}
