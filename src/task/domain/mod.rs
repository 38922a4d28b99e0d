//! Domain model for marketplace task lifecycle management.
//!
//! The domain models ledger-backed tasks, their derived lifecycle states,
//! the transition guards that run before any ledger call, and the
//! per-viewer action projection, while keeping all infrastructure concerns
//! outside of the domain boundary.

mod error;
mod ids;
mod projection;
mod record;
mod task;

pub use error::{ParseTaskKindError, TaskDomainError, TransitionError};
pub use ids::{AccountId, AccountRating, FeePercentage, Rating, RewardAmount, TaskId};
pub use projection::{AvailableAction, available_action};
pub use record::{RecordError, TaskRecord};
pub use task::{
    FetchedTaskData, Task, TaskDraft, TaskKind, TaskState, TransitionKind, UNASSIGNED_LABEL,
};
