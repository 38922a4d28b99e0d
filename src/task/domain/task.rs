//! Task aggregate root, lifecycle states, and transition guards.

use super::{AccountId, ParseTaskKindError, RewardAmount, TaskDomainError, TaskId, TransitionError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Rendering of an absent assignee.
pub const UNASSIGNED_LABEL: &str = "Unassigned";

/// Assignment mode of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskKind {
    /// The first applicant in the candidate queue gets the assignment.
    FirstComeFirstServe,
    /// The author picks an applicant from the candidate list.
    SelectedByAuthor,
}

impl TaskKind {
    /// Returns the ledger storage code.
    #[must_use]
    pub const fn as_code(self) -> &'static str {
        match self {
            Self::FirstComeFirstServe => "FCFS",
            Self::SelectedByAuthor => "SelectedByAuthor",
        }
    }

    /// Returns the human-readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::FirstComeFirstServe => "First Come First Serve",
            Self::SelectedByAuthor => "Selected By Author",
        }
    }
}

impl TryFrom<&str> for TaskKind {
    type Error = ParseTaskKindError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "FCFS" => Ok(Self::FirstComeFirstServe),
            "SelectedByAuthor" => Ok(Self::SelectedByAuthor),
            _ => Err(ParseTaskKindError(value.to_owned())),
        }
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_code())
    }
}

/// Task lifecycle state, derived from ledger fields.
///
/// A deleted task no longer appears in ledger listings, so `Deleted` is
/// never derived from a fetched record; it exists for the state machine and
/// for error reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    /// No assignee; candidates may apply.
    Open,
    /// Assignee set, result not yet rated.
    Assigned,
    /// Result rated and paid out.
    Completed,
    /// Removed from active listings.
    Deleted,
}

impl TaskState {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Assigned => "assigned",
            Self::Completed => "completed",
            Self::Deleted => "deleted",
        }
    }

    /// Returns `true` when no further transitions are possible.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Deleted)
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Lifecycle transitions a task can undergo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransitionKind {
    /// Join the candidate queue.
    Apply,
    /// Hand the task to a candidate.
    Assign,
    /// Release the current assignee.
    Unassign,
    /// Submit the work result.
    SubmitResult,
    /// Rate the assignee and close the task.
    Complete,
    /// Remove the task and reclaim the escrow.
    Delete,
}

impl TransitionKind {
    /// Returns the transition verb used in error messages and logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Apply => "apply for",
            Self::Assign => "assign",
            Self::Unassign => "unassign",
            Self::SubmitResult => "submit a result for",
            Self::Complete => "complete",
            Self::Delete => "delete",
        }
    }
}

impl fmt::Display for TransitionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Validated fields for creating a new task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDraft {
    title: String,
    description: String,
    kind: TaskKind,
    reward: RewardAmount,
}

impl TaskDraft {
    /// Creates a validated draft.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::EmptyTitle`] or
    /// [`TaskDomainError::EmptyDescription`] on blank text fields, and
    /// [`TaskDomainError::RewardBelowFloor`] when the reward would not cover
    /// the ledger's storage cost.
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        kind: TaskKind,
        reward: RewardAmount,
    ) -> Result<Self, TaskDomainError> {
        let title = title.into();
        let description = description.into();
        if title.trim().is_empty() {
            return Err(TaskDomainError::EmptyTitle);
        }
        if description.trim().is_empty() {
            return Err(TaskDomainError::EmptyDescription);
        }
        if !reward.covers_storage_floor() {
            return Err(TaskDomainError::RewardBelowFloor(reward.native()));
        }
        Ok(Self {
            title,
            description,
            kind,
            reward,
        })
    }

    /// Returns the task title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the task description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the assignment mode.
    #[must_use]
    pub const fn kind(&self) -> TaskKind {
        self.kind
    }

    /// Returns the reward, excluding the platform fee.
    #[must_use]
    pub const fn reward(&self) -> RewardAmount {
        self.reward
    }
}

/// Fields of a task as fetched and normalized from the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedTaskData {
    /// Ledger-assigned identifier.
    pub id: TaskId,
    /// Author-supplied title.
    pub title: String,
    /// Author-supplied description.
    pub description: String,
    /// Assignment mode.
    pub kind: TaskKind,
    /// Creator of the task.
    pub author: AccountId,
    /// Reward in native units, excluding the platform fee.
    pub reward: RewardAmount,
    /// Applicants in arrival order.
    pub candidates: Vec<AccountId>,
    /// Current assignee, if any.
    pub assignee: Option<AccountId>,
    /// Submitted result text, if any.
    pub result: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Completion timestamp, set exactly once.
    pub completed_at: Option<DateTime<Utc>>,
}

/// Task aggregate root.
///
/// Instances always mirror a ledger record; nothing mutates them locally.
/// State is derived, never stored: completed when `completed_at` is set,
/// assigned when an assignee is present, open otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    id: TaskId,
    title: String,
    description: String,
    kind: TaskKind,
    author: AccountId,
    reward: RewardAmount,
    candidates: Vec<AccountId>,
    assignee: Option<AccountId>,
    result: Option<String>,
    created_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

impl Task {
    /// Reconstructs a task from normalized ledger data.
    #[must_use]
    pub fn from_fetched(data: FetchedTaskData) -> Self {
        Self {
            id: data.id,
            title: data.title,
            description: data.description,
            kind: data.kind,
            author: data.author,
            reward: data.reward,
            candidates: data.candidates,
            assignee: data.assignee,
            result: data.result,
            created_at: data.created_at,
            completed_at: data.completed_at,
        }
    }

    /// Returns the task identifier.
    #[must_use]
    pub const fn id(&self) -> TaskId {
        self.id
    }

    /// Returns the task title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the task description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the assignment mode.
    #[must_use]
    pub const fn kind(&self) -> TaskKind {
        self.kind
    }

    /// Returns the task author.
    #[must_use]
    pub const fn author(&self) -> &AccountId {
        &self.author
    }

    /// Returns the reward, excluding the platform fee.
    #[must_use]
    pub const fn reward(&self) -> RewardAmount {
        self.reward
    }

    /// Returns the applicants in arrival order.
    #[must_use]
    pub fn candidates(&self) -> &[AccountId] {
        &self.candidates
    }

    /// Returns the current assignee, if any.
    #[must_use]
    pub const fn assignee(&self) -> Option<&AccountId> {
        self.assignee.as_ref()
    }

    /// Returns the assignee handle, or the unassigned sentinel.
    #[must_use]
    pub fn assignee_label(&self) -> &str {
        self.assignee
            .as_ref()
            .map_or(UNASSIGNED_LABEL, AccountId::as_str)
    }

    /// Returns the submitted result text, if any.
    #[must_use]
    pub fn result(&self) -> Option<&str> {
        self.result.as_deref()
    }

    /// Returns `true` when a non-empty result has been submitted.
    #[must_use]
    pub fn has_result(&self) -> bool {
        self.result.as_deref().is_some_and(|text| !text.is_empty())
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the completion timestamp, if completed.
    #[must_use]
    pub const fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    /// Returns the derived lifecycle state.
    #[must_use]
    pub const fn state(&self) -> TaskState {
        if self.completed_at.is_some() {
            TaskState::Completed
        } else if self.assignee.is_some() {
            TaskState::Assigned
        } else {
            TaskState::Open
        }
    }

    /// Checks that `actor` may join the candidate queue.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError`] unless the task is open, the actor is not
    /// the author, and the actor has not already applied.
    pub fn check_apply(&self, actor: &AccountId) -> Result<(), TransitionError> {
        self.require_state(TransitionKind::Apply, TaskState::Open, "task is not open")?;
        if actor == &self.author {
            return Err(self.permission_denied(
                TransitionKind::Apply,
                actor,
                "the author cannot apply for their own task",
            ));
        }
        if self.candidates.contains(actor) {
            return Err(self.permission_denied(
                TransitionKind::Apply,
                actor,
                "the account has already applied",
            ));
        }
        Ok(())
    }

    /// Resolves and checks the assignment target.
    ///
    /// In first-come-first-serve mode the only valid target is the first
    /// applicant, which is resolved automatically when `target` is omitted.
    /// In selected-by-author mode the author must name a candidate.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError`] when the actor is not the author, the
    /// task is not open, or the target violates the mode's selection rule.
    pub fn resolve_assignment(
        &self,
        actor: &AccountId,
        target: Option<&AccountId>,
    ) -> Result<AccountId, TransitionError> {
        self.require_author(TransitionKind::Assign, actor, "only the author may assign")?;
        self.require_state(TransitionKind::Assign, TaskState::Open, "task is not open")?;
        match self.kind {
            TaskKind::FirstComeFirstServe => {
                let first = self.candidates.first().ok_or_else(|| {
                    self.invalid_state(TransitionKind::Assign, "no candidate has applied yet")
                })?;
                if target.is_some_and(|requested| requested != first) {
                    return Err(self.invalid_state(
                        TransitionKind::Assign,
                        "only the first applicant may be assigned",
                    ));
                }
                Ok(first.clone())
            }
            TaskKind::SelectedByAuthor => {
                let requested = target.ok_or_else(|| {
                    self.invalid_state(TransitionKind::Assign, "a candidate must be named")
                })?;
                if !self.candidates.contains(requested) {
                    return Err(self.invalid_state(
                        TransitionKind::Assign,
                        "the named account has not applied",
                    ));
                }
                Ok(requested.clone())
            }
        }
    }

    /// Checks that `actor` may release the current assignee.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError`] unless the task is assigned and the actor
    /// is the author or the assignee.
    pub fn check_unassign(&self, actor: &AccountId) -> Result<(), TransitionError> {
        self.require_state(
            TransitionKind::Unassign,
            TaskState::Assigned,
            "task is not assigned",
        )?;
        let is_assignee = self.assignee.as_ref() == Some(actor);
        if actor != &self.author && !is_assignee {
            return Err(self.permission_denied(
                TransitionKind::Unassign,
                actor,
                "only the author or the assignee may unassign",
            ));
        }
        Ok(())
    }

    /// Checks that `actor` may submit `result_text`.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError`] unless the task is assigned to the actor,
    /// no result was submitted before, and the text is non-empty.
    pub fn check_submit_result(
        &self,
        actor: &AccountId,
        result_text: &str,
    ) -> Result<(), TransitionError> {
        self.require_state(
            TransitionKind::SubmitResult,
            TaskState::Assigned,
            "task is not assigned",
        )?;
        if self.assignee.as_ref() != Some(actor) {
            return Err(self.permission_denied(
                TransitionKind::SubmitResult,
                actor,
                "only the assignee may submit a result",
            ));
        }
        if self.result.is_some() {
            return Err(self.invalid_state(
                TransitionKind::SubmitResult,
                "a result has already been submitted",
            ));
        }
        if result_text.trim().is_empty() {
            return Err(
                self.invalid_state(TransitionKind::SubmitResult, "result text must not be empty")
            );
        }
        Ok(())
    }

    /// Checks that `actor` may rate the assignee and complete the task.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError`] unless the actor is the author, the task
    /// is assigned, and a non-empty result has been submitted.
    pub fn check_complete(&self, actor: &AccountId) -> Result<(), TransitionError> {
        self.require_author(TransitionKind::Complete, actor, "only the author may complete")?;
        self.require_state(
            TransitionKind::Complete,
            TaskState::Assigned,
            "task is not assigned",
        )?;
        if !self.has_result() {
            return Err(
                self.invalid_state(TransitionKind::Complete, "no result has been submitted")
            );
        }
        Ok(())
    }

    /// Checks that `actor` may delete the task.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError`] unless the actor is the author and the
    /// task has not completed.
    pub fn check_delete(&self, actor: &AccountId) -> Result<(), TransitionError> {
        self.require_author(TransitionKind::Delete, actor, "only the author may delete")?;
        if self.state() == TaskState::Completed {
            return Err(
                self.invalid_state(TransitionKind::Delete, "completed tasks cannot be deleted")
            );
        }
        Ok(())
    }

    fn require_author(
        &self,
        action: TransitionKind,
        actor: &AccountId,
        rule: &'static str,
    ) -> Result<(), TransitionError> {
        if actor == &self.author {
            Ok(())
        } else {
            Err(self.permission_denied(action, actor, rule))
        }
    }

    fn require_state(
        &self,
        action: TransitionKind,
        required: TaskState,
        rule: &'static str,
    ) -> Result<(), TransitionError> {
        if self.state() == required {
            Ok(())
        } else {
            Err(self.invalid_state(action, rule))
        }
    }

    fn permission_denied(
        &self,
        action: TransitionKind,
        actor: &AccountId,
        rule: &'static str,
    ) -> TransitionError {
        TransitionError::PermissionDenied {
            task_id: self.id,
            action,
            actor: actor.clone(),
            rule,
        }
    }

    fn invalid_state(&self, action: TransitionKind, rule: &'static str) -> TransitionError {
        TransitionError::InvalidState {
            task_id: self.id,
            action,
            state: self.state(),
            rule,
        }
    }
}
