//! Per-viewer projection of the single available task action.

use super::{AccountId, Task, TaskState};

/// The single action a viewer may take on a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AvailableAction {
    /// Join the candidate queue.
    Apply,
    /// Hand the task to a candidate.
    Assign,
    /// Submit the work result.
    SubmitResult,
    /// Rate the assignee and close the task.
    RateAndComplete,
    /// Remove the task and reclaim the escrow.
    Delete,
}

/// Derives the action available to `viewer`, if any.
///
/// Pure function of its inputs. The decision order is significant and
/// mirrors the role precedence of the marketplace: the author check comes
/// first, so an author who somehow appears among the candidates or as the
/// assignee of their own task still sees author controls; a task claimed by
/// someone else offers nothing; the assignee and candidate checks follow;
/// everyone else is offered to apply while the task is open. Viewers with
/// no connected identity are offered nothing.
#[must_use]
pub fn available_action(task: &Task, viewer: Option<&AccountId>) -> Option<AvailableAction> {
    let current = viewer?;
    if current == task.author() {
        return author_action(task);
    }
    if let Some(assignee) = task.assignee() {
        if assignee != current {
            return None;
        }
        return assignee_action(task);
    }
    if task.candidates().contains(current) {
        // Applied already; the ledger offers no withdrawal.
        return None;
    }
    (task.state() == TaskState::Open).then_some(AvailableAction::Apply)
}

fn author_action(task: &Task) -> Option<AvailableAction> {
    match task.state() {
        TaskState::Assigned if task.has_result() => Some(AvailableAction::RateAndComplete),
        TaskState::Open if !task.candidates().is_empty() => Some(AvailableAction::Assign),
        TaskState::Open | TaskState::Assigned => Some(AvailableAction::Delete),
        TaskState::Completed | TaskState::Deleted => None,
    }
}

fn assignee_action(task: &Task) -> Option<AvailableAction> {
    if task.has_result() {
        // Result submitted; the rating is the author's move.
        None
    } else {
        Some(AvailableAction::SubmitResult)
    }
}
