//! Shared fixtures for task module tests.

use crate::task::domain::{
    AccountId, FetchedTaskData, RewardAmount, Task, TaskDraft, TaskId, TaskKind,
};
use chrono::DateTime;

/// Fixed creation instant used by task fixtures.
const CREATED_AT_NANOS: i64 = 1_700_000_000_000_000_000;

/// Fixed completion instant used by completed fixtures.
const COMPLETED_AT_NANOS: i64 = 1_700_000_600_000_000_000;

pub(super) fn account(handle: &str) -> AccountId {
    AccountId::new(handle).expect("valid account handle")
}

pub(super) fn reward() -> RewardAmount {
    RewardAmount::from_native(5 * RewardAmount::STORAGE_FLOOR.native())
}

pub(super) fn draft(kind: TaskKind) -> TaskDraft {
    TaskDraft::new("Design a logo", "Vector formats preferred", kind, reward())
        .expect("valid draft")
}

/// Builder for task fixtures in arbitrary lifecycle states.
pub(super) struct TaskBuilder {
    data: FetchedTaskData,
}

impl TaskBuilder {
    pub(super) fn new(id: u64, kind: TaskKind, author: &str) -> Self {
        Self {
            data: FetchedTaskData {
                id: TaskId::new(id),
                title: "Design a logo".to_owned(),
                description: "Vector formats preferred".to_owned(),
                kind,
                author: account(author),
                reward: reward(),
                candidates: Vec::new(),
                assignee: None,
                result: None,
                created_at: DateTime::from_timestamp_nanos(CREATED_AT_NANOS),
                completed_at: None,
            },
        }
    }

    pub(super) fn candidates(mut self, handles: &[&str]) -> Self {
        self.data.candidates = handles.iter().map(|handle| account(handle)).collect();
        self
    }

    pub(super) fn assignee(mut self, handle: &str) -> Self {
        self.data.assignee = Some(account(handle));
        self
    }

    pub(super) fn result(mut self, text: &str) -> Self {
        self.data.result = Some(text.to_owned());
        self
    }

    pub(super) fn completed(mut self) -> Self {
        self.data.completed_at = Some(DateTime::from_timestamp_nanos(COMPLETED_AT_NANOS));
        self
    }

    pub(super) fn build(self) -> Task {
        Task::from_fetched(self.data)
    }
}
