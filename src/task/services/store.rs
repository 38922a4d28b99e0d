//! Last-write-wins cache of ledger task state.

use crate::task::domain::{Task, TaskId};
use parking_lot::RwLock;
use std::sync::Arc;

/// Shared cache of the last-known task list and the focused task.
///
/// Only the lifecycle service writes here, and only after the ledger has
/// confirmed a transition or served a read; projection and presentation
/// code take snapshots and never mutate. Racing refreshes resolve
/// last-write-wins, which is sound because the ledger is authoritative and
/// repeated reads are idempotent.
#[derive(Debug, Clone, Default)]
pub struct TaskCache {
    inner: Arc<RwLock<CacheState>>,
}

#[derive(Debug, Default)]
struct CacheState {
    all_tasks: Vec<Task>,
    focused: Option<Task>,
}

impl TaskCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached task list in ledger order, newest last.
    #[must_use]
    pub fn all_tasks(&self) -> Vec<Task> {
        self.inner.read().all_tasks.clone()
    }

    /// Returns the cached focused task.
    #[must_use]
    pub fn focused_task(&self) -> Option<Task> {
        self.inner.read().focused.clone()
    }

    /// Looks up a task by id, preferring the focused slot.
    #[must_use]
    pub fn task(&self, id: TaskId) -> Option<Task> {
        let state = self.inner.read();
        state
            .focused
            .as_ref()
            .filter(|task| task.id() == id)
            .or_else(|| state.all_tasks.iter().find(|task| task.id() == id))
            .cloned()
    }

    /// Replaces the cached task list with a fresh ledger listing.
    pub(crate) fn replace_all(&self, tasks: Vec<Task>) {
        self.inner.write().all_tasks = tasks;
    }

    /// Replaces the focused task.
    pub(crate) fn focus(&self, task: Task) {
        self.inner.write().focused = Some(task);
    }

    /// Overwrites a refetched task wherever the cache holds it: its list
    /// entry, and the focused slot when it is the focused task.
    pub(crate) fn upsert(&self, task: &Task) {
        let mut state = self.inner.write();
        if let Some(entry) = state
            .all_tasks
            .iter_mut()
            .find(|entry| entry.id() == task.id())
        {
            *entry = task.clone();
        }
        if state
            .focused
            .as_ref()
            .is_some_and(|focused| focused.id() == task.id())
        {
            state.focused = Some(task.clone());
        }
    }

    /// Drops a task from the list and clears a matching focused slot.
    pub(crate) fn remove(&self, id: TaskId) {
        let mut state = self.inner.write();
        state.all_tasks.retain(|task| task.id() != id);
        if state.focused.as_ref().is_some_and(|task| task.id() == id) {
            state.focused = None;
        }
    }
}
