//! Wire schema for ledger task records and normalization into the domain.
//!
//! The ledger serializes tasks with string-coded task types, base-10 reward
//! strings, and nanosecond integer timestamps. [`TaskRecord`] pins that
//! shape down explicitly; anything that does not fit fails fast with a
//! tagged [`RecordError`] instead of surfacing half-populated tasks.

use super::{AccountId, FetchedTaskData, RewardAmount, Task, TaskDomainError, TaskId, TaskKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Raw task record as serialized by the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRecord {
    /// Ledger-assigned task identifier.
    pub id: u64,
    /// Author-supplied title.
    pub title: String,
    /// Author-supplied description.
    pub description: String,
    /// Assignment-mode storage code (`"FCFS"` or `"SelectedByAuthor"`).
    pub task_type: String,
    /// Author account handle.
    pub author: String,
    /// Assignee account handle, absent while unassigned.
    pub assignee: Option<String>,
    /// Applicant account handles in arrival order.
    pub candidates: Vec<String>,
    /// Creation time, nanoseconds since the epoch.
    pub created_at: u64,
    /// Completion time, nanoseconds since the epoch, absent until completed.
    pub completed_at: Option<u64>,
    /// Reward in native units, base-10 encoded.
    pub reward: String,
    /// Submitted result text, absent until submission.
    pub result: Option<String>,
}

/// Errors raised when a ledger record does not match the expected schema.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RecordError {
    /// The payload could not be decoded into the record shape at all.
    #[error("malformed ledger payload: {0}")]
    Malformed(String),

    /// The task-type code is not part of the enumeration.
    #[error("task {id}: unknown task type code '{code}'")]
    UnknownTaskKind {
        /// Record identifier.
        id: u64,
        /// Offending code.
        code: String,
    },

    /// An account field does not hold a valid handle.
    #[error("task {id}: invalid {field} account '{value}'")]
    InvalidAccount {
        /// Record identifier.
        id: u64,
        /// Field the handle came from.
        field: &'static str,
        /// Offending value.
        value: String,
    },

    /// The reward field is not a base-10 native-unit amount.
    #[error("task {id}: unparseable reward '{value}'")]
    InvalidReward {
        /// Record identifier.
        id: u64,
        /// Offending value.
        value: String,
    },

    /// A timestamp does not fit the supported range.
    #[error("task {id}: timestamp {value} out of range")]
    TimestampOutOfRange {
        /// Record identifier.
        id: u64,
        /// Offending value.
        value: u64,
    },
}

impl TaskRecord {
    /// Normalizes the raw record into the canonical task shape.
    ///
    /// Normalization is total over schema-valid records and idempotent:
    /// a record produced from an already-normalized task maps back to the
    /// same task.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError`] on an unknown task-type code, an invalid
    /// account handle, an unparseable reward, or an out-of-range timestamp.
    pub fn normalize(&self) -> Result<Task, RecordError> {
        let kind =
            TaskKind::try_from(self.task_type.as_str()).map_err(|_| RecordError::UnknownTaskKind {
                id: self.id,
                code: self.task_type.clone(),
            })?;
        let author = self.account(&self.author, "author")?;
        let assignee = self
            .assignee
            .as_ref()
            .map(|value| self.account(value, "assignee"))
            .transpose()?;
        let candidates = self
            .candidates
            .iter()
            .map(|value| self.account(value, "candidate"))
            .collect::<Result<Vec<_>, _>>()?;
        let reward = self
            .reward
            .parse::<u128>()
            .map(RewardAmount::from_native)
            .map_err(|_| RecordError::InvalidReward {
                id: self.id,
                value: self.reward.clone(),
            })?;
        let created_at = self.timestamp(self.created_at)?;
        let completed_at = self
            .completed_at
            .map(|nanos| self.timestamp(nanos))
            .transpose()?;

        Ok(Task::from_fetched(FetchedTaskData {
            id: TaskId::new(self.id),
            title: self.title.clone(),
            description: self.description.clone(),
            kind,
            author,
            reward,
            candidates,
            assignee,
            result: self.result.clone(),
            created_at,
            completed_at,
        }))
    }

    fn account(&self, value: &str, field: &'static str) -> Result<AccountId, RecordError> {
        AccountId::new(value).map_err(|err| match err {
            TaskDomainError::InvalidAccountId(raw) => RecordError::InvalidAccount {
                id: self.id,
                field,
                value: raw,
            },
            _ => RecordError::Malformed(err.to_string()),
        })
    }

    fn timestamp(&self, nanos: u64) -> Result<DateTime<Utc>, RecordError> {
        let signed = i64::try_from(nanos).map_err(|_| RecordError::TimestampOutOfRange {
            id: self.id,
            value: nanos,
        })?;
        Ok(DateTime::from_timestamp_nanos(signed))
    }
}

impl From<&Task> for TaskRecord {
    fn from(task: &Task) -> Self {
        Self {
            id: task.id().value(),
            title: task.title().to_owned(),
            description: task.description().to_owned(),
            task_type: task.kind().as_code().to_owned(),
            author: task.author().as_str().to_owned(),
            assignee: task.assignee().map(|account| account.as_str().to_owned()),
            candidates: task
                .candidates()
                .iter()
                .map(|account| account.as_str().to_owned())
                .collect(),
            created_at: nanos_since_epoch(task.created_at()),
            completed_at: task.completed_at().map(nanos_since_epoch),
            reward: task.reward().native().to_string(),
            result: task.result().map(str::to_owned),
        }
    }
}

/// Converts a timestamp back to ledger nanoseconds, clamping at the epoch.
fn nanos_since_epoch(timestamp: DateTime<Utc>) -> u64 {
    timestamp
        .timestamp_nanos_opt()
        .and_then(|nanos| u64::try_from(nanos).ok())
        .unwrap_or_default()
}
