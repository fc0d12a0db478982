//! Core task data types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of items a task must collect before it becomes eligible for processing.
pub const MAX_ITEMS_PER_TASK: usize = 3;

/// Lifecycle state of a task.
///
/// ```text
/// new --(3rd item added)--> pending --(claimed)--> processing --> done | error
/// ```
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Created, still collecting items.
    New,
    /// Holds all its items and is waiting for the processor.
    Pending,
    /// Claimed by a processor worker.
    Processing,
    /// Archive produced (terminal).
    Done,
    /// Nothing could be archived (terminal).
    Error,
}

impl TaskStatus {
    /// Returns true if no further transitions are possible.
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Done | TaskStatus::Error)
    }

    /// Returns true if items may still be appended in this state.
    pub fn accepts_items(&self) -> bool {
        matches!(self, TaskStatus::New | TaskStatus::Pending)
    }

    /// Returns true if `next` is a legal forward step from this state.
    pub fn can_transition_to(&self, next: TaskStatus) -> bool {
        matches!(
            (self, next),
            (TaskStatus::New, TaskStatus::Pending)
                | (TaskStatus::Pending, TaskStatus::Processing)
                | (TaskStatus::Processing, TaskStatus::Done)
                | (TaskStatus::Processing, TaskStatus::Error)
        )
    }

    /// Returns the status as a string (for logs and metric labels).
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::New => "new",
            TaskStatus::Pending => "pending",
            TaskStatus::Processing => "processing",
            TaskStatus::Done => "done",
            TaskStatus::Error => "error",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Download outcome of a single item.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    Pending,
    Ok,
    Error,
}

/// One requested remote file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Item {
    /// Source URL, validated by the caller before it reaches the store.
    pub url: String,
    pub status: ItemStatus,
    /// Failure description, only set when `status` is `Error`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub err_msg: Option<String>,
}

impl Item {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            status: ItemStatus::Pending,
            err_msg: None,
        }
    }

    /// Marks the item as downloaded.
    pub fn mark_ok(&mut self) {
        self.status = ItemStatus::Ok;
        self.err_msg = None;
    }

    /// Marks the item as failed with the given reason.
    pub fn mark_error(&mut self, reason: impl Into<String>) {
        self.status = ItemStatus::Error;
        self.err_msg = Some(reason.into());
    }
}

/// One archive job.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Task {
    pub id: String,
    pub status: TaskStatus,
    /// Items in insertion order. Position determines the archive member name.
    pub items: Vec<Item>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Archive location, only set once the task is `Done`.
    #[serde(rename = "result", default, skip_serializing_if = "Option::is_none")]
    pub result_path: Option<String>,
    /// Task-level failure, only set once the task is `Error`.
    #[serde(rename = "error", default, skip_serializing_if = "Option::is_none")]
    pub err_msg: Option<String>,
}

impl Task {
    /// Creates an empty task with a fresh identifier.
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            id: new_task_id(),
            status: TaskStatus::New,
            items: Vec::new(),
            created_at: now,
            updated_at: now,
            result_path: None,
            err_msg: None,
        }
    }

    /// Returns true once the task holds its full set of items.
    pub fn is_full(&self) -> bool {
        self.items.len() >= MAX_ITEMS_PER_TASK
    }

    /// Number of items that were downloaded successfully.
    pub fn ok_items(&self) -> usize {
        self.items
            .iter()
            .filter(|i| i.status == ItemStatus::Ok)
            .count()
    }

    /// Finalizes the task as done with the given archive location.
    pub fn finish(&mut self, result_path: impl Into<String>) {
        self.status = TaskStatus::Done;
        self.result_path = Some(result_path.into());
        self.err_msg = None;
    }

    /// Finalizes the task as failed.
    pub fn fail(&mut self, reason: impl Into<String>) {
        self.status = TaskStatus::Error;
        self.err_msg = Some(reason.into());
        self.result_path = None;
    }
}

impl Default for Task {
    fn default() -> Self {
        Self::new()
    }
}

/// 128 random bits rendered as 32 lowercase hex characters.
fn new_task_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}
