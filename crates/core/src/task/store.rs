//! Task storage trait and errors.

use crate::task::{Task, TaskStatus, MAX_ITEMS_PER_TASK};

/// Error type for task operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TaskError {
    /// Task not found.
    #[error("task not found: {0}")]
    NotFound(String),

    /// Task already holds the maximum number of items.
    #[error("task {0} already has {MAX_ITEMS_PER_TASK} items")]
    TooManyItems(String),

    /// Task has left the states in which items can be added.
    #[error("task {task_id} is finalized and cannot be modified (status: {status})")]
    TaskFinalized { task_id: String, status: TaskStatus },
}

/// Trait for task storage backends.
///
/// Implementations are the single owner of task state. Callers only ever
/// receive owned snapshots; every mutation goes through `add_item` or `update`
/// and is atomic with respect to every other mutation.
pub trait TaskStore: Send + Sync {
    /// Create a new empty task.
    fn create(&self) -> Task;

    /// Get a snapshot of a task by ID.
    fn get(&self, id: &str) -> Result<Task, TaskError>;

    /// Append an item to a task.
    ///
    /// Returns `true` exactly once per task: on the call that stores the
    /// last allowed item and moves the task to `Pending`.
    fn add_item(&self, id: &str, url: &str) -> Result<bool, TaskError>;

    /// Apply a mutation to a task while holding exclusive access.
    ///
    /// `updated_at` is refreshed afterwards. Returns the resulting snapshot.
    fn update(&self, id: &str, mutate: &mut dyn FnMut(&mut Task)) -> Result<Task, TaskError>;

    /// Number of tasks that have not reached a terminal state.
    fn active_count(&self) -> usize;

    /// Snapshots of every task currently in `status`.
    fn list_by_status(&self, status: TaskStatus) -> Vec<Task>;
}
