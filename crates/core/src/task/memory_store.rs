//! In-memory implementation of `TaskStore`.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::Utc;
use tracing::debug;

use super::store::{TaskError, TaskStore};
use super::types::{Item, Task, TaskStatus};

/// Process-local task store guarded by a single reader-writer lock.
///
/// Reads share the lock; `add_item` and `update` hold the write lock for the
/// whole check-and-mutate step.
#[derive(Debug, Default)]
pub struct MemoryTaskStore {
    tasks: RwLock<HashMap<String, Task>>,
}

impl MemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    // A panic inside a mutator must not take the whole store down with it.
    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, Task>> {
        self.tasks.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, Task>> {
        self.tasks.write().unwrap_or_else(|e| e.into_inner())
    }
}

impl TaskStore for MemoryTaskStore {
    fn create(&self) -> Task {
        let task = Task::new();
        self.write().insert(task.id.clone(), task.clone());
        debug!(task_id = %task.id, "Task created");
        task
    }

    fn get(&self, id: &str) -> Result<Task, TaskError> {
        self.read()
            .get(id)
            .cloned()
            .ok_or_else(|| TaskError::NotFound(id.to_string()))
    }

    fn add_item(&self, id: &str, url: &str) -> Result<bool, TaskError> {
        let mut tasks = self.write();
        let task = tasks
            .get_mut(id)
            .ok_or_else(|| TaskError::NotFound(id.to_string()))?;

        if task.is_full() {
            return Err(TaskError::TooManyItems(id.to_string()));
        }
        if !task.status.accepts_items() {
            return Err(TaskError::TaskFinalized {
                task_id: id.to_string(),
                status: task.status,
            });
        }

        task.items.push(Item::new(url));

        let ready = task.is_full();
        if ready {
            task.status = TaskStatus::Pending;
        }
        task.updated_at = Utc::now();

        debug!(task_id = %id, items = task.items.len(), ready, "Item added");
        Ok(ready)
    }

    fn update(&self, id: &str, mutate: &mut dyn FnMut(&mut Task)) -> Result<Task, TaskError> {
        let mut tasks = self.write();
        let task = tasks
            .get_mut(id)
            .ok_or_else(|| TaskError::NotFound(id.to_string()))?;

        mutate(task);
        task.updated_at = Utc::now();
        Ok(task.clone())
    }

    fn active_count(&self) -> usize {
        self.read()
            .values()
            .filter(|t| !t.status.is_terminal())
            .count()
    }

    fn list_by_status(&self, status: TaskStatus) -> Vec<Task> {
        self.read()
            .values()
            .filter(|t| t.status == status)
            .cloned()
            .collect()
    }
}
