//! Task system: archive jobs and the store that owns their state.

mod memory_store;
mod store;
mod types;

pub use memory_store::MemoryTaskStore;
pub use store::{TaskError, TaskStore};
pub use types::{Item, ItemStatus, Task, TaskStatus, MAX_ITEMS_PER_TASK};
