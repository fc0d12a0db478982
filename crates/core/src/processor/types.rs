//! Types for the processor module.

use serde::{Deserialize, Serialize};

/// Snapshot of the processor's admission state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessorStatus {
    /// Whether the dispatcher is running.
    pub running: bool,
    /// Workers that claimed a task and are still downloading or archiving it.
    pub active_workers: usize,
    /// Concurrency ceiling.
    pub max_concurrent: usize,
    /// Task IDs waiting in the dispatch queue.
    pub queued_tasks: usize,
    /// Dispatch queue capacity.
    pub queue_capacity: usize,
    /// Tasks finalized as done since startup.
    pub total_processed: u64,
    /// Tasks finalized as error since startup.
    pub total_failed: u64,
}
