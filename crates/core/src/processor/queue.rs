//! Bounded, drop-on-full queue of ready task IDs.

use std::sync::Mutex;

use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, warn};

use crate::metrics::{ENQUEUE_DROPPED, TASKS_ENQUEUED};

/// In-memory FIFO of task IDs feeding the processor's dispatcher.
///
/// Pushing never blocks. When the queue is full the ID is dropped and the
/// task stays in `pending`; nothing re-delivers it unless the stuck-task
/// re-scan is enabled.
pub struct DispatchQueue {
    tx: mpsc::Sender<String>,
    rx: Mutex<Option<mpsc::Receiver<String>>>,
    capacity: usize,
}

impl DispatchQueue {
    /// Creates a queue holding at most `capacity` IDs (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (tx, rx) = mpsc::channel(capacity);
        Self {
            tx,
            rx: Mutex::new(Some(rx)),
            capacity,
        }
    }

    /// Pushes a task ID without waiting. Returns false if it was dropped.
    pub fn enqueue(&self, task_id: &str) -> bool {
        match self.tx.try_send(task_id.to_string()) {
            Ok(()) => {
                TASKS_ENQUEUED.inc();
                debug!(task_id, "Task enqueued");
                true
            }
            Err(TrySendError::Full(_)) => {
                ENQUEUE_DROPPED.inc();
                warn!(
                    task_id,
                    capacity = self.capacity,
                    "Dispatch queue full, task stays pending"
                );
                false
            }
            Err(TrySendError::Closed(_)) => {
                ENQUEUE_DROPPED.inc();
                warn!(task_id, "Dispatch queue closed, task stays pending");
                false
            }
        }
    }

    /// Number of IDs currently waiting.
    pub fn len(&self) -> usize {
        self.capacity - self.tx.capacity()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Hands the receiving end to the dispatcher. Only the first call gets it.
    pub(crate) fn take_receiver(&self) -> Option<mpsc::Receiver<String>> {
        self.rx.lock().unwrap_or_else(|e| e.into_inner()).take()
    }
}
