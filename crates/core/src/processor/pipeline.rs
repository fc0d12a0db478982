//! Archive processor implementation.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use tokio::sync::{broadcast, mpsc, Semaphore};
use tracing::{debug, error, info, warn};

use crate::metrics::{
    ITEMS_DOWNLOADED, TASKS_FINISHED, TASKS_REQUEUED, TASK_DURATION, WORKERS_ACTIVE,
};
use crate::task::{TaskStatus, TaskStore};

use super::archive::{member_name, write_archive, ArchiveMember};
use super::config::ProcessorConfig;
use super::fetcher::Fetcher;
use super::queue::DispatchQueue;
use super::types::ProcessorStatus;

/// Task-level error recorded when every item failed to download.
pub const NO_FILES_TO_ARCHIVE: &str = "no files to archive";

/// Tracks statistics for the worker pool.
#[derive(Default)]
struct PoolStats {
    active: AtomicU64,
    total_processed: AtomicU64,
    total_failed: AtomicU64,
}

/// Counts a worker as active for as long as it is alive.
struct ActiveGuard(Arc<PoolStats>);

impl ActiveGuard {
    fn new(stats: Arc<PoolStats>) -> Self {
        stats.active.fetch_add(1, Ordering::Relaxed);
        WORKERS_ACTIVE.inc();
        Self(stats)
    }
}

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        self.0.active.fetch_sub(1, Ordering::Relaxed);
        WORKERS_ACTIVE.dec();
    }
}

/// Per-task processing logic, shared by every spawned worker.
#[derive(Clone)]
struct Worker {
    store: Arc<dyn TaskStore>,
    fetcher: Arc<dyn Fetcher>,
    temp_dir: PathBuf,
    stats: Arc<PoolStats>,
}

impl Worker {
    async fn handle(&self, task_id: &str) {
        // Only a pending task may be claimed; anything else is a duplicate
        // delivery or a task that vanished.
        let mut claimed = false;
        let task = match self.store.update(task_id, &mut |t| {
            if t.status.can_transition_to(TaskStatus::Processing) {
                t.status = TaskStatus::Processing;
                claimed = true;
            }
        }) {
            Ok(task) => task,
            Err(e) => {
                debug!(task_id, error = %e, "Task disappeared before processing");
                return;
            }
        };

        if !claimed {
            debug!(task_id, status = %task.status, "Task not pending, skipping");
            return;
        }

        let _active = ActiveGuard::new(Arc::clone(&self.stats));
        let started = Instant::now();
        info!(task_id, items = task.items.len(), "Processing task");

        let work_dir = self.temp_dir.join(task_id);
        if let Err(e) = tokio::fs::create_dir_all(&work_dir).await {
            warn!(task_id, error = %e, "Failed to create working directory {:?}", work_dir);
        }

        let mut members = Vec::new();
        for (index, item) in task.items.iter().enumerate() {
            let name = member_name(index, &item.url);
            let dest = work_dir.join(&name);

            let outcome = self.fetcher.fetch(&item.url, &dest).await;
            match &outcome {
                Ok(bytes) => {
                    ITEMS_DOWNLOADED.with_label_values(&["ok"]).inc();
                    debug!(task_id, index, bytes, "Item downloaded");
                    members.push(ArchiveMember { name, path: dest });
                }
                Err(e) => {
                    ITEMS_DOWNLOADED.with_label_values(&["error"]).inc();
                    warn!(task_id, index, url = %item.url, error = %e, "Item download failed");
                }
            }

            let recorded = self.store.update(task_id, &mut |t| {
                if let Some(slot) = t.items.get_mut(index) {
                    match &outcome {
                        Ok(_) => slot.mark_ok(),
                        Err(e) => slot.mark_error(e.to_string()),
                    }
                }
            });
            if let Err(e) = recorded {
                debug!(
                    task_id,
                    index,
                    error = %e,
                    "Task disappeared while recording item outcome"
                );
            }
        }

        let outcome = if members.is_empty() {
            Err(NO_FILES_TO_ARCHIVE.to_string())
        } else {
            let zip_path = work_dir.join(format!("{}.zip", task_id));
            let target = zip_path.clone();
            match tokio::task::spawn_blocking(move || write_archive(&target, &members)).await {
                Ok(Ok(size)) => {
                    debug!(task_id, size, "Archive written");
                    Ok(zip_path.to_string_lossy().to_string())
                }
                Ok(Err(e)) => Err(e.to_string()),
                Err(e) => Err(format!("archive assembly aborted: {}", e)),
            }
        };

        self.finalize(task_id, outcome, started.elapsed());
    }

    fn finalize(&self, task_id: &str, outcome: Result<String, String>, elapsed: Duration) {
        let final_status = match &outcome {
            Ok(_) => TaskStatus::Done,
            Err(_) => TaskStatus::Error,
        };

        let result = self.store.update(task_id, &mut |t| {
            if !t.status.can_transition_to(final_status) {
                return;
            }
            match &outcome {
                Ok(path) => t.finish(path.clone()),
                Err(reason) => t.fail(reason.clone()),
            }
        });
        if let Err(e) = result {
            debug!(task_id, error = %e, "Task disappeared before finalizing");
        }

        TASKS_FINISHED
            .with_label_values(&[final_status.as_str()])
            .inc();
        TASK_DURATION
            .with_label_values(&[final_status.as_str()])
            .observe(elapsed.as_secs_f64());

        match outcome {
            Ok(path) => {
                self.stats.total_processed.fetch_add(1, Ordering::Relaxed);
                info!(task_id, result = %path, "Task done");
            }
            Err(reason) => {
                self.stats.total_failed.fetch_add(1, Ordering::Relaxed);
                warn!(task_id, error = %reason, "Task failed");
            }
        }
    }
}

/// Turns ready tasks into zip archives under a global concurrency ceiling.
///
/// A single dispatcher pulls task IDs from the [`DispatchQueue`], waits for a
/// semaphore permit, and spawns a worker that owns the permit until it
/// finishes. All task writes go through the [`TaskStore`].
pub struct ArchiveProcessor {
    config: ProcessorConfig,
    queue: Arc<DispatchQueue>,
    semaphore: Arc<Semaphore>,
    worker: Worker,
    running: Arc<AtomicBool>,
    shutdown_tx: broadcast::Sender<()>,
}

impl ArchiveProcessor {
    /// Creates a new processor. Nothing runs until [`start`](Self::start).
    pub fn new(
        config: ProcessorConfig,
        store: Arc<dyn TaskStore>,
        fetcher: impl Fetcher + 'static,
    ) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        let worker = Worker {
            store,
            fetcher: Arc::new(fetcher),
            temp_dir: config.temp_dir.clone(),
            stats: Arc::new(PoolStats::default()),
        };

        Self {
            queue: Arc::new(DispatchQueue::new(config.queue_capacity)),
            semaphore: Arc::new(Semaphore::new(config.max_concurrent)),
            worker,
            running: Arc::new(AtomicBool::new(false)),
            shutdown_tx,
            config,
        }
    }

    /// Starts the dispatcher (and the stuck-task scan, if configured).
    ///
    /// Only the first call has an effect. A processor that has been stopped
    /// cannot be started again.
    pub fn start(&self) {
        if self.running.swap(true, Ordering::SeqCst) {
            warn!("Archive processor already running");
            return;
        }

        let Some(rx) = self.queue.take_receiver() else {
            error!("Dispatch queue receiver already consumed, processor cannot restart");
            self.running.store(false, Ordering::SeqCst);
            return;
        };

        self.spawn_dispatcher(rx);

        if let Some(stuck_after) = self.config.requeue_stuck_after_secs {
            self.spawn_requeue_loop(
                Duration::from_secs(stuck_after),
                Duration::from_secs(self.config.requeue_scan_interval_secs.max(1)),
            );
        }

        info!(
            fetcher = self.worker.fetcher.name(),
            max_concurrent = self.config.max_concurrent,
            queue_capacity = self.queue.capacity(),
            "Archive processor started"
        );
    }

    /// Stops taking new task IDs. Tasks already being processed run to completion.
    ///
    /// Stopping is final: the dispatcher releases the queue for good.
    pub fn stop(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            warn!("Archive processor not running");
            return;
        }
        let _ = self.shutdown_tx.send(());
        info!("Archive processor stopped");
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    /// Queues a ready task without blocking. Returns false if it was dropped.
    pub fn enqueue(&self, task_id: &str) -> bool {
        self.queue.enqueue(task_id)
    }

    /// Processes one task inline, bypassing the queue and the semaphore.
    pub async fn handle(&self, task_id: &str) {
        self.worker.handle(task_id).await;
    }

    /// Re-enqueues pending tasks that have not changed for `stuck_after`.
    ///
    /// Returns how many were accepted by the queue.
    pub fn requeue_stuck(&self, stuck_after: Duration) -> usize {
        requeue_stuck(self.worker.store.as_ref(), &self.queue, stuck_after)
    }

    /// Returns the current processor status.
    pub fn status(&self) -> ProcessorStatus {
        let stats = &self.worker.stats;
        ProcessorStatus {
            running: self.is_running(),
            active_workers: stats.active.load(Ordering::Relaxed) as usize,
            max_concurrent: self.config.max_concurrent,
            queued_tasks: self.queue.len(),
            queue_capacity: self.queue.capacity(),
            total_processed: stats.total_processed.load(Ordering::Relaxed),
            total_failed: stats.total_failed.load(Ordering::Relaxed),
        }
    }

    fn spawn_dispatcher(&self, mut rx: mpsc::Receiver<String>) {
        let worker = self.worker.clone();
        let semaphore = Arc::clone(&self.semaphore);
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        tokio::spawn(async move {
            info!("Dispatcher started");
            loop {
                let task_id = tokio::select! {
                    _ = shutdown_rx.recv() => break,
                    next = rx.recv() => match next {
                        Some(id) => id,
                        None => break,
                    },
                };

                let permit = tokio::select! {
                    _ = shutdown_rx.recv() => break,
                    permit = Arc::clone(&semaphore).acquire_owned() => match permit {
                        Ok(permit) => permit,
                        Err(_) => break,
                    },
                };

                let worker = worker.clone();
                tokio::spawn(async move {
                    // Released on every exit path, including panics.
                    let _permit = permit;
                    worker.handle(&task_id).await;
                });
            }
            info!("Dispatcher stopped");
        });
    }

    fn spawn_requeue_loop(&self, stuck_after: Duration, interval: Duration) {
        let store = Arc::clone(&self.worker.store);
        let queue = Arc::clone(&self.queue);
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        tokio::spawn(async move {
            info!(?stuck_after, ?interval, "Stuck-task scan started");
            loop {
                tokio::select! {
                    _ = shutdown_rx.recv() => break,
                    _ = tokio::time::sleep(interval) => {
                        requeue_stuck(store.as_ref(), &queue, stuck_after);
                    }
                }
            }
        });
    }
}

fn requeue_stuck(store: &dyn TaskStore, queue: &DispatchQueue, stuck_after: Duration) -> usize {
    let now = Utc::now();
    let mut requeued = 0;

    for task in store.list_by_status(TaskStatus::Pending) {
        let stuck = (now - task.updated_at)
            .to_std()
            .map(|age| age >= stuck_after)
            .unwrap_or(false);
        if !stuck {
            continue;
        }
        if queue.enqueue(&task.id) {
            TASKS_REQUEUED.inc();
            requeued += 1;
            info!(task_id = %task.id, "Re-enqueued stuck pending task");
        }
    }

    requeued
}
