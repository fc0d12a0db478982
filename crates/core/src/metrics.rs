//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Dispatch queue (enqueues, drops, re-scans)
//! - Processor (active workers, item downloads, task outcomes)

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts};

// =============================================================================
// Dispatch Queue Metrics
// =============================================================================

/// Task IDs accepted by the dispatch queue.
pub static TASKS_ENQUEUED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "archiver_tasks_enqueued_total",
        "Total task IDs accepted by the dispatch queue",
    )
    .unwrap()
});

/// Task IDs dropped because the dispatch queue was full or closed.
pub static ENQUEUE_DROPPED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "archiver_enqueue_dropped_total",
        "Total task IDs dropped by the dispatch queue",
    )
    .unwrap()
});

/// Pending tasks re-enqueued by the stuck-task scan.
pub static TASKS_REQUEUED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "archiver_tasks_requeued_total",
        "Total stuck pending tasks re-enqueued",
    )
    .unwrap()
});

// =============================================================================
// Processor Metrics
// =============================================================================

/// Workers currently holding a concurrency permit.
pub static WORKERS_ACTIVE: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "archiver_workers_active",
        "Number of tasks currently being downloaded or archived",
    )
    .unwrap()
});

/// Item downloads by result.
pub static ITEMS_DOWNLOADED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("archiver_items_downloaded_total", "Total item downloads"),
        &["result"], // "ok", "error"
    )
    .unwrap()
});

/// Tasks finalized by the processor, by final status.
pub static TASKS_FINISHED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("archiver_tasks_finished_total", "Total tasks finalized"),
        &["status"], // "done", "error"
    )
    .unwrap()
});

/// Time from claim to final status.
pub static TASK_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "archiver_task_duration_seconds",
            "Duration of task processing",
        )
        .buckets(vec![0.1, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 120.0]),
        &["status"],
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(TASKS_ENQUEUED.clone()),
        Box::new(ENQUEUE_DROPPED.clone()),
        Box::new(TASKS_REQUEUED.clone()),
        Box::new(WORKERS_ACTIVE.clone()),
        Box::new(ITEMS_DOWNLOADED.clone()),
        Box::new(TASKS_FINISHED.clone()),
        Box::new(TASK_DURATION.clone()),
    ]
}
