//! Configuration for the processor module.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Configuration for the archive processor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessorConfig {
    /// Maximum number of tasks downloaded and archived at the same time.
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,

    /// Maximum number of ready task IDs waiting for a worker.
    /// Enqueues beyond this are dropped.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// Per-request download timeout in seconds.
    #[serde(default = "default_download_timeout")]
    pub download_timeout_secs: u64,

    /// Root directory for per-task working directories and archives.
    #[serde(default = "default_temp_dir")]
    pub temp_dir: PathBuf,

    /// Re-enqueue tasks left in `pending` for longer than this many seconds.
    /// Disabled when unset.
    #[serde(default)]
    pub requeue_stuck_after_secs: Option<u64>,

    /// How often the stuck-task scan runs, in seconds.
    #[serde(default = "default_requeue_interval")]
    pub requeue_scan_interval_secs: u64,
}

fn default_max_concurrent() -> usize {
    3
}

fn default_queue_capacity() -> usize {
    100
}

fn default_download_timeout() -> u64 {
    30
}

fn default_temp_dir() -> PathBuf {
    std::env::temp_dir().join("file-archiver")
}

fn default_requeue_interval() -> u64 {
    60
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            max_concurrent: default_max_concurrent(),
            queue_capacity: default_queue_capacity(),
            download_timeout_secs: default_download_timeout(),
            temp_dir: default_temp_dir(),
            requeue_stuck_after_secs: None,
            requeue_scan_interval_secs: default_requeue_interval(),
        }
    }
}

impl ProcessorConfig {
    /// Sets the concurrency ceiling.
    pub fn with_max_concurrent(mut self, max: usize) -> Self {
        self.max_concurrent = max;
        self
    }

    /// Sets the dispatch queue capacity.
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    /// Sets the temp directory.
    pub fn with_temp_dir(mut self, dir: PathBuf) -> Self {
        self.temp_dir = dir;
        self
    }

    /// Enables the stuck-task re-scan.
    pub fn with_requeue(mut self, stuck_after_secs: u64, interval_secs: u64) -> Self {
        self.requeue_stuck_after_secs = Some(stuck_after_secs);
        self.requeue_scan_interval_secs = interval_secs;
        self
    }

    pub fn download_timeout(&self) -> Duration {
        Duration::from_secs(self.download_timeout_secs)
    }
}
