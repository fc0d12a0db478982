//! Processor module for turning ready tasks into zip archives.
//!
//! This module provides the `ArchiveProcessor` which coordinates:
//! - Dispatch: a bounded, drop-on-full queue of ready task IDs
//! - Admission: a semaphore capping how many tasks run at once
//! - Download: each item fetched in order through a `Fetcher`
//! - Assembly: successful downloads zipped into `{temp_dir}/{id}/{id}.zip`
//!
//! # Example
//!
//! ```ignore
//! use archiver_core::processor::{ArchiveProcessor, HttpFetcher, ProcessorConfig};
//! use archiver_core::task::{MemoryTaskStore, TaskStore};
//!
//! let config = ProcessorConfig::default();
//! let store: Arc<dyn TaskStore> = Arc::new(MemoryTaskStore::new());
//! let fetcher = HttpFetcher::new(config.download_timeout())?;
//!
//! let processor = ArchiveProcessor::new(config, Arc::clone(&store), fetcher);
//! processor.start();
//!
//! if store.add_item(&task_id, url)? {
//!     processor.enqueue(&task_id);
//! }
//! ```

mod archive;
mod config;
mod fetcher;
mod pipeline;
mod queue;
mod types;

pub use archive::{member_name, url_extension, write_archive, ArchiveError, ArchiveMember};
pub use config::ProcessorConfig;
pub use fetcher::{FetchError, Fetcher, HttpFetcher};
pub use pipeline::{ArchiveProcessor, NO_FILES_TO_ARCHIVE};
pub use queue::DispatchQueue;
pub use types::ProcessorStatus;
