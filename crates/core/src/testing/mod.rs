//! Testing utilities and mock implementations.
//!
//! This module provides a mock implementation of the `Fetcher` trait so the
//! processor can be exercised without network access, plus small fixtures.
//!
//! # Example
//!
//! ```rust,ignore
//! use archiver_core::testing::{fixtures, MockFetcher};
//!
//! let fetcher = MockFetcher::new();
//! fetcher.fail_url("https://example.com/b.pdf", 404);
//!
//! let store = Arc::new(MemoryTaskStore::new());
//! let task_id = fixtures::ready_task(store.as_ref(), &fixtures::urls(3));
//! ```

mod mock_fetcher;

pub use mock_fetcher::{MockFetcher, RecordedFetch};

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::task::TaskStore;

    /// Distinct URLs alternating between the accepted extensions.
    pub fn urls(count: usize) -> Vec<String> {
        let extensions = ["pdf", "jpg", "jpeg"];
        (0..count)
            .map(|i| {
                format!(
                    "https://files.example.com/doc-{}.{}",
                    i,
                    extensions[i % extensions.len()]
                )
            })
            .collect()
    }

    /// Create a task and add every URL to it. Returns the task ID.
    ///
    /// Panics if the store rejects an item.
    pub fn ready_task(store: &dyn TaskStore, urls: &[String]) -> String {
        let task = store.create();
        for url in urls {
            store
                .add_item(&task.id, url)
                .expect("fixture item rejected");
        }
        task.id
    }
}
