//! Mock fetcher for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::processor::{FetchError, Fetcher};

/// A recorded fetch for test assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedFetch {
    /// The requested URL.
    pub url: String,
    /// Whether the fetch succeeded.
    pub success: bool,
}

/// Mock implementation of the Fetcher trait.
///
/// Provides controllable behavior for testing:
/// - Per-URL failures (status code or transport error)
/// - Simulated download duration
/// - Recorded fetches in call order
/// - Peak number of fetches in flight at once
///
/// Clones share state, so a clone can be handed to the processor while the
/// test keeps one for assertions.
///
/// # Example
///
/// ```rust,ignore
/// use archiver_core::testing::MockFetcher;
///
/// let fetcher = MockFetcher::new();
/// fetcher.fail_url("https://example.com/b.pdf", 404);
/// fetcher.set_delay(Duration::from_millis(50));
///
/// let processor = ArchiveProcessor::new(config, store, fetcher.clone());
/// // ...
/// assert!(fetcher.max_in_flight() <= 3);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MockFetcher {
    failures: Arc<Mutex<HashMap<String, FetchError>>>,
    bodies: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    recorded: Arc<Mutex<Vec<RecordedFetch>>>,
    delay: Arc<Mutex<Duration>>,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
}

impl MockFetcher {
    /// Create a new mock fetcher where every URL succeeds instantly.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `url` answer with a non-success HTTP status.
    pub fn fail_url(&self, url: &str, status: u16) {
        self.fail_url_with(url, FetchError::Status(status));
    }

    /// Make `url` fail with the given error.
    pub fn fail_url_with(&self, url: &str, error: FetchError) {
        lock(&self.failures).insert(url.to_string(), error);
    }

    /// Set the body written for `url`. Defaults to `content of {url}`.
    pub fn set_body(&self, url: &str, body: impl Into<Vec<u8>>) {
        lock(&self.bodies).insert(url.to_string(), body.into());
    }

    /// Set how long every fetch takes.
    pub fn set_delay(&self, delay: Duration) {
        *lock(&self.delay) = delay;
    }

    /// Get all recorded fetches in call order.
    pub fn recorded_fetches(&self) -> Vec<RecordedFetch> {
        lock(&self.recorded).clone()
    }

    /// Get the number of fetches performed.
    pub fn fetch_count(&self) -> usize {
        lock(&self.recorded).len()
    }

    /// Highest number of fetches that were running at the same time.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

#[async_trait]
impl Fetcher for MockFetcher {
    fn name(&self) -> &str {
        "mock"
    }

    async fn fetch(&self, url: &str, dest: &Path) -> Result<u64, FetchError> {
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);

        let delay = *lock(&self.delay);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let failure = lock(&self.failures).get(url).cloned();
        let result = match failure {
            Some(error) => Err(error),
            None => {
                let body = lock(&self.bodies)
                    .get(url)
                    .cloned()
                    .unwrap_or_else(|| format!("content of {}", url).into_bytes());
                tokio::fs::write(dest, &body)
                    .await
                    .map(|_| body.len() as u64)
                    .map_err(FetchError::from)
            }
        };

        lock(&self.recorded).push(RecordedFetch {
            url: url.to_string(),
            success: result.is_ok(),
        });
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_default_success_writes_body() {
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("a.pdf");
        let fetcher = MockFetcher::new();

        let bytes = fetcher.fetch("https://x/a.pdf", &dest).await.unwrap();

        assert_eq!(std::fs::read_to_string(&dest).unwrap(), "content of https://x/a.pdf");
        assert_eq!(bytes, 26);
        assert_eq!(
            fetcher.recorded_fetches(),
            vec![RecordedFetch {
                url: "https://x/a.pdf".to_string(),
                success: true
            }]
        );
    }

    #[tokio::test]
    async fn test_configured_failure() {
        let dir = TempDir::new().unwrap();
        let fetcher = MockFetcher::new();
        fetcher.fail_url("https://x/b.pdf", 404);

        let err = fetcher
            .fetch("https://x/b.pdf", &dir.path().join("b.pdf"))
            .await
            .unwrap_err();

        assert_eq!(err, FetchError::Status(404));
        assert!(!fetcher.recorded_fetches()[0].success);
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let dir = TempDir::new().unwrap();
        let fetcher = MockFetcher::new();
        let clone = fetcher.clone();

        clone.fetch("https://x/c.jpg", &dir.path().join("c.jpg")).await.unwrap();

        assert_eq!(fetcher.fetch_count(), 1);
        assert_eq!(fetcher.max_in_flight(), 1);
    }
}
