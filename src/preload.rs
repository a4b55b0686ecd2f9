//! Neighbor-window page preloading.

use async_trait::async_trait;
use futures::future::join_all;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::ops::Range;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::cache::PageCache;
use crate::source::{PageFetcher, Preloader};
use crate::types::{Page, ReaderSettings};

type InFlight = Arc<Mutex<HashSet<(String, usize)>>>;

/// Page indices to warm around `center` in a book of `count` pages.
///
/// ```rust
/// use shiori::preload::preload_window;
///
/// assert_eq!(preload_window(0, 10, 1, 2), 0..3);
/// assert_eq!(preload_window(9, 10, 1, 2), 8..10);
/// assert_eq!(preload_window(40, 10, 1, 2), 8..10);
/// assert!(preload_window(0, 0, 1, 2).is_empty());
/// ```
pub fn preload_window(center: usize, count: usize, behind: usize, ahead: usize) -> Range<usize> {
    if count == 0 {
        return 0..0;
    }
    let center = center.min(count - 1);
    let start = center.saturating_sub(behind);
    let end = center.saturating_add(ahead).saturating_add(1).min(count);
    start..end
}

/// Fetches the pages around the reading position into a [`PageCache`].
///
/// Pages already cached, or currently being fetched by an earlier call, are
/// skipped; the rest are fetched concurrently. Failures are logged and
/// otherwise ignored.
///
/// # Examples
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use shiori::prelude::*;
///
/// # fn example() -> shiori::Result<()> {
/// let komga = Arc::new(KomgaSource::new("https://komga.example.com", ServerAuth::None)?);
/// let preloader = WindowPreloader::new(komga, PageCache::new("/tmp/shiori"))
///     .with_window(1, 3);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct WindowPreloader {
    fetcher: Arc<dyn PageFetcher>,
    cache: PageCache,
    behind: usize,
    ahead: usize,
    in_flight: InFlight,
}

impl WindowPreloader {
    pub fn new(fetcher: Arc<dyn PageFetcher>, cache: PageCache) -> Self {
        let defaults = ReaderSettings::default();
        Self {
            fetcher,
            cache,
            behind: defaults.preload_behind,
            ahead: defaults.preload_ahead,
            in_flight: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    pub fn with_window(mut self, behind: usize, ahead: usize) -> Self {
        self.behind = behind;
        self.ahead = ahead;
        self
    }

    pub fn cache(&self) -> &PageCache {
        &self.cache
    }

    /// Number of pages currently being fetched.
    pub fn in_flight(&self) -> usize {
        self.in_flight.lock().len()
    }

    async fn warm(&self, book_id: &str, page: &Page, _claim: Claim) -> bool {
        match self.fetcher.fetch_page(book_id, page).await {
            Ok(data) => match self.cache.store(book_id, page, &data).await {
                Ok(()) => true,
                Err(e) => {
                    warn!(book_id, page = page.number, error = %e, "Failed to cache page");
                    false
                }
            },
            Err(e) => {
                warn!(book_id, page = page.number, error = %e, "Failed to preload page");
                false
            }
        }
    }
}

impl std::fmt::Debug for WindowPreloader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WindowPreloader")
            .field("cache", &self.cache)
            .field("behind", &self.behind)
            .field("ahead", &self.ahead)
            .finish_non_exhaustive()
    }
}

/// Marks a page as in flight until dropped, including when the preload
/// future is cancelled.
struct Claim {
    key: (String, usize),
    in_flight: InFlight,
}

impl Claim {
    fn acquire(in_flight: &InFlight, book_id: &str, index: usize) -> Option<Self> {
        let key = (book_id.to_string(), index);
        if !in_flight.lock().insert(key.clone()) {
            return None;
        }
        Some(Self {
            key,
            in_flight: Arc::clone(in_flight),
        })
    }
}

impl Drop for Claim {
    fn drop(&mut self) {
        self.in_flight.lock().remove(&self.key);
    }
}

#[async_trait]
impl Preloader for WindowPreloader {
    async fn preload(&self, book_id: &str, pages: &[Page], center: usize) {
        let window = preload_window(center, pages.len(), self.behind, self.ahead);

        let mut pending = Vec::new();
        for index in window {
            let page = &pages[index];
            if self.cache.contains(book_id, page).await {
                continue;
            }
            if let Some(claim) = Claim::acquire(&self.in_flight, book_id, index) {
                pending.push(self.warm(book_id, page, claim));
            }
        }

        if pending.is_empty() {
            return;
        }
        let requested = pending.len();
        let warmed = join_all(pending).await.into_iter().filter(|ok| *ok).count();
        debug!(book_id, center, requested, warmed, "Preloaded pages");
    }
}
