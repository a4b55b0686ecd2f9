//! Common test utilities and constants
//!
//! In-memory collaborators and a recording page host shared by the
//! integration tests.

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use shiori::Error;
use shiori::prelude::*;
use shiori::types::{MediaProfile, ReadProgress};

#[allow(dead_code)]
pub const TEST_TIMEOUT: Duration = Duration::from_secs(5);
#[allow(dead_code)]
pub const TEST_BOOK_ID: &str = "0B00K1D";

/// `count` portrait pages.
#[allow(dead_code)]
pub fn portrait_pages(count: usize) -> Vec<Page> {
    (1..=count).map(|n| Page::new(n, 800, 1200)).collect()
}

/// A ready DIVINA book with optional 1-based saved progress.
#[allow(dead_code)]
pub fn ready_book(pages: usize, progress: Option<(usize, bool)>) -> Book {
    Book {
        id: TEST_BOOK_ID.to_string(),
        series_id: "S1".to_string(),
        series_title: "Test Series".to_string(),
        name: "Volume 1".to_string(),
        number: 1.0,
        media: Media {
            status: MediaStatus::Ready,
            media_type: "application/zip".to_string(),
            pages_count: pages,
            comment: None,
            media_profile: Some(MediaProfile::Divina),
            epub_divina_compatible: None,
        },
        read_progress: progress.map(|(page, completed)| ReadProgress { page, completed }),
    }
}

/// In-memory server implementing every collaborator.
#[allow(dead_code)]
pub struct MockServer {
    pub book: Mutex<Book>,
    pub pages: Mutex<Vec<Page>>,
    pub progress: Mutex<Vec<(usize, bool)>>,
    pub preloads: Mutex<Vec<usize>>,
    pub page_requests: AtomicUsize,
    pub progress_delay: Mutex<Option<Duration>>,
    /// Per-page delays, taking precedence over `progress_delay`.
    pub page_progress_delays: Mutex<HashMap<usize, Duration>>,
    pub fail_progress: Mutex<bool>,
}

#[allow(dead_code)]
impl MockServer {
    pub fn new(book: Book, pages: Vec<Page>) -> Arc<Self> {
        Arc::new(Self {
            book: Mutex::new(book),
            pages: Mutex::new(pages),
            progress: Mutex::new(Vec::new()),
            preloads: Mutex::new(Vec::new()),
            page_requests: AtomicUsize::new(0),
            progress_delay: Mutex::new(None),
            page_progress_delays: Mutex::new(HashMap::new()),
            fail_progress: Mutex::new(false),
        })
    }

    pub fn with_pages(pages: Vec<Page>) -> Arc<Self> {
        Self::new(ready_book(pages.len(), None), pages)
    }

    pub fn services(self: &Arc<Self>) -> ReaderServices {
        ReaderServices::new(self.clone(), self.clone(), self.clone())
    }

    pub fn saved_progress(&self) -> Vec<(usize, bool)> {
        self.progress.lock().clone()
    }

    pub fn preload_centers(&self) -> Vec<usize> {
        self.preloads.lock().clone()
    }
}

#[async_trait]
impl PageSource for MockServer {
    async fn get_book(&self, book_id: &str) -> shiori::Result<Book> {
        let book = self.book.lock().clone();
        if book.id != book_id {
            return Err(Error::not_found(format!("Book with ID '{}'", book_id)));
        }
        Ok(book)
    }

    async fn get_pages(&self, _book_id: &str) -> shiori::Result<Vec<Page>> {
        Ok(self.pages.lock().clone())
    }
}

#[async_trait]
impl ProgressSink for MockServer {
    async fn update_progress(
        &self,
        _book_id: &str,
        page_index: usize,
        completed: bool,
    ) -> shiori::Result<()> {
        let delay = self
            .page_progress_delays
            .lock()
            .get(&page_index)
            .copied()
            .or(*self.progress_delay.lock());
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if *self.fail_progress.lock() {
            return Err(Error::http(503, "Service Unavailable"));
        }
        self.progress.lock().push((page_index, completed));
        Ok(())
    }
}

#[async_trait]
impl PageFetcher for MockServer {
    async fn fetch_page(&self, _book_id: &str, page: &Page) -> shiori::Result<Bytes> {
        self.page_requests.fetch_add(1, Ordering::SeqCst);
        Ok(Bytes::from(format!("page {}", page.number)))
    }
}

#[async_trait]
impl Preloader for MockServer {
    async fn preload(&self, _book_id: &str, _pages: &[Page], center: usize) {
        self.preloads.lock().push(center);
    }
}

/// Page host that records every request and can refuse to present.
#[derive(Debug, Default)]
#[allow(dead_code)]
pub struct RecordingHost {
    pub presented: Vec<TransitionRequest>,
    pub layouts: Vec<(usize, usize)>,
    pub refuse: bool,
}

#[allow(dead_code)]
impl RecordingHost {
    pub fn last(&self) -> Option<TransitionRequest> {
        self.presented.last().copied()
    }
}

impl PageHost for RecordingHost {
    fn present(&mut self, request: &TransitionRequest, _item: ViewItem) -> bool {
        if self.refuse {
            return false;
        }
        self.presented.push(*request);
        true
    }

    fn layout_changed(&mut self, items: &[ViewItem], current: usize) {
        self.layouts.push((items.len(), current));
    }
}
