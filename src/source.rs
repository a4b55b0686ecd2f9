//! Collaborator traits consumed by a reader session.
//!
//! The pagination core does not talk to a server or a disk on its own. A
//! [`ReaderSession`](crate::session::ReaderSession) is handed explicitly-owned
//! services through [`ReaderServices`] at construction and drops them when it
//! closes:
//!
//! - [`PageSource`] - Supplies the book description and its ordered page list
//! - [`ProgressSink`] - Persists the reading position after every commit
//! - [`PageFetcher`] - Downloads the image bytes of a single page
//! - [`Preloader`] - Warms a window of neighboring pages, fire-and-forget
//!
//! [`KomgaSource`](crate::sources::KomgaSource) implements the first three
//! against a Komga server, [`WindowPreloader`](crate::preload::WindowPreloader)
//! implements the last one on top of any [`PageFetcher`].
//!
//! # Examples
//!
//! ```rust
//! use shiori::prelude::*;
//! use shiori::error::Result;
//!
//! # async fn example(services: ReaderServices) -> Result<()> {
//! let book = services.pages.get_book("0A1B2C").await?;
//! let pages = services.pages.get_pages(&book.id).await?;
//! services.progress.update_progress(&book.id, 0, false).await?;
//! services.preloader.preload(&book.id, &pages, 0).await;
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;

use crate::{
    error::Result,
    types::{Book, Page},
};

/// Supplies books and their page lists.
///
/// # Required Methods
///
/// * [`get_book()`](PageSource::get_book) - Book metadata, media status and progress
/// * [`get_pages()`](PageSource::get_pages) - Ordered page descriptors
///
/// # Examples
///
/// ```rust
/// use async_trait::async_trait;
/// use shiori::prelude::*;
/// use shiori::error::Result;
///
/// struct FixedBook {
///     book: Book,
///     pages: Vec<Page>,
/// }
///
/// #[async_trait]
/// impl PageSource for FixedBook {
///     async fn get_book(&self, _book_id: &str) -> Result<Book> {
///         Ok(self.book.clone())
///     }
///
///     async fn get_pages(&self, _book_id: &str) -> Result<Vec<Page>> {
///         Ok(self.pages.clone())
///     }
/// }
/// ```
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Retrieves a book by its server ID.
    ///
    /// # Errors
    ///
    /// * [`Error::NotFound`](crate::Error::NotFound) - The book does not exist
    /// * [`Error::Unauthorized`](crate::Error::Unauthorized) - Credentials were rejected
    /// * [`Error::Network`](crate::Error::Network) - For network/connection issues
    async fn get_book(&self, book_id: &str) -> Result<Book>;

    /// Retrieves the ordered page list of a book.
    ///
    /// Pages are returned in reading order. The list is assumed immutable for
    /// the lifetime of a session; sessions re-fetch it only on explicit
    /// reload.
    async fn get_pages(&self, book_id: &str) -> Result<Vec<Page>>;
}

/// Persists the reading position.
///
/// Implementations must be idempotent and tolerate out-of-order duplicates:
/// a session reports after every commit, including commits that land on the
/// page that was already current.
#[async_trait]
pub trait ProgressSink: Send + Sync {
    /// Records `page_index` (0-based) as the last read page of `book_id`.
    ///
    /// `completed` is set when the reader reached the end of the book.
    async fn update_progress(&self, book_id: &str, page_index: usize, completed: bool)
    -> Result<()>;
}

/// Downloads page images.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetches the image bytes of `page`.
    async fn fetch_page(&self, book_id: &str, page: &Page) -> Result<Bytes>;
}

/// Warms pages around the reading position.
///
/// Preloading is fire-and-forget: implementations log their failures and
/// never report them to the caller.
#[async_trait]
pub trait Preloader: Send + Sync {
    /// Warms the neighborhood of the page at index `center`.
    async fn preload(&self, book_id: &str, pages: &[Page], center: usize);
}

/// A preloader that does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPreload;

#[async_trait]
impl Preloader for NoPreload {
    async fn preload(&self, _book_id: &str, _pages: &[Page], _center: usize) {}
}

/// The collaborators a reader session is constructed with.
///
/// # Examples
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use shiori::prelude::*;
///
/// # fn example() -> shiori::Result<()> {
/// let komga = Arc::new(KomgaSource::new("https://komga.example.com", ServerAuth::None)?);
/// let services = ReaderServices::new(komga.clone(), komga, Arc::new(NoPreload));
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct ReaderServices {
    pub pages: Arc<dyn PageSource>,
    pub progress: Arc<dyn ProgressSink>,
    pub preloader: Arc<dyn Preloader>,
}

impl ReaderServices {
    pub fn new(
        pages: Arc<dyn PageSource>,
        progress: Arc<dyn ProgressSink>,
        preloader: Arc<dyn Preloader>,
    ) -> Self {
        Self {
            pages,
            progress,
            preloader,
        }
    }
}

impl std::fmt::Debug for ReaderServices {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReaderServices").finish_non_exhaustive()
    }
}
