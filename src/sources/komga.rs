use async_trait::async_trait;
use bytes::Bytes;
use serde::Serialize;
use tracing::{debug, info};

use crate::{
    error::{Error, Result},
    net::{HttpClient, ServerAuth},
    source::{PageFetcher, PageSource, ProgressSink},
    types::{Book, Page},
};

const API_PREFIX: &str = "api/v1";

/// Body of `PATCH /api/v1/books/{id}/read-progress`.
#[derive(Debug, Serialize, PartialEq, Eq)]
struct ReadProgressUpdate {
    /// 1-based page
    page: usize,
    completed: bool,
}

/// Komga REST source.
///
/// Implements [`PageSource`], [`ProgressSink`] and [`PageFetcher`] over the
/// `/api/v1/books` endpoints of a Komga server.
///
/// # Examples
///
/// ```rust,no_run
/// use shiori::prelude::*;
///
/// # async fn example() -> shiori::Result<()> {
/// let komga = KomgaSource::new(
///     "https://komga.example.com",
///     ServerAuth::basic("reader@example.com", "password"),
/// )?;
///
/// let book = komga.get_book("0A1B2C3D").await?;
/// let pages = komga.get_pages(&book.id).await?;
/// let cover = komga.fetch_page(&book.id, &pages[0]).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct KomgaSource {
    client: HttpClient,
}

impl KomgaSource {
    pub fn new(base_url: &str, auth: ServerAuth) -> Result<Self> {
        Ok(Self {
            client: HttpClient::new(base_url, auth)?,
        })
    }

    /// Wraps an already configured client.
    pub fn with_client(client: HttpClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &HttpClient {
        &self.client
    }

    fn book_path(book_id: &str, suffix: &str) -> Result<String> {
        let valid = !book_id.is_empty()
            && book_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(Error::not_found(format!("Book with ID '{}'", book_id)));
        }
        Ok(format!("{}/books/{}{}", API_PREFIX, book_id, suffix))
    }
}

#[async_trait]
impl PageSource for KomgaSource {
    async fn get_book(&self, book_id: &str) -> Result<Book> {
        let book: Book = self.client.get_json(&Self::book_path(book_id, "")?).await?;
        debug!(book_id, status = ?book.media.status, pages = book.media.pages_count, "Fetched book");
        Ok(book)
    }

    async fn get_pages(&self, book_id: &str) -> Result<Vec<Page>> {
        let mut pages: Vec<Page> = self
            .client
            .get_json(&Self::book_path(book_id, "/pages")?)
            .await?;
        pages.sort_by_key(|page| page.number);
        Ok(pages)
    }
}

#[async_trait]
impl ProgressSink for KomgaSource {
    async fn update_progress(
        &self,
        book_id: &str,
        page_index: usize,
        completed: bool,
    ) -> Result<()> {
        let body = ReadProgressUpdate {
            page: page_index + 1,
            completed,
        };
        self.client
            .patch_json(&Self::book_path(book_id, "/read-progress")?, &body)
            .await?;
        info!(book_id, page = body.page, completed, "Saved read progress");
        Ok(())
    }
}

#[async_trait]
impl PageFetcher for KomgaSource {
    async fn fetch_page(&self, book_id: &str, page: &Page) -> Result<Bytes> {
        let path = Self::book_path(book_id, &format!("/pages/{}", page.number))?;
        self.client.get(&path).await
    }
}
