//! On-disk cache of page images.
//!
//! Pages are stored as `<root>/<book id>/page_<number>.<ext>`. A
//! [`PageCache`] is an ordinary owned value handed to whatever needs it (the
//! [`WindowPreloader`](crate::preload::WindowPreloader), a renderer); there is
//! no shared global cache.
//!
//! # Examples
//!
//! ```rust,no_run
//! use shiori::cache::PageCache;
//! use shiori::types::Page;
//!
//! # async fn example() -> shiori::Result<()> {
//! let cache = PageCache::new("/tmp/shiori");
//! let page = Page::new(1, 800, 1200);
//!
//! cache.store("0A1B", &page, b"jpeg bytes").await?;
//! assert!(cache.contains("0A1B", &page).await);
//! let bytes = cache.load("0A1B", &page).await?;
//! # Ok(())
//! # }
//! ```

use bytes::Bytes;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::types::Page;

/// Page image cache rooted at a directory.
#[derive(Debug, Clone)]
pub struct PageCache {
    root: PathBuf,
}

impl PageCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn book_dir(&self, book_id: &str) -> PathBuf {
        self.root.join(sanitize_filename(book_id))
    }

    /// Location of `page` of `book_id` inside the cache.
    ///
    /// ```rust
    /// use shiori::cache::PageCache;
    /// use shiori::types::Page;
    /// use std::path::Path;
    ///
    /// let cache = PageCache::new("/cache");
    /// let mut page = Page::new(7, 800, 1200);
    /// page.media_type = "image/webp".to_string();
    /// assert_eq!(
    ///     cache.path_for("0A1B", &page),
    ///     Path::new("/cache/0A1B/page_0007.webp")
    /// );
    /// ```
    pub fn path_for(&self, book_id: &str, page: &Page) -> PathBuf {
        self.book_dir(book_id)
            .join(format!("page_{:04}.{}", page.number, page_extension(page)))
    }

    pub async fn contains(&self, book_id: &str, page: &Page) -> bool {
        fs::try_exists(self.path_for(book_id, page))
            .await
            .unwrap_or(false)
    }

    /// Cached bytes of `page`, `None` when it is not cached.
    pub async fn load(&self, book_id: &str, page: &Page) -> Result<Option<Bytes>> {
        match fs::read(self.path_for(book_id, page)).await {
            Ok(data) => Ok(Some(Bytes::from(data))),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Writes `data` for `page`, creating the book directory as needed.
    ///
    /// The image is written to a temporary name first and renamed into place,
    /// so readers never observe a partially written page.
    pub async fn store(&self, book_id: &str, page: &Page, data: &[u8]) -> Result<()> {
        let path = self.path_for(book_id, page);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let partial = path.with_extension("part");
        if let Err(e) = write_then_rename(&partial, &path, data).await {
            if let Err(cleanup) = fs::remove_file(&partial).await {
                if cleanup.kind() != ErrorKind::NotFound {
                    warn!(path = %partial.display(), error = %cleanup, "Failed to remove partial page");
                }
            }
            return Err(e.into());
        }

        debug!(book_id, page = page.number, bytes = data.len(), "Cached page");
        Ok(())
    }

    /// Removes every cached page of `book_id`.
    pub async fn remove_book(&self, book_id: &str) -> Result<()> {
        match fs::remove_dir_all(self.book_dir(book_id)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Total size of all cached pages.
    pub async fn size_bytes(&self) -> Result<u64> {
        Ok(self.book_dirs().await?.iter().map(|dir| dir.size).sum())
    }

    /// Removes whole books, least recently written first, until the cache
    /// fits in `max_bytes`. Returns the number of books removed.
    pub async fn enforce_limit(&self, max_bytes: u64) -> Result<usize> {
        let mut dirs = self.book_dirs().await?;
        let mut total: u64 = dirs.iter().map(|dir| dir.size).sum();
        dirs.sort_by_key(|dir| dir.modified);

        let mut removed = 0;
        for dir in dirs {
            if total <= max_bytes {
                break;
            }
            fs::remove_dir_all(&dir.path).await?;
            total = total.saturating_sub(dir.size);
            removed += 1;
        }

        if removed > 0 {
            info!(removed, total_bytes = total, "Trimmed page cache");
        }
        Ok(removed)
    }

    async fn book_dirs(&self) -> Result<Vec<BookDir>> {
        let mut entries = match fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut dirs = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_dir() {
                continue;
            }
            let mut size = 0;
            let mut modified = SystemTime::UNIX_EPOCH;
            let mut files = fs::read_dir(entry.path()).await?;
            while let Some(file) = files.next_entry().await? {
                let metadata = file.metadata().await?;
                if metadata.is_file() {
                    size += metadata.len();
                    if let Ok(time) = metadata.modified() {
                        modified = modified.max(time);
                    }
                }
            }
            dirs.push(BookDir {
                path: entry.path(),
                size,
                modified,
            });
        }
        Ok(dirs)
    }
}

async fn write_then_rename(partial: &Path, path: &Path, data: &[u8]) -> std::io::Result<()> {
    let mut file = fs::File::create(partial).await?;
    file.write_all(data).await?;
    file.flush().await?;
    drop(file);
    fs::rename(partial, path).await
}

struct BookDir {
    path: PathBuf,
    size: u64,
    modified: SystemTime,
}

/// Sanitizes a filename by replacing invalid characters.
///
/// # Examples
///
/// ```rust
/// use shiori::cache::sanitize_filename;
///
/// assert_eq!(sanitize_filename("../etc/passwd"), "_etc_passwd");
/// assert_eq!(sanitize_filename("  "), "untitled");
/// ```
pub fn sanitize_filename(name: &str) -> String {
    let invalid_chars = ['/', '\\', ':', '*', '?', '"', '<', '>', '|'];
    let mut sanitized: String = name
        .chars()
        .map(|c| if invalid_chars.contains(&c) { '_' } else { c })
        .collect();

    sanitized = sanitized.trim().trim_start_matches('.').to_string();
    if sanitized.len() > 200 {
        let mut end = 200;
        while !sanitized.is_char_boundary(end) {
            end -= 1;
        }
        sanitized.truncate(end);
    }

    if sanitized.is_empty() {
        sanitized = "untitled".to_string();
    }

    sanitized
}

/// File extension for a page image.
///
/// Taken from the media type, then from the archive file name, falling back
/// to `jpg`.
pub fn page_extension(page: &Page) -> String {
    let from_media_type = match page.media_type.as_str() {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        "image/gif" => Some("gif"),
        "image/avif" => Some("avif"),
        "image/jxl" => Some("jxl"),
        "image/heif" | "image/heic" => Some("heic"),
        "image/bmp" => Some("bmp"),
        "image/tiff" => Some("tiff"),
        _ => None,
    };
    from_media_type
        .map(str::to_string)
        .or_else(|| extract_extension(&page.file_name))
        .unwrap_or_else(|| "jpg".to_string())
}

/// Extracts a lowercase extension from a file name or path.
///
/// ```rust
/// use shiori::cache::extract_extension;
///
/// assert_eq!(extract_extension("chapter 1/012.PNG"), Some("png".to_string()));
/// assert_eq!(extract_extension("cover"), None);
/// ```
pub fn extract_extension(name: &str) -> Option<String> {
    let file = name.rsplit(['/', '\\']).next()?;
    let (stem, ext) = file.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() || ext.len() > 10 {
        return None;
    }
    Some(ext.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn page(number: usize, media_type: &str) -> Page {
        let mut page = Page::new(number, 800, 1200);
        page.media_type = media_type.to_string();
        page
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("0A1B2C"), "0A1B2C");
        assert_eq!(sanitize_filename("file/with\\bad:chars"), "file_with_bad_chars");
        assert_eq!(sanitize_filename(""), "untitled");
        assert!(sanitize_filename(&"é".repeat(150)).len() <= 200);
    }

    #[test]
    fn extensions() {
        assert_eq!(page_extension(&page(1, "image/png")), "png");
        let mut unknown = page(1, "application/octet-stream");
        unknown.file_name = "scan.JXL".to_string();
        assert_eq!(page_extension(&unknown), "jxl");
        unknown.file_name = String::new();
        assert_eq!(page_extension(&unknown), "jpg");
        assert_eq!(extract_extension(".hidden"), None);
    }

    #[tokio::test]
    async fn store_load_and_remove() {
        let dir = TempDir::new().unwrap();
        let cache = PageCache::new(dir.path());
        let first = page(1, "image/jpeg");

        assert!(!cache.contains("book", &first).await);
        assert_eq!(cache.load("book", &first).await.unwrap(), None);

        cache.store("book", &first, b"0123456789").await.unwrap();
        assert!(cache.contains("book", &first).await);
        assert_eq!(
            cache.load("book", &first).await.unwrap().as_deref(),
            Some(&b"0123456789"[..])
        );
        assert_eq!(cache.size_bytes().await.unwrap(), 10);

        cache.remove_book("book").await.unwrap();
        assert!(!cache.contains("book", &first).await);
        cache.remove_book("book").await.unwrap();
    }

    #[tokio::test]
    async fn limit_removes_whole_books() {
        let dir = TempDir::new().unwrap();
        let cache = PageCache::new(dir.path());
        cache.store("a", &page(1, "image/png"), &[0; 64]).await.unwrap();
        cache.store("b", &page(1, "image/png"), &[0; 64]).await.unwrap();

        assert_eq!(cache.enforce_limit(1024).await.unwrap(), 0);
        assert_eq!(cache.enforce_limit(100).await.unwrap(), 1);
        assert_eq!(cache.size_bytes().await.unwrap(), 64);
    }

    #[tokio::test]
    async fn failed_store_leaves_no_partial_file() {
        let dir = TempDir::new().unwrap();
        let cache = PageCache::new(dir.path());
        let first = page(1, "image/png");
        let path = cache.path_for("book", &first);
        // A directory in the way makes the final rename fail.
        std::fs::create_dir_all(&path).unwrap();

        assert!(cache.store("book", &first, &[0; 32]).await.is_err());
        assert!(!path.with_extension("part").exists());
        assert_eq!(cache.size_bytes().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn missing_root_is_empty() {
        let dir = TempDir::new().unwrap();
        let cache = PageCache::new(dir.path().join("absent"));
        assert_eq!(cache.size_bytes().await.unwrap(), 0);
    }
}
