//! Core data types for books, pages and reader settings.
//!
//! This module defines the fundamental data structures used throughout Shiori:
//!
//! - [`Page`] - One page of a book as served by the server
//! - [`Book`] - A book with its media description and read progress
//! - [`ReadingDirection`] - Reading order of a book
//! - [`SplitWidePageMode`] - Whether and how wide pages are split in two
//! - [`ReaderSettings`] - Reader preferences consumed by the layout and navigator
//!
//! The server payload types deserialize straight from Komga's camelCase JSON.
//!
//! # Examples
//!
//! ```rust
//! use shiori::types::*;
//!
//! let page = Page::new(1, 2400, 1700);
//! assert_eq!(page.index(), 0);
//! assert!(page.is_wide());
//!
//! let settings = ReaderSettingsBuilder::default()
//!     .reading_direction(ReadingDirection::Rtl)
//!     .split_wide_page_mode(SplitWidePageMode::Auto)
//!     .build()
//!     .unwrap();
//! assert!(settings.split_wide_page_mode.is_enabled());
//! ```

use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::gesture::{TapZoneMode, TapZoneSize};

/// One logical page of a book.
///
/// `number` is 1-based, as the server reports it. Dimensions are optional
/// because the server only knows them once the book has been analyzed.
///
/// # Examples
///
/// ```rust
/// use shiori::types::Page;
///
/// let page: Page = serde_json::from_str(
///     r#"{"number":3,"fileName":"003.jpg","mediaType":"image/jpeg","width":800,"height":1200}"#,
/// ).unwrap();
/// assert_eq!(page.index(), 2);
/// assert!(!page.is_wide());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    /// 1-based page number
    pub number: usize,

    /// File name inside the book archive
    #[serde(default)]
    pub file_name: String,

    /// MIME type of the page image
    #[serde(default)]
    pub media_type: String,

    /// Intrinsic width in pixels
    #[serde(default)]
    pub width: Option<u32>,

    /// Intrinsic height in pixels
    #[serde(default)]
    pub height: Option<u32>,

    /// Size of the image file
    #[serde(default)]
    pub size_bytes: Option<u64>,
}

impl Page {
    /// Creates a page with known dimensions and default file metadata.
    pub fn new(number: usize, width: u32, height: u32) -> Self {
        Self {
            number,
            file_name: format!("{:03}.jpg", number),
            media_type: "image/jpeg".to_string(),
            width: Some(width),
            height: Some(height),
            size_bytes: None,
        }
    }

    /// 0-based index of this page in the book.
    pub fn index(&self) -> usize {
        self.number.saturating_sub(1)
    }

    /// Whether the page is wide enough to be split in two halves.
    ///
    /// Pages with unknown dimensions are never considered wide.
    pub fn is_wide(&self) -> bool {
        match (self.width, self.height) {
            (Some(width), Some(height)) => height > 0 && width >= height,
            _ => false,
        }
    }
}

/// Media profile of a book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MediaProfile {
    #[serde(rename = "DIVINA")]
    Divina,
    #[serde(rename = "PDF")]
    Pdf,
    #[serde(rename = "EPUB")]
    Epub,
    #[serde(other)]
    Unknown,
}

/// Analysis status of a book's media.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MediaStatus {
    Ready,
    Error,
    Unsupported,
    Outdated,
    #[serde(other)]
    Unknown,
}

impl MediaStatus {
    /// User-facing explanation for a status that prevents reading.
    pub fn message(&self) -> &'static str {
        match self {
            MediaStatus::Ready => "",
            MediaStatus::Error => "Failed to load media",
            MediaStatus::Unsupported => "Media format is not supported",
            MediaStatus::Outdated => "Media is outdated",
            MediaStatus::Unknown => "Media status is unknown",
        }
    }
}

/// Media description of a book.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Media {
    pub status: MediaStatus,
    #[serde(default)]
    pub media_type: String,
    #[serde(default)]
    pub pages_count: usize,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub media_profile: Option<MediaProfile>,
    #[serde(default)]
    pub epub_divina_compatible: Option<bool>,
}

impl Media {
    /// Whether the paginated reader can display this media.
    ///
    /// DIVINA and PDF books are paginated; EPUB books only when the server
    /// reports a DIVINA-compatible rendition.
    pub fn is_paginated(&self) -> bool {
        if self.status != MediaStatus::Ready {
            return false;
        }
        match self.media_profile {
            Some(MediaProfile::Epub) => self.epub_divina_compatible.unwrap_or(false),
            Some(MediaProfile::Divina) | Some(MediaProfile::Pdf) | None => true,
            Some(MediaProfile::Unknown) => false,
        }
    }
}

/// Read progress stored on the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadProgress {
    /// 1-based last read page
    pub page: usize,
    pub completed: bool,
}

/// A book on the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub id: String,

    #[serde(default)]
    pub series_id: String,

    #[serde(default)]
    pub series_title: String,

    pub name: String,

    /// Position of the book in its series
    #[serde(default)]
    pub number: f64,

    pub media: Media,

    #[serde(default)]
    pub read_progress: Option<ReadProgress>,
}

impl Book {
    /// 0-based page the reader should open at.
    ///
    /// Completed books restart from the first page.
    pub fn resume_page(&self) -> usize {
        match &self.read_progress {
            Some(progress) if !progress.completed => progress.page.saturating_sub(1),
            _ => 0,
        }
    }
}

/// Reading order of a book.
///
/// Besides the obvious spine orientation, the direction decides which
/// numeric step is "forward" through the view items: horizontal RTL layouts
/// are stored in spatial left-to-right order, so reading forward is `-1`
/// there and `+1` everywhere else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadingDirection {
    #[default]
    #[serde(alias = "LEFT_TO_RIGHT")]
    Ltr,
    #[serde(alias = "RIGHT_TO_LEFT")]
    Rtl,
    #[serde(alias = "VERTICAL")]
    Vertical,
    #[serde(alias = "WEBTOON")]
    Webtoon,
}

impl ReadingDirection {
    /// All directions, in picker order.
    pub const ALL: [ReadingDirection; 4] = [
        ReadingDirection::Ltr,
        ReadingDirection::Rtl,
        ReadingDirection::Vertical,
        ReadingDirection::Webtoon,
    ];

    pub fn is_horizontal(&self) -> bool {
        matches!(self, ReadingDirection::Ltr | ReadingDirection::Rtl)
    }

    pub fn is_vertical(&self) -> bool {
        !self.is_horizontal()
    }

    /// True only for horizontal right-to-left reading.
    pub fn is_rtl(&self) -> bool {
        matches!(self, ReadingDirection::Rtl)
    }

    /// View-item index delta for one step forward in reading order.
    pub fn forward_step(&self) -> isize {
        if self.is_rtl() { -1 } else { 1 }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            ReadingDirection::Ltr => "Left to Right",
            ReadingDirection::Rtl => "Right to Left",
            ReadingDirection::Vertical => "Vertical",
            ReadingDirection::Webtoon => "Webtoon",
        }
    }
}

impl fmt::Display for ReadingDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ReadingDirection::Ltr => "ltr",
            ReadingDirection::Rtl => "rtl",
            ReadingDirection::Vertical => "vertical",
            ReadingDirection::Webtoon => "webtoon",
        };
        f.write_str(label)
    }
}

/// How wide pages are split into two view items.
///
/// # Variants
///
/// * `None` - Wide pages are shown whole
/// * `Auto` - Halves follow the book's reading direction
/// * `Ltr` - Left half first, whatever the book's direction
/// * `Rtl` - Right half first, whatever the book's direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SplitWidePageMode {
    #[default]
    None,
    Auto,
    Ltr,
    Rtl,
}

impl SplitWidePageMode {
    pub fn is_enabled(&self) -> bool {
        !matches!(self, SplitWidePageMode::None)
    }

    /// Reading direction that decides which half of a split page comes first.
    ///
    /// ```rust
    /// use shiori::types::{ReadingDirection, SplitWidePageMode};
    ///
    /// let mode = SplitWidePageMode::Ltr;
    /// assert_eq!(
    ///     mode.effective_reading_direction(ReadingDirection::Rtl),
    ///     ReadingDirection::Ltr
    /// );
    /// ```
    pub fn effective_reading_direction(&self, direction: ReadingDirection) -> ReadingDirection {
        match self {
            SplitWidePageMode::None | SplitWidePageMode::Auto => direction,
            SplitWidePageMode::Ltr => ReadingDirection::Ltr,
            SplitWidePageMode::Rtl => ReadingDirection::Rtl,
        }
    }
}

/// Page-turn widget style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageViewMode {
    /// Page curl transition
    #[default]
    Curl,
    /// Paged horizontal scroll
    Tab,
    /// Continuous scroll
    Scroll,
}

/// Reader preferences.
///
/// Changing any field that affects the layout (`reading_direction`,
/// `split_wide_page_mode`, `dual_page`, `dual_page_no_cover`) requires a
/// layout rebuild; the [`ReaderSession`](crate::session::ReaderSession) does
/// that in [`update_settings`](crate::session::ReaderSession::update_settings).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Builder)]
#[builder(setter(into))]
#[serde(default)]
pub struct ReaderSettings {
    #[builder(default)]
    pub reading_direction: ReadingDirection,
    #[builder(default)]
    pub split_wide_page_mode: SplitWidePageMode,
    #[builder(default)]
    pub page_view_mode: PageViewMode,
    #[builder(default)]
    pub dual_page: bool,
    #[builder(default)]
    pub dual_page_no_cover: bool,
    #[builder(default)]
    pub tap_zone_mode: TapZoneMode,
    #[builder(default)]
    pub tap_zone_size: TapZoneSize,
    #[builder(default = "2")]
    pub preload_ahead: usize,
    #[builder(default = "1")]
    pub preload_behind: usize,
    /// Read without saving progress to the server.
    #[builder(default)]
    pub incognito: bool,
}

impl Default for ReaderSettings {
    fn default() -> Self {
        Self {
            reading_direction: ReadingDirection::default(),
            split_wide_page_mode: SplitWidePageMode::default(),
            page_view_mode: PageViewMode::default(),
            dual_page: false,
            dual_page_no_cover: false,
            tap_zone_mode: TapZoneMode::default(),
            tap_zone_size: TapZoneSize::default(),
            preload_ahead: 2,
            preload_behind: 1,
            incognito: false,
        }
    }
}

impl ReaderSettings {
    /// Whether `other` differs in a way that changes the view item layout.
    pub fn layout_differs(&self, other: &ReaderSettings) -> bool {
        self.reading_direction != other.reading_direction
            || self.split_wide_page_mode != other.split_wide_page_mode
            || self.dual_page != other.dual_page
            || self.dual_page_no_cover != other.dual_page_no_cover
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn book_from_komga_json() {
        let json = r#"{
            "id": "0B1",
            "seriesId": "S1",
            "seriesTitle": "Dungeon Meshi",
            "name": "Volume 01",
            "number": 1,
            "media": {
                "status": "READY",
                "mediaType": "application/zip",
                "pagesCount": 192,
                "comment": "",
                "mediaProfile": "DIVINA"
            },
            "readProgress": { "page": 17, "completed": false }
        }"#;
        let book: Book = serde_json::from_str(json).unwrap();
        assert_eq!(book.media.pages_count, 192);
        assert!(book.media.is_paginated());
        assert_eq!(book.resume_page(), 16);
    }

    #[test]
    fn completed_books_restart() {
        let mut book: Book = serde_json::from_str(
            r#"{"id":"b","name":"n","media":{"status":"READY"},"readProgress":{"page":40,"completed":true}}"#,
        )
        .unwrap();
        assert_eq!(book.resume_page(), 0);
        book.read_progress = None;
        assert_eq!(book.resume_page(), 0);
    }

    #[test]
    fn epub_requires_divina_rendition() {
        let mut media = Media {
            status: MediaStatus::Ready,
            media_type: "application/epub+zip".to_string(),
            pages_count: 10,
            comment: None,
            media_profile: Some(MediaProfile::Epub),
            epub_divina_compatible: None,
        };
        assert!(!media.is_paginated());
        media.epub_divina_compatible = Some(true);
        assert!(media.is_paginated());
        media.status = MediaStatus::Outdated;
        assert!(!media.is_paginated());
    }

    #[test]
    fn unknown_status_is_tolerated() {
        let media: Media = serde_json::from_str(r#"{"status":"ANALYZING"}"#).unwrap();
        assert_eq!(media.status, MediaStatus::Unknown);
    }

    #[test]
    fn reading_direction_accepts_komga_names() {
        let dir: ReadingDirection = serde_json::from_str(r#""RIGHT_TO_LEFT""#).unwrap();
        assert_eq!(dir, ReadingDirection::Rtl);
        let dir: ReadingDirection = serde_json::from_str(r#""webtoon""#).unwrap();
        assert_eq!(dir, ReadingDirection::Webtoon);
        assert_eq!(ReadingDirection::Rtl.forward_step(), -1);
        assert_eq!(ReadingDirection::Vertical.forward_step(), 1);
    }

    #[test]
    fn square_pages_count_as_wide() {
        assert!(Page::new(1, 1000, 1000).is_wide());
        assert!(!Page::new(1, 999, 1000).is_wide());
        let mut unknown = Page::new(1, 2000, 1000);
        unknown.height = None;
        assert!(!unknown.is_wide());
    }

    #[test]
    fn builder_defaults_match_default() {
        let built = ReaderSettingsBuilder::default().build().unwrap();
        assert_eq!(built, ReaderSettings::default());
    }
}
