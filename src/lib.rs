//! # Shiori - Reader pagination and navigation engine for Komga
//!
//! Shiori maps a book's pages onto the view items a page-turn widget
//! displays, and keeps the reading position consistent while page turns
//! animate, gestures are recognized and progress is synced to the server.
//!
//! ## Features
//!
//! - **Page Layout**: Wide-page splitting, dual-page spreads and an explicit end-of-book item
//! - **Direction Aware**: Left-to-right, right-to-left, vertical and webtoon reading
//! - **Race Free Navigation**: Generation-tagged transitions; only completed ones commit
//! - **Gesture Admissibility**: Tap zones and drags toward missing pages are rejected up front
//! - **Komga Integration**: Book, page list, page image and read-progress endpoints
//! - **Preloading**: Neighbor pages are fetched into an on-disk cache in the background
//! - **Session Lifecycle**: Closing a session cancels everything it started
//!
//! ## Quick Start
//!
//! ### Laying out a book
//!
//! ```rust
//! use shiori::prelude::*;
//!
//! let pages = vec![
//!     Page::new(1, 800, 1200),
//!     Page::new(2, 1600, 1200),
//!     Page::new(3, 800, 1200),
//! ];
//! let options = LayoutOptions {
//!     reading_direction: ReadingDirection::Rtl,
//!     split_wide_page_mode: SplitWidePageMode::Auto,
//!     ..Default::default()
//! };
//! let layout = Layout::build(&pages, options);
//!
//! assert_eq!(layout.len(), pages.len() + 1 + 1);
//! assert_eq!(layout.get(0), Some(ViewItem::End));
//! ```
//!
//! ### Navigating
//!
//! ```rust
//! use shiori::prelude::*;
//!
//! let pages: Vec<Page> = (1..=10).map(|n| Page::new(n, 800, 1200)).collect();
//! let mut navigator = Navigator::new(Layout::build(&pages, LayoutOptions::default()), 0);
//!
//! let first = navigator.jump_to_page(5).unwrap();
//! let second = navigator.jump_to_page(9).unwrap();
//!
//! // The first jump was superseded; its completion is ignored.
//! assert!(navigator.on_transition_completed(first.item, true, Some(first.generation)).is_none());
//! let commit = navigator
//!     .on_transition_completed(second.item, true, Some(second.generation))
//!     .unwrap();
//! assert_eq!(commit.page, 9);
//! ```
//!
//! ### Reading from a server
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use shiori::prelude::*;
//!
//! # struct Terminal;
//! # impl PageHost for Terminal {
//! #     fn present(&mut self, _: &TransitionRequest, _: ViewItem) -> bool { true }
//! # }
//! #[tokio::main]
//! async fn main() -> shiori::Result<()> {
//!     let komga = Arc::new(KomgaSource::new(
//!         "https://komga.example.com",
//!         ServerAuth::api_key("0123456789abcdef"),
//!     )?);
//!     let preloader = WindowPreloader::new(komga.clone(), PageCache::new("/tmp/shiori"));
//!     let services = ReaderServices::new(komga.clone(), komga, Arc::new(preloader));
//!
//!     let mut session =
//!         ReaderSession::open("0A1B2C", services, ReaderSettings::default(), Terminal).await?;
//!     println!("Opened at {}", session.page_label());
//!
//!     session.close().await;
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! - [`layout`]: Page to view item mapping
//! - [`navigation`]: Navigation state machine
//! - [`gesture`]: Input events and tap zones
//! - [`host`]: Page-turn widget contract
//! - [`session`]: Single-owner reading session with cancellation
//! - [`source`]: Collaborator traits
//! - [`sources`]: Komga implementation of the collaborators
//! - [`net`]: HTTP client with retries
//! - [`cache`]: On-disk page cache
//! - [`preload`]: Neighbor-window preloading
//! - [`config`]: TOML configuration
//! - [`types`]: Books, pages and reader settings
//! - [`error`]: Error handling
//!
//! The library only emits [`tracing`] events. Installing a subscriber is
//! left to the application.

pub mod cache;
pub mod config;
pub mod error;
pub mod gesture;
pub mod host;
pub mod layout;
pub mod navigation;
pub mod net;
pub mod preload;
pub mod session;
pub mod source;
pub mod sources;
pub mod types;

/// Prelude module for convenient imports.
///
/// This module re-exports the most commonly used types and traits, allowing you to
/// import everything you need with a single `use shiori::prelude::*;` statement.
///
/// # Example
///
/// ```rust
/// use shiori::prelude::*;
///
/// // Now you have access to:
/// // - Layout, ViewItem, Navigator and the transition types
/// // - InputEvent, GestureDecision, tap zones
/// // - ReaderSession, PageHost and the collaborator traits
/// // - Page, Book, ReaderSettings and friends
/// ```
pub mod prelude {
    pub use crate::{
        cache::PageCache,
        config::{ShioriConfig, load_config},
        gesture::{GestureDecision, InputEvent, NavDirection, TapZoneMode, TapZoneSize, TapZones},
        host::PageHost,
        layout::{Layout, LayoutOptions, PageHalf, ViewItem},
        navigation::{
            Commit, HostDirection, Navigator, ReaderPosition, SpatialStep, TransitionRequest,
        },
        net::ServerAuth,
        preload::WindowPreloader,
        session::ReaderSession,
        source::{NoPreload, PageFetcher, PageSource, Preloader, ProgressSink, ReaderServices},
        types::{
            Book, Media, MediaStatus, Page, PageViewMode, ReaderSettings, ReaderSettingsBuilder,
            ReadingDirection, SplitWidePageMode,
        },
    };

    #[cfg(feature = "source-komga")]
    pub use crate::sources::KomgaSource;
}

// Re-export main types at crate root for direct access
pub use error::{Error, Result};
pub use layout::{Layout, ViewItem};
pub use navigation::Navigator;
pub use session::ReaderSession;
pub use types::{Book, Page, ReaderSettings, ReadingDirection};
