//! Reading sessions.
//!
//! A [`ReaderSession`] is the single owner of one book's navigation state.
//! Every mutation goes through `&mut ReaderSession`, so the navigator has
//! exactly one writer. Work triggered by a commit (progress persistence,
//! preloading) runs on tasks owned by the session; those tasks only talk to
//! collaborators and never see the navigator.
//!
//! Sessions must be used from within a tokio runtime, since commits spawn
//! background tasks.
//!
//! # Examples
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use shiori::prelude::*;
//!
//! # struct Terminal;
//! # impl PageHost for Terminal {
//! #     fn present(&mut self, _: &TransitionRequest, _: ViewItem) -> bool { true }
//! # }
//! # async fn example() -> shiori::Result<()> {
//! let komga = Arc::new(KomgaSource::new("https://komga.example.com", ServerAuth::None)?);
//! let services = ReaderServices::new(komga.clone(), komga, Arc::new(NoPreload));
//!
//! let mut session =
//!     ReaderSession::open("0A1B2C", services, ReaderSettings::default(), Terminal).await?;
//!
//! if let Some(request) = session.advance() {
//!     // ... the host animates, then reports back:
//!     session.transition_completed(request.item, true, Some(request.generation));
//! }
//!
//! session.close().await;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::{sync::Mutex, task::JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::{
    error::{Error, Result},
    gesture::{GestureDecision, InputEvent, TapZones},
    host::PageHost,
    layout::{Layout, LayoutOptions},
    navigation::{Commit, Navigator, ReaderPosition, SpatialStep, TransitionRequest},
    source::ReaderServices,
    types::{Book, Media, MediaStatus, Page, ReaderSettings},
};

/// Checks that the paginated reader can display `media`.
///
/// # Errors
///
/// * [`Error::Unsupported`] - For media that is not `READY`, or EPUB media
///   without a DIVINA rendition
pub fn validate_media(media: &Media) -> Result<()> {
    if media.status != MediaStatus::Ready {
        let reason = media
            .comment
            .as_deref()
            .filter(|comment| !comment.is_empty())
            .unwrap_or(media.status.message());
        return Err(Error::unsupported(reason));
    }
    if !media.is_paginated() {
        return Err(Error::unsupported(format!(
            "{} books need a DIVINA rendition to be paginated",
            media.media_type
        )));
    }
    Ok(())
}

/// One open book.
pub struct ReaderSession<H: PageHost> {
    book: Book,
    pages: Arc<[Page]>,
    settings: ReaderSettings,
    navigator: Navigator,
    host: H,
    services: ReaderServices,
    tasks: JoinSet<()>,
    cancel: CancellationToken,
    /// Held while a progress update is in flight.
    progress_lock: Arc<Mutex<()>>,
    /// Sequence number of the newest progress update.
    progress_seq: Arc<AtomicU64>,
    closed: bool,
}

impl<H: PageHost> ReaderSession<H> {
    /// Opens `book_id` at its saved progress.
    ///
    /// # Errors
    ///
    /// * All errors from [`PageSource`](crate::source::PageSource)
    /// * [`Error::Unsupported`] - If the media cannot be paginated
    pub async fn open(
        book_id: &str,
        services: ReaderServices,
        settings: ReaderSettings,
        host: H,
    ) -> Result<Self> {
        let book = services.pages.get_book(book_id).await?;
        validate_media(&book.media)?;
        let pages = services.pages.get_pages(&book.id).await?;
        Ok(Self::with_pages(book, pages, services, settings, host))
    }

    /// Builds a session from an already fetched book and page list.
    pub fn with_pages(
        book: Book,
        pages: Vec<Page>,
        services: ReaderServices,
        settings: ReaderSettings,
        mut host: H,
    ) -> Self {
        let layout = Layout::build(&pages, LayoutOptions::from(&settings));
        let navigator = Navigator::new(layout, book.resume_page());
        host.layout_changed(navigator.layout().items(), navigator.current_item());

        info!(
            book_id = %book.id,
            pages = pages.len(),
            page = navigator.current_page(),
            direction = %settings.reading_direction,
            "Opened reader session"
        );

        let mut session = Self {
            book,
            pages: pages.into(),
            settings,
            navigator,
            host,
            services,
            tasks: JoinSet::new(),
            cancel: CancellationToken::new(),
            progress_lock: Arc::new(Mutex::new(())),
            progress_seq: Arc::new(AtomicU64::new(0)),
            closed: false,
        };
        session.spawn_preload(session.navigator.current_page());
        session
    }

    pub fn book(&self) -> &Book {
        &self.book
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn settings(&self) -> &ReaderSettings {
        &self.settings
    }

    pub fn navigator(&self) -> &Navigator {
        &self.navigator
    }

    pub fn layout(&self) -> &Layout {
        self.navigator.layout()
    }

    pub fn position(&self) -> ReaderPosition {
        self.navigator.position()
    }

    pub fn page_label(&self) -> String {
        self.navigator.page_label()
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Token cancelled when the session closes.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Number of background tasks still running.
    pub fn pending_tasks(&self) -> usize {
        self.tasks.len()
    }

    pub fn set_zoomed(&mut self, zoomed: bool) {
        self.navigator.set_zoomed(zoomed);
    }

    pub fn advance(&mut self) -> Option<TransitionRequest> {
        if self.closed {
            return None;
        }
        let request = self.navigator.advance();
        self.dispatch(request)
    }

    pub fn retreat(&mut self) -> Option<TransitionRequest> {
        if self.closed {
            return None;
        }
        let request = self.navigator.retreat();
        self.dispatch(request)
    }

    pub fn step(&mut self, step: SpatialStep) -> Option<TransitionRequest> {
        if self.closed {
            return None;
        }
        let request = self.navigator.step(step);
        self.dispatch(request)
    }

    /// Jump sheet: `page` is 1-based and clamped to the book.
    ///
    /// Returns `None` when the reader is already showing that page.
    pub fn jump_to_page_number(&mut self, page: usize) -> Option<TransitionRequest> {
        let count = self.pages.len();
        if count == 0 {
            return None;
        }
        self.jump_to_page(page.clamp(1, count) - 1)
    }

    pub fn jump_to_page(&mut self, page: usize) -> Option<TransitionRequest> {
        if self.closed {
            return None;
        }
        let request = self.navigator.jump_to_page(page);
        self.dispatch(request)
    }

    pub fn jump_to_item(&mut self, item: usize) -> Option<TransitionRequest> {
        if self.closed {
            return None;
        }
        let request = self.navigator.jump_to_item(item);
        self.dispatch(request)
    }

    fn dispatch(&mut self, request: Option<TransitionRequest>) -> Option<TransitionRequest> {
        let request = request?;
        let presented = self
            .navigator
            .layout()
            .get(request.item)
            .is_some_and(|item| self.host.present(&request, item));
        if !presented {
            debug!(item = request.item, generation = request.generation, "Host refused transition");
            self.navigator
                .on_transition_completed(request.item, false, Some(request.generation));
            return None;
        }
        Some(request)
    }

    /// Routes a user input through the gesture admissibility check.
    ///
    /// Taps that land in a navigation zone turn the page immediately. For
    /// drags the host drives the transition itself and reports it through
    /// [`transition_completed`](Self::transition_completed) without a
    /// generation.
    pub fn handle_input(&mut self, event: InputEvent) -> GestureDecision {
        if self.closed {
            return GestureDecision::Reject;
        }
        let decision = self.navigator.admit(event, TapZones::from(&self.settings));
        if let (InputEvent::Tap { .. }, GestureDecision::Navigate(direction)) = (event, decision) {
            let request = self.navigator.navigate(direction);
            if self.dispatch(request).is_none() {
                return GestureDecision::Reject;
            }
        }
        decision
    }

    /// Reports a finished host transition.
    ///
    /// Commits persist progress and preload the new neighborhood in the
    /// background. Incognito sessions only preload.
    pub fn transition_completed(
        &mut self,
        item: usize,
        committed: bool,
        generation: Option<u64>,
    ) -> Option<Commit> {
        if self.closed {
            debug!(item, "Ignoring completion after close");
            return None;
        }
        let commit = self
            .navigator
            .on_transition_completed(item, committed, generation)?;
        info!(
            book_id = %self.book.id,
            page = commit.page,
            item = commit.item,
            completed = commit.completed,
            "Page committed"
        );
        self.reap_finished();
        if self.settings.incognito {
            debug!(book_id = %self.book.id, page = commit.page, "Incognito, not saving progress");
        } else {
            self.spawn_progress(commit);
        }
        if !commit.completed {
            self.spawn_preload(commit.page);
        }
        Some(commit)
    }

    fn reap_finished(&mut self) {
        while let Some(result) = self.tasks.try_join_next() {
            if let Err(e) = result {
                if e.is_panic() {
                    warn!(error = %e, "Background task panicked");
                }
            }
        }
    }

    /// Progress updates run one at a time in commit order. An update that
    /// is still waiting when a newer commit arrives is skipped, so the
    /// server always ends on the latest page.
    fn spawn_progress(&mut self, commit: Commit) {
        if self.pages.is_empty() {
            return;
        }
        let sink = Arc::clone(&self.services.progress);
        let token = self.cancel.clone();
        let book_id = self.book.id.clone();
        let lock = Arc::clone(&self.progress_lock);
        let latest = Arc::clone(&self.progress_seq);
        let seq = latest.fetch_add(1, Ordering::SeqCst) + 1;
        self.tasks.spawn(async move {
            let update = async {
                let _guard = lock.lock().await;
                if latest.load(Ordering::SeqCst) != seq {
                    debug!(%book_id, page = commit.page, "Skipping superseded progress update");
                    return;
                }
                if let Err(e) = sink.update_progress(&book_id, commit.page, commit.completed).await {
                    warn!(%book_id, page = commit.page, error = %e, "Failed to save read progress");
                }
            };
            tokio::select! {
                biased;
                _ = token.cancelled() => {
                    debug!(%book_id, page = commit.page, "Progress update cancelled");
                }
                _ = update => {}
            }
        });
    }

    fn spawn_preload(&mut self, center: usize) {
        if self.pages.is_empty() {
            return;
        }
        let preloader = Arc::clone(&self.services.preloader);
        let token = self.cancel.clone();
        let book_id = self.book.id.clone();
        let pages = Arc::clone(&self.pages);
        self.tasks.spawn(async move {
            tokio::select! {
                biased;
                _ = token.cancelled() => {}
                _ = preloader.preload(&book_id, &pages, center) => {}
            }
        });
    }

    fn relayout(&mut self) {
        let layout = Layout::build(&self.pages, LayoutOptions::from(&self.settings));
        self.navigator.relayout(layout);
        self.host
            .layout_changed(self.navigator.layout().items(), self.navigator.current_item());
    }

    /// Applies new reader settings, rebuilding the layout when needed.
    ///
    /// The current page is preserved across the rebuild.
    pub fn update_settings(&mut self, settings: ReaderSettings) {
        let rebuild = self.settings.layout_differs(&settings);
        self.settings = settings;
        if rebuild && !self.closed {
            self.relayout();
            info!(
                book_id = %self.book.id,
                page = self.navigator.current_page(),
                items = self.navigator.layout().len(),
                "Rebuilt layout for new settings"
            );
        }
    }

    /// Re-fetches the page list, keeping the current page.
    ///
    /// # Errors
    ///
    /// * [`Error::Cancelled`] - If the session is closed
    /// * All errors from [`PageSource::get_pages`](crate::source::PageSource::get_pages)
    pub async fn reload_pages(&mut self) -> Result<()> {
        if self.closed {
            return Err(Error::Cancelled);
        }
        let pages = self.services.pages.get_pages(&self.book.id).await?;
        if self.closed {
            return Err(Error::Cancelled);
        }
        self.pages = pages.into();
        self.relayout();
        info!(book_id = %self.book.id, pages = self.pages.len(), "Reloaded pages");
        Ok(())
    }

    /// Waits for all background work started so far.
    pub async fn flush(&mut self) {
        while self.tasks.join_next().await.is_some() {}
    }

    /// Closes the session.
    ///
    /// Cancels the pending jump and every background task, and waits for
    /// them to stop. Navigation calls after close are ignored.
    pub async fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.cancel.cancel();
        if let Some(target) = self.navigator.cancel_pending() {
            debug!(item = target.item, generation = target.generation, "Cancelled pending jump");
        }
        self.tasks.abort_all();
        while self.tasks.join_next().await.is_some() {}
        info!(book_id = %self.book.id, page = self.navigator.current_page(), "Closed reader session");
    }
}

impl<H: PageHost> Drop for ReaderSession<H> {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

impl<H: PageHost> std::fmt::Debug for ReaderSession<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReaderSession")
            .field("book_id", &self.book.id)
            .field("state", &self.navigator.state())
            .field("closed", &self.closed)
            .finish_non_exhaustive()
    }
}
