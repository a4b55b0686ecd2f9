//! Reader navigation state machine.
//!
//! The [`Navigator`] owns the committed reading position (current page and
//! current view item) and at most one pending *target*, a programmatic
//! transition the host has been asked to animate. It never moves the
//! committed position on its own: every navigation operation returns a
//! [`TransitionRequest`] for the host, and only
//! [`on_transition_completed`](Navigator::on_transition_completed) commits.
//!
//! Requests carry a generation. A newer request supersedes the pending one,
//! and the completion of a superseded request is ignored, so two quick jumps
//! can never commit out of order.
//!
//! None of the operations fail. Out-of-range indices are ignored or clamped.
//!
//! # Examples
//!
//! ```rust
//! use shiori::layout::{Layout, LayoutOptions};
//! use shiori::navigation::{Navigator, ReaderPosition};
//! use shiori::types::Page;
//!
//! let pages: Vec<Page> = (1..=10).map(|n| Page::new(n, 800, 1200)).collect();
//! let mut navigator = Navigator::new(Layout::build(&pages, LayoutOptions::default()), 3);
//!
//! let request = navigator.advance().unwrap();
//! assert_eq!(navigator.current_page(), 3); // nothing moves until the host reports back
//!
//! let commit = navigator
//!     .on_transition_completed(request.item, true, Some(request.generation))
//!     .unwrap();
//! assert_eq!(commit.page, 4);
//! assert_eq!(navigator.position(), ReaderPosition::Reading(4));
//! ```

use tracing::debug;

use crate::gesture::{GestureDecision, InputEvent, NavDirection, TapAction, TapZones};
use crate::gesture::{drag_direction, tap_action};
use crate::layout::{Layout, ViewItem};

/// Where the reader is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReaderPosition {
    /// Showing content; the value is the current page index.
    Reading(usize),
    /// Showing the end-of-book sentinel.
    AtEnd,
}

/// Spatial neighbor of a view item, independent of reading direction.
///
/// `Before` is the item on the left (or above), `After` the one on the
/// right (or below).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpatialStep {
    Before,
    After,
}

impl SpatialStep {
    fn delta(self) -> isize {
        match self {
            SpatialStep::Before => -1,
            SpatialStep::After => 1,
        }
    }
}

/// Animation direction as the host sees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostDirection {
    /// Toward later content in reading order.
    Forward,
    /// Toward earlier content in reading order.
    Reverse,
}

/// A programmatic transition the host must perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionRequest {
    pub item: usize,
    pub generation: u64,
    pub animated: bool,
    pub direction: HostDirection,
}

/// The pending target of a programmatic transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Target {
    pub item: usize,
    /// Page the caller asked for, when the request was made by page.
    pub page: Option<usize>,
    pub generation: u64,
}

/// Committed and pending navigation indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavigationState {
    pub current_page: usize,
    pub current_item: usize,
    pub target: Option<Target>,
}

/// A committed transition.
///
/// Progress persistence and preloading are driven from commits only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Commit {
    pub item: usize,
    /// Current page after the commit; the last page when at the end.
    pub page: usize,
    pub position: ReaderPosition,
    /// Whether the commit reached the end-of-book sentinel.
    pub completed: bool,
}

/// Direction-aware navigation over a [`Layout`].
#[derive(Debug, Clone)]
pub struct Navigator {
    layout: Layout,
    state: NavigationState,
    next_generation: u64,
    zoomed: bool,
}

impl Navigator {
    /// Creates a navigator positioned at `initial_page`.
    ///
    /// A page past the end of the book opens on the sentinel.
    pub fn new(layout: Layout, initial_page: usize) -> Self {
        let (current_item, current_page) = Self::resolve(&layout, initial_page);
        Self {
            layout,
            state: NavigationState {
                current_page,
                current_item,
                target: None,
            },
            next_generation: 0,
            zoomed: false,
        }
    }

    fn resolve(layout: &Layout, page: usize) -> (usize, usize) {
        let item = layout.item_for_page(page);
        let page = match layout.get(item) {
            Some(view) if view.contains_page(page) => page,
            Some(ViewItem::End) | None => layout.page_count().saturating_sub(1),
            Some(view) => view.primary_page().unwrap_or(0),
        };
        (item, page)
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn state(&self) -> NavigationState {
        self.state
    }

    pub fn current_page(&self) -> usize {
        self.state.current_page
    }

    pub fn current_item(&self) -> usize {
        self.state.current_item
    }

    pub fn target(&self) -> Option<Target> {
        self.state.target
    }

    pub fn position(&self) -> ReaderPosition {
        if self.layout.is_end(self.state.current_item) {
            ReaderPosition::AtEnd
        } else {
            ReaderPosition::Reading(self.state.current_page)
        }
    }

    pub fn is_at_end(&self) -> bool {
        self.position() == ReaderPosition::AtEnd
    }

    pub fn set_zoomed(&mut self, zoomed: bool) {
        self.zoomed = zoomed;
    }

    pub fn is_zoomed(&self) -> bool {
        self.zoomed
    }

    /// Index of the neighbor in `direction`, from the committed item.
    pub fn neighbor(&self, direction: NavDirection) -> Option<usize> {
        match direction {
            NavDirection::Forward => self.layout.next_index(self.state.current_item),
            NavDirection::Backward => self.layout.previous_index(self.state.current_item),
        }
    }

    pub fn can_navigate(&self, direction: NavDirection) -> bool {
        self.neighbor(direction).is_some()
    }

    pub fn can_advance(&self) -> bool {
        self.can_navigate(NavDirection::Forward)
    }

    pub fn can_retreat(&self) -> bool {
        self.can_navigate(NavDirection::Backward)
    }

    /// Requests the next view item in reading order.
    pub fn advance(&mut self) -> Option<TransitionRequest> {
        let item = self.neighbor(NavDirection::Forward)?;
        self.request(item, None)
    }

    /// Requests the previous view item in reading order.
    pub fn retreat(&mut self) -> Option<TransitionRequest> {
        let item = self.neighbor(NavDirection::Backward)?;
        self.request(item, None)
    }

    pub fn navigate(&mut self, direction: NavDirection) -> Option<TransitionRequest> {
        match direction {
            NavDirection::Forward => self.advance(),
            NavDirection::Backward => self.retreat(),
        }
    }

    /// Requests the spatial neighbor of the committed item.
    pub fn step(&mut self, step: SpatialStep) -> Option<TransitionRequest> {
        let item = self.layout.offset(self.state.current_item, step.delta())?;
        self.request(item, None)
    }

    /// Requests the view item showing `page`.
    ///
    /// Pages past the end resolve to the sentinel. Jumping to the item that
    /// is already committed only clears the pending target.
    pub fn jump_to_page(&mut self, page: usize) -> Option<TransitionRequest> {
        let item = self.layout.item_for_page(page);
        let page = (page < self.layout.page_count()).then_some(page);
        self.request(item, page)
    }

    /// Requests an absolute view item; out-of-range items are ignored.
    pub fn jump_to_item(&mut self, item: usize) -> Option<TransitionRequest> {
        if item >= self.layout.len() {
            debug!(item, len = self.layout.len(), "Ignoring out-of-range jump");
            return None;
        }
        self.request(item, None)
    }

    fn request(&mut self, item: usize, page: Option<usize>) -> Option<TransitionRequest> {
        if item == self.state.current_item {
            if let Some(previous) = self.state.target.take() {
                debug!(
                    item,
                    superseded = previous.generation,
                    "Jump to the current item clears the pending target"
                );
            }
            return None;
        }

        let generation = self.next_generation;
        self.next_generation = self.next_generation.wrapping_add(1);
        if let Some(previous) = self.state.target.replace(Target {
            item,
            page,
            generation,
        }) {
            debug!(
                item,
                generation,
                superseded = previous.generation,
                "Superseding pending target"
            );
        }

        Some(TransitionRequest {
            item,
            generation,
            animated: true,
            direction: self.host_direction(item),
        })
    }

    fn host_direction(&self, item: usize) -> HostDirection {
        let from = self.layout.reading_position(self.state.current_item);
        if self.layout.reading_position(item) > from {
            HostDirection::Forward
        } else {
            HostDirection::Reverse
        }
    }

    /// Reports a finished host transition.
    ///
    /// `generation` is `Some` for transitions started from a
    /// [`TransitionRequest`] and `None` for transitions the user drove with a
    /// gesture. A generation that no longer matches the pending target is
    /// ignored; a matching one clears the target whether or not the
    /// transition was committed. A committed gesture drops any pending
    /// target, so a late completion of that jump cannot undo it.
    pub fn on_transition_completed(
        &mut self,
        item: usize,
        committed: bool,
        generation: Option<u64>,
    ) -> Option<Commit> {
        let page_hint = match generation {
            Some(generation) => {
                let target = match self.state.target {
                    Some(target) if target.generation == generation => target,
                    _ => {
                        debug!(item, generation, "Ignoring completion of a superseded transition");
                        return None;
                    }
                };
                self.state.target = None;
                if !committed {
                    debug!(item, generation, "Transition cancelled");
                    return None;
                }
                target.page.filter(|_| target.item == item)
            }
            None if committed => {
                self.layout.get(item)?;
                if let Some(previous) = self.state.target.take() {
                    debug!(
                        item,
                        superseded = previous.generation,
                        "Gesture commit supersedes pending target"
                    );
                }
                None
            }
            None => return None,
        };
        self.commit(item, page_hint)
    }

    fn commit(&mut self, item: usize, page_hint: Option<usize>) -> Option<Commit> {
        let view = self.layout.get(item)?;
        let page = match (view, page_hint) {
            (ViewItem::End, _) => self.layout.page_count().saturating_sub(1),
            (view, Some(page)) if view.contains_page(page) => page,
            (view, _) => view.primary_page().unwrap_or(0),
        };
        self.state.current_item = item;
        self.state.current_page = page;

        let position = self.position();
        debug!(item, page, ?position, "Committed transition");
        Some(Commit {
            item,
            page,
            position,
            completed: position == ReaderPosition::AtEnd,
        })
    }

    /// Drops the pending target, if any.
    pub fn cancel_pending(&mut self) -> Option<Target> {
        self.state.target.take()
    }

    /// Replaces the layout after a page list or settings change.
    ///
    /// The current page is preserved and its view item recomputed; being at
    /// the end stays at the end. Any pending target refers to the old layout
    /// and is dropped.
    pub fn relayout(&mut self, layout: Layout) {
        let at_end = self.is_at_end();
        let page = self.state.current_page;
        self.layout = layout;
        self.state.target = None;

        if at_end {
            self.state.current_item = self.layout.end_index();
            self.state.current_page = self.layout.page_count().saturating_sub(1);
        } else {
            let (item, page) = Self::resolve(&self.layout, page);
            self.state.current_item = item;
            self.state.current_page = page;
        }
    }

    /// Decides whether `event` may start a page turn.
    ///
    /// Gestures toward a view item that does not exist are rejected up front
    /// so the host never begins a transition it would have to undo.
    pub fn admit(&self, event: InputEvent, zones: TapZones) -> GestureDecision {
        if self.zoomed {
            return GestureDecision::Reject;
        }
        let direction = self.layout.reading_direction();
        match event {
            InputEvent::Tap { x, y } => {
                match tap_action(x, y, zones.mode, direction, zones.size.value()) {
                    TapAction::Next => self.decide(NavDirection::Forward),
                    TapAction::Previous => self.decide(NavDirection::Backward),
                    TapAction::ToggleControls => GestureDecision::ToggleControls,
                }
            }
            InputEvent::Drag {
                velocity_x,
                velocity_y,
            } => match drag_direction(velocity_x, velocity_y, direction) {
                Some(nav) => self.decide(nav),
                None => GestureDecision::Undetermined,
            },
        }
    }

    fn decide(&self, direction: NavDirection) -> GestureDecision {
        if self.can_navigate(direction) {
            GestureDecision::Navigate(direction)
        } else {
            GestureDecision::Reject
        }
    }

    /// Reader chrome label of the committed item.
    pub fn page_label(&self) -> String {
        self.layout.page_label(self.state.current_item)
    }

    /// Fraction of the book read, in `[0, 1]`.
    pub fn progress(&self) -> f64 {
        let count = self.layout.page_count();
        if count == 0 {
            return 0.0;
        }
        if self.is_at_end() {
            return 1.0;
        }
        (self.state.current_page + 1).min(count) as f64 / count as f64
    }
}
