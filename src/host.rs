//! Page-turn host seam.
//!
//! The host is whatever widget actually animates page turns (a curl view, a
//! paged scroller, a terminal renderer). It receives
//! [`TransitionRequest`]s and reports back through
//! [`ReaderSession::transition_completed`](crate::session::ReaderSession::transition_completed).

use crate::layout::ViewItem;
use crate::navigation::TransitionRequest;

/// A widget able to display view items.
///
/// # Examples
///
/// ```rust
/// use shiori::host::PageHost;
/// use shiori::layout::ViewItem;
/// use shiori::navigation::TransitionRequest;
///
/// #[derive(Default)]
/// struct Recorder(Vec<usize>);
///
/// impl PageHost for Recorder {
///     fn present(&mut self, request: &TransitionRequest, _item: ViewItem) -> bool {
///         self.0.push(request.item);
///         true
///     }
/// }
/// ```
pub trait PageHost: Send {
    /// Starts showing `item` as described by `request`.
    ///
    /// Returning `false` means the host could not build a view for the item;
    /// the session treats that as a cancelled transition. A host returning
    /// `true` must later report the outcome with the request's generation.
    fn present(&mut self, request: &TransitionRequest, item: ViewItem) -> bool;

    /// Called when a session opens and after every relayout, with the full
    /// item list and the committed item to show without animation.
    fn layout_changed(&mut self, _items: &[ViewItem], _current: usize) {}
}
