//! Input events and tap zone classification.
//!
//! Platform gesture recognizers are reduced to a tagged [`InputEvent`] so
//! that a single function
//! ([`Navigator::admit`](crate::navigation::Navigator::admit)) decides whether
//! a gesture may start a page turn. This module holds the pure geometry part
//! of that decision: which tap zone was hit, and which reading direction a
//! drag points to.

use serde::{Deserialize, Serialize};

use crate::types::{ReaderSettings, ReadingDirection};

/// Fixed band of the webtoon L-shape zones, on both axes.
///
/// The configured [`TapZoneSize`] does not apply to webtoon zones.
const WEBTOON_BAND: f64 = 0.35;

/// A user input the reader may turn into navigation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    /// A tap, in coordinates normalized to `[0, 1]` over the reader bounds.
    Tap { x: f64, y: f64 },
    /// A drag or pan with its current velocity in points per second.
    Drag { velocity_x: f64, velocity_y: f64 },
}

/// Navigation direction in reading order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NavDirection {
    Forward,
    Backward,
}

/// Result of the gesture admissibility check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureDecision {
    /// The gesture may turn the page; the neighbor exists.
    Navigate(NavDirection),
    /// A center tap: show or hide the reader chrome.
    ToggleControls,
    /// The gesture points to a page that does not exist, or input is locked.
    Reject,
    /// No direction can be inferred yet; the host may begin tracking.
    Undetermined,
}

/// Tap zone layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TapZoneMode {
    /// Follow the reading direction.
    #[default]
    Auto,
    Ltr,
    Rtl,
    Vertical,
    /// L-shaped zones suited to continuous scroll.
    Webtoon,
    /// Every tap toggles the controls.
    Disabled,
}

impl TapZoneMode {
    /// Concrete mode for `direction`, resolving [`TapZoneMode::Auto`].
    pub fn resolve(self, direction: ReadingDirection) -> TapZoneMode {
        match self {
            TapZoneMode::Auto => match direction {
                ReadingDirection::Ltr => TapZoneMode::Ltr,
                ReadingDirection::Rtl => TapZoneMode::Rtl,
                ReadingDirection::Vertical => TapZoneMode::Vertical,
                ReadingDirection::Webtoon => TapZoneMode::Webtoon,
            },
            other => other,
        }
    }
}

/// Width of the previous/next tap zones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TapZoneSize {
    Small,
    Medium,
    #[default]
    Large,
}

impl TapZoneSize {
    /// Fraction of the reader bounds covered by each edge zone.
    pub fn value(&self) -> f64 {
        match self {
            TapZoneSize::Small => 0.25,
            TapZoneSize::Medium => 0.30,
            TapZoneSize::Large => 0.35,
        }
    }
}

/// Tap zone configuration of a reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TapZones {
    pub mode: TapZoneMode,
    pub size: TapZoneSize,
}

impl From<&ReaderSettings> for TapZones {
    fn from(settings: &ReaderSettings) -> Self {
        Self {
            mode: settings.tap_zone_mode,
            size: settings.tap_zone_size,
        }
    }
}

/// What a tap asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TapAction {
    Next,
    Previous,
    ToggleControls,
}

/// Classifies a tap at normalized `(x, y)`.
///
/// Coordinates outside `[0, 1]` are clamped.
///
/// # Examples
///
/// ```rust
/// use shiori::gesture::{tap_action, TapAction, TapZoneMode, TapZoneSize};
/// use shiori::types::ReadingDirection;
///
/// let zones = TapZoneSize::Large.value();
/// assert_eq!(
///     tap_action(0.9, 0.5, TapZoneMode::Auto, ReadingDirection::Ltr, zones),
///     TapAction::Next
/// );
/// assert_eq!(
///     tap_action(0.9, 0.5, TapZoneMode::Auto, ReadingDirection::Rtl, zones),
///     TapAction::Previous
/// );
/// ```
pub fn tap_action(
    x: f64,
    y: f64,
    mode: TapZoneMode,
    direction: ReadingDirection,
    threshold: f64,
) -> TapAction {
    let x = clamp_unit(x);
    let y = clamp_unit(y);

    let edge = |position: f64, threshold: f64, low: TapAction, high: TapAction| {
        if position < threshold {
            low
        } else if position > 1.0 - threshold {
            high
        } else {
            TapAction::ToggleControls
        }
    };

    match mode.resolve(direction) {
        TapZoneMode::Ltr => edge(x, threshold, TapAction::Previous, TapAction::Next),
        TapZoneMode::Rtl => edge(x, threshold, TapAction::Next, TapAction::Previous),
        TapZoneMode::Vertical => edge(y, threshold, TapAction::Previous, TapAction::Next),
        TapZoneMode::Webtoon => {
            if y < WEBTOON_BAND {
                TapAction::Previous
            } else if y > 1.0 - WEBTOON_BAND {
                TapAction::Next
            } else {
                edge(x, WEBTOON_BAND, TapAction::Previous, TapAction::Next)
            }
        }
        TapZoneMode::Disabled | TapZoneMode::Auto => TapAction::ToggleControls,
    }
}

/// Reading direction a drag moves toward, `None` while the velocity is zero
/// along the reading axis.
///
/// Dragging content toward the left (negative `x`) reveals the next page in
/// an LTR book; RTL books mirror that, vertical books use the `y` axis.
pub fn drag_direction(
    velocity_x: f64,
    velocity_y: f64,
    direction: ReadingDirection,
) -> Option<NavDirection> {
    let forward_sign = match direction {
        ReadingDirection::Ltr => -velocity_x,
        ReadingDirection::Rtl => velocity_x,
        ReadingDirection::Vertical | ReadingDirection::Webtoon => -velocity_y,
    };
    if forward_sign > 0.0 {
        Some(NavDirection::Forward)
    } else if forward_sign < 0.0 {
        Some(NavDirection::Backward)
    } else {
        None
    }
}

fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() { 0.5 } else { value.clamp(0.0, 1.0) }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LARGE: f64 = 0.35;

    #[test]
    fn horizontal_zones() {
        let ltr = |x| tap_action(x, 0.5, TapZoneMode::Ltr, ReadingDirection::Ltr, LARGE);
        assert_eq!(ltr(0.1), TapAction::Previous);
        assert_eq!(ltr(0.5), TapAction::ToggleControls);
        assert_eq!(ltr(0.7), TapAction::Next);

        let rtl = |x| tap_action(x, 0.5, TapZoneMode::Auto, ReadingDirection::Rtl, LARGE);
        assert_eq!(rtl(0.1), TapAction::Next);
        assert_eq!(rtl(0.9), TapAction::Previous);
    }

    #[test]
    fn vertical_zones_use_y() {
        let tap = |y| tap_action(0.1, y, TapZoneMode::Auto, ReadingDirection::Vertical, LARGE);
        assert_eq!(tap(0.1), TapAction::Previous);
        assert_eq!(tap(0.5), TapAction::ToggleControls);
        assert_eq!(tap(0.9), TapAction::Next);
    }

    #[test]
    fn webtoon_l_shape() {
        let tap = |x, y| tap_action(x, y, TapZoneMode::Auto, ReadingDirection::Webtoon, LARGE);
        assert_eq!(tap(0.9, 0.1), TapAction::Previous);
        assert_eq!(tap(0.1, 0.9), TapAction::Next);
        assert_eq!(tap(0.1, 0.5), TapAction::Previous);
        assert_eq!(tap(0.9, 0.5), TapAction::Next);
        assert_eq!(tap(0.5, 0.5), TapAction::ToggleControls);
    }

    #[test]
    fn webtoon_zones_ignore_zone_size() {
        let small = TapZoneSize::Small.value();
        let tap = |x, y| tap_action(x, y, TapZoneMode::Webtoon, ReadingDirection::Ltr, small);
        assert_eq!(tap(0.3, 0.5), TapAction::Previous);
        assert_eq!(tap(0.7, 0.5), TapAction::Next);
        assert_eq!(tap(0.3, 0.3), TapAction::Previous);

        let ltr = tap_action(0.3, 0.5, TapZoneMode::Ltr, ReadingDirection::Ltr, small);
        assert_eq!(ltr, TapAction::ToggleControls);
    }

    #[test]
    fn out_of_bounds_taps_are_clamped() {
        let tap = |x| tap_action(x, 0.5, TapZoneMode::Ltr, ReadingDirection::Ltr, LARGE);
        assert_eq!(tap(-3.0), TapAction::Previous);
        assert_eq!(tap(7.0), TapAction::Next);
        assert_eq!(tap(f64::NAN), TapAction::ToggleControls);
    }

    #[test]
    fn disabled_zones_only_toggle() {
        let action = tap_action(0.0, 0.0, TapZoneMode::Disabled, ReadingDirection::Ltr, LARGE);
        assert_eq!(action, TapAction::ToggleControls);
    }

    #[test]
    fn drag_signs() {
        assert_eq!(
            drag_direction(-200.0, 0.0, ReadingDirection::Ltr),
            Some(NavDirection::Forward)
        );
        assert_eq!(
            drag_direction(-200.0, 0.0, ReadingDirection::Rtl),
            Some(NavDirection::Backward)
        );
        assert_eq!(
            drag_direction(500.0, -10.0, ReadingDirection::Webtoon),
            Some(NavDirection::Forward)
        );
        assert_eq!(drag_direction(0.0, 300.0, ReadingDirection::Ltr), None);
    }
}
