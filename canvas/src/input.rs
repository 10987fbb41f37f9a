//! Input model: modifier keys, buttons, held keys, and the gesture state machine.
//!
//! `Modifiers`, `Button`, `Key` and `WheelDelta` are the host-agnostic event
//! records the engine consumes. `InputState` is the single gesture mode
//! tracked between pointer-down and pointer-up, carrying all context needed
//! to compute deltas from the gesture origin.

#[cfg(test)]
#[path = "input_test.rs"]
mod input_test;

use std::collections::HashSet;

use crate::doc::ImageId;
use crate::viewport::{Point, Viewport};

/// Keyboard/mouse modifier keys held during an event.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, Copy, Default)]
pub struct Modifiers {
    /// Shift key is held.
    pub shift: bool,
    /// Ctrl key is held.
    pub ctrl: bool,
    /// Alt / Option key is held.
    pub alt: bool,
    /// Meta / Command key is held.
    pub meta: bool,
}

impl Modifiers {
    /// Whether the wheel should zoom instead of scrolling the page.
    #[must_use]
    pub fn zoom(self) -> bool {
        self.ctrl || self.meta
    }
}

/// Mouse button identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    /// Left mouse button (or single-finger tap).
    Primary,
    /// Middle mouse button (scroll wheel click).
    Middle,
    /// Right mouse button (or two-finger tap).
    Secondary,
}

impl Button {
    /// Map a DOM `MouseEvent.button` code. Unknown codes count as secondary.
    #[must_use]
    pub fn from_dom(code: i16) -> Self {
        match code {
            0 => Self::Primary,
            1 => Self::Middle,
            _ => Self::Secondary,
        }
    }
}

/// A keyboard key as reported in `KeyboardEvent.key` (e.g. `"Delete"`, `" "`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Key(pub String);

impl Key {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// `Delete` or `Backspace`.
    #[must_use]
    pub fn is_delete(&self) -> bool {
        self.0 == "Delete" || self.0 == "Backspace"
    }
}

/// Keys currently held down.
#[derive(Debug, Clone, Default)]
pub struct KeySet {
    held: HashSet<String>,
}

impl KeySet {
    pub fn press(&mut self, key: &Key) {
        self.held.insert(key.0.clone());
    }

    pub fn release(&mut self, key: &Key) {
        self.held.remove(&key.0);
    }

    #[must_use]
    pub fn is_held(&self, name: &str) -> bool {
        self.held.contains(name)
    }

    /// Forget every key, e.g. after the window loses focus and key-up events
    /// will never arrive.
    pub fn clear(&mut self) {
        self.held.clear();
    }
}

/// Wheel / trackpad scroll delta.
#[derive(Debug, Clone, Copy)]
pub struct WheelDelta {
    /// Horizontal scroll amount in pixels.
    pub dx: f64,
    /// Vertical scroll amount in pixels (positive = down, away from the user).
    pub dy: f64,
}

/// The active gesture.
#[derive(Debug, Clone, Default)]
pub enum InputState {
    /// No gesture in progress; waiting for the next pointer-down.
    #[default]
    Idle,
    /// The user is panning the view with the pan key held.
    Panning {
        /// Screen-space pointer position at pointer-down.
        start_screen: Point,
        /// Viewport at pointer-down; pan offsets are applied to this snapshot.
        start_viewport: Viewport,
    },
    /// The user is moving the selected images.
    DraggingImages {
        /// World-space pointer position at pointer-down.
        start_world: Point,
        /// Each dragged image's top-left corner at pointer-down.
        origins: Vec<(ImageId, Point)>,
    },
    /// The user is sweeping a selection rectangle.
    Marquee {
        /// World-space corner where the sweep started.
        start: Point,
        /// World-space corner under the pointer now.
        current: Point,
    },
}

impl InputState {
    #[must_use]
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }
}
