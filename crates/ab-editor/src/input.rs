//! Input abstraction layer.
//!
//! Host events (browser pointer, wheel, keyboard, resize-observer) are
//! normalised into [`InputEvent`] before reaching the editor. Coordinates
//! are screen pixels relative to the canvas element.

use ab_core::Point;

/// Modifier keys held during an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        shift: false,
        ctrl: false,
        alt: false,
        meta: false,
    };

    pub const SHIFT: Modifiers = Modifiers {
        shift: true,
        ..Self::NONE
    };

    pub const ALT: Modifiers = Modifiers {
        alt: true,
        ..Self::NONE
    };

    pub const CTRL: Modifiers = Modifiers {
        ctrl: true,
        ..Self::NONE
    };

    /// ⌘ on macOS, Ctrl elsewhere.
    pub fn cmd(&self) -> bool {
        self.ctrl || self.meta
    }

    /// Alt disables snapping for the event.
    pub fn bypass_snap(&self) -> bool {
        self.alt
    }
}

/// A normalized host event.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    PointerDown {
        x: f64,
        y: f64,
        modifiers: Modifiers,
    },
    PointerMove {
        x: f64,
        y: f64,
        modifiers: Modifiers,
    },
    PointerUp {
        x: f64,
        y: f64,
        modifiers: Modifiers,
    },
    /// The element lost pointer capture mid-gesture (window blur, OS gesture).
    LostPointerCapture,
    Wheel {
        dx: f64,
        dy: f64,
        x: f64,
        y: f64,
        modifiers: Modifiers,
        /// `Event.timeStamp` in milliseconds.
        timestamp_ms: f64,
    },
    Key {
        key: String,
        modifiers: Modifiers,
    },
    /// Resize-observer content box of the canvas element.
    Resize { width: f64, height: f64 },
}

impl InputEvent {
    /// Extract the screen position if this is a pointer or wheel event.
    pub fn position(&self) -> Option<Point> {
        match self {
            Self::PointerDown { x, y, .. }
            | Self::PointerMove { x, y, .. }
            | Self::PointerUp { x, y, .. }
            | Self::Wheel { x, y, .. } => Some(Point::new(*x, *y)),
            _ => None,
        }
    }

    pub fn modifiers(&self) -> Modifiers {
        match self {
            Self::PointerDown { modifiers, .. }
            | Self::PointerMove { modifiers, .. }
            | Self::PointerUp { modifiers, .. }
            | Self::Wheel { modifiers, .. }
            | Self::Key { modifiers, .. } => *modifiers,
            Self::LostPointerCapture | Self::Resize { .. } => Modifiers::NONE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cmd_is_ctrl_or_meta() {
        assert!(Modifiers::CTRL.cmd());
        assert!(
            Modifiers {
                meta: true,
                ..Modifiers::NONE
            }
            .cmd()
        );
        assert!(!Modifiers::SHIFT.cmd());
        assert!(Modifiers::ALT.bypass_snap());
    }

    #[test]
    fn position_of_pointer_events() {
        let down = InputEvent::PointerDown {
            x: 3.0,
            y: 4.0,
            modifiers: Modifiers::NONE,
        };
        assert_eq!(down.position(), Some(Point::new(3.0, 4.0)));
        assert_eq!(InputEvent::LostPointerCapture.position(), None);
        assert_eq!(
            InputEvent::Key {
                key: "z".into(),
                modifiers: Modifiers::CTRL
            }
            .modifiers(),
            Modifiers::CTRL
        );
    }
}
