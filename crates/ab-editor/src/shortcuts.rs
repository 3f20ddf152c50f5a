//! Keyboard shortcut mapping.
//!
//! Maps key + modifier combos to semantic `ShortcutAction`s. The map lives
//! in Rust so the browser bridge and native tests resolve keys the same way.

use crate::input::Modifiers;

/// Actions that keyboard shortcuts can trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortcutAction {
    // ── View ──
    ZoomIn,
    ZoomOut,
    ResetZoom,

    // ── Z-order ──
    BringForward,
    SendBackward,
    BringToFront,
    SendToBack,

    // ── Edit ──
    Duplicate,
    Delete,

    // ── Gesture ──
    /// Abort the running drag/resize without committing.
    CancelGesture,
}

/// Resolves key events into shortcut actions.
///
/// ⌘ on macOS and Ctrl elsewhere are treated alike (see [`Modifiers::cmd`]).
pub struct ShortcutMap;

impl ShortcutMap {
    /// Resolve a key event to an action.
    ///
    /// `key` is the `KeyboardEvent.key` value (e.g. `"]"`, `"Escape"`).
    /// Returns `None` if the combo has no binding.
    pub fn resolve(key: &str, modifiers: Modifiers) -> Option<ShortcutAction> {
        let cmd = modifiers.cmd();

        // ── Modifier combos first (most specific) ──
        if cmd && modifiers.shift {
            // Shift turns the bracket keys into braces on most layouts.
            return match key {
                "[" | "{" => Some(ShortcutAction::SendToBack),
                "]" | "}" => Some(ShortcutAction::BringToFront),
                "+" => Some(ShortcutAction::ZoomIn),
                _ => None,
            };
        }

        if cmd {
            return match key {
                "=" | "+" => Some(ShortcutAction::ZoomIn),
                "-" => Some(ShortcutAction::ZoomOut),
                "0" => Some(ShortcutAction::ResetZoom),
                "[" => Some(ShortcutAction::SendBackward),
                "]" => Some(ShortcutAction::BringForward),
                "d" | "D" => Some(ShortcutAction::Duplicate),
                _ => None,
            };
        }

        match key {
            "Escape" => Some(ShortcutAction::CancelGesture),
            "Delete" | "Backspace" => Some(ShortcutAction::Delete),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const META: Modifiers = Modifiers {
        meta: true,
        ..Modifiers::NONE
    };
    const CMD_SHIFT: Modifiers = Modifiers {
        meta: true,
        shift: true,
        ..Modifiers::NONE
    };

    #[test]
    fn resolve_zoom() {
        assert_eq!(ShortcutMap::resolve("=", META), Some(ShortcutAction::ZoomIn));
        assert_eq!(ShortcutMap::resolve("+", Modifiers::CTRL), Some(ShortcutAction::ZoomIn));
        assert_eq!(ShortcutMap::resolve("+", CMD_SHIFT), Some(ShortcutAction::ZoomIn));
        assert_eq!(ShortcutMap::resolve("-", META), Some(ShortcutAction::ZoomOut));
        assert_eq!(ShortcutMap::resolve("0", Modifiers::CTRL), Some(ShortcutAction::ResetZoom));
        // Without ⌘ the digits and signs are plain typing.
        assert_eq!(ShortcutMap::resolve("=", Modifiers::NONE), None);
        assert_eq!(ShortcutMap::resolve("0", Modifiers::NONE), None);
    }

    #[test]
    fn resolve_z_order() {
        assert_eq!(ShortcutMap::resolve("[", META), Some(ShortcutAction::SendBackward));
        assert_eq!(ShortcutMap::resolve("]", META), Some(ShortcutAction::BringForward));
        assert_eq!(ShortcutMap::resolve("[", CMD_SHIFT), Some(ShortcutAction::SendToBack));
        assert_eq!(ShortcutMap::resolve("}", CMD_SHIFT), Some(ShortcutAction::BringToFront));
    }

    #[test]
    fn resolve_escape_and_delete() {
        assert_eq!(
            ShortcutMap::resolve("Escape", Modifiers::NONE),
            Some(ShortcutAction::CancelGesture)
        );
        assert_eq!(
            ShortcutMap::resolve("Backspace", Modifiers::NONE),
            Some(ShortcutAction::Delete)
        );
        assert_eq!(ShortcutMap::resolve("d", META), Some(ShortcutAction::Duplicate));
    }

    #[test]
    fn resolve_unknown_returns_none() {
        assert_eq!(ShortcutMap::resolve("q", Modifiers::NONE), None);
        assert_eq!(ShortcutMap::resolve("q", META), None);
        assert_eq!(ShortcutMap::resolve("Escape", META), None);
    }
}
