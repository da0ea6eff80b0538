//! Keyboard shortcut mapping.
//!
//! Maps key + modifier combos to semantic `ShortcutAction`s. Only keys the
//! rewrite flow reacts to are bound; everything else belongs to the page.

use crate::input::Modifiers;

/// Actions that keyboard shortcuts can trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortcutAction {
    /// ⌘A / Ctrl+A: the page selection is about to cover everything.
    SelectAll,
    /// ⌘⏎ / Ctrl+Enter: request a rewrite, or approve a ready one.
    Submit,
    /// Escape: close the panel.
    Dismiss,
}

/// Resolves key events into shortcut actions.
///
/// Platform-aware: on macOS `meta` is ⌘, elsewhere `ctrl` plays that role.
pub struct ShortcutMap;

impl ShortcutMap {
    /// Resolve a key event to an action.
    ///
    /// `key` is the `KeyboardEvent.key` value (e.g. `"a"`, `"Escape"`).
    /// Returns `None` if the key combo has no binding.
    pub fn resolve(key: &str, modifiers: Modifiers) -> Option<ShortcutAction> {
        if modifiers.command() && !modifiers.alt {
            return match key {
                "a" | "A" if !modifiers.shift => Some(ShortcutAction::SelectAll),
                "Enter" => Some(ShortcutAction::Submit),
                _ => None,
            };
        }

        match key {
            "Escape" if !modifiers.shift && !modifiers.alt => Some(ShortcutAction::Dismiss),
            _ => None,
        }
    }
}
