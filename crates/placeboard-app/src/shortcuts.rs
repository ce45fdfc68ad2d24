//! Keyboard shortcut registry and documentation.

/// What a shortcut asks the application to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    /// Switch between browsing and drawing.
    ToggleMode,
    /// Send the pending batch.
    Submit,
    /// Revert all pending edits.
    Clear,
    /// Re-centre the board at minimum zoom.
    ResetView,
}

/// A keyboard shortcut definition.
#[derive(Debug, Clone)]
pub struct Shortcut {
    pub key: &'static str,
    pub action: KeyAction,
    pub description: &'static str,
}

impl Shortcut {
    pub const fn new(key: &'static str, action: KeyAction, description: &'static str) -> Self {
        Self {
            key,
            action,
            description,
        }
    }
}

/// Registry of all keyboard shortcuts.
pub struct ShortcutRegistry;

impl ShortcutRegistry {
    /// Get all registered shortcuts.
    pub fn all() -> &'static [Shortcut] {
        SHORTCUTS
    }

    /// Look up the action for a key name as reported by the browser
    /// (`KeyboardEvent.key`). Letter keys match case-insensitively.
    pub fn action_for(key: &str) -> Option<KeyAction> {
        SHORTCUTS
            .iter()
            .find(|s| s.key.eq_ignore_ascii_case(key))
            .map(|s| s.action)
    }
}

const SHORTCUTS: &[Shortcut] = &[
    Shortcut::new("a", KeyAction::ToggleMode, "Toggle browse / draw mode"),
    Shortcut::new("Enter", KeyAction::Submit, "Submit pending pixels"),
    Shortcut::new("Escape", KeyAction::Clear, "Discard pending pixels"),
    Shortcut::new("0", KeyAction::ResetView, "Reset zoom and centre the board"),
];
