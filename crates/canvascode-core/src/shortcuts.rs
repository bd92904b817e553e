//! Keyboard shortcut registry and documentation.

/// A keyboard shortcut definition.
#[derive(Debug, Clone)]
pub struct Shortcut {
    pub key: &'static str,
    pub ctrl: bool,
    pub shift: bool,
    pub description: &'static str,
}

impl Shortcut {
    pub const fn new(
        key: &'static str,
        ctrl: bool,
        shift: bool,
        description: &'static str,
    ) -> Self {
        Self {
            key,
            ctrl,
            shift,
            description,
        }
    }

    /// Format the shortcut for display (e.g., "Ctrl+Z").
    pub fn format(&self) -> String {
        let mut parts = Vec::new();
        if self.ctrl {
            parts.push("Ctrl");
        }
        if self.shift {
            parts.push("Shift");
        }
        parts.push(self.key);
        parts.join("+")
    }
}

/// Registry of all keyboard shortcuts.
pub struct ShortcutRegistry;

impl ShortcutRegistry {
    /// Get all registered shortcuts.
    pub fn all() -> Vec<Shortcut> {
        vec![
            Shortcut::new("A", true, false, "Select all objects"),
            Shortcut::new("C", true, false, "Copy objects"),
            Shortcut::new("X", true, false, "Cut objects"),
            Shortcut::new("V", true, false, "Paste objects, image or text"),
            Shortcut::new("D", true, false, "Duplicate selection"),
            Shortcut::new("Z", true, false, "Undo"),
            Shortcut::new("Z", true, true, "Redo"),
            Shortcut::new("Y", true, false, "Redo"),
            Shortcut::new("G", true, false, "Group selected objects"),
            Shortcut::new("G", true, true, "Ungroup selected objects"),
            Shortcut::new("]", true, false, "Bring forward"),
            Shortcut::new("[", true, false, "Send backward"),
            Shortcut::new("]", true, true, "Bring to front"),
            Shortcut::new("[", true, true, "Send to back"),
            Shortcut::new("+", true, false, "Zoom in"),
            Shortcut::new("-", true, false, "Zoom out"),
            Shortcut::new("0", true, false, "Reset zoom"),
            Shortcut::new("Arrow keys", false, false, "Nudge selection by 1"),
            Shortcut::new("Arrow keys", false, true, "Nudge selection by 10"),
            Shortcut::new("Delete", false, false, "Delete selected objects"),
            Shortcut::new("Backspace", false, false, "Delete selected objects"),
            Shortcut::new("Escape", false, false, "Clear selection"),
        ]
    }

    /// Print all shortcuts to console.
    pub fn print_all() {
        println!("\n=== Keyboard Shortcuts ===");
        for shortcut in Self::all() {
            println!("  {:20} {}", shortcut.format(), shortcut.description);
        }
        println!();
    }
}
