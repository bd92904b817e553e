//! Bounded snapshot history.

use crate::object::CanvasObject;
use std::time::{SystemTime, UNIX_EPOCH};

/// Maximum number of retained snapshots. Committing past the cap drops the
/// oldest entry.
pub const HISTORY_CAP: usize = 30;

/// One committed state: a structurally independent copy of every object.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub objects: Vec<CanvasObject>,
    pub timestamp: u64,
}

impl Snapshot {
    fn capture(objects: Vec<CanvasObject>) -> Self {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        Self { objects, timestamp }
    }
}

/// Linear undo stack with a current index.
///
/// Exactly one [`History::commit`] per discrete gesture; committing while
/// not at the tip discards the redo branch. The engine is responsible for
/// suppressing commits during restoration (it checks its mode before calling
/// in, rather than History carrying a reentrancy flag).
#[derive(Debug, Default)]
pub struct History {
    entries: Vec<Snapshot>,
    index: usize,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn can_undo(&self) -> bool {
        self.index > 0
    }

    pub fn can_redo(&self) -> bool {
        !self.entries.is_empty() && self.index + 1 < self.entries.len()
    }

    /// Record `objects` as the new tip.
    pub fn commit(&mut self, objects: Vec<CanvasObject>) {
        if !self.entries.is_empty() {
            self.entries.truncate(self.index + 1);
        }
        self.entries.push(Snapshot::capture(objects));
        if self.entries.len() > HISTORY_CAP {
            self.entries.remove(0);
        }
        self.index = self.entries.len() - 1;
        log::debug!("history commit, {} of {HISTORY_CAP} entries", self.entries.len());
    }

    /// Step back and return the state to restore, if any.
    pub fn undo(&mut self) -> Option<Vec<CanvasObject>> {
        if !self.can_undo() {
            return None;
        }
        self.index -= 1;
        Some(self.entries[self.index].objects.clone())
    }

    /// Step forward and return the state to restore, if any.
    pub fn redo(&mut self) -> Option<Vec<CanvasObject>> {
        if !self.can_redo() {
            return None;
        }
        self.index += 1;
        Some(self.entries[self.index].objects.clone())
    }
}
