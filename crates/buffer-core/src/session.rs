//! Session persistence shape.
//!
//! A [`SessionSnapshot`] captures what is needed to resume editing a file later: the full
//! undo/redo history, where the cursor was, and the modification time of the file the history
//! applies to. Encoding it on disk is up to the host; the type derives serde traits.
//!
//! On restore the cursor location is always applied, but the history only when the recorded
//! modification time matches the buffer's, since history recorded against different content
//! would replay garbage.

use crate::event::EditStack;
use crate::loc::Position;
use serde::{Deserialize, Serialize};
use std::time::SystemTime;

/// Saved editing session for one file.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SessionSnapshot {
    /// Undo history, oldest first.
    pub undo: EditStack,
    /// Redo history, most recently undone last.
    pub redo: EditStack,
    /// Location of the active cursor when the session was saved.
    pub cursor: Position,
    /// Modification time of the file the history was recorded against.
    pub mod_time: Option<SystemTime>,
}

impl SessionSnapshot {
    /// Returns `true` if the history can be replayed on a file with `mod_time`.
    pub fn history_applies_to(&self, mod_time: Option<SystemTime>) -> bool {
        self.mod_time == mod_time
    }
}
