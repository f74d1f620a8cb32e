//! Highlighter-facing surface.
//!
//! Syntax highlighting lives outside this crate. The core talks to it in two directions:
//!
//! - after every structural change it fires a [`ModifiedRange`] notification (see
//!   [`crate::SharedBuffer::on_modified`]);
//! - the highlighter reads and annotates lines through [`HighlightTarget`], normally while holding
//!   the coarse store lock obtained from [`LineStoreHandle::lock`].
//!
//! Because each line guards its own highlighter cache, a highlighting pass holding the read lock
//! never blocks on, or is blocked by, other readers; edits wait for it to release the lock.

use crate::line_array::LineArray;
use parking_lot::{RwLock, RwLockReadGuard};
use std::any::Any;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Style identifier assigned by the highlighter.
pub type StyleId = u32;

/// Opaque per-line lexer state owned by the highlighter.
pub type LexerState = Option<Arc<dyn Any + Send + Sync>>;

/// Syntax-group spans for one line: each entry starts a style at a character column.
pub type LineMatch = BTreeMap<usize, StyleId>;

/// Inclusive range of lines touched by a structural change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModifiedRange {
    /// First modified line.
    pub start_line: usize,
    /// Last modified line (inclusive).
    pub end_line: usize,
}

/// Callback invoked after each structural change, outside the store lock.
pub type ModifiedCallback = Box<dyn FnMut(ModifiedRange) + Send>;

/// The capability surface a highlighter needs.
pub trait HighlightTarget {
    /// Number of lines.
    fn line_count(&self) -> usize;
    /// Raw bytes of line `n` (empty when out of range).
    fn line_bytes(&self, n: usize) -> &[u8];
    /// Lexer state stored at the end of line `n`.
    fn lexer_state(&self, n: usize) -> LexerState;
    /// Store the lexer state at the end of line `n`.
    fn set_lexer_state(&self, n: usize, state: LexerState);
    /// Store the syntax-group spans of line `n`.
    fn set_line_match(&self, n: usize, matches: LineMatch);
}

impl HighlightTarget for LineArray {
    fn line_count(&self) -> usize {
        LineArray::line_count(self)
    }

    fn line_bytes(&self, n: usize) -> &[u8] {
        LineArray::line_bytes(self, n)
    }

    fn lexer_state(&self, n: usize) -> LexerState {
        LineArray::lexer_state(self, n)
    }

    fn set_lexer_state(&self, n: usize, state: LexerState) {
        LineArray::set_lexer_state(self, n, state)
    }

    fn set_line_match(&self, n: usize, matches: LineMatch) {
        LineArray::set_line_match(self, n, matches)
    }
}

/// Thread-safe handle to a buffer's line store, for background readers (highlighting, backup
/// snapshots).
#[derive(Clone)]
pub struct LineStoreHandle {
    lines: Arc<RwLock<LineArray>>,
}

impl LineStoreHandle {
    pub(crate) fn new(lines: Arc<RwLock<LineArray>>) -> Self {
        Self { lines }
    }

    /// Take the coarse lock for reading. Edits to the buffer wait until the guard is dropped.
    pub fn lock(&self) -> RwLockReadGuard<'_, LineArray> {
        self.lines.read()
    }

    /// Serialized content, read under the coarse lock.
    pub fn snapshot_bytes(&self) -> Vec<u8> {
        self.lines.read().bytes()
    }

    /// Current line count.
    pub fn line_count(&self) -> usize {
        self.lines.read().line_count()
    }
}

impl std::fmt::Debug for LineStoreHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LineStoreHandle").finish_non_exhaustive()
    }
}
