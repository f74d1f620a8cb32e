//! Edit events and history stacks.
//!
//! Every mutation of a shared buffer is recorded as a [`TextEvent`]: a kind, one or more
//! [`Delta`] records, the time it happened and a snapshot of the cursor that issued it. Undo flips
//! the kind and re-executes the same records.

use crate::cursor::Cursor;
use crate::loc::Position;
use serde::{Deserialize, Serialize};

/// Width of an undo grouping bucket in milliseconds.
pub const UNDO_THRESHOLD_MS: u64 = 1000;

/// What an event does to the text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventKind {
    /// Insert each record's text at its start.
    Insert,
    /// Remove each record's `[start, end)` range.
    Remove,
    /// Replace each record's range with its text.
    Replace,
}

impl EventKind {
    /// The kind that undoes this one. `Replace` is its own inverse.
    pub fn inverted(self) -> Self {
        match self {
            Self::Insert => Self::Remove,
            Self::Remove => Self::Insert,
            Self::Replace => Self::Replace,
        }
    }
}

/// One contiguous change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delta {
    /// Inserted text, or the removed text once a removal has executed.
    pub text: Vec<u8>,
    /// Start of the affected range.
    pub start: Position,
    /// End of the affected range (filled in for insertions when the event executes).
    pub end: Position,
}

impl Delta {
    /// A record replacing `[start, end)` with `text`.
    pub fn new(text: impl Into<Vec<u8>>, start: Position, end: Position) -> Self {
        Self {
            text: text.into(),
            start,
            end,
        }
    }
}

/// A recorded edit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextEvent {
    /// Snapshot of the issuing cursor.
    pub cursor: Cursor,
    /// What the event does.
    pub kind: EventKind,
    /// The records, in application order.
    pub deltas: Vec<Delta>,
    /// Milliseconds since the Unix epoch.
    pub time: u64,
}

impl TextEvent {
    /// Start of the undo bucket this event falls in.
    pub fn bucket(&self) -> u64 {
        self.time - self.time % UNDO_THRESHOLD_MS
    }
}

/// LIFO history of events.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EditStack {
    events: Vec<TextEvent>,
}

impl EditStack {
    /// An empty stack.
    pub fn new() -> Self {
        Self::default()
    }

    /// Push an event on top.
    pub fn push(&mut self, event: TextEvent) {
        self.events.push(event);
    }

    /// Pop the top event.
    pub fn pop(&mut self) -> Option<TextEvent> {
        self.events.pop()
    }

    /// The top event.
    pub fn peek(&self) -> Option<&TextEvent> {
        self.events.last()
    }

    /// Number of events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Returns `true` if there are no events.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Drop every event.
    pub fn clear(&mut self) {
        self.events.clear();
    }

    /// Events from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &TextEvent> {
        self.events.iter()
    }
}

impl From<Vec<TextEvent>> for EditStack {
    fn from(events: Vec<TextEvent>) -> Self {
        Self { events }
    }
}

impl From<EditStack> for Vec<TextEvent> {
    fn from(stack: EditStack) -> Self {
        stack.events
    }
}
