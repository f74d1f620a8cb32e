#![warn(missing_docs)]
//! Buffer Core - Editing Kernel for a Terminal Text Editor
//!
//! # Overview
//!
//! `buffer-core` is the headless editing core of a terminal text editor: it stores text as lines
//! of raw bytes, keeps any number of cursors and selections valid across edits, and records every
//! change so it can be undone and redone. Rendering, key handling, file I/O and syntax
//! highlighting live above it.
//!
//! # Core Features
//!
//! - **Line Store**: lines of raw bytes with a single line-ending format, split and joined only by
//!   [`LineArray`]
//! - **Character Addressing**: positions are (line, character column); a character is a Unicode
//!   scalar plus its combining marks
//! - **Multi-Cursor**: every cursor of every view is repositioned by every edit
//! - **Time-Grouped Undo**: edits within the same 1000 ms bucket undo and redo together
//! - **Shared Views**: several views of one file share a single store and history
//!
//! # Architecture Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │  Workspace (buffers by path, views)         │  ← Public API
//! ├─────────────────────────────────────────────┤
//! │  SharedBuffer / Buffer (orchestration)      │  ← Notifications, search
//! ├─────────────────────────────────────────────┤
//! │  EventHandler (edit events, undo/redo)      │  ← History
//! ├─────────────────────────────────────────────┤
//! │  Cursor / CursorSet                         │  ← Carets, selections
//! ├─────────────────────────────────────────────┤
//! │  LineArray + Position                       │  ← Text storage
//! └─────────────────────────────────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ```rust
//! use buffer_core::{BufferSettings, Position, Workspace};
//!
//! let mut workspace = Workspace::new();
//! let opened = workspace
//!     .open_text(None, "ab\ncd", BufferSettings::default())
//!     .unwrap();
//!
//! let mut buffer = workspace.buffer(opened.view_id).unwrap();
//! buffer.insert(Position::new(0, 0), "X").unwrap();
//! assert_eq!(buffer.shared().bytes(), b"Xab\ncd");
//!
//! buffer.undo();
//! assert_eq!(buffer.shared().bytes(), b"ab\ncd");
//! ```
//!
//! # Module Description
//!
//! - [`line_array`] - line store
//! - [`loc`] - position arithmetic
//! - [`cursor`] / [`cursor_set`] - cursors, selections and multi-cursor collections
//! - [`event_handler`] - edit engine and undo/redo
//! - [`buffer`] - shared buffers and per-view editing handles
//! - [`workspace`] - open buffers and views
//! - [`highlight`] - the surface an external highlighter uses
//! - [`search`] - literal and regex search
//! - [`brace`] - bracket matching

pub mod brace;
pub mod buffer;
pub mod clipboard;
pub mod cursor;
pub mod cursor_set;
pub mod error;
pub mod event;
pub mod event_handler;
pub mod highlight;
pub mod line_array;
pub mod line_ending;
pub mod loc;
pub mod search;
pub mod session;
pub mod settings;
pub mod text;
pub mod workspace;

pub use brace::{BRACE_PAIRS, BraceMatch, find_matching_brace};
pub use buffer::{Buffer, SharedBuffer, ViewState};
pub use clipboard::{Clipboard, Register};
pub use cursor::{Cursor, CursorCommand, CursorContext};
pub use cursor_set::CursorSet;
pub use error::{BufferError, SearchError, WorkspaceError};
pub use event::{Delta, EditStack, EventKind, TextEvent, UNDO_THRESHOLD_MS};
pub use event_handler::{Clock, EventHandler, ManualClock, SystemClock};
pub use highlight::{
    HighlightTarget, LexerState, LineMatch, LineStoreHandle, ModifiedRange, StyleId,
};
pub use line_array::{HighlightCache, Line, LineArray};
pub use line_ending::LineEnding;
pub use loc::Position;
pub use search::{SearchQuery, find_next};
pub use session::SessionSnapshot;
pub use settings::BufferSettings;
pub use workspace::{BufferId, CloseOutcome, OpenBufferResult, ViewId, Workspace};
