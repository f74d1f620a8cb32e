//! Buffer orchestration.
//!
//! A [`SharedBuffer`] owns one line store, one edit engine and the cursors of every view opened
//! on it. A [`Buffer`] is a short-lived handle that edits and moves cursors *through* one of those
//! views; the active cursor of that view is the one recorded in new history entries and restored
//! on undo/redo.
//!
//! Every edit, whichever view issues it, repositions the cursors of all views. After the store
//! lock is released, each registered modified-range callback is invoked once per changed range;
//! this is the only coupling between the core and syntax highlighting.

use crate::brace::{self, BraceMatch};
use crate::clipboard::{Clipboard, Register};
use crate::cursor::{Cursor, CursorCommand, CursorContext};
use crate::cursor_set::CursorSet;
use crate::error::{BufferError, SearchError};
use crate::event::Delta;
use crate::event_handler::{Clock, EditTarget, EventHandler};
use crate::highlight::{LineStoreHandle, ModifiedCallback, ModifiedRange};
use crate::line_array::LineArray;
use crate::line_ending::LineEnding;
use crate::loc::Position;
use crate::search::{self, SearchQuery};
use crate::session::SessionSnapshot;
use crate::settings::BufferSettings;
use crate::text::is_word_char;
use crate::workspace::ViewId;
use parking_lot::{RwLock, RwLockReadGuard};
use std::collections::BTreeMap;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

/// Per-view state kept inside the shared buffer.
#[derive(Debug, Clone)]
pub struct ViewState {
    pub(crate) cursors: CursorSet,
    pub(crate) last_search: Option<SearchQuery>,
}

impl ViewState {
    pub(crate) fn new(cursors: CursorSet) -> Self {
        Self {
            cursors,
            last_search: None,
        }
    }

    /// The view's cursors.
    pub fn cursors(&self) -> &CursorSet {
        &self.cursors
    }
}

/// Line store, history and cursors shared by every view of one file.
pub struct SharedBuffer {
    lines: Arc<RwLock<LineArray>>,
    handler: EventHandler,
    views: BTreeMap<ViewId, ViewState>,
    path: Option<PathBuf>,
    settings: BufferSettings,
    callbacks: Vec<ModifiedCallback>,
    modified: bool,
    start_cursor: Position,
    mod_time: Option<SystemTime>,
}

impl std::fmt::Debug for SharedBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedBuffer")
            .field("path", &self.path)
            .field("line_count", &self.line_count())
            .field("views", &self.views.len())
            .field("modified", &self.modified)
            .field("handler", &self.handler)
            .finish_non_exhaustive()
    }
}

impl SharedBuffer {
    /// Load a buffer by streaming `reader`. `size` is the expected byte size of the stream and
    /// `endings` forces a line ending (auto-detected when `None`).
    pub fn from_reader<R: Read>(
        reader: R,
        size: usize,
        endings: Option<LineEnding>,
        path: Option<PathBuf>,
        settings: BufferSettings,
    ) -> Result<Self, BufferError> {
        let lines = LineArray::from_reader(reader, size, endings)?;
        Ok(Self::from_lines(lines, path, settings))
    }

    /// Create an unnamed buffer holding `text`.
    pub fn from_text(text: &str, settings: BufferSettings) -> Self {
        Self::from_lines(LineArray::from_text(text), None, settings)
    }

    fn from_lines(lines: LineArray, path: Option<PathBuf>, settings: BufferSettings) -> Self {
        Self {
            lines: Arc::new(RwLock::new(lines)),
            handler: EventHandler::new(),
            views: BTreeMap::new(),
            path,
            settings,
            callbacks: Vec::new(),
            modified: false,
            start_cursor: Position::default(),
            mod_time: None,
        }
    }

    /// Absolute path of the file, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Current settings.
    pub fn settings(&self) -> &BufferSettings {
        &self.settings
    }

    /// Mutable settings.
    pub fn settings_mut(&mut self) -> &mut BufferSettings {
        &mut self.settings
    }

    /// Open a new view with one cursor at the start location.
    pub fn open_view(&mut self) -> ViewId {
        let id = ViewId::next();
        let cursors = {
            let lines = self.lines.read();
            let ctx = CursorContext::new(&lines, self.settings.tab_size);
            CursorSet::new(self.start_cursor.clamp(&lines), &ctx)
        };
        self.views.insert(id, ViewState::new(cursors));
        id
    }

    /// Close a view and drop its per-line search caches. Returns `false` for an unknown view.
    pub fn close_view(&mut self, view: ViewId) -> bool {
        if self.views.remove(&view).is_none() {
            return false;
        }
        self.lines.write().forget_search_consumer(view);
        true
    }

    /// Number of open views.
    pub fn view_count(&self) -> usize {
        self.views.len()
    }

    /// Ids of the open views.
    pub fn view_ids(&self) -> impl Iterator<Item = ViewId> + '_ {
        self.views.keys().copied()
    }

    /// State of one view.
    pub fn view_state(&self, view: ViewId) -> Option<&ViewState> {
        self.views.get(&view)
    }

    /// Handle for editing through `view`.
    pub fn view(&mut self, view: ViewId) -> Option<Buffer<'_>> {
        if !self.views.contains_key(&view) {
            return None;
        }
        Some(Buffer { shared: self, view })
    }

    /// Thread-safe handle to the line store for background readers.
    pub fn line_store(&self) -> LineStoreHandle {
        LineStoreHandle::new(Arc::clone(&self.lines))
    }

    /// Read access to the line store.
    pub fn lines(&self) -> RwLockReadGuard<'_, LineArray> {
        self.lines.read()
    }

    /// Register a callback invoked after every structural change.
    pub fn on_modified(&mut self, callback: impl FnMut(ModifiedRange) + Send + 'static) {
        self.callbacks.push(Box::new(callback));
    }

    /// Returns `true` if the content changed since load or the last [`Self::mark_saved`].
    pub fn is_modified(&self) -> bool {
        self.modified
    }

    /// Clear the modified flag.
    pub fn mark_saved(&mut self) {
        self.modified = false;
    }

    /// Modification time of the backing file, as recorded by the host.
    pub fn mod_time(&self) -> Option<SystemTime> {
        self.mod_time
    }

    /// Record the modification time of the backing file.
    pub fn set_mod_time(&mut self, mod_time: Option<SystemTime>) {
        self.mod_time = mod_time;
    }

    /// Serialized content.
    pub fn bytes(&self) -> Vec<u8> {
        self.lines.read().bytes()
    }

    /// Serialized byte length.
    pub fn size(&self) -> usize {
        self.lines.read().size()
    }

    /// Number of lines.
    pub fn line_count(&self) -> usize {
        self.lines.read().line_count()
    }

    /// Current line ending.
    pub fn endings(&self) -> LineEnding {
        self.lines.read().endings()
    }

    /// Change the line ending used when serializing. Marks the buffer modified.
    pub fn set_endings(&mut self, endings: LineEnding) {
        let mut lines = self.lines.write();
        if lines.endings() != endings {
            lines.set_endings(endings);
            self.modified = true;
        }
    }

    /// Location new views start at.
    pub fn start_cursor(&self) -> Position {
        self.start_cursor
    }

    /// Replace the time source used to stamp edits.
    pub fn set_clock(&mut self, clock: Arc<dyn Clock>) {
        self.handler.set_clock(clock);
    }

    /// The edit history.
    pub fn history(&self) -> &EventHandler {
        &self.handler
    }

    /// Returns `true` if there is something to undo.
    pub fn can_undo(&self) -> bool {
        self.handler.can_undo()
    }

    /// Returns `true` if there is something to redo.
    pub fn can_redo(&self) -> bool {
        self.handler.can_redo()
    }

    /// Capture the history and the active cursor of `view` (or the start location when the
    /// view is unknown).
    pub fn session_snapshot(&self, view: ViewId) -> SessionSnapshot {
        let cursor = self
            .views
            .get(&view)
            .map(|v| v.cursors.active().loc)
            .unwrap_or(self.start_cursor);
        SessionSnapshot {
            undo: self.handler.undo_stack().clone(),
            redo: self.handler.redo_stack().clone(),
            cursor,
            mod_time: self.mod_time,
        }
    }

    /// Resume a saved session.
    ///
    /// The saved cursor becomes the start location and the active cursor of every open view
    /// moves there. The history is replaced only when the snapshot's modification time matches
    /// this buffer's; returns whether it was.
    pub fn restore_session(&mut self, snapshot: SessionSnapshot) -> bool {
        let applies = snapshot.history_applies_to(self.mod_time);
        {
            let lines = self.lines.read();
            let ctx = CursorContext::new(&lines, self.settings.tab_size);
            self.start_cursor = snapshot.cursor.clamp(&lines);
            for state in self.views.values_mut() {
                state.cursors.active_mut().goto_loc(self.start_cursor, &ctx);
            }
        }
        if applies {
            self.handler.set_history(snapshot.undo, snapshot.redo);
        }
        tracing::debug!(history = applies, "restored session");
        applies
    }

    fn edit<R>(
        &mut self,
        view: ViewId,
        f: impl FnOnce(&mut EventHandler, &mut EditTarget<'_>) -> R,
    ) -> R {
        let mut modified = Vec::new();
        let result = {
            let mut lines = self.lines.write();
            let mut target = EditTarget {
                lines: &mut *lines,
                views: &mut self.views,
                view,
                tab_size: self.settings.tab_size,
                modified: &mut modified,
            };
            f(&mut self.handler, &mut target)
        };
        if !modified.is_empty() {
            self.modified = true;
        }
        for range in modified {
            for callback in &mut self.callbacks {
                callback(range);
            }
        }
        result
    }
}

/// Convert an indentation run of spaces and tabs: tabs to `tab_size` spaces, or each run of
/// `tab_size` spaces to a tab.
fn retab_indent(indent: &[u8], to_spaces: bool, tab_size: usize) -> Vec<u8> {
    if to_spaces {
        let spaces = vec![b' '; tab_size];
        return indent
            .iter()
            .flat_map(|&b| {
                if b == b'\t' {
                    spaces.clone()
                } else {
                    vec![b]
                }
            })
            .collect();
    }
    if tab_size == 0 {
        return indent.to_vec();
    }
    let mut out = Vec::with_capacity(indent.len());
    let mut rest = indent;
    while let Some(&first) = rest.first() {
        if rest.len() >= tab_size && rest[..tab_size].iter().all(|&b| b == b' ') {
            out.push(b'\t');
            rest = &rest[tab_size..];
        } else {
            out.push(first);
            rest = &rest[1..];
        }
    }
    out
}

fn view_state_mut(views: &mut BTreeMap<ViewId, ViewState>, view: ViewId) -> &mut ViewState {
    match views.get_mut(&view) {
        Some(state) => state,
        // A `Buffer` is only created for an open view and holds the shared buffer mutably.
        None => unreachable!("view {view:?} closed while a handle to it was alive"),
    }
}

/// Editing handle bound to one view of a [`SharedBuffer`].
pub struct Buffer<'a> {
    shared: &'a mut SharedBuffer,
    view: ViewId,
}

impl std::fmt::Debug for Buffer<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Buffer")
            .field("view", &self.view)
            .finish_non_exhaustive()
    }
}

impl Buffer<'_> {
    /// The view this handle edits through.
    pub fn id(&self) -> ViewId {
        self.view
    }

    /// The underlying shared buffer.
    pub fn shared(&self) -> &SharedBuffer {
        &*self.shared
    }

    fn check_writable(&self) -> Result<(), BufferError> {
        if self.shared.settings.read_only {
            return Err(BufferError::ReadOnly);
        }
        Ok(())
    }

    /// Insert `text` at `pos`.
    pub fn insert(&mut self, pos: Position, text: &str) -> Result<(), BufferError> {
        self.insert_bytes(pos, text.as_bytes())
    }

    /// Insert raw bytes at `pos`.
    pub fn insert_bytes(&mut self, pos: Position, text: &[u8]) -> Result<(), BufferError> {
        self.check_writable()?;
        self.shared
            .edit(self.view, |handler, target| handler.insert(target, pos, text));
        Ok(())
    }

    /// Remove the range between `start` and `end`.
    pub fn remove(&mut self, start: Position, end: Position) -> Result<(), BufferError> {
        self.check_writable()?;
        self.shared
            .edit(self.view, |handler, target| handler.remove(target, start, end));
        Ok(())
    }

    /// Replace `[start, end)` with `text`: a removal followed by an insertion at `start`.
    pub fn replace(
        &mut self,
        start: Position,
        end: Position,
        text: &str,
    ) -> Result<(), BufferError> {
        self.check_writable()?;
        let start = start.min(end);
        self.remove(start, end)?;
        self.insert(start, text)
    }

    /// Apply several replacements as a single history entry.
    pub fn multiple_replace(&mut self, deltas: Vec<Delta>) -> Result<(), BufferError> {
        self.check_writable()?;
        self.shared
            .edit(self.view, |handler, target| handler.multiple_replace(target, deltas));
        Ok(())
    }

    /// Undo the newest group of edits. Returns the number of events undone.
    pub fn undo(&mut self) -> usize {
        self.shared
            .edit(self.view, |handler, target| handler.undo(target))
    }

    /// Redo the oldest undone group of edits. Returns the number of events redone.
    pub fn redo(&mut self) -> usize {
        self.shared
            .edit(self.view, |handler, target| handler.redo(target))
    }

    fn with_cursors<R>(&mut self, f: impl FnOnce(&mut CursorSet, &CursorContext<'_>) -> R) -> R {
        let shared = &mut *self.shared;
        let lines = shared.lines.read();
        let ctx = CursorContext::new(&lines, shared.settings.tab_size);
        let state = view_state_mut(&mut shared.views, self.view);
        f(&mut state.cursors, &ctx)
    }

    fn state(&self) -> &ViewState {
        match self.shared.views.get(&self.view) {
            Some(state) => state,
            None => unreachable!("view {:?} closed while a handle to it was alive", self.view),
        }
    }

    /// The view's cursor collection.
    pub fn cursor_set(&self) -> &CursorSet {
        &self.state().cursors
    }

    /// All cursors of the view.
    pub fn cursors(&self) -> &[Cursor] {
        self.state().cursors.cursors()
    }

    /// The current cursor.
    pub fn active_cursor(&self) -> &Cursor {
        self.state().cursors.active()
    }

    /// Number of cursors.
    pub fn num_cursors(&self) -> usize {
        self.state().cursors.len()
    }

    /// Make cursor `i` current (clamped).
    pub fn set_current_cursor(&mut self, i: usize) {
        self.with_cursors(|set, _| set.set_current(i));
    }

    /// Add a cursor at `loc` (clamped) and return its index.
    pub fn add_cursor(&mut self, loc: Position) -> usize {
        self.with_cursors(|set, ctx| set.add(Cursor::new(loc.clamp(ctx.lines), ctx)))
    }

    /// Remove cursor `i`; the last cursor is never removed.
    pub fn remove_cursor(&mut self, i: usize) -> bool {
        self.with_cursors(|set, _| set.remove(i).is_some())
    }

    /// Drop cursors that share a location with an earlier one.
    pub fn merge_cursors(&mut self) {
        self.with_cursors(|set, _| {
            let before = set.len();
            set.merge();
            if set.len() != before {
                tracing::debug!(before, after = set.len(), "merged cursors");
            }
        });
    }

    /// Keep only the first cursor and collapse its selection.
    pub fn clear_cursors(&mut self) {
        self.with_cursors(|set, _| set.clear());
    }

    /// Apply a movement or selection command to cursor `i`. Unknown indices are ignored.
    pub fn move_cursor(&mut self, i: usize, command: CursorCommand) {
        self.with_cursors(|set, ctx| {
            if let Some(cursor) = set.get_mut(i) {
                cursor.apply(command, ctx);
            }
        });
    }

    /// Apply a command to every cursor.
    pub fn move_cursors(&mut self, command: CursorCommand) {
        self.with_cursors(|set, ctx| {
            for cursor in set.cursors_mut() {
                cursor.apply(command, ctx);
            }
        });
    }

    /// Clamp every cursor into the buffer.
    pub fn relocate_cursors(&mut self) {
        self.with_cursors(|set, ctx| set.relocate(ctx));
    }

    /// Drop every cursor's selection.
    pub fn deselect_cursors(&mut self, to_start: bool) {
        self.with_cursors(|set, ctx| {
            for cursor in set.cursors_mut() {
                cursor.deselect(to_start, ctx);
            }
        });
    }

    /// Bytes selected by cursor `i` (empty without a selection).
    pub fn selection(&self, i: usize) -> Vec<u8> {
        let Some(cursor) = self.state().cursors.get(i) else {
            return Vec::new();
        };
        let lines = self.shared.lines.read();
        cursor.selection_bytes(&CursorContext::new(&lines, self.shared.settings.tab_size))
    }

    /// Copy cursor `i`'s selection into `register`. The primary register is skipped unless
    /// enabled in the settings.
    pub fn copy_selection(&self, i: usize, clipboard: &mut dyn Clipboard, register: Register) {
        let Some(cursor) = self.state().cursors.get(i) else {
            return;
        };
        if !cursor.has_selection() {
            return;
        }
        if register == Register::Primary && !self.shared.settings.use_primary {
            return;
        }
        let text = self.selection(i);
        clipboard.write_multi(
            &String::from_utf8_lossy(&text),
            register,
            cursor.num,
            self.num_cursors(),
        );
    }

    /// Delete cursor `i`'s selection and leave it at the earlier endpoint.
    pub fn delete_selection(&mut self, i: usize) -> Result<(), BufferError> {
        let Some(cursor) = self.state().cursors.get(i) else {
            return Ok(());
        };
        if !cursor.has_selection() {
            return Ok(());
        }
        let (start, end) = cursor.selection_range();
        self.remove(start, end)?;
        self.with_cursors(|set, ctx| {
            if let Some(cursor) = set.get_mut(i) {
                cursor.goto_loc(start, ctx);
                cursor.reset_selection();
            }
        });
        Ok(())
    }

    /// Base character at `pos`; `'\n'` past the end of the line.
    pub fn rune_at(&self, pos: Position) -> char {
        self.shared.lines.read().rune_at(pos)
    }

    /// The word containing `pos`, or nothing when `pos` is not on a word character.
    pub fn word_at(&self, pos: Position) -> Vec<u8> {
        let lines = self.shared.lines.read();
        if lines.line_bytes(pos.line).is_empty() || !is_word_char(lines.rune_at(pos)) {
            return Vec::new();
        }
        let mut start = pos;
        let mut end = Position::new(pos.line, pos.column + 1);
        while start.column > 0
            && is_word_char(lines.rune_at(Position::new(pos.line, start.column - 1)))
        {
            start.column -= 1;
        }
        let len = lines.character_count(pos.line);
        while end.column < len && is_word_char(lines.rune_at(end)) {
            end.column += 1;
        }
        lines.substr(start, end)
    }

    /// Move lines `[start, end)` up by one, swapping them with line `start - 1`.
    pub fn move_lines_up(&mut self, start: usize, end: usize) -> Result<(), BufferError> {
        let line_count = self.shared.line_count();
        if start < 1 || start >= end || end > line_count {
            return Ok(());
        }
        let (moved, last_len) = {
            let lines = self.shared.lines.read();
            let mut moved = lines.line_bytes(start - 1).to_vec();
            moved.push(b'\n');
            (moved, lines.character_count(end - 1))
        };
        if end == line_count {
            self.insert_bytes(Position::new(end - 1, last_len), b"\n")?;
        }
        self.insert_bytes(Position::new(end, 0), &moved)?;
        self.remove(Position::new(start - 1, 0), Position::new(start, 0))
    }

    /// Move lines `[start, end)` down by one, swapping them with line `end`.
    pub fn move_lines_down(&mut self, start: usize, end: usize) -> Result<(), BufferError> {
        let line_count = self.shared.line_count();
        if start >= end || end >= line_count {
            return Ok(());
        }
        let mut moved = self.shared.lines.read().line_bytes(end).to_vec();
        moved.push(b'\n');
        self.insert_bytes(Position::new(start, 0), &moved)?;
        let end = end + 1;
        self.remove(Position::new(end, 0), Position::new(end + 1, 0))
    }

    /// Rewrite the leading whitespace of every line for the current indentation settings, as one
    /// history entry.
    ///
    /// With `tabs_to_spaces` each tab becomes `tab_size` spaces; otherwise each run of
    /// `tab_size` spaces becomes a tab. Lines whose indentation is already right are left alone.
    pub fn retab(&mut self) -> Result<(), BufferError> {
        self.check_writable()?;
        let (to_spaces, tab_size) = (
            self.shared.settings.tabs_to_spaces,
            self.shared.settings.tab_size,
        );
        let deltas: Vec<Delta> = {
            let lines = self.shared.lines.read();
            (0..lines.line_count())
                .filter_map(|n| {
                    let bytes = lines.line_bytes(n);
                    let indent_len = bytes
                        .iter()
                        .take_while(|&&b| b == b' ' || b == b'\t')
                        .count();
                    let indent = &bytes[..indent_len];
                    let retabbed = retab_indent(indent, to_spaces, tab_size);
                    (retabbed != indent).then(|| {
                        Delta::new(retabbed, Position::new(n, 0), Position::new(n, indent_len))
                    })
                })
                .collect()
        };
        if deltas.is_empty() {
            return Ok(());
        }
        tracing::debug!(lines = deltas.len(), to_spaces, "retab");
        self.multiple_replace(deltas)
    }

    /// Find the brace of `pair` matching the one under `start` or just left of it.
    pub fn find_matching_brace(&self, pair: (char, char), start: Position) -> Option<BraceMatch> {
        brace::find_matching_brace(&self.shared.lines.read(), pair, start)
    }

    /// Byte offset of `pos` in the buffer text, counting each line break as one byte.
    pub fn byte_offset(&self, pos: Position) -> usize {
        pos.byte_offset(&self.shared.lines.read())
    }

    /// Find the next match of `pattern` inside `[start, end]` from `from`, wrapping once.
    /// Case sensitivity follows the buffer settings.
    pub fn find_next(
        &self,
        pattern: &str,
        start: Position,
        end: Position,
        from: Position,
        down: bool,
        use_regex: bool,
    ) -> Result<Option<(Position, Position)>, SearchError> {
        let lines = self.shared.lines.read();
        search::find_next(
            &lines,
            pattern,
            start,
            end,
            from,
            down,
            use_regex,
            self.shared.settings.ignore_case,
        )
    }

    /// The view's last search.
    pub fn last_search(&self) -> Option<&SearchQuery> {
        self.state().last_search.as_ref()
    }

    /// Set the view's last search, used by [`Self::search_match`].
    pub fn set_last_search(&mut self, query: Option<SearchQuery>) {
        view_state_mut(&mut self.shared.views, self.view).last_search = query;
    }

    /// Returns `true` if `pos` is inside a match of the view's last search.
    pub fn search_match(&self, pos: Position) -> bool {
        let Some(query) = self.state().last_search.as_ref() else {
            return false;
        };
        let lines = self.shared.lines.read();
        search::search_match(&lines, self.view, query, self.shared.settings.ignore_case, pos)
    }
}
