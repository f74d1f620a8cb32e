//! Edit engine.
//!
//! [`EventHandler`] builds [`TextEvent`]s for insert/remove/replace, applies them to a
//! [`LineArray`], repositions every cursor of every view sharing that store, and keeps the
//! undo/redo history.
//!
//! # Undo grouping
//!
//! Events are grouped by time: `undo` pops events while they fall in the same
//! [`crate::event::UNDO_THRESHOLD_MS`] bucket as the first one popped, and `redo` mirrors it.
//! Each event carries a snapshot of the cursor that issued it; on undo/redo the cursor with the
//! same ordinal in the replaying view is restored from it. When that ordinal no longer exists the
//! restore is skipped.

use crate::buffer::ViewState;
use crate::cursor::{Cursor, CursorContext};
use crate::event::{Delta, EditStack, EventKind, TextEvent};
use crate::highlight::ModifiedRange;
use crate::line_array::LineArray;
use crate::loc::Position;
use crate::text::{
    character_count, decode_rune, has_trailing_whitespace, is_bytes_whitespace, is_mark,
    is_whitespace, rune_to_byte_index,
};
use crate::workspace::ViewId;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Time source for event timestamps.
pub trait Clock: Send + Sync {
    /// Milliseconds since the Unix epoch.
    fn now_millis(&self) -> u64;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }
}

/// Clock that only moves when told to. Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<AtomicU64>,
}

impl ManualClock {
    /// A clock reading `millis`.
    pub fn new(millis: u64) -> Self {
        Self {
            now: Arc::new(AtomicU64::new(millis)),
        }
    }

    /// Set the current time.
    pub fn set(&self, millis: u64) {
        self.now.store(millis, Ordering::SeqCst);
    }

    /// Move the current time forward.
    pub fn advance(&self, millis: u64) {
        self.now.fetch_add(millis, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}

/// Everything an edit touches, borrowed from the owning shared buffer for one call.
pub(crate) struct EditTarget<'a> {
    pub lines: &'a mut LineArray,
    pub views: &'a mut BTreeMap<ViewId, ViewState>,
    /// View issuing the edit (or replaying history).
    pub view: ViewId,
    pub tab_size: usize,
    pub modified: &'a mut Vec<ModifiedRange>,
}

impl EditTarget<'_> {
    fn active_cursor(&self) -> Option<&Cursor> {
        self.views.get(&self.view).map(|v| v.cursors.active())
    }
}

/// Net effect of one applied record on the positions after it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Shift {
    start: Position,
    old_end: Position,
    new_end: Position,
}

impl Shift {
    /// Map a location from before the record to after it.
    ///
    /// Locations before `start` are unaffected and locations inside a removed range collapse to
    /// `start`. Locations on the old end line keep their distance from the end; later lines move
    /// by the net line delta only.
    fn apply(&self, loc: Position) -> Position {
        if loc < self.start {
            return loc;
        }
        if loc < self.old_end {
            return self.start;
        }
        if loc.line == self.old_end.line {
            Position::new(
                self.new_end.line,
                self.new_end.column + (loc.column - self.old_end.column),
            )
        } else {
            Position::new(loc.line - self.old_end.line + self.new_end.line, loc.column)
        }
    }
}

/// Location just past `text` when inserted at `start`.
fn end_of_insert(start: Position, text: &[u8]) -> Position {
    match text.iter().rposition(|&b| b == b'\n') {
        Some(last_nl) => {
            let breaks = text.iter().filter(|&&b| b == b'\n').count();
            Position::new(start.line + breaks, character_count(&text[last_nl + 1..]))
        }
        None => Position::new(start.line, start.column + character_count(text)),
    }
}

/// Widen the edit replacing `[start, end)` with `text` so no combining mark ends up merged into a
/// character outside the edited range.
///
/// A mark leading `text` (or the tail, for removals) attaches to the character before `start`,
/// and a mark leading the tail attaches to the end of `text`. The neighbouring character is
/// pulled into the edit and rewritten unchanged, which keeps every recorded end position exact.
/// Returns `None` when the edit needs no widening.
fn widen_for_marks(
    lines: &LineArray,
    start: Position,
    end: Position,
    text: &[u8],
) -> Option<Delta> {
    let end_line = lines.line_bytes(end.line);
    let tail = &end_line[rune_to_byte_index(end.column, end_line)..];
    let tail_is_mark = !tail.is_empty() && is_mark(decode_rune(tail).0);
    let next_is_mark = if text.is_empty() {
        tail_is_mark
    } else {
        is_mark(decode_rune(text).0)
    };
    let joins_tail = if text.is_empty() {
        start.column > 0
    } else {
        text.last() != Some(&b'\n')
    };

    let widen_left = start.column > 0 && next_is_mark;
    let widen_right = tail_is_mark && joins_tail;
    if !widen_left && !widen_right {
        return None;
    }
    let new_start = if widen_left {
        Position::new(start.line, start.column - 1)
    } else {
        start
    };
    let new_end = if widen_right {
        Position::new(end.line, end.column + 1)
    } else {
        end
    };
    let mut widened = lines.substr(new_start, start);
    widened.extend_from_slice(text);
    widened.extend_from_slice(&lines.substr(end, new_end));
    Some(Delta::new(widened, new_start, new_end))
}

/// Record a structural change on `[start_line, end_line]` (clamped to the store).
fn mark_modified(
    lines: &LineArray,
    start_line: usize,
    end_line: usize,
    modified: &mut Vec<ModifiedRange>,
) {
    let last = lines.line_count() - 1;
    let start_line = start_line.min(last);
    let end_line = end_line.min(last);
    for n in start_line..=end_line {
        lines.invalidate_search_matches(n);
    }
    modified.push(ModifiedRange {
        start_line,
        end_line,
    });
}

/// Apply `event` to the store, filling in removed text and computed ends, and return the shift of
/// each record in application order.
///
/// Replace records are reversed afterwards so the same event applied again undoes them in LIFO
/// order.
fn execute_text_event(
    event: &mut TextEvent,
    lines: &mut LineArray,
    modified: &mut Vec<ModifiedRange>,
) -> Vec<Shift> {
    let mut shifts = Vec::with_capacity(event.deltas.len());
    match event.kind {
        EventKind::Insert => {
            for delta in &mut event.deltas {
                lines.insert(delta.start, &delta.text);
                delta.end = end_of_insert(delta.start, &delta.text).clamp(lines);
                mark_modified(lines, delta.start.line, delta.end.line, modified);
                shifts.push(Shift {
                    start: delta.start,
                    old_end: delta.start,
                    new_end: delta.end,
                });
            }
        }
        EventKind::Remove => {
            for delta in &mut event.deltas {
                delta.text = lines.remove(delta.start, delta.end);
                mark_modified(lines, delta.start.line, delta.end.line, modified);
                shifts.push(Shift {
                    start: delta.start,
                    old_end: delta.end,
                    new_end: delta.start,
                });
            }
        }
        EventKind::Replace => {
            for delta in &mut event.deltas {
                let removed = lines.remove(delta.start, delta.end);
                lines.insert(delta.start, &delta.text);
                let new_end = end_of_insert(delta.start, &delta.text);
                mark_modified(
                    lines,
                    delta.start.line,
                    delta.end.line.max(new_end.line),
                    modified,
                );
                shifts.push(Shift {
                    start: delta.start,
                    old_end: delta.end,
                    new_end,
                });
                delta.text = removed;
                delta.end = new_end;
            }
            event.deltas.reverse();
        }
    }
    shifts
}

/// Undo/redo history plus the time source stamping new events.
pub struct EventHandler {
    undo: EditStack,
    redo: EditStack,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for EventHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventHandler")
            .field("undo_depth", &self.undo.len())
            .field("redo_depth", &self.redo.len())
            .finish_non_exhaustive()
    }
}

impl Default for EventHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl EventHandler {
    /// Empty history stamped by the system clock.
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Empty history stamped by `clock`.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            undo: EditStack::new(),
            redo: EditStack::new(),
            clock,
        }
    }

    /// Replace the time source.
    pub fn set_clock(&mut self, clock: Arc<dyn Clock>) {
        self.clock = clock;
    }

    /// Undo history, oldest first.
    pub fn undo_stack(&self) -> &EditStack {
        &self.undo
    }

    /// Redo history, most recently undone last.
    pub fn redo_stack(&self) -> &EditStack {
        &self.redo
    }

    /// Returns `true` if there is something to undo.
    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    /// Returns `true` if there is something to redo.
    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    pub(crate) fn set_history(&mut self, undo: EditStack, redo: EditStack) {
        self.undo = undo;
        self.redo = redo;
    }

    fn new_event(&self, target: &EditTarget<'_>, kind: EventKind, deltas: Vec<Delta>) -> TextEvent {
        let cursor = match target.active_cursor() {
            Some(cursor) => cursor.clone(),
            None => Cursor::new(
                Position::default(),
                &CursorContext::new(target.lines, target.tab_size),
            ),
        };
        TextEvent {
            cursor,
            kind,
            deltas,
            time: self.clock.now_millis(),
        }
    }

    /// Insert `text` at `start` (clamped). Empty text is a no-op.
    pub(crate) fn insert(&mut self, target: &mut EditTarget<'_>, start: Position, text: &[u8]) {
        if text.is_empty() {
            return;
        }
        let start = start.clamp(target.lines);
        let event = match widen_for_marks(target.lines, start, start, text) {
            Some(delta) => self.new_event(target, EventKind::Replace, vec![delta]),
            None => self.new_event(
                target,
                EventKind::Insert,
                vec![Delta::new(text, start, Position::default())],
            ),
        };
        self.execute(target, event);
    }

    /// Remove `[start, end)` (clamped, either order). An empty range is a no-op.
    pub(crate) fn remove(&mut self, target: &mut EditTarget<'_>, start: Position, end: Position) {
        let mut start = start.clamp(target.lines);
        let mut end = end.clamp(target.lines);
        if start == end {
            return;
        }
        if end < start {
            std::mem::swap(&mut start, &mut end);
        }
        let event = match widen_for_marks(target.lines, start, end, &[]) {
            Some(delta) => self.new_event(target, EventKind::Replace, vec![delta]),
            None => self.new_event(
                target,
                EventKind::Remove,
                vec![Delta::new(Vec::new(), start, end)],
            ),
        };
        self.execute(target, event);
    }

    /// Apply several replacements as one event.
    ///
    /// Records are clamped, records that change nothing are dropped, and the rest are applied
    /// from the last position to the first so earlier positions stay valid.
    pub(crate) fn multiple_replace(&mut self, target: &mut EditTarget<'_>, deltas: Vec<Delta>) {
        let mut deltas: Vec<Delta> = deltas
            .into_iter()
            .map(|d| {
                let (a, b) = (d.start.clamp(target.lines), d.end.clamp(target.lines));
                let (start, end) = if b < a { (b, a) } else { (a, b) };
                Delta::new(d.text, start, end)
            })
            .filter(|d| d.start != d.end || !d.text.is_empty())
            .map(|d| widen_for_marks(target.lines, d.start, d.end, &d.text).unwrap_or(d))
            .collect();
        if deltas.is_empty() {
            return;
        }
        deltas.sort_by(|a, b| b.start.cmp(&a.start));
        let event = self.new_event(target, EventKind::Replace, deltas);
        self.execute(target, event);
    }

    fn execute(&mut self, target: &mut EditTarget<'_>, mut event: TextEvent) {
        self.do_text_event(target, &mut event, true);
        self.undo.push(event);
        self.redo.clear();
    }

    fn do_text_event(&mut self, target: &mut EditTarget<'_>, event: &mut TextEvent, use_undo: bool) {
        let shifts = execute_text_event(event, target.lines, target.modified);
        tracing::trace!(
            kind = ?event.kind,
            records = event.deltas.len(),
            "applied text event"
        );

        let ctx = CursorContext::new(target.lines, target.tab_size);
        for view in target.views.values_mut() {
            for cursor in view.cursors.cursors_mut() {
                for shift in &shifts {
                    cursor.loc = shift.apply(cursor.loc);
                    for pos in cursor
                        .cur_selection
                        .iter_mut()
                        .chain(cursor.orig_selection.iter_mut())
                    {
                        *pos = shift.apply(*pos);
                    }
                }
                cursor.relocate(&ctx);
                cursor.store_visual_x(&ctx);
            }
        }

        if use_undo {
            self.update_trailing_ws(target, event);
        }
    }

    /// Track whether the last edit left trailing whitespace on the active cursor's line.
    fn update_trailing_ws(&self, target: &mut EditTarget<'_>, event: &TextEvent) {
        let [delta] = event.deltas.as_slice() else {
            return;
        };
        let lines: &LineArray = target.lines;
        let Some(view) = target.views.get_mut(&target.view) else {
            return;
        };
        let c = view.cursors.active_mut();
        let (text, start, end) = (&delta.text, delta.start, delta.end);
        let is_eol = |loc: Position| loc.column == lines.character_count(loc.line);

        match event.kind {
            EventKind::Insert if c.loc == end && is_eol(end) => {
                let mut added_after_ws = false;
                let mut added_ws_only = false;
                let added_trailing_ws = if start.line == end.line {
                    added_ws_only = is_bytes_whitespace(text);
                    added_after_ws = start.column > 0
                        && is_whitespace(lines.rune_at(Position::new(start.line, start.column - 1)));
                    has_trailing_whitespace(text)
                } else {
                    let tail = match text.iter().rposition(|&b| b == b'\n') {
                        Some(i) => &text[i + 1..],
                        None => &text[..],
                    };
                    has_trailing_whitespace(tail)
                };
                if added_trailing_ws && !(added_after_ws && added_ws_only) {
                    c.new_trailing_ws_y = Some(c.loc.line);
                } else if !added_trailing_ws {
                    c.new_trailing_ws_y = None;
                }
            }
            EventKind::Remove if c.loc == start && is_eol(start) => {
                let removed_after_ws = has_trailing_whitespace(lines.line_bytes(start.line));
                let removed_ws_only = if start.line == end.line {
                    is_bytes_whitespace(text)
                } else {
                    let head = match text.iter().position(|&b| b == b'\n') {
                        Some(i) => &text[..i],
                        None => &text[..],
                    };
                    is_bytes_whitespace(head)
                };
                if removed_after_ws && !removed_ws_only {
                    c.new_trailing_ws_y = Some(c.loc.line);
                } else if !removed_after_ws {
                    c.new_trailing_ws_y = None;
                }
            }
            _ => {
                let Some(ws_line) = c.new_trailing_ws_y else {
                    return;
                };
                let lines_delta = end.line - start.line;
                let follows = match event.kind {
                    EventKind::Insert => c.loc.line == ws_line + lines_delta,
                    EventKind::Remove => ws_line.checked_sub(lines_delta) == Some(c.loc.line),
                    EventKind::Replace => false,
                };
                if start.line != end.line && c.loc > start && follows {
                    c.new_trailing_ws_y = Some(c.loc.line);
                }
            }
        }
    }

    /// Undo the newest group of events. Returns the number of events undone.
    pub(crate) fn undo(&mut self, target: &mut EditTarget<'_>) -> usize {
        let Some(bucket) = self.undo.peek().map(TextEvent::bucket) else {
            return 0;
        };
        let mut count = 0;
        while self.undo.peek().is_some_and(|e| e.bucket() == bucket) {
            self.undo_one(target);
            count += 1;
        }
        tracing::debug!(count, bucket, "undo");
        count
    }

    /// Redo the oldest undone group of events. Returns the number of events redone.
    pub(crate) fn redo(&mut self, target: &mut EditTarget<'_>) -> usize {
        let Some(bucket) = self.redo.peek().map(TextEvent::bucket) else {
            return 0;
        };
        let mut count = 0;
        while self.redo.peek().is_some_and(|e| e.bucket() == bucket) {
            self.redo_one(target);
            count += 1;
        }
        tracing::debug!(count, bucket, "redo");
        count
    }

    fn undo_one(&mut self, target: &mut EditTarget<'_>) {
        let Some(mut event) = self.undo.pop() else {
            return;
        };
        event.kind = event.kind.inverted();
        self.do_text_event(target, &mut event, false);
        restore_cursor(target, &mut event);
        self.redo.push(event);
    }

    fn redo_one(&mut self, target: &mut EditTarget<'_>) {
        let Some(mut event) = self.redo.pop() else {
            return;
        };
        restore_cursor(target, &mut event);
        event.kind = event.kind.inverted();
        self.do_text_event(target, &mut event, false);
        self.undo.push(event);
    }
}

/// Swap the event's cursor snapshot with the replaying view's cursor of the same ordinal.
fn restore_cursor(target: &mut EditTarget<'_>, event: &mut TextEvent) {
    let ctx = CursorContext::new(target.lines, target.tab_size);
    let Some(view) = target.views.get_mut(&target.view) else {
        return;
    };
    let Some(cursor) = view.cursors.get_mut(event.cursor.num) else {
        return;
    };
    let snapshot = std::mem::replace(&mut event.cursor, cursor.clone());
    cursor.goto(&snapshot);
    cursor.new_trailing_ws_y = snapshot.new_trailing_ws_y;
    cursor.relocate(&ctx);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cursor_set::CursorSet;

    struct Fixture {
        lines: LineArray,
        views: BTreeMap<ViewId, ViewState>,
        view: ViewId,
        modified: Vec<ModifiedRange>,
        handler: EventHandler,
        clock: ManualClock,
    }

    impl Fixture {
        fn new(text: &str) -> Self {
            let lines = LineArray::from_text(text);
            let view = ViewId::next();
            let mut views = BTreeMap::new();
            let ctx = CursorContext::new(&lines, 4);
            views.insert(view, ViewState::new(CursorSet::new(Position::default(), &ctx)));
            let clock = ManualClock::new(10_000);
            let handler = EventHandler::with_clock(Arc::new(clock.clone()));
            Self {
                lines,
                views,
                view,
                modified: Vec::new(),
                handler,
                clock,
            }
        }

        fn run<R>(&mut self, f: impl FnOnce(&mut EventHandler, &mut EditTarget<'_>) -> R) -> R {
            let mut target = EditTarget {
                lines: &mut self.lines,
                views: &mut self.views,
                view: self.view,
                tab_size: 4,
                modified: &mut self.modified,
            };
            f(&mut self.handler, &mut target)
        }

        fn text(&self) -> String {
            String::from_utf8(self.lines.bytes()).unwrap()
        }

        fn cursor(&self) -> &Cursor {
            self.views[&self.view].cursors.active()
        }

        fn cursor_mut(&mut self) -> &mut Cursor {
            self.views.get_mut(&self.view).unwrap().cursors.active_mut()
        }
    }

    #[test]
    fn test_shift_rules() {
        let shift = Shift {
            start: Position::new(1, 2),
            old_end: Position::new(1, 2),
            new_end: Position::new(2, 3),
        };
        assert_eq!(shift.apply(Position::new(1, 1)), Position::new(1, 1));
        assert_eq!(shift.apply(Position::new(1, 2)), Position::new(2, 3));
        assert_eq!(shift.apply(Position::new(1, 5)), Position::new(2, 6));
        assert_eq!(shift.apply(Position::new(3, 4)), Position::new(4, 4));

        let removal = Shift {
            start: Position::new(0, 1),
            old_end: Position::new(2, 2),
            new_end: Position::new(0, 1),
        };
        assert_eq!(removal.apply(Position::new(1, 0)), Position::new(0, 1));
        assert_eq!(removal.apply(Position::new(2, 4)), Position::new(0, 3));
        assert_eq!(removal.apply(Position::new(5, 4)), Position::new(3, 4));
    }

    #[test]
    fn test_end_of_insert_shapes() {
        assert_eq!(end_of_insert(Position::new(0, 2), b"abc"), Position::new(0, 5));
        assert_eq!(end_of_insert(Position::new(3, 2), b"a\nbc\nd"), Position::new(5, 1));
        assert_eq!(end_of_insert(Position::new(3, 2), b"a\n"), Position::new(4, 0));
    }

    #[test]
    fn test_empty_edits_are_noops() {
        let mut fx = Fixture::new("abc");
        fx.run(|h, t| {
            h.insert(t, Position::new(0, 1), b"");
            h.remove(t, Position::new(0, 1), Position::new(0, 1));
            h.multiple_replace(t, vec![Delta::new("", Position::new(0, 2), Position::new(0, 2))]);
        });
        assert_eq!(fx.text(), "abc");
        assert!(!fx.handler.can_undo());
        assert!(fx.modified.is_empty());
    }

    #[test]
    fn test_remove_captures_text_and_orders_endpoints() {
        let mut fx = Fixture::new("a\nb\nc");
        fx.run(|h, t| h.remove(t, Position::new(2, 0), Position::new(0, 0)));
        assert_eq!(fx.text(), "c");
        let event = fx.handler.undo_stack().peek().unwrap();
        assert_eq!(event.deltas[0].text, b"a\nb\n");
    }

    #[test]
    fn test_replace_event_inverts() {
        let mut fx = Fixture::new("abc");
        fx.run(|h, t| {
            h.multiple_replace(t, vec![Delta::new("XY", Position::new(0, 0), Position::new(0, 1))])
        });
        assert_eq!(fx.text(), "XYbc");
        assert_eq!(fx.run(|h, t| h.undo(t)), 1);
        assert_eq!(fx.text(), "abc");
        assert_eq!(fx.run(|h, t| h.redo(t)), 1);
        assert_eq!(fx.text(), "XYbc");
    }

    #[test]
    fn test_inserted_mark_undoes_byte_exact() {
        let mut fx = Fixture::new("ex");
        fx.cursor_mut().loc = Position::new(0, 2);
        fx.run(|h, t| h.insert(t, Position::new(0, 1), "\u{301}".as_bytes()));
        assert_eq!(fx.text(), "e\u{301}x");
        assert_eq!(fx.lines.character_count(0), 2);
        assert_eq!(fx.cursor().loc, Position::new(0, 2));

        assert_eq!(fx.run(|h, t| h.undo(t)), 1);
        assert_eq!(fx.text(), "ex");
        assert_eq!(fx.run(|h, t| h.redo(t)), 1);
        assert_eq!(fx.text(), "e\u{301}x");
    }

    #[test]
    fn test_join_onto_leading_mark_undoes_byte_exact() {
        let mut fx = Fixture::new("x\n\u{301}y");
        fx.run(|h, t| h.remove(t, Position::new(0, 1), Position::new(1, 0)));
        assert_eq!(fx.text(), "x\u{301}y");
        fx.run(|h, t| h.undo(t));
        assert_eq!(fx.text(), "x\n\u{301}y");

        fx.run(|h, t| h.insert(t, Position::new(1, 0), b"z"));
        assert_eq!(fx.text(), "x\nz\u{301}y");
        fx.run(|h, t| h.undo(t));
        assert_eq!(fx.text(), "x\n\u{301}y");
    }

    #[test]
    fn test_multiple_replace_on_one_line() {
        let mut fx = Fixture::new("foo bar foo");
        fx.run(|h, t| {
            h.multiple_replace(
                t,
                vec![
                    Delta::new("x", Position::new(0, 0), Position::new(0, 3)),
                    Delta::new("yy\nz", Position::new(0, 8), Position::new(0, 11)),
                ],
            )
        });
        assert_eq!(fx.text(), "x bar yy\nz");
        fx.run(|h, t| h.undo(t));
        assert_eq!(fx.text(), "foo bar foo");
        fx.run(|h, t| h.redo(t));
        assert_eq!(fx.text(), "x bar yy\nz");
    }

    #[test]
    fn test_undo_groups_by_bucket() {
        let mut fx = Fixture::new("");
        fx.clock.set(20_100);
        fx.run(|h, t| h.insert(t, Position::new(0, 0), b"a"));
        fx.clock.set(20_600);
        fx.run(|h, t| h.insert(t, Position::new(0, 1), b"b"));
        fx.clock.set(21_050);
        fx.run(|h, t| h.insert(t, Position::new(0, 2), b"c"));

        assert_eq!(fx.run(|h, t| h.undo(t)), 1);
        assert_eq!(fx.text(), "ab");
        assert_eq!(fx.run(|h, t| h.undo(t)), 2);
        assert_eq!(fx.text(), "");
        assert_eq!(fx.run(|h, t| h.undo(t)), 0);

        assert_eq!(fx.run(|h, t| h.redo(t)), 2);
        assert_eq!(fx.text(), "ab");
        assert_eq!(fx.run(|h, t| h.redo(t)), 1);
        assert_eq!(fx.text(), "abc");
    }

    #[test]
    fn test_new_edit_clears_redo() {
        let mut fx = Fixture::new("");
        fx.run(|h, t| h.insert(t, Position::new(0, 0), b"a"));
        fx.run(|h, t| h.undo(t));
        assert!(fx.handler.can_redo());
        fx.run(|h, t| h.insert(t, Position::new(0, 0), b"b"));
        assert!(!fx.handler.can_redo());
    }

    #[test]
    fn test_undo_restores_issuing_cursor() {
        let mut fx = Fixture::new("hello");
        fx.cursor_mut().loc = Position::new(0, 5);
        fx.run(|h, t| h.insert(t, Position::new(0, 5), b" world"));
        assert_eq!(fx.cursor().loc, Position::new(0, 11));
        fx.cursor_mut().loc = Position::new(0, 0);
        fx.run(|h, t| h.undo(t));
        assert_eq!(fx.cursor().loc, Position::new(0, 5));
    }

    #[test]
    fn test_missing_ordinal_skips_restore() {
        let mut fx = Fixture::new("abc");
        fx.cursor_mut().num = 3;
        fx.run(|h, t| h.insert(t, Position::new(0, 0), b"x"));
        fx.cursor_mut().num = 0;
        fx.cursor_mut().loc = Position::new(0, 2);
        fx.run(|h, t| h.undo(t));
        assert_eq!(fx.text(), "abc");
        // Shifted by the removal of "x", never restored.
        assert_eq!(fx.cursor().loc, Position::new(0, 1));
    }

    #[test]
    fn test_trailing_whitespace_hint() {
        let mut fx = Fixture::new("abc");
        fx.cursor_mut().loc = Position::new(0, 3);
        fx.run(|h, t| h.insert(t, Position::new(0, 3), b" "));
        assert_eq!(fx.cursor().new_trailing_ws_y, Some(0));
        fx.run(|h, t| h.insert(t, Position::new(0, 4), b"d"));
        assert_eq!(fx.cursor().new_trailing_ws_y, None);
    }

    #[test]
    fn test_modified_ranges_are_clamped() {
        let mut fx = Fixture::new("a\nb\nc");
        fx.run(|h, t| h.remove(t, Position::new(1, 0), Position::new(2, 1)));
        assert_eq!(
            fx.modified,
            vec![ModifiedRange {
                start_line: 1,
                end_line: 1
            }]
        );
    }
}
