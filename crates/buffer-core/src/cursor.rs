//! Cursor and selection model.
//!
//! A [`Cursor`] is plain data: a caret, a remembered visual column for vertical movement, the
//! current selection and the anchor selection used when extending it. Operations that need the
//! text take a [`CursorContext`] (the line store plus the tab size for visual columns).
//!
//! Operations that mutate text (deleting or copying a selection) live on [`crate::Buffer`], since
//! they go through the edit engine.

use crate::line_array::LineArray;
use crate::loc::Position;
use crate::text::{char_pos_in_line, is_whitespace, is_word_char, string_width};
use serde::{Deserialize, Serialize};

/// Read access a cursor needs to move: the text and the tab size for visual columns.
#[derive(Debug, Clone, Copy)]
pub struct CursorContext<'a> {
    /// The line store.
    pub lines: &'a LineArray,
    /// Tab width in cells.
    pub tab_size: usize,
}

impl<'a> CursorContext<'a> {
    /// Bundle a line store and a tab size.
    pub fn new(lines: &'a LineArray, tab_size: usize) -> Self {
        Self { lines, tab_size }
    }

    fn line_len(&self, line: usize) -> usize {
        self.lines.character_count(line)
    }

    fn in_bounds(&self, pos: Position) -> bool {
        pos.line < self.lines.line_count() && pos.column <= self.line_len(pos.line)
    }
}

/// Cursor movement and selection commands, applied with [`Cursor::apply`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorCommand {
    /// One character left (no-op at buffer start).
    Left,
    /// One character right (no-op at buffer end).
    Right,
    /// One line up, keeping the visual column.
    Up,
    /// One line down, keeping the visual column.
    Down,
    /// `n` lines up.
    UpN(usize),
    /// `n` lines down.
    DownN(usize),
    /// Start of the previous word.
    WordLeft,
    /// End of the next word.
    WordRight,
    /// Column 0.
    Start,
    /// End of line.
    End,
    /// First non-whitespace character of the line.
    StartOfText,
    /// Select the word under the caret (or one punctuation character).
    SelectWord,
    /// Select the whole line including its terminator.
    SelectLine,
    /// Extend the selection from the anchor to a position.
    SelectTo(Position),
    /// Grow the anchored word selection to include the word at the caret.
    AddWordToSelection,
    /// Grow the anchored line selection to include the caret's line.
    AddLineToSelection,
    /// Drop the selection, leaving the caret at its start (`true`) or end (`false`).
    Deselect {
        /// Whether the caret goes to the selection start.
        to_start: bool,
    },
    /// Collapse the selection to the buffer start.
    ResetSelection,
    /// Move the caret to a position (clamped).
    Goto(Position),
}

/// Caret plus selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cursor {
    /// Caret location.
    pub loc: Position,
    /// Visual column remembered for vertical movement.
    pub last_visual_x: usize,
    /// Current selection endpoints (unordered).
    pub cur_selection: [Position; 2],
    /// Anchor selection used when extending.
    pub orig_selection: [Position; 2],
    /// Line on which the last edit introduced trailing whitespace, if any.
    pub new_trailing_ws_y: Option<usize>,
    /// Ordinal within the owning cursor collection.
    pub num: usize,
}

impl Cursor {
    /// Create a cursor at `loc` and remember its visual column.
    pub fn new(loc: Position, ctx: &CursorContext<'_>) -> Self {
        let mut cursor = Self {
            loc,
            last_visual_x: 0,
            cur_selection: [Position::default(); 2],
            orig_selection: [Position::default(); 2],
            new_trailing_ws_y: None,
            num: 0,
        };
        cursor.relocate(ctx);
        cursor.store_visual_x(ctx);
        cursor
    }

    /// Copy location, visual column and selections from another cursor.
    pub fn goto(&mut self, other: &Cursor) {
        self.loc = other.loc;
        self.last_visual_x = other.last_visual_x;
        self.cur_selection = other.cur_selection;
        self.orig_selection = other.orig_selection;
    }

    /// Move the caret to `pos` and remember its visual column.
    pub fn goto_loc(&mut self, pos: Position, ctx: &CursorContext<'_>) {
        self.loc = pos.clamp(ctx.lines);
        self.store_visual_x(ctx);
    }

    /// Visual column of the caret.
    pub fn visual_x(&self, ctx: &CursorContext<'_>) -> usize {
        string_width(ctx.lines.line_bytes(self.loc.line), self.loc.column, ctx.tab_size)
    }

    /// Remember the current visual column.
    pub fn store_visual_x(&mut self, ctx: &CursorContext<'_>) {
        self.last_visual_x = self.visual_x(ctx);
    }

    /// Clamp the caret into the buffer.
    pub fn relocate(&mut self, ctx: &CursorContext<'_>) {
        let last = ctx.lines.line_count() - 1;
        self.loc.line = self.loc.line.min(last);
        self.loc.column = self.loc.column.min(ctx.line_len(self.loc.line));
    }

    /// Base character at column `x` of the caret's line; `'\n'` past the end.
    pub fn rune_under(&self, x: usize, ctx: &CursorContext<'_>) -> char {
        ctx.lines.rune_at(Position::new(self.loc.line, x))
    }

    /// Apply a movement or selection command.
    pub fn apply(&mut self, command: CursorCommand, ctx: &CursorContext<'_>) {
        match command {
            CursorCommand::Left => self.left(ctx),
            CursorCommand::Right => self.right(ctx),
            CursorCommand::Up => self.up(ctx),
            CursorCommand::Down => self.down(ctx),
            CursorCommand::UpN(n) => self.up_n(isize::try_from(n).unwrap_or(isize::MAX), ctx),
            CursorCommand::DownN(n) => self.down_n(isize::try_from(n).unwrap_or(isize::MAX), ctx),
            CursorCommand::WordLeft => self.word_left(ctx),
            CursorCommand::WordRight => self.word_right(ctx),
            CursorCommand::Start => self.start(ctx),
            CursorCommand::End => self.end(ctx),
            CursorCommand::StartOfText => self.start_of_text(ctx),
            CursorCommand::SelectWord => self.select_word(ctx),
            CursorCommand::SelectLine => self.select_line(ctx),
            CursorCommand::SelectTo(pos) => self.select_to(pos),
            CursorCommand::AddWordToSelection => self.add_word_to_selection(ctx),
            CursorCommand::AddLineToSelection => self.add_line_to_selection(ctx),
            CursorCommand::Deselect { to_start } => self.deselect(to_start, ctx),
            CursorCommand::ResetSelection => self.reset_selection(),
            CursorCommand::Goto(pos) => self.goto_loc(pos, ctx),
        }
    }

    /// Column 0.
    pub fn start(&mut self, ctx: &CursorContext<'_>) {
        self.loc.column = 0;
        self.store_visual_x(ctx);
    }

    /// End of line.
    pub fn end(&mut self, ctx: &CursorContext<'_>) {
        self.loc.column = ctx.line_len(self.loc.line);
        self.store_visual_x(ctx);
    }

    /// First non-whitespace character of the line (or end of line).
    pub fn start_of_text(&mut self, ctx: &CursorContext<'_>) {
        self.start(ctx);
        let len = ctx.line_len(self.loc.line);
        while self.loc.column < len && is_whitespace(self.rune_under(self.loc.column, ctx)) {
            self.loc.column += 1;
        }
        self.store_visual_x(ctx);
    }

    /// Returns `true` if the caret is at the first non-whitespace character.
    pub fn is_start_of_text(&self, ctx: &CursorContext<'_>) -> bool {
        let len = ctx.line_len(self.loc.line);
        let mut x = 0;
        while x < len && is_whitespace(self.rune_under(x, ctx)) {
            x += 1;
        }
        self.loc.column == x
    }

    /// Collapse the selection to the buffer start.
    pub fn reset_selection(&mut self) {
        self.cur_selection = [Position::default(); 2];
    }

    /// Set the first selection endpoint.
    pub fn set_selection_start(&mut self, pos: Position) {
        self.cur_selection[0] = pos;
    }

    /// Set the second selection endpoint.
    pub fn set_selection_end(&mut self, pos: Position) {
        self.cur_selection[1] = pos;
    }

    /// Returns `true` when the selection endpoints differ.
    pub fn has_selection(&self) -> bool {
        self.cur_selection[0] != self.cur_selection[1]
    }

    /// Selection endpoints in document order.
    pub fn selection_range(&self) -> (Position, Position) {
        let [a, b] = self.cur_selection;
        if a > b { (b, a) } else { (a, b) }
    }

    /// Bytes covered by the selection; empty when an endpoint is out of bounds.
    pub fn selection_bytes(&self, ctx: &CursorContext<'_>) -> Vec<u8> {
        let [a, b] = self.cur_selection;
        if !ctx.in_bounds(a) || !ctx.in_bounds(b) {
            return Vec::new();
        }
        let (start, end) = self.selection_range();
        ctx.lines.substr(start, end)
    }

    /// Drop the selection, leaving the caret at its start or just before its end.
    pub fn deselect(&mut self, to_start: bool, ctx: &CursorContext<'_>) {
        if !self.has_selection() {
            return;
        }
        self.loc = if to_start {
            self.cur_selection[0]
        } else {
            self.cur_selection[1].move_by(-1, ctx.lines)
        };
        self.reset_selection();
        self.store_visual_x(ctx);
    }

    /// Select the caret's line, including its line break unless it is the last line.
    pub fn select_line(&mut self, ctx: &CursorContext<'_>) {
        self.start(ctx);
        self.set_selection_start(self.loc);
        self.end(ctx);
        if self.loc.line + 1 < ctx.lines.line_count() {
            self.set_selection_end(self.loc.move_by(1, ctx.lines));
        } else {
            self.set_selection_end(self.loc);
        }
        self.orig_selection = self.cur_selection;
    }

    /// Extend a line selection anchored by [`CursorCommand::SelectLine`] to the caret's line.
    pub fn add_line_to_selection(&mut self, ctx: &CursorContext<'_>) {
        let [anchor_start, anchor_end] = self.orig_selection;
        if self.loc < anchor_start {
            self.start(ctx);
            self.set_selection_start(self.loc);
            self.set_selection_end(anchor_end);
        }
        if self.loc > anchor_end {
            self.end(ctx);
            self.set_selection_end(self.loc.move_by(1, ctx.lines));
            self.set_selection_start(anchor_start);
        }
        if self.loc < anchor_end && self.loc > anchor_start {
            self.cur_selection = self.orig_selection;
        }
    }

    /// Move `amount` lines up (negative moves down), keeping the remembered visual column.
    ///
    /// Moving up from the first line goes to column 0; moving down from the last line goes to
    /// the end of the line.
    pub fn up_n(&mut self, amount: isize, ctx: &CursorContext<'_>) {
        let last = (ctx.lines.line_count() - 1) as isize;
        let proposed = (self.loc.line as isize).saturating_sub(amount).clamp(0, last) as usize;
        let bytes = ctx.lines.line_bytes(proposed);
        let len = ctx.line_len(proposed);
        let stuck = proposed == self.loc.line;

        self.loc.line = proposed;
        self.loc.column = char_pos_in_line(bytes, self.last_visual_x, ctx.tab_size);
        if self.loc.column > len || (amount < 0 && stuck) {
            self.loc.column = len;
            self.store_visual_x(ctx);
        }
        if amount > 0 && stuck {
            self.loc.column = 0;
            self.store_visual_x(ctx);
        }
    }

    /// Move `amount` lines down.
    pub fn down_n(&mut self, amount: isize, ctx: &CursorContext<'_>) {
        self.up_n(amount.saturating_neg(), ctx);
    }

    /// One line up.
    pub fn up(&mut self, ctx: &CursorContext<'_>) {
        self.up_n(1, ctx);
    }

    /// One line down.
    pub fn down(&mut self, ctx: &CursorContext<'_>) {
        self.down_n(1, ctx);
    }

    /// One character left, wrapping to the end of the previous line.
    pub fn left(&mut self, ctx: &CursorContext<'_>) {
        if self.loc == ctx.lines.start() {
            return;
        }
        if self.loc.column > 0 {
            self.loc.column -= 1;
        } else {
            self.loc.line -= 1;
            self.loc.column = ctx.line_len(self.loc.line);
        }
        self.store_visual_x(ctx);
    }

    /// One character right, wrapping to the start of the next line.
    pub fn right(&mut self, ctx: &CursorContext<'_>) {
        if self.loc == ctx.lines.end() {
            return;
        }
        if self.loc.column < ctx.line_len(self.loc.line) {
            self.loc.column += 1;
        } else {
            self.loc.line += 1;
            self.loc.column = 0;
        }
        self.store_visual_x(ctx);
    }

    fn word_start(&self, ctx: &CursorContext<'_>) -> usize {
        let mut backward = self.loc.column;
        while backward > 0 && is_word_char(self.rune_under(backward - 1, ctx)) {
            backward -= 1;
        }
        backward
    }

    /// Column of the last word character of the run containing the caret.
    fn word_last(&self, ctx: &CursorContext<'_>) -> usize {
        let mut forward = self.loc.column;
        let last = ctx.line_len(self.loc.line).saturating_sub(1);
        while forward < last && is_word_char(self.rune_under(forward + 1, ctx)) {
            forward += 1;
        }
        forward
    }

    /// Select the word under the caret, or the single character there if it is not a word
    /// character.
    pub fn select_word(&mut self, ctx: &CursorContext<'_>) {
        if ctx.lines.line_bytes(self.loc.line).is_empty() {
            return;
        }
        if !is_word_char(self.rune_under(self.loc.column, ctx)) {
            self.set_selection_start(self.loc);
            self.set_selection_end(self.loc.move_by(1, ctx.lines));
            self.orig_selection = self.cur_selection;
            return;
        }

        let line = self.loc.line;
        self.set_selection_start(Position::new(line, self.word_start(ctx)));
        self.orig_selection[0] = self.cur_selection[0];
        let end = Position::new(line, self.word_last(ctx)).move_by(1, ctx.lines);
        self.set_selection_end(end);
        self.orig_selection[1] = self.cur_selection[1];
        self.loc = self.cur_selection[1];
    }

    /// Extend a word selection anchored by [`CursorCommand::SelectWord`] to the word at the caret.
    pub fn add_word_to_selection(&mut self, ctx: &CursorContext<'_>) {
        let [anchor_start, anchor_end] = self.orig_selection;
        if self.loc > anchor_start && self.loc < anchor_end {
            self.cur_selection = self.orig_selection;
            return;
        }
        if self.loc < anchor_start {
            self.set_selection_start(Position::new(self.loc.line, self.word_start(ctx)));
            self.set_selection_end(anchor_end);
        }
        if self.loc > anchor_end {
            let end = Position::new(self.loc.line, self.word_last(ctx)).move_by(1, ctx.lines);
            self.set_selection_end(end);
            self.set_selection_start(anchor_start);
        }
        self.loc = self.cur_selection[1];
    }

    /// Select from the anchor to `pos`.
    pub fn select_to(&mut self, pos: Position) {
        let anchor = self.orig_selection[0];
        if pos > anchor {
            self.set_selection_start(anchor);
            self.set_selection_end(pos);
        } else {
            self.set_selection_start(pos);
            self.set_selection_end(anchor);
        }
    }

    /// Skip whitespace, then a run of word characters.
    pub fn word_right(&mut self, ctx: &CursorContext<'_>) {
        while is_whitespace(self.rune_under(self.loc.column, ctx)) {
            if self.loc.column == ctx.line_len(self.loc.line) {
                self.right(ctx);
                return;
            }
            self.right(ctx);
        }
        self.right(ctx);
        while is_word_char(self.rune_under(self.loc.column, ctx)) {
            if self.loc.column == ctx.line_len(self.loc.line) {
                return;
            }
            self.right(ctx);
        }
    }

    /// Skip whitespace backwards, then a run of word characters.
    pub fn word_left(&mut self, ctx: &CursorContext<'_>) {
        self.left(ctx);
        while is_whitespace(self.rune_under(self.loc.column, ctx)) {
            if self.loc.column == 0 {
                return;
            }
            self.left(ctx);
        }
        self.left(ctx);
        while is_word_char(self.rune_under(self.loc.column, ctx)) {
            if self.loc.column == 0 {
                return;
            }
            self.left(ctx);
        }
        self.right(ctx);
    }
}
