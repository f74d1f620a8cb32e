//! Location arithmetic.
//!
//! A [`Position`] addresses text by logical line and character column. Ordering is by line, then
//! column. Movement across line boundaries is done one character at a time against a
//! [`LineArray`], so `move_by(n)` costs O(n) line scans; runs are short in practice and no
//! persistent index is kept.

use crate::line_array::LineArray;
use crate::text::{character_count, rune_to_byte_index};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Position coordinates (line and column numbers)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Position {
    /// Zero-based logical line index.
    pub line: usize,
    /// Zero-based column in characters within the logical line.
    pub column: usize,
}

impl Position {
    /// Create a new logical position.
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }

    /// One character to the right, wrapping onto the next line.
    ///
    /// At (or past) the end of the buffer this saturates at the one-past-end sentinel
    /// `(end.line, end.column + 1)`.
    pub(crate) fn right(self, lines: &LineArray) -> Position {
        let end = lines.end();
        if self >= end {
            return Position::new(end.line, end.column + 1);
        }
        if self.column < character_count(lines.line_bytes(self.line)) {
            Position::new(self.line, self.column + 1)
        } else {
            Position::new(self.line + 1, 0)
        }
    }

    /// One character to the left, wrapping onto the end of the previous line.
    ///
    /// Saturates at the buffer start.
    pub(crate) fn left(self, lines: &LineArray) -> Position {
        if self <= lines.start() {
            return lines.start();
        }
        if self.column > 0 {
            Position::new(self.line, self.column - 1)
        } else {
            let prev = self.line - 1;
            Position::new(prev, character_count(lines.line_bytes(prev)))
        }
    }

    /// Advance (`n > 0`) or retreat (`n < 0`) by `n` characters, crossing line boundaries.
    /// A line break counts as one character.
    pub fn move_by(self, n: isize, lines: &LineArray) -> Position {
        let mut pos = self;
        if n > 0 {
            for _ in 0..n {
                pos = pos.right(lines);
            }
        } else {
            for _ in 0..n.unsigned_abs() {
                pos = pos.left(lines);
            }
        }
        pos
    }

    /// Number of characters between `self` and `other`, counting each line break as one.
    /// The result is direction-agnostic.
    pub fn diff(self, other: Position, lines: &LineArray) -> usize {
        let (a, b) = if other < self {
            (other, self)
        } else {
            (self, other)
        };
        if a.line == b.line {
            return b.column - a.column;
        }
        let middle: usize = (a.line + 1..b.line)
            .map(|line| character_count(lines.line_bytes(line)) + 1)
            .sum();
        let first = character_count(lines.line_bytes(a.line)).saturating_sub(a.column) + 1;
        middle + first + b.column
    }

    /// Constrain to the buffer: positions at or past the end become the end, and the column is
    /// clamped to the length of its line.
    pub fn clamp(self, lines: &LineArray) -> Position {
        let end = lines.end();
        if self >= end {
            return end;
        }
        let len = character_count(lines.line_bytes(self.line));
        Position::new(self.line, self.column.min(len))
    }

    /// Byte offset of the (clamped) position in the buffer text, counting each line break as a
    /// single byte whatever the line-ending format.
    pub fn byte_offset(self, lines: &LineArray) -> usize {
        let pos = self.clamp(lines);
        let before: usize = (0..pos.line).map(|n| lines.line_bytes(n).len() + 1).sum();
        before + rune_to_byte_index(pos.column, lines.line_bytes(pos.line))
    }
}

impl Ord for Position {
    fn cmp(&self, other: &Self) -> Ordering {
        self.line
            .cmp(&other.line)
            .then_with(|| self.column.cmp(&other.column))
    }
}

impl PartialOrd for Position {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(text: &str) -> LineArray {
        LineArray::from_text(text)
    }

    #[test]
    fn test_ordering_is_line_major() {
        assert!(Position::new(0, 5) < Position::new(1, 0));
        assert!(Position::new(1, 1) > Position::new(1, 0));
        assert_eq!(
            Position::new(2, 3).cmp(&Position::new(2, 3)),
            Ordering::Equal
        );
    }

    #[test]
    fn test_byte_offset_counts_bytes_and_breaks() {
        let la = LineArray::from_text("h\u{e9}\r\ne\u{301}x");
        assert_eq!(Position::new(0, 0).byte_offset(&la), 0);
        assert_eq!(Position::new(0, 2).byte_offset(&la), 3);
        assert_eq!(Position::new(1, 0).byte_offset(&la), 4);
        assert_eq!(Position::new(1, 1).byte_offset(&la), 7);
        assert_eq!(Position::new(9, 9).byte_offset(&la), 8);
    }

    #[test]
    fn test_move_by_crosses_line_breaks() {
        let la = lines("ab\ncd");
        assert_eq!(Position::new(0, 1).move_by(2, &la), Position::new(1, 0));
        assert_eq!(Position::new(1, 0).move_by(-1, &la), Position::new(0, 2));
        assert_eq!(Position::new(1, 1).move_by(-4, &la), Position::new(0, 0));
    }

    #[test]
    fn test_move_by_saturates_at_both_ends() {
        let la = lines("ab\ncd");
        assert_eq!(Position::new(0, 0).move_by(-3, &la), Position::new(0, 0));
        assert_eq!(Position::new(1, 1).move_by(10, &la), Position::new(1, 3));
        assert_eq!(Position::new(1, 3).move_by(-1, &la), Position::new(1, 2));
    }

    #[test]
    fn test_diff_counts_line_breaks() {
        let la = lines("abc\nde\nf");
        assert_eq!(Position::new(0, 1).diff(Position::new(0, 3), &la), 2);
        assert_eq!(Position::new(0, 1).diff(Position::new(2, 1), &la), 7);
        assert_eq!(Position::new(2, 1).diff(Position::new(0, 1), &la), 7);
    }

    #[test]
    fn test_clamp() {
        let la = lines("abc\nde");
        assert_eq!(Position::new(5, 9).clamp(&la), Position::new(1, 2));
        assert_eq!(Position::new(0, 9).clamp(&la), Position::new(0, 3));
        assert_eq!(Position::new(1, 1).clamp(&la), Position::new(1, 1));
    }
}
