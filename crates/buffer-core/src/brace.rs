//! Bracket matching over a [`LineArray`].
//!
//! Columns are character columns, so a brace followed by combining marks still matches.

use crate::line_array::LineArray;
use crate::loc::Position;
use crate::text::characters;

/// Bracket pairs an editor checks for a match, as `(open, close)`.
pub const BRACE_PAIRS: [(char, char); 3] = [('(', ')'), ('{', '}'), ('[', ']')];

/// A brace found by [`find_matching_brace`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BraceMatch {
    /// Location of the matching brace.
    pub loc: Position,
    /// `true` when the brace that was matched sits left of the start position rather than
    /// under it.
    pub left: bool,
}

fn line_chars(lines: &LineArray, n: usize) -> Vec<char> {
    characters(lines.line_bytes(n)).map(|(c, _)| c).collect()
}

/// Find the brace matching the one under `start`, or the one just left of it.
///
/// An opening brace under `start` is preferred. An opening brace to its left is used unless a
/// closing brace sits under `start`. Nesting of the same pair is honored; other pairs are
/// ignored.
pub fn find_matching_brace(
    lines: &LineArray,
    (open, close): (char, char),
    start: Position,
) -> Option<BraceMatch> {
    let start = start.clamp(lines);
    let current = line_chars(lines, start.line);
    let under = current.get(start.column).copied();
    let left_of = start
        .column
        .checked_sub(1)
        .and_then(|x| current.get(x).copied());

    if under == Some(open) || (left_of == Some(open) && under != Some(close)) {
        let left = under != Some(open);
        let from = if left { start.column - 1 } else { start.column };
        let mut depth = 0usize;
        for y in start.line..lines.line_count() {
            let other;
            let chars: &[char] = if y == start.line {
                &current
            } else {
                other = line_chars(lines, y);
                &other
            };
            let skip = if y == start.line { from } else { 0 };
            for (x, &c) in chars.iter().enumerate().skip(skip) {
                if c == open {
                    depth += 1;
                } else if c == close {
                    depth -= 1;
                    if depth == 0 {
                        return Some(BraceMatch {
                            loc: Position::new(y, x),
                            left,
                        });
                    }
                }
            }
        }
    } else if under == Some(close) || left_of == Some(close) {
        let left = under != Some(close);
        let from = if left { start.column - 1 } else { start.column };
        let mut depth = 0usize;
        for y in (0..=start.line).rev() {
            let other;
            let chars: &[char] = if y == start.line {
                &current
            } else {
                other = line_chars(lines, y);
                &other
            };
            let upto = if y == start.line { from + 1 } else { chars.len() };
            for (x, &c) in chars.iter().enumerate().take(upto).rev() {
                if c == close {
                    depth += 1;
                } else if c == open {
                    depth -= 1;
                    if depth == 0 {
                        return Some(BraceMatch {
                            loc: Position::new(y, x),
                            left,
                        });
                    }
                }
            }
        }
    }
    None
}
