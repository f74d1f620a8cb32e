//! Text search over a line store.
//!
//! Patterns are literal (escaped) or regular expressions, matched per line against raw bytes with
//! `regex::bytes`, so invalid UTF-8 never stops a search. Inputs and results are character
//! positions. Matches never span a line break.
//!
//! Each line also keeps a small per-view cache of the matches of that view's last search, used by
//! [`crate::Buffer::search_match`] to answer "is this position inside a match" cheaply while
//! rendering. Edits mark the cached lines stale.

use crate::error::SearchError;
use crate::line_array::LineArray;
use crate::loc::Position;
use crate::text::{character_count, rune_to_byte_index};
use crate::workspace::ViewId;
use regex::bytes::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

/// A view's most recent search.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SearchQuery {
    /// The pattern text.
    pub pattern: String,
    /// Treat `pattern` as a regular expression instead of a literal.
    pub use_regex: bool,
}

impl SearchQuery {
    /// A literal search for `pattern`.
    pub fn literal(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            use_regex: false,
        }
    }

    /// A regular-expression search for `pattern`.
    pub fn regex(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            use_regex: true,
        }
    }
}

/// Cached matches of one view's search on one line.
#[derive(Debug, Clone, Default)]
pub(crate) struct LineSearchState {
    query: SearchQuery,
    ignore_case: bool,
    /// Half-open character column ranges.
    matches: Vec<(usize, usize)>,
    done: bool,
}

impl LineSearchState {
    /// Mark the cached matches stale.
    pub(crate) fn invalidate(&mut self) {
        self.done = false;
    }
}

fn compile(pattern: &str, use_regex: bool, ignore_case: bool) -> Result<Regex, SearchError> {
    let pattern = if use_regex {
        pattern.to_string()
    } else {
        regex::escape(pattern)
    };
    Ok(RegexBuilder::new(&pattern)
        .case_insensitive(ignore_case)
        .build()?)
}

/// First match of `regex` in columns `[from, to)` of line `n`.
fn first_in_line(
    lines: &LineArray,
    regex: &Regex,
    n: usize,
    from: usize,
    to: usize,
) -> Option<(Position, Position)> {
    let bytes = lines.line_bytes(n);
    let hay_end = rune_to_byte_index(to, bytes);
    let start = rune_to_byte_index(from, bytes);
    if start > hay_end {
        return None;
    }
    let m = regex.find_at(&bytes[..hay_end], start)?;
    Some(to_positions(bytes, n, m.start(), m.end()))
}

/// Last match of `regex` in columns `[from, to)` of line `n`.
fn last_in_line(
    lines: &LineArray,
    regex: &Regex,
    n: usize,
    from: usize,
    to: usize,
) -> Option<(Position, Position)> {
    let bytes = lines.line_bytes(n);
    let hay_end = rune_to_byte_index(to, bytes);
    let mut at = rune_to_byte_index(from, bytes);
    let mut last = None;
    while at <= hay_end {
        let Some(m) = regex.find_at(&bytes[..hay_end], at) else {
            break;
        };
        last = Some((m.start(), m.end()));
        at = if m.end() > m.start() { m.end() } else { m.end() + 1 };
    }
    last.map(|(s, e)| to_positions(bytes, n, s, e))
}

fn to_positions(bytes: &[u8], n: usize, start: usize, end: usize) -> (Position, Position) {
    (
        Position::new(n, character_count(&bytes[..start])),
        Position::new(n, character_count(&bytes[..end])),
    )
}

/// Column bounds of line `n` inside the region `[start, end]`.
fn line_bounds(lines: &LineArray, n: usize, start: Position, end: Position) -> (usize, usize) {
    let lo = if n == start.line { start.column } else { 0 };
    let hi = if n == end.line {
        end.column
    } else {
        lines.character_count(n)
    };
    (lo, hi)
}

/// Find the next match of `pattern` inside `[start, end]`, searching from `from` and wrapping
/// around once.
///
/// Searching down returns the first match at or after `from`; searching up returns the last match
/// ending before `from`. An empty pattern finds nothing.
#[allow(clippy::too_many_arguments)]
pub fn find_next(
    lines: &LineArray,
    pattern: &str,
    start: Position,
    end: Position,
    from: Position,
    down: bool,
    use_regex: bool,
    ignore_case: bool,
) -> Result<Option<(Position, Position)>, SearchError> {
    if pattern.is_empty() {
        return Ok(None);
    }
    let regex = compile(pattern, use_regex, ignore_case)?;
    let (start, end) = if end < start { (end, start) } else { (start, end) };
    let (start, end) = (start.clamp(lines), end.clamp(lines));
    let from = from.clamp(lines).max(start).min(end);

    let found = if down {
        search_down(lines, &regex, start, end, from)
    } else {
        search_up(lines, &regex, start, end, from)
    };
    Ok(found)
}

fn search_down(
    lines: &LineArray,
    regex: &Regex,
    start: Position,
    end: Position,
    from: Position,
) -> Option<(Position, Position)> {
    for n in from.line..=end.line {
        let (lo, hi) = line_bounds(lines, n, start, end);
        let lo = if n == from.line { from.column } else { lo };
        if let Some(m) = first_in_line(lines, regex, n, lo, hi) {
            return Some(m);
        }
    }
    // Wrap to the region start.
    for n in start.line..=from.line {
        let (lo, hi) = line_bounds(lines, n, start, end);
        let hi = if n == from.line { from.column } else { hi };
        if let Some(m) = first_in_line(lines, regex, n, lo, hi) {
            return Some(m);
        }
    }
    None
}

fn search_up(
    lines: &LineArray,
    regex: &Regex,
    start: Position,
    end: Position,
    from: Position,
) -> Option<(Position, Position)> {
    for n in (start.line..=from.line).rev() {
        let (lo, hi) = line_bounds(lines, n, start, end);
        let hi = if n == from.line { from.column } else { hi };
        if let Some(m) = last_in_line(lines, regex, n, lo, hi) {
            return Some(m);
        }
    }
    // Wrap to the region end.
    for n in (from.line..=end.line).rev() {
        let (lo, hi) = line_bounds(lines, n, start, end);
        let lo = if n == from.line { from.column } else { lo };
        if let Some(m) = last_in_line(lines, regex, n, lo, hi) {
            return Some(m);
        }
    }
    None
}

/// Returns `true` if `pos` lies inside a match of `query` on its line, refreshing the line's
/// cached matches for `view` when they are stale or were computed for another query.
pub(crate) fn search_match(
    lines: &LineArray,
    view: ViewId,
    query: &SearchQuery,
    ignore_case: bool,
    pos: Position,
) -> bool {
    if query.pattern.is_empty() || pos.line >= lines.line_count() {
        return false;
    }
    lines.with_search_cache(pos.line, |cache| {
        let state = cache.entry(view).or_default();
        if state.query != *query || state.ignore_case != ignore_case {
            state.query = query.clone();
            state.ignore_case = ignore_case;
            state.done = false;
        }
        if !state.done {
            state.matches = line_matches(lines, pos.line, query, ignore_case);
            state.done = true;
        }
        state
            .matches
            .iter()
            .any(|&(s, e)| pos.column >= s && pos.column < e)
    })
}

fn line_matches(
    lines: &LineArray,
    n: usize,
    query: &SearchQuery,
    ignore_case: bool,
) -> Vec<(usize, usize)> {
    let Ok(regex) = compile(&query.pattern, query.use_regex, ignore_case) else {
        return Vec::new();
    };
    let bytes = lines.line_bytes(n);
    let mut out = Vec::new();
    let mut at = 0;
    while at <= bytes.len() {
        let Some(m) = regex.find_at(bytes, at) else {
            break;
        };
        let (s, e) = to_positions(bytes, n, m.start(), m.end());
        out.push((s.column, e.column));
        at = if m.end() > m.start() { m.end() } else { m.end() + 1 };
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn find(
        la: &LineArray,
        pattern: &str,
        from: Position,
        down: bool,
    ) -> Option<(Position, Position)> {
        find_next(la, pattern, la.start(), la.end(), from, down, false, false).unwrap()
    }

    #[test]
    fn test_find_down_and_wrap() {
        let la = LineArray::from_text("foo bar\nbaz foo");
        assert_eq!(
            find(&la, "foo", Position::new(0, 1), true),
            Some((Position::new(1, 4), Position::new(1, 7)))
        );
        assert_eq!(
            find(&la, "bar", Position::new(1, 0), true),
            Some((Position::new(0, 4), Position::new(0, 7)))
        );
    }

    #[test]
    fn test_find_up_and_wrap() {
        let la = LineArray::from_text("foo bar\nbaz foo");
        assert_eq!(
            find(&la, "foo", Position::new(1, 4), false),
            Some((Position::new(0, 0), Position::new(0, 3)))
        );
        assert_eq!(
            find(&la, "foo", Position::new(0, 0), false),
            Some((Position::new(1, 4), Position::new(1, 7)))
        );
    }

    #[test]
    fn test_literal_escapes_and_regex_compiles() {
        let la = LineArray::from_text("a.b axb");
        assert_eq!(
            find(&la, "a.b", la.start(), true),
            Some((Position::new(0, 0), Position::new(0, 3)))
        );
        let found = find_next(&la, "a.b", la.start(), la.end(), Position::new(0, 1), true, true, false)
            .unwrap();
        assert_eq!(found, Some((Position::new(0, 4), Position::new(0, 7))));
        assert!(matches!(
            find_next(&la, "(", la.start(), la.end(), la.start(), true, true, false),
            Err(SearchError::InvalidRegex(_))
        ));
    }

    #[test]
    fn test_columns_are_characters() {
        let la = LineArray::from_text("héllo wörld");
        assert_eq!(
            find(&la, "wö", la.start(), true),
            Some((Position::new(0, 6), Position::new(0, 8)))
        );
    }

    #[test]
    fn test_ignore_case_and_empty_pattern() {
        let la = LineArray::from_text("Hello");
        let found = find_next(&la, "hello", la.start(), la.end(), la.start(), true, false, true)
            .unwrap();
        assert_eq!(found, Some((Position::new(0, 0), Position::new(0, 5))));
        assert_eq!(find(&la, "", la.start(), true), None);
    }

    #[test]
    fn test_search_match_caches_and_invalidates() {
        let mut la = LineArray::from_text("one two one");
        let view = ViewId::next();
        let query = SearchQuery::literal("one");
        assert!(search_match(&la, view, &query, false, Position::new(0, 9)));
        assert!(!search_match(&la, view, &query, false, Position::new(0, 4)));

        la.insert(Position::new(0, 0), b"xx");
        la.invalidate_search_matches(0);
        assert!(!search_match(&la, view, &query, false, Position::new(0, 0)));
        assert!(search_match(&la, view, &query, false, Position::new(0, 2)));
    }
}
