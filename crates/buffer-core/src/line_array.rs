//! Line store.
//!
//! [`LineArray`] is an ordered sequence of raw byte lines (terminators stripped) and the only code
//! that splits and joins lines. Positions are addressed in characters and converted to byte
//! offsets by rescanning the affected line each time.
//!
//! # Locking
//!
//! A shared buffer wraps the whole store in one coarse `RwLock`: any structural change (content or
//! line count) holds it for writing. Each [`Line`] additionally has its own small locks guarding
//! only highlighter-owned and search-owned caches, so a highlighting pass that holds the coarse
//! lock for reading can update per-line state through `&LineArray`.

use crate::highlight::{LexerState, LineMatch};
use crate::line_ending::LineEnding;
use crate::loc::Position;
use crate::search::LineSearchState;
use crate::text::{character_at, character_count, rune_to_byte_index};
use crate::workspace::ViewId;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::io::{self, BufRead, BufReader, Read};

/// Lines read before the backing storage is re-reserved from the bytes-per-line estimate.
const INITIAL_LINE_CAPACITY: usize = 1000;
/// Headroom added on top of the estimated line count.
const LINE_CAPACITY_SLACK: usize = 10_000;

/// Highlighter-owned state for one line.
#[derive(Default)]
pub struct HighlightCache {
    /// Lexer state at the end of the line (opaque to the core).
    pub state: LexerState,
    /// Syntax-group spans starting at character columns.
    pub matches: LineMatch,
}

/// One line of text plus its externally-owned caches.
pub struct Line {
    data: Vec<u8>,
    highlight: Mutex<HighlightCache>,
    search: Mutex<HashMap<ViewId, LineSearchState>>,
}

impl Line {
    fn new(data: Vec<u8>) -> Self {
        Self::with_state(data, None)
    }

    fn with_state(data: Vec<u8>, state: LexerState) -> Self {
        Self {
            data,
            highlight: Mutex::new(HighlightCache {
                state,
                matches: LineMatch::new(),
            }),
            search: Mutex::new(HashMap::new()),
        }
    }

    /// Raw bytes of the line, without terminator.
    pub fn bytes(&self) -> &[u8] {
        &self.data
    }
}

/// Ordered sequence of lines with a single line-ending format.
pub struct LineArray {
    lines: Vec<Line>,
    endings: LineEnding,
    init_size: usize,
}

impl std::fmt::Debug for LineArray {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LineArray")
            .field("line_count", &self.lines.len())
            .field("endings", &self.endings)
            .finish()
    }
}

impl LineArray {
    /// Build a store by streaming `reader`, splitting on `'\n'`.
    ///
    /// - `size_hint` is the expected total byte size; after the first 1000 lines the storage is
    ///   re-reserved once using the observed bytes-per-line ratio.
    /// - `endings` forces a line ending; `None` auto-detects from the first terminator seen
    ///   (falling back to LF).
    /// - `"\r\n"` terminators are stripped entirely.
    pub fn from_reader<R: Read>(
        reader: R,
        size_hint: usize,
        endings: Option<LineEnding>,
    ) -> io::Result<Self> {
        let mut reader = BufReader::new(reader);
        let mut lines: Vec<Line> = Vec::with_capacity(INITIAL_LINE_CAPACITY);
        let mut detected = endings;
        let mut loaded: Option<usize> = Some(0);

        loop {
            let mut data = Vec::new();
            reader.read_until(b'\n', &mut data)?;
            if detected.is_none() {
                detected = LineEnding::detect_in_line(&data);
            }
            let raw_len = data.len();

            if let Some(bytes_so_far) = loaded
                && lines.len() >= INITIAL_LINE_CAPACITY
            {
                if bytes_so_far > 0 {
                    let estimate = (size_hint as f64 * (lines.len() as f64 / bytes_so_far as f64))
                        as usize;
                    let wanted = estimate + LINE_CAPACITY_SLACK;
                    lines.reserve(wanted.saturating_sub(lines.len()));
                    tracing::trace!(estimate, "reserved line storage");
                }
                loaded = None;
            }
            if let Some(bytes_so_far) = loaded.as_mut() {
                *bytes_so_far += raw_len;
            }

            if data.last() == Some(&b'\n') {
                data.pop();
                if data.last() == Some(&b'\r') {
                    data.pop();
                }
                lines.push(Line::new(data));
            } else {
                lines.push(Line::new(data));
                break;
            }
        }

        Ok(Self {
            lines,
            endings: detected.unwrap_or_default(),
            init_size: size_hint,
        })
    }

    /// Build a store from in-memory text.
    pub fn from_text(text: &str) -> Self {
        Self::from_bytes(text.as_bytes())
    }

    /// Build a store from in-memory bytes.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        match Self::from_reader(bytes, bytes.len(), None) {
            Ok(lines) => lines,
            // Reading from a slice cannot fail.
            Err(_) => unreachable!("in-memory reader failed"),
        }
    }

    /// Number of lines (always at least one).
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// First position of the buffer.
    pub fn start(&self) -> Position {
        Position::new(0, 0)
    }

    /// Logical end of the buffer: `{last line, character count of last line}`.
    pub fn end(&self) -> Position {
        let last = self.lines.len() - 1;
        Position::new(last, character_count(&self.lines[last].data))
    }

    /// Raw bytes of line `n`; empty when `n` is out of range.
    pub fn line_bytes(&self, n: usize) -> &[u8] {
        self.lines.get(n).map(|line| line.data.as_slice()).unwrap_or(&[])
    }

    /// Line `n` decoded lossily as UTF-8.
    pub fn line_string(&self, n: usize) -> String {
        String::from_utf8_lossy(self.line_bytes(n)).into_owned()
    }

    /// Number of characters in line `n` (0 when out of range).
    pub fn character_count(&self, n: usize) -> usize {
        character_count(self.line_bytes(n))
    }

    /// Base character at `pos`, or `'\n'` at/after the end of its line.
    pub fn rune_at(&self, pos: Position) -> char {
        character_at(self.line_bytes(pos.line), pos.column).unwrap_or('\n')
    }

    /// Current line ending.
    pub fn endings(&self) -> LineEnding {
        self.endings
    }

    /// Change the line ending used by [`LineArray::bytes`].
    pub fn set_endings(&mut self, endings: LineEnding) {
        self.endings = endings;
    }

    /// Whole content joined with the current line ending.
    pub fn bytes(&self) -> Vec<u8> {
        let newline = self.endings.as_bytes();
        let mut out = Vec::with_capacity(self.init_size + 4096);
        for (i, line) in self.lines.iter().enumerate() {
            if i > 0 {
                out.extend_from_slice(newline);
            }
            out.extend_from_slice(&line.data);
        }
        out
    }

    /// Serialized byte length (what [`LineArray::bytes`] would return).
    pub fn size(&self) -> usize {
        let newline = self.endings.as_bytes().len();
        let content: usize = self.lines.iter().map(|line| line.data.len()).sum();
        content + newline * (self.lines.len() - 1)
    }

    /// Insert raw bytes at `pos`.
    ///
    /// Every `'\n'` (or `"\r\n"`) in `value` splits the current line; the remaining fragment
    /// continues at column 0 of the new line. `pos.line` must be a valid line index.
    pub fn insert(&mut self, pos: Position, value: &[u8]) {
        let mut y = pos.line;
        let mut x = rune_to_byte_index(pos.column, &self.lines[y].data);

        let mut segments = value.split(|&b| b == b'\n').peekable();
        while let Some(segment) = segments.next() {
            let has_break = segments.peek().is_some();
            let segment = if has_break {
                segment.strip_suffix(b"\r").unwrap_or(segment)
            } else {
                segment
            };
            self.lines[y]
                .data
                .splice(x..x, segment.iter().copied());
            x += segment.len();
            if has_break {
                self.split(x, y);
                x = 0;
                y += 1;
            }
        }
    }

    /// Split line `y` at byte offset `x`; the tail becomes line `y + 1` and inherits the lexer
    /// state of line `y`.
    fn split(&mut self, x: usize, y: usize) {
        let line = &mut self.lines[y];
        let tail = line.data.split_off(x);
        let cache = line.highlight.get_mut();
        let state = cache.state.take();
        cache.matches.clear();
        self.lines.insert(y + 1, Line::with_state(tail, state));
    }

    /// Remove the range `[start, end)` and return the removed bytes (line breaks as `'\n'`).
    ///
    /// Lines strictly between the endpoints are deleted and the two boundary lines are joined.
    /// Both positions must lie on valid lines.
    pub fn remove(&mut self, start: Position, end: Position) -> Vec<u8> {
        let (start, end) = if end < start {
            (end, start)
        } else {
            (start, end)
        };
        let removed = self.substr(start, end);
        let start_x = rune_to_byte_index(start.column, &self.lines[start.line].data);
        let end_x = rune_to_byte_index(end.column, &self.lines[end.line].data);

        if start.line == end.line {
            self.lines[start.line].data.drain(start_x..end_x);
        } else {
            let tail = self.lines[end.line].data.split_off(end_x);
            self.lines.drain(start.line + 1..=end.line);
            let first = &mut self.lines[start.line].data;
            first.truncate(start_x);
            first.extend_from_slice(&tail);
        }
        removed
    }

    /// Copy of the range `[start, end)`, with `'\n'` between lines.
    pub fn substr(&self, start: Position, end: Position) -> Vec<u8> {
        let first = &self.lines[start.line].data;
        let start_x = rune_to_byte_index(start.column, first);
        let end_x = rune_to_byte_index(end.column, &self.lines[end.line].data);
        if start.line == end.line {
            return first[start_x..end_x.max(start_x)].to_vec();
        }

        let mut out = Vec::with_capacity(first.len() * (end.line - start.line + 1));
        out.extend_from_slice(&first[start_x..]);
        out.push(b'\n');
        for line in &self.lines[start.line + 1..end.line] {
            out.extend_from_slice(&line.data);
            out.push(b'\n');
        }
        out.extend_from_slice(&self.lines[end.line].data[..end_x]);
        out
    }

    /// Lexer state stored for line `n`. Panics if `n` is out of range.
    pub fn lexer_state(&self, n: usize) -> LexerState {
        self.lines[n].highlight.lock().state.clone()
    }

    /// Store the lexer state for line `n`. Panics if `n` is out of range.
    pub fn set_lexer_state(&self, n: usize, state: LexerState) {
        self.lines[n].highlight.lock().state = state;
    }

    /// Syntax-group spans for line `n`. Panics if `n` is out of range.
    pub fn line_match(&self, n: usize) -> LineMatch {
        self.lines[n].highlight.lock().matches.clone()
    }

    /// Store the syntax-group spans for line `n`. Panics if `n` is out of range.
    pub fn set_line_match(&self, n: usize, matches: LineMatch) {
        self.lines[n].highlight.lock().matches = matches;
    }

    pub(crate) fn with_search_cache<R>(
        &self,
        n: usize,
        f: impl FnOnce(&mut HashMap<ViewId, LineSearchState>) -> R,
    ) -> R {
        f(&mut self.lines[n].search.lock())
    }

    pub(crate) fn invalidate_search_matches(&self, n: usize) {
        if let Some(line) = self.lines.get(n) {
            for state in line.search.lock().values_mut() {
                state.invalidate();
            }
        }
    }

    pub(crate) fn forget_search_consumer(&mut self, view: ViewId) {
        for line in &mut self.lines {
            line.search.get_mut().remove(&view);
        }
    }

    /// Iterate the lines.
    pub fn iter(&self) -> impl Iterator<Item = &Line> {
        self.lines.iter()
    }
}
