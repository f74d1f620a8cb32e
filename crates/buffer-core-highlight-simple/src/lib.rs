//! `buffer-core-highlight-simple` - Simple (regex-based) per-line highlighting for `buffer-core`.
//!
//! The highlighter only touches what [`HighlightTarget`] exposes: line count, raw line bytes, the
//! per-line lexer state and the per-line match spans. A single optional multi-line region (block
//! comments, for example) is carried from line to line through the lexer state, so an edit can be
//! re-highlighted from the first modified line until the state settles again.
//!
//! [`Rehighlighter`] wires this to a [`SharedBuffer`]: it queues the modified ranges the buffer
//! reports and replays them later under the store's read lock.

use buffer_core::text::{character_count, characters};
use buffer_core::{HighlightTarget, LexerState, LineMatch, LineStoreHandle, ModifiedRange};
use buffer_core::{SharedBuffer, StyleId};
use parking_lot::Mutex;
use regex::bytes::Regex;
use std::sync::Arc;

/// Style of text no rule matched.
pub const STYLE_DEFAULT: StyleId = 0;

/// A single regex highlighting rule, applied within one line.
#[derive(Debug, Clone)]
pub struct RegexRule {
    regex: Regex,
    style_id: StyleId,
    capture_group: Option<usize>,
}

impl RegexRule {
    pub fn new(pattern: &str, style_id: StyleId) -> Result<Self, regex::Error> {
        Ok(Self {
            regex: Regex::new(pattern)?,
            style_id,
            capture_group: None,
        })
    }

    /// Highlight only a capture group of each match.
    ///
    /// Example (INI key):
    /// - pattern: `^\\s*([^=\\s]+)\\s*=`
    /// - capture_group: `1` (the key)
    pub fn with_capture_group(mut self, group: usize) -> Self {
        self.capture_group = Some(group);
        self
    }

    pub fn style_id(&self) -> StyleId {
        self.style_id
    }

    fn spans(&self, line: &[u8]) -> Vec<(usize, usize)> {
        match self.capture_group {
            Some(group) => self
                .regex
                .captures_iter(line)
                .filter_map(|caps| caps.get(group))
                .map(|m| (m.start(), m.end()))
                .collect(),
            None => self
                .regex
                .find_iter(line)
                .map(|m| (m.start(), m.end()))
                .collect(),
        }
    }
}

/// A delimited region that may span lines, such as a block comment.
#[derive(Debug, Clone)]
pub struct RegionRule {
    start: Regex,
    end: Regex,
    style_id: StyleId,
}

impl RegionRule {
    pub fn new(start: &str, end: &str, style_id: StyleId) -> Result<Self, regex::Error> {
        Ok(Self {
            start: Regex::new(start)?,
            end: Regex::new(end)?,
            style_id,
        })
    }
}

/// Lexer state stored at the end of a line: whether the line ends inside the region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RegionState {
    inside: bool,
}

fn inside_region(state: &LexerState) -> bool {
    state
        .as_ref()
        .and_then(|s| s.downcast_ref::<RegionState>())
        .is_some_and(|s| s.inside)
}

/// A simple regex-based syntax highlighter.
///
/// Designed for simple formats (JSON/INI/etc.). It is *not* intended to be a full parser.
#[derive(Debug, Clone)]
pub struct RegexHighlighter {
    rules: Vec<RegexRule>,
    region: Option<RegionRule>,
}

impl RegexHighlighter {
    pub fn new(rules: Vec<RegexRule>) -> Self {
        Self {
            rules,
            region: None,
        }
    }

    /// Add a multi-line region. Text inside it is not matched by the other rules.
    pub fn with_region(mut self, region: RegionRule) -> Self {
        self.region = Some(region);
        self
    }

    pub fn rules(&self) -> &[RegexRule] {
        &self.rules
    }

    /// Highlight one line.
    ///
    /// `inside` says whether the previous line ended inside the region. Returns the line's match
    /// spans (keyed by character column) and whether the line itself ends inside the region.
    pub fn highlight_line(&self, line: &[u8], inside: bool) -> (LineMatch, bool) {
        let mut styles: Vec<Option<StyleId>> = vec![None; line.len()];
        let mut inside = inside;

        if let Some(region) = &self.region {
            let mut at = 0;
            while at <= line.len() {
                if inside {
                    let close = region.end.find_at(line, at).map(|m| m.end());
                    let stop = close.unwrap_or(line.len());
                    fill(&mut styles, at, stop, region.style_id);
                    match close {
                        Some(end) if end > at => {
                            inside = false;
                            at = end;
                        }
                        Some(end) => {
                            inside = false;
                            at = end + 1;
                        }
                        None => break,
                    }
                } else {
                    match region.start.find_at(line, at) {
                        Some(m) => {
                            fill(&mut styles, m.start(), m.end(), region.style_id);
                            inside = true;
                            at = m.end().max(m.start() + 1);
                        }
                        None => break,
                    }
                }
            }
        }

        for rule in &self.rules {
            for (start, end) in rule.spans(line) {
                if styles[start..end].iter().all(Option::is_none) {
                    fill(&mut styles, start, end, rule.style_id);
                }
            }
        }

        (to_line_match(line, &styles), inside)
    }

    /// Re-highlight lines `start..=end` of `target`, then keep going while the lexer state at the
    /// end of a line differs from what was stored before. Returns the last line highlighted, or
    /// `None` when `start` is past the end.
    pub fn highlight_lines(
        &self,
        target: &impl HighlightTarget,
        start: usize,
        end: usize,
    ) -> Option<usize> {
        let count = target.line_count();
        if start >= count {
            return None;
        }
        let end = end.min(count - 1);
        let mut inside = start > 0 && inside_region(&target.lexer_state(start - 1));

        let mut n = start;
        loop {
            let (matches, ends_inside) = self.highlight_line(target.line_bytes(n), inside);
            let changed = inside_region(&target.lexer_state(n)) != ends_inside;
            target.set_line_match(n, matches);
            target.set_lexer_state(n, Some(Arc::new(RegionState { inside: ends_inside })));
            inside = ends_inside;

            if n + 1 >= count || (n >= end && !changed) {
                return Some(n);
            }
            n += 1;
        }
    }

    /// Highlight every line of `target`.
    pub fn highlight_all(&self, target: &impl HighlightTarget) {
        let count = target.line_count();
        let mut inside = false;
        for n in 0..count {
            let (matches, ends_inside) = self.highlight_line(target.line_bytes(n), inside);
            target.set_line_match(n, matches);
            target.set_lexer_state(n, Some(Arc::new(RegionState { inside: ends_inside })));
            inside = ends_inside;
        }
    }

    /// A small default JSON grammar (strings, numbers, booleans, null).
    pub fn json_default(styles: SimpleJsonStyles) -> Result<Self, regex::Error> {
        Ok(Self::new(vec![
            RegexRule::new(r#""(?:\\.|[^"\\])*""#, styles.string)?,
            RegexRule::new(r#"-?(?:0|[1-9]\d*)(?:\.\d+)?(?:[eE][+-]?\d+)?"#, styles.number)?,
            RegexRule::new(r#"\b(?:true|false)\b"#, styles.boolean)?,
            RegexRule::new(r#"\bnull\b"#, styles.null)?,
        ]))
    }

    /// A small default INI grammar (section, key, comment).
    pub fn ini_default(styles: SimpleIniStyles) -> Result<Self, regex::Error> {
        Ok(Self::new(vec![
            RegexRule::new(r#"^\s*[;#].*$"#, styles.comment)?,
            RegexRule::new(r#"^\s*\[([^\]]+)\]\s*$"#, styles.section)?.with_capture_group(1),
            RegexRule::new(r#"^\s*([^=\s]+)\s*="#, styles.key)?.with_capture_group(1),
        ]))
    }

    /// Line comments, block comments (as a region) and strings of C-like languages.
    pub fn c_like_default(styles: SimpleCStyles) -> Result<Self, regex::Error> {
        Ok(Self::new(vec![
            RegexRule::new(r#"//.*$"#, styles.comment)?,
            RegexRule::new(r#""(?:\\.|[^"\\])*""#, styles.string)?,
            RegexRule::new(r#"\b(?:if|else|for|while|return|fn|let|struct)\b"#, styles.keyword)?,
        ])
        .with_region(RegionRule::new(r"/\*", r"\*/", styles.comment)?))
    }
}

fn fill(styles: &mut [Option<StyleId>], start: usize, end: usize, style: StyleId) {
    let end = end.min(styles.len());
    for slot in &mut styles[start..end] {
        *slot = Some(style);
    }
}

/// Collapse per-byte styles into spans keyed by the character column where each style starts.
fn to_line_match(line: &[u8], styles: &[Option<StyleId>]) -> LineMatch {
    let mut matches = LineMatch::new();
    let mut current = STYLE_DEFAULT;
    let mut offset = 0;
    for (column, (_, len)) in characters(line).enumerate() {
        let style = styles[offset].unwrap_or(STYLE_DEFAULT);
        if style != current {
            matches.insert(column, style);
            current = style;
        }
        offset += len;
    }
    if current != STYLE_DEFAULT {
        matches.insert(character_count(line), STYLE_DEFAULT);
    }
    matches
}

/// Queues the ranges a [`SharedBuffer`] reports as modified and re-highlights them on demand.
///
/// Highlighting runs against a [`LineStoreHandle`], so it can happen on another thread; it holds
/// the store's read lock for the duration of one pass.
#[derive(Debug, Clone)]
pub struct Rehighlighter {
    highlighter: Arc<RegexHighlighter>,
    pending: Arc<Mutex<Vec<ModifiedRange>>>,
    store: LineStoreHandle,
}

impl Rehighlighter {
    /// Highlight the whole buffer once and subscribe to its modifications.
    pub fn connect(shared: &mut SharedBuffer, highlighter: RegexHighlighter) -> Self {
        let pending = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&pending);
        shared.on_modified(move |range| sink.lock().push(range));

        let store = shared.line_store();
        highlighter.highlight_all(&*store.lock());
        Self {
            highlighter: Arc::new(highlighter),
            pending,
            store,
        }
    }

    /// Number of queued ranges.
    pub fn pending(&self) -> usize {
        self.pending.lock().len()
    }

    /// Re-highlight everything from the lowest queued line to the end of the buffer. Returns the
    /// number of ranges consumed.
    ///
    /// Queued ranges are in the line numbers of the moment they were reported; a later edit that
    /// adds or removes lines above one of them moves its lines, so only the lowest start is
    /// trusted.
    pub fn run(&self) -> usize {
        let ranges = std::mem::take(&mut *self.pending.lock());
        let Some(start) = ranges.iter().map(|range| range.start_line).min() else {
            return 0;
        };
        let lines = self.store.lock();
        let last = lines.line_count().saturating_sub(1);
        self.highlighter.highlight_lines(&*lines, start.min(last), last);
        ranges.len()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SimpleJsonStyles {
    pub string: StyleId,
    pub number: StyleId,
    pub boolean: StyleId,
    pub null: StyleId,
}

impl Default for SimpleJsonStyles {
    fn default() -> Self {
        Self {
            string: SIMPLE_STYLE_STRING,
            number: SIMPLE_STYLE_NUMBER,
            boolean: SIMPLE_STYLE_BOOLEAN,
            null: SIMPLE_STYLE_NULL,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SimpleIniStyles {
    pub section: StyleId,
    pub key: StyleId,
    pub comment: StyleId,
}

impl Default for SimpleIniStyles {
    fn default() -> Self {
        Self {
            section: SIMPLE_STYLE_SECTION,
            key: SIMPLE_STYLE_KEY,
            comment: SIMPLE_STYLE_COMMENT,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SimpleCStyles {
    pub comment: StyleId,
    pub string: StyleId,
    pub keyword: StyleId,
}

impl Default for SimpleCStyles {
    fn default() -> Self {
        Self {
            comment: SIMPLE_STYLE_COMMENT,
            string: SIMPLE_STYLE_STRING,
            keyword: SIMPLE_STYLE_KEYWORD,
        }
    }
}

/// Default `StyleId` constants for the built-in grammars.
///
/// These are only identifiers. The UI/theme layer maps them to actual colors.
pub const SIMPLE_STYLE_STRING: StyleId = 0x0200_0001;
pub const SIMPLE_STYLE_NUMBER: StyleId = 0x0200_0002;
pub const SIMPLE_STYLE_BOOLEAN: StyleId = 0x0200_0003;
pub const SIMPLE_STYLE_NULL: StyleId = 0x0200_0004;
pub const SIMPLE_STYLE_SECTION: StyleId = 0x0200_0010;
pub const SIMPLE_STYLE_KEY: StyleId = 0x0200_0011;
pub const SIMPLE_STYLE_COMMENT: StyleId = 0x0200_0012;
pub const SIMPLE_STYLE_KEYWORD: StyleId = 0x0200_0020;
