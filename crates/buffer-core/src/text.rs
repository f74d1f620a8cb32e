//! Character-level helpers over raw line bytes.
//!
//! Lines are stored as raw bytes and decoded on demand. A *character* is one Unicode scalar value
//! followed by any combining marks attached to it, so `"e\u{301}"` counts as a single column.
//! Invalid UTF-8 decodes as one replacement character per offending byte.
//!
//! No byte/character index is cached anywhere: every conversion rescans the line from its start.

use unicode_properties::{GeneralCategoryGroup, UnicodeGeneralCategory};
use unicode_width::UnicodeWidthChar;

/// Lowest code point of the Unicode `Mark` categories (COMBINING GRAVE ACCENT).
const MIN_MARK: u32 = 0x0300;

/// Returns `true` if `c` is a combining mark (`Mn`, `Mc` or `Me`).
pub fn is_mark(c: char) -> bool {
    if (c as u32) < MIN_MARK {
        return false;
    }
    c.general_category_group() == GeneralCategoryGroup::Mark
}

fn utf8_sequence_len(first: u8) -> usize {
    match first {
        0x00..=0x7F => 1,
        0xC2..=0xDF => 2,
        0xE0..=0xEF => 3,
        0xF0..=0xF4 => 4,
        _ => 1,
    }
}

/// Decode one scalar value from the front of `bytes`, returning it with its encoded length.
///
/// Returns `(REPLACEMENT_CHARACTER, 1)` for an invalid sequence and `(REPLACEMENT_CHARACTER, 0)`
/// for empty input.
pub fn decode_rune(bytes: &[u8]) -> (char, usize) {
    let Some(&first) = bytes.first() else {
        return (char::REPLACEMENT_CHARACTER, 0);
    };
    let len = utf8_sequence_len(first);
    bytes
        .get(..len)
        .and_then(|seq| std::str::from_utf8(seq).ok())
        .and_then(|s| s.chars().next())
        .map(|c| (c, len))
        .unwrap_or((char::REPLACEMENT_CHARACTER, 1))
}

/// Decode one character (base scalar plus trailing combining marks) from the front of `bytes`.
///
/// Returns the base scalar value and the total byte length consumed.
pub fn decode_character(bytes: &[u8]) -> (char, usize) {
    let (base, mut size) = decode_rune(bytes);
    while size < bytes.len() {
        let (next, next_size) = decode_rune(&bytes[size..]);
        if !is_mark(next) {
            break;
        }
        size += next_size;
    }
    (base, size)
}

/// Iterator over the characters of a byte slice, yielding `(base, byte_len)` pairs.
#[derive(Debug, Clone)]
pub struct Characters<'a> {
    rest: &'a [u8],
}

impl<'a> Iterator for Characters<'a> {
    type Item = (char, usize);

    fn next(&mut self) -> Option<Self::Item> {
        if self.rest.is_empty() {
            return None;
        }
        let (c, size) = decode_character(self.rest);
        self.rest = &self.rest[size..];
        Some((c, size))
    }
}

/// Iterate the characters of `bytes`.
pub fn characters(bytes: &[u8]) -> Characters<'_> {
    Characters { rest: bytes }
}

/// Number of characters (columns) in `bytes`.
pub fn character_count(bytes: &[u8]) -> usize {
    characters(bytes).count()
}

/// Byte offset of character `n` in `bytes`, saturating at `bytes.len()`.
pub fn rune_to_byte_index(n: usize, bytes: &[u8]) -> usize {
    characters(bytes).take(n).map(|(_, size)| size).sum()
}

/// Returns the base scalar of character `n`, if the line has that many characters.
pub fn character_at(bytes: &[u8], n: usize) -> Option<char> {
    characters(bytes).nth(n).map(|(c, _)| c)
}

/// Letters, digits and `_`.
pub fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Unicode whitespace.
pub fn is_whitespace(c: char) -> bool {
    c.is_whitespace()
}

/// Returns `true` if every byte of `bytes` is ASCII-range whitespace (empty input included).
pub fn is_bytes_whitespace(bytes: &[u8]) -> bool {
    bytes.iter().all(|&b| is_whitespace(b as char))
}

/// Returns `true` if the last scalar value of `bytes` is whitespace.
pub fn has_trailing_whitespace(bytes: &[u8]) -> bool {
    if bytes.is_empty() {
        return false;
    }
    // Back up over at most three continuation bytes to the start of the last sequence.
    let mut start = bytes.len() - 1;
    while start > 0 && bytes.len() - start < 4 && bytes[start] & 0xC0 == 0x80 {
        start -= 1;
    }
    let (c, _) = decode_rune(&bytes[start..]);
    is_whitespace(c)
}

fn cell_width(c: char, width: usize, tab_size: usize) -> usize {
    match c {
        '\t' => {
            let tab_size = tab_size.max(1);
            tab_size - (width % tab_size)
        }
        _ => c.width().unwrap_or(0),
    }
}

/// Visual width (in cells) of the first `n` characters of `bytes`, expanding tabs to tab stops.
pub fn string_width(bytes: &[u8], n: usize, tab_size: usize) -> usize {
    let mut width = 0;
    for (c, _) in characters(bytes).take(n) {
        width += cell_width(c, width, tab_size);
    }
    width
}

/// Character index whose visual start is closest to `visual_x` without overshooting.
///
/// The result may equal the line's character count when `visual_x` lies past the end.
pub fn char_pos_in_line(bytes: &[u8], visual_x: usize, tab_size: usize) -> usize {
    let mut index = 0;
    let mut width = 0;
    for (c, _) in characters(bytes) {
        width += cell_width(c, width, tab_size);
        if width >= visual_x {
            if width == visual_x {
                index += 1;
            }
            break;
        }
        index += 1;
    }
    index
}
