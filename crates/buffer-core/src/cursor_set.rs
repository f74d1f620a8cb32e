//! Multi-cursor collection.

use crate::cursor::{Cursor, CursorContext};
use crate::loc::Position;

/// Ordered, non-empty collection of cursors with one current cursor.
///
/// Every cursor's `num` equals its index after any structural change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CursorSet {
    cursors: Vec<Cursor>,
    current: usize,
}

impl CursorSet {
    /// A set holding a single cursor at `loc`.
    pub fn new(loc: Position, ctx: &CursorContext<'_>) -> Self {
        Self {
            cursors: vec![Cursor::new(loc, ctx)],
            current: 0,
        }
    }

    /// Number of cursors (at least one).
    pub fn len(&self) -> usize {
        self.cursors.len()
    }

    /// Always `false`: the set is never empty.
    pub fn is_empty(&self) -> bool {
        self.cursors.is_empty()
    }

    /// All cursors in order.
    pub fn cursors(&self) -> &[Cursor] {
        &self.cursors
    }

    pub(crate) fn cursors_mut(&mut self) -> &mut [Cursor] {
        &mut self.cursors
    }

    /// Cursor `i`, if present.
    pub fn get(&self, i: usize) -> Option<&Cursor> {
        self.cursors.get(i)
    }

    /// Mutable cursor `i`, if present.
    pub fn get_mut(&mut self, i: usize) -> Option<&mut Cursor> {
        self.cursors.get_mut(i)
    }

    /// Index of the current cursor.
    pub fn current(&self) -> usize {
        self.current
    }

    /// The current cursor.
    pub fn active(&self) -> &Cursor {
        &self.cursors[self.current]
    }

    /// The current cursor, mutably.
    pub fn active_mut(&mut self) -> &mut Cursor {
        &mut self.cursors[self.current]
    }

    /// Make cursor `i` current (clamped to the valid range).
    pub fn set_current(&mut self, i: usize) {
        self.current = i.min(self.cursors.len() - 1);
    }

    /// Append a cursor and return its index.
    pub fn add(&mut self, cursor: Cursor) -> usize {
        self.cursors.push(cursor);
        self.renumber();
        self.cursors.len() - 1
    }

    /// Remove cursor `i`. The last remaining cursor is never removed.
    pub fn remove(&mut self, i: usize) -> Option<Cursor> {
        if self.cursors.len() <= 1 || i >= self.cursors.len() {
            return None;
        }
        let removed = self.cursors.remove(i);
        self.current = self.current.min(self.cursors.len() - 1);
        self.renumber();
        Some(removed)
    }

    /// Drop every cursor except the first, make it current and collapse its selection.
    pub fn clear(&mut self) {
        self.cursors.truncate(1);
        self.current = 0;
        self.renumber();
        self.cursors[0].reset_selection();
    }

    /// Remove cursors sharing a location with an earlier cursor.
    ///
    /// Survivors keep their relative order; the current index is clamped.
    pub fn merge(&mut self) {
        let mut kept: Vec<Cursor> = Vec::with_capacity(self.cursors.len());
        for cursor in self.cursors.drain(..) {
            if !kept.iter().any(|c| c.loc == cursor.loc) {
                kept.push(cursor);
            }
        }
        self.cursors = kept;
        self.current = self.current.min(self.cursors.len() - 1);
        self.renumber();
    }

    /// Reassign ordinals to match positions.
    pub fn renumber(&mut self) {
        for (i, cursor) in self.cursors.iter_mut().enumerate() {
            cursor.num = i;
        }
    }

    /// Clamp every cursor into the buffer.
    pub fn relocate(&mut self, ctx: &CursorContext<'_>) {
        for cursor in &mut self.cursors {
            cursor.relocate(ctx);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::line_array::LineArray;

    fn set_with(lines: &LineArray, locs: &[Position]) -> CursorSet {
        let ctx = CursorContext::new(lines, 4);
        let mut set = CursorSet::new(locs[0], &ctx);
        for &loc in &locs[1..] {
            set.add(Cursor::new(loc, &ctx));
        }
        set
    }

    #[test]
    fn test_add_renumbers() {
        let la = LineArray::from_text("abc\ndef");
        let set = set_with(&la, &[Position::new(0, 0), Position::new(1, 1)]);
        assert_eq!(set.len(), 2);
        assert_eq!(set.get(1).map(|c| c.num), Some(1));
    }

    #[test]
    fn test_merge_keeps_first_and_is_idempotent() {
        let la = LineArray::from_text("abc\ndef");
        let mut set = set_with(
            &la,
            &[
                Position::new(0, 1),
                Position::new(1, 1),
                Position::new(0, 1),
                Position::new(1, 1),
            ],
        );
        set.set_current(3);
        set.merge();
        assert_eq!(set.len(), 2);
        assert_eq!(set.current(), 1);
        let nums: Vec<usize> = set.cursors().iter().map(|c| c.num).collect();
        assert_eq!(nums, vec![0, 1]);

        let before = set.clone();
        set.merge();
        assert_eq!(set, before);
    }

    #[test]
    fn test_remove_never_empties_and_clamps_current() {
        let la = LineArray::from_text("abc");
        let mut set = set_with(&la, &[Position::new(0, 0), Position::new(0, 2)]);
        set.set_current(1);
        assert!(set.remove(1).is_some());
        assert_eq!(set.current(), 0);
        assert!(set.remove(0).is_none());
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_clear_resets_first_selection() {
        let la = LineArray::from_text("abcdef");
        let mut set = set_with(&la, &[Position::new(0, 0), Position::new(0, 3)]);
        set.active_mut().cur_selection = [Position::new(0, 1), Position::new(0, 2)];
        set.set_current(1);
        set.clear();
        assert_eq!(set.len(), 1);
        assert_eq!(set.current(), 0);
        assert!(!set.active().has_selection());
    }
}
