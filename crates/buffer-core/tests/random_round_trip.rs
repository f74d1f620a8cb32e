use buffer_core::text::{character_count, rune_to_byte_index};
use buffer_core::{BufferSettings, ManualClock, Position, SharedBuffer, UNDO_THRESHOLD_MS};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;

/// Plain-string model of the buffer; columns count characters with their combining marks.
struct Model(String);

impl Model {
    fn offset(&self, pos: Position) -> usize {
        let mut offset = 0;
        for (i, line) in self.0.split('\n').enumerate() {
            if i == pos.line {
                return offset + rune_to_byte_index(pos.column, line.as_bytes());
            }
            offset += line.len() + 1;
        }
        unreachable!("position outside the model");
    }

    fn random_position(&self, rng: &mut StdRng) -> Position {
        let lines: Vec<&str> = self.0.split('\n').collect();
        let line = rng.gen_range(0..lines.len());
        let column = rng.gen_range(0..=character_count(lines[line].as_bytes()));
        Position::new(line, column)
    }
}

fn random_text(rng: &mut StdRng) -> String {
    const ALPHABET: &[char] = &['a', 'b', ' ', '\n', '\u{e9}', '\u{4e2d}', '\u{301}', '\u{308}'];
    let len = rng.gen_range(1..6);
    (0..len)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())])
        .collect()
}

#[test]
fn test_random_edits_match_model_and_undo_fully() {
    for seed in 0..40u64 {
        let mut rng = StdRng::seed_from_u64(seed);
        let original = "first line\nsecond\n\nlast";
        let mut model = Model(original.to_string());

        let mut shared = SharedBuffer::from_text(original, BufferSettings::default());
        let clock = ManualClock::new(0);
        shared.set_clock(Arc::new(clock.clone()));
        let view = shared.open_view();

        let mut edits = 0;
        for _ in 0..60 {
            clock.advance(2 * UNDO_THRESHOLD_MS);
            let mut buf = shared.view(view).unwrap();
            if rng.gen_bool(0.6) || model.0.is_empty() {
                let pos = model.random_position(&mut rng);
                let text = random_text(&mut rng);
                let at = model.offset(pos);
                model.0.insert_str(at, &text);
                buf.insert(pos, &text).unwrap();
            } else {
                let a = model.random_position(&mut rng);
                let b = model.random_position(&mut rng);
                let (start, end) = if b < a { (b, a) } else { (a, b) };
                if start == end {
                    continue;
                }
                let (from, to) = (model.offset(start), model.offset(end));
                model.0.replace_range(from..to, "");
                buf.remove(start, end).unwrap();
            }
            edits += 1;
            assert_eq!(shared.bytes(), model.0.as_bytes(), "seed {seed}");
            assert_eq!(shared.line_count(), model.0.split('\n').count());
        }

        let edited = shared.bytes();
        let mut undone = 0;
        loop {
            let n = shared.view(view).unwrap().undo();
            if n == 0 {
                break;
            }
            undone += n;
        }
        assert_eq!(undone, edits, "seed {seed}");
        assert_eq!(shared.bytes(), original.as_bytes(), "seed {seed}");

        while shared.view(view).unwrap().redo() > 0 {}
        assert_eq!(shared.bytes(), edited, "seed {seed}");
    }
}

#[test]
fn test_cursors_stay_in_bounds_under_random_edits() {
    let mut rng = StdRng::seed_from_u64(7);
    let mut shared = SharedBuffer::from_text("abc\ndef\nghi", BufferSettings::default());
    let view = shared.open_view();
    {
        let mut buf = shared.view(view).unwrap();
        buf.add_cursor(Position::new(1, 1));
        buf.add_cursor(Position::new(2, 3));
    }

    for _ in 0..200 {
        let mut buf = shared.view(view).unwrap();
        let line_count = buf.shared().line_count();
        let line = rng.gen_range(0..line_count);
        let len = buf.shared().lines().character_count(line);
        let pos = Position::new(line, rng.gen_range(0..=len));
        if rng.gen_bool(0.5) {
            buf.insert(pos, &random_text(&mut rng)).unwrap();
        } else {
            let end = Position::new(rng.gen_range(0..line_count), 0);
            buf.remove(pos, end).unwrap();
        }

        let lines = shared.lines();
        for cursor in shared.view_state(view).unwrap().cursors().cursors() {
            assert!(cursor.loc.line < lines.line_count());
            assert!(cursor.loc.column <= lines.character_count(cursor.loc.line));
        }
    }
}
