use buffer_core::{
    BufferError, BufferSettings, Delta, EventKind, LineArray, Position, SharedBuffer, Workspace,
};
use pretty_assertions::assert_eq;

fn text(shared: &SharedBuffer) -> String {
    String::from_utf8(shared.bytes()).unwrap()
}

#[test]
fn test_insert_then_undo() {
    let mut workspace = Workspace::new();
    let opened = workspace
        .open_text(None, "ab\ncd", BufferSettings::default())
        .unwrap();

    let mut buf = workspace.buffer(opened.view_id).unwrap();
    buf.insert(Position::new(0, 0), "X").unwrap();
    assert_eq!(buf.shared().bytes(), b"Xab\ncd");
    buf.undo();
    assert_eq!(buf.shared().bytes(), b"ab\ncd");
}

#[test]
fn test_remove_spanning_lines_returns_removed_text() {
    let mut lines = LineArray::from_text("a\nb\nc");
    let removed = lines.remove(Position::new(0, 0), Position::new(2, 0));
    assert_eq!(removed, b"a\nb\n");
    assert_eq!(lines.line_count(), 1);
    assert_eq!(lines.line_bytes(0), b"c");
}

#[test]
fn test_replace_records_invertible_event() {
    let mut shared = SharedBuffer::from_text("abc", BufferSettings::default());
    let view = shared.open_view();

    shared
        .view(view)
        .unwrap()
        .multiple_replace(vec![Delta::new(
            "XY",
            Position::new(0, 0),
            Position::new(0, 1),
        )])
        .unwrap();
    assert_eq!(text(&shared), "XYbc");

    let event = shared.history().undo_stack().peek().unwrap();
    assert_eq!(event.kind, EventKind::Replace);
    assert_eq!(event.deltas.len(), 1);
    assert_eq!(event.deltas[0].text, b"a");
    assert_eq!(event.deltas[0].start, Position::new(0, 0));
    assert_eq!(event.deltas[0].end, Position::new(0, 2));

    shared.view(view).unwrap().undo();
    assert_eq!(text(&shared), "abc");
}

#[test]
fn test_replace_is_remove_then_insert() {
    let mut shared = SharedBuffer::from_text("hello world", BufferSettings::default());
    let view = shared.open_view();
    shared
        .view(view)
        .unwrap()
        .replace(Position::new(0, 6), Position::new(0, 11), "there")
        .unwrap();
    assert_eq!(text(&shared), "hello there");
    assert_eq!(shared.history().undo_stack().len(), 2);
}

#[test]
fn test_boundary_edits_are_noops() {
    let mut shared = SharedBuffer::from_text("abc", BufferSettings::default());
    let view = shared.open_view();

    let mut buf = shared.view(view).unwrap();
    buf.insert(Position::new(0, 1), "").unwrap();
    buf.remove(Position::new(0, 2), Position::new(0, 2)).unwrap();
    buf.multiple_replace(Vec::new()).unwrap();
    buf.move_lines_up(0, 1).unwrap();
    buf.move_lines_down(0, 0).unwrap();

    assert_eq!(text(&shared), "abc");
    assert!(!shared.can_undo());
    assert!(!shared.is_modified());
}

#[test]
fn test_out_of_range_positions_are_clamped() {
    let mut shared = SharedBuffer::from_text("ab\ncd", BufferSettings::default());
    let view = shared.open_view();

    let mut buf = shared.view(view).unwrap();
    buf.insert(Position::new(9, 9), "!").unwrap();
    assert_eq!(text(&shared), "ab\ncd!");

    let mut buf = shared.view(view).unwrap();
    buf.insert(Position::new(0, 42), "?").unwrap();
    assert_eq!(text(&shared), "ab?\ncd!");

    let mut buf = shared.view(view).unwrap();
    buf.remove(Position::new(1, 1), Position::new(7, 0)).unwrap();
    assert_eq!(text(&shared), "ab?\nc");
}

#[test]
fn test_remove_accepts_reversed_endpoints() {
    let mut shared = SharedBuffer::from_text("abcdef", BufferSettings::default());
    let view = shared.open_view();
    shared
        .view(view)
        .unwrap()
        .remove(Position::new(0, 4), Position::new(0, 1))
        .unwrap();
    assert_eq!(text(&shared), "aef");
}

#[test]
fn test_read_only_buffer_rejects_all_edits() {
    let settings = BufferSettings {
        read_only: true,
        ..Default::default()
    };
    let mut shared = SharedBuffer::from_text("abc", settings);
    let view = shared.open_view();

    let mut buf = shared.view(view).unwrap();
    assert!(matches!(
        buf.replace(Position::new(0, 0), Position::new(0, 1), "z"),
        Err(BufferError::ReadOnly)
    ));
    assert!(matches!(
        buf.multiple_replace(vec![Delta::new("z", Position::new(0, 0), Position::new(0, 1))]),
        Err(BufferError::ReadOnly)
    ));
    assert_eq!(text(&shared), "abc");
}

#[test]
fn test_combining_marks_count_as_one_column() {
    let mut shared = SharedBuffer::from_text("e\u{301}x", BufferSettings::default());
    let view = shared.open_view();
    assert_eq!(shared.lines().character_count(0), 2);

    shared
        .view(view)
        .unwrap()
        .insert(Position::new(0, 1), "-")
        .unwrap();
    assert_eq!(text(&shared), "e\u{301}-x");
}

#[test]
fn test_crlf_content_round_trips() {
    let mut shared = SharedBuffer::from_reader(
        "one\r\ntwo\r\n".as_bytes(),
        10,
        None,
        None,
        BufferSettings::default(),
    )
    .unwrap();
    assert_eq!(shared.line_count(), 3);
    assert_eq!(shared.lines().line_bytes(0), b"one");

    let view = shared.open_view();
    shared
        .view(view)
        .unwrap()
        .insert(Position::new(1, 3), "\r\n2b")
        .unwrap();
    assert_eq!(shared.bytes(), b"one\r\ntwo\r\n2b\r\n");
}
