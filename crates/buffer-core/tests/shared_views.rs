use buffer_core::{BufferSettings, CloseOutcome, ModifiedRange, Position, Workspace};
use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use std::path::Path;
use std::sync::Arc;

#[test]
fn test_edit_in_one_view_moves_cursors_in_another() {
    let mut ws = Workspace::new();
    let path = Path::new("notes.txt");
    let a = ws
        .open_text(Some(path), "alpha\nbeta", BufferSettings::default())
        .unwrap();
    let b = ws
        .open_text(Some(path), "", BufferSettings::default())
        .unwrap();
    assert!(b.shared);
    assert_eq!(ws.view_count(), 2);

    ws.buffer(b.view_id)
        .unwrap()
        .move_cursor(0, buffer_core::CursorCommand::Goto(Position::new(1, 2)));

    ws.buffer(a.view_id)
        .unwrap()
        .insert(Position::new(0, 0), "zero\n")
        .unwrap();

    let view_b = ws.buffer(b.view_id).unwrap();
    assert_eq!(view_b.shared().bytes(), b"zero\nalpha\nbeta");
    assert_eq!(view_b.active_cursor().loc, Position::new(2, 2));
}

#[test]
fn test_views_share_history() {
    let mut ws = Workspace::new();
    let path = Path::new("history.txt");
    let a = ws
        .open_text(Some(path), "x", BufferSettings::default())
        .unwrap();
    let b = ws
        .open_text(Some(path), "", BufferSettings::default())
        .unwrap();

    ws.buffer(a.view_id)
        .unwrap()
        .insert(Position::new(0, 1), "y")
        .unwrap();
    assert_eq!(ws.buffer(b.view_id).unwrap().undo(), 1);
    assert_eq!(ws.shared(a.buffer_id).unwrap().bytes(), b"x");
    assert!(ws.shared(a.buffer_id).unwrap().can_redo());
}

#[test]
fn test_modified_callback_sees_edits_from_every_view() {
    let mut ws = Workspace::new();
    let path = Path::new("callbacks.txt");
    let a = ws
        .open_text(Some(path), "a\nb\nc", BufferSettings::default())
        .unwrap();
    let b = ws
        .open_text(Some(path), "", BufferSettings::default())
        .unwrap();

    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    ws.shared_mut(a.buffer_id)
        .unwrap()
        .on_modified(move |range| sink.lock().push(range));

    ws.buffer(a.view_id)
        .unwrap()
        .insert(Position::new(0, 1), "!")
        .unwrap();
    ws.buffer(b.view_id)
        .unwrap()
        .remove(Position::new(1, 1), Position::new(2, 0))
        .unwrap();

    assert_eq!(
        *seen.lock(),
        vec![
            ModifiedRange {
                start_line: 0,
                end_line: 0
            },
            ModifiedRange {
                start_line: 1,
                end_line: 1
            },
        ]
    );
}

#[test]
fn test_line_store_handle_reads_from_another_thread() {
    let mut ws = Workspace::new();
    let opened = ws
        .open_text(None, "one\ntwo", BufferSettings::default())
        .unwrap();
    let handle = ws.shared(opened.buffer_id).unwrap().line_store();

    ws.buffer(opened.view_id)
        .unwrap()
        .insert(Position::new(1, 3), "\nthree")
        .unwrap();

    let reader = std::thread::spawn(move || (handle.line_count(), handle.snapshot_bytes()));
    let (count, bytes) = reader.join().unwrap();
    assert_eq!(count, 3);
    assert_eq!(bytes, b"one\ntwo\nthree");
}

#[test]
fn test_closing_views_tears_down_buffer() {
    let mut ws = Workspace::new();
    let path = Path::new("teardown.txt");
    let a = ws
        .open_text(Some(path), "keep", BufferSettings::default())
        .unwrap();
    let b = ws
        .open_text(Some(path), "", BufferSettings::default())
        .unwrap();

    assert!(matches!(
        ws.close_view(a.view_id).unwrap(),
        CloseOutcome::ViewClosed { remaining: 1, .. }
    ));
    assert_eq!(ws.buffer(b.view_id).unwrap().shared().bytes(), b"keep");
    assert_eq!(
        ws.close_view(b.view_id).unwrap(),
        CloseOutcome::BufferClosed(a.buffer_id)
    );

    let reopened = ws
        .open_text(Some(path), "fresh", BufferSettings::default())
        .unwrap();
    assert!(!reopened.shared);
    assert_eq!(ws.shared(reopened.buffer_id).unwrap().bytes(), b"fresh");
}
