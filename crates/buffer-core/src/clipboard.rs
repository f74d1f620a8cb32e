//! Clipboard consumer interface.

/// Clipboard register a selection can be copied into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Register {
    /// The system clipboard.
    Clipboard,
    /// The primary selection (X11-style).
    Primary,
}

/// Destination for copied selections. Implemented by the host.
pub trait Clipboard {
    /// Store `text` from cursor `num` of `total` cursors into `register`.
    fn write_multi(&mut self, text: &str, register: Register, num: usize, total: usize);
}
