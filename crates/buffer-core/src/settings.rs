//! Per-buffer options.
//!
//! Loading settings files is the host's job; this struct is the shape the core consumes. Missing
//! fields fall back to their defaults when deserialized.

use serde::{Deserialize, Serialize};

/// Options consumed by cursor movement and buffer orchestration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BufferSettings {
    /// Width of a tab stop in cells, used for visual columns.
    pub tab_size: usize,
    /// Indent with spaces instead of `'\t'`.
    pub tabs_to_spaces: bool,
    /// Allow copying into the primary selection register.
    pub use_primary: bool,
    /// Case-insensitive search.
    pub ignore_case: bool,
    /// Reject all edits.
    pub read_only: bool,
}

impl Default for BufferSettings {
    fn default() -> Self {
        Self {
            tab_size: 4,
            tabs_to_spaces: false,
            use_primary: true,
            ignore_case: false,
            read_only: false,
        }
    }
}

impl BufferSettings {
    /// One level of indentation.
    pub fn indent_string(&self) -> String {
        if self.tabs_to_spaces {
            " ".repeat(self.tab_size)
        } else {
            "\t".to_string()
        }
    }
}
