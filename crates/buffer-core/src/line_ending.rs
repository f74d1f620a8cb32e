//! Line ending helpers.
//!
//! Lines are stored without their terminator. A [`crate::LineArray`] carries one global
//! [`LineEnding`], picked from the first terminator seen while loading, and uses it whenever the
//! content is serialized back to bytes.

use serde::{Deserialize, Serialize};

/// The newline sequence used when serializing a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LineEnding {
    /// Unix-style LF (`'\n'`).
    #[default]
    Lf,
    /// Windows-style CRLF (`"\r\n"`).
    Crlf,
}

impl LineEnding {
    /// Classify a single raw line as read from a stream (terminator included, if any).
    ///
    /// Returns `None` for an empty chunk, which carries no information.
    pub fn detect_in_line(raw: &[u8]) -> Option<Self> {
        match raw {
            [] => None,
            [.., b'\r', b'\n'] => Some(Self::Crlf),
            _ => Some(Self::Lf),
        }
    }

    /// The terminator bytes.
    pub fn as_bytes(self) -> &'static [u8] {
        match self {
            Self::Lf => b"\n",
            Self::Crlf => b"\r\n",
        }
    }

    /// Settings-style name (`"unix"` / `"dos"`).
    pub fn name(self) -> &'static str {
        match self {
            Self::Lf => "unix",
            Self::Crlf => "dos",
        }
    }
}
