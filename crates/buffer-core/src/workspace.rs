//! Workspace: open buffers and the views into them.
//!
//! A [`Workspace`] owns every [`SharedBuffer`] in an arena keyed by [`BufferId`]. Opening a path
//! that is already open (compared as an absolute path) does not load it again: it adds a new
//! view to the existing shared buffer, so edits made through one view are immediately visible
//! through the other.
//!
//! Teardown is explicit. [`Workspace::close_view`] reports [`CloseOutcome::BufferClosed`] when the
//! last view of a buffer goes away and the shared buffer is dropped.

use crate::buffer::{Buffer, SharedBuffer};
use crate::error::WorkspaceError;
use crate::line_ending::LineEnding;
use crate::settings::BufferSettings;
use std::collections::{BTreeMap, HashMap};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

/// Opaque identifier for an open buffer in a [`Workspace`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BufferId(u64);

impl BufferId {
    /// Get the underlying numeric id.
    pub fn get(self) -> u64 {
        self.0
    }
}

/// Opaque identifier for a view into a buffer.
///
/// View ids are unique for the lifetime of the process, so per-view caches kept inside a line
/// store can never confuse two views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ViewId(u64);

static NEXT_VIEW_ID: AtomicU64 = AtomicU64::new(1);

impl ViewId {
    /// Get the underlying numeric id.
    pub fn get(self) -> u64 {
        self.0
    }

    pub(crate) fn next() -> Self {
        Self(NEXT_VIEW_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Result of opening a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenBufferResult {
    /// The buffer holding the content.
    pub buffer_id: BufferId,
    /// The new view into that buffer.
    pub view_id: ViewId,
    /// `true` if the path was already open and the view shares its store.
    pub shared: bool,
}

/// What happened when a view was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseOutcome {
    /// Other views of the buffer remain open.
    ViewClosed {
        /// The buffer the view belonged to.
        buffer: BufferId,
        /// Views still open on it.
        remaining: usize,
    },
    /// That was the last view; the buffer was dropped.
    BufferClosed(BufferId),
}

/// Arena of shared buffers and their views.
#[derive(Default)]
pub struct Workspace {
    buffers: BTreeMap<BufferId, SharedBuffer>,
    paths: HashMap<PathBuf, BufferId>,
    views: BTreeMap<ViewId, BufferId>,
    next_buffer_id: u64,
}

impl std::fmt::Debug for Workspace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Workspace")
            .field("buffers", &self.buffers.len())
            .field("views", &self.views.len())
            .finish()
    }
}

fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

impl Workspace {
    /// Create an empty workspace.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of open buffers.
    pub fn len(&self) -> usize {
        self.buffers.len()
    }

    /// Returns `true` if no buffers are open.
    pub fn is_empty(&self) -> bool {
        self.buffers.is_empty()
    }

    /// Number of open views across all buffers.
    pub fn view_count(&self) -> usize {
        self.views.len()
    }

    /// Open a buffer from a byte stream and create a view into it.
    ///
    /// When `path` is already open, `reader` is not consumed and the new view shares the existing
    /// buffer. `size` is the expected byte size of the stream; `endings` forces a line ending.
    pub fn open_buffer<R: Read>(
        &mut self,
        path: Option<&Path>,
        reader: R,
        size: usize,
        endings: Option<LineEnding>,
        settings: BufferSettings,
    ) -> Result<OpenBufferResult, WorkspaceError> {
        let abs_path = path.map(absolute);
        if let Some(existing) = abs_path.as_ref().and_then(|p| self.paths.get(p)).copied() {
            let view_id = self.create_view(existing)?;
            tracing::debug!(buffer = existing.get(), view = view_id.get(), "opened shared view");
            return Ok(OpenBufferResult {
                buffer_id: existing,
                view_id,
                shared: true,
            });
        }

        let shared = SharedBuffer::from_reader(reader, size, endings, abs_path.clone(), settings)?;
        let buffer_id = BufferId(self.next_buffer_id);
        self.next_buffer_id = self.next_buffer_id.saturating_add(1);
        tracing::debug!(
            buffer = buffer_id.get(),
            lines = shared.line_count(),
            endings = shared.endings().name(),
            "opened buffer"
        );
        self.buffers.insert(buffer_id, shared);
        if let Some(p) = abs_path {
            self.paths.insert(p, buffer_id);
        }
        let view_id = self.create_view(buffer_id)?;
        Ok(OpenBufferResult {
            buffer_id,
            view_id,
            shared: false,
        })
    }

    /// Open a buffer from in-memory text.
    pub fn open_text(
        &mut self,
        path: Option<&Path>,
        text: &str,
        settings: BufferSettings,
    ) -> Result<OpenBufferResult, WorkspaceError> {
        self.open_buffer(path, text.as_bytes(), text.len(), None, settings)
    }

    /// Create another view into an open buffer.
    pub fn create_view(&mut self, buffer: BufferId) -> Result<ViewId, WorkspaceError> {
        let shared = self
            .buffers
            .get_mut(&buffer)
            .ok_or(WorkspaceError::BufferNotFound(buffer))?;
        let view_id = shared.open_view();
        self.views.insert(view_id, buffer);
        Ok(view_id)
    }

    /// Buffer id behind a view.
    pub fn buffer_id_for_view(&self, view: ViewId) -> Result<BufferId, WorkspaceError> {
        self.views
            .get(&view)
            .copied()
            .ok_or(WorkspaceError::ViewNotFound(view))
    }

    /// Buffer id open for `path`, if any.
    pub fn buffer_id_for_path(&self, path: &Path) -> Option<BufferId> {
        self.paths.get(&absolute(path)).copied()
    }

    /// The shared buffer with this id.
    pub fn shared(&self, id: BufferId) -> Option<&SharedBuffer> {
        self.buffers.get(&id)
    }

    /// The shared buffer with this id, mutably.
    pub fn shared_mut(&mut self, id: BufferId) -> Option<&mut SharedBuffer> {
        self.buffers.get_mut(&id)
    }

    /// Handle for editing through `view`.
    pub fn buffer(&mut self, view: ViewId) -> Result<Buffer<'_>, WorkspaceError> {
        let id = self.buffer_id_for_view(view)?;
        self.buffers
            .get_mut(&id)
            .and_then(|shared| shared.view(view))
            .ok_or(WorkspaceError::ViewNotFound(view))
    }

    /// Close a view, dropping its buffer if it was the last one.
    pub fn close_view(&mut self, view: ViewId) -> Result<CloseOutcome, WorkspaceError> {
        let id = self
            .views
            .remove(&view)
            .ok_or(WorkspaceError::ViewNotFound(view))?;
        let shared = self
            .buffers
            .get_mut(&id)
            .ok_or(WorkspaceError::BufferNotFound(id))?;
        shared.close_view(view);

        let remaining = shared.view_count();
        if remaining > 0 {
            tracing::debug!(buffer = id.get(), view = view.get(), remaining, "closed view");
            return Ok(CloseOutcome::ViewClosed {
                buffer: id,
                remaining,
            });
        }

        if let Some(shared) = self.buffers.remove(&id)
            && let Some(path) = shared.path()
        {
            self.paths.remove(path);
        }
        tracing::debug!(buffer = id.get(), "closed buffer");
        Ok(CloseOutcome::BufferClosed(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Position;

    #[test]
    fn test_view_ids_are_unique() {
        let a = ViewId::next();
        let b = ViewId::next();
        assert_ne!(a, b);
    }

    #[test]
    fn test_same_path_shares_store() {
        let mut ws = Workspace::new();
        let path = Path::new("shared.txt");
        let first = ws
            .open_text(Some(path), "abc", BufferSettings::default())
            .unwrap();
        let second = ws
            .open_text(Some(path), "ignored", BufferSettings::default())
            .unwrap();
        assert!(!first.shared);
        assert!(second.shared);
        assert_eq!(first.buffer_id, second.buffer_id);
        assert_eq!(ws.len(), 1);

        ws.buffer(first.view_id)
            .unwrap()
            .insert(Position::new(0, 3), "d")
            .unwrap();
        let shared = ws.shared(second.buffer_id).unwrap();
        assert_eq!(shared.bytes(), b"abcd");
    }

    #[test]
    fn test_unnamed_buffers_never_share() {
        let mut ws = Workspace::new();
        let a = ws.open_text(None, "x", BufferSettings::default()).unwrap();
        let b = ws.open_text(None, "x", BufferSettings::default()).unwrap();
        assert_ne!(a.buffer_id, b.buffer_id);
    }

    #[test]
    fn test_close_last_view_drops_buffer() {
        let mut ws = Workspace::new();
        let path = Path::new("close.txt");
        let a = ws.open_text(Some(path), "", BufferSettings::default()).unwrap();
        let b = ws.open_text(Some(path), "", BufferSettings::default()).unwrap();

        assert_eq!(
            ws.close_view(a.view_id).unwrap(),
            CloseOutcome::ViewClosed {
                buffer: a.buffer_id,
                remaining: 1
            }
        );
        assert_eq!(
            ws.close_view(b.view_id).unwrap(),
            CloseOutcome::BufferClosed(a.buffer_id)
        );
        assert!(ws.is_empty());
        assert_eq!(ws.buffer_id_for_path(path), None);
        assert!(matches!(
            ws.close_view(b.view_id),
            Err(WorkspaceError::ViewNotFound(_))
        ));
    }
}
