use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::embed::encoding::TextEncoding;
use crate::host::{Caret, EmbeddedView, ScrollPos};

/// Visibility of a document's embedded region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Hidden,
    Visible,
    /// Collapse animation in progress; buttons and keys are ignored.
    Hiding,
}

/// Everything one host document knows about its embedded region.
///
/// Scroll positions and pending carets are keyed by file path and survive
/// hide/show cycles, but die with the document.
#[derive(Debug)]
pub struct EmbeddedState<V> {
    pub(super) view: Option<V>,
    /// Hidden view awaiting disposal at the start of the next show.
    pub(super) release_pending: Option<V>,
    pub(super) phase: Phase,
    pub(super) path: Option<PathBuf>,
    pub(super) caption: Option<String>,
    pub(super) anchor_line: usize,
    pub(super) encoding: Option<TextEncoding>,
    /// Height the region was shown with; the collapse starts from here.
    pub(super) height: u32,
    /// Modified flag the button bar was last built with.
    pub(super) bar_modified: Option<bool>,
    pub(super) scroll_positions: HashMap<PathBuf, ScrollPos>,
    pub(super) pending_carets: HashMap<PathBuf, Vec<Caret>>,
}

impl<V> Default for EmbeddedState<V> {
    fn default() -> Self {
        Self {
            view: None,
            release_pending: None,
            phase: Phase::Hidden,
            path: None,
            caption: None,
            anchor_line: 0,
            encoding: None,
            height: 0,
            bar_modified: None,
            scroll_positions: HashMap::new(),
            pending_carets: HashMap::new(),
        }
    }
}

impl<V: EmbeddedView> EmbeddedState<V> {
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_visible(&self) -> bool {
        self.phase == Phase::Visible && self.view.as_ref().is_some_and(V::is_visible)
    }

    pub fn is_modified(&self) -> bool {
        self.view.as_ref().is_some_and(V::is_modified)
    }

    pub fn view(&self) -> Option<&V> {
        self.view.as_ref()
    }

    pub fn view_mut(&mut self) -> Option<&mut V> {
        self.view.as_mut()
    }

    pub fn has_release_pending(&self) -> bool {
        self.release_pending.is_some()
    }

    /// File shown (or last shown) in the region.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub const fn anchor_line(&self) -> usize {
        self.anchor_line
    }

    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Encoding the current file was read with.
    pub const fn encoding(&self) -> Option<TextEncoding> {
        self.encoding
    }

    pub fn scroll_position(&self, path: &Path) -> Option<ScrollPos> {
        self.scroll_positions.get(path).copied()
    }

    pub fn pending_carets(&self, path: &Path) -> Option<&[Caret]> {
        self.pending_carets.get(path).map(Vec::as_slice)
    }

    pub fn remember_scroll(&mut self, path: PathBuf, pos: ScrollPos) {
        self.scroll_positions.insert(path, pos);
    }

    /// Carets to apply the next time `path` is shown.
    pub fn remember_carets(&mut self, path: PathBuf, carets: Vec<Caret>) {
        self.pending_carets.insert(path, carets);
    }

    pub(super) fn remember_current_scroll(&mut self) {
        if let (Some(view), Some(path)) = (self.view.as_ref(), self.path.as_ref()) {
            self.scroll_positions.insert(path.clone(), view.scroll());
        }
    }

    /// Free both the live and the pending view.
    pub(super) fn dispose(self) {
        if let Some(view) = self.view {
            view.dispose();
        }
        if let Some(view) = self.release_pending {
            view.dispose();
        }
    }
}
