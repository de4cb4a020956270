//! Seams to the host editor.
//!
//! The controller never talks to windows, dialogs or text buffers directly.
//! The host implements these traits for its own document, dialog and
//! application objects; tests implement them in memory.

use std::fs;
use std::path::{Path, PathBuf};

use crate::embed::ButtonBar;

/// Stable, opaque identity of a host document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocHandle(pub u64);

/// A caret, or a selection with the caret at (`x0`, `y0`) and the other end
/// at (`x1`, `y1`).
///
/// Coordinates are character columns and zero-based lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Caret {
    Point { x: usize, y: usize },
    Selection { x0: usize, y0: usize, x1: usize, y1: usize },
}

impl Caret {
    pub const fn point(x: usize, y: usize) -> Self {
        Self::Point { x, y }
    }

    /// Caret position (column, line).
    pub const fn position(&self) -> (usize, usize) {
        match *self {
            Self::Point { x, y } | Self::Selection { x0: x, y0: y, .. } => (x, y),
        }
    }

    pub const fn is_selection(&self) -> bool {
        matches!(self, Self::Selection { .. })
    }
}

/// Horizontal and vertical scroll offsets of an editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct ScrollPos {
    pub x: usize,
    pub y: usize,
}

impl ScrollPos {
    pub const fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }
}

/// Pixel rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Rect {
    pub const fn width(&self) -> i32 {
        self.right - self.left
    }
}

/// Size of one character cell in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellSize {
    pub width: u32,
    pub height: u32,
}

/// Pixel size of the embedded region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RegionSize {
    pub width: u32,
    pub height: u32,
}

/// An RGB color as the host encodes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Color(pub u32);

/// Theme colors the embedded region borrows from the host's tab strip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ThemeColors {
    /// Dialog and editor backgrounds, for the host to apply in
    /// [`Host::create_view`]. The button bar does not use them.
    pub form_background: Color,
    pub editor_background: Color,
    pub tab_font: Color,
    pub tab_font_modified: Color,
    pub tab_active: Color,
    pub tab_passive: Color,
}

/// Per-line change marker shown in the gutter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineState {
    Normal,
    Changed,
    Added,
    Saved,
}

/// Answer to the "save before closing?" prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveChoice {
    Save,
    Discard,
    Cancel,
}

/// Result of asking the host which lexer suits a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LexerDetection {
    Unknown,
    Found(String),
    /// Several lexers claim the file; the user has to pick one.
    Ambiguous(Vec<String>),
}

/// Lexer-scoped boolean options the embedded gutter mirrors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LanguageOption {
    GutterShow,
    GutterBookmarks,
    GutterFold,
    NumbersShow,
}

/// Gutter columns of the embedded editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GutterOptions {
    pub show: bool,
    pub bookmarks: bool,
    pub fold: bool,
    pub numbers: bool,
}

/// Anything that can be scrolled and given carets: the embedded editor, or a
/// regular tab the file was promoted to.
pub trait CaretTarget {
    fn set_scroll(&mut self, pos: ScrollPos);

    /// Replace all carets. An empty slice leaves carets untouched.
    fn set_carets(&mut self, carets: &[Caret]);
}

/// The document the user is working in; the embedded region lives inside it.
pub trait HostDocument {
    fn handle(&self) -> DocHandle;
    fn file_name(&self) -> Option<PathBuf>;
    /// Declared encoding name, e.g. `utf8` or `cp1252`.
    fn encoding(&self) -> String;
    fn lexer(&self) -> Option<String>;
    fn line_count(&self) -> usize;
    fn line_text(&self, line: usize) -> Option<String>;
    fn carets(&self) -> Vec<Caret>;
    fn cell_size(&self) -> CellSize;
    /// Text area rectangle, excluding gutter and scrollbars.
    fn text_rect(&self) -> Rect;
    /// Pixel position of the start of `line`, if it is on screen.
    fn line_to_pixels(&self, line: usize) -> Option<(i32, i32)>;
    /// Reserve `height` pixels below `line` for the embedded region,
    /// replacing any gap added before.
    fn set_gap(&mut self, line: usize, height: u32);
    fn remove_gap(&mut self);
    fn focus(&mut self);
}

/// The embedded sub-editor together with the dialog hosting it.
pub trait EmbeddedView: CaretTarget {
    fn set_text(&mut self, text: &str);
    fn text(&self) -> String;
    fn is_modified(&self) -> bool;
    fn set_modified(&mut self, modified: bool);
    fn is_read_only(&self) -> bool;
    fn set_read_only(&mut self, read_only: bool);
    fn set_lexer(&mut self, lexer: Option<&str>);
    fn set_gutter(&mut self, gutter: GutterOptions);
    fn set_top_line(&mut self, line: usize);
    fn scroll(&self) -> ScrollPos;
    fn carets(&self) -> Vec<Caret>;
    fn line_states(&self) -> Vec<LineState>;
    fn set_line_state(&mut self, line: usize, state: LineState);
    /// Dock the view into `parent`'s gap with the given size.
    fn place(&mut self, parent: DocHandle, size: RegionSize);
    fn set_height(&mut self, height: u32);
    fn set_button_bar(&mut self, bar: &ButtonBar);
    fn show(&mut self);
    fn hide(&mut self);
    fn is_visible(&self) -> bool;
    /// Free the underlying dialog. Never called from inside the view's own callbacks.
    fn dispose(self);
}

/// Application-level services.
pub trait Host {
    type View: EmbeddedView;
    type Tab: CaretTarget;

    fn create_view(&mut self, colors: &ThemeColors) -> Self::View;
    fn theme(&self) -> ThemeColors;
    /// Height of a standard button, used for the button bar.
    fn button_height(&self) -> u32;
    fn is_windows(&self) -> bool;

    /// Show a transient status-bar message.
    fn status(&mut self, message: &str);
    fn ask_save(&mut self, message: &str) -> SaveChoice;
    /// Let the user pick one of `items`; `None` when dismissed.
    fn choose(&mut self, caption: &str, items: &[String]) -> Option<usize>;

    /// Whether `path` may be saved in place. Unwritable files open read-only.
    fn is_writable(&self, path: &Path) -> bool {
        fs::OpenOptions::new().write(true).open(path).is_ok()
    }

    fn detect_lexer(&mut self, path: &Path) -> LexerDetection;
    fn language_option(&self, lexer: Option<&str>, option: LanguageOption) -> bool;

    /// Open `path` as a regular tab and make it active.
    fn open_tab(&mut self, path: &Path) -> Option<&mut Self::Tab>;
    fn open_url(&mut self, url: &str);

    /// Arm a zero-delay one-shot timer; when it fires the host calls
    /// `on_restore_pos` for `doc`.
    fn schedule_restore(&mut self, doc: DocHandle);
    /// Let the host repaint and process pending messages.
    fn process_idle(&mut self);
}
