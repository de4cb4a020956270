//! The strip below the embedded editor: `[To new tab][Save][ path ][Close]`.
//!
//! Always rebuilt from scratch; nothing here is persisted.

use std::path::{MAIN_SEPARATOR, Path};

use crate::host::{Color, ThemeColors};

/// Fixed-width buttons are this many button heights wide.
const BUTTON_WIDTH_FACTOR: u32 = 4;

const MODIFIED_MARK: char = '*';

/// What clicking a bar cell does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ButtonAction {
    ToNewTab,
    Save,
    Close,
}

impl ButtonAction {
    /// Identifier the host passes back to the button callback.
    pub const fn id(self) -> &'static str {
        match self {
            Self::ToNewTab => "to_new_tab",
            Self::Save => "btn_em_save",
            Self::Close => "btn_em_close",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        [Self::ToNewTab, Self::Save, Self::Close]
            .into_iter()
            .find(|action| action.id() == id)
    }
}

/// One cell of the bar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BarCell {
    pub text: String,
    /// Fixed width in pixels; `None` stretches to fill the bar.
    pub width: Option<u32>,
    /// `None` when the cell is not clickable.
    pub action: Option<ButtonAction>,
    pub hint: Option<String>,
    pub background: Color,
    pub foreground: Color,
}

/// Inputs the bar is derived from.
#[derive(Debug, Clone, Copy)]
pub struct BarContent<'a> {
    /// Explicit caption; falls back to `display_path`.
    pub caption: Option<&'a str>,
    /// Path with the home directory collapsed to `~`.
    pub display_path: &'a str,
    pub modified: bool,
    pub writable: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ButtonBar {
    cells: Vec<BarCell>,
}

impl ButtonBar {
    pub fn build(content: &BarContent<'_>, colors: &ThemeColors, button_height: u32) -> Self {
        let button_width = Some(button_height * BUTTON_WIDTH_FACTOR);
        let cell = |text: String, width, action: Option<ButtonAction>, hint| {
            let (background, foreground) = match action {
                Some(_) => (colors.tab_active, colors.tab_font),
                None if content.modified => (colors.tab_passive, colors.tab_font_modified),
                None => (colors.tab_passive, colors.tab_font),
            };
            BarCell {
                text,
                width,
                action,
                hint,
                background,
                foreground,
            }
        };

        let mut caption = content.caption.unwrap_or(content.display_path).to_string();
        if content.modified {
            caption.insert(0, MODIFIED_MARK);
        }

        Self {
            cells: vec![
                cell(
                    "To new tab".to_string(),
                    button_width,
                    Some(ButtonAction::ToNewTab),
                    None,
                ),
                cell(
                    "Save".to_string(),
                    button_width,
                    content.writable.then_some(ButtonAction::Save),
                    None,
                ),
                cell(caption, None, None, Some(content.display_path.to_string())),
                cell(
                    "Close".to_string(),
                    button_width,
                    Some(ButtonAction::Close),
                    None,
                ),
            ],
        }
    }

    pub fn cells(&self) -> &[BarCell] {
        &self.cells
    }

    /// The stretching caption cell.
    pub fn caption(&self) -> Option<&BarCell> {
        self.cells.iter().find(|cell| cell.width.is_none())
    }
}

/// Display form of `path` with the user's home directory shown as `~`.
pub fn collapse_path(path: &Path) -> String {
    collapse_home(path, dirs::home_dir().as_deref())
}

fn collapse_home(path: &Path, home: Option<&Path>) -> String {
    let Some(rest) = home.and_then(|home| path.strip_prefix(home).ok()) else {
        return path.display().to_string();
    };
    if rest.as_os_str().is_empty() {
        "~".to_string()
    } else {
        format!("~{MAIN_SEPARATOR}{}", rest.display())
    }
}
