//! Lexer choice and gutter setup for embedded files.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::config::LineNumbers;
use crate::host::{GutterOptions, Host, LanguageOption, LexerDetection};

/// Remembers the lexer picked for each path, including "none".
///
/// Ambiguous detections prompt the user once per path.
#[derive(Debug, Default)]
pub struct LexerCache {
    entries: HashMap<PathBuf, Option<String>>,
}

impl LexerCache {
    pub fn detect<H: Host>(&mut self, host: &mut H, path: &Path) -> Option<String> {
        if let Some(cached) = self.entries.get(path) {
            return cached.clone();
        }

        let lexer = match host.detect_lexer(path) {
            LexerDetection::Unknown => None,
            LexerDetection::Found(lexer) => Some(lexer),
            LexerDetection::Ambiguous(candidates) => {
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().to_string())
                    .unwrap_or_default();
                let caption = format!("Choose lexer for: {name}");
                host.choose(&caption, &candidates)
                    .and_then(|index| candidates.get(index).cloned())
            }
        };

        tracing::debug!(path = %path.display(), ?lexer, "detected lexer");
        self.entries.insert(path.to_path_buf(), lexer.clone());
        lexer
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Gutter of the embedded editor, following the lexer's own options.
///
/// Line numbers follow `numbers_show` only when `line_numbers` is
/// [`LineNumbers::Inherit`].
pub fn gutter_options<H: Host>(
    host: &H,
    lexer: Option<&str>,
    line_numbers: LineNumbers,
) -> GutterOptions {
    if !host.language_option(lexer, LanguageOption::GutterShow) {
        return GutterOptions::default();
    }
    GutterOptions {
        show: true,
        bookmarks: host.language_option(lexer, LanguageOption::GutterBookmarks),
        fold: host.language_option(lexer, LanguageOption::GutterFold),
        numbers: match line_numbers {
            LineNumbers::Hide => false,
            LineNumbers::Show => true,
            LineNumbers::Inherit => host.language_option(lexer, LanguageOption::NumbersShow),
        },
    }
}
