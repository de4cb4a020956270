//! Error types shared across the crate.
//!
//! Pattern configuration problems are diagnostics, not errors: they are
//! collected on the loaded [`PatternSet`](crate::patterns::PatternSet) and the
//! offending entry is dropped. Only an unreadable or unparseable pattern
//! document fails a load.

use std::path::PathBuf;

use thiserror::Error;

/// A pattern document could not be read or parsed at all.
#[derive(Debug, Error)]
pub enum PatternLoadError {
    #[error("I/O error reading {path}: {error}")]
    Io {
        path: PathBuf,
        error: std::io::Error,
    },

    #[error("pattern document is not valid JSON: {0}")]
    Syntax(#[from] json5::Error),

    #[error("pattern document must be an object of groups")]
    NotAnObject,
}

/// A single dropped pattern or group, reported while loading.
#[derive(Debug, Error)]
pub enum PatternDiagnostic {
    #[error("pattern ({pattern}) in group \"{group}\" is missing a named group \"path\"")]
    MissingPathGroup { group: String, pattern: String },

    #[error("failed to compile pattern in group \"{group}\": {pattern}")]
    InvalidRegex {
        group: String,
        pattern: String,
        #[source]
        error: Box<regex::Error>,
    },

    #[error("invalid patterns in group: {0}. Should be a list")]
    PatternsNotList(String),

    #[error("invalid \"lexers\" in group: {0}. Should be a list")]
    LexersNotList(String),

    #[error("non-string pattern in group \"{group}\": {value}")]
    PatternNotString { group: String, value: String },

    #[error("group \"{0}\" should be an object with \"path_patterns\"")]
    GroupNotObject(String),
}

/// Invalid arguments passed to the programmatic open entry point.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArgumentError {
    #[error("`scroll_to` should be `None` or a tuple: (x,y)")]
    ScrollShape,

    #[error("`carets` should be `None` or a list")]
    CaretsNotList,

    #[error("`carets` elements should be tuples: (x,y) or (x0,y0, x1,y1); element {0} is not")]
    CaretShape(usize),

    #[error("coordinates must be non-negative integers")]
    Coordinate,

    #[error("missing or invalid field `{0}`")]
    Field(&'static str),
}

/// Failures of embedded-region operations.
///
/// All of these are advisory: the controller reports them through the host
/// status line and leaves its state unchanged.
#[derive(Debug, Error)]
pub enum EmbedError {
    #[error("No carets in document")]
    NoCaret,

    #[error("Embedded editor needs a single caret")]
    MultipleCarets,

    #[error("Embedded editor needs a caret without selection")]
    SelectionActive,

    #[error("Document has no file name")]
    NoFileName,

    #[error("No embedded file-path was found")]
    NoPathFound,

    #[error("Linked file was not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("Failed to access {}: {error}", .path.display())]
    Io {
        path: PathBuf,
        error: std::io::Error,
    },

    #[error(transparent)]
    Argument(#[from] ArgumentError),
}

pub type Result<T> = std::result::Result<T, EmbedError>;
