//! Entry point for other plugins: open a given file embedded at a given line.
//!
//! Requests usually arrive as loosely typed data, so everything is validated
//! up front; an invalid request never touches controller state.

use std::path::PathBuf;

use serde_json::Value;

use crate::error::ArgumentError;
use crate::host::{Caret, ScrollPos};

/// A validated request to open `path` below `anchor_line`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenRequest {
    pub path: PathBuf,
    /// Line of the current document; clamped to its range when applied.
    pub anchor_line: i64,
    pub caption: Option<String>,
    /// Top-left visible position; takes precedence over the remembered one.
    pub scroll_to: Option<ScrollPos>,
    /// Carets to place once the file is shown.
    pub carets: Option<Vec<Caret>>,
}

impl OpenRequest {
    pub fn new(path: impl Into<PathBuf>, anchor_line: i64) -> Self {
        Self {
            path: path.into(),
            anchor_line,
            caption: None,
            scroll_to: None,
            carets: None,
        }
    }

    #[must_use]
    pub fn with_caption(mut self, caption: impl Into<String>) -> Self {
        self.caption = Some(caption.into());
        self
    }

    #[must_use]
    pub const fn with_scroll(mut self, scroll: ScrollPos) -> Self {
        self.scroll_to = Some(scroll);
        self
    }

    #[must_use]
    pub fn with_carets(mut self, carets: Vec<Caret>) -> Self {
        self.carets = Some(carets);
        self
    }

    /// Build a request from raw coordinate lists.
    ///
    /// `scroll_to` must hold exactly two numbers; each caret two (a caret) or
    /// four (a selection).
    ///
    /// # Errors
    /// Returns an error describing the first malformed argument.
    pub fn from_parts(
        path: impl Into<PathBuf>,
        anchor_line: i64,
        caption: Option<String>,
        scroll_to: Option<&[i64]>,
        carets: Option<&[Vec<i64>]>,
    ) -> Result<Self, ArgumentError> {
        let scroll_to = scroll_to.map(scroll_from_coords).transpose()?;
        let carets = carets
            .map(|carets| {
                carets
                    .iter()
                    .enumerate()
                    .map(|(index, coords)| caret_from_coords(index, coords))
                    .collect::<Result<Vec<_>, _>>()
            })
            .transpose()?;

        Ok(Self {
            path: path.into(),
            anchor_line,
            caption,
            scroll_to,
            carets,
        })
    }

    /// Build a request from a JSON object:
    /// `{"path": str, "line": int, "caption"?: str, "scroll_to"?: [x, y], "carets"?: [[x, y] | [x0, y0, x1, y1]]}`.
    ///
    /// # Errors
    /// Returns an error if a field is missing or has the wrong shape.
    pub fn from_json(value: &Value) -> Result<Self, ArgumentError> {
        let path = value
            .get("path")
            .and_then(Value::as_str)
            .ok_or(ArgumentError::Field("path"))?;
        let line = value
            .get("line")
            .and_then(Value::as_i64)
            .ok_or(ArgumentError::Field("line"))?;
        let caption = match value.get("caption") {
            None | Some(Value::Null) => None,
            Some(Value::String(caption)) => Some(caption.clone()),
            Some(_) => return Err(ArgumentError::Field("caption")),
        };

        let scroll_to = match value.get("scroll_to") {
            None | Some(Value::Null) => None,
            Some(Value::Array(items)) => Some(ints(items).ok_or(ArgumentError::ScrollShape)?),
            Some(_) => return Err(ArgumentError::ScrollShape),
        };

        let carets = match value.get("carets") {
            None | Some(Value::Null) => None,
            Some(Value::Array(items)) => Some(
                items
                    .iter()
                    .enumerate()
                    .map(|(index, item)| match item {
                        Value::Array(coords) => {
                            ints(coords).ok_or(ArgumentError::CaretShape(index))
                        }
                        _ => Err(ArgumentError::CaretShape(index)),
                    })
                    .collect::<Result<Vec<_>, _>>()?,
            ),
            Some(_) => return Err(ArgumentError::CaretsNotList),
        };

        Self::from_parts(
            path,
            line,
            caption,
            scroll_to.as_deref(),
            carets.as_deref(),
        )
    }
}

fn ints(items: &[Value]) -> Option<Vec<i64>> {
    items.iter().map(Value::as_i64).collect()
}

fn coord(value: i64) -> Result<usize, ArgumentError> {
    usize::try_from(value).map_err(|_| ArgumentError::Coordinate)
}

fn scroll_from_coords(coords: &[i64]) -> Result<ScrollPos, ArgumentError> {
    match *coords {
        [x, y] => Ok(ScrollPos::new(coord(x)?, coord(y)?)),
        _ => Err(ArgumentError::ScrollShape),
    }
}

/// A four-number caret whose second point is `-1` has no selection.
fn caret_from_coords(index: usize, coords: &[i64]) -> Result<Caret, ArgumentError> {
    match *coords {
        [x, y] | [x, y, -1, -1] => Ok(Caret::point(coord(x)?, coord(y)?)),
        [x0, y0, x1, y1] => Ok(Caret::Selection {
            x0: coord(x0)?,
            y0: coord(y0)?,
            x1: coord(x1)?,
            y1: coord(y1)?,
        }),
        _ => Err(ArgumentError::CaretShape(index)),
    }
}
