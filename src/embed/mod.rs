//! The embedded editor region shown inline below a line of a host document.
//!
//! One [`EmbeddedRegionController`] serves every open document; each document
//! gets its own [`EmbeddedState`], created on first use and dropped when the
//! document closes.

mod animation;
mod button_bar;
mod controller;
mod encoding;
mod geometry;
mod lexer;
mod state;

#[cfg(test)]
pub(crate) mod tests;

pub use animation::{Collapse, HIDE_ANIMATION, ease_out_quad};
pub use button_bar::{BarCell, BarContent, ButtonAction, ButtonBar, collapse_path};
pub use controller::{EmbeddedRegionController, HideOutcome, SaveOutcome, VK_ESCAPE};
pub use encoding::{TextEncoding, decode_with_fallback, is_default_encoding, read_with_fallback};
pub use geometry::{clamp_anchor_line, full_height, region_size};
pub use lexer::{LexerCache, gutter_options};
pub use state::{EmbeddedState, Phase};
