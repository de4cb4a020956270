// Only allow lints that are either transitive-dependency noise or
// genuinely opinionated style choices that don't indicate real issues.
#![allow(
    // Transitive dependency version mismatches we can't control
    clippy::multiple_crate_versions,
    // module_name_repetitions is pure style preference (e.g. embed::EmbeddedState)
    clippy::module_name_repetitions
)]

//! # Embedded editor
//!
//! Opens a file referenced from the current document in a small editor
//! shown inline, directly below the referencing line.
//!
//! - The file path under the caret is found with user-configurable regular
//!   expressions, optionally scoped to the document's lexer
//! - The embedded file is read with an encoding fallback chain
//! - Edits can be saved in place, moved to a regular tab, or discarded
//! - Scroll position is remembered per file across hide/show
//!
//! ## Architecture
//!
//! The crate never touches a real UI. The host editor implements the traits
//! in [`host`] and forwards its commands and events to [`plugin::EmbedPlugin`].
//!
//! ## Modules
//!
//! - [`patterns`]: Path pattern groups and resolution
//! - [`embed`]: The embedded region controller
//! - [`host`]: Traits the host editor implements
//! - [`api`]: Validated requests from other plugins
//! - [`config`]: Settings and pattern file locations
//! - [`plugin`]: Command and event entry points

pub mod api;
pub mod config;
pub mod embed;
pub mod error;
pub mod host;
pub mod patterns;
pub mod plugin;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::api::OpenRequest;
    pub use crate::config::{ConfigPaths, EmbedConfig, PluginSettings};
    pub use crate::embed::{EmbeddedRegionController, HideOutcome, SaveOutcome};
    pub use crate::error::{EmbedError, Result};
    pub use crate::host::{EmbeddedView, Host, HostDocument};
    pub use crate::patterns::PatternSet;
    pub use crate::plugin::EmbedPlugin;
}
