//! Plugin entry point: commands and host events.
//!
//! The host creates one [`EmbedPlugin`] at startup and forwards its commands
//! and document events here.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde_json::Value;

use crate::api::OpenRequest;
use crate::config::{ConfigPaths, EmbedConfig, IniFile, save_settings, seed_user_patterns};
use crate::embed::{ButtonAction, EmbeddedRegionController};
use crate::error::EmbedError;
use crate::host::{DocHandle, EmbeddedView, Host, HostDocument};

#[derive(Debug)]
pub struct EmbedPlugin<V> {
    paths: ConfigPaths,
    controller: EmbeddedRegionController<V>,
}

impl<V: EmbeddedView> EmbedPlugin<V> {
    /// Load configuration from `paths` and start with no region shown.
    pub fn new(paths: ConfigPaths) -> Self {
        let config = EmbedConfig::load(&paths);
        tracing::info!(
            groups = config.patterns.groups().len(),
            max_lines = config.settings.editor_max_lines,
            "embedded editor loaded"
        );
        Self {
            paths,
            controller: EmbeddedRegionController::new(Arc::new(config)),
        }
    }

    pub const fn paths(&self) -> &ConfigPaths {
        &self.paths
    }

    pub const fn controller(&self) -> &EmbeddedRegionController<V> {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut EmbeddedRegionController<V> {
        &mut self.controller
    }

    /// Re-read settings and patterns. Regions already shown keep their size
    /// until reopened.
    pub fn reload_config(&mut self) {
        let config = EmbedConfig::load(&self.paths);
        tracing::info!(
            groups = config.patterns.groups().len(),
            diagnostics = config.patterns.diagnostics().len(),
            "embedded editor config reloaded"
        );
        self.controller.set_config(Arc::new(config));
    }

    /// Write the current settings out, then open the settings file.
    ///
    /// # Errors
    /// Returns an error if the settings file cannot be written.
    pub fn open_settings<H: Host<View = V>>(&self, host: &mut H) -> Result<()> {
        let path = &self.paths.settings_file;
        save_settings(&mut IniFile::new(path), &self.controller.config().settings)?;
        open_in_tab(host, path)
    }

    /// Open the user pattern document, creating it from the bundled one on
    /// first use.
    ///
    /// # Errors
    /// Returns an error if the document cannot be created.
    pub fn open_pattern_settings<H: Host<View = V>>(&self, host: &mut H) -> Result<()> {
        let path = &self.paths.user_patterns;
        if seed_user_patterns(path)? {
            tracing::info!(path = %path.display(), "seeded user pattern file");
        }
        open_in_tab(host, path)
    }

    pub fn toggle<H, D>(&mut self, host: &mut H, doc: &mut D)
    where
        H: Host<View = V>,
        D: HostDocument,
    {
        // Reported on the status line already.
        let _ = self.controller.toggle(host, doc);
    }

    /// Open a file from a request another plugin sent as JSON.
    ///
    /// # Errors
    /// Returns an error if the request is malformed or the file cannot be
    /// shown.
    pub fn open_json<H, D>(
        &mut self,
        host: &mut H,
        doc: &mut D,
        request: &Value,
    ) -> crate::error::Result<()>
    where
        H: Host<View = V>,
        D: HostDocument,
    {
        let request = OpenRequest::from_json(request).map_err(|err| {
            tracing::warn!("NOTE: {err}");
            EmbedError::from(err)
        })?;
        self.controller.open_file_embedded(host, doc, request)
    }

    /// Dispatch a button-bar click by its callback identifier.
    pub fn on_button<H, D>(&mut self, host: &mut H, doc: &mut D, id: &str)
    where
        H: Host<View = V>,
        D: HostDocument,
    {
        match ButtonAction::from_id(id) {
            Some(action) => self.controller.on_button(host, doc, action),
            None => tracing::warn!(id, "unknown embedded button"),
        }
    }

    pub fn on_key_down<H, D>(
        &mut self,
        host: &mut H,
        doc: &mut D,
        key: u32,
        modifiers: bool,
    ) -> bool
    where
        H: Host<View = V>,
        D: HostDocument,
    {
        self.controller.on_key_down(host, doc, key, modifiers)
    }

    pub fn on_text_change<H: Host<View = V>>(&mut self, host: &H, doc: DocHandle) {
        self.controller.on_text_change(host, doc);
    }

    pub fn on_restore_pos(&mut self, doc: DocHandle) {
        self.controller.on_restore_pos(doc);
    }

    pub fn on_click_link<H: Host<View = V>>(&self, host: &mut H, url: &str) {
        self.controller.on_click_link(host, url);
    }

    /// Returns `false` to keep the document open.
    pub fn on_close_pre<H, D>(&mut self, host: &mut H, doc: &mut D) -> bool
    where
        H: Host<View = V>,
        D: HostDocument,
    {
        self.controller.on_close_pre(host, doc)
    }
}

fn open_in_tab<H: Host>(host: &mut H, path: &Path) -> Result<()> {
    host.open_tab(path)
        .map(drop)
        .with_context(|| format!("Failed to open {}", path.display()))
}

impl<V: EmbeddedView> Default for EmbedPlugin<V> {
    fn default() -> Self {
        Self::new(ConfigPaths::default())
    }
}
