use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::api::OpenRequest;
use crate::config::{EmbedConfig, PluginSettings};
use crate::embed::animation::{Collapse, HIDE_ANIMATION};
use crate::embed::button_bar::{BarContent, ButtonAction, ButtonBar, collapse_path};
use crate::embed::encoding::{TextEncoding, read_with_fallback};
use crate::embed::geometry::{clamp_anchor_line, region_size};
use crate::embed::lexer::{LexerCache, gutter_options};
use crate::embed::state::{EmbeddedState, Phase};
use crate::error::{EmbedError, Result};
use crate::host::{
    Caret, CaretTarget, DocHandle, EmbeddedView, Host, HostDocument, LineState, SaveChoice,
    ScrollPos,
};

/// Virtual key code of Escape.
pub const VK_ESCAPE: u32 = 27;

/// Whether an in-progress close may go on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// Saved, discarded, or nothing to save.
    Continue,
    /// The user cancelled; abort the close.
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HideOutcome {
    Hidden,
    Cancelled,
    NotVisible,
}

/// Owns every document's embedded region.
///
/// All methods run to completion on the host's UI thread.
pub struct EmbeddedRegionController<V> {
    config: Arc<EmbedConfig>,
    lexers: LexerCache,
    states: HashMap<DocHandle, EmbeddedState<V>>,
}

impl<V> std::fmt::Debug for EmbeddedRegionController<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbeddedRegionController")
            .field("settings", &self.config.settings)
            .field("documents", &self.states.len())
            .finish_non_exhaustive()
    }
}

impl<V: EmbeddedView> EmbeddedRegionController<V> {
    pub fn new(config: Arc<EmbedConfig>) -> Self {
        Self {
            config,
            lexers: LexerCache::default(),
            states: HashMap::new(),
        }
    }

    pub fn config(&self) -> &Arc<EmbedConfig> {
        &self.config
    }

    /// Swap in a freshly loaded configuration. Lexers are detected afresh
    /// on the next show.
    pub fn set_config(&mut self, config: Arc<EmbedConfig>) {
        self.config = config;
        self.lexers.clear();
    }

    pub fn state(&self, doc: DocHandle) -> Option<&EmbeddedState<V>> {
        self.states.get(&doc)
    }

    pub fn state_mut(&mut self, doc: DocHandle) -> Option<&mut EmbeddedState<V>> {
        self.states.get_mut(&doc)
    }

    pub fn is_visible(&self, doc: DocHandle) -> bool {
        self.states.get(&doc).is_some_and(EmbeddedState::is_visible)
    }

    /// Hide the region if shown, else open the file path under the caret.
    ///
    /// # Errors
    /// Returns why nothing was opened; the reason is also shown in the
    /// host's status bar.
    pub fn toggle<H, D>(&mut self, host: &mut H, doc: &mut D) -> Result<()>
    where
        H: Host<View = V>,
        D: HostDocument,
    {
        let result = self.try_toggle(host, doc);
        report(host, result)
    }

    fn try_toggle<H, D>(&mut self, host: &mut H, doc: &mut D) -> Result<()>
    where
        H: Host<View = V>,
        D: HostDocument,
    {
        if self.is_visible(doc.handle()) {
            self.try_hide(host, doc, true, false)?;
            return Ok(());
        }

        let file_name = doc.file_name().ok_or(EmbedError::NoFileName)?;
        let (column, line) = single_caret(&doc.carets())?;
        let text = doc.line_text(line).unwrap_or_default();
        let lexer = doc.lexer();
        let found = self
            .config
            .patterns
            .resolve(&text, lexer.as_deref(), column)
            .filter(|path| !path.is_empty())
            .ok_or(EmbedError::NoPathFound)?;

        let full_path = file_name
            .parent()
            .map_or_else(|| PathBuf::from(found), |dir| dir.join(found));
        let caption = found.to_string();
        let path = locate(&full_path, host.is_windows())?;
        self.show_located(host, doc, path, line, Some(caption))
    }

    /// Open `request.path` embedded below `request.anchor_line`, bypassing
    /// pattern resolution.
    ///
    /// A region already shown is hidden first; cancelling its save prompt
    /// cancels the open.
    ///
    /// # Errors
    /// Returns an error if the file is missing or unreadable.
    pub fn open_file_embedded<H, D>(
        &mut self,
        host: &mut H,
        doc: &mut D,
        request: OpenRequest,
    ) -> Result<()>
    where
        H: Host<View = V>,
        D: HostDocument,
    {
        let result = self.try_open(host, doc, request);
        report(host, result)
    }

    fn try_open<H, D>(&mut self, host: &mut H, doc: &mut D, request: OpenRequest) -> Result<()>
    where
        H: Host<View = V>,
        D: HostDocument,
    {
        let line = clamp_anchor_line(request.anchor_line, doc.line_count());

        if self.try_hide(host, doc, true, false)? == HideOutcome::Cancelled {
            tracing::debug!("open cancelled by the user");
            return Ok(());
        }

        let path = locate(&request.path, host.is_windows())?;
        let state = self.states.entry(doc.handle()).or_default();
        if let Some(scroll) = request.scroll_to {
            state.remember_scroll(path.clone(), scroll);
        }
        if let Some(carets) = request.carets {
            state.remember_carets(path.clone(), carets);
        }
        self.show_located(host, doc, path, line, request.caption)
    }

    fn show_located<H, D>(
        &mut self,
        host: &mut H,
        doc: &mut D,
        path: PathBuf,
        anchor_line: usize,
        caption: Option<String>,
    ) -> Result<()>
    where
        H: Host<View = V>,
        D: HostDocument,
    {
        let message_name = caption
            .clone()
            .unwrap_or_else(|| path.display().to_string());
        let state = self.states.entry(doc.handle()).or_default();
        let encoding = state.show(
            host,
            doc,
            &mut self.lexers,
            &self.config.settings,
            path,
            anchor_line,
            caption,
        )?;
        host.status(&format!(
            "Opened '{message_name}' in embedded editor, encoding '{encoding}'"
        ));
        Ok(())
    }

    /// Hide the region, prompting to save modified text unless `skip_save`.
    ///
    /// # Errors
    /// Returns an error if saving failed; the region then stays visible.
    pub fn hide<H, D>(
        &mut self,
        host: &mut H,
        doc: &mut D,
        animate: bool,
        skip_save: bool,
    ) -> Result<HideOutcome>
    where
        H: Host<View = V>,
        D: HostDocument,
    {
        let result = self.try_hide(host, doc, animate, skip_save);
        report(host, result)
    }

    fn try_hide<H, D>(
        &mut self,
        host: &mut H,
        doc: &mut D,
        animate: bool,
        skip_save: bool,
    ) -> Result<HideOutcome>
    where
        H: Host<View = V>,
        D: HostDocument,
    {
        let Some(state) = self.states.get_mut(&doc.handle()) else {
            return Ok(HideOutcome::NotVisible);
        };
        if !state.is_visible() {
            return Ok(HideOutcome::NotVisible);
        }
        if !skip_save && state.save(host, false)? == SaveOutcome::Cancelled {
            return Ok(HideOutcome::Cancelled);
        }
        state.collapse(host, doc, animate);
        Ok(HideOutcome::Hidden)
    }

    /// Write the embedded text back to its file.
    ///
    /// Without `force`, unmodified text is left alone and modified text
    /// triggers a save/discard/cancel prompt.
    ///
    /// # Errors
    /// Returns an error if the file cannot be written.
    pub fn save<H, D>(&mut self, host: &mut H, doc: &D, force: bool) -> Result<SaveOutcome>
    where
        H: Host<View = V>,
        D: HostDocument,
    {
        let result = match self.states.get_mut(&doc.handle()) {
            Some(state) => state.save(host, force),
            None => Ok(SaveOutcome::Continue),
        };
        report(host, result)
    }

    /// Open the embedded file in a regular tab, keeping scroll and carets.
    ///
    /// Unmodified regions are hidden first; modified ones stay so their
    /// edits are not lost.
    pub fn to_new_tab<H, D>(&mut self, host: &mut H, doc: &mut D)
    where
        H: Host<View = V>,
        D: HostDocument,
    {
        let Some(state) = self.states.get_mut(&doc.handle()) else {
            return;
        };
        let (Some(view), Some(path)) = (state.view.as_ref(), state.path.clone()) else {
            return;
        };
        let carets = view.carets();
        if !view.is_modified() {
            state.collapse(host, doc, false);
        }
        let scroll = state.scroll_position(&path);

        if let Some(tab) = host.open_tab(&path) {
            apply_position(tab, scroll, &carets);
        }
    }

    /// A button-bar cell was clicked.
    pub fn on_button<H, D>(&mut self, host: &mut H, doc: &mut D, action: ButtonAction)
    where
        H: Host<View = V>,
        D: HostDocument,
    {
        if !self.is_visible(doc.handle()) {
            return;
        }
        tracing::debug!(?action, "embedded button");
        // Failures were already reported on the status line.
        let _ = match action {
            ButtonAction::ToNewTab => {
                self.to_new_tab(host, doc);
                Ok(())
            }
            ButtonAction::Save => self.save(host, doc, true).map(drop),
            ButtonAction::Close => self.hide(host, doc, true, false).map(drop),
        };
    }

    /// The embedded text changed; rebuild the bar if the modified flag flipped.
    pub fn on_text_change<H: Host<View = V>>(&mut self, host: &H, doc: DocHandle) {
        let Some(state) = self.states.get_mut(&doc) else {
            return;
        };
        if state.is_visible() && state.bar_modified != Some(state.is_modified()) {
            state.refresh_bar(host);
        }
    }

    /// Key pressed inside the embedded view. Returns whether it was consumed.
    pub fn on_key_down<H, D>(
        &mut self,
        host: &mut H,
        doc: &mut D,
        key_code: u32,
        modifiers_held: bool,
    ) -> bool
    where
        H: Host<View = V>,
        D: HostDocument,
    {
        if key_code != VK_ESCAPE || modifiers_held || !self.is_visible(doc.handle()) {
            return false;
        }
        let _ = self.hide(host, doc, true, false);
        true
    }

    /// Deferred after show so the host's own scroll adjustment comes first.
    /// Does nothing if the region was hidden meanwhile.
    pub fn on_restore_pos(&mut self, doc: DocHandle) {
        if let Some(state) = self.states.get_mut(&doc) {
            state.restore_position();
        }
    }

    pub fn on_click_link<H: Host<View = V>>(&self, host: &mut H, url: &str) {
        if !url.is_empty() {
            host.open_url(url);
        }
    }

    /// The host is about to close `doc`. Returns `false` to veto the close.
    ///
    /// Unsaved embedded text is offered for saving first; cancelling keeps
    /// the document open. Otherwise the document's state is dropped.
    pub fn on_close_pre<H, D>(&mut self, host: &mut H, doc: &mut D) -> bool
    where
        H: Host<View = V>,
        D: HostDocument,
    {
        let handle = doc.handle();
        let Some(state) = self.states.get_mut(&handle) else {
            return true;
        };

        if state.is_visible() {
            if state.is_modified() {
                let saved = state.save(host, false);
                match report(host, saved) {
                    Ok(SaveOutcome::Continue) => {}
                    Ok(SaveOutcome::Cancelled) | Err(_) => return false,
                }
            }
            state.collapse(host, doc, false);
        }

        if let Some(state) = self.states.remove(&handle) {
            state.dispose();
        }
        true
    }
}

impl<V: EmbeddedView> EmbeddedState<V> {
    #[allow(clippy::too_many_arguments)]
    fn show<H, D>(
        &mut self,
        host: &mut H,
        doc: &mut D,
        lexers: &mut LexerCache,
        settings: &PluginSettings,
        path: PathBuf,
        anchor_line: usize,
        caption: Option<String>,
    ) -> Result<TextEncoding>
    where
        H: Host<View = V>,
        D: HostDocument,
    {
        let (text, encoding) =
            read_with_fallback(&path, &doc.encoding()).map_err(|error| EmbedError::Io {
                path: path.clone(),
                error,
            })?;

        // Freed here rather than in hide(): hide may run inside the view's
        // own button callback.
        if let Some(old) = self.release_pending.take() {
            old.dispose();
        }

        let lexer = lexers.detect(host, &path);
        let gutter = gutter_options(host, lexer.as_deref(), settings.show_line_num);
        let colors = host.theme();
        let writable = host.is_writable(&path);
        let view = self.view.get_or_insert_with(|| host.create_view(&colors));

        view.set_lexer(lexer.as_deref());
        view.set_gutter(gutter);
        view.set_text(&text);
        view.set_modified(false);
        view.set_top_line(0);
        view.set_read_only(!writable);
        reset_line_states(view, LineState::Normal);

        tracing::debug!(path = %path.display(), anchor_line, "showing embedded editor");
        self.path = Some(path);
        self.caption = caption;
        self.anchor_line = anchor_line;
        self.encoding = Some(encoding);

        host.schedule_restore(doc.handle());

        let size = region_size(
            doc.text_rect(),
            doc.cell_size(),
            doc.line_to_pixels(anchor_line).map(|(_, y)| y),
            settings.editor_max_lines,
            host.button_height(),
        );
        self.height = size.height;
        doc.remove_gap();
        doc.set_gap(anchor_line, size.height);

        self.refresh_bar(host);
        if let Some(view) = self.view.as_mut() {
            view.place(doc.handle(), size);
            view.show();
        }
        self.phase = Phase::Visible;
        Ok(encoding)
    }

    fn save<H: Host<View = V>>(&mut self, host: &mut H, force: bool) -> Result<SaveOutcome> {
        let (Some(view), Some(path)) = (self.view.as_mut(), self.path.clone()) else {
            return Ok(SaveOutcome::Continue);
        };
        if view.is_read_only() {
            return Ok(SaveOutcome::Continue);
        }

        if !force {
            if !view.is_modified() {
                return Ok(SaveOutcome::Continue);
            }
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            match host.ask_save(&format!("Text is modified:\n{name}\n\nSave it first?")) {
                SaveChoice::Save => {}
                SaveChoice::Discard => return Ok(SaveOutcome::Continue),
                SaveChoice::Cancel => return Ok(SaveOutcome::Cancelled),
            }
        }

        // Always written as UTF-8, whatever it was read as.
        fs::write(&path, view.text()).map_err(|error| EmbedError::Io {
            path: path.clone(),
            error,
        })?;
        view.set_modified(false);
        reset_line_states(view, LineState::Saved);
        self.refresh_bar(host);
        tracing::debug!(path = %path.display(), "saved embedded file");
        Ok(SaveOutcome::Continue)
    }

    /// Remove the region, optionally animating its height down first.
    fn collapse<H, D>(&mut self, host: &mut H, doc: &mut D, animate: bool)
    where
        H: Host<View = V>,
        D: HostDocument,
    {
        self.phase = Phase::Hiding;
        self.remember_current_scroll();

        if let Some(mut view) = self.view.take() {
            if animate {
                let anchor_line = self.anchor_line;
                Collapse::new(self.height, HIDE_ANIMATION).run(|height| {
                    doc.set_gap(anchor_line, height);
                    view.set_height(height);
                    host.process_idle();
                });
            }
            doc.remove_gap();
            view.hide();
            self.release_pending = Some(view);
        }

        self.phase = Phase::Hidden;
        self.bar_modified = None;
        doc.focus();
        tracing::debug!(path = ?self.path, "embedded editor hidden");
    }

    fn refresh_bar<H: Host<View = V>>(&mut self, host: &H) {
        let (Some(view), Some(path)) = (self.view.as_mut(), self.path.as_deref()) else {
            return;
        };
        let modified = view.is_modified();
        let display_path = collapse_path(path);
        let bar = ButtonBar::build(
            &BarContent {
                caption: self.caption.as_deref(),
                display_path: &display_path,
                modified,
                writable: !view.is_read_only(),
            },
            &host.theme(),
            host.button_height(),
        );
        view.set_button_bar(&bar);
        self.bar_modified = Some(modified);
    }

    fn restore_position(&mut self) {
        if !self.is_visible() {
            return;
        }
        let (Some(view), Some(path)) = (self.view.as_mut(), self.path.as_ref()) else {
            return;
        };
        let scroll = self.scroll_positions.get(path).copied();
        let carets = self.pending_carets.remove(path).unwrap_or_default();
        apply_position(view, scroll, &carets);
    }
}

fn apply_position<T: CaretTarget + ?Sized>(
    target: &mut T,
    scroll: Option<ScrollPos>,
    carets: &[Caret],
) {
    if let Some(scroll) = scroll {
        target.set_scroll(scroll);
    }
    if !carets.is_empty() {
        target.set_carets(carets);
    }
}

fn reset_line_states<V: EmbeddedView>(view: &mut V, target: LineState) {
    for (line, state) in view.line_states().into_iter().enumerate() {
        if state != LineState::Normal {
            view.set_line_state(line, target);
        }
    }
}

/// The single, selection-free caret required to look for a path.
fn single_caret(carets: &[Caret]) -> Result<(usize, usize)> {
    match carets {
        [] => Err(EmbedError::NoCaret),
        [caret] if caret.is_selection() => Err(EmbedError::SelectionActive),
        [caret] => Ok(caret.position()),
        _ => Err(EmbedError::MultipleCarets),
    }
}

/// Find `path` on disk, retrying with forward slashes on non-Windows hosts.
fn locate(path: &Path, is_windows: bool) -> Result<PathBuf> {
    if path.exists() {
        return Ok(path.to_path_buf());
    }
    let raw = path.to_string_lossy();
    if !is_windows && raw.contains('\\') {
        let alt = PathBuf::from(raw.replace('\\', "/"));
        if alt.exists() {
            return Ok(alt);
        }
    }
    Err(EmbedError::FileNotFound(path.to_path_buf()))
}

/// Surface an error on the status line before handing it back.
fn report<H: Host, T>(host: &mut H, result: Result<T>) -> Result<T> {
    if let Err(err) = &result {
        match err {
            EmbedError::NoFileName => {}
            EmbedError::Argument(_) => tracing::warn!("NOTE: {err}"),
            _ => host.status(&err.to_string()),
        }
    }
    result
}
