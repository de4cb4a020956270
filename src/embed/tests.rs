//! Controller behavior against an in-memory host.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::Arc;

use tempfile::TempDir;

use super::*;
use crate::api::OpenRequest;
use crate::config::{EmbedConfig, LineNumbers, PluginSettings};
use crate::error::EmbedError;
use crate::host::{
    Caret, CaretTarget, CellSize, DocHandle, EmbeddedView, GutterOptions, Host, HostDocument,
    LanguageOption, LexerDetection, LineState, Rect, RegionSize, SaveChoice, ScrollPos,
    ThemeColors,
};
use crate::patterns::PatternSet;

const BUTTON_HEIGHT: u32 = 20;
const CELL: CellSize = CellSize {
    width: 8,
    height: 16,
};

type DisposeLog = Rc<RefCell<Vec<usize>>>;

#[derive(Debug)]
pub(crate) struct FakeView {
    pub(crate) id: usize,
    pub(crate) text: String,
    pub(crate) modified: bool,
    pub(crate) read_only: bool,
    pub(crate) lexer: Option<String>,
    pub(crate) gutter: GutterOptions,
    pub(crate) scroll: ScrollPos,
    pub(crate) carets: Vec<Caret>,
    pub(crate) line_states: Vec<LineState>,
    pub(crate) placed: Option<(DocHandle, RegionSize)>,
    pub(crate) heights: Vec<u32>,
    pub(crate) bar: Option<ButtonBar>,
    pub(crate) visible: bool,
    pub(crate) disposed: DisposeLog,
}

impl CaretTarget for FakeView {
    fn set_scroll(&mut self, pos: ScrollPos) {
        self.scroll = pos;
    }

    fn set_carets(&mut self, carets: &[Caret]) {
        self.carets = carets.to_vec();
    }
}

impl EmbeddedView for FakeView {
    fn set_text(&mut self, text: &str) {
        self.text = text.to_string();
        self.line_states = vec![LineState::Normal; text.lines().count()];
    }

    fn text(&self) -> String {
        self.text.clone()
    }

    fn is_modified(&self) -> bool {
        self.modified
    }

    fn set_modified(&mut self, modified: bool) {
        self.modified = modified;
    }

    fn is_read_only(&self) -> bool {
        self.read_only
    }

    fn set_read_only(&mut self, read_only: bool) {
        self.read_only = read_only;
    }

    fn set_lexer(&mut self, lexer: Option<&str>) {
        self.lexer = lexer.map(str::to_string);
    }

    fn set_gutter(&mut self, gutter: GutterOptions) {
        self.gutter = gutter;
    }

    fn set_top_line(&mut self, line: usize) {
        self.scroll.y = line;
    }

    fn scroll(&self) -> ScrollPos {
        self.scroll
    }

    fn carets(&self) -> Vec<Caret> {
        self.carets.clone()
    }

    fn line_states(&self) -> Vec<LineState> {
        self.line_states.clone()
    }

    fn set_line_state(&mut self, line: usize, state: LineState) {
        if let Some(slot) = self.line_states.get_mut(line) {
            *slot = state;
        }
    }

    fn place(&mut self, parent: DocHandle, size: RegionSize) {
        self.placed = Some((parent, size));
    }

    fn set_height(&mut self, height: u32) {
        self.heights.push(height);
    }

    fn set_button_bar(&mut self, bar: &ButtonBar) {
        self.bar = Some(bar.clone());
    }

    fn show(&mut self) {
        self.visible = true;
    }

    fn hide(&mut self) {
        self.visible = false;
    }

    fn is_visible(&self) -> bool {
        self.visible
    }

    fn dispose(self) {
        self.disposed.borrow_mut().push(self.id);
    }
}

#[derive(Debug, Default)]
pub(crate) struct FakeTab {
    pub(crate) path: PathBuf,
    pub(crate) scroll: Option<ScrollPos>,
    pub(crate) carets: Vec<Caret>,
}

impl CaretTarget for FakeTab {
    fn set_scroll(&mut self, pos: ScrollPos) {
        self.scroll = Some(pos);
    }

    fn set_carets(&mut self, carets: &[Caret]) {
        self.carets = carets.to_vec();
    }
}

#[derive(Debug)]
pub(crate) struct FakeHost {
    pub(crate) windows: bool,
    pub(crate) statuses: Vec<String>,
    pub(crate) save_choice: SaveChoice,
    pub(crate) save_prompts: Vec<String>,
    pub(crate) choice: Option<usize>,
    pub(crate) choose_prompts: Vec<String>,
    pub(crate) detections: HashMap<PathBuf, LexerDetection>,
    pub(crate) detect_calls: usize,
    pub(crate) read_only: HashSet<PathBuf>,
    pub(crate) gutter_show: bool,
    pub(crate) numbers_show: bool,
    pub(crate) tabs: Vec<FakeTab>,
    pub(crate) urls: Vec<String>,
    pub(crate) restores: Vec<DocHandle>,
    pub(crate) next_view: usize,
    pub(crate) disposed: DisposeLog,
}

impl FakeHost {
    pub(crate) fn new() -> Self {
        Self {
            windows: false,
            statuses: Vec::new(),
            save_choice: SaveChoice::Cancel,
            save_prompts: Vec::new(),
            choice: None,
            choose_prompts: Vec::new(),
            detections: HashMap::new(),
            detect_calls: 0,
            read_only: HashSet::new(),
            gutter_show: true,
            numbers_show: true,
            tabs: Vec::new(),
            urls: Vec::new(),
            restores: Vec::new(),
            next_view: 0,
            disposed: Rc::default(),
        }
    }

    pub(crate) fn last_status(&self) -> &str {
        self.statuses.last().map_or("", String::as_str)
    }
}

impl Host for FakeHost {
    type View = FakeView;
    type Tab = FakeTab;

    fn create_view(&mut self, _colors: &ThemeColors) -> FakeView {
        self.next_view += 1;
        FakeView {
            id: self.next_view,
            text: String::new(),
            modified: false,
            read_only: false,
            lexer: None,
            gutter: GutterOptions::default(),
            scroll: ScrollPos::default(),
            carets: Vec::new(),
            line_states: Vec::new(),
            placed: None,
            heights: Vec::new(),
            bar: None,
            visible: false,
            disposed: Rc::clone(&self.disposed),
        }
    }

    fn theme(&self) -> ThemeColors {
        ThemeColors::default()
    }

    fn button_height(&self) -> u32 {
        BUTTON_HEIGHT
    }

    fn is_windows(&self) -> bool {
        self.windows
    }

    fn status(&mut self, message: &str) {
        self.statuses.push(message.to_string());
    }

    fn ask_save(&mut self, message: &str) -> SaveChoice {
        self.save_prompts.push(message.to_string());
        self.save_choice
    }

    fn choose(&mut self, caption: &str, _items: &[String]) -> Option<usize> {
        self.choose_prompts.push(caption.to_string());
        self.choice
    }

    fn is_writable(&self, path: &Path) -> bool {
        !self.read_only.contains(path)
    }

    fn detect_lexer(&mut self, path: &Path) -> LexerDetection {
        self.detect_calls += 1;
        self.detections
            .get(path)
            .cloned()
            .unwrap_or(LexerDetection::Unknown)
    }

    fn language_option(&self, _lexer: Option<&str>, option: LanguageOption) -> bool {
        match option {
            LanguageOption::GutterShow => self.gutter_show,
            LanguageOption::NumbersShow => self.numbers_show,
            LanguageOption::GutterBookmarks | LanguageOption::GutterFold => false,
        }
    }

    fn open_tab(&mut self, path: &Path) -> Option<&mut FakeTab> {
        self.tabs.push(FakeTab {
            path: path.to_path_buf(),
            ..FakeTab::default()
        });
        self.tabs.last_mut()
    }

    fn open_url(&mut self, url: &str) {
        self.urls.push(url.to_string());
    }

    fn schedule_restore(&mut self, doc: DocHandle) {
        self.restores.push(doc);
    }

    fn process_idle(&mut self) {}
}

#[derive(Debug)]
pub(crate) struct FakeDoc {
    pub(crate) handle: DocHandle,
    pub(crate) file_name: Option<PathBuf>,
    pub(crate) encoding: String,
    pub(crate) lexer: Option<String>,
    pub(crate) lines: Vec<String>,
    pub(crate) carets: Vec<Caret>,
    pub(crate) gap: Option<(usize, u32)>,
    pub(crate) focus_count: usize,
}

impl FakeDoc {
    pub(crate) fn new(file_name: &Path, lines: &[&str]) -> Self {
        Self {
            handle: DocHandle(1),
            file_name: Some(file_name.to_path_buf()),
            encoding: "UTF-8".to_string(),
            lexer: None,
            lines: lines.iter().map(|line| (*line).to_string()).collect(),
            carets: vec![Caret::point(0, 0)],
            gap: None,
            focus_count: 0,
        }
    }
}

impl HostDocument for FakeDoc {
    fn handle(&self) -> DocHandle {
        self.handle
    }

    fn file_name(&self) -> Option<PathBuf> {
        self.file_name.clone()
    }

    fn encoding(&self) -> String {
        self.encoding.clone()
    }

    fn lexer(&self) -> Option<String> {
        self.lexer.clone()
    }

    fn line_count(&self) -> usize {
        self.lines.len()
    }

    fn line_text(&self, line: usize) -> Option<String> {
        self.lines.get(line).cloned()
    }

    fn carets(&self) -> Vec<Caret> {
        self.carets.clone()
    }

    fn cell_size(&self) -> CellSize {
        CELL
    }

    fn text_rect(&self) -> Rect {
        Rect {
            left: 40,
            top: 0,
            right: 840,
            bottom: 800,
        }
    }

    fn line_to_pixels(&self, line: usize) -> Option<(i32, i32)> {
        let y = i32::try_from(line).ok()? * 16;
        (line < self.lines.len()).then_some((40, y))
    }

    fn set_gap(&mut self, line: usize, height: u32) {
        self.gap = Some((line, height));
    }

    fn remove_gap(&mut self) {
        self.gap = None;
    }

    fn focus(&mut self) {
        self.focus_count += 1;
    }
}

/// A temp dir holding `main.md` and `notes.txt`, and a document for
/// `main.md` whose first line quotes `notes.txt`.
struct Fixture {
    dir: TempDir,
    host: FakeHost,
    doc: FakeDoc,
    controller: EmbeddedRegionController<FakeView>,
}

impl Fixture {
    fn new() -> Self {
        Self::with_settings(PluginSettings::default())
    }

    fn with_settings(settings: PluginSettings) -> Self {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("notes.txt"), "first\nsecond\nthird\n").unwrap();
        let main = dir.path().join("main.md");
        fs::write(&main, "").unwrap();

        let mut doc = FakeDoc::new(&main, &["see \"notes.txt\" here", "plain", "last"]);
        doc.carets = vec![Caret::point(6, 0)];
        let config = EmbedConfig {
            settings,
            patterns: PatternSet::bundled(),
        };
        Self {
            dir,
            host: FakeHost::new(),
            doc,
            controller: EmbeddedRegionController::new(Arc::new(config)),
        }
    }

    fn notes(&self) -> PathBuf {
        self.dir.path().join("notes.txt")
    }

    fn toggle(&mut self) -> crate::error::Result<()> {
        self.controller.toggle(&mut self.host, &mut self.doc)
    }

    fn open(&mut self, request: OpenRequest) -> crate::error::Result<()> {
        self.controller
            .open_file_embedded(&mut self.host, &mut self.doc, request)
    }

    fn hide(&mut self) -> HideOutcome {
        self.controller
            .hide(&mut self.host, &mut self.doc, false, false)
            .unwrap()
    }

    fn state(&self) -> &EmbeddedState<FakeView> {
        self.controller.state(self.doc.handle).unwrap()
    }

    fn view(&self) -> &FakeView {
        self.state().view().unwrap()
    }

    fn view_mut(&mut self) -> &mut FakeView {
        self.controller
            .state_mut(self.doc.handle)
            .and_then(EmbeddedState::view_mut)
            .unwrap()
    }

    fn edit(&mut self, text: &str) {
        let view = self.view_mut();
        view.text = text.to_string();
        view.modified = true;
        if let Some(first) = view.line_states.first_mut() {
            *first = LineState::Changed;
        }
    }
}

#[test]
fn test_toggle_opens_path_under_caret() {
    let mut fx = Fixture::new();
    fx.toggle().unwrap();

    assert!(fx.controller.is_visible(fx.doc.handle));
    assert_eq!(fx.view().text, "first\nsecond\nthird\n");
    assert!(!fx.view().modified);
    assert_eq!(fx.state().path(), Some(fx.notes().as_path()));
    assert_eq!(fx.state().encoding(), Some(TextEncoding::Utf8));
    assert_eq!(
        fx.host.last_status(),
        "Opened 'notes.txt' in embedded editor, encoding 'utf-8'"
    );
    assert_eq!(fx.host.restores, vec![fx.doc.handle]);
}

#[test]
fn test_region_is_docked_below_anchor_with_full_height() {
    let mut fx = Fixture::new();
    fx.toggle().unwrap();

    let height = 24 * 16 + BUTTON_HEIGHT;
    assert_eq!(fx.doc.gap, Some((0, height)));
    assert_eq!(fx.state().height(), height);
    assert_eq!(
        fx.view().placed,
        Some((
            fx.doc.handle,
            RegionSize {
                width: 800,
                height
            }
        ))
    );
}

#[test]
fn test_region_height_is_capped_near_bottom() {
    let mut fx = Fixture::new();
    fx.doc.lines = vec!["x".to_string(); 50];
    fx.open(OpenRequest::new(fx.notes(), 45)).unwrap();

    // Line 45 starts at y=720; 800 - 720 - 16 leaves 64 pixels.
    assert_eq!(fx.doc.gap, Some((45, 64)));
}

#[test]
fn test_button_bar_shows_caption_and_modified_mark() {
    let mut fx = Fixture::new();
    fx.toggle().unwrap();
    let caption = fx.view().bar.as_ref().unwrap().caption().unwrap().text.clone();
    assert_eq!(caption, "notes.txt");

    fx.edit("changed\n");
    fx.controller.on_text_change(&fx.host, fx.doc.handle);
    let caption = fx.view().bar.as_ref().unwrap().caption().unwrap().text.clone();
    assert_eq!(caption, "*notes.txt");
}

#[test]
fn test_toggle_twice_hides_without_rewriting_file() {
    let mut fx = Fixture::new();
    let before = fs::metadata(fx.notes()).unwrap().modified().unwrap();
    fx.toggle().unwrap();
    fx.toggle().unwrap();

    assert!(!fx.controller.is_visible(fx.doc.handle));
    assert_eq!(fx.state().phase(), Phase::Hidden);
    assert_eq!(fx.doc.gap, None);
    assert_eq!(fx.doc.focus_count, 1);
    assert!(fx.host.save_prompts.is_empty());
    assert_eq!(
        fs::read_to_string(fx.notes()).unwrap(),
        "first\nsecond\nthird\n"
    );
    assert_eq!(fs::metadata(fx.notes()).unwrap().modified().unwrap(), before);
}

#[test]
fn test_toggle_without_file_name_is_silent() {
    let mut fx = Fixture::new();
    fx.doc.file_name = None;
    assert!(matches!(fx.toggle(), Err(EmbedError::NoFileName)));
    assert!(fx.host.statuses.is_empty());
}

#[test]
fn test_toggle_rejects_unusable_carets() {
    let mut fx = Fixture::new();

    fx.doc.carets = vec![];
    assert!(matches!(fx.toggle(), Err(EmbedError::NoCaret)));

    fx.doc.carets = vec![Caret::point(6, 0), Caret::point(1, 1)];
    assert!(matches!(fx.toggle(), Err(EmbedError::MultipleCarets)));

    fx.doc.carets = vec![Caret::Selection {
        x0: 6,
        y0: 0,
        x1: 8,
        y1: 0,
    }];
    assert!(matches!(fx.toggle(), Err(EmbedError::SelectionActive)));
    assert!(fx.controller.state(fx.doc.handle).is_none());
}

#[test]
fn test_toggle_reports_missing_path_and_missing_file() {
    let mut fx = Fixture::new();
    fx.doc.carets = vec![Caret::point(1, 1)];
    assert!(matches!(fx.toggle(), Err(EmbedError::NoPathFound)));
    assert_eq!(fx.host.last_status(), "No embedded file-path was found");

    fx.doc.lines[0] = "see \"absent.txt\"".to_string();
    fx.doc.carets = vec![Caret::point(6, 0)];
    assert!(matches!(fx.toggle(), Err(EmbedError::FileNotFound(_))));
    assert!(
        fx.host
            .last_status()
            .starts_with("Linked file was not found: ")
    );
    assert!(fx.host.last_status().ends_with("absent.txt"));
}

#[test]
fn test_backslash_path_falls_back_to_forward_slashes() {
    let mut fx = Fixture::new();
    fs::create_dir(fx.dir.path().join("sub")).unwrap();
    fs::write(fx.dir.path().join("sub/deep.txt"), "deep").unwrap();
    fx.doc.lines[0] = "\"sub\\deep.txt\"".to_string();
    fx.doc.carets = vec![Caret::point(3, 0)];

    fx.toggle().unwrap();
    assert_eq!(fx.view().text, "deep");
    assert_eq!(
        fx.state().path(),
        Some(fx.dir.path().join("sub/deep.txt").as_path())
    );
}

#[test]
fn test_backslash_path_is_not_rewritten_on_windows_hosts() {
    let mut fx = Fixture::new();
    fx.host.windows = true;
    fs::create_dir(fx.dir.path().join("sub")).unwrap();
    fs::write(fx.dir.path().join("sub/deep.txt"), "deep").unwrap();
    let request = OpenRequest::new(fx.dir.path().join("sub\\deep.txt"), 0);
    assert!(matches!(fx.open(request), Err(EmbedError::FileNotFound(_))));
}

#[test]
fn test_hide_cancelled_keeps_region_and_edits() {
    let mut fx = Fixture::new();
    fx.toggle().unwrap();
    fx.edit("edited\n");
    fx.host.save_choice = SaveChoice::Cancel;

    assert_eq!(fx.hide(), HideOutcome::Cancelled);
    assert!(fx.controller.is_visible(fx.doc.handle));
    assert!(fx.view().modified);
    assert_eq!(
        fx.host.save_prompts,
        vec!["Text is modified:\nnotes.txt\n\nSave it first?".to_string()]
    );
    assert_eq!(
        fs::read_to_string(fx.notes()).unwrap(),
        "first\nsecond\nthird\n"
    );
}

#[test]
fn test_hide_with_discard_leaves_file_alone() {
    let mut fx = Fixture::new();
    fx.toggle().unwrap();
    fx.edit("edited\n");
    fx.host.save_choice = SaveChoice::Discard;

    assert_eq!(fx.hide(), HideOutcome::Hidden);
    assert!(!fx.controller.is_visible(fx.doc.handle));
    assert_eq!(
        fs::read_to_string(fx.notes()).unwrap(),
        "first\nsecond\nthird\n"
    );
}

#[test]
fn test_hide_when_nothing_shown() {
    let mut fx = Fixture::new();
    assert_eq!(fx.hide(), HideOutcome::NotVisible);
}

#[test]
fn test_save_writes_text_and_marks_lines_saved() {
    let mut fx = Fixture::new();
    fx.toggle().unwrap();
    fx.edit("edited\nsecond\n");

    let outcome = fx
        .controller
        .save(&mut fx.host, &fx.doc, true)
        .unwrap();
    assert_eq!(outcome, SaveOutcome::Continue);
    assert!(fx.host.save_prompts.is_empty());
    assert_eq!(fs::read_to_string(fx.notes()).unwrap(), "edited\nsecond\n");
    assert!(!fx.view().modified);
    assert_eq!(fx.view().line_states[0], LineState::Saved);
    assert_eq!(fx.view().line_states[1], LineState::Normal);
    let caption = fx.view().bar.as_ref().unwrap().caption().unwrap().text.clone();
    assert_eq!(caption, "notes.txt");
}

#[test]
fn test_save_unmodified_does_nothing() {
    let mut fx = Fixture::new();
    fx.toggle().unwrap();
    let outcome = fx
        .controller
        .save(&mut fx.host, &fx.doc, false)
        .unwrap();
    assert_eq!(outcome, SaveOutcome::Continue);
    assert!(fx.host.save_prompts.is_empty());
}

#[test]
fn test_save_cancelled_keeps_modified_text() {
    let mut fx = Fixture::new();
    fx.toggle().unwrap();
    fx.edit("not yet\n");
    fx.host.save_choice = SaveChoice::Cancel;

    let outcome = fx
        .controller
        .save(&mut fx.host, &fx.doc, false)
        .unwrap();
    assert_eq!(outcome, SaveOutcome::Cancelled);
    assert!(fx.view().modified);
    assert_eq!(fx.view().line_states[0], LineState::Changed);
    assert_eq!(fx.host.save_prompts.len(), 1);
    assert_eq!(
        fs::read_to_string(fx.notes()).unwrap(),
        "first\nsecond\nthird\n"
    );
}

#[test]
fn test_unwritable_file_opens_read_only() {
    let mut fx = Fixture::new();
    let notes = fx.notes();
    fx.host.read_only.insert(notes.clone());
    fx.toggle().unwrap();

    assert!(fx.view().read_only);
    let bar = fx.view().bar.as_ref().unwrap();
    assert_eq!(bar.cells()[1].action, None);

    fx.edit("must not land\n");
    fx.controller.on_button(&mut fx.host, &mut fx.doc, ButtonAction::Save);
    assert_eq!(fs::read_to_string(&notes).unwrap(), "first\nsecond\nthird\n");
    assert!(fx.host.save_prompts.is_empty());
}

#[test]
fn test_writable_again_after_reopen() {
    let mut fx = Fixture::new();
    fx.host.read_only.insert(fx.notes());
    fx.toggle().unwrap();
    fx.toggle().unwrap();

    fx.host.read_only.clear();
    fx.toggle().unwrap();
    assert!(!fx.view().read_only);
    let bar = fx.view().bar.as_ref().unwrap();
    assert_eq!(bar.cells()[1].action, Some(ButtonAction::Save));
}

#[test]
fn test_hide_with_save_choice_writes_before_hiding() {
    let mut fx = Fixture::new();
    fx.toggle().unwrap();
    fx.edit("saved on close\n");
    fx.host.save_choice = SaveChoice::Save;

    assert_eq!(fx.hide(), HideOutcome::Hidden);
    assert_eq!(fs::read_to_string(fx.notes()).unwrap(), "saved on close\n");
}

#[test]
fn test_scroll_position_survives_hide_and_show() {
    let mut fx = Fixture::new();
    fx.toggle().unwrap();
    fx.controller.on_restore_pos(fx.doc.handle);
    fx.view_mut().scroll = ScrollPos::new(3, 12);
    fx.toggle().unwrap();

    assert_eq!(
        fx.state().scroll_position(&fx.notes()),
        Some(ScrollPos::new(3, 12))
    );

    fx.toggle().unwrap();
    assert_eq!(fx.view().scroll, ScrollPos::new(0, 0));
    fx.controller.on_restore_pos(fx.doc.handle);
    assert_eq!(fx.view().scroll, ScrollPos::new(3, 12));
}

#[test]
fn test_restore_after_hide_does_nothing() {
    let mut fx = Fixture::new();
    fx.open(OpenRequest::new(fx.notes(), 0).with_carets(vec![Caret::point(1, 1)]))
        .unwrap();
    fx.hide();
    fx.controller.on_restore_pos(fx.doc.handle);
    assert_eq!(
        fx.state().pending_carets(&fx.notes()),
        Some(&[Caret::point(1, 1)][..])
    );
}

#[test]
fn test_hidden_view_is_released_on_next_show() {
    let mut fx = Fixture::new();
    fx.toggle().unwrap();
    assert_eq!(fx.view().id, 1);
    fx.hide();

    assert!(fx.state().view().is_none());
    assert!(fx.state().has_release_pending());
    assert!(fx.host.disposed.borrow().is_empty());

    fx.toggle().unwrap();
    assert_eq!(*fx.host.disposed.borrow(), vec![1]);
    assert!(!fx.state().has_release_pending());
    assert_eq!(fx.view().id, 2);
}

#[test]
fn test_failed_show_keeps_pending_view() {
    let mut fx = Fixture::new();
    fx.toggle().unwrap();
    fx.hide();
    fs::remove_file(fx.notes()).unwrap();

    assert!(fx.toggle().is_err());
    assert!(fx.state().has_release_pending());
    assert!(fx.host.disposed.borrow().is_empty());
}

#[test]
fn test_open_file_embedded_clamps_anchor_line() {
    let mut fx = Fixture::new();
    fx.open(OpenRequest::new(fx.notes(), 99)).unwrap();
    assert_eq!(fx.state().anchor_line(), 2);

    fx.open(OpenRequest::new(fx.notes(), -5)).unwrap();
    assert_eq!(fx.state().anchor_line(), 0);
}

#[test]
fn test_open_file_embedded_applies_scroll_and_carets() {
    let mut fx = Fixture::new();
    let request = OpenRequest::new(fx.notes(), 1)
        .with_caption("Notes")
        .with_scroll(ScrollPos::new(0, 2))
        .with_carets(vec![Caret::point(2, 2)]);
    fx.open(request).unwrap();

    assert_eq!(
        fx.host.last_status(),
        "Opened 'Notes' in embedded editor, encoding 'utf-8'"
    );
    fx.controller.on_restore_pos(fx.doc.handle);
    assert_eq!(fx.view().scroll, ScrollPos::new(0, 2));
    assert_eq!(fx.view().carets, vec![Caret::point(2, 2)]);
    assert_eq!(fx.state().pending_carets(&fx.notes()), None);
}

#[test]
fn test_open_file_embedded_replaces_visible_region() {
    let mut fx = Fixture::new();
    let other = fx.dir.path().join("other.txt");
    fs::write(&other, "other").unwrap();

    fx.toggle().unwrap();
    fx.open(OpenRequest::new(&other, 1)).unwrap();
    assert_eq!(fx.view().text, "other");
    assert_eq!(fx.state().anchor_line(), 1);
}

#[test]
fn test_open_file_embedded_cancelled_by_save_prompt() {
    let mut fx = Fixture::new();
    let other = fx.dir.path().join("other.txt");
    fs::write(&other, "other").unwrap();

    fx.toggle().unwrap();
    fx.edit("unsaved\n");
    fx.host.save_choice = SaveChoice::Cancel;
    fx.open(OpenRequest::new(&other, 1)).unwrap();

    assert_eq!(fx.view().text, "unsaved\n");
    assert_eq!(fx.state().path(), Some(fx.notes().as_path()));
}

#[test]
fn test_legacy_bytes_fall_back_to_cp437() {
    let mut fx = Fixture::new();
    fs::write(fx.notes(), b"caf\x82\n").unwrap();
    fx.toggle().unwrap();

    assert_eq!(fx.view().text, "café\n");
    assert_eq!(fx.state().encoding(), Some(TextEncoding::Cp437));
    assert_eq!(
        fx.host.last_status(),
        "Opened 'notes.txt' in embedded editor, encoding 'cp437'"
    );
}

#[test]
fn test_declared_encoding_is_used_first() {
    let mut fx = Fixture::new();
    fs::write(fx.notes(), b"caf\xe9\n").unwrap();
    fx.doc.encoding = "cp1252".to_string();
    fx.toggle().unwrap();

    assert_eq!(fx.view().text, "café\n");
    assert!(fx.host.last_status().ends_with("encoding 'windows-1252'"));
}

#[test]
fn test_undecodable_declared_encoding_opens_as_utf8() {
    let mut fx = Fixture::new();
    fs::write(fx.notes(), b"ok \x81 done\n").unwrap();
    fx.doc.encoding = "shift_jis".to_string();
    fx.toggle().unwrap();

    assert!(fx.controller.is_visible(fx.doc.handle));
    assert_eq!(fx.state().encoding(), Some(TextEncoding::Utf8));
    assert!(fx.view().text.starts_with("ok "));
    assert!(fx.view().text.ends_with(" done\n"));
}

#[test]
fn test_lexer_detected_once_per_path() {
    let mut fx = Fixture::new();
    fx.host
        .detections
        .insert(fx.notes(), LexerDetection::Found("Text".to_string()));

    fx.toggle().unwrap();
    fx.toggle().unwrap();
    fx.toggle().unwrap();
    assert_eq!(fx.view().lexer.as_deref(), Some("Text"));
    assert_eq!(fx.host.detect_calls, 1);
}

#[test]
fn test_new_config_detects_lexer_again() {
    let mut fx = Fixture::new();
    fx.host
        .detections
        .insert(fx.notes(), LexerDetection::Found("Text".to_string()));
    fx.toggle().unwrap();
    fx.toggle().unwrap();

    fx.host
        .detections
        .insert(fx.notes(), LexerDetection::Found("Markdown".to_string()));
    let config = Arc::clone(fx.controller.config());
    fx.controller.set_config(config);
    fx.toggle().unwrap();

    assert_eq!(fx.host.detect_calls, 2);
    assert_eq!(fx.view().lexer.as_deref(), Some("Markdown"));
}

#[test]
fn test_ambiguous_lexer_asks_user_once() {
    let mut fx = Fixture::new();
    fx.host.detections.insert(
        fx.notes(),
        LexerDetection::Ambiguous(vec!["Ini".to_string(), "Properties".to_string()]),
    );
    fx.host.choice = Some(1);

    fx.toggle().unwrap();
    assert_eq!(fx.view().lexer.as_deref(), Some("Properties"));
    fx.toggle().unwrap();
    fx.toggle().unwrap();
    assert_eq!(fx.host.choose_prompts, vec!["Choose lexer for: notes.txt"]);
}

#[test]
fn test_gutter_follows_line_number_setting() {
    let settings = PluginSettings {
        show_line_num: LineNumbers::Hide,
        ..PluginSettings::default()
    };
    let mut fx = Fixture::with_settings(settings);
    fx.toggle().unwrap();
    assert!(fx.view().gutter.show);
    assert!(!fx.view().gutter.numbers);

    let mut fx = Fixture::new();
    fx.host.numbers_show = false;
    fx.toggle().unwrap();
    assert!(!fx.view().gutter.numbers);

    let mut fx = Fixture::new();
    fx.host.gutter_show = false;
    fx.toggle().unwrap();
    assert_eq!(fx.view().gutter, GutterOptions::default());
}

#[test]
fn test_to_new_tab_moves_unmodified_file_with_position() {
    let mut fx = Fixture::new();
    fx.toggle().unwrap();
    fx.view_mut().scroll = ScrollPos::new(0, 1);
    fx.view_mut().carets = vec![Caret::point(2, 1)];

    fx.controller.on_button(&mut fx.host, &mut fx.doc, ButtonAction::ToNewTab);

    assert!(!fx.controller.is_visible(fx.doc.handle));
    let tab = &fx.host.tabs[0];
    assert_eq!(tab.path, fx.notes());
    assert_eq!(tab.scroll, Some(ScrollPos::new(0, 1)));
    assert_eq!(tab.carets, vec![Caret::point(2, 1)]);
}

#[test]
fn test_to_new_tab_keeps_modified_region() {
    let mut fx = Fixture::new();
    fx.toggle().unwrap();
    fx.edit("pending\n");

    fx.controller.to_new_tab(&mut fx.host, &mut fx.doc);
    assert!(fx.controller.is_visible(fx.doc.handle));
    assert_eq!(fx.host.tabs.len(), 1);
}

#[test]
fn test_buttons_save_and_close() {
    let mut fx = Fixture::new();
    fx.toggle().unwrap();
    fx.edit("via button\n");

    fx.controller.on_button(&mut fx.host, &mut fx.doc, ButtonAction::Save);
    assert_eq!(fs::read_to_string(fx.notes()).unwrap(), "via button\n");

    fx.controller.on_button(&mut fx.host, &mut fx.doc, ButtonAction::Close);
    assert!(!fx.controller.is_visible(fx.doc.handle));
}

#[test]
fn test_escape_hides_region() {
    let mut fx = Fixture::new();
    fx.toggle().unwrap();

    assert!(!fx.controller.on_key_down(&mut fx.host, &mut fx.doc, VK_ESCAPE, true));
    assert!(!fx.controller.on_key_down(&mut fx.host, &mut fx.doc, 13, false));
    assert!(fx.controller.is_visible(fx.doc.handle));

    assert!(fx.controller.on_key_down(&mut fx.host, &mut fx.doc, VK_ESCAPE, false));
    assert!(!fx.controller.is_visible(fx.doc.handle));
    assert!(!fx.controller.on_key_down(&mut fx.host, &mut fx.doc, VK_ESCAPE, false));
}

#[test]
fn test_animated_hide_shrinks_gap() {
    let mut fx = Fixture::new();
    fx.toggle().unwrap();
    let full = fx.state().height();
    fx.controller
        .hide(&mut fx.host, &mut fx.doc, true, false)
        .unwrap();

    assert_eq!(fx.doc.gap, None);
    let pending = fx.controller.state(fx.doc.handle).unwrap();
    let heights = &pending.release_pending.as_ref().unwrap().heights;
    assert!(heights.iter().all(|&h| h >= 1 && h <= full + 1));
    assert!(heights.windows(2).all(|w| w[1] <= w[0]));
}

#[test]
fn test_close_vetoed_by_cancel() {
    let mut fx = Fixture::new();
    fx.toggle().unwrap();
    fx.edit("unsaved\n");
    fx.host.save_choice = SaveChoice::Cancel;

    assert!(!fx.controller.on_close_pre(&mut fx.host, &mut fx.doc));
    assert!(fx.controller.is_visible(fx.doc.handle));
}

#[test]
fn test_close_drops_state_and_views() {
    let mut fx = Fixture::new();
    fx.toggle().unwrap();
    fx.hide();
    fx.toggle().unwrap();
    fx.edit("unsaved\n");
    fx.host.save_choice = SaveChoice::Discard;

    assert!(fx.controller.on_close_pre(&mut fx.host, &mut fx.doc));
    assert!(fx.controller.state(fx.doc.handle).is_none());
    let mut disposed = fx.host.disposed.borrow().clone();
    disposed.sort_unstable();
    assert_eq!(disposed, vec![1, 2]);
    assert_eq!(
        fs::read_to_string(fx.notes()).unwrap(),
        "first\nsecond\nthird\n"
    );
}

#[test]
fn test_close_without_state_is_allowed() {
    let mut fx = Fixture::new();
    assert!(fx.controller.on_close_pre(&mut fx.host, &mut fx.doc));
}

#[test]
fn test_click_link_opens_url() {
    let mut fx = Fixture::new();
    fx.controller.on_click_link(&mut fx.host, "https://example.org");
    fx.controller.on_click_link(&mut fx.host, "");
    assert_eq!(fx.host.urls, vec!["https://example.org"]);
}

#[test]
fn test_states_are_per_document() {
    let mut fx = Fixture::new();
    fx.toggle().unwrap();

    let mut second = FakeDoc::new(&fx.dir.path().join("main.md"), &["\"notes.txt\""]);
    second.handle = DocHandle(2);
    second.carets = vec![Caret::point(2, 0)];
    fx.controller.toggle(&mut fx.host, &mut second).unwrap();

    assert!(fx.controller.is_visible(DocHandle(1)));
    assert!(fx.controller.is_visible(DocHandle(2)));
    fx.hide();
    assert!(!fx.controller.is_visible(DocHandle(1)));
    assert!(fx.controller.is_visible(DocHandle(2)));
}
