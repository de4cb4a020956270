use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::patterns::{DEFAULT_PATTERNS, PatternSet};

/// Section of the settings file holding this plugin's keys.
pub const SETTINGS_SECTION: &str = "embedded_editor";

const KEY_MAX_LINES: &str = "editor_max_lines";
const KEY_LINE_NUMBERS: &str = "show_line_num";

const SETTINGS_FILE_NAME: &str = "plugins.ini";
const PATTERNS_FILE_NAME: &str = "embedded_editor_patterns.json";

/// Line-number column of the embedded editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineNumbers {
    Hide,
    Show,
    /// Follow the lexer's `numbers_show` option.
    #[default]
    Inherit,
}

impl LineNumbers {
    pub const fn from_setting(value: i64) -> Self {
        match value {
            0 => Self::Hide,
            2 => Self::Inherit,
            _ => Self::Show,
        }
    }

    pub const fn to_setting(self) -> i64 {
        match self {
            Self::Hide => 0,
            Self::Show => 1,
            Self::Inherit => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PluginSettings {
    /// Height limit of the embedded editor, in text lines.
    pub editor_max_lines: usize,
    pub show_line_num: LineNumbers,
}

impl Default for PluginSettings {
    fn default() -> Self {
        Self {
            editor_max_lines: 24,
            show_line_num: LineNumbers::Inherit,
        }
    }
}

/// Everything loaded from configuration. Never mutated after load; a reload
/// builds a new one.
#[derive(Debug, Default)]
pub struct EmbedConfig {
    pub settings: PluginSettings,
    pub patterns: PatternSet,
}

impl EmbedConfig {
    /// Load settings and pattern groups, falling back to defaults for
    /// whatever cannot be read.
    pub fn load(paths: &ConfigPaths) -> Self {
        let settings = load_settings(&IniFile::new(&paths.settings_file)).unwrap_or_else(|err| {
            tracing::warn!("{err:#}");
            PluginSettings::default()
        });
        Self {
            settings,
            patterns: load_patterns(paths),
        }
    }
}

/// Where the settings file and the user's pattern document live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigPaths {
    pub settings_file: PathBuf,
    pub user_patterns: PathBuf,
}

impl ConfigPaths {
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            settings_file: dir.join(SETTINGS_FILE_NAME),
            user_patterns: dir.join(PATTERNS_FILE_NAME),
        }
    }
}

impl Default for ConfigPaths {
    fn default() -> Self {
        Self::in_dir(&default_settings_dir())
    }
}

pub fn default_settings_dir() -> PathBuf {
    dirs::config_dir().map_or_else(
        || PathBuf::from(".embedded-editor"),
        |dir| dir.join("embedded-editor"),
    )
}

/// Persistent key/value settings, grouped in sections.
pub trait SettingsStore {
    /// # Errors
    /// Returns an error if the store exists but cannot be read.
    fn read(&self, section: &str, key: &str) -> Result<Option<String>>;

    /// # Errors
    /// Returns an error if the store cannot be written.
    fn write(&mut self, section: &str, key: &str, value: &str) -> Result<()>;
}

/// A flat ini file: `[section]` headers and `key=value` lines.
#[derive(Debug, Clone)]
pub struct IniFile {
    path: PathBuf,
}

impl IniFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn content(&self) -> Result<String> {
        if !self.path.exists() {
            return Ok(String::new());
        }
        fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read settings {}", self.path.display()))
    }
}

impl SettingsStore for IniFile {
    fn read(&self, section: &str, key: &str) -> Result<Option<String>> {
        Ok(ini_lookup(&self.content()?, section, key))
    }

    fn write(&mut self, section: &str, key: &str, value: &str) -> Result<()> {
        let updated = ini_update(&self.content()?, section, key, value);
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config dir {}", parent.display()))?;
        }
        fs::write(&self.path, updated)
            .with_context(|| format!("Failed to write settings {}", self.path.display()))
    }
}

/// Read plugin settings; missing or malformed values keep their defaults.
///
/// # Errors
/// Returns an error if the store cannot be read.
pub fn load_settings(store: &impl SettingsStore) -> Result<PluginSettings> {
    let mut settings = PluginSettings::default();
    if let Some(lines) = read_int(store, KEY_MAX_LINES)? {
        match usize::try_from(lines) {
            Ok(lines) => settings.editor_max_lines = lines,
            Err(_) => tracing::warn!("ignoring negative {KEY_MAX_LINES}: {lines}"),
        }
    }
    if let Some(mode) = read_int(store, KEY_LINE_NUMBERS)? {
        settings.show_line_num = LineNumbers::from_setting(mode);
    }
    Ok(settings)
}

/// Write plugin settings back, leaving other keys and sections alone.
///
/// # Errors
/// Returns an error if the store cannot be written.
pub fn save_settings(store: &mut impl SettingsStore, settings: &PluginSettings) -> Result<()> {
    store.write(
        SETTINGS_SECTION,
        KEY_MAX_LINES,
        &settings.editor_max_lines.to_string(),
    )?;
    store.write(
        SETTINGS_SECTION,
        KEY_LINE_NUMBERS,
        &settings.show_line_num.to_setting().to_string(),
    )
}

fn read_int(store: &impl SettingsStore, key: &str) -> Result<Option<i64>> {
    let Some(raw) = store.read(SETTINGS_SECTION, key)? else {
        return Ok(None);
    };
    match raw.trim().parse() {
        Ok(value) => Ok(Some(value)),
        Err(_) => {
            tracing::warn!("ignoring non-integer {key}: {raw:?}");
            Ok(None)
        }
    }
}

/// Load the user's pattern document if present, else the bundled one.
pub fn load_patterns(paths: &ConfigPaths) -> PatternSet {
    if !paths.user_patterns.exists() {
        return PatternSet::bundled();
    }
    PatternSet::load(&paths.user_patterns).unwrap_or_else(|err| {
        tracing::warn!("{err}; using bundled path patterns");
        PatternSet::bundled()
    })
}

/// Copy the bundled pattern document to `path` unless the user already has one.
///
/// Returns whether a file was written.
///
/// # Errors
/// Returns an error if the file cannot be created.
pub fn seed_user_patterns(path: &Path) -> Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config dir {}", parent.display()))?;
    }
    fs::write(path, DEFAULT_PATTERNS)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(true)
}

fn section_name(line: &str) -> Option<&str> {
    line.trim().strip_prefix('[')?.strip_suffix(']').map(str::trim)
}

fn entry(line: &str) -> Option<(&str, &str)> {
    let line = line.trim();
    if line.starts_with(';') || line.starts_with('#') {
        return None;
    }
    line.split_once('=')
        .map(|(key, value)| (key.trim(), value.trim()))
}

fn ini_lookup(content: &str, section: &str, key: &str) -> Option<String> {
    let mut in_section = false;
    for line in content.lines() {
        if let Some(name) = section_name(line) {
            in_section = name == section;
        } else if in_section {
            if let Some((k, v)) = entry(line) {
                if k == key {
                    return Some(v.to_string());
                }
            }
        }
    }
    None
}

fn ini_update(content: &str, section: &str, key: &str, value: &str) -> String {
    let new_entry = format!("{key}={value}");
    let mut lines: Vec<String> = content.lines().map(ToOwned::to_owned).collect();
    let mut in_section = false;
    let mut insert_at = None;
    let mut replace_at = None;

    for (idx, line) in lines.iter().enumerate() {
        if let Some(name) = section_name(line) {
            in_section = name == section;
            if in_section {
                insert_at = Some(idx + 1);
            }
            continue;
        }
        if !in_section {
            continue;
        }
        if entry(line).is_some_and(|(k, _)| k == key) {
            replace_at = Some(idx);
            break;
        }
        if !line.trim().is_empty() {
            insert_at = Some(idx + 1);
        }
    }

    if let Some(idx) = replace_at {
        lines[idx] = new_entry;
    } else if let Some(idx) = insert_at {
        lines.insert(idx, new_entry);
    } else {
        if lines.last().is_some_and(|last| !last.trim().is_empty()) {
            lines.push(String::new());
        }
        lines.push(format!("[{section}]"));
        lines.push(new_entry);
    }
    finish_lines(&lines)
}

fn finish_lines(lines: &[String]) -> String {
    format!("{}\n", lines.join("\n"))
}
