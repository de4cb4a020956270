//! Path patterns: finding a file path in the text under the caret.
//!
//! A pattern document maps group names to
//! `{ "path_patterns": [regex, ...], "lexers": [name, ...] }`.
//! Every regex must contain a named group `path`; the text it captures is
//! the file path. Groups listing `lexers` only apply to documents whose
//! lexer (compared case-insensitively) is one of them.

use std::collections::HashSet;
use std::path::Path;

use regex::Regex;
use serde_json::Value;

use crate::error::{PatternDiagnostic, PatternLoadError};

/// Name of the capture group holding the path.
pub const PATH_GROUP: &str = "path";

/// Pattern document shipped with the crate, used until the user saves their own.
pub const DEFAULT_PATTERNS: &str = include_str!("../../data/patterns.json");

/// A named bundle of path patterns, optionally restricted to some lexers.
#[derive(Debug, Clone)]
pub struct PatternGroup {
    name: String,
    patterns: Vec<Regex>,
    /// Lower-case lexer names; empty means every lexer.
    lexers: HashSet<String>,
}

impl PatternGroup {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn patterns(&self) -> &[Regex] {
        &self.patterns
    }

    pub fn lexers(&self) -> &HashSet<String> {
        &self.lexers
    }

    /// Whether this group is consulted for documents using `lexer`.
    pub fn applies_to(&self, lexer: Option<&str>) -> bool {
        if self.lexers.is_empty() {
            return true;
        }
        lexer.is_some_and(|lexer| self.lexers.contains(&lexer.to_lowercase()))
    }
}

/// All pattern groups, in document order, plus the notes produced while loading.
#[derive(Debug, Default)]
pub struct PatternSet {
    groups: Vec<PatternGroup>,
    diagnostics: Vec<PatternDiagnostic>,
}

impl PatternSet {
    /// Parse a pattern document.
    ///
    /// Invalid groups and patterns are dropped and recorded as diagnostics.
    ///
    /// # Errors
    /// Returns an error only when the document itself is not parseable or is
    /// not an object.
    pub fn parse(source: &str) -> Result<Self, PatternLoadError> {
        let document: Value = json5::from_str(source)?;
        let Value::Object(entries) = document else {
            return Err(PatternLoadError::NotAnObject);
        };

        let mut set = Self::default();
        for (name, group) in entries {
            match compile_group(&name, &group, &mut set.diagnostics) {
                Some(group) => set.groups.push(group),
                None => tracing::warn!(group = %name, "dropping pattern group"),
            }
        }
        for note in &set.diagnostics {
            tracing::warn!("NOTE: {note}");
        }
        Ok(set)
    }

    /// Read and parse a pattern document from disk.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, PatternLoadError> {
        let source = std::fs::read_to_string(path).map_err(|error| PatternLoadError::Io {
            path: path.to_path_buf(),
            error,
        })?;
        Self::parse(&source)
    }

    /// The pattern document compiled into the crate.
    pub fn bundled() -> Self {
        Self::parse(DEFAULT_PATTERNS).unwrap_or_else(|err| {
            tracing::warn!("bundled pattern document is invalid: {err}");
            Self::default()
        })
    }

    pub fn groups(&self) -> &[PatternGroup] {
        &self.groups
    }

    pub fn diagnostics(&self) -> &[PatternDiagnostic] {
        &self.diagnostics
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Find the path under `column` (a character offset) in `line`.
    ///
    /// Groups are tried in document order and patterns in declaration order.
    /// A match qualifies when `column` lies within its span, end inclusive,
    /// so a caret right after the path still finds it. The first qualifying
    /// match wins.
    pub fn resolve<'a>(
        &self,
        line: &'a str,
        lexer: Option<&str>,
        column: usize,
    ) -> Option<&'a str> {
        self.groups
            .iter()
            .filter(|group| group.applies_to(lexer))
            .flat_map(|group| group.patterns.iter())
            .find_map(|pattern| path_at_column(pattern, line, column))
    }
}

fn path_at_column<'a>(pattern: &Regex, line: &'a str, column: usize) -> Option<&'a str> {
    for caps in pattern.captures_iter(line) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        let start = line[..whole.start()].chars().count();
        let end = start + whole.as_str().chars().count();
        if (start..=end).contains(&column) {
            // A match without the group (e.g. inside an untaken alternative)
            // counts as no match.
            if let Some(path) = caps.name(PATH_GROUP) {
                return Some(path.as_str());
            }
        }
    }
    None
}

fn compile_group(
    name: &str,
    group: &Value,
    diagnostics: &mut Vec<PatternDiagnostic>,
) -> Option<PatternGroup> {
    let Value::Object(fields) = group else {
        diagnostics.push(PatternDiagnostic::GroupNotObject(name.to_string()));
        return None;
    };

    let Some(Value::Array(sources)) = fields.get("path_patterns") else {
        diagnostics.push(PatternDiagnostic::PatternsNotList(name.to_string()));
        return None;
    };

    let mut patterns = Vec::with_capacity(sources.len());
    for source in sources {
        let Value::String(source) = source else {
            diagnostics.push(PatternDiagnostic::PatternNotString {
                group: name.to_string(),
                value: source.to_string(),
            });
            continue;
        };
        match Regex::new(source) {
            Ok(regex) if has_path_group(&regex) => patterns.push(regex),
            Ok(_) => diagnostics.push(PatternDiagnostic::MissingPathGroup {
                group: name.to_string(),
                pattern: source.clone(),
            }),
            Err(error) => diagnostics.push(PatternDiagnostic::InvalidRegex {
                group: name.to_string(),
                pattern: source.clone(),
                error: Box::new(error),
            }),
        }
    }

    let lexers = match fields.get("lexers") {
        None => HashSet::new(),
        Some(Value::Array(names)) => names
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_lowercase)
            .collect(),
        Some(_) => {
            diagnostics.push(PatternDiagnostic::LexersNotList(name.to_string()));
            return None;
        }
    };

    Some(PatternGroup {
        name: name.to_string(),
        patterns,
        lexers,
    })
}

fn has_path_group(regex: &Regex) -> bool {
    regex.capture_names().flatten().any(|name| name == PATH_GROUP)
}
