//! embed-ed - check path patterns of the embedded editor.
//!
//! # Usage
//!
//! ```bash
//! embed-ed check
//! embed-ed check --patterns my_patterns.json
//! embed-ed check --json
//! embed-ed resolve --lexer Markdown --col 12 'see [notes](notes.md)'
//! ```

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;

use embedded_editor::config::{ConfigPaths, load_patterns};
use embedded_editor::patterns::PatternSet;

/// Check path patterns of the embedded editor
#[derive(Parser, Debug)]
#[command(name = "embed-ed", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load a pattern document and list its groups and problems
    Check {
        /// Pattern document (default: the user's, else the bundled one)
        #[arg(long, value_name = "FILE")]
        patterns: Option<PathBuf>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the path found at a column of a line
    Resolve {
        #[arg(long, value_name = "FILE")]
        patterns: Option<PathBuf>,

        /// Lexer of the document the line comes from
        #[arg(long)]
        lexer: Option<String>,

        /// Caret column, in characters
        #[arg(long)]
        col: usize,

        /// Line of text to search
        line: String,
    },
}

fn load(patterns: Option<&Path>) -> Result<PatternSet> {
    match patterns {
        Some(path) => PatternSet::load(path)
            .with_context(|| format!("Failed to load patterns from {}", path.display())),
        None => Ok(load_patterns(&ConfigPaths::default())),
    }
}

#[derive(Serialize, Debug)]
struct GroupReport<'a> {
    name: &'a str,
    patterns: usize,
    /// Empty means every lexer.
    lexers: Vec<&'a str>,
}

#[derive(Serialize, Debug)]
struct CheckReport<'a> {
    groups: Vec<GroupReport<'a>>,
    diagnostics: Vec<String>,
}

impl<'a> CheckReport<'a> {
    fn new(patterns: &'a PatternSet) -> Self {
        let groups = patterns
            .groups()
            .iter()
            .map(|group| {
                let mut lexers: Vec<_> = group.lexers().iter().map(String::as_str).collect();
                lexers.sort_unstable();
                GroupReport {
                    name: group.name(),
                    patterns: group.patterns().len(),
                    lexers,
                }
            })
            .collect();
        Self {
            groups,
            diagnostics: patterns.diagnostics().iter().map(ToString::to_string).collect(),
        }
    }

    fn print(&self) {
        for group in &self.groups {
            let scope = if group.lexers.is_empty() {
                "all lexers".to_string()
            } else {
                group.lexers.join(", ")
            };
            println!("{}: {} pattern(s), {scope}", group.name, group.patterns);
        }
        for note in &self.diagnostics {
            println!("NOTE: {note}");
        }
    }
}

fn check(patterns: &PatternSet, json: bool) -> Result<ExitCode> {
    let report = CheckReport::new(patterns);
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        report.print();
    }
    Ok(if report.diagnostics.is_empty() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn main() -> Result<ExitCode> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Check { patterns, json } => check(&load(patterns.as_deref())?, json),
        Command::Resolve {
            patterns,
            lexer,
            col,
            line,
        } => {
            let set = load(patterns.as_deref())?;
            match set.resolve(&line, lexer.as_deref(), col) {
                Some(path) => {
                    println!("{path}");
                    Ok(ExitCode::SUCCESS)
                }
                None => {
                    eprintln!("no path found");
                    Ok(ExitCode::FAILURE)
                }
            }
        }
    }
}
