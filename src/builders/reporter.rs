use anyhow::{Context, Result};
use serde::Serialize;
use std::fmt::Write;

use crate::core::engine::BatchResult;
use crate::core::state::{GitFileState, LegacyGitState};

/// Output formats supported by the `--format` flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    Yaml,
    Toml,
}

/// Managed entries together with the marker that introduces them.
#[derive(Debug, Serialize)]
pub struct ManagedExcludes {
    pub exclude_file: String,
    pub marker: String,
    pub entries: Vec<String>,
}

/// Serializes `value` in one of the structured formats.
///
/// `Text` is not a serialization format; callers render text themselves.
pub fn export<T: Serialize>(value: &T, format: OutputFormat) -> Result<String> {
    let content = match format {
        OutputFormat::Json => {
            serde_json::to_string_pretty(value).context("Failed to serialize to JSON")?
        }
        OutputFormat::Yaml => serde_yaml::to_string(value).context("Failed to serialize to YAML")?,
        OutputFormat::Toml | OutputFormat::Text => {
            toml::to_string_pretty(value).context("Failed to serialize to TOML")?
        }
    };
    Ok(content)
}

pub trait StatusReporter {
    fn render_batch(&self, operation: &str, result: &BatchResult) -> String;
    fn render_managed(&self, managed: &ManagedExcludes) -> String;
    fn render_state(&self, state: &GitFileState) -> String;
    fn render_legacy_state(&self, path: &str, state: &LegacyGitState) -> String;
}

/// Human-readable rendering for the terminal.
pub struct ConsoleReporter;

impl ConsoleReporter {
    pub fn new() -> Self {
        Self
    }

    fn flag(value: bool) -> &'static str {
        if value { "✓" } else { "·" }
    }
}

impl Default for ConsoleReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusReporter for ConsoleReporter {
    fn render_batch(&self, operation: &str, result: &BatchResult) -> String {
        let mut out = String::new();
        for path in &result.successful {
            let _ = writeln!(out, "✓ {operation} {path}");
        }
        for failure in &result.failed {
            let _ = writeln!(out, "✗ {operation} {}: {}", failure.path, failure.error);
        }
        for warning in &result.warnings {
            let _ = writeln!(out, "⚠️  {warning}");
        }
        let _ = write!(
            out,
            "{} succeeded, {} failed",
            result.successful.len(),
            result.failed.len()
        );
        out
    }

    fn render_managed(&self, managed: &ManagedExcludes) -> String {
        if managed.entries.is_empty() {
            return format!("No managed exclusions in {}", managed.exclude_file);
        }
        let mut out = format!("📁 {} ({})", managed.exclude_file, managed.marker);
        for entry in &managed.entries {
            let _ = write!(out, "\n  {entry}");
        }
        out
    }

    fn render_state(&self, state: &GitFileState) -> String {
        format!(
            "{}\n  tracked   {}\n  staged    {}\n  modified  {}\n  untracked {}\n  excluded  {}",
            state.original_path,
            Self::flag(state.is_tracked),
            Self::flag(state.is_staged),
            Self::flag(state.is_modified),
            Self::flag(state.is_untracked),
            Self::flag(state.is_excluded),
        )
    }

    fn render_legacy_state(&self, path: &str, state: &LegacyGitState) -> String {
        format!(
            "{path}\n  tracked   {}\n  staged    {}",
            Self::flag(state.is_tracked),
            Self::flag(state.is_staged),
        )
    }
}
