use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::builders::policy::FallbackBehavior;

/// Marker comment that opens the managed section unless configured otherwise.
pub const DEFAULT_MARKER_COMMENT: &str = "# pgit-cli managed exclusions";

const CONFIG_FILE_NAME: &str = "pgit-exclude.toml";

/// Settings consumed by the exclude engine.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct GitExcludeSettings {
    /// When false, every mutating operation goes through the fallback policy.
    pub enabled: bool,
    /// Exact comment line that introduces the managed section.
    pub marker_comment: String,
    pub fallback_behavior: FallbackBehavior,
    /// Re-read the exclude file after each write to confirm the change landed.
    pub validate_operations: bool,
}

impl Default for GitExcludeSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            marker_comment: DEFAULT_MARKER_COMMENT.to_string(),
            fallback_behavior: FallbackBehavior::Warn,
            validate_operations: true,
        }
    }
}

impl GitExcludeSettings {
    pub fn validate(&self) -> Result<()> {
        let marker = self.marker_comment.trim_end();
        if !marker.starts_with('#') {
            anyhow::bail!(
                "Marker comment must start with '#': {:?}",
                self.marker_comment
            );
        }
        if marker.contains(['\n', '\r']) {
            anyhow::bail!("Marker comment must be a single line");
        }
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct PgitConfig {
    pub version: String,
    pub git_exclude: GitExcludeSettings,
}

impl Default for PgitConfig {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            git_exclude: GitExcludeSettings::default(),
        }
    }
}

pub struct ConfigManager {
    config_path: PathBuf,
    repo_root: PathBuf,
}

impl ConfigManager {
    /// Locates the repository containing the current directory.
    pub fn new() -> Result<Self> {
        let repo_root = find_git_root()?;
        Self::new_at(repo_root)
    }

    pub fn new_at(repo_root: PathBuf) -> Result<Self> {
        if !repo_root.join(".git").exists() {
            anyhow::bail!("Not in a Git repository: {}", repo_root.display());
        }
        let config_path = repo_root.join(".git").join(CONFIG_FILE_NAME);

        Ok(Self {
            config_path,
            repo_root,
        })
    }

    pub fn initialize(&self) -> Result<()> {
        if self.config_path.exists() {
            return Ok(());
        }

        let default_config = PgitConfig::default();
        self.save_config(&default_config)?;
        Ok(())
    }

    /// Loads the exclude settings, rejecting an unusable marker comment.
    pub fn load_settings(&self) -> Result<GitExcludeSettings> {
        let config = self.load_config()?;
        config
            .git_exclude
            .validate()
            .with_context(|| format!("Invalid settings in {}", self.config_path.display()))?;
        Ok(config.git_exclude)
    }

    pub fn get_repo_root(&self) -> &Path {
        &self.repo_root
    }
}

pub trait ConfigProvider {
    fn load_config(&self) -> Result<PgitConfig>;
    fn save_config(&self, config: &PgitConfig) -> Result<()>;
    fn get_config_path(&self) -> Result<PathBuf>;
}

impl ConfigProvider for ConfigManager {
    fn load_config(&self) -> Result<PgitConfig> {
        if !self.config_path.exists() {
            return Ok(PgitConfig::default());
        }

        let content =
            fs::read_to_string(&self.config_path).context("Failed to read config file")?;

        toml::from_str(&content).context("Failed to parse config file")
    }

    fn save_config(&self, config: &PgitConfig) -> Result<()> {
        let content = toml::to_string_pretty(config).context("Failed to serialize config")?;

        fs::write(&self.config_path, content).context("Failed to write config file")?;

        Ok(())
    }

    fn get_config_path(&self) -> Result<PathBuf> {
        Ok(self.config_path.clone())
    }
}

fn find_git_root() -> Result<PathBuf> {
    let current_dir = std::env::current_dir()?;
    let mut dir = current_dir.as_path();

    loop {
        if dir.join(".git").exists() {
            return Ok(dir.to_path_buf());
        }

        match dir.parent() {
            Some(parent) => dir = parent,
            None => anyhow::bail!("Not in a Git repository"),
        }
    }
}
