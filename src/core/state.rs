use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use crate::core::engine::ExcludeEngine;
use crate::core::error::{GitExcludeError, Result};
use crate::core::git::{GitClient, StatusSnapshot};

/// How one file relates to the index, the working tree and the exclude list.
///
/// Built fresh on every query and never cached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GitFileState {
    pub is_tracked: bool,
    pub is_staged: bool,
    pub is_modified: bool,
    pub is_untracked: bool,
    pub is_excluded: bool,
    pub original_path: String,
    pub timestamp: DateTime<Utc>,
}

impl GitFileState {
    fn untouched(path: String) -> Self {
        Self {
            is_tracked: false,
            is_staged: false,
            is_modified: false,
            is_untracked: false,
            is_excluded: false,
            original_path: path,
            timestamp: Utc::now(),
        }
    }

    /// The two-flag shape older callers expect.
    pub fn legacy(&self) -> LegacyGitState {
        LegacyGitState {
            is_tracked: self.is_tracked,
            is_staged: self.is_staged,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LegacyGitState {
    pub is_tracked: bool,
    pub is_staged: bool,
}

/// Derives the per-file flags from a status snapshot.
///
/// `tracked_in_index` is only consulted when the snapshot says nothing
/// about the path, which is the case for clean tracked files.
pub fn classify(
    path: &str,
    snapshot: &StatusSnapshot,
    is_excluded: bool,
    tracked_in_index: impl FnOnce() -> Result<bool>,
) -> Result<GitFileState> {
    let listed = |list: &[String]| list.iter().any(|p| p == path);

    let mut state = GitFileState::untouched(path.to_string());
    state.is_untracked = listed(&snapshot.untracked);
    state.is_staged = listed(&snapshot.staged);
    state.is_modified = listed(&snapshot.modified);
    state.is_excluded = is_excluded;

    state.is_tracked = if state.is_untracked {
        false
    } else if state.is_staged
        || state.is_modified
        || listed(&snapshot.deleted)
        || listed(&snapshot.conflicted)
    {
        true
    } else {
        tracked_in_index()?
    };

    Ok(state)
}

/// Answers "what is the git state of this file" for one repository.
pub struct GitStateClassifier<'a> {
    git: &'a dyn GitClient,
    excludes: &'a ExcludeEngine,
}

impl<'a> GitStateClassifier<'a> {
    pub fn new(git: &'a dyn GitClient, excludes: &'a ExcludeEngine) -> Self {
        Self { git, excludes }
    }

    pub fn get_file_git_state(&self, path: &str) -> Result<GitFileState> {
        let path = path.trim();
        if path.is_empty() {
            return Err(GitExcludeError::Operation(
                "File path must be a non-empty string".to_string(),
            ));
        }

        if !self.git.is_repository() {
            debug!("Not a git repository; reporting '{path}' as untouched");
            return Ok(GitFileState::untouched(path.to_string()));
        }

        let snapshot = self.git.status().map_err(|err| {
            GitExcludeError::Operation(format!("Failed to get git status for '{path}': {err:#}"))
        })?;
        let is_excluded = self.excludes.is_in_git_exclude(path);

        classify(path, &snapshot, is_excluded, || {
            self.git.is_tracked(path).map_err(|err| {
                GitExcludeError::Operation(format!(
                    "Failed to check whether '{path}' is tracked: {err:#}"
                ))
            })
        })
    }

    pub fn get_legacy_file_git_state(&self, path: &str) -> Result<LegacyGitState> {
        Ok(self.get_file_git_state(path)?.legacy())
    }
}
