use anyhow::{Context, Result};
use git2::{Repository, Status, StatusOptions};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Working tree and index status of a repository at one point in time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatusSnapshot {
    /// Current branch, `None` on a detached or unborn HEAD.
    pub branch: Option<String>,
    pub staged: Vec<String>,
    pub modified: Vec<String>,
    pub untracked: Vec<String>,
    pub deleted: Vec<String>,
    pub conflicted: Vec<String>,
    pub is_clean: bool,
}

/// Trait defining the Git queries required by the state classifier.
/// This abstraction allows for easier testing and decoupling from specific git implementations.
pub trait GitClient {
    /// Whether the configured root is a git repository.
    fn is_repository(&self) -> bool;

    /// Current status of the repository.
    fn status(&self) -> Result<StatusSnapshot>;

    /// Whether `path` has an entry in the index.
    fn is_tracked(&self, path: &str) -> Result<bool>;
}

/// Concrete implementation of GitClient using the git2 crate.
///
/// The repository is opened again on every call, so results always reflect
/// the current on-disk state.
pub struct Git2Client {
    root: PathBuf,
}

impl Git2Client {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            root: path.as_ref().to_path_buf(),
        }
    }

    fn open(&self) -> Result<Repository> {
        Repository::open(&self.root)
            .with_context(|| format!("Failed to open repository at {}", self.root.display()))
    }
}

impl GitClient for Git2Client {
    fn is_repository(&self) -> bool {
        Repository::open(&self.root).is_ok()
    }

    fn status(&self) -> Result<StatusSnapshot> {
        let repo = self.open()?;
        let mut options = StatusOptions::new();
        options
            .include_untracked(true)
            .recurse_untracked_dirs(true)
            .include_ignored(false);
        let statuses = repo
            .statuses(Some(&mut options))
            .context("Failed to read repository status")?;

        let mut snapshot = StatusSnapshot {
            branch: repo
                .head()
                .ok()
                .filter(|head| head.is_branch())
                .and_then(|head| head.shorthand().map(str::to_string)),
            ..StatusSnapshot::default()
        };

        for entry in statuses.iter() {
            let Some(path) = entry.path() else { continue };
            let path = path.to_string();
            let status = entry.status();

            if status.is_conflicted() {
                snapshot.conflicted.push(path);
                continue;
            }
            if status.intersects(
                Status::INDEX_NEW
                    | Status::INDEX_MODIFIED
                    | Status::INDEX_DELETED
                    | Status::INDEX_RENAMED
                    | Status::INDEX_TYPECHANGE,
            ) {
                snapshot.staged.push(path.clone());
            }
            if status.intersects(Status::WT_MODIFIED | Status::WT_TYPECHANGE | Status::WT_RENAMED) {
                snapshot.modified.push(path.clone());
            }
            if status.contains(Status::WT_DELETED) {
                snapshot.deleted.push(path.clone());
            }
            if status.contains(Status::WT_NEW) {
                snapshot.untracked.push(path);
            }
        }

        snapshot.is_clean = statuses.is_empty();
        Ok(snapshot)
    }

    fn is_tracked(&self, path: &str) -> Result<bool> {
        let repo = self.open()?;
        let index = repo.index().context("Failed to read the index")?;
        Ok(index.get_path(Path::new(path), 0).is_some())
    }
}
