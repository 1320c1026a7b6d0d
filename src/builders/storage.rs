use std::cell::RefCell;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Raw access to the exclude file of one repository.
///
/// The engine performs every read, write and delete through this trait, so
/// tests can swap the filesystem for an in-memory file that fails on demand.
pub trait ExcludeStore {
    /// Where the exclude file lives.
    fn location(&self) -> &Path;
    /// Whether the owning repository exists at all.
    fn repository_exists(&self) -> bool;
    fn exists(&self) -> bool;
    fn read(&self) -> io::Result<Vec<u8>>;
    fn write(&self, content: &[u8]) -> io::Result<()>;
    fn remove(&self) -> io::Result<()>;
    /// Limits the file to owner read/write.
    fn restrict_permissions(&self) -> io::Result<()>;
}

/// The exclude file of a repository on disk (`<git dir>/info/exclude`).
pub struct FileExcludeStore {
    git_dir: PathBuf,
    exclude_path: PathBuf,
}

impl FileExcludeStore {
    /// Resolves the exclude file for the repository rooted at `repo_root`.
    ///
    /// A `.git` file (worktrees, submodules) is followed through its
    /// `gitdir:` line.
    pub fn for_repository(repo_root: &Path) -> Self {
        let git_dir = resolve_git_dir(repo_root);
        let exclude_path = git_dir.join("info").join("exclude");
        Self {
            git_dir,
            exclude_path,
        }
    }

    fn temp_path(&self) -> PathBuf {
        self.exclude_path.with_file_name(".exclude.tmp")
    }
}

impl ExcludeStore for FileExcludeStore {
    fn location(&self) -> &Path {
        &self.exclude_path
    }

    fn repository_exists(&self) -> bool {
        self.git_dir.is_dir()
    }

    fn exists(&self) -> bool {
        self.exclude_path.is_file()
    }

    fn read(&self) -> io::Result<Vec<u8>> {
        fs::read(&self.exclude_path)
    }

    fn write(&self, content: &[u8]) -> io::Result<()> {
        if let Some(parent) = self.exclude_path.parent()
            && !parent.exists()
        {
            fs::create_dir_all(parent)?;
        }

        // Write to a sibling temp file and rename over the target so readers
        // never observe a half-written exclude file.
        let temp_path = self.temp_path();
        let result = File::create(&temp_path).and_then(|mut file| {
            file.write_all(content)?;
            file.sync_all()
        });
        if let Err(err) = result.and_then(|_| fs::rename(&temp_path, &self.exclude_path)) {
            let _ = fs::remove_file(&temp_path);
            return Err(err);
        }
        Ok(())
    }

    fn remove(&self) -> io::Result<()> {
        match fs::remove_file(&self.exclude_path) {
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            other => other,
        }
    }

    fn restrict_permissions(&self) -> io::Result<()> {
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = fs::metadata(&self.exclude_path)?.permissions();
            perms.set_mode(0o600);
            fs::set_permissions(&self.exclude_path, perms)?;
        }
        Ok(())
    }
}

fn resolve_git_dir(repo_root: &Path) -> PathBuf {
    let dot_git = repo_root.join(".git");
    if dot_git.is_file()
        && let Ok(content) = fs::read_to_string(&dot_git)
        && let Some(target) = content
            .lines()
            .find_map(|line| line.strip_prefix("gitdir:"))
    {
        let target = Path::new(target.trim());
        return if target.is_absolute() {
            target.to_path_buf()
        } else {
            repo_root.join(target)
        };
    }
    dot_git
}

/// An exclude file held in memory.
///
/// Reads and writes can be made to fail with `PermissionDenied`, which is
/// how the degradation policy is exercised without touching file modes.
pub struct MemoryExcludeStore {
    location: PathBuf,
    repository: bool,
    content: RefCell<Option<Vec<u8>>>,
    fail_reads: bool,
    fail_writes: bool,
    writes: RefCell<usize>,
}

impl MemoryExcludeStore {
    pub fn new() -> Self {
        Self {
            location: PathBuf::from(".git/info/exclude"),
            repository: true,
            content: RefCell::new(None),
            fail_reads: false,
            fail_writes: false,
            writes: RefCell::new(0),
        }
    }

    pub fn with_content(content: &str) -> Self {
        let store = Self::new();
        store.content.replace(Some(content.as_bytes().to_vec()));
        store
    }

    /// A store whose repository is missing.
    pub fn without_repository() -> Self {
        Self {
            repository: false,
            ..Self::new()
        }
    }

    pub fn failing_reads(mut self) -> Self {
        self.fail_reads = true;
        self
    }

    pub fn failing_writes(mut self) -> Self {
        self.fail_writes = true;
        self
    }

    /// Current content as text, `None` when the file does not exist.
    pub fn content(&self) -> Option<String> {
        self.content
            .borrow()
            .as_ref()
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
    }

    /// Number of successful writes so far.
    pub fn write_count(&self) -> usize {
        *self.writes.borrow()
    }
}

impl Default for MemoryExcludeStore {
    fn default() -> Self {
        Self::new()
    }
}

fn permission_denied() -> io::Error {
    io::Error::new(io::ErrorKind::PermissionDenied, "Permission denied")
}

impl ExcludeStore for MemoryExcludeStore {
    fn location(&self) -> &Path {
        &self.location
    }

    fn repository_exists(&self) -> bool {
        self.repository
    }

    fn exists(&self) -> bool {
        self.content.borrow().is_some()
    }

    fn read(&self) -> io::Result<Vec<u8>> {
        if self.fail_reads {
            return Err(permission_denied());
        }
        self.content
            .borrow()
            .clone()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "No such file"))
    }

    fn write(&self, content: &[u8]) -> io::Result<()> {
        if self.fail_writes {
            return Err(permission_denied());
        }
        self.content.replace(Some(content.to_vec()));
        *self.writes.borrow_mut() += 1;
        Ok(())
    }

    fn remove(&self) -> io::Result<()> {
        if self.fail_writes {
            return Err(permission_denied());
        }
        self.content.replace(None);
        Ok(())
    }

    fn restrict_permissions(&self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_file_store_creates_info_dir_and_replaces_content() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join(".git")).unwrap();
        let store = FileExcludeStore::for_repository(dir.path());

        assert!(store.repository_exists());
        assert!(!store.exists());
        store.write(b"first\n").unwrap();
        store.write(b"second\n").unwrap();
        assert_eq!(store.read().unwrap(), b"second\n");
        assert!(!dir.path().join(".git/info/.exclude.tmp").exists());

        store.remove().unwrap();
        assert!(!store.exists());
        store.remove().unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn test_file_store_restricts_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join(".git")).unwrap();
        let store = FileExcludeStore::for_repository(dir.path());
        store.write(b"x\n").unwrap();
        store.restrict_permissions().unwrap();

        let mode = fs::metadata(store.location()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn test_gitdir_file_is_followed() {
        let dir = tempdir().unwrap();
        let real = dir.path().join("real-git-dir");
        fs::create_dir(&real).unwrap();
        let worktree = dir.path().join("worktree");
        fs::create_dir(&worktree).unwrap();
        fs::write(worktree.join(".git"), "gitdir: ../real-git-dir\n").unwrap();

        let store = FileExcludeStore::for_repository(&worktree);
        assert!(store.repository_exists());
        assert_eq!(store.location(), worktree.join("../real-git-dir/info/exclude"));
    }

    #[test]
    fn test_missing_repository() {
        let dir = tempdir().unwrap();
        let store = FileExcludeStore::for_repository(dir.path());
        assert!(!store.repository_exists());
    }

    #[test]
    fn test_memory_store_failures() {
        let store = MemoryExcludeStore::with_content("a\n").failing_writes();
        assert_eq!(store.read().unwrap(), b"a\n");
        let err = store.write(b"b\n").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::PermissionDenied);
        assert_eq!(store.content().as_deref(), Some("a\n"));
        assert_eq!(store.write_count(), 0);

        let store = MemoryExcludeStore::new().failing_reads();
        assert!(store.read().is_err());
    }
}
