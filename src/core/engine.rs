use serde::Serialize;
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::builders::document::ExcludeDocument;
use crate::builders::integrity::{self, IntegrityWarning};
use crate::builders::patterns;
use crate::builders::policy::FailurePolicy;
use crate::builders::storage::{ExcludeStore, FileExcludeStore};
use crate::builders::validator::{PathValidator, ValidationOutcome};
use crate::core::config::GitExcludeSettings;
use crate::core::error::{GitExcludeError, Result};

/// Result of a single-path operation that did not fail outright.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExcludeOutcome {
    /// Whether the exclude file was written or removed.
    pub changed: bool,
    /// Advisory warnings raised along the way (also logged).
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchFailure {
    pub path: String,
    pub error: String,
}

/// Per-path result of a batch add or remove.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchResult {
    pub successful: Vec<String>,
    pub failed: Vec<BatchFailure>,
    pub warnings: Vec<String>,
}

impl BatchResult {
    fn fail(&mut self, path: impl Into<String>, error: impl ToString) {
        self.failed.push(BatchFailure {
            path: path.into(),
            error: error.to_string(),
        });
    }
}

/// Which way a mutation goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mutation {
    Add,
    Remove,
}

impl Mutation {
    fn name(self) -> &'static str {
        match self {
            Mutation::Add => "add",
            Mutation::Remove => "remove",
        }
    }
}

/// Manages the private entries of one repository's `.git/info/exclude`.
///
/// Every operation runs its own read-modify-write cycle; nothing about the
/// file is cached between calls. The settings are copied on construction.
pub struct ExcludeEngine {
    settings: GitExcludeSettings,
    policy: FailurePolicy,
    validator: PathValidator,
    store: Box<dyn ExcludeStore>,
}

impl ExcludeEngine {
    /// Engine for the repository rooted at `repo_root`.
    pub fn new(repo_root: &Path, settings: &GitExcludeSettings) -> Self {
        Self::with_store(Box::new(FileExcludeStore::for_repository(repo_root)), settings)
    }

    pub fn with_store(store: Box<dyn ExcludeStore>, settings: &GitExcludeSettings) -> Self {
        let settings = settings.clone();
        Self {
            policy: FailurePolicy::new(settings.fallback_behavior),
            validator: PathValidator::new(),
            settings,
            store,
        }
    }

    pub fn settings(&self) -> &GitExcludeSettings {
        &self.settings
    }

    pub fn exclude_file_path(&self) -> &Path {
        self.store.location()
    }

    /// Adds `path` to the managed section.
    pub fn add_to_git_exclude(&self, path: &str) -> Result<ExcludeOutcome> {
        self.ensure_repository()?;
        let path = self.validate(path)?;
        let mut outcome = ExcludeOutcome::default();
        let affected = [path.clone()];

        if !self.settings.enabled {
            self.degrade(self.disabled(Mutation::Add, &affected), Mutation::Add, &affected, &mut outcome.warnings)?;
            return Ok(outcome);
        }

        let mut document = match self.load_document(&mut outcome.warnings) {
            Ok(document) => document,
            Err(err) => {
                self.degrade(err, Mutation::Add, &affected, &mut outcome.warnings)?;
                return Ok(outcome);
            }
        };

        if document.contains(&path) {
            info!("'{path}' is already in exclude file");
            return Ok(outcome);
        }

        self.report_conflicts(&path, document.entries(), &mut outcome.warnings);
        document.insert(&path);

        if let Err(err) = self.persist(&document) {
            self.degrade(err, Mutation::Add, &affected, &mut outcome.warnings)?;
            return Ok(outcome);
        }
        outcome.changed = true;
        info!("Added '{path}' to {}", self.store.location().display());

        self.verify(Mutation::Add, &affected, &mut outcome.warnings)?;
        Ok(outcome)
    }

    /// Removes `path` from the managed section. A missing file or entry is
    /// a successful no-op.
    pub fn remove_from_git_exclude(&self, path: &str) -> Result<ExcludeOutcome> {
        self.ensure_repository()?;
        let path = self.validate(path)?;
        let mut outcome = ExcludeOutcome::default();
        let affected = [path.clone()];

        if !self.settings.enabled {
            self.degrade(self.disabled(Mutation::Remove, &affected), Mutation::Remove, &affected, &mut outcome.warnings)?;
            return Ok(outcome);
        }

        if !self.store.exists() {
            debug!("No exclude file; nothing to remove for '{path}'");
            return Ok(outcome);
        }

        let mut document = match self.load_document(&mut outcome.warnings) {
            Ok(document) => document,
            Err(err) => {
                self.degrade(err, Mutation::Remove, &affected, &mut outcome.warnings)?;
                return Ok(outcome);
            }
        };

        if !document.remove(&path) {
            debug!("'{path}' is not in the managed section");
            return Ok(outcome);
        }

        if let Err(err) = self.persist(&document) {
            self.degrade(err, Mutation::Remove, &affected, &mut outcome.warnings)?;
            return Ok(outcome);
        }
        outcome.changed = true;
        info!("Removed '{path}' from {}", self.store.location().display());

        self.verify(Mutation::Remove, &affected, &mut outcome.warnings)?;
        Ok(outcome)
    }

    /// Adds every valid path with a single write.
    pub fn add_multiple_to_git_exclude<S: AsRef<str>>(&self, paths: &[S]) -> Result<BatchResult> {
        self.apply_batch(Mutation::Add, paths)
    }

    /// Removes every valid path with a single write.
    pub fn remove_multiple_from_git_exclude<S: AsRef<str>>(&self, paths: &[S]) -> Result<BatchResult> {
        self.apply_batch(Mutation::Remove, paths)
    }

    /// Whether `path` is in the managed section. Never fails: an empty path,
    /// a missing file or an unreadable file all answer `false`.
    pub fn is_in_git_exclude(&self, path: &str) -> bool {
        let path = path.trim();
        if path.is_empty() || !self.store.exists() {
            return false;
        }
        match self.store.read() {
            Ok(bytes) => self.parse(&bytes).contains(path),
            Err(err) => {
                debug!("Cannot read {}: {err}", self.store.location().display());
                false
            }
        }
    }

    /// Entries of the managed section in file order.
    pub fn get_pgit_managed_excludes(&self) -> Result<Vec<String>> {
        self.ensure_repository()?;
        let mut warnings = Vec::new();
        match self.load_document(&mut warnings) {
            Ok(document) => Ok(document.entries().to_vec()),
            Err(err) => {
                self.degrade(err, "list", &[], &mut warnings)?;
                Ok(Vec::new())
            }
        }
    }

    /// Raw content of the exclude file, empty when it does not exist.
    pub fn read_git_exclude_file(&self) -> Result<String> {
        self.ensure_repository()?;
        if !self.store.exists() {
            return Ok(String::new());
        }
        match self.store.read() {
            Ok(bytes) => Ok(String::from_utf8_lossy(&bytes).into_owned()),
            Err(err) => {
                let failure = GitExcludeError::access(self.store.location(), &err);
                self.degrade(failure, "read", &[], &mut Vec::new())?;
                Ok(String::new())
            }
        }
    }

    /// Replaces the whole exclude file with `content`.
    ///
    /// The content is inspected first; findings are reported but never
    /// prevent the write.
    pub fn write_git_exclude_file(&self, content: &str) -> Result<ExcludeOutcome> {
        self.ensure_repository()?;
        let mut outcome = ExcludeOutcome::default();
        self.report_integrity(integrity::inspect_content(content.as_bytes()), &mut outcome.warnings);

        let written = self
            .store
            .write(content.as_bytes())
            .map_err(|err| GitExcludeError::access(self.store.location(), &err));
        match written {
            Ok(()) => {
                outcome.changed = true;
                self.restrict_permissions();
            }
            Err(err) => self.degrade(err, "write", &[], &mut outcome.warnings)?,
        }
        Ok(outcome)
    }

    fn apply_batch<S: AsRef<str>>(&self, mutation: Mutation, paths: &[S]) -> Result<BatchResult> {
        self.ensure_repository()?;
        let mut result = BatchResult::default();
        let mut seen = HashSet::new();
        let mut valid = Vec::new();

        for raw in paths {
            let raw = raw.as_ref();
            match self.validator.validate(raw) {
                ValidationOutcome::Accepted(path) => {
                    if seen.insert(path.clone()) {
                        valid.push(path);
                    }
                }
                ValidationOutcome::Rejected { reason, message } => {
                    let err = GitExcludeError::Validation {
                        path: raw.to_string(),
                        reason,
                        message,
                    };
                    debug!("{err}");
                    result.fail(raw, err);
                }
            }
        }

        if valid.is_empty() {
            return Ok(result);
        }

        if !self.settings.enabled {
            let failure = self.disabled(mutation, &valid);
            let message = failure.to_string();
            self.degrade(failure, mutation, &valid, &mut result.warnings)?;
            valid.iter().for_each(|path| result.fail(path.as_str(), &message));
            return Ok(result);
        }

        if mutation == Mutation::Remove && !self.store.exists() {
            result.successful = valid;
            return Ok(result);
        }

        let mut document = match self.load_document(&mut result.warnings) {
            Ok(document) => document,
            Err(err) => {
                let message = err.to_string();
                self.degrade(err, mutation, &valid, &mut result.warnings)?;
                valid.iter().for_each(|path| result.fail(path.as_str(), &message));
                return Ok(result);
            }
        };

        let mut changed = Vec::new();
        for path in &valid {
            let applied = match mutation {
                Mutation::Add => {
                    if document.contains(path) {
                        false
                    } else {
                        self.report_conflicts(path, document.entries(), &mut result.warnings);
                        document.insert(path)
                    }
                }
                Mutation::Remove => document.remove(path),
            };
            if applied {
                changed.push(path.clone());
            }
        }

        if changed.is_empty() {
            debug!("Batch {} left the exclude file unchanged", mutation.name());
            result.successful = valid;
            return Ok(result);
        }

        if let Err(err) = self.persist(&document) {
            let message = err.to_string();
            self.degrade(err, mutation, &changed, &mut result.warnings)?;
            for path in valid {
                if changed.contains(&path) {
                    result.fail(path, &message);
                } else {
                    result.successful.push(path);
                }
            }
            return Ok(result);
        }

        info!(
            "Batch {} updated {} entr{} in {}",
            mutation.name(),
            changed.len(),
            if changed.len() == 1 { "y" } else { "ies" },
            self.store.location().display()
        );
        self.verify(mutation, &changed, &mut result.warnings)?;
        result.successful = valid;
        Ok(result)
    }

    fn ensure_repository(&self) -> Result<()> {
        if self.store.repository_exists() {
            return Ok(());
        }
        let location = self.store.location();
        let root = location
            .ancestors()
            .nth(3)
            .unwrap_or(location)
            .to_path_buf();
        Err(GitExcludeError::RepositoryNotFound(root))
    }

    fn validate(&self, path: &str) -> Result<String> {
        match self.validator.validate(path) {
            ValidationOutcome::Accepted(path) => Ok(path),
            ValidationOutcome::Rejected { reason, message } => Err(GitExcludeError::Validation {
                path: path.to_string(),
                reason,
                message,
            }),
        }
    }

    fn disabled(&self, mutation: Mutation, paths: &[String]) -> GitExcludeError {
        GitExcludeError::Disabled {
            operation: mutation.name().to_string(),
            paths: paths.to_vec(),
        }
    }

    fn degrade(
        &self,
        failure: GitExcludeError,
        operation: impl Into<OperationName>,
        paths: &[String],
        warnings: &mut Vec<String>,
    ) -> Result<()> {
        let operation = operation.into();
        if let Some(message) = self.policy.handle(failure, operation.0, paths)?.message() {
            warnings.push(message);
        }
        Ok(())
    }

    fn parse(&self, bytes: &[u8]) -> ExcludeDocument {
        ExcludeDocument::parse(&String::from_utf8_lossy(bytes), &self.settings.marker_comment)
    }

    /// Reads and parses the exclude file, reporting integrity findings.
    fn load_document(&self, warnings: &mut Vec<String>) -> Result<ExcludeDocument> {
        if !self.store.exists() {
            return Ok(ExcludeDocument::new(self.settings.marker_comment.as_str()));
        }
        let bytes = self
            .store
            .read()
            .map_err(|err| GitExcludeError::access(self.store.location(), &err))?;

        let mut findings = integrity::inspect_content(&bytes);
        let document = self.parse(&bytes);
        if document.duplicate_markers() > 0 {
            findings.push(IntegrityWarning::DuplicateMarkers {
                count: document.duplicate_markers(),
            });
        }
        self.report_integrity(findings, warnings);
        Ok(document)
    }

    fn persist(&self, document: &ExcludeDocument) -> Result<()> {
        let location = self.store.location();
        if document.is_empty() {
            debug!("Exclude file would be empty; removing {}", location.display());
            return self
                .store
                .remove()
                .map_err(|err| GitExcludeError::access(location, &err));
        }

        self.store
            .write(document.render().as_bytes())
            .map_err(|err| GitExcludeError::access(location, &err))?;
        self.restrict_permissions();
        Ok(())
    }

    fn restrict_permissions(&self) {
        if let Err(err) = self.store.restrict_permissions() {
            warn!(
                "Could not restrict permissions on {}: {err}",
                self.store.location().display()
            );
        }
    }

    /// Re-reads the file and checks that `paths` landed (or left).
    fn verify(&self, mutation: Mutation, paths: &[String], warnings: &mut Vec<String>) -> Result<()> {
        if !self.settings.validate_operations {
            return Ok(());
        }
        let missing: Vec<String> = paths
            .iter()
            .filter(|path| self.is_in_git_exclude(path) != (mutation == Mutation::Add))
            .cloned()
            .collect();
        if missing.is_empty() {
            return Ok(());
        }
        let failure = GitExcludeError::Corruption(format!(
            "verification after {} did not find the expected state for [{}]",
            mutation.name(),
            missing.join(", ")
        ));
        self.degrade(failure, mutation, &missing, warnings)
    }

    fn report_integrity(&self, findings: Vec<IntegrityWarning>, warnings: &mut Vec<String>) {
        for finding in findings {
            let message = GitExcludeError::Corruption(finding.to_string()).to_string();
            warn!("{message}");
            warnings.push(message);
        }
    }

    fn report_conflicts(&self, candidate: &str, existing: &[String], warnings: &mut Vec<String>) {
        for conflict in patterns::check_add_conflicts(candidate, existing) {
            let message = conflict.to_string();
            warn!("{message}");
            warnings.push(message);
        }
    }
}

/// Operation label used in degradation warnings.
struct OperationName(&'static str);

impl From<Mutation> for OperationName {
    fn from(mutation: Mutation) -> Self {
        OperationName(mutation.name())
    }
}

impl From<&'static str> for OperationName {
    fn from(name: &'static str) -> Self {
        OperationName(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builders::policy::FallbackBehavior;
    use crate::builders::storage::MemoryExcludeStore;
    use std::rc::Rc;

    const MARKER: &str = "# pgit-cli managed exclusions";

    /// Shares one in-memory store between the engine and the test body.
    struct Shared(Rc<MemoryExcludeStore>);

    impl ExcludeStore for Shared {
        fn location(&self) -> &Path {
            self.0.location()
        }
        fn repository_exists(&self) -> bool {
            self.0.repository_exists()
        }
        fn exists(&self) -> bool {
            self.0.exists()
        }
        fn read(&self) -> std::io::Result<Vec<u8>> {
            self.0.read()
        }
        fn write(&self, content: &[u8]) -> std::io::Result<()> {
            self.0.write(content)
        }
        fn remove(&self) -> std::io::Result<()> {
            self.0.remove()
        }
        fn restrict_permissions(&self) -> std::io::Result<()> {
            self.0.restrict_permissions()
        }
    }

    /// Reports every write as successful but never keeps the content.
    struct DroppingWrites(MemoryExcludeStore);

    impl ExcludeStore for DroppingWrites {
        fn location(&self) -> &Path {
            self.0.location()
        }
        fn repository_exists(&self) -> bool {
            self.0.repository_exists()
        }
        fn exists(&self) -> bool {
            self.0.exists()
        }
        fn read(&self) -> std::io::Result<Vec<u8>> {
            self.0.read()
        }
        fn write(&self, _content: &[u8]) -> std::io::Result<()> {
            Ok(())
        }
        fn remove(&self) -> std::io::Result<()> {
            self.0.remove()
        }
        fn restrict_permissions(&self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn dropping_engine(settings: GitExcludeSettings) -> ExcludeEngine {
        ExcludeEngine::with_store(Box::new(DroppingWrites(MemoryExcludeStore::new())), &settings)
    }

    fn engine_with(store: MemoryExcludeStore, settings: GitExcludeSettings) -> (ExcludeEngine, Rc<MemoryExcludeStore>) {
        let store = Rc::new(store);
        let engine = ExcludeEngine::with_store(Box::new(Shared(store.clone())), &settings);
        (engine, store)
    }

    fn engine(store: MemoryExcludeStore) -> (ExcludeEngine, Rc<MemoryExcludeStore>) {
        engine_with(store, GitExcludeSettings::default())
    }

    fn settings(enabled: bool, fallback: FallbackBehavior) -> GitExcludeSettings {
        GitExcludeSettings {
            enabled,
            fallback_behavior: fallback,
            ..GitExcludeSettings::default()
        }
    }

    #[test]
    fn test_add_to_missing_file_creates_managed_section() {
        let (engine, store) = engine(MemoryExcludeStore::new());
        let outcome = engine.add_to_git_exclude("config.json").unwrap();
        assert!(outcome.changed);
        assert_eq!(store.content().unwrap(), format!("{MARKER}\nconfig.json\n"));
        assert!(engine.is_in_git_exclude("config.json"));
        assert!(engine.is_in_git_exclude("  config.json "));
    }

    #[test]
    fn test_repeated_add_writes_once() {
        let (engine, store) = engine(MemoryExcludeStore::new());
        for _ in 0..3 {
            engine.add_to_git_exclude("a.txt").unwrap();
        }
        assert_eq!(store.write_count(), 1);
        let content = store.content().unwrap();
        assert_eq!(content.matches(MARKER).count(), 1);
        assert_eq!(content.matches("a.txt").count(), 1);
    }

    #[test]
    fn test_add_rejects_invalid_path() {
        let (engine, store) = engine(MemoryExcludeStore::new());
        let err = engine.add_to_git_exclude("../escape").unwrap_err();
        assert!(matches!(err, GitExcludeError::Validation { .. }));
        assert!(err.to_string().contains("directory traversal"));
        assert!(store.content().is_none());
    }

    #[test]
    fn test_remove_last_entry_deletes_empty_file() {
        let (engine, store) = engine(MemoryExcludeStore::new());
        engine.add_to_git_exclude("a").unwrap();
        let outcome = engine.remove_from_git_exclude("a").unwrap();
        assert!(outcome.changed);
        assert!(store.content().is_none());
    }

    #[test]
    fn test_remove_without_file_is_noop() {
        let (engine, store) = engine(MemoryExcludeStore::new());
        let outcome = engine.remove_from_git_exclude("a").unwrap();
        assert!(!outcome.changed);
        assert_eq!(store.write_count(), 0);
    }

    #[test]
    fn test_batch_add_uses_single_write() {
        let (engine, store) = engine(MemoryExcludeStore::with_content("# mine\n*.log\n"));
        let result = engine
            .add_multiple_to_git_exclude(&["a", "b", "a", " c", "d/"])
            .unwrap();
        assert_eq!(result.successful, vec!["a", "b", "c", "d/"]);
        assert!(result.failed.is_empty());
        assert_eq!(store.write_count(), 1);
        assert_eq!(
            store.content().unwrap(),
            format!("# mine\n*.log\n\n{MARKER}\na\nb\nc\nd/\n")
        );
    }

    #[test]
    fn test_batch_remove_reports_absent_entries_as_successful() {
        let (engine, store) = engine(MemoryExcludeStore::with_content(&format!("{MARKER}\na\nb\n")));
        let result = engine.remove_multiple_from_git_exclude(&["a", "zzz", ""]).unwrap();
        assert_eq!(result.successful, vec!["a", "zzz"]);
        assert_eq!(result.failed.len(), 1);
        assert_eq!(store.content().unwrap(), format!("{MARKER}\nb\n"));
    }

    #[test]
    fn test_disabled_warn_returns_success_with_warning() {
        let (engine, store) = engine_with(MemoryExcludeStore::new(), settings(false, FallbackBehavior::Warn));
        let outcome = engine.add_to_git_exclude("x").unwrap();
        assert!(!outcome.changed);
        assert_eq!(outcome.warnings.len(), 1);
        assert!(outcome.warnings[0].contains("disabled"));
        assert!(store.content().is_none());
    }

    #[test]
    fn test_disabled_silent_has_no_warnings() {
        let (engine, _store) = engine_with(MemoryExcludeStore::new(), settings(false, FallbackBehavior::Silent));
        let outcome = engine.add_to_git_exclude("x").unwrap();
        assert!(outcome.warnings.is_empty());
        let outcome = engine.remove_from_git_exclude("x").unwrap();
        assert!(outcome.warnings.is_empty());
    }

    #[test]
    fn test_disabled_error_raises() {
        let (engine, _store) = engine_with(MemoryExcludeStore::new(), settings(false, FallbackBehavior::Error));
        let err = engine.add_to_git_exclude("x").unwrap_err();
        assert!(matches!(err, GitExcludeError::Disabled { .. }));
        assert!(err.to_string().contains("disabled"));

        let err = engine.add_multiple_to_git_exclude(&["x", "y"]).unwrap_err();
        assert!(err.to_string().contains("x, y"));
    }

    #[test]
    fn test_disabled_batch_enumerates_paths_in_one_warning() {
        let (engine, _store) = engine_with(MemoryExcludeStore::new(), settings(false, FallbackBehavior::Warn));
        let result = engine.add_multiple_to_git_exclude(&["x", "y", "../bad"]).unwrap();
        assert!(result.successful.is_empty());
        assert_eq!(result.failed.len(), 3);
        assert_eq!(result.warnings.len(), 1);
        assert!(result.warnings[0].contains("x, y"));
    }

    #[test]
    fn test_write_failure_degrades_under_warn() {
        let (engine, _store) = engine(MemoryExcludeStore::new().failing_writes());
        let outcome = engine.add_to_git_exclude("x").unwrap();
        assert!(!outcome.changed);
        assert!(outcome.warnings[0].contains("Permission denied"));

        let result = engine.add_multiple_to_git_exclude(&["x", "y"]).unwrap();
        assert!(result.successful.is_empty());
        assert_eq!(result.failed.len(), 2);
        assert!(result.failed[0].error.contains("Cannot access exclude file"));
    }

    #[test]
    fn test_write_failure_keeps_existing_entries_successful() {
        let store = MemoryExcludeStore::with_content(&format!("{MARKER}\nx\n")).failing_writes();
        let (engine, _store) = engine(store);
        let result = engine.add_multiple_to_git_exclude(&["x", "y"]).unwrap();
        assert_eq!(result.successful, vec!["x"]);
        assert_eq!(result.failed.len(), 1);
        assert_eq!(result.failed[0].path, "y");
    }

    #[test]
    fn test_read_failure_raises_under_error_policy() {
        let store = MemoryExcludeStore::with_content("x\n").failing_reads();
        let (engine, _store) = engine_with(store, settings(true, FallbackBehavior::Error));
        let err = engine.add_to_git_exclude("y").unwrap_err();
        assert!(matches!(err, GitExcludeError::Access { .. }));
        assert!(!err.is_recoverable());
        assert!(engine.read_git_exclude_file().is_err());
        assert!(!engine.is_in_git_exclude("x"));
    }

    #[test]
    fn test_missing_repository_is_an_error() {
        let (engine, _store) = engine(MemoryExcludeStore::without_repository());
        let err = engine.add_to_git_exclude("x").unwrap_err();
        assert!(matches!(err, GitExcludeError::RepositoryNotFound(_)));
        assert!(engine.add_multiple_to_git_exclude(&["x"]).is_err());
        assert!(engine.get_pgit_managed_excludes().is_err());
    }

    #[test]
    fn test_failed_verification_warns_under_warn() {
        let engine = dropping_engine(GitExcludeSettings::default());
        let outcome = engine.add_to_git_exclude("x").unwrap();
        assert!(outcome.changed);
        assert_eq!(outcome.warnings.len(), 1);
        assert!(outcome.warnings[0].contains("corrupted"));
        assert!(outcome.warnings[0].contains("verification after add"));

        let result = engine.add_multiple_to_git_exclude(&["y", "z"]).unwrap();
        assert_eq!(result.successful, vec!["y", "z"]);
        assert!(result.warnings.iter().any(|w| w.contains("y, z")));
    }

    #[test]
    fn test_failed_verification_raises_under_error() {
        let engine = dropping_engine(settings(true, FallbackBehavior::Error));
        let err = engine.add_to_git_exclude("x").unwrap_err();
        assert!(matches!(err, GitExcludeError::Corruption(_)));
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_verification_skipped_when_disabled() {
        let engine = dropping_engine(GitExcludeSettings {
            validate_operations: false,
            fallback_behavior: FallbackBehavior::Error,
            ..GitExcludeSettings::default()
        });
        let outcome = engine.add_to_git_exclude("x").unwrap();
        assert!(outcome.changed);
        assert!(outcome.warnings.is_empty());
        assert!(!engine.is_in_git_exclude("x"));
    }

    #[test]
    fn test_binary_content_warns_but_proceeds() {
        let (engine, store) = engine(MemoryExcludeStore::with_content("junk\0junk\n"));
        let outcome = engine.add_to_git_exclude("x").unwrap();
        assert!(outcome.changed);
        assert!(outcome.warnings.iter().any(|w| w.contains("corrupted/binary")));
        assert!(store.content().unwrap().ends_with(&format!("{MARKER}\nx\n")));
    }

    #[test]
    fn test_write_escape_hatch_inspects_content() {
        let (engine, store) = engine(MemoryExcludeStore::new());
        let long = "z".repeat(5000);
        let outcome = engine.write_git_exclude_file(&format!("{long}\n")).unwrap();
        assert!(outcome.changed);
        assert!(outcome.warnings[0].contains("too long"));
        assert_eq!(engine.read_git_exclude_file().unwrap().len(), 5001);
        assert!(store.exists());
    }

    #[test]
    fn test_custom_marker_is_honoured() {
        let custom = GitExcludeSettings {
            marker_comment: "# private files".to_string(),
            ..GitExcludeSettings::default()
        };
        let (engine, store) = engine_with(MemoryExcludeStore::with_content("# pgit-cli managed exclusions\nold\n"), custom);
        engine.add_to_git_exclude("new").unwrap();
        assert_eq!(
            store.content().unwrap(),
            "# pgit-cli managed exclusions\nold\n\n# private files\nnew\n"
        );
        assert_eq!(engine.get_pgit_managed_excludes().unwrap(), vec!["new"]);
    }
}
