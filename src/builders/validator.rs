use serde::Serialize;
use std::fmt;

/// Longest path, in characters, accepted into the exclude file.
pub const MAX_PATH_LENGTH: usize = 4096;

/// Deepest nesting, in path segments, accepted into the exclude file.
pub const MAX_PATH_DEPTH: usize = 50;

const RESERVED_NAMES: &[&str] = &[
    "con", "prn", "aux", "nul", "com1", "com2", "com3", "com4", "com5", "com6", "com7", "com8",
    "com9", "lpt1", "lpt2", "lpt3", "lpt4", "lpt5", "lpt6", "lpt7", "lpt8", "lpt9",
];

/// The rule a rejected path violated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RejectReason {
    Empty,
    NullCharacter,
    ControlCharacter,
    TooLong,
    Traversal,
    Absolute,
    GitDirectory,
    ReservedName,
    TrailingSpaceOrDot,
    TooDeep,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RejectReason::Empty => "empty",
            RejectReason::NullCharacter => "null-character",
            RejectReason::ControlCharacter => "control-character",
            RejectReason::TooLong => "too-long",
            RejectReason::Traversal => "traversal",
            RejectReason::Absolute => "absolute",
            RejectReason::GitDirectory => "git-directory",
            RejectReason::ReservedName => "reserved-name",
            RejectReason::TrailingSpaceOrDot => "trailing-space-or-dot",
            RejectReason::TooDeep => "too-deep",
        };
        write!(f, "{name}")
    }
}

/// Result of validating one candidate exclude path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationOutcome {
    /// The path is safe; carries the trimmed path.
    Accepted(String),
    Rejected {
        reason: RejectReason,
        message: String,
    },
}

impl ValidationOutcome {
    fn reject(reason: RejectReason, message: impl Into<String>) -> Self {
        ValidationOutcome::Rejected {
            reason,
            message: message.into(),
        }
    }

    pub fn is_accepted(&self) -> bool {
        matches!(self, ValidationOutcome::Accepted(_))
    }
}

/// Validates paths before they are written to `.git/info/exclude`.
///
/// Validation is pure: the same input always yields the same outcome and
/// message, and no filesystem access takes place. Glob metacharacters,
/// embedded spaces and a trailing `/` directory marker are all accepted.
#[derive(Debug, Default, Clone, Copy)]
pub struct PathValidator;

impl PathValidator {
    pub fn new() -> Self {
        Self
    }

    /// Checks `path` against every safety rule, in a fixed order, and
    /// returns the first violation found.
    pub fn validate(&self, path: &str) -> ValidationOutcome {
        if path.trim().is_empty() {
            return ValidationOutcome::reject(
                RejectReason::Empty,
                "Path must be a non-empty string",
            );
        }

        if path.contains('\0') {
            return ValidationOutcome::reject(
                RejectReason::NullCharacter,
                "Path contains a null character",
            );
        }

        if let Some(c) = path.chars().find(|c| (*c as u32) < 0x20) {
            return ValidationOutcome::reject(
                RejectReason::ControlCharacter,
                format!("Path contains a control character (0x{:02x})", c as u32),
            );
        }

        if path.chars().count() > MAX_PATH_LENGTH {
            return ValidationOutcome::reject(
                RejectReason::TooLong,
                format!("Path exceeds the maximum length of {MAX_PATH_LENGTH} characters"),
            );
        }

        // Surrounding whitespace is trimmed, except a trailing space which
        // Windows silently drops and therefore is refused outright.
        if path.ends_with(' ') {
            return trailing_space_or_dot();
        }
        let normalized = path.trim();
        let segments: Vec<&str> = normalized.split(['/', '\\']).collect();

        if segments.iter().any(|s| *s == "..") {
            return ValidationOutcome::reject(
                RejectReason::Traversal,
                "Path contains directory traversal (..)",
            );
        }

        if is_absolute(normalized) {
            return ValidationOutcome::reject(
                RejectReason::Absolute,
                "Absolute paths are not allowed; use a path relative to the repository root",
            );
        }

        if segments.first().is_some_and(|s| *s == ".git") {
            return ValidationOutcome::reject(
                RejectReason::GitDirectory,
                "Paths inside the .git directory are not allowed",
            );
        }

        if let Some(name) = segments.iter().find(|s| is_reserved_name(s)) {
            return ValidationOutcome::reject(
                RejectReason::ReservedName,
                format!("Path uses the reserved device name '{name}'"),
            );
        }

        if segments
            .iter()
            .any(|s| *s != "." && (s.ends_with(' ') || s.ends_with('.')))
        {
            return trailing_space_or_dot();
        }

        let depth = segments.iter().filter(|s| !s.is_empty()).count();
        if depth > MAX_PATH_DEPTH {
            return ValidationOutcome::reject(
                RejectReason::TooDeep,
                format!("Path exceeds the maximum nesting depth of {MAX_PATH_DEPTH} segments"),
            );
        }

        ValidationOutcome::Accepted(normalized.to_string())
    }
}

fn trailing_space_or_dot() -> ValidationOutcome {
    ValidationOutcome::reject(
        RejectReason::TrailingSpaceOrDot,
        "Path components must not end with a space or dot",
    )
}

fn is_absolute(path: &str) -> bool {
    if path.starts_with('/') || path.starts_with('\\') {
        return true;
    }
    let bytes = path.as_bytes();
    bytes.len() >= 3 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':' && matches!(bytes[2], b'\\' | b'/')
}

fn is_reserved_name(segment: &str) -> bool {
    let stem = segment.split('.').next().unwrap_or(segment);
    RESERVED_NAMES
        .iter()
        .any(|name| stem.eq_ignore_ascii_case(name))
}
