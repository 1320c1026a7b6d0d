use regex::Regex;
use std::fmt;

/// An advisory finding produced when a new entry overlaps existing ones.
///
/// Conflicts never block an add; they only point out entries that are
/// shadowed by, or shadow, something already in the managed section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConflictWarning {
    /// A literal path is already covered by an existing wildcard pattern.
    CoveredByPattern { candidate: String, pattern: String },
    /// A wildcard pattern covers an existing literal entry.
    MakesRedundant { candidate: String, entry: String },
}

impl fmt::Display for ConflictWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConflictWarning::CoveredByPattern { candidate, pattern } => write!(
                f,
                "'{candidate}' may conflict with existing pattern '{pattern}'"
            ),
            ConflictWarning::MakesRedundant { candidate, entry } => write!(
                f,
                "'{candidate}' would make existing entry '{entry}' redundant"
            ),
        }
    }
}

/// A simple glob compiled to a regex.
///
/// `**` matches across directories, `*` and `?` stay within one path
/// segment. A pattern without a `/` also matches against the file name of a
/// nested path, the way a bare gitignore pattern would. Negation, character
/// classes and anchoring rules are not modelled.
#[derive(Debug, Clone)]
pub struct GlobPattern {
    source: String,
    regex: Regex,
    basename_only: bool,
}

impl GlobPattern {
    pub fn new(pattern: &str) -> Option<Self> {
        let trimmed = pattern.trim_end_matches('/');
        let mut expression = String::from("^");
        let mut chars = trimmed.chars().peekable();
        while let Some(c) = chars.next() {
            match c {
                '*' if chars.peek() == Some(&'*') => {
                    chars.next();
                    expression.push_str(".*");
                }
                '*' => expression.push_str("[^/]*"),
                '?' => expression.push_str("[^/]"),
                other => expression.push_str(&regex::escape(&other.to_string())),
            }
        }
        expression.push('$');

        let regex = Regex::new(&expression).ok()?;
        Some(Self {
            source: pattern.to_string(),
            regex,
            basename_only: !trimmed.contains('/'),
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn matches(&self, path: &str) -> bool {
        let path = path.trim_end_matches('/');
        if self.regex.is_match(path) {
            return true;
        }
        self.basename_only
            && path
                .rsplit('/')
                .next()
                .is_some_and(|name| self.regex.is_match(name))
    }
}

/// True when `entry` contains a wildcard.
pub fn is_wildcard(entry: &str) -> bool {
    entry.contains('*')
}

/// Compares `candidate` with the existing managed entries.
///
/// A literal candidate is checked against every wildcard entry; a wildcard
/// candidate is checked against every literal entry. Two wildcards are never
/// compared with each other.
pub fn check_add_conflicts(candidate: &str, existing: &[String]) -> Vec<ConflictWarning> {
    if is_wildcard(candidate) {
        let Some(glob) = GlobPattern::new(candidate) else {
            return Vec::new();
        };
        return existing
            .iter()
            .filter(|entry| !is_wildcard(entry) && *entry != candidate && glob.matches(entry))
            .map(|entry| ConflictWarning::MakesRedundant {
                candidate: candidate.to_string(),
                entry: entry.clone(),
            })
            .collect();
    }

    existing
        .iter()
        .filter(|entry| is_wildcard(entry))
        .filter_map(|entry| GlobPattern::new(entry))
        .filter(|glob| glob.matches(candidate))
        .map(|glob| ConflictWarning::CoveredByPattern {
            candidate: candidate.to_string(),
            pattern: glob.source().to_string(),
        })
        .collect()
}
