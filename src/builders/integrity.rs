use content_inspector::{ContentType, inspect};
use std::fmt;

/// Exclude files larger than this are reported as unusually large.
pub const MAX_FILE_SIZE: usize = 1024 * 1024;

/// Exclude files with more lines than this are reported.
pub const MAX_LINE_COUNT: usize = 10_000;

/// Any single line longer than this, in characters, is reported.
pub const MAX_LINE_LENGTH: usize = 4096;

/// Share of non-text bytes above which content is treated as binary.
pub const MAX_NON_TEXT_RATIO: f64 = 0.3;

/// An advisory finding about the raw content of an exclude file.
///
/// None of these abort an operation; callers log them and continue with
/// best-effort parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntegrityWarning {
    BinaryContent,
    TooLarge { bytes: usize },
    TooManyLines { lines: usize },
    LineTooLong { line: usize, length: usize },
    DuplicateMarkers { count: usize },
}

impl fmt::Display for IntegrityWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntegrityWarning::BinaryContent => {
                write!(f, "Exclude file appears to contain corrupted/binary content")
            }
            IntegrityWarning::TooLarge { bytes } => write!(
                f,
                "Exclude file unusually large ({bytes} bytes, limit {MAX_FILE_SIZE})"
            ),
            IntegrityWarning::TooManyLines { lines } => write!(
                f,
                "Exclude file has too many lines ({lines}, limit {MAX_LINE_COUNT})"
            ),
            IntegrityWarning::LineTooLong { line, length } => write!(
                f,
                "Exclude file line {line} too long ({length} characters, limit {MAX_LINE_LENGTH})"
            ),
            IntegrityWarning::DuplicateMarkers { count } => write!(
                f,
                "Exclude file contains {count} duplicate managed-section marker(s); they will be dropped"
            ),
        }
    }
}

/// Runs every content heuristic over `content` and returns what it found.
pub fn inspect_content(content: &[u8]) -> Vec<IntegrityWarning> {
    let mut warnings = Vec::new();

    if looks_binary(content) {
        warnings.push(IntegrityWarning::BinaryContent);
    }

    if content.len() > MAX_FILE_SIZE {
        warnings.push(IntegrityWarning::TooLarge {
            bytes: content.len(),
        });
    }

    let text = String::from_utf8_lossy(content);
    let line_count = text.lines().count();
    if line_count > MAX_LINE_COUNT {
        warnings.push(IntegrityWarning::TooManyLines { lines: line_count });
    }

    // Only the first offending line is reported.
    if let Some((index, length)) = text
        .lines()
        .map(|line| line.chars().count())
        .enumerate()
        .find(|(_, length)| *length > MAX_LINE_LENGTH)
    {
        warnings.push(IntegrityWarning::LineTooLong {
            line: index + 1,
            length,
        });
    }

    warnings
}

/// NUL bytes anywhere, or too many control bytes and invalid UTF-8
/// sequences relative to the content length.
fn looks_binary(content: &[u8]) -> bool {
    if content.is_empty() {
        return false;
    }
    if matches!(inspect(content), ContentType::BINARY) || content.contains(&0) {
        return true;
    }

    let control = content
        .iter()
        .filter(|&&b| (b < 0x20 && !matches!(b, b'\t' | b'\n' | b'\r')) || b == 0x7f)
        .count();
    let invalid = String::from_utf8_lossy(content)
        .chars()
        .filter(|&c| c == char::REPLACEMENT_CHARACTER)
        .count();
    (control + invalid) as f64 / content.len() as f64 > MAX_NON_TEXT_RATIO
}
