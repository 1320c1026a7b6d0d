//! In-memory model of `.git/info/exclude`.
//!
//! The file is split into three regions: the free-form preamble, the managed
//! section (introduced by the marker comment) and whatever follows the next
//! comment after the managed section. Only the managed section is ever
//! interpreted; the other regions are carried through verbatim.

/// Parsed representation of an exclude file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExcludeDocument {
    marker: String,
    preamble: Vec<String>,
    /// Whether a blank line separates the preamble from the marker.
    separated: bool,
    entries: Vec<String>,
    trailing: Vec<String>,
    /// Whether the last line ends with `\n`.
    final_newline: bool,
    duplicate_markers: usize,
}

impl ExcludeDocument {
    /// An empty document that will use `marker` once entries are added.
    pub fn new(marker: impl Into<String>) -> Self {
        Self {
            marker: marker.into(),
            preamble: Vec::new(),
            separated: true,
            entries: Vec::new(),
            trailing: Vec::new(),
            final_newline: true,
            duplicate_markers: 0,
        }
    }

    /// Splits `content` into preamble, managed entries and trailing lines.
    ///
    /// Lines before the first exact `marker` line form the preamble. After the
    /// marker, every non-blank, non-comment line is a managed entry until the
    /// next comment line; that comment and everything below it is trailing
    /// content. Blank lines directly above that comment, or at the end of
    /// the file, stay with the trailing content.
    pub fn parse(content: &str, marker: &str) -> Self {
        let mut document = Self::new(marker);
        document.final_newline = content.is_empty() || content.ends_with('\n');
        let lines = split_lines(content);

        let Some(marker_index) = lines.iter().position(|line| is_marker(line, marker)) else {
            document.preamble = lines.iter().map(|l| l.to_string()).collect();
            return document;
        };

        let mut preamble: Vec<String> = lines[..marker_index].iter().map(|l| l.to_string()).collect();
        document.separated = preamble.last().is_some_and(|l| l.is_empty());
        if document.separated {
            preamble.pop();
        }
        document.preamble = preamble;

        let mut pending_blanks = Vec::new();
        let mut index = marker_index + 1;
        while index < lines.len() {
            let line = lines[index];
            let trimmed = line.trim();
            if is_marker(line, marker) {
                document.duplicate_markers += 1;
            } else if trimmed.is_empty() {
                pending_blanks.push(line.to_string());
            } else if trimmed.starts_with('#') {
                break;
            } else {
                pending_blanks.clear();
                document.insert(trimmed);
            }
            index += 1;
        }

        document.trailing = pending_blanks;
        if index < lines.len() {
            for line in &lines[index..] {
                if is_marker(line, marker) {
                    document.duplicate_markers += 1;
                } else {
                    document.trailing.push(line.to_string());
                }
            }
        }

        document
    }

    /// Serializes the document back to file content.
    ///
    /// The marker is emitted only when the managed section has entries.
    /// Non-empty output ends with a newline unless the parsed content did not.
    pub fn render(&self) -> String {
        let mut lines: Vec<&str> = self.preamble.iter().map(String::as_str).collect();
        if !self.entries.is_empty() {
            if !self.preamble.is_empty() && self.separated {
                lines.push("");
            }
            lines.push(&self.marker);
            lines.extend(self.entries.iter().map(String::as_str));
        }
        lines.extend(self.trailing.iter().map(String::as_str));

        if lines.is_empty() {
            return String::new();
        }
        let mut content = lines.join("\n");
        if self.final_newline {
            content.push('\n');
        }
        content
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn preamble(&self) -> &[String] {
        &self.preamble
    }

    pub fn trailing(&self) -> &[String] {
        &self.trailing
    }

    /// Number of extra marker lines dropped while parsing.
    pub fn duplicate_markers(&self) -> usize {
        self.duplicate_markers
    }

    pub fn has_marker(&self) -> bool {
        !self.entries.is_empty()
    }

    pub fn contains(&self, entry: &str) -> bool {
        self.entries.iter().any(|e| e == entry)
    }

    /// Appends `entry` unless already present. Returns whether it was added.
    pub fn insert(&mut self, entry: &str) -> bool {
        if self.contains(entry) {
            return false;
        }
        self.entries.push(entry.to_string());
        true
    }

    /// Removes `entry` if present. Returns whether it was removed.
    pub fn remove(&mut self, entry: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e != entry);
        self.entries.len() != before
    }

    /// True when rendering would produce an empty file.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.preamble.is_empty() && self.trailing.is_empty()
    }
}

fn is_marker(line: &str, marker: &str) -> bool {
    line.trim_end() == marker.trim_end()
}

fn split_lines(content: &str) -> Vec<&str> {
    if content.is_empty() {
        return Vec::new();
    }
    let body = content.strip_suffix('\n').unwrap_or(content);
    body.split('\n').collect()
}
