pub mod categorize;
pub mod classify;
pub mod cli;
pub mod config;
pub mod index;
pub mod normalize;
pub mod parser;
pub mod reconstruct;
pub mod report;

use serde::Serialize;
use std::fmt;

/// Classification assigned to a diff hunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HunkCategory {
    Test,
    Code,
    Mixed,
    Unknown,
}

impl HunkCategory {
    pub const ALL: [HunkCategory; 4] = [
        HunkCategory::Test,
        HunkCategory::Code,
        HunkCategory::Mixed,
        HunkCategory::Unknown,
    ];

    /// Categories that make up a test-only patch.
    pub const TEST_SIDE: [HunkCategory; 2] = [HunkCategory::Test, HunkCategory::Mixed];

    /// Categories that make up a code-only patch. Unknown content counts as code.
    pub const CODE_SIDE: [HunkCategory; 2] = [HunkCategory::Code, HunkCategory::Unknown];

    pub fn as_str(self) -> &'static str {
        match self {
            HunkCategory::Test => "test",
            HunkCategory::Code => "code",
            HunkCategory::Mixed => "mixed",
            HunkCategory::Unknown => "unknown",
        }
    }
}

impl fmt::Display for HunkCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of a raw line inside a hunk body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LineKind {
    Added,
    Removed,
    Context,
    NoNewline,
    /// Any other line inside a hunk, kept verbatim as a continuation.
    Other,
}

/// One raw hunk body line, kept verbatim (prefix included).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiffLine {
    pub kind: LineKind,
    pub raw: String,
}

impl DiffLine {
    /// Line content without the leading `+`/`-`/` ` marker.
    pub fn text(&self) -> &str {
        match self.kind {
            LineKind::NoNewline | LineKind::Other => &self.raw,
            _ => self.raw.get(1..).unwrap_or(""),
        }
    }
}

/// A single diff hunk.
#[derive(Debug, Clone, Serialize)]
pub struct DiffHunk {
    pub header: String,
    pub old_start: u32,
    pub old_count: u32,
    pub new_start: u32,
    pub new_count: u32,
    /// Text after the closing `@@`, usually the enclosing function or class.
    pub context: String,
    pub lines: Vec<DiffLine>,
    pub content_hash: String,
    pub category: HunkCategory,
    pub confidence: f64,
}

impl DiffHunk {
    fn joined(&self, kind: LineKind) -> String {
        self.lines
            .iter()
            .filter(|l| l.kind == kind)
            .map(DiffLine::text)
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn added_text(&self) -> String {
        self.joined(LineKind::Added)
    }

    pub fn removed_text(&self) -> String {
        self.joined(LineKind::Removed)
    }

    pub fn context_text(&self) -> String {
        self.joined(LineKind::Context)
    }

    /// Net change in line count this hunk applies to the file.
    pub fn line_delta(&self) -> i64 {
        i64::from(self.new_count) - i64::from(self.old_count)
    }
}

/// The complete diff record for one file.
#[derive(Debug, Clone, Serialize)]
pub struct DiffFile {
    pub old_path: String,
    pub new_path: String,
    /// The `diff --git a/.. b/..` line.
    pub diff_line: String,
    /// Mode, index, rename and copy metadata, in input order.
    pub extended_header: Vec<String>,
    /// The `---` / `+++` lines.
    pub path_markers: Vec<String>,
    /// `Binary files ... differ` or a `GIT binary patch` body.
    pub binary_lines: Vec<String>,
    pub hunks: Vec<DiffHunk>,
    pub is_binary: bool,
    pub is_new_file: bool,
    pub is_deleted: bool,
}

pub const NULL_PATH: &str = "/dev/null";

impl DiffFile {
    /// Canonical path: the new path unless the file was deleted.
    pub fn path(&self) -> &str {
        if !self.new_path.is_empty() && self.new_path != NULL_PATH {
            &self.new_path
        } else {
            &self.old_path
        }
    }

    /// Header lines in the order git expects: diff line, extended header,
    /// path markers, then any binary payload.
    pub fn ordered_header_lines(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.diff_line.as_str())
            .chain(self.extended_header.iter().map(String::as_str))
            .chain(self.path_markers.iter().map(String::as_str))
            .chain(self.binary_lines.iter().map(String::as_str))
    }

    pub fn has_category(&self, category: HunkCategory) -> bool {
        self.hunks.iter().any(|h| h.category == category)
    }
}
