use crate::{DiffFile, DiffHunk, DiffLine, HunkCategory, LineKind, NULL_PATH};
use sha2::{Digest, Sha256};

const EXTENDED_HEADER_PREFIXES: &[&str] = &[
    "index ",
    "old mode ",
    "new mode ",
    "new file mode ",
    "deleted file mode ",
    "similarity index ",
    "dissimilarity index ",
    "rename from ",
    "rename to ",
    "copy from ",
    "copy to ",
];

/// Parse raw `git diff` output into structured `DiffFile` entries.
///
/// The scanner keeps a current file and a current hunk, flushing each when the
/// next `diff --git` or `@@` header starts. Input that is empty or not a diff
/// yields an empty list. Inside a hunk, a line that matches no known prefix is
/// kept verbatim as [`LineKind::Other`] without closing the hunk. Hunks start
/// out `Unknown` with zero confidence until classification runs.
pub fn parse_diff(input: &str) -> Vec<DiffFile> {
    let mut files = Vec::new();
    let mut file: Option<FileBuilder> = None;
    let mut hunk: Option<HunkBuilder> = None;

    for line in input.lines() {
        if let Some(rest) = line.strip_prefix("diff --git ") {
            if let Some(done) = file.take() {
                files.push(done.finish(hunk.take()));
            }
            hunk = None;
            file = Some(FileBuilder::new(line, rest));
            continue;
        }

        let Some(current) = file.as_mut() else {
            continue;
        };

        if line.starts_with("@@ ")
            && let Some(next) = HunkBuilder::from_header(line)
        {
            if let Some(done) = hunk.take() {
                current.hunks.push(done.finish());
            }
            hunk = Some(next);
            continue;
        }

        if let Some(open) = hunk.as_mut() {
            open.push(line);
            continue;
        }

        current.header_line(line);
    }

    if let Some(done) = file.take() {
        files.push(done.finish(hunk.take()));
    }

    files
}

struct FileBuilder {
    diff_line: String,
    old_path: String,
    new_path: String,
    extended_header: Vec<String>,
    path_markers: Vec<String>,
    binary_lines: Vec<String>,
    hunks: Vec<DiffHunk>,
    is_binary: bool,
    in_binary_patch: bool,
    is_new_file: bool,
    is_deleted: bool,
}

impl FileBuilder {
    fn new(line: &str, rest: &str) -> Self {
        let (old_path, new_path) = split_git_paths(rest);
        Self {
            diff_line: line.to_string(),
            old_path,
            new_path,
            extended_header: Vec::new(),
            path_markers: Vec::new(),
            binary_lines: Vec::new(),
            hunks: Vec::new(),
            is_binary: false,
            in_binary_patch: false,
            is_new_file: false,
            is_deleted: false,
        }
    }

    /// Handle a line seen after `diff --git` but before the first hunk.
    fn header_line(&mut self, line: &str) {
        if self.in_binary_patch {
            self.binary_lines.push(line.to_string());
            return;
        }

        if EXTENDED_HEADER_PREFIXES.iter().any(|p| line.starts_with(p)) {
            if line.starts_with("new file mode ") {
                self.is_new_file = true;
            } else if line.starts_with("deleted file mode ") {
                self.is_deleted = true;
            }
            self.extended_header.push(line.to_string());
            return;
        }

        if line.starts_with("Binary files ") && line.ends_with(" differ") {
            self.is_binary = true;
            self.binary_lines.push(line.to_string());
            return;
        }

        if line == "GIT binary patch" {
            self.is_binary = true;
            self.in_binary_patch = true;
            self.binary_lines.push(line.to_string());
            return;
        }

        if let Some(path) = line.strip_prefix("--- ") {
            self.old_path = clean_marker_path(path, "a/");
            self.path_markers.push(line.to_string());
        } else if let Some(path) = line.strip_prefix("+++ ") {
            self.new_path = clean_marker_path(path, "b/");
            self.path_markers.push(line.to_string());
        }
    }

    fn finish(mut self, open_hunk: Option<HunkBuilder>) -> DiffFile {
        if let Some(h) = open_hunk {
            self.hunks.push(h.finish());
        }
        DiffFile {
            old_path: self.old_path,
            new_path: self.new_path,
            diff_line: self.diff_line,
            extended_header: self.extended_header,
            path_markers: self.path_markers,
            binary_lines: self.binary_lines,
            hunks: self.hunks,
            is_binary: self.is_binary,
            is_new_file: self.is_new_file,
            is_deleted: self.is_deleted,
        }
    }
}

struct HunkBuilder {
    header: String,
    old_start: u32,
    old_count: u32,
    new_start: u32,
    new_count: u32,
    context: String,
    lines: Vec<DiffLine>,
}

impl HunkBuilder {
    /// Parse a hunk header: `@@ -old_start[,old_count] +new_start[,new_count] @@ [context]`.
    fn from_header(line: &str) -> Option<Self> {
        let body = line.strip_prefix("@@ ")?;
        // Everything after the closing @@ is optional context
        let close = body.find(" @@")?;
        let ranges = &body[..close];
        let context = body[close + 3..].trim().to_string();

        let mut parts = ranges.split(' ');
        let (old_start, old_count) = parse_range(parts.next()?.strip_prefix('-')?)?;
        let (new_start, new_count) = parse_range(parts.next()?.strip_prefix('+')?)?;

        Some(Self {
            header: line.to_string(),
            old_start,
            old_count,
            new_start,
            new_count,
            context,
            lines: Vec::new(),
        })
    }

    fn push(&mut self, line: &str) {
        let kind = match line.chars().next() {
            Some('+') => LineKind::Added,
            Some('-') => LineKind::Removed,
            // Some tools strip the single space from empty context lines
            Some(' ') | None => LineKind::Context,
            Some('\\') => LineKind::NoNewline,
            Some(_) => LineKind::Other,
        };
        self.lines.push(DiffLine {
            kind,
            raw: line.to_string(),
        });
    }

    fn finish(self) -> DiffHunk {
        let content_hash = compute_hash(&self.lines);
        DiffHunk {
            header: self.header,
            old_start: self.old_start,
            old_count: self.old_count,
            new_start: self.new_start,
            new_count: self.new_count,
            context: self.context,
            lines: self.lines,
            content_hash,
            category: HunkCategory::Unknown,
            confidence: 0.0,
        }
    }
}

/// Split `a/<old> b/<new>` into its two paths.
fn split_git_paths(rest: &str) -> (String, String) {
    if let Some(after_a) = rest.strip_prefix("a/")
        && let Some(pos) = after_a.find(" b/")
    {
        return (after_a[..pos].to_string(), after_a[pos + 3..].to_string());
    }
    // --no-prefix diffs or quoted paths: best effort split on whitespace
    let mut parts = rest.split_whitespace();
    let old = parts.next().unwrap_or_default().to_string();
    let new = parts.next().map(str::to_string).unwrap_or_else(|| old.clone());
    (old, new)
}

fn clean_marker_path(path: &str, prefix: &str) -> String {
    // Some producers append a tab and timestamp after the path
    let path = path.split('\t').next().unwrap_or(path).trim_end();
    if path == NULL_PATH {
        return NULL_PATH.to_string();
    }
    path.strip_prefix(prefix).unwrap_or(path).to_string()
}

/// Parse a range like "start,count" or "start" (count defaults to 1).
fn parse_range(s: &str) -> Option<(u32, u32)> {
    match s.split_once(',') {
        Some((start, count)) => Some((start.parse().ok()?, count.parse().ok()?)),
        None => Some((s.parse().ok()?, 1)),
    }
}

/// Compute SHA-256 hash of a hunk body.
fn compute_hash(lines: &[DiffLine]) -> String {
    let mut hasher = Sha256::new();
    for line in lines {
        hasher.update(line.raw.as_bytes());
        hasher.update(b"\n");
    }
    format!("{:x}", hasher.finalize())
}
