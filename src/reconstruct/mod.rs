//! Rebuild appliable patches from a subset of classified hunks.

use crate::classify::Classifier;
use crate::parser::parse_diff;
use crate::{DiffFile, DiffHunk, HunkCategory};
use serde::Serialize;
use std::fmt::Write as _;
use tracing::debug;

/// Emit a patch holding only the hunks whose category is in `include`.
///
/// Files without a selected hunk are dropped; kept files always get their full
/// header. Binary and metadata-only files (renames, mode changes) cannot be
/// split and go with the code side: they are kept whenever `include` has
/// CODE or UNKNOWN.
///
/// With `rebase` set, new-side start lines are shifted to undo the line delta
/// of excluded hunks earlier in the same file.
pub fn reconstruct_patch(files: &[DiffFile], include: &[HunkCategory], rebase: bool) -> String {
    let wants_code = include
        .iter()
        .any(|c| matches!(c, HunkCategory::Code | HunkCategory::Unknown));
    let mut out = String::new();

    for file in files {
        if file.is_binary || file.hunks.is_empty() {
            if wants_code {
                push_header(&mut out, file);
            } else {
                debug!(path = file.path(), "skipping unsplittable file");
            }
            continue;
        }

        if !file.hunks.iter().any(|h| include.contains(&h.category)) {
            continue;
        }

        push_header(&mut out, file);
        let mut excluded_delta: i64 = 0;
        for hunk in &file.hunks {
            if !include.contains(&hunk.category) {
                excluded_delta += hunk.line_delta();
                continue;
            }
            if rebase && excluded_delta != 0 {
                out.push_str(&rebased_header(hunk, excluded_delta));
            } else {
                out.push_str(&hunk.header);
            }
            out.push('\n');
            for line in &hunk.lines {
                out.push_str(&line.raw);
                out.push('\n');
            }
        }
    }
    out
}

fn push_header(out: &mut String, file: &DiffFile) {
    for line in file.ordered_header_lines() {
        out.push_str(line);
        out.push('\n');
    }
}

/// Hunk header with the new start moved back by `excluded_delta`, keeping the
/// trailing context text.
fn rebased_header(hunk: &DiffHunk, excluded_delta: i64) -> String {
    let new_start = (i64::from(hunk.new_start) - excluded_delta).max(0);
    let mut header = format!(
        "@@ -{} +{} @@",
        format_range(i64::from(hunk.old_start), hunk.old_count),
        format_range(new_start, hunk.new_count)
    );
    if !hunk.context.is_empty() {
        let _ = write!(header, " {}", hunk.context);
    }
    header
}

fn format_range(start: i64, count: u32) -> String {
    if count == 1 {
        start.to_string()
    } else {
        format!("{start},{count}")
    }
}

/// Classification summary of a parsed diff.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PatchStats {
    pub total_files: usize,
    pub total_hunks: usize,
    pub test_hunks: usize,
    pub code_hunks: usize,
    pub mixed_hunks: usize,
    pub unknown_hunks: usize,
    /// Files with hunks on both the test and the code side.
    pub mixed_files: usize,
    pub test_only_files: usize,
    pub code_only_files: usize,
    pub binary_files: usize,
}

impl PatchStats {
    pub fn collect(files: &[DiffFile]) -> Self {
        let mut stats = PatchStats {
            total_files: files.len(),
            ..Self::default()
        };
        for file in files {
            if file.is_binary {
                stats.binary_files += 1;
                continue;
            }
            for hunk in &file.hunks {
                stats.total_hunks += 1;
                match hunk.category {
                    HunkCategory::Test => stats.test_hunks += 1,
                    HunkCategory::Code => stats.code_hunks += 1,
                    HunkCategory::Mixed => stats.mixed_hunks += 1,
                    HunkCategory::Unknown => stats.unknown_hunks += 1,
                }
            }
            let test_side = HunkCategory::TEST_SIDE.iter().any(|c| file.has_category(*c));
            let code_side = HunkCategory::CODE_SIDE.iter().any(|c| file.has_category(*c));
            match (test_side, code_side) {
                (true, true) => stats.mixed_files += 1,
                (true, false) => stats.test_only_files += 1,
                (false, true) => stats.code_only_files += 1,
                (false, false) => {}
            }
        }
        stats
    }
}

fn split(
    diff: &str,
    language_hint: Option<&str>,
    classifier: &Classifier<'_>,
    include: &[HunkCategory],
    rebase: bool,
) -> String {
    if diff.trim().is_empty() {
        return String::new();
    }
    let mut files = parse_diff(diff);
    classifier.classify_all(&mut files, language_hint);
    reconstruct_patch(&files, include, rebase)
}

/// Both sides of a split, from a single parse and classification.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SplitPatch {
    pub test: String,
    pub code: String,
}

/// Split `diff` into its test side (TEST, MIXED) and code side (CODE,
/// UNKNOWN, binary files).
pub fn split_patch(
    diff: &str,
    language_hint: Option<&str>,
    classifier: &Classifier<'_>,
    rebase: bool,
) -> SplitPatch {
    if diff.trim().is_empty() {
        return SplitPatch::default();
    }
    let mut files = parse_diff(diff);
    classifier.classify_all(&mut files, language_hint);
    SplitPatch {
        test: reconstruct_patch(&files, &HunkCategory::TEST_SIDE, rebase),
        code: reconstruct_patch(&files, &HunkCategory::CODE_SIDE, rebase),
    }
}

/// The TEST and MIXED hunks of `diff`.
pub fn split_test_patch(
    diff: &str,
    language_hint: Option<&str>,
    classifier: &Classifier<'_>,
    rebase: bool,
) -> String {
    split(diff, language_hint, classifier, &HunkCategory::TEST_SIDE, rebase)
}

/// The CODE and UNKNOWN hunks of `diff`, plus binary files.
pub fn split_code_patch(
    diff: &str,
    language_hint: Option<&str>,
    classifier: &Classifier<'_>,
    rebase: bool,
) -> String {
    split(diff, language_hint, classifier, &HunkCategory::CODE_SIDE, rebase)
}
