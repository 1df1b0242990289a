//! Changed-file and module index for relevance filtering.
//!
//! Coarse on purpose: file paths plus lowercased directory segments and file
//! stems, minus structural names that nearly every repository shares. Names
//! of functions, methods and classes defined on changed lines are kept too.

use crate::parser::parse_diff;
use crate::{DiffFile, LineKind};
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::LazyLock;

/// Directory names too generic to signal topical relevance.
pub const GENERIC_SEGMENTS: &[&str] = &[
    "src", "main", "test", "tests", "lib", "pkg", "internal", "app",
];

/// Shortest symbol name worth recording.
const MIN_SYMBOL_LEN: usize = 3;

static SYMBOL_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"\bdef\s+([A-Za-z_][A-Za-z0-9_]*)\s*\(",
        r"\bclass\s+([A-Za-z_][A-Za-z0-9_]*)\b",
        r"\bfunction\s+([A-Za-z_][A-Za-z0-9_]*)\s*\(",
        r"\bfunc\s+(?:\([^)]*\)\s*)?([A-Za-z_][A-Za-z0-9_]*)\s*\(",
        r"\bfn\s+([A-Za-z_][A-Za-z0-9_]*)\s*[(<]",
        r"\b(?:public|private|protected|internal|static|final|virtual|override)\s+[\w<>\[\],\s]+\s+([A-Za-z_][A-Za-z0-9_]*)\s*\(",
    ]
    .into_iter()
    .map(|p| Regex::new(p).expect("valid regex"))
    .collect()
});

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChangedFileIndex {
    pub files: BTreeSet<String>,
    pub modules: BTreeSet<String>,
    /// Lowercased names defined on added or removed lines.
    pub symbols: BTreeSet<String>,
}

impl ChangedFileIndex {
    /// Build the index from raw diff text.
    pub fn from_diff(diff: &str) -> Self {
        Self::from_files(&parse_diff(diff))
    }

    pub fn from_files(files: &[DiffFile]) -> Self {
        let mut index = Self::from_paths(files.iter().map(DiffFile::path));
        let changed = files
            .iter()
            .flat_map(|f| &f.hunks)
            .flat_map(|h| &h.lines)
            .filter(|l| matches!(l.kind, LineKind::Added | LineKind::Removed));
        for line in changed {
            index.symbols.extend(changed_symbols(line.text()));
        }
        index
    }

    pub fn from_paths<'a, I>(paths: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut index = Self::default();
        for path in paths {
            if path.is_empty() {
                continue;
            }
            index.modules.extend(module_tokens(path));
            index.files.insert(path.to_string());
        }
        index
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// File stems of all changed files, case preserved.
    pub fn stems(&self) -> impl Iterator<Item = &str> {
        self.files.iter().map(|f| file_stem(f))
    }
}

/// Names introduced by `def`, `class`, `function`, `func`, `fn` or a
/// modifier-prefixed method signature on one line.
pub fn changed_symbols(line: &str) -> BTreeSet<String> {
    let mut symbols = BTreeSet::new();
    if line.trim().is_empty() {
        return symbols;
    }
    for pattern in SYMBOL_PATTERNS.iter() {
        for caps in pattern.captures_iter(line) {
            if let Some(name) = caps.get(1)
                && name.as_str().len() >= MIN_SYMBOL_LEN
            {
                symbols.insert(name.as_str().to_lowercase());
            }
        }
    }
    symbols
}

/// Module tokens of one path: non-generic directory segments plus the stem.
pub fn module_tokens(path: &str) -> Vec<String> {
    let normalized = path.replace('\\', "/");
    let mut segments: Vec<&str> = normalized.split('/').filter(|s| !s.is_empty()).collect();
    let Some(last) = segments.pop() else {
        return Vec::new();
    };
    let mut tokens: Vec<String> = segments
        .into_iter()
        .filter(|s| *s != "." && *s != "..")
        .map(str::to_lowercase)
        .filter(|s| !GENERIC_SEGMENTS.contains(&s.as_str()))
        .collect();
    let stem = file_stem(last).to_lowercase();
    if !stem.is_empty() {
        tokens.push(stem);
    }
    tokens
}

/// The final path component without its last extension.
pub fn file_stem(path: &str) -> &str {
    let name = path.rsplit(['/', '\\']).next().unwrap_or(path);
    match name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stems_and_segments_exclude_generic_names() {
        let tokens = module_tokens("src/main/java/com/acme/billing/Invoice.java");
        assert_eq!(tokens, vec!["java", "com", "acme", "billing", "invoice"]);

        let tokens = module_tokens("pkg/internal/server/handler.go");
        assert_eq!(tokens, vec!["server", "handler"]);
    }

    #[test]
    fn file_stem_handles_dotfiles_and_multi_dots() {
        assert_eq!(file_stem("src/app.core.ts"), "app.core");
        assert_eq!(file_stem(".gitignore"), ".gitignore");
        assert_eq!(file_stem("Makefile"), "Makefile");
    }

    #[test]
    fn index_from_diff_uses_canonical_paths() {
        let diff = r#"diff --git a/src/billing/invoice.py b/src/billing/invoice.py
--- a/src/billing/invoice.py
+++ b/src/billing/invoice.py
@@ -1 +1 @@
-a
+b
diff --git a/tests/test_invoice.py b/tests/test_invoice.py
deleted file mode 100644
--- a/tests/test_invoice.py
+++ /dev/null
@@ -1 +0,0 @@
-x
"#;
        let index = ChangedFileIndex::from_diff(diff);
        assert!(index.files.contains("src/billing/invoice.py"));
        assert!(index.files.contains("tests/test_invoice.py"));
        assert!(index.modules.contains("billing"));
        assert!(index.modules.contains("invoice"));
        assert!(index.modules.contains("test_invoice"));
        assert!(!index.modules.contains("src"));
        assert!(!index.modules.contains("tests"));
    }

    #[test]
    fn symbols_come_from_changed_lines_only() {
        let diff = r#"diff --git a/src/billing/invoice.py b/src/billing/invoice.py
--- a/src/billing/invoice.py
+++ b/src/billing/invoice.py
@@ -10,3 +10,3 @@ class Invoice:
     def total(self):
-    def round_cents(self, value):
+    def round_to_cents(self, value):
         pass
diff --git a/pkg/server/handler.go b/pkg/server/handler.go
--- a/pkg/server/handler.go
+++ b/pkg/server/handler.go
@@ -1 +1,2 @@
+func (h *Handler) ServeHTTP(w http.ResponseWriter, r *http.Request) {
 }
"#;
        let index = ChangedFileIndex::from_diff(diff);
        let symbols: Vec<&str> = index.symbols.iter().map(String::as_str).collect();
        assert_eq!(symbols, vec!["round_cents", "round_to_cents", "servehttp"]);
    }

    #[test]
    fn changed_symbols_cover_common_declarations() {
        let names = |line: &str| changed_symbols(line).into_iter().collect::<Vec<_>>();
        assert_eq!(names("pub fn parse_range(s: &str) {"), vec!["parse_range"]);
        assert_eq!(names("fn wrap<T>(v: T) {"), vec!["wrap"]);
        assert_eq!(names("export function renderCart(items) {"), vec!["rendercart"]);
        assert_eq!(names("public class PluginManager {"), vec!["pluginmanager"]);
        assert_eq!(
            names("    private static int computeTotal(int a) {"),
            vec!["computetotal"]
        );
        assert!(names("def go():").is_empty());
        assert!(names("   ").is_empty());
    }

    #[test]
    fn path_only_index_has_no_symbols() {
        let index = ChangedFileIndex::from_paths(["src/a.rs"]);
        assert!(index.symbols.is_empty());
    }

    #[test]
    fn empty_diff_gives_empty_index() {
        let index = ChangedFileIndex::from_diff("not a diff");
        assert!(index.is_empty());
        assert!(index.modules.is_empty());
    }
}
