//! Topical relevance of a passing test to a change.
//!
//! A shared package alone is not enough: it needs at least two meaningful
//! segments in common, or a class, stem or keyword match. A test id that
//! names a symbol defined on a changed line is always relevant.

use crate::classify::language::normalize_language;
use crate::index::{ChangedFileIndex, file_stem};
use regex::Regex;
use std::collections::BTreeSet;
use std::sync::LazyLock;

const CLASS_SUFFIXES: &[&str] = &["IntegrationTest", "UnitTest", "Tests", "Test", "IT", "Spec"];

/// Segments ignored when comparing packages or namespaces with paths.
const COMMON_SEGMENTS: &[&str] = &[
    "src", "main", "test", "tests", "java", "kotlin", "resources", "org", "com", "lib", "vendor",
];

/// Minimum shared meaningful segments for a package/namespace match.
const MIN_SHARED_SEGMENTS: usize = 2;

/// Shortest changed symbol that may link a test id to the change.
const MIN_LINKED_SYMBOL_LEN: usize = 4;

/// Changed source files above which integration tests are assumed relevant.
const INTEGRATION_SOURCE_THRESHOLD: usize = 3;

static SYNTHETIC_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(test_|failed_test_|skipped_test_|example_|pending_example_|passed_test_)\d+$")
        .expect("valid regex")
});
static CAMEL_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(.)([A-Z][a-z]+)").expect("valid regex"));
static CAMEL_EDGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([a-z0-9])([A-Z])").expect("valid regex"));

/// Whether `test` is topically related to the changed files in `index`.
pub fn is_relevant(test: &str, index: &ChangedFileIndex, language: Option<&str>) -> bool {
    if test_file_touched(test, index) || names_changed_symbol(test, index) {
        return true;
    }
    let language = language.map(normalize_language).unwrap_or_default();
    match language.as_str() {
        "java" | "kotlin" | "scala" => jvm_relevant(test, index),
        "php" => php_relevant(test, index),
        "ruby" => ruby_relevant(test, index),
        "python" => stem_in_name(test, index, |s| s.to_string()),
        "javascript" | "typescript" => {
            stem_in_name(test, index, |s| s.replace(".test", "").replace(".spec", ""))
        }
        _ => stem_in_name(test, index, |s| s.to_string()) || module_in_name(test, index),
    }
}

/// The test id names a changed file, e.g. `tests/test_app.py::test_add`.
fn test_file_touched(test: &str, index: &ChangedFileIndex) -> bool {
    index.files.iter().any(|f| test.contains(f.as_str()))
}

/// The test id mentions a function, method or class defined on a changed line.
fn names_changed_symbol(test: &str, index: &ChangedFileIndex) -> bool {
    let lower = test.to_lowercase();
    index
        .symbols
        .iter()
        .any(|s| s.len() >= MIN_LINKED_SYMBOL_LEN && lower.contains(s.as_str()))
}

fn stem_in_name(test: &str, index: &ChangedFileIndex, clean: impl Fn(&str) -> String) -> bool {
    let lower = test.to_lowercase();
    index.stems().any(|stem| {
        let stem = clean(&stem.to_lowercase());
        stem.len() > 3 && lower.contains(&stem)
    })
}

fn module_in_name(test: &str, index: &ChangedFileIndex) -> bool {
    let lower = test.to_lowercase();
    index
        .modules
        .iter()
        .any(|m| m.len() > 3 && lower.contains(m.as_str()))
}

fn strip_class_suffix(class: &str) -> (&str, Option<&'static str>) {
    for suffix in CLASS_SUFFIXES {
        if let Some(base) = class.strip_suffix(suffix)
            && !base.is_empty()
        {
            return (base, Some(suffix));
        }
    }
    (class, None)
}

/// Class-to-file matching shared by JVM and PHP ids.
fn class_matches_stem(class: &str, index: &ChangedFileIndex) -> bool {
    let (base, _) = strip_class_suffix(class);
    index
        .stems()
        .any(|stem| stem == base || stem == class || (stem.len() > 3 && class.contains(stem)))
}

fn meaningful(parts: impl Iterator<Item = String>) -> BTreeSet<String> {
    parts
        .filter(|p| !p.is_empty() && !COMMON_SEGMENTS.contains(&p.as_str()))
        .collect()
}

fn shares_segments(namespace: &BTreeSet<String>, index: &ChangedFileIndex) -> bool {
    index.files.iter().any(|f| {
        let path_parts = meaningful(f.to_lowercase().replace('\\', "/").split('/').map(str::to_string));
        namespace.intersection(&path_parts).count() >= MIN_SHARED_SEGMENTS
    })
}

/// Ids like `com.acme.billing.InvoiceTest#rounds`.
fn jvm_relevant(test: &str, index: &ChangedFileIndex) -> bool {
    let (class_full, method) = test.split_once('#').unwrap_or((test, ""));
    let (package, class) = class_full.rsplit_once('.').unwrap_or(("", class_full));

    if class_matches_stem(class, index) {
        return true;
    }

    if !method.is_empty() {
        let method = method.to_lowercase();
        let keyword_hit = index.files.iter().any(|f| {
            f.to_lowercase()
                .replace('\\', "/")
                .split('/')
                .filter(|p| !COMMON_SEGMENTS.contains(p))
                .any(|p| p.len() > 3 && method.contains(p))
        });
        if keyword_hit {
            return true;
        }
    }

    if !package.is_empty() {
        let namespace = meaningful(package.to_lowercase().split('.').map(str::to_string));
        if shares_segments(&namespace, index) {
            return true;
        }
    }

    let integration = matches!(strip_class_suffix(class).1, Some("IT" | "IntegrationTest"))
        || package.to_lowercase().contains("itest")
        || class.to_lowercase().contains("integration");
    if integration {
        let sources = index
            .files
            .iter()
            .filter(|f| {
                let f = f.replace('\\', "/");
                f.contains("/src/main/")
                    || (!f.contains("/test/") && (f.ends_with(".java") || f.ends_with(".kt")))
            })
            .count();
        return sources >= INTEGRATION_SOURCE_THRESHOLD;
    }

    false
}

/// Ids like `League\Csv\ReaderTest::testItReads`.
fn php_relevant(test: &str, index: &ChangedFileIndex) -> bool {
    let class_full = test.split_once("::").map_or(test, |(c, _)| c);
    let parts: Vec<&str> = class_full.split('\\').collect();
    let class = parts.last().copied().unwrap_or_default();

    if class_matches_stem(class, index) {
        return true;
    }
    let namespace = meaningful(
        parts[..parts.len().saturating_sub(1)]
            .iter()
            .map(|p| p.to_lowercase()),
    );
    shares_segments(&namespace, index)
}

fn camel_to_snake(name: &str) -> String {
    let step = CAMEL_WORD.replace_all(name, "${1}_${2}");
    CAMEL_EDGE.replace_all(&step, "${1}_${2}").to_lowercase()
}

fn looks_like_test_file(path: &str) -> bool {
    let lower = path.to_lowercase();
    lower.contains("/test/")
        || lower.contains("/tests/")
        || lower.contains("/spec/")
        || lower.contains("_test.rb")
        || lower.contains("_spec.rb")
        || file_stem(&lower).contains("test_")
}

/// Minitest/RSpec ids like `RenderTagTest#test_render` or `SnippetTest::LaxMode#test_x`.
fn ruby_relevant(test: &str, index: &ChangedFileIndex) -> bool {
    if SYNTHETIC_NAME.is_match(test) {
        // Runner could not recover real names; any test change makes them relevant
        return index.files.iter().any(|f| looks_like_test_file(f));
    }

    let class = if let Some((c, _)) = test.split_once('#') {
        c.split("::").next().unwrap_or(c)
    } else if let Some((c, _)) = test.split_once("::") {
        c
    } else {
        return stem_in_name(test, index, |s| s.to_string());
    };

    let (base, _) = strip_class_suffix(class);
    let base_snake = camel_to_snake(base);
    let class_snake = camel_to_snake(class);

    index.files.iter().any(|f| {
        let stem = file_stem(f).to_lowercase();
        if stem == base_snake || (base_snake.len() > 3 && stem.contains(&base_snake)) {
            return true;
        }
        if base.len() > 3 && f.to_lowercase().contains(&base.to_lowercase()) {
            return true;
        }
        f.replace('\\', "/").split('/').any(|part| {
            let part = file_stem(part).to_lowercase();
            part.len() > 3 && (class_snake.contains(&part) || base_snake.contains(&part))
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index(paths: &[&str]) -> ChangedFileIndex {
        ChangedFileIndex::from_paths(paths.iter().copied())
    }

    #[test]
    fn test_id_naming_changed_file_is_relevant() {
        let idx = index(&["tests/test_app.py"]);
        assert!(is_relevant("tests/test_app.py::test_add", &idx, Some("python")));
    }

    #[test]
    fn test_id_naming_changed_symbol_is_relevant() {
        let mut idx = index(&["src/billing/invoice.py"]);
        idx.symbols.insert("apply_discount".into());
        idx.symbols.insert("tax".into());
        assert!(is_relevant("test_apply_discount_twice", &idx, Some("python")));
        assert!(is_relevant("com.acme.CartTest#apply_discount", &idx, Some("java")));
        // Symbols shorter than four characters are too noisy to link on.
        assert!(!is_relevant("test_tax_rate", &idx, Some("python")));
    }

    #[test]
    fn symbols_from_diff_link_tests_in_unrelated_files() {
        let diff = "diff --git a/src/money.rs b/src/money.rs\n--- a/src/money.rs\n+++ b/src/money.rs\n@@ -1 +1 @@\n-pub fn round_half_even(x: f64) -> f64 {\n+pub fn round_half_even(x: f64, places: u32) -> f64 {\n";
        let idx = ChangedFileIndex::from_diff(diff);
        assert!(is_relevant("ledger::tests::round_half_even_ties", &idx, Some("rust")));
        assert!(!is_relevant("ledger::tests::posts_entries", &idx, Some("rust")));
    }

    #[test]
    fn java_class_matches_changed_stem() {
        let idx = index(&["core/src/main/java/com/acme/plugin/PluginManager.java"]);
        assert!(is_relevant("com.acme.plugin.PluginManagerTest#loads", &idx, Some("java")));
        assert!(is_relevant(
            "com.acme.plugin.PluginManagerIntegrationTest#boots",
            &idx,
            Some("Java")
        ));
        assert!(!is_relevant("com.acme.other.WidgetTest#renders", &idx, Some("java")));
    }

    #[test]
    fn java_package_overlap_needs_two_segments() {
        let idx = index(&["ap/src/main/java/org/mapstruct/ap/kotlin/Processor.java"]);
        // kotlin is generic, so the overlap is mapstruct + ap
        assert!(is_relevant("org.mapstruct.ap.test.SomethingTest#x", &idx, Some("java")));
        assert!(!is_relevant("org.other.pkg.SomethingTest#x", &idx, Some("java")));
    }

    #[test]
    fn java_method_keyword_matches_path_segment() {
        let idx = index(&["src/main/java/com/acme/nullness/Checker.java"]);
        assert!(is_relevant("com.acme.AllTests#nullnessIsReported", &idx, Some("java")));
    }

    #[test]
    fn python_stem_in_test_name() {
        let idx = index(&["src/billing/invoice.py"]);
        assert!(is_relevant("test_invoice_rounding", &idx, Some("python")));
        assert!(!is_relevant("test_shipping", &idx, Some("python")));
    }

    #[test]
    fn short_stems_do_not_match() {
        let idx = index(&["src/io.py"]);
        assert!(!is_relevant("test_ratio", &idx, Some("python")));
    }

    #[test]
    fn javascript_strips_test_infix() {
        let idx = index(&["web/__tests__/cart.test.js"]);
        assert!(is_relevant("cart adds items", &idx, Some("js")));
    }

    #[test]
    fn php_class_and_namespace() {
        let idx = index(&["src/League/Csv/AbstractCsv.php"]);
        assert!(is_relevant(
            "League\\Csv\\AbstractCsvTest::testStreamFilter",
            &idx,
            Some("php")
        ));
        assert!(is_relevant("League\\Csv\\ReaderTest::testRead", &idx, Some("php")));
        assert!(!is_relevant("Other\\Thing\\WidgetTest::testX", &idx, Some("php")));
    }

    #[test]
    fn ruby_camel_case_maps_to_snake_file() {
        let idx = index(&["lib/liquid/tags/render.rb"]);
        assert!(is_relevant("RenderTagTest#test_render_attribute", &idx, Some("ruby")));
        assert!(!is_relevant("CaptureTest#test_capture", &idx, Some("ruby")));
    }

    #[test]
    fn ruby_synthetic_names_follow_test_changes() {
        assert!(is_relevant("test_12", &index(&["test/unit/foo_test.rb"]), Some("ruby")));
        assert!(!is_relevant("test_12", &index(&["lib/foo.rb"]), Some("ruby")));
    }

    #[test]
    fn generic_language_uses_module_tokens() {
        let idx = index(&["crates/parser/src/lexer.rs"]);
        assert!(is_relevant("parser::tokens::handles_eof", &idx, Some("rust")));
        assert!(is_relevant("lexer::tests::eof", &idx, None));
        assert!(!is_relevant("render::tests::draws", &idx, None));
    }

    #[test]
    fn camel_to_snake_matches_convention() {
        assert_eq!(camel_to_snake("RenderTag"), "render_tag");
        assert_eq!(camel_to_snake("HTTPServer"), "http_server");
        assert_eq!(camel_to_snake("snippet"), "snippet");
    }
}
