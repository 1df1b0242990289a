//! Language hints and path conventions.

use regex::RegexSet;
use std::sync::LazyLock;

/// Lowercase, trim, and resolve common aliases (`ts` -> `typescript`).
pub fn normalize_language(language: &str) -> String {
    let lang = language.trim().to_lowercase();
    let canonical = match lang.as_str() {
        "js" | "node" | "nodejs" => "javascript",
        "ts" => "typescript",
        "golang" => "go",
        "kt" | "kts" => "kotlin",
        "py" | "python3" => "python",
        "rs" => "rust",
        "rb" => "ruby",
        "ex" | "exs" => "elixir",
        "c++" => "cpp",
        "c#" | "cs" => "csharp",
        _ => return lang,
    };
    canonical.to_string()
}

/// Detect a language from a file extension.
pub fn language_from_path(path: &str) -> Option<&'static str> {
    let ext = path.rsplit_once('.')?.1.to_lowercase();
    // Reject "dir.name/file" where the dot is not in the file name
    if ext.contains('/') {
        return None;
    }
    let language = match ext.as_str() {
        "rs" => "rust",
        "py" => "python",
        "go" => "go",
        "java" => "java",
        "kt" | "kts" => "kotlin",
        "js" | "jsx" | "mjs" | "cjs" => "javascript",
        "ts" | "tsx" | "mts" | "cts" => "typescript",
        "rb" => "ruby",
        "ex" | "exs" => "elixir",
        "d" => "d",
        "scala" => "scala",
        "php" => "php",
        _ => return None,
    };
    Some(language)
}

static TEST_PATHS: LazyLock<RegexSet> = LazyLock::new(|| {
    RegexSet::new([
        // directories
        r"(^|/)src/test(/|$)",
        r"(^|/)tests?(/|$)",
        r"(^|/)spec(/|$)",
        r"(^|/)__tests__(/|$)",
        r"(^|/)testdata(/|$)",
        r"(^|/)test_data(/|$)",
        r"(^|/)fixtures?(/|$)",
        // file names
        r"_test\.[^/]+$",
        r"_spec\.[^/]+$",
        r"\.test\.[^/]+$",
        r"\.spec\.[^/]+$",
        r"(^|/)test_[^/]+\.[^/]+$",
    ])
    .expect("test path patterns must compile")
});

/// Class-name conventions (`FooTest.java`, `TestFoo.php`, `FooSpec.scala`).
/// Matched case-sensitively so `Commit.java` or `Contest.kt` stay production.
static TEST_CLASS_FILES: LazyLock<RegexSet> = LazyLock::new(|| {
    RegexSet::new([
        r"(^|/)[^/]*(Test|Tests|IT|TestCase)\.(java|kt|scala|php|groovy)$",
        r"(^|/)Test[A-Z0-9_][^/]*\.(java|kt|scala|php|groovy)$",
        r"(^|/)[^/]*Spec\.(scala|kt|groovy)$",
    ])
    .expect("test class patterns must compile")
});

/// Whether a path follows a conventional test-directory or test-file shape.
pub fn is_test_path(path: &str) -> bool {
    TEST_PATHS.is_match(&path.to_lowercase()) || TEST_CLASS_FILES.is_match(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_aliases_and_case() {
        assert_eq!(normalize_language(" TypeScript "), "typescript");
        assert_eq!(normalize_language("TS"), "typescript");
        assert_eq!(normalize_language("golang"), "go");
        assert_eq!(normalize_language("Rust"), "rust");
        assert_eq!(normalize_language("zig"), "zig");
    }

    #[test]
    fn detects_language_from_extension() {
        assert_eq!(language_from_path("src/lib.rs"), Some("rust"));
        assert_eq!(language_from_path("web/App.TSX"), Some("typescript"));
        assert_eq!(language_from_path("lib/foo.ex"), Some("elixir"));
        assert_eq!(language_from_path("Makefile"), None);
        assert_eq!(language_from_path("some.dir/Makefile"), None);
    }

    #[test]
    fn recognizes_test_paths() {
        for path in [
            "tests/integration.rs",
            "pkg/server/handler_test.go",
            "src/test/java/com/acme/FooTest.java",
            "web/__tests__/app.js",
            "web/app.spec.ts",
            "python/test_utils.py",
            "spec/models/user_spec.rb",
            "internal/testdata/input.json",
            "core/FooTest.java",
            "core/FooIT.java",
            "lib/TestHelpers.kt",
            "app/CartTest.php",
            "core/UserSpec.scala",
        ] {
            assert!(is_test_path(path), "{path} should be a test path");
        }
    }

    #[test]
    fn production_paths_are_not_test_paths() {
        for path in [
            "src/app.core.ts",
            "src/lib.rs",
            "pkg/server/handler.go",
            "src/main/java/com/acme/Foo.java",
            "contest/entry.py",
            "src/main/java/org/acme/Commit.java",
            "src/main/java/org/acme/Limit.java",
            "src/main/java/org/acme/Latest.java",
            "app/src/main/kotlin/Contest.kt",
            "lib/Manifest.php",
            "src/main/java/org/acme/Testament.java",
        ] {
            assert!(!is_test_path(path), "{path} should not be a test path");
        }
    }
}
