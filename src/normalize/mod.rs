//! Canonical test identifiers.
//!
//! Test runners often append a duration to each test name, and it differs
//! between runs. Names are normalized before any set operation.

use regex::Regex;
use std::collections::BTreeSet;
use std::sync::LazyLock;

/// Mocha/Pest style: `name   0.01s`
static SECONDS_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+\d+\.\d+s$").expect("valid regex"));

/// Jest style: `name (12ms)` or `name (1.2s)`
static PAREN_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*\(\d+(?:\.\d+)?\s*m?s\)$").expect("valid regex"));

static INNER_SPACES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s{2,}").expect("valid regex"));

/// Strip trailing duration suffixes, collapse runs of whitespace, and trim.
///
/// Suffixes are stripped until none remain, so
/// `normalize_test_name(normalize_test_name(x)) == normalize_test_name(x)`.
pub fn normalize_test_name(name: &str) -> String {
    let mut current = name.trim_end();
    loop {
        let stripped = strip_suffix(&SECONDS_SUFFIX, current);
        let stripped = strip_suffix(&PAREN_SUFFIX, stripped).trim_end();
        if stripped.len() == current.len() {
            break;
        }
        current = stripped;
    }
    INNER_SPACES.replace_all(current, " ").trim().to_string()
}

fn strip_suffix<'a>(pattern: &Regex, s: &'a str) -> &'a str {
    match pattern.find(s) {
        Some(m) => &s[..m.start()],
        None => s,
    }
}

/// Normalize a collection of names into a de-duplicated, ordered set.
pub fn normalize_test_set<'a, I>(names: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = &'a String>,
{
    names
        .into_iter()
        .map(|n| normalize_test_name(n))
        .filter(|n| !n.is_empty())
        .collect()
}
