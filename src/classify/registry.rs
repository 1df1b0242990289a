//! Per-language test-construct patterns.
//!
//! A [`ProfileRegistry`] is built once and then only read. New languages are
//! added with [`ProfileRegistry::register`] rather than new branches in the
//! classifier.

use super::language::normalize_language;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("invalid test pattern {pattern:?} for {language}: {source}")]
    InvalidPattern {
        language: String,
        pattern: String,
        #[source]
        source: regex::Error,
    },
    #[error("weight for {pattern:?} ({language}) must be positive, got {weight}")]
    InvalidWeight {
        language: String,
        pattern: String,
        weight: f64,
    },
}

pub type Result<T> = std::result::Result<T, RegistryError>;

/// A test-indicative construct and how strongly it signals test code.
#[derive(Debug, Clone)]
pub struct TestPattern {
    pub regex: Regex,
    pub weight: f64,
}

/// Markers used by the sequential scan for languages with inline tests.
#[derive(Debug, Clone)]
pub struct InlineMarkers {
    /// Matched against the hunk header context (enclosing declaration).
    pub header: Vec<Regex>,
    /// Matched against added and removed lines.
    pub declarations: Vec<Regex>,
}

#[derive(Debug, Clone)]
pub struct LanguageProfile {
    pub language: String,
    pub patterns: Vec<TestPattern>,
    pub inline: Option<InlineMarkers>,
}

impl LanguageProfile {
    /// Sum of all pattern weights; the denominator of the normalized score.
    pub fn max_score(&self) -> f64 {
        self.patterns.iter().map(|p| p.weight).sum()
    }
}

/// A config-supplied weight override or extra pattern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightOverride {
    pub language: String,
    pub pattern: String,
    pub weight: f64,
}

#[derive(Debug, Clone, Default)]
pub struct ProfileRegistry {
    profiles: HashMap<String, LanguageProfile>,
}

impl ProfileRegistry {
    pub fn builtin() -> Self {
        let mut registry = Self::default();
        for (language, table, inline) in BUILTIN_PROFILES {
            registry.register(LanguageProfile {
                language: (*language).to_string(),
                patterns: compile_table(table),
                inline: inline.map(|(header, declarations)| InlineMarkers {
                    header: compile_list(header),
                    declarations: compile_list(declarations),
                }),
            });
        }
        // TypeScript shares the JavaScript profile
        if let Some(js) = registry.profiles.get("javascript").cloned() {
            registry.register(LanguageProfile {
                language: "typescript".to_string(),
                ..js
            });
        }
        registry
    }

    /// Built-in profiles with config overrides applied on top.
    ///
    /// An override whose pattern text matches an existing pattern replaces its
    /// weight; otherwise the pattern is appended to that language's profile,
    /// creating the profile if needed.
    pub fn with_overrides(overrides: &[WeightOverride]) -> Result<Self> {
        let mut registry = Self::builtin();
        for o in overrides {
            let language = normalize_language(&o.language);
            if !(o.weight > 0.0) {
                return Err(RegistryError::InvalidWeight {
                    language,
                    pattern: o.pattern.clone(),
                    weight: o.weight,
                });
            }
            let profile = registry
                .profiles
                .entry(language.clone())
                .or_insert_with(|| LanguageProfile {
                    language: language.clone(),
                    patterns: Vec::new(),
                    inline: None,
                });
            if let Some(existing) = profile
                .patterns
                .iter_mut()
                .find(|p| p.regex.as_str() == o.pattern)
            {
                existing.weight = o.weight;
                continue;
            }
            let regex = Regex::new(&o.pattern).map_err(|source| RegistryError::InvalidPattern {
                language: language.clone(),
                pattern: o.pattern.clone(),
                source,
            })?;
            profile.patterns.push(TestPattern {
                regex,
                weight: o.weight,
            });
        }
        Ok(registry)
    }

    pub fn register(&mut self, profile: LanguageProfile) {
        self.profiles.insert(profile.language.clone(), profile);
    }

    /// Look up the profile for a free-text, case-insensitive language hint.
    pub fn profile_for(&self, language: &str) -> Option<&LanguageProfile> {
        self.profiles
            .get(&normalize_language(language))
            .filter(|p| !p.patterns.is_empty() || p.inline.is_some())
    }
}

fn compile_table(table: &[(&str, f64)]) -> Vec<TestPattern> {
    table
        .iter()
        .map(|(pattern, weight)| TestPattern {
            regex: Regex::new(pattern).expect("built-in test pattern must compile"),
            weight: *weight,
        })
        .collect()
}

fn compile_list(list: &[&str]) -> Vec<Regex> {
    list.iter()
        .map(|p| Regex::new(p).expect("built-in inline marker must compile"))
        .collect()
}

type PatternTable = &'static [(&'static str, f64)];
type InlineTable = Option<(&'static [&'static str], &'static [&'static str])>;

const RUST: PatternTable = &[
    (r"#\[cfg\(test\)\]", 1.0),
    (r"#\[test\]", 0.95),
    (r"#\[tokio::test", 0.95),
    (r"#\[async_std::test\]", 0.95),
    (r"mod\s+tests?\s*\{", 0.9),
    (r"use\s+super::\*;", 0.7),
    (r"assert(_eq|_ne|_matches)?!", 0.6),
    (r"#\[should_panic", 0.9),
    (r"#\[ignore\]", 0.8),
    (r"proptest!", 0.9),
    (r"quickcheck!", 0.9),
];

const RUST_INLINE: InlineTable = Some((
    &[r"(?i)\bmod\s+tests?\b", r"(?i)\bfn\s+test_\w+"],
    &[
        r"#\[test\]",
        r"#\[cfg\(test\)\]",
        r"#\[tokio::test",
        r"#\[async_std::test\]",
        r"mod\s+tests?\s*\{",
    ],
));

const PYTHON: PatternTable = &[
    (r"(?m)^\s*>>>\s", 0.95),
    (r"doctest\.", 0.9),
    (r"def\s+test_\w+", 0.85),
    (r"class\s+Test\w+", 0.85),
    (r"@pytest\.(mark\.)?", 0.9),
    (r"self\.assert\w+", 0.7),
    (r"assert\s+.+", 0.5),
    (r"@unittest\.", 0.85),
    (r"from\s+unittest\s+import", 0.8),
    (r"import\s+pytest", 0.8),
    (r"@mock\.", 0.7),
    (r"@patch", 0.7),
];

const GO: PatternTable = &[
    (r"func\s+Test\w+\s*\(", 0.95),
    (r"func\s+Benchmark\w+\s*\(", 0.9),
    (r"func\s+Example\w*\s*\(", 0.9),
    (r"t\.Run\s*\(", 0.85),
    (r"t\.(Error|Fatal|Skip|Log)", 0.8),
    (r"testing\.T\b", 0.7),
    (r"testing\.B\b", 0.7),
];

const JAVA: PatternTable = &[
    (r"@Test\b", 0.95),
    (r"@Before\b", 0.9),
    (r"@After\b", 0.9),
    (r"@BeforeEach\b", 0.9),
    (r"@AfterEach\b", 0.9),
    (r"@BeforeAll\b", 0.9),
    (r"@AfterAll\b", 0.9),
    (r"@ParameterizedTest\b", 0.95),
    (r"@DisplayName\b", 0.85),
    (r"assertEquals\s*\(", 0.7),
    (r"assertThat\s*\(", 0.7),
    (r"verify\s*\(", 0.6),
    (r"when\s*\(.*\)\.then", 0.6),
];

const KOTLIN: PatternTable = &[
    (r"@Test\b", 0.95),
    (r"@BeforeTest\b", 0.9),
    (r"@AfterTest\b", 0.9),
    (r"assertEquals\s*\(", 0.7),
    (r"assertThat\s*\(", 0.7),
    (r"shouldBe\b", 0.8),
    (r"should\s*\{", 0.8),
];

const JAVASCRIPT: PatternTable = &[
    (r"\bdescribe\s*\(", 0.9),
    (r"\bit\s*\(", 0.85),
    (r"\btest\s*\(", 0.85),
    (r"\bexpect\s*\(", 0.8),
    (r"\bbeforeEach\s*\(", 0.85),
    (r"\bafterEach\s*\(", 0.85),
    (r"\bbeforeAll\s*\(", 0.85),
    (r"\bafterAll\s*\(", 0.85),
    (r"\bjest\.", 0.9),
    (r"\bsinon\.", 0.8),
    (r"\.toEqual\s*\(", 0.8),
    (r"\.toBe\s*\(", 0.8),
];

const RUBY: PatternTable = &[
    (r#"\bdescribe\s+['"]"#, 0.9),
    (r#"\bcontext\s+['"]"#, 0.9),
    (r#"\bit\s+['"]"#, 0.85),
    (r"\bexpect\s*\(", 0.8),
    (r"\bshould\s+", 0.7),
    (r"\bdef\s+test_", 0.9),
    (r"assert_equal\b", 0.8),
    (r"assert_raises\b", 0.8),
    (r"\bbefore\s*\{", 0.8),
    (r"\bafter\s*\{", 0.8),
    (r"\blet\s*\(", 0.7),
];

const ELIXIR: PatternTable = &[
    (r#"\btest\s+""#, 0.95),
    (r"iex>", 0.95),
    (r#"\bdescribe\s+""#, 0.9),
    (r"\bsetup\s+", 0.85),
    (r"\bassert\s+", 0.7),
    (r"\brefute\s+", 0.8),
    (r"@tag\s+", 0.7),
];

const D: PatternTable = &[(r"\bunittest\s*\{", 0.95), (r"\bassert\s*\(", 0.6)];

const D_INLINE: InlineTable = Some((&[r"\bunittest\b"], &[r"\bunittest\s*\{"]));

const PHP: PatternTable = &[
    (r"extends\s+TestCase\b", 0.95),
    (r"function\s+test\w*\s*\(", 0.9),
    (r"@test\b", 0.9),
    (r"@dataProvider\b", 0.85),
    (r"\$this->assert\w+\s*\(", 0.8),
    (r"\$this->expectException\s*\(", 0.8),
    (r"function\s+setUp\s*\(", 0.8),
];

const BUILTIN_PROFILES: &[(&str, PatternTable, InlineTable)] = &[
    ("rust", RUST, RUST_INLINE),
    ("python", PYTHON, None),
    ("go", GO, None),
    ("java", JAVA, None),
    ("kotlin", KOTLIN, None),
    ("javascript", JAVASCRIPT, None),
    ("ruby", RUBY, None),
    ("elixir", ELIXIR, None),
    ("d", D, D_INLINE),
    ("php", PHP, None),
];
