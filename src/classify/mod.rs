//! Hunk classification: test, code, mixed, or unknown.
//!
//! Most languages use a stateless weighted score over each hunk. Languages
//! with inline tests use the sequential scan in [`inline`]. A path-level
//! override promotes weak results in conventional test locations.

pub mod inline;
pub mod language;
pub mod registry;

use crate::config::ClassifierConfig;
use crate::{DiffFile, DiffHunk, HunkCategory};
use inline::InlineScanner;
use language::{is_test_path, language_from_path};
use registry::{LanguageProfile, ProfileRegistry};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classification {
    pub category: HunkCategory,
    pub confidence: f64,
}

impl Classification {
    pub const UNKNOWN: Classification = Classification {
        category: HunkCategory::Unknown,
        confidence: 0.0,
    };
}

pub struct Classifier<'a> {
    registry: &'a ProfileRegistry,
    config: &'a ClassifierConfig,
}

impl<'a> Classifier<'a> {
    pub fn new(registry: &'a ProfileRegistry, config: &'a ClassifierConfig) -> Self {
        Self { registry, config }
    }

    /// Normalized test score of a hunk in `[0, 1]`.
    ///
    /// A pattern earns its full weight when it matches the added lines and
    /// half (by default) when it only matches context lines or the header.
    pub fn score(&self, hunk: &DiffHunk, profile: &LanguageProfile) -> f64 {
        let max = profile.max_score();
        if max <= 0.0 {
            return 0.0;
        }
        let added = hunk.added_text();
        let context = hunk.context_text();

        let mut score = 0.0;
        for pattern in &profile.patterns {
            if pattern.regex.is_match(&added) {
                score += pattern.weight;
            } else if pattern.regex.is_match(&context) || pattern.regex.is_match(&hunk.context) {
                score += pattern.weight * self.config.context_weight_factor;
            }
        }
        (score / max).clamp(0.0, 1.0)
    }

    /// Stateless classification of a single hunk.
    pub fn classify(&self, hunk: &DiffHunk, language: &str) -> Classification {
        match self.registry.profile_for(language) {
            Some(profile) if !profile.patterns.is_empty() => self.classify_with(hunk, profile),
            _ => Classification::UNKNOWN,
        }
    }

    fn classify_with(&self, hunk: &DiffHunk, profile: &LanguageProfile) -> Classification {
        let score = self.score(hunk, profile);
        let result = if score >= self.config.test_threshold {
            Classification {
                category: HunkCategory::Test,
                confidence: (score * 2.0).min(1.0),
            }
        } else if score >= self.config.mixed_threshold {
            Classification {
                category: HunkCategory::Mixed,
                confidence: score,
            }
        } else {
            Classification {
                category: HunkCategory::Code,
                confidence: 1.0 - score,
            }
        };
        debug!(
            header = %hunk.header,
            language = %profile.language,
            score,
            category = %result.category,
            confidence = result.confidence,
            "classified hunk"
        );
        result
    }

    /// Classify every hunk of one file in place.
    ///
    /// Without a hint the language is taken from the file extension.
    pub fn classify_file(&self, file: &mut DiffFile, language_hint: Option<&str>) {
        if file.is_binary {
            return;
        }
        let language = language_hint
            .map(str::to_string)
            .or_else(|| language_from_path(file.path()).map(str::to_string));
        let profile = language
            .as_deref()
            .and_then(|l| self.registry.profile_for(l));

        let results: Vec<Classification> = match profile {
            Some(LanguageProfile {
                inline: Some(markers),
                ..
            }) => {
                let mut scanner = InlineScanner::new(markers, self.config);
                file.hunks.iter().map(|h| scanner.step(h)).collect()
            }
            Some(p) if !p.patterns.is_empty() => {
                file.hunks.iter().map(|h| self.classify_with(h, p)).collect()
            }
            _ => vec![Classification::UNKNOWN; file.hunks.len()],
        };

        let test_path = is_test_path(file.path());
        for (hunk, mut result) in file.hunks.iter_mut().zip(results) {
            if test_path && matches!(result.category, HunkCategory::Code | HunkCategory::Unknown) {
                result = Classification {
                    category: HunkCategory::Test,
                    confidence: result.confidence.max(self.config.test_path_floor),
                };
            }
            hunk.category = result.category;
            hunk.confidence = result.confidence;
        }
    }

    /// Classify all files. A hint applies to every file; otherwise each file's
    /// language is detected from its path.
    pub fn classify_all(&self, files: &mut [DiffFile], language_hint: Option<&str>) {
        for file in files.iter_mut() {
            self.classify_file(file, language_hint);
        }
    }
}
