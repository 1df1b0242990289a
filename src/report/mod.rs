use crate::normalize::normalize_test_name;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("failed to read report {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid report JSON: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ReportError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Passed,
    Failed,
    Skipped,
}

/// One test run as produced by an external runner and result parser.
///
/// Accepts both `passed` and `tests_passed` style keys; missing or null
/// lists are empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    #[serde(default, alias = "tests_passed", deserialize_with = "null_as_default")]
    pub passed: Vec<String>,
    #[serde(default, alias = "tests_failed", deserialize_with = "null_as_default")]
    pub failed: Vec<String>,
    #[serde(default, alias = "tests_skipped", deserialize_with = "null_as_default")]
    pub skipped: Vec<String>,
    #[serde(default)]
    pub exit_code: Option<i32>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub success: bool,
}

fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl RunReport {
    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ReportError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&content)
    }

    /// Normalize names and give every test exactly one outcome.
    ///
    /// A name reported with several outcomes in the same run (for example by
    /// different modules of a multi-module build) keeps the one ranked first
    /// in `priority`.
    pub fn resolve(&self, priority: &[Outcome]) -> OutcomeSet {
        let rank = |o: Outcome| priority.iter().position(|p| *p == o).unwrap_or(usize::MAX);
        let mut seen: BTreeMap<String, BTreeSet<Outcome>> = BTreeMap::new();
        for (outcome, names) in [
            (Outcome::Passed, &self.passed),
            (Outcome::Failed, &self.failed),
            (Outcome::Skipped, &self.skipped),
        ] {
            for raw in names {
                let name = normalize_test_name(raw);
                if !name.is_empty() {
                    seen.entry(name).or_default().insert(outcome);
                }
            }
        }

        let mut set = OutcomeSet {
            exit_code: self.exit_code,
            success: self.success,
            ..OutcomeSet::default()
        };
        for (name, outcomes) in seen {
            let Some(winner) = outcomes.iter().copied().min_by_key(|o| rank(*o)) else {
                continue;
            };
            if outcomes.len() > 1 {
                info!(test = %name, ?outcomes, chosen = ?winner, "conflicting outcomes within one run");
                set.conflicts += 1;
            }
            set.bucket_mut(winner).insert(name);
        }
        set
    }
}

/// A run after normalization and conflict resolution. The three sets are disjoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OutcomeSet {
    pub passed: BTreeSet<String>,
    pub failed: BTreeSet<String>,
    pub skipped: BTreeSet<String>,
    pub exit_code: Option<i32>,
    pub success: bool,
    /// Number of names that had more than one outcome before resolution.
    pub conflicts: usize,
}

impl OutcomeSet {
    fn bucket_mut(&mut self, outcome: Outcome) -> &mut BTreeSet<String> {
        match outcome {
            Outcome::Passed => &mut self.passed,
            Outcome::Failed => &mut self.failed,
            Outcome::Skipped => &mut self.skipped,
        }
    }

    pub fn outcome_of(&self, name: &str) -> Option<Outcome> {
        if self.passed.contains(name) {
            Some(Outcome::Passed)
        } else if self.failed.contains(name) {
            Some(Outcome::Failed)
        } else if self.skipped.contains(name) {
            Some(Outcome::Skipped)
        } else {
            None
        }
    }

    pub fn total(&self) -> usize {
        self.passed.len() + self.failed.len() + self.skipped.len()
    }
}
