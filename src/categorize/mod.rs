//! FAIL_TO_PASS / PASS_TO_PASS derivation from up to three test runs.
//!
//! Runs are expected to be resolved [`OutcomeSet`]s, so every name is already
//! normalized and carries exactly one outcome per run.

pub mod relevance;

use crate::index::ChangedFileIndex;
use crate::report::{Outcome, OutcomeSet};
use serde::Serialize;
use std::collections::BTreeSet;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunMode {
    /// Baseline, test-only and full runs.
    ThreeRun,
    /// No test-only run; F2P falls back to baseline comparison.
    TwoRun,
}

/// The runs of one evaluation.
#[derive(Debug, Clone, Copy)]
pub struct Runs<'a> {
    pub baseline: &'a OutcomeSet,
    pub test_only: Option<&'a OutcomeSet>,
    pub full: &'a OutcomeSet,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CategorizationCounts {
    pub fail_to_pass: usize,
    pub pass_to_pass: usize,
    /// P2P candidates before relevance filtering.
    pub pass_to_pass_candidates: usize,
    pub regressions: usize,
    /// Two-run F2P entries that failed in the baseline.
    pub fixed: usize,
    /// Two-run F2P entries that were skipped in or absent from the baseline.
    pub new: usize,
    pub suspicious_new_passes: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Categorization {
    pub mode: RunMode,
    #[serde(rename = "FAIL_TO_PASS")]
    pub fail_to_pass: BTreeSet<String>,
    #[serde(rename = "PASS_TO_PASS")]
    pub pass_to_pass: BTreeSet<String>,
    /// Passed in the baseline, failed in the full run. Never in F2P or P2P.
    #[serde(rename = "REGRESSIONS")]
    pub regressions: BTreeSet<String>,
    /// Tests that pass with only the test changes applied and neither
    /// passed nor failed in the baseline.
    pub suspicious_new_passes: BTreeSet<String>,
    /// False when P2P was left unfiltered for lack of a change index.
    pub relevance_filtered: bool,
    pub counts: CategorizationCounts,
}

/// Derive the F2P and P2P sets.
///
/// With a test-only run, F2P is every test that fails there and passes in
/// the full run. Without one, F2P is every full-run pass that did not pass
/// in the baseline: it failed there, was skipped, or was absent.
///
/// P2P is `(baseline.passed ∩ full.passed) − F2P`, kept only when relevant to
/// `index`. Without an index every candidate is kept.
pub fn categorize(
    runs: Runs<'_>,
    index: Option<&ChangedFileIndex>,
    language: Option<&str>,
) -> Categorization {
    let Runs {
        baseline,
        test_only,
        full,
    } = runs;
    let mut counts = CategorizationCounts::default();

    let (mode, fail_to_pass) = match test_only {
        Some(test_only) => (
            RunMode::ThreeRun,
            full.passed
                .intersection(&test_only.failed)
                .cloned()
                .collect::<BTreeSet<_>>(),
        ),
        None => {
            warn!("no test-only run, falling back to two-run FAIL_TO_PASS");
            let mut f2p = BTreeSet::new();
            for name in &full.passed {
                match baseline.outcome_of(name) {
                    Some(Outcome::Passed) => continue,
                    Some(Outcome::Failed) => counts.fixed += 1,
                    // Skipped or absent in the baseline both count as new.
                    Some(Outcome::Skipped) | None => counts.new += 1,
                }
                f2p.insert(name.clone());
            }
            (RunMode::TwoRun, f2p)
        }
    };

    let candidates: BTreeSet<String> = baseline
        .passed
        .intersection(&full.passed)
        .filter(|name| !fail_to_pass.contains(*name))
        .cloned()
        .collect();
    counts.pass_to_pass_candidates = candidates.len();

    let (pass_to_pass, relevance_filtered) = match index {
        Some(index) if !index.is_empty() => (
            candidates
                .into_iter()
                .filter(|name| relevance::is_relevant(name, index, language))
                .collect(),
            true,
        ),
        _ => {
            warn!(
                candidates = counts.pass_to_pass_candidates,
                "no change index, keeping all PASS_TO_PASS candidates (reduced precision)"
            );
            (candidates, false)
        }
    };

    let regressions: BTreeSet<String> = baseline.passed.intersection(&full.failed).cloned().collect();
    if !regressions.is_empty() {
        warn!(count = regressions.len(), tests = ?regressions, "tests regressed in full run");
    }

    let suspicious_new_passes: BTreeSet<String> = test_only
        .map(|t| {
            t.passed
                .iter()
                .filter(|name| {
                    !baseline.passed.contains(*name) && !baseline.failed.contains(*name)
                })
                .cloned()
                .collect()
        })
        .unwrap_or_default();
    if !suspicious_new_passes.is_empty() {
        warn!(
            count = suspicious_new_passes.len(),
            tests = ?suspicious_new_passes,
            "new tests already pass without the code change"
        );
    }

    counts.fail_to_pass = fail_to_pass.len();
    counts.pass_to_pass = pass_to_pass.len();
    counts.regressions = regressions.len();
    counts.suspicious_new_passes = suspicious_new_passes.len();
    info!(
        ?mode,
        f2p = counts.fail_to_pass,
        p2p = counts.pass_to_pass,
        p2p_candidates = counts.pass_to_pass_candidates,
        regressions = counts.regressions,
        "categorized test runs"
    );

    Categorization {
        mode,
        fail_to_pass,
        pass_to_pass,
        regressions,
        suspicious_new_passes,
        relevance_filtered,
        counts,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::RunReport;

    const PRIORITY: [Outcome; 3] = [Outcome::Passed, Outcome::Failed, Outcome::Skipped];

    fn run(passed: &[&str], failed: &[&str]) -> OutcomeSet {
        RunReport {
            passed: passed.iter().map(|s| s.to_string()).collect(),
            failed: failed.iter().map(|s| s.to_string()).collect(),
            ..RunReport::default()
        }
        .resolve(&PRIORITY)
    }

    fn names(set: &BTreeSet<String>) -> Vec<&str> {
        set.iter().map(String::as_str).collect()
    }

    #[test]
    fn three_run_requires_failure_with_tests_only() {
        let baseline = run(&["a"], &["b"]);
        let test_only = run(&[], &["b", "c"]);
        let full = run(&["a", "b", "c"], &[]);

        let result = categorize(
            Runs {
                baseline: &baseline,
                test_only: Some(&test_only),
                full: &full,
            },
            None,
            None,
        );
        assert_eq!(result.mode, RunMode::ThreeRun);
        assert_eq!(names(&result.fail_to_pass), vec!["b", "c"]);
        assert_eq!(names(&result.pass_to_pass), vec!["a"]);
        assert!(!result.relevance_filtered);
    }

    #[test]
    fn three_run_ignores_full_passes_that_never_failed() {
        let baseline = run(&[], &[]);
        let test_only = run(&["new_ok"], &["fixed"]);
        let full = run(&["new_ok", "fixed"], &[]);

        let result = categorize(
            Runs {
                baseline: &baseline,
                test_only: Some(&test_only),
                full: &full,
            },
            None,
            None,
        );
        assert_eq!(names(&result.fail_to_pass), vec!["fixed"]);
        assert_eq!(names(&result.suspicious_new_passes), vec!["new_ok"]);
        assert!(result.pass_to_pass.is_empty());
    }

    #[test]
    fn two_run_takes_fixed_and_new_tests() {
        let baseline = run(&["stable", "flip"], &["broken", "flip"]);
        let full = run(&["stable", "broken", "brand_new", "flip"], &[]);

        let result = categorize(
            Runs {
                baseline: &baseline,
                test_only: None,
                full: &full,
            },
            None,
            None,
        );
        assert_eq!(result.mode, RunMode::TwoRun);
        // flip resolves to passed in the baseline, so it is P2P
        assert_eq!(names(&result.fail_to_pass), vec!["brand_new", "broken"]);
        assert_eq!(names(&result.pass_to_pass), vec!["flip", "stable"]);
        assert_eq!(result.counts.fixed, 1);
        assert_eq!(result.counts.new, 1);
    }

    #[test]
    fn two_run_counts_baseline_skipped_as_new() {
        let baseline = RunReport {
            skipped: vec!["t".into()],
            ..RunReport::default()
        }
        .resolve(&PRIORITY);
        let full = run(&["t"], &[]);

        let result = categorize(
            Runs {
                baseline: &baseline,
                test_only: None,
                full: &full,
            },
            None,
            None,
        );
        assert_eq!(names(&result.fail_to_pass), vec!["t"]);
        assert!(result.pass_to_pass.is_empty());
        assert_eq!(result.counts.new, 1);
    }

    #[test]
    fn baseline_skipped_test_passing_with_tests_only_is_suspicious() {
        let baseline = RunReport {
            skipped: vec!["s".into()],
            ..RunReport::default()
        }
        .resolve(&PRIORITY);
        let test_only = run(&["s"], &[]);
        let full = run(&["s"], &[]);

        let result = categorize(
            Runs {
                baseline: &baseline,
                test_only: Some(&test_only),
                full: &full,
            },
            None,
            None,
        );
        assert_eq!(names(&result.suspicious_new_passes), vec!["s"]);
        assert!(result.fail_to_pass.is_empty());
    }

    #[test]
    fn regressions_are_reported_separately() {
        let baseline = run(&["a", "b"], &[]);
        let full = run(&["a"], &["b"]);

        let result = categorize(
            Runs {
                baseline: &baseline,
                test_only: None,
                full: &full,
            },
            None,
            None,
        );
        assert_eq!(names(&result.regressions), vec!["b"]);
        assert!(!result.fail_to_pass.contains("b"));
        assert!(!result.pass_to_pass.contains("b"));
        assert_eq!(result.counts.regressions, 1);
    }

    #[test]
    fn index_filters_pass_to_pass() {
        let baseline = run(&["test_invoice_total", "test_shipping_rate"], &[]);
        let full = run(&["test_invoice_total", "test_shipping_rate"], &[]);
        let index = ChangedFileIndex::from_paths(["src/billing/invoice.py"]);

        let result = categorize(
            Runs {
                baseline: &baseline,
                test_only: None,
                full: &full,
            },
            Some(&index),
            Some("python"),
        );
        assert!(result.relevance_filtered);
        assert_eq!(names(&result.pass_to_pass), vec!["test_invoice_total"]);
        assert_eq!(result.counts.pass_to_pass_candidates, 2);
    }

    #[test]
    fn empty_index_keeps_all_candidates() {
        let baseline = run(&["x", "y"], &[]);
        let full = run(&["x", "y"], &[]);
        let index = ChangedFileIndex::default();

        let result = categorize(
            Runs {
                baseline: &baseline,
                test_only: None,
                full: &full,
            },
            Some(&index),
            None,
        );
        assert!(!result.relevance_filtered);
        assert_eq!(result.pass_to_pass.len(), 2);
    }

    #[test]
    fn timing_suffixes_do_not_split_tests() {
        let baseline = run(&["foo bar (12ms)"], &[]);
        let full = run(&["foo bar"], &[]);

        let result = categorize(
            Runs {
                baseline: &baseline,
                test_only: None,
                full: &full,
            },
            None,
            None,
        );
        assert!(result.fail_to_pass.is_empty());
        assert_eq!(names(&result.pass_to_pass), vec!["foo bar"]);
    }

    #[test]
    fn serializes_with_upper_case_keys() {
        let baseline = run(&["a"], &[]);
        let full = run(&["a", "b"], &[]);
        let result = categorize(
            Runs {
                baseline: &baseline,
                test_only: None,
                full: &full,
            },
            None,
            None,
        );
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["FAIL_TO_PASS"], serde_json::json!(["b"]));
        assert_eq!(json["PASS_TO_PASS"], serde_json::json!(["a"]));
        assert_eq!(json["mode"], "two_run");
        assert_eq!(json["counts"]["fail_to_pass"], 1);
    }
}
