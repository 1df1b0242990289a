//! Sequential scan for languages whose tests live next to the code they test.
//!
//! Hunks are walked in file order. The hunk header context already names the
//! nearest enclosing declaration, so each step only looks at local signals.

use super::Classification;
use super::registry::InlineMarkers;
use crate::config::ClassifierConfig;
use crate::{DiffHunk, HunkCategory};
use tracing::debug;

/// Scan position after a hunk. The state decides the hunk's category and the
/// trigger that produced it decides the confidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    OutsideTest,
    InsideTest,
}

impl ScanState {
    fn after(trigger: Trigger) -> Self {
        match trigger {
            Trigger::HeaderNamesTest | Trigger::AddedMarker => ScanState::InsideTest,
            Trigger::TouchesMarker | Trigger::None => ScanState::OutsideTest,
        }
    }
}

/// What a single hunk contributes to the scan, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// Header context names a test module or test function.
    HeaderNamesTest,
    /// Added lines introduce a test declaration.
    AddedMarker,
    /// Added or removed lines touch test declarations without introducing one.
    TouchesMarker,
    None,
}

pub struct InlineScanner<'a> {
    markers: &'a InlineMarkers,
    config: &'a ClassifierConfig,
    state: ScanState,
}

impl<'a> InlineScanner<'a> {
    pub fn new(markers: &'a InlineMarkers, config: &'a ClassifierConfig) -> Self {
        Self {
            markers,
            config,
            state: ScanState::OutsideTest,
        }
    }

    pub fn trigger(&self, hunk: &DiffHunk) -> Trigger {
        if self.markers.header.iter().any(|r| r.is_match(&hunk.context)) {
            return Trigger::HeaderNamesTest;
        }
        let added = hunk.added_text();
        if self.markers.declarations.iter().any(|r| r.is_match(&added)) {
            return Trigger::AddedMarker;
        }
        let removed = hunk.removed_text();
        if self.markers.declarations.iter().any(|r| r.is_match(&removed)) {
            return Trigger::TouchesMarker;
        }
        Trigger::None
    }

    /// Advance over one hunk and return its classification.
    pub fn step(&mut self, hunk: &DiffHunk) -> Classification {
        let trigger = self.trigger(hunk);
        let next = ScanState::after(trigger);
        if next != self.state {
            debug!(from = ?self.state, to = ?next, ?trigger, context = %hunk.context, "inline scan transition");
        }
        self.state = next;

        let category = match (self.state, trigger) {
            (ScanState::InsideTest, _) => HunkCategory::Test,
            (ScanState::OutsideTest, Trigger::TouchesMarker) => HunkCategory::Mixed,
            (ScanState::OutsideTest, _) => HunkCategory::Code,
        };
        let confidence = match trigger {
            Trigger::HeaderNamesTest => self.config.inline_header_confidence,
            Trigger::AddedMarker => self.config.inline_marker_confidence,
            Trigger::TouchesMarker => self.config.inline_touch_confidence,
            Trigger::None => self.config.inline_code_confidence,
        };
        Classification {
            category,
            confidence,
        }
    }
}
