//! Per-run outcome of the scroll driver.

use serde::Serialize;

// ============================================================================
// SectionOutcome
// ============================================================================

/// What happened to one planned section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum SectionOutcome {
    /// The orchestrator acknowledged the capture.
    Captured {
        /// Offset the frame was taken at.
        offset: u32,
    },
    /// The scroll never reached the target, so no capture was requested.
    Skipped {
        /// Offset the page was stuck at.
        reached: u32,
    },
    /// The capture was requested and rejected.
    Failed {
        /// Orchestrator error message.
        error: String,
    },
}

/// One planned section and its outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionReport {
    /// Zero-based section ordinal.
    pub index: u32,
    /// Planned scroll offset.
    pub target: u32,
    /// Outcome.
    #[serde(flatten)]
    pub outcome: SectionOutcome,
}

// ============================================================================
// CaptureReport
// ============================================================================

/// Summary of a finished run, in section order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureReport {
    /// Sections in the plan.
    pub total_sections: u32,
    /// Outcome of every planned section.
    pub sections: Vec<SectionReport>,
}

impl CaptureReport {
    /// Creates an empty report for a plan of `total_sections`.
    #[must_use]
    pub fn new(total_sections: u32) -> Self {
        Self {
            total_sections,
            sections: Vec::with_capacity(total_sections as usize),
        }
    }

    /// Records a section outcome.
    pub fn record(&mut self, index: u32, target: u32, outcome: SectionOutcome) {
        self.sections.push(SectionReport {
            index,
            target,
            outcome,
        });
    }

    /// Indices the orchestrator captured.
    #[must_use]
    pub fn captured(&self) -> Vec<u32> {
        self.indices(|o| matches!(o, SectionOutcome::Captured { .. }))
    }

    /// Indices skipped after a stalled scroll.
    #[must_use]
    pub fn skipped(&self) -> Vec<u32> {
        self.indices(|o| matches!(o, SectionOutcome::Skipped { .. }))
    }

    /// Indices whose capture was rejected.
    #[must_use]
    pub fn failed(&self) -> Vec<u32> {
        self.indices(|o| matches!(o, SectionOutcome::Failed { .. }))
    }

    /// Offset of the last captured section.
    #[must_use]
    pub fn last_captured_offset(&self) -> Option<u32> {
        self.sections.iter().rev().find_map(|s| match s.outcome {
            SectionOutcome::Captured { offset } => Some(offset),
            _ => None,
        })
    }

    /// Returns `true` if every planned section was captured.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.captured().len() == self.total_sections as usize
    }

    fn indices(&self, pick: impl Fn(&SectionOutcome) -> bool) -> Vec<u32> {
        self.sections
            .iter()
            .filter(|s| pick(&s.outcome))
            .map(|s| s.index)
            .collect()
    }
}

// ============================================================================
// Tests
// ============================================================================
