//! Shared core types used across provisioning steps.

use serde::Serialize;

/// Result of applying one idempotent step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "lowercase")]
pub enum StepOutcome {
    /// The host was modified.
    Changed,
    /// The desired state already held; nothing was written.
    Unchanged,
    /// The step did not run, with a reason for the operator.
    Skipped { reason: String },
}

impl StepOutcome {
    pub fn changed(changed: bool) -> Self {
        if changed {
            Self::Changed
        } else {
            Self::Unchanged
        }
    }

    pub fn is_changed(&self) -> bool {
        matches!(self, Self::Changed)
    }

    /// Combine two outcomes of sub-steps: any change wins.
    pub fn merge(self, other: StepOutcome) -> StepOutcome {
        match (self, other) {
            (Self::Changed, _) | (_, Self::Changed) => Self::Changed,
            (Self::Skipped { reason }, _) | (_, Self::Skipped { reason }) => {
                Self::Skipped { reason }
            }
            _ => Self::Unchanged,
        }
    }

    /// Status marker used in the operator summary.
    pub fn marker(&self) -> &'static str {
        match self {
            Self::Changed => "✓",
            Self::Unchanged => "•",
            Self::Skipped { .. } => "⚠",
        }
    }
}
