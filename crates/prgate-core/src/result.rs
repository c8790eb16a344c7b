//! Evaluation results.
//!
//! Every declared check appears in the result exactly once, in declaration
//! order, with an explicit outcome. "Did not apply" and "could not be
//! determined" are separate states from pass and fail.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::collaborator::PullRequestId;

/// Outcome of one automatic check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AutomaticOutcome {
    /// Condition was false; the requirement never ran.
    NotApplicable,
    Passed,
    Failed,
    /// Condition or requirement could not be evaluated.
    Indeterminate { reason: String },
}

/// Outcome of one manual check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ManualOutcome {
    NotApplicable,
    /// Review obligation assigned to these teams.
    Pending { teams: Vec<String> },
    Indeterminate { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutomaticCheckResult {
    pub description: String,
    pub outcome: AutomaticOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManualCheckResult {
    /// External key for tracking the obligation across runs.
    pub description: String,
    pub outcome: ManualOutcome,
}

/// Side effect initiated during a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActionTaken {
    LabelApplied { label: String },
    BranchUpdateRequested,
}

/// Everything one run decided about one pull request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub run_id: Uuid,
    pub pull_request: PullRequestId,
    pub evaluated_at: DateTime<Utc>,
    pub automatic: Vec<AutomaticCheckResult>,
    pub manual: Vec<ManualCheckResult>,
    pub actions: Vec<ActionTaken>,
    /// The run was cancelled while in flight.
    pub cancelled: bool,
}

impl EvaluationResult {
    pub fn passed(&self) -> impl Iterator<Item = &AutomaticCheckResult> {
        self.automatic
            .iter()
            .filter(|r| r.outcome == AutomaticOutcome::Passed)
    }

    pub fn failed(&self) -> impl Iterator<Item = &AutomaticCheckResult> {
        self.automatic
            .iter()
            .filter(|r| r.outcome == AutomaticOutcome::Failed)
    }

    /// Automatic checks whose outcome is unknown.
    pub fn indeterminate(&self) -> impl Iterator<Item = &AutomaticCheckResult> {
        self.automatic
            .iter()
            .filter(|r| matches!(r.outcome, AutomaticOutcome::Indeterminate { .. }))
    }

    /// Manual checks that matched, with their assigned teams.
    pub fn pending_reviews(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.manual.iter().filter_map(|r| match &r.outcome {
            ManualOutcome::Pending { teams } => Some((r.description.as_str(), teams.as_slice())),
            _ => None,
        })
    }

    /// True when every applicable automatic check passed.
    ///
    /// An indeterminate check makes the pull request non-compliant.
    pub fn is_compliant(&self) -> bool {
        self.automatic.iter().all(|r| {
            matches!(
                r.outcome,
                AutomaticOutcome::Passed | AutomaticOutcome::NotApplicable
            )
        })
    }

    pub fn automatic_outcome(&self, description: &str) -> Option<&AutomaticOutcome> {
        self.automatic
            .iter()
            .find(|r| r.description == description)
            .map(|r| &r.outcome)
    }

    pub fn manual_outcome(&self, description: &str) -> Option<&ManualOutcome> {
        self.manual
            .iter()
            .find(|r| r.description == description)
            .map(|r| &r.outcome)
    }
}
