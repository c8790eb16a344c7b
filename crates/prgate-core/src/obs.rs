//! Structured observability hooks for evaluation runs.
//!
//! - [`run_span`] is the run-scoped span every log line of a run carries,
//!   tagged with the run id and pull request.
//! - `emit_*` functions log the run lifecycle as structured events.
//!
//! Filtering is controlled by `PRGATE_LOG` / `RUST_LOG` (see
//! [`init_tracing`](crate::telemetry::init_tracing)).

use tracing::{info, warn};

use crate::collaborator::PullRequestId;
use crate::error::CollaboratorError;
use crate::result::{ActionTaken, AutomaticOutcome, ManualOutcome};

/// The span every run is evaluated in.
pub fn run_span(run_id: &str, pull_request: &PullRequestId) -> tracing::Span {
    tracing::info_span!("prgate.run", run_id = %run_id, pull_request = %pull_request)
}

pub fn emit_run_started(pull_request: &PullRequestId, automatic: usize, manual: usize) {
    info!(
        event = "run.started",
        pull_request = %pull_request,
        automatic = automatic,
        manual = manual,
    );
}

pub fn emit_automatic_evaluated(description: &str, outcome: &AutomaticOutcome) {
    match outcome {
        AutomaticOutcome::Indeterminate { reason } => warn!(
            event = "check.indeterminate",
            kind = "automatic",
            description = %description,
            reason = %reason,
        ),
        other => info!(
            event = "check.evaluated",
            kind = "automatic",
            description = %description,
            outcome = ?other,
        ),
    }
}

pub fn emit_manual_evaluated(description: &str, outcome: &ManualOutcome) {
    match outcome {
        ManualOutcome::Indeterminate { reason } => warn!(
            event = "check.indeterminate",
            kind = "manual",
            description = %description,
            reason = %reason,
        ),
        ManualOutcome::Pending { teams } => info!(
            event = "check.evaluated",
            kind = "manual",
            description = %description,
            teams = ?teams,
        ),
        ManualOutcome::NotApplicable => info!(
            event = "check.evaluated",
            kind = "manual",
            description = %description,
            outcome = "not_applicable",
        ),
    }
}

pub fn emit_collaborator_error(description: &str, err: &CollaboratorError) {
    warn!(
        event = "collaborator.error",
        description = %description,
        operation = %err.operation,
        cause = %err.cause,
    );
}

pub fn emit_action_taken(pull_request: &PullRequestId, action: &ActionTaken) {
    info!(event = "action.taken", pull_request = %pull_request, action = ?action);
}

pub fn emit_run_finished(
    pull_request: &PullRequestId,
    duration_ms: u64,
    compliant: bool,
    cancelled: bool,
) {
    info!(
        event = "run.finished",
        pull_request = %pull_request,
        duration_ms = duration_ms,
        compliant = compliant,
        cancelled = cancelled,
    );
}
