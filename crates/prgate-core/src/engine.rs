//! Rule engine: evaluates a [`RuleSet`] against one pull request.
//!
//! Per run:
//! 1. every automatic check evaluates its condition and, when it matches,
//!    its requirement;
//! 2. every manual check evaluates its condition and, when it matches,
//!    records its teams as a pending review obligation;
//! 3. outcomes are collected back into declaration order.
//!
//! Checks are independent, so they run as concurrent tasks bounded by
//! [`EngineConfig::max_concurrent`]. A collaborator failure is contained in
//! the check that hit it and shows up as `Indeterminate`.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{warn, Instrument};
use uuid::Uuid;

use crate::cancel::CancelSignal;
use crate::collaborator::{Collaborator, PullRequestId};
use crate::config::EngineConfig;
use crate::context::{ActionGate, EnforcementContext, EvaluationContext};
use crate::error::EvalError;
use crate::obs;
use crate::result::{
    AutomaticCheckResult, AutomaticOutcome, EvaluationResult, ManualCheckResult, ManualOutcome,
};
use crate::rules::{AutomaticCheck, ManualCheck, RuleSet};

const WORKER_LOST: &str = "evaluation task did not complete";

/// Evaluates a fixed rule set, one pull request per call.
#[derive(Debug, Clone)]
pub struct RuleEngine {
    rules: Arc<RuleSet>,
    config: EngineConfig,
}

enum Slot {
    Automatic(usize, AutomaticOutcome),
    Manual(usize, ManualOutcome),
}

impl RuleEngine {
    pub fn new(rules: RuleSet, config: EngineConfig) -> Self {
        Self {
            rules: Arc::new(rules),
            config,
        }
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Evaluate every check against `pull_request`.
    pub async fn evaluate<C>(&self, pull_request: PullRequestId, collaborator: Arc<C>) -> EvaluationResult
    where
        C: Collaborator + 'static,
    {
        self.evaluate_with_cancel(pull_request, collaborator, CancelSignal::never())
            .await
    }

    /// Like [`evaluate`](Self::evaluate), but stops initiating side effects
    /// once `cancel` fires. Checks already running are left to finish.
    pub async fn evaluate_with_cancel<C>(
        &self,
        pull_request: PullRequestId,
        collaborator: Arc<C>,
        cancel: CancelSignal,
    ) -> EvaluationResult
    where
        C: Collaborator + 'static,
    {
        let run_id = Uuid::new_v4();
        let span = obs::run_span(&run_id.to_string(), &pull_request);
        self.run(run_id, pull_request, collaborator, cancel)
            .instrument(span)
            .await
    }

    async fn run<C>(
        &self,
        run_id: Uuid,
        pull_request: PullRequestId,
        collaborator: Arc<C>,
        cancel: CancelSignal,
    ) -> EvaluationResult
    where
        C: Collaborator + 'static,
    {
        let start = Instant::now();
        let automatic_count = self.rules.automatic().len();
        let manual_count = self.rules.manual().len();
        obs::emit_run_started(&pull_request, automatic_count, manual_count);

        let facts = EvaluationContext::new(pull_request.clone(), collaborator.clone());
        let gate = ActionGate::new(pull_request.clone(), collaborator);
        let enforcement = EnforcementContext::new(facts.clone(), gate.clone(), cancel.clone())
            .with_update_remediation(self.config.update_remediation);

        let sem = Arc::new(Semaphore::new(self.config.max_concurrent.max(1)));
        let mut join_set = JoinSet::new();

        for idx in 0..automatic_count {
            let rules = Arc::clone(&self.rules);
            let ctx = enforcement.clone();
            let sem = Arc::clone(&sem);
            join_set.spawn(
                async move {
                    let _permit = sem.acquire_owned().await.ok();
                    let outcome = evaluate_automatic(&rules.automatic()[idx], &ctx).await;
                    Slot::Automatic(idx, outcome)
                }
                .in_current_span(),
            );
        }

        for idx in 0..manual_count {
            let rules = Arc::clone(&self.rules);
            let ctx = facts.clone();
            let sem = Arc::clone(&sem);
            join_set.spawn(
                async move {
                    let _permit = sem.acquire_owned().await.ok();
                    let outcome = evaluate_manual(&rules.manual()[idx], &ctx).await;
                    Slot::Manual(idx, outcome)
                }
                .in_current_span(),
            );
        }

        let mut automatic = vec![
            AutomaticOutcome::Indeterminate {
                reason: WORKER_LOST.to_string(),
            };
            automatic_count
        ];
        let mut manual = vec![
            ManualOutcome::Indeterminate {
                reason: WORKER_LOST.to_string(),
            };
            manual_count
        ];

        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok(Slot::Automatic(idx, outcome)) => automatic[idx] = outcome,
                Ok(Slot::Manual(idx, outcome)) => manual[idx] = outcome,
                Err(e) => warn!(error = %e, "check task failed to join"),
            }
        }

        let result = EvaluationResult {
            run_id,
            pull_request,
            evaluated_at: Utc::now(),
            automatic: self
                .rules
                .automatic()
                .iter()
                .zip(automatic)
                .map(|(check, outcome)| AutomaticCheckResult {
                    description: check.description.clone(),
                    outcome,
                })
                .collect(),
            manual: self
                .rules
                .manual()
                .iter()
                .zip(manual)
                .map(|(check, outcome)| ManualCheckResult {
                    description: check.description.clone(),
                    outcome,
                })
                .collect(),
            actions: gate.taken().await,
            cancelled: cancel.is_cancelled(),
        };

        obs::emit_run_finished(
            &result.pull_request,
            start.elapsed().as_millis() as u64,
            result.is_compliant(),
            result.cancelled,
        );
        result
    }
}

async fn evaluate_automatic(check: &AutomaticCheck, ctx: &EnforcementContext) -> AutomaticOutcome {
    let outcome = match check.condition.evaluate(ctx.facts()).await {
        Ok(false) => AutomaticOutcome::NotApplicable,
        Ok(true) => match check.requirement.evaluate(ctx).await {
            Ok(true) => AutomaticOutcome::Passed,
            Ok(false) => AutomaticOutcome::Failed,
            Err(err) => AutomaticOutcome::Indeterminate {
                reason: reason(&check.description, &err),
            },
        },
        Err(err) => AutomaticOutcome::Indeterminate {
            reason: reason(&check.description, &err),
        },
    };
    obs::emit_automatic_evaluated(&check.description, &outcome);
    outcome
}

async fn evaluate_manual(check: &ManualCheck, ctx: &EvaluationContext) -> ManualOutcome {
    let outcome = match check.condition.evaluate(ctx).await {
        Ok(true) => ManualOutcome::Pending {
            teams: check.teams.clone(),
        },
        Ok(false) => ManualOutcome::NotApplicable,
        Err(err) => ManualOutcome::Indeterminate {
            reason: reason(&check.description, &err),
        },
    };
    obs::emit_manual_evaluated(&check.description, &outcome);
    outcome
}

fn reason(description: &str, err: &EvalError) -> String {
    match err {
        EvalError::Cancelled => "cancelled".to_string(),
        EvalError::Collaborator(e) => {
            obs::emit_collaborator_error(description, e);
            e.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::condition as c;
    use crate::requirement as r;
    use crate::snapshot::{Operation, PullRequestSnapshot, SnapshotClient};

    fn engine(automatic: Vec<AutomaticCheck>, manual: Vec<ManualCheck>) -> RuleEngine {
        RuleEngine::new(RuleSet::new(automatic, manual).unwrap(), EngineConfig::default())
    }

    fn client(snapshot: PullRequestSnapshot) -> Arc<SnapshotClient> {
        Arc::new(SnapshotClient::new(snapshot.with_id("acme/repo", 42)))
    }

    #[tokio::test]
    async fn false_condition_is_not_applicable_and_never_enforces() {
        let engine = engine(
            vec![AutomaticCheck::new(
                "label on demo branch",
                c::head_branch("demo-pr"),
                r::label("bug"),
            )],
            vec![],
        );
        let client = client(PullRequestSnapshot::new("main", "feature"));

        let result = engine.evaluate(PullRequestId::new("acme/repo", 42), client.clone()).await;
        assert_eq!(result.automatic[0].outcome, AutomaticOutcome::NotApplicable);
        assert_eq!(client.calls(Operation::Labels), 0);
        assert_eq!(client.calls(Operation::ApplyLabel), 0);
        assert!(result.actions.is_empty());
    }

    #[tokio::test]
    async fn manual_check_records_teams() {
        let engine = engine(
            vec![],
            vec![
                ManualCheck::new("docs", c::file_changed(r".*\.md").unwrap(), ["tech-staff", "devrels"]),
                ManualCheck::new("infra", c::file_changed("misc/deployments").unwrap(), ["tech-staff"]),
            ],
        );
        let client = client(PullRequestSnapshot::new("main", "x").with_files(["README.md"]));

        let result = engine.evaluate(PullRequestId::new("acme/repo", 42), client).await;
        assert_eq!(
            result.manual[0].outcome,
            ManualOutcome::Pending {
                teams: vec!["tech-staff".into(), "devrels".into()]
            }
        );
        assert_eq!(result.manual[1].outcome, ManualOutcome::NotApplicable);
    }

    #[tokio::test]
    async fn cancelled_reason_is_reported() {
        let engine = engine(
            vec![AutomaticCheck::new("label", c::always(), r::label("bug"))],
            vec![],
        );
        let client = client(PullRequestSnapshot::new("main", "x"));
        let (handle, signal) = crate::cancel::cancellation();
        handle.cancel();

        let result = engine
            .evaluate_with_cancel(PullRequestId::new("acme/repo", 42), client.clone(), signal)
            .await;
        assert!(result.cancelled);
        assert_eq!(
            result.automatic[0].outcome,
            AutomaticOutcome::Indeterminate {
                reason: "cancelled".into()
            }
        );
        assert_eq!(client.calls(Operation::ApplyLabel), 0);
    }
}
