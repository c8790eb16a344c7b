//! Per-run evaluation contexts.
//!
//! [`EvaluationContext`] is the read-only view conditions see. Requirements
//! get an [`EnforcementContext`], which adds the serialized action gate and
//! the run's cancellation signal. Both are cheap to clone and shared by every
//! worker of one run.

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::{Arc, PoisonError};

use tokio::sync::{Mutex, OnceCell};

use crate::cancel::CancelSignal;
use crate::collaborator::{
    AuthorSource, BranchSource, ChangedFileSource, Collaborator, GitRef, LabelSource,
    MergeStateSource, PullRequestActions, PullRequestId, ReviewSource,
};
use crate::error::{CollaboratorResult, EvalResult};
use crate::obs;
use crate::result::ActionTaken;

// ---------------------------------------------------------------------------
// EvaluationContext
// ---------------------------------------------------------------------------

/// Read-only view of one pull request.
///
/// Each fact is fetched on first use and then pinned for the rest of the
/// run, so every check sees the pull request as it was before any action of
/// this run. Failed fetches are not pinned.
#[derive(Clone)]
pub struct EvaluationContext {
    inner: Arc<FactSheet>,
}

struct FactSheet {
    pull_request: PullRequestId,
    branches: Arc<dyn BranchSource>,
    files: Arc<dyn ChangedFileSource>,
    labels: Arc<dyn LabelSource>,
    author: Arc<dyn AuthorSource>,
    reviews: Arc<dyn ReviewSource>,
    merge_state: Arc<dyn MergeStateSource>,
    cache: FactCache,
}

#[derive(Default)]
struct FactCache {
    base_branch: OnceCell<String>,
    head_branch: OnceCell<String>,
    changed_files: OnceCell<Vec<String>>,
    labels: OnceCell<BTreeSet<String>>,
    author: OnceCell<String>,
    approving_reviewers: OnceCell<BTreeSet<String>>,
    maintainer_can_modify: OnceCell<bool>,
    up_to_date: std::sync::Mutex<HashMap<GitRef, Arc<OnceCell<bool>>>>,
}

impl EvaluationContext {
    /// Split a full collaborator into its read-only capabilities.
    pub fn new<C>(pull_request: PullRequestId, collaborator: Arc<C>) -> Self
    where
        C: Collaborator + 'static,
    {
        Self {
            inner: Arc::new(FactSheet {
                pull_request,
                branches: collaborator.clone(),
                files: collaborator.clone(),
                labels: collaborator.clone(),
                author: collaborator.clone(),
                reviews: collaborator.clone(),
                merge_state: collaborator,
                cache: FactCache::default(),
            }),
        }
    }

    pub fn pull_request(&self) -> &PullRequestId {
        &self.inner.pull_request
    }

    pub async fn base_branch(&self) -> CollaboratorResult<&str> {
        let inner = &self.inner;
        let name = inner
            .cache
            .base_branch
            .get_or_try_init(|| inner.branches.base_branch())
            .await?;
        Ok(name.as_str())
    }

    pub async fn head_branch(&self) -> CollaboratorResult<&str> {
        let inner = &self.inner;
        let name = inner
            .cache
            .head_branch
            .get_or_try_init(|| inner.branches.head_branch())
            .await?;
        Ok(name.as_str())
    }

    pub async fn changed_files(&self) -> CollaboratorResult<&[String]> {
        let inner = &self.inner;
        let files = inner
            .cache
            .changed_files
            .get_or_try_init(|| inner.files.changed_files())
            .await?;
        Ok(files.as_slice())
    }

    /// Labels present when the run first asked; labels applied by this run
    /// are not reflected here.
    pub async fn labels(&self) -> CollaboratorResult<&BTreeSet<String>> {
        let inner = &self.inner;
        inner
            .cache
            .labels
            .get_or_try_init(|| inner.labels.labels())
            .await
    }

    pub async fn author(&self) -> CollaboratorResult<&str> {
        let inner = &self.inner;
        let login = inner
            .cache
            .author
            .get_or_try_init(|| inner.author.author())
            .await?;
        Ok(login.as_str())
    }

    pub async fn approving_reviewers(&self) -> CollaboratorResult<&BTreeSet<String>> {
        let inner = &self.inner;
        inner
            .cache
            .approving_reviewers
            .get_or_try_init(|| inner.reviews.approving_reviewers())
            .await
    }

    pub async fn maintainer_can_modify(&self) -> CollaboratorResult<bool> {
        let inner = &self.inner;
        let allowed = inner
            .cache
            .maintainer_can_modify
            .get_or_try_init(|| inner.merge_state.maintainer_can_modify())
            .await?;
        Ok(*allowed)
    }

    /// Pinned per reference.
    pub async fn is_up_to_date_with(&self, reference: &GitRef) -> CollaboratorResult<bool> {
        let inner = &self.inner;
        let cell = {
            let mut pinned = inner
                .cache
                .up_to_date
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            Arc::clone(pinned.entry(reference.clone()).or_default())
        };
        let fresh = cell
            .get_or_try_init(|| inner.merge_state.is_up_to_date_with(reference))
            .await?;
        Ok(*fresh)
    }
}

impl fmt::Debug for EvaluationContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EvaluationContext")
            .field("pull_request", &self.inner.pull_request)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// ActionGate
// ---------------------------------------------------------------------------

/// Serializes side effects on one pull request.
///
/// Concurrent checks may ask for the same label or the same branch update;
/// the gate holds a per-run lock around check-then-act so each effect is
/// requested at most once per run.
#[derive(Clone)]
pub struct ActionGate {
    inner: Arc<ActionGateInner>,
}

struct ActionGateInner {
    pull_request: PullRequestId,
    actions: Arc<dyn PullRequestActions>,
    log: Mutex<ActionLog>,
}

#[derive(Default)]
struct ActionLog {
    labels: BTreeSet<String>,
    update_requested: bool,
    taken: Vec<ActionTaken>,
}

impl ActionGate {
    pub fn new(pull_request: PullRequestId, actions: Arc<dyn PullRequestActions>) -> Self {
        Self {
            inner: Arc::new(ActionGateInner {
                pull_request,
                actions,
                log: Mutex::new(ActionLog::default()),
            }),
        }
    }

    /// Make sure `name` is on the pull request, applying it if absent.
    ///
    /// Returns `Ok(true)` when the label was applied by this call and
    /// `Ok(false)` when it was already present.
    pub async fn ensure_label(
        &self,
        name: &str,
        facts: &EvaluationContext,
        cancel: &CancelSignal,
    ) -> EvalResult<bool> {
        let mut log = self.inner.log.lock().await;
        if log.labels.contains(name) || facts.labels().await?.contains(name) {
            return Ok(false);
        }

        cancel.ensure_active()?;
        self.inner.actions.apply_label(name).await?;

        log.labels.insert(name.to_string());
        let action = ActionTaken::LabelApplied {
            label: name.to_string(),
        };
        obs::emit_action_taken(&self.inner.pull_request, &action);
        log.taken.push(action);
        Ok(true)
    }

    /// Request a head-branch update unless one was already requested this run.
    pub async fn request_update_once(&self, cancel: &CancelSignal) -> EvalResult<bool> {
        let mut log = self.inner.log.lock().await;
        if log.update_requested {
            return Ok(false);
        }

        cancel.ensure_active()?;
        self.inner.actions.request_branch_update().await?;

        log.update_requested = true;
        let action = ActionTaken::BranchUpdateRequested;
        obs::emit_action_taken(&self.inner.pull_request, &action);
        log.taken.push(action);
        Ok(true)
    }

    /// Actions initiated so far, in the order they were taken.
    pub async fn taken(&self) -> Vec<ActionTaken> {
        self.inner.log.lock().await.taken.clone()
    }
}

// ---------------------------------------------------------------------------
// EnforcementContext
// ---------------------------------------------------------------------------

/// Context handed to requirement leaves.
#[derive(Clone)]
pub struct EnforcementContext {
    facts: EvaluationContext,
    actions: ActionGate,
    cancel: CancelSignal,
    remediate_updates: bool,
}

impl EnforcementContext {
    pub fn new(facts: EvaluationContext, actions: ActionGate, cancel: CancelSignal) -> Self {
        Self {
            facts,
            actions,
            cancel,
            remediate_updates: false,
        }
    }

    /// Let every `UpToDateWith` requirement request a branch update.
    pub fn with_update_remediation(mut self, enabled: bool) -> Self {
        self.remediate_updates = enabled;
        self
    }

    pub fn facts(&self) -> &EvaluationContext {
        &self.facts
    }

    pub fn actions(&self) -> &ActionGate {
        &self.actions
    }

    pub fn cancel(&self) -> &CancelSignal {
        &self.cancel
    }

    pub fn remediates_updates(&self) -> bool {
        self.remediate_updates
    }
}

impl fmt::Debug for EnforcementContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnforcementContext")
            .field("facts", &self.facts)
            .field("cancelled", &self.cancel.is_cancelled())
            .field("remediate_updates", &self.remediate_updates)
            .finish_non_exhaustive()
    }
}
