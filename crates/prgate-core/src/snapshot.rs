//! Snapshot-backed collaborator.
//!
//! [`SnapshotClient`] answers every capability from a [`PullRequestSnapshot`]
//! held in memory. Actions mutate the snapshot the way the host would
//! (applied labels show up in later reads) and are recorded so callers can
//! inspect what enforcement would have done. The CLI uses it for dry runs;
//! tests use it as the fake, with per-operation call counters and injected
//! transport failures.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::collaborator::{
    AuthorSource, BranchSource, ChangedFileSource, GitRef, LabelSource, MergeStateSource,
    PullRequestActions, PullRequestId, ReviewSource,
};
use crate::error::{CollaboratorError, CollaboratorResult};

/// Facts about one pull request at a point in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestSnapshot {
    #[serde(default)]
    pub repository: String,
    #[serde(default)]
    pub number: u64,
    pub base: String,
    pub head: String,
    #[serde(default)]
    pub labels: BTreeSet<String>,
    #[serde(default)]
    pub changed_files: Vec<String>,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub approving_reviewers: BTreeSet<String>,
    #[serde(default)]
    pub maintainer_can_modify: bool,
    /// Branches the head already contains.
    #[serde(default)]
    pub up_to_date_with: BTreeSet<String>,
}

impl PullRequestSnapshot {
    pub fn new(base: impl Into<String>, head: impl Into<String>) -> Self {
        Self {
            repository: String::new(),
            number: 0,
            base: base.into(),
            head: head.into(),
            labels: BTreeSet::new(),
            changed_files: Vec::new(),
            author: String::new(),
            approving_reviewers: BTreeSet::new(),
            maintainer_can_modify: false,
            up_to_date_with: BTreeSet::new(),
        }
    }

    pub fn from_json_str(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn id(&self) -> PullRequestId {
        PullRequestId::new(self.repository.clone(), self.number)
    }

    pub fn with_id(mut self, repository: impl Into<String>, number: u64) -> Self {
        self.repository = repository.into();
        self.number = number;
        self
    }

    pub fn with_files<I, S>(mut self, files: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.changed_files = files.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_labels<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.labels = labels.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = author.into();
        self
    }

    pub fn with_approvals<I, S>(mut self, reviewers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.approving_reviewers = reviewers.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_maintainer_can_modify(mut self, allowed: bool) -> Self {
        self.maintainer_can_modify = allowed;
        self
    }

    pub fn with_up_to_date<I, S>(mut self, branches: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.up_to_date_with = branches.into_iter().map(Into::into).collect();
        self
    }

    fn resolve<'a>(&'a self, reference: &'a GitRef) -> &'a str {
        match reference {
            GitRef::PullRequestBase => &self.base,
            GitRef::Branch(name) => name,
        }
    }
}

/// Capability calls, for counting and failure injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    BaseBranch,
    HeadBranch,
    ChangedFiles,
    Labels,
    Author,
    ApprovingReviewers,
    MaintainerCanModify,
    IsUpToDateWith,
    ApplyLabel,
    RequestBranchUpdate,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::BaseBranch => "base_branch",
            Operation::HeadBranch => "head_branch",
            Operation::ChangedFiles => "changed_files",
            Operation::Labels => "labels",
            Operation::Author => "author",
            Operation::ApprovingReviewers => "approving_reviewers",
            Operation::MaintainerCanModify => "maintainer_can_modify",
            Operation::IsUpToDateWith => "is_up_to_date_with",
            Operation::ApplyLabel => "apply_label",
            Operation::RequestBranchUpdate => "request_branch_update",
        }
    }
}

#[derive(Debug)]
struct SnapshotState {
    snapshot: PullRequestSnapshot,
    calls: HashMap<Operation, usize>,
    failing: HashSet<Operation>,
    applied_labels: Vec<String>,
    update_requests: usize,
}

/// In-memory collaborator over a snapshot.
#[derive(Debug)]
pub struct SnapshotClient {
    state: Mutex<SnapshotState>,
}

impl SnapshotClient {
    pub fn new(snapshot: PullRequestSnapshot) -> Self {
        Self {
            state: Mutex::new(SnapshotState {
                snapshot,
                calls: HashMap::new(),
                failing: HashSet::new(),
                applied_labels: Vec::new(),
                update_requests: 0,
            }),
        }
    }

    /// Make every call to `operation` fail with a transport error.
    pub fn failing(self, operation: Operation) -> Self {
        self.lock().failing.insert(operation);
        self
    }

    pub fn calls(&self, operation: Operation) -> usize {
        self.lock().calls.get(&operation).copied().unwrap_or(0)
    }

    /// Labels applied through this client, in order.
    pub fn applied_labels(&self) -> Vec<String> {
        self.lock().applied_labels.clone()
    }

    pub fn update_requests(&self) -> usize {
        self.lock().update_requests
    }

    /// Current state, including labels applied since construction.
    pub fn snapshot(&self) -> PullRequestSnapshot {
        self.lock().snapshot.clone()
    }

    fn lock(&self) -> MutexGuard<'_, SnapshotState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Count the call and fail it if injected; returns the locked state.
    fn enter(&self, operation: Operation) -> CollaboratorResult<MutexGuard<'_, SnapshotState>> {
        let mut state = self.lock();
        *state.calls.entry(operation).or_insert(0) += 1;
        if state.failing.contains(&operation) {
            return Err(CollaboratorError::new(
                operation.as_str(),
                "injected transport failure",
            ));
        }
        Ok(state)
    }
}

#[async_trait]
impl BranchSource for SnapshotClient {
    async fn base_branch(&self) -> CollaboratorResult<String> {
        Ok(self.enter(Operation::BaseBranch)?.snapshot.base.clone())
    }

    async fn head_branch(&self) -> CollaboratorResult<String> {
        Ok(self.enter(Operation::HeadBranch)?.snapshot.head.clone())
    }
}

#[async_trait]
impl ChangedFileSource for SnapshotClient {
    async fn changed_files(&self) -> CollaboratorResult<Vec<String>> {
        Ok(self.enter(Operation::ChangedFiles)?.snapshot.changed_files.clone())
    }
}

#[async_trait]
impl LabelSource for SnapshotClient {
    async fn labels(&self) -> CollaboratorResult<BTreeSet<String>> {
        Ok(self.enter(Operation::Labels)?.snapshot.labels.clone())
    }
}

#[async_trait]
impl AuthorSource for SnapshotClient {
    async fn author(&self) -> CollaboratorResult<String> {
        Ok(self.enter(Operation::Author)?.snapshot.author.clone())
    }
}

#[async_trait]
impl ReviewSource for SnapshotClient {
    async fn approving_reviewers(&self) -> CollaboratorResult<BTreeSet<String>> {
        Ok(self
            .enter(Operation::ApprovingReviewers)?
            .snapshot
            .approving_reviewers
            .clone())
    }
}

#[async_trait]
impl MergeStateSource for SnapshotClient {
    async fn maintainer_can_modify(&self) -> CollaboratorResult<bool> {
        Ok(self.enter(Operation::MaintainerCanModify)?.snapshot.maintainer_can_modify)
    }

    async fn is_up_to_date_with(&self, reference: &GitRef) -> CollaboratorResult<bool> {
        let state = self.enter(Operation::IsUpToDateWith)?;
        let branch = state.snapshot.resolve(reference);
        Ok(state.snapshot.up_to_date_with.contains(branch))
    }
}

#[async_trait]
impl PullRequestActions for SnapshotClient {
    async fn apply_label(&self, name: &str) -> CollaboratorResult<()> {
        let mut state = self.enter(Operation::ApplyLabel)?;
        state.snapshot.labels.insert(name.to_string());
        state.applied_labels.push(name.to_string());
        Ok(())
    }

    async fn request_branch_update(&self) -> CollaboratorResult<()> {
        let mut state = self.enter(Operation::RequestBranchUpdate)?;
        state.update_requests += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn counts_calls_and_injects_failures() {
        let client = SnapshotClient::new(PullRequestSnapshot::new("main", "x"))
            .failing(Operation::Labels);

        assert_eq!(client.base_branch().await.unwrap(), "main");
        assert_eq!(client.base_branch().await.unwrap(), "main");
        assert_eq!(client.calls(Operation::BaseBranch), 2);

        let err = client.labels().await.unwrap_err();
        assert_eq!(err.operation, "labels");
        assert_eq!(client.calls(Operation::Labels), 1);
    }

    #[tokio::test]
    async fn applied_label_is_visible_to_later_reads() {
        let client = SnapshotClient::new(PullRequestSnapshot::new("main", "x"));
        client.apply_label("bug").await.unwrap();
        assert!(client.labels().await.unwrap().contains("bug"));
        assert_eq!(client.applied_labels(), vec!["bug".to_string()]);
    }

    #[tokio::test]
    async fn pull_request_base_resolves_to_base_branch() {
        let client = SnapshotClient::new(
            PullRequestSnapshot::new("main", "x").with_up_to_date(["main"]),
        );
        assert!(client.is_up_to_date_with(&GitRef::PullRequestBase).await.unwrap());
        assert!(!client
            .is_up_to_date_with(&GitRef::Branch("release".into()))
            .await
            .unwrap());
    }

    #[test]
    fn snapshot_json_defaults() {
        let snap = PullRequestSnapshot::from_json_str(
            r#"{"repository": "gnolang/gno", "number": 12, "base": "main", "head": "demo-pr"}"#,
        )
        .unwrap();
        assert_eq!(snap.id().to_string(), "gnolang/gno#12");
        assert!(snap.changed_files.is_empty());
        assert!(!snap.maintainer_can_modify);
    }
}
