//! Capability traits for the code-review collaborator.
//!
//! The engine never talks to a hosting API directly. Each leaf reaches the
//! pull request through the narrowest trait that answers its question:
//! - `BranchSource`: base and head branch names
//! - `ChangedFileSource`: paths touched by the pull request
//! - `LabelSource`: labels currently applied
//! - `AuthorSource`: who opened the pull request
//! - `ReviewSource`: who approved it
//! - `MergeStateSource`: maintainer-can-modify and up-to-date flags
//! - `PullRequestActions`: the only side-effecting surface
//!
//! A real client implements all of them and so implements [`Collaborator`].
//! Every call is scoped to one pull request and may fail with a
//! [`CollaboratorError`].

use std::collections::BTreeSet;
use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::CollaboratorResult;

/// Identifies the pull request a run is evaluating.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PullRequestId {
    /// `owner/name` of the hosting repository.
    pub repository: String,
    pub number: u64,
}

impl PullRequestId {
    pub fn new(repository: impl Into<String>, number: u64) -> Self {
        Self {
            repository: repository.into(),
            number,
        }
    }
}

impl fmt::Display for PullRequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.repository, self.number)
    }
}

/// Reference a pull request head can be compared against.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "name", rename_all = "snake_case")]
pub enum GitRef {
    /// Whatever branch the pull request targets.
    PullRequestBase,
    /// A named branch.
    Branch(String),
}

impl fmt::Display for GitRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GitRef::PullRequestBase => write!(f, "<pr-base>"),
            GitRef::Branch(name) => write!(f, "{name}"),
        }
    }
}

#[async_trait]
pub trait BranchSource: Send + Sync {
    async fn base_branch(&self) -> CollaboratorResult<String>;

    async fn head_branch(&self) -> CollaboratorResult<String>;
}

#[async_trait]
pub trait ChangedFileSource: Send + Sync {
    /// Changed paths in the order the collaborator lists them.
    async fn changed_files(&self) -> CollaboratorResult<Vec<String>>;
}

#[async_trait]
pub trait LabelSource: Send + Sync {
    async fn labels(&self) -> CollaboratorResult<BTreeSet<String>>;
}

#[async_trait]
pub trait AuthorSource: Send + Sync {
    async fn author(&self) -> CollaboratorResult<String>;
}

#[async_trait]
pub trait ReviewSource: Send + Sync {
    /// Logins whose latest review is an approval.
    async fn approving_reviewers(&self) -> CollaboratorResult<BTreeSet<String>>;
}

#[async_trait]
pub trait MergeStateSource: Send + Sync {
    async fn maintainer_can_modify(&self) -> CollaboratorResult<bool>;

    /// Whether the head already contains every commit of `reference`.
    async fn is_up_to_date_with(&self, reference: &GitRef) -> CollaboratorResult<bool>;
}

/// Side-effecting operations on the pull request.
///
/// Both calls are fire-and-forget from the engine's point of view: a
/// successful return means the request was accepted, not that the remote
/// state already reflects it.
#[async_trait]
pub trait PullRequestActions: Send + Sync {
    async fn apply_label(&self, name: &str) -> CollaboratorResult<()>;

    /// Ask the host to merge the base branch into the head branch.
    async fn request_branch_update(&self) -> CollaboratorResult<()>;
}

/// Full capability surface of a code-review client.
pub trait Collaborator:
    BranchSource
    + ChangedFileSource
    + LabelSource
    + AuthorSource
    + ReviewSource
    + MergeStateSource
    + PullRequestActions
{
}

impl<T> Collaborator for T where
    T: BranchSource
        + ChangedFileSource
        + LabelSource
        + AuthorSource
        + ReviewSource
        + MergeStateSource
        + PullRequestActions
{
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pull_request_id_display() {
        let id = PullRequestId::new("gnolang/gno", 3037);
        assert_eq!(id.to_string(), "gnolang/gno#3037");
    }

    #[test]
    fn git_ref_serde_shape() {
        let json = serde_json::to_value(GitRef::Branch("main".into())).unwrap();
        assert_eq!(json, serde_json::json!({"type": "branch", "name": "main"}));

        let base: GitRef = serde_json::from_value(serde_json::json!({"type": "pull_request_base"}))
            .unwrap();
        assert_eq!(base, GitRef::PullRequestBase);
    }
}
