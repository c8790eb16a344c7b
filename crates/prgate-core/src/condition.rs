//! Condition leaves: pure predicates over pull-request facts.
//!
//! Conditions decide whether a check applies. They only read through the
//! [`EvaluationContext`] and never act, so evaluating one any number of times
//! against the same pull request gives the same answer.

use std::fmt;

use futures::future::BoxFuture;
use regex::Regex;

use crate::context::EvaluationContext;
use crate::error::{ConfigurationError, EvalResult};
use crate::predicate::{Leaf, Predicate};

pub use crate::predicate::{always, and, not, or};

/// A gate deciding whether a check applies to a pull request.
pub type Condition = Predicate<ConditionLeaf>;

#[derive(Debug, Clone)]
pub enum ConditionLeaf {
    /// Base branch equals the name exactly.
    BaseBranch(String),
    /// Head branch equals the name exactly.
    HeadBranch(String),
    /// Label is currently applied.
    Label(String),
    /// Pull request was opened by this login.
    Author(String),
    /// Some changed path contains a match for the pattern.
    FileChanged(FilePattern),
}

/// Compiled `FileChanged` pattern.
///
/// Matching is a search, not a full-path comparison: `foo` matches
/// `src/foo/bar.go`. Anchor with `^` / `$` for stricter rules.
#[derive(Debug, Clone)]
pub struct FilePattern(Regex);

impl FilePattern {
    pub fn new(pattern: &str) -> Result<Self, ConfigurationError> {
        Regex::new(pattern)
            .map(FilePattern)
            .map_err(|source| ConfigurationError::InvalidPattern {
                pattern: pattern.to_string(),
                source,
            })
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn matches_any<S: AsRef<str>>(&self, paths: &[S]) -> bool {
        paths.iter().any(|p| self.0.is_match(p.as_ref()))
    }
}

impl Leaf for ConditionLeaf {
    type Context = EvaluationContext;

    fn evaluate<'a>(&'a self, ctx: &'a EvaluationContext) -> BoxFuture<'a, EvalResult<bool>> {
        Box::pin(async move {
            match self {
                ConditionLeaf::BaseBranch(name) => Ok(ctx.base_branch().await? == name.as_str()),
                ConditionLeaf::HeadBranch(name) => Ok(ctx.head_branch().await? == name.as_str()),
                ConditionLeaf::Label(name) => Ok(ctx.labels().await?.contains(name)),
                ConditionLeaf::Author(name) => Ok(ctx.author().await? == name.as_str()),
                ConditionLeaf::FileChanged(pattern) => {
                    Ok(pattern.matches_any(ctx.changed_files().await?))
                }
            }
        })
    }
}

impl fmt::Display for ConditionLeaf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConditionLeaf::BaseBranch(name) => write!(f, "base_branch({name})"),
            ConditionLeaf::HeadBranch(name) => write!(f, "head_branch({name})"),
            ConditionLeaf::Label(name) => write!(f, "label({name})"),
            ConditionLeaf::Author(name) => write!(f, "author({name})"),
            ConditionLeaf::FileChanged(pattern) => write!(f, "file_changed({})", pattern.as_str()),
        }
    }
}

pub fn base_branch(name: impl Into<String>) -> Condition {
    Predicate::Leaf(ConditionLeaf::BaseBranch(name.into()))
}

pub fn head_branch(name: impl Into<String>) -> Condition {
    Predicate::Leaf(ConditionLeaf::HeadBranch(name.into()))
}

pub fn label(name: impl Into<String>) -> Condition {
    Predicate::Leaf(ConditionLeaf::Label(name.into()))
}

pub fn author(name: impl Into<String>) -> Condition {
    Predicate::Leaf(ConditionLeaf::Author(name.into()))
}

/// Fails at construction on a malformed pattern.
pub fn file_changed(pattern: &str) -> Result<Condition, ConfigurationError> {
    Ok(Predicate::Leaf(ConditionLeaf::FileChanged(FilePattern::new(pattern)?)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborator::PullRequestId;
    use crate::error::EvalError;
    use crate::snapshot::{Operation, PullRequestSnapshot, SnapshotClient};
    use std::sync::Arc;

    fn ctx(client: &Arc<SnapshotClient>) -> EvaluationContext {
        EvaluationContext::new(PullRequestId::new("acme/repo", 7), client.clone())
    }

    fn snapshot() -> PullRequestSnapshot {
        PullRequestSnapshot::new("main", "demo-pr")
            .with_files(["src/foo/bar.go", "README.md"])
            .with_labels(["bug"])
            .with_author("aeddi")
    }

    #[tokio::test]
    async fn branch_leaves_match_exactly() {
        let client = Arc::new(SnapshotClient::new(snapshot()));
        let ctx = ctx(&client);
        assert!(base_branch("main").evaluate(&ctx).await.unwrap());
        assert!(!base_branch("mai").evaluate(&ctx).await.unwrap());
        assert!(head_branch("demo-pr").evaluate(&ctx).await.unwrap());
        assert!(!head_branch("main").evaluate(&ctx).await.unwrap());
    }

    #[tokio::test]
    async fn file_changed_is_a_search() {
        let client = Arc::new(SnapshotClient::new(snapshot()));
        let ctx = ctx(&client);
        assert!(file_changed("foo").unwrap().evaluate(&ctx).await.unwrap());
        assert!(file_changed(r".*\.md").unwrap().evaluate(&ctx).await.unwrap());
        assert!(!file_changed("^foo").unwrap().evaluate(&ctx).await.unwrap());
        assert!(!file_changed("contribs").unwrap().evaluate(&ctx).await.unwrap());
    }

    #[tokio::test]
    async fn label_and_author() {
        let client = Arc::new(SnapshotClient::new(snapshot()));
        let ctx = ctx(&client);
        assert!(label("bug").evaluate(&ctx).await.unwrap());
        assert!(!label("feature").evaluate(&ctx).await.unwrap());
        assert!(author("aeddi").evaluate(&ctx).await.unwrap());
    }

    #[test]
    fn malformed_pattern_fails_at_construction() {
        let err = file_changed("misc/docker-(").unwrap_err();
        assert!(matches!(err, ConfigurationError::InvalidPattern { ref pattern, .. } if pattern == "misc/docker-("));
    }

    #[tokio::test]
    async fn transport_failure_is_an_error() {
        let client = Arc::new(SnapshotClient::new(snapshot()).failing(Operation::ChangedFiles));
        let ctx = ctx(&client);
        let err = file_changed("foo").unwrap().evaluate(&ctx).await.unwrap_err();
        assert!(matches!(err, EvalError::Collaborator(ref e) if e.operation == "changed_files"));
    }

    #[tokio::test]
    async fn false_base_skips_file_lookup() {
        let client = Arc::new(SnapshotClient::new(snapshot()));
        let ctx = ctx(&client);
        let cond = and([base_branch("release"), file_changed("foo").unwrap()]);
        assert!(!cond.evaluate(&ctx).await.unwrap());
        assert_eq!(client.calls(Operation::ChangedFiles), 0);
    }
}
