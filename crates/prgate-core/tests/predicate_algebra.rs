//! Predicate algebra behaviour observed through real condition and
//! requirement leaves over a snapshot collaborator.

use std::sync::Arc;

use prgate_core::condition as c;
use prgate_core::requirement as r;
use prgate_core::{
    ActionGate, CancelSignal, Condition, EnforcementContext, EvaluationContext, Operation,
    PullRequestId, PullRequestSnapshot, Requirement, SnapshotClient,
};

fn pr() -> PullRequestId {
    PullRequestId::new("gnolang/gno", 3037)
}

fn client(snapshot: PullRequestSnapshot) -> Arc<SnapshotClient> {
    Arc::new(SnapshotClient::new(snapshot))
}

fn facts(client: &Arc<SnapshotClient>) -> EvaluationContext {
    EvaluationContext::new(pr(), client.clone())
}

fn enforcement(client: &Arc<SnapshotClient>) -> EnforcementContext {
    EnforcementContext::new(
        facts(client),
        ActionGate::new(pr(), client.clone()),
        CancelSignal::never(),
    )
}

// ---- short-circuit ----

#[tokio::test]
async fn and_with_false_first_operand_never_evaluates_second() {
    let client = client(PullRequestSnapshot::new("develop", "x").with_files(["foo"]));
    let cond = c::and([c::base_branch("main"), c::file_changed("foo").unwrap()]);

    assert!(!cond.evaluate(&facts(&client)).await.unwrap());
    assert_eq!(client.calls(Operation::BaseBranch), 1);
    assert_eq!(client.calls(Operation::ChangedFiles), 0);
}

#[tokio::test]
async fn or_with_true_first_operand_never_evaluates_second() {
    let client = client(PullRequestSnapshot::new("main", "x"));
    let cond = c::or([c::always(), c::label("bug")]);

    assert!(cond.evaluate(&facts(&client)).await.unwrap());
    assert_eq!(client.calls(Operation::Labels), 0);
}

#[tokio::test]
async fn and_requirement_does_not_act_after_false_operand() {
    let client = client(PullRequestSnapshot::new("main", "x").with_author("someone"));
    let req = r::and([r::author("aeddi"), r::label("bug")]);

    assert!(!req.evaluate(&enforcement(&client)).await.unwrap());
    assert_eq!(client.calls(Operation::ApplyLabel), 0);
    assert!(client.applied_labels().is_empty());
}

// ---- zero operands ----

#[tokio::test]
async fn zero_operand_and_is_true() {
    let client = client(PullRequestSnapshot::new("main", "x"));
    let cond: Condition = c::and([]);
    assert!(cond.evaluate(&facts(&client)).await.unwrap());
}

#[tokio::test]
async fn zero_operand_or_is_false() {
    let client = client(PullRequestSnapshot::new("main", "x"));
    let cond: Condition = c::or([]);
    let req: Requirement = r::or([]);
    assert!(!cond.evaluate(&facts(&client)).await.unwrap());
    assert!(!req.evaluate(&enforcement(&client)).await.unwrap());
}

// ---- FileChanged ----

#[tokio::test]
async fn file_changed_matches_substring_of_path() {
    let matching = client(PullRequestSnapshot::new("main", "x").with_files(["src/foo/bar.go"]));
    let other = client(PullRequestSnapshot::new("main", "x").with_files(["src/baz/qux.go", "docs/a.md"]));
    let cond = c::file_changed("foo").unwrap();

    assert!(cond.evaluate(&facts(&matching)).await.unwrap());
    assert!(!cond.evaluate(&facts(&other)).await.unwrap());
}

#[tokio::test]
async fn file_changed_with_no_changes_is_false() {
    let client = client(PullRequestSnapshot::new("main", "x"));
    assert!(!c::file_changed(".*").unwrap().evaluate(&facts(&client)).await.unwrap());
}

// ---- errors ----

#[tokio::test]
async fn collaborator_failure_is_not_false() {
    let client = Arc::new(
        SnapshotClient::new(PullRequestSnapshot::new("main", "x")).failing(Operation::Author),
    );
    let cond = c::not(c::author("aeddi"));

    let err = cond.evaluate(&facts(&client)).await.unwrap_err();
    assert_eq!(err.to_string(), "author failed: injected transport failure");
}
