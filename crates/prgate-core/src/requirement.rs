//! Requirement leaves: predicates that may remediate.
//!
//! A requirement passes or fails like a condition, but some leaves are
//! allowed one bounded, idempotent side effect through the run's
//! [`ActionGate`](crate::context::ActionGate):
//!
//! | Leaf                  | Passes when                          | May act            |
//! |-----------------------|--------------------------------------|--------------------|
//! | `Author`              | author equals the login              | no                 |
//! | `ReviewByUser`        | login is among approving reviewers   | no                 |
//! | `MaintainerCanModify` | the flag is set                      | no                 |
//! | `UpToDateWith`        | head contains the reference          | branch update, opt-in |
//! | `Label`               | label is present (after applying)    | apply label        |

use std::fmt;

use futures::future::BoxFuture;

use crate::collaborator::GitRef;
use crate::context::EnforcementContext;
use crate::error::EvalResult;
use crate::predicate::{Leaf, Predicate};

pub use crate::predicate::{always, and, not, or};

/// What a matching automatic check enforces.
pub type Requirement = Predicate<RequirementLeaf>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequirementLeaf {
    Author(String),
    ReviewByUser(String),
    MaintainerCanModify,
    UpToDateWith {
        reference: GitRef,
        /// Ask for a branch update when behind. The check still fails for
        /// this run; the update lands asynchronously.
        request_update: bool,
    },
    Label(String),
}

impl Leaf for RequirementLeaf {
    type Context = EnforcementContext;

    fn evaluate<'a>(&'a self, ctx: &'a EnforcementContext) -> BoxFuture<'a, EvalResult<bool>> {
        Box::pin(async move {
            let facts = ctx.facts();
            match self {
                RequirementLeaf::Author(name) => Ok(facts.author().await? == name.as_str()),
                RequirementLeaf::ReviewByUser(name) => {
                    Ok(facts.approving_reviewers().await?.contains(name))
                }
                RequirementLeaf::MaintainerCanModify => {
                    Ok(facts.maintainer_can_modify().await?)
                }
                RequirementLeaf::UpToDateWith {
                    reference,
                    request_update,
                } => {
                    if facts.is_up_to_date_with(reference).await? {
                        return Ok(true);
                    }
                    if *request_update || ctx.remediates_updates() {
                        ctx.actions().request_update_once(ctx.cancel()).await?;
                    }
                    Ok(false)
                }
                RequirementLeaf::Label(name) => {
                    ctx.actions()
                        .ensure_label(name, facts, ctx.cancel())
                        .await?;
                    Ok(true)
                }
            }
        })
    }
}

impl fmt::Display for RequirementLeaf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequirementLeaf::Author(name) => write!(f, "author({name})"),
            RequirementLeaf::ReviewByUser(name) => write!(f, "review_by_user({name})"),
            RequirementLeaf::MaintainerCanModify => write!(f, "maintainer_can_modify"),
            RequirementLeaf::UpToDateWith {
                reference,
                request_update: false,
            } => write!(f, "up_to_date_with({reference})"),
            RequirementLeaf::UpToDateWith {
                reference,
                request_update: true,
            } => write!(f, "up_to_date_with({reference}, request_update)"),
            RequirementLeaf::Label(name) => write!(f, "label({name})"),
        }
    }
}

pub fn author(name: impl Into<String>) -> Requirement {
    Predicate::Leaf(RequirementLeaf::Author(name.into()))
}

pub fn review_by_user(name: impl Into<String>) -> Requirement {
    Predicate::Leaf(RequirementLeaf::ReviewByUser(name.into()))
}

pub fn maintainer_can_modify() -> Requirement {
    Predicate::Leaf(RequirementLeaf::MaintainerCanModify)
}

/// Observe-only freshness check.
pub fn up_to_date_with(reference: GitRef) -> Requirement {
    Predicate::Leaf(RequirementLeaf::UpToDateWith {
        reference,
        request_update: false,
    })
}

/// Freshness check that requests a branch update when the head is behind.
pub fn up_to_date_with_update(reference: GitRef) -> Requirement {
    Predicate::Leaf(RequirementLeaf::UpToDateWith {
        reference,
        request_update: true,
    })
}

/// Ensure the label is applied.
pub fn label(name: impl Into<String>) -> Requirement {
    Predicate::Leaf(RequirementLeaf::Label(name.into()))
}
