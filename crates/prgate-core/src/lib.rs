//! prgate core library
//!
//! Pull-request compliance engine. A [`RuleSet`] pairs conditions (does this
//! check apply?) with either a requirement to enforce automatically or a
//! list of teams that must review. The [`RuleEngine`] evaluates a rule set
//! against one pull request through the [`Collaborator`] capability traits
//! and returns an [`EvaluationResult`].

pub mod cancel;
pub mod catalog;
pub mod collaborator;
pub mod condition;
pub mod config;
pub mod context;
pub mod engine;
pub mod error;
pub mod manifest;
pub mod obs;
pub mod predicate;
pub mod requirement;
pub mod result;
pub mod rules;
pub mod snapshot;
pub mod telemetry;
pub mod validate;

pub use cancel::{cancellation, CancelHandle, CancelSignal};
pub use catalog::demo_rules;
pub use collaborator::{
    AuthorSource, BranchSource, ChangedFileSource, Collaborator, GitRef, LabelSource,
    MergeStateSource, PullRequestActions, PullRequestId, ReviewSource,
};
pub use condition::{Condition, ConditionLeaf, FilePattern};
pub use config::EngineConfig;
pub use context::{ActionGate, EnforcementContext, EvaluationContext};
pub use engine::RuleEngine;
pub use error::{
    CollaboratorError, CollaboratorResult, ConfigurationError, EvalError, EvalResult,
};
pub use manifest::{
    AutomaticCheckSpec, ConditionSpec, ManualCheckSpec, RequirementSpec, RulesManifest,
    UpToDateSpec,
};
pub use predicate::{Leaf, Predicate};
pub use requirement::{Requirement, RequirementLeaf};
pub use result::{
    ActionTaken, AutomaticCheckResult, AutomaticOutcome, EvaluationResult, ManualCheckResult,
    ManualOutcome,
};
pub use rules::{AutomaticCheck, ManualCheck, RuleSet};
pub use snapshot::{Operation, PullRequestSnapshot, SnapshotClient};
pub use telemetry::init_tracing;
pub use validate::validate_rules;

/// prgate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
