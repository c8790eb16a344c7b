//! Declarative rule manifests.
//!
//! A manifest lists checks the same way code does, as JSON or TOML:
//!
//! ```toml
//! [[automatic]]
//! description = "Maintainer must be able to edit this pull request"
//! then = "maintainer_can_modify"
//!
//! [[manual]]
//! description = "The documentation is accurate and relevant"
//! if = { file_changed = '.*\.md' }
//! teams = ["tech-staff", "devrels"]
//! ```
//!
//! [`RulesManifest::compile`] turns it into a validated [`RuleSet`]; patterns
//! are compiled there, so a bad regex never reaches evaluation.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::collaborator::GitRef;
use crate::condition::{self, Condition};
use crate::error::ConfigurationError;
use crate::predicate::Predicate;
use crate::requirement::{self, Requirement, RequirementLeaf};
use crate::rules::{AutomaticCheck, ManualCheck, RuleSet};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionSpec {
    #[default]
    Always,
    BaseBranch(String),
    HeadBranch(String),
    Label(String),
    Author(String),
    FileChanged(String),
    And(Vec<ConditionSpec>),
    Or(Vec<ConditionSpec>),
    Not(Box<ConditionSpec>),
}

impl ConditionSpec {
    pub fn compile(&self) -> Result<Condition, ConfigurationError> {
        Ok(match self {
            ConditionSpec::Always => condition::always(),
            ConditionSpec::BaseBranch(name) => condition::base_branch(name.as_str()),
            ConditionSpec::HeadBranch(name) => condition::head_branch(name.as_str()),
            ConditionSpec::Label(name) => condition::label(name.as_str()),
            ConditionSpec::Author(name) => condition::author(name.as_str()),
            ConditionSpec::FileChanged(pattern) => condition::file_changed(pattern)?,
            ConditionSpec::And(items) => Predicate::And(items.iter().map(Self::compile).collect::<Result<_, _>>()?),
            ConditionSpec::Or(items) => Predicate::Or(items.iter().map(Self::compile).collect::<Result<_, _>>()?),
            ConditionSpec::Not(item) => condition::not(item.compile()?),
        })
    }
}

/// Target of `up_to_date_with`; the pull request's base when `branch` is unset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpToDateSpec {
    #[serde(default)]
    pub branch: Option<String>,
    #[serde(default)]
    pub request_update: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequirementSpec {
    Always,
    Author(String),
    ReviewByUser(String),
    MaintainerCanModify,
    UpToDateWith(UpToDateSpec),
    Label(String),
    And(Vec<RequirementSpec>),
    Or(Vec<RequirementSpec>),
    Not(Box<RequirementSpec>),
}

impl RequirementSpec {
    pub fn compile(&self) -> Result<Requirement, ConfigurationError> {
        Ok(match self {
            RequirementSpec::Always => requirement::always(),
            RequirementSpec::Author(name) => requirement::author(name.as_str()),
            RequirementSpec::ReviewByUser(name) => requirement::review_by_user(name.as_str()),
            RequirementSpec::MaintainerCanModify => requirement::maintainer_can_modify(),
            RequirementSpec::UpToDateWith(spec) => Predicate::Leaf(RequirementLeaf::UpToDateWith {
                reference: match &spec.branch {
                    Some(name) => GitRef::Branch(name.clone()),
                    None => GitRef::PullRequestBase,
                },
                request_update: spec.request_update,
            }),
            RequirementSpec::Label(name) => requirement::label(name.as_str()),
            RequirementSpec::And(items) => Predicate::And(items.iter().map(Self::compile).collect::<Result<_, _>>()?),
            RequirementSpec::Or(items) => Predicate::Or(items.iter().map(Self::compile).collect::<Result<_, _>>()?),
            RequirementSpec::Not(item) => requirement::not(item.compile()?),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutomaticCheckSpec {
    pub description: String,
    #[serde(rename = "if", default)]
    pub condition: ConditionSpec,
    #[serde(rename = "then")]
    pub requirement: RequirementSpec,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManualCheckSpec {
    pub description: String,
    #[serde(rename = "if", default)]
    pub condition: ConditionSpec,
    pub teams: Vec<String>,
}

/// A whole rule catalog as written on disk.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RulesManifest {
    #[serde(default)]
    pub automatic: Vec<AutomaticCheckSpec>,
    #[serde(default)]
    pub manual: Vec<ManualCheckSpec>,
}

impl RulesManifest {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigurationError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_toml_str(toml: &str) -> Result<Self, ConfigurationError> {
        Ok(toml::from_str(toml)?)
    }

    /// Read a manifest, choosing the format by extension (`.toml`, else JSON).
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigurationError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            ConfigurationError::Manifest(format!("cannot read {}: {e}", path.display()))
        })?;
        let is_toml = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));
        if is_toml {
            Self::from_toml_str(&raw)
        } else {
            Self::from_json_str(&raw)
        }
    }

    /// Compile every check and validate the result.
    pub fn compile(&self) -> Result<RuleSet, ConfigurationError> {
        let automatic = self
            .automatic
            .iter()
            .map(|spec| {
                Ok(AutomaticCheck::new(
                    spec.description.clone(),
                    spec.condition.compile()?,
                    spec.requirement.compile()?,
                ))
            })
            .collect::<Result<Vec<_>, ConfigurationError>>()?;

        let manual = self
            .manual
            .iter()
            .map(|spec| {
                Ok(ManualCheck::new(
                    spec.description.clone(),
                    spec.condition.compile()?,
                    spec.teams.iter().cloned(),
                ))
            })
            .collect::<Result<Vec<_>, ConfigurationError>>()?;

        RuleSet::new(automatic, manual)
    }
}
