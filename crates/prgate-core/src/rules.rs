//! Rule set: the catalog of automatic and manual checks.

use crate::condition::Condition;
use crate::error::ConfigurationError;
use crate::requirement::Requirement;
use crate::validate::validate_rules;

/// Condition-gated requirement, enforced without human routing.
#[derive(Debug, Clone)]
pub struct AutomaticCheck {
    /// Human-facing; need not be unique.
    pub description: String,
    pub condition: Condition,
    pub requirement: Requirement,
}

impl AutomaticCheck {
    pub fn new(description: impl Into<String>, condition: Condition, requirement: Requirement) -> Self {
        Self {
            description: description.into(),
            condition,
            requirement,
        }
    }
}

/// Condition-gated review obligation for named teams.
#[derive(Debug, Clone)]
pub struct ManualCheck {
    /// Unique across the rule set; used as the obligation's external key.
    pub description: String,
    pub condition: Condition,
    /// Ordered, duplicate-free.
    pub teams: Vec<String>,
}

impl ManualCheck {
    pub fn new<I, S>(description: impl Into<String>, condition: Condition, teams: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut ordered: Vec<String> = Vec::new();
        for team in teams {
            let team = team.into();
            if !ordered.contains(&team) {
                ordered.push(team);
            }
        }
        Self {
            description: description.into(),
            condition,
            teams: ordered,
        }
    }
}

/// Validated, immutable set of checks.
///
/// The only way to obtain one is through [`RuleSet::new`], so holding a
/// `RuleSet` means manual descriptions are unique and every manual check has
/// at least one team.
#[derive(Debug, Clone)]
pub struct RuleSet {
    automatic: Vec<AutomaticCheck>,
    manual: Vec<ManualCheck>,
}

impl RuleSet {
    pub fn new(
        automatic: Vec<AutomaticCheck>,
        manual: Vec<ManualCheck>,
    ) -> Result<Self, ConfigurationError> {
        validate_rules(&automatic, &manual)?;
        Ok(Self { automatic, manual })
    }

    pub fn automatic(&self) -> &[AutomaticCheck] {
        &self.automatic
    }

    pub fn manual(&self) -> &[ManualCheck] {
        &self.manual
    }

    /// Total number of checks.
    pub fn len(&self) -> usize {
        self.automatic.len() + self.manual.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::condition::{always, base_branch};
    use crate::requirement::maintainer_can_modify;

    #[test]
    fn teams_are_deduplicated_in_order() {
        let check = ManualCheck::new("docs", always(), ["devrels", "tech-staff", "devrels"]);
        assert_eq!(check.teams, vec!["devrels", "tech-staff"]);
    }

    #[test]
    fn automatic_descriptions_may_repeat() {
        let rules = RuleSet::new(
            vec![
                AutomaticCheck::new("same", always(), maintainer_can_modify()),
                AutomaticCheck::new("same", base_branch("main"), maintainer_can_modify()),
            ],
            vec![],
        )
        .unwrap();
        assert_eq!(rules.len(), 2);
        assert!(!rules.is_empty());
    }

    #[test]
    fn duplicate_manual_description_is_rejected() {
        let err = RuleSet::new(
            vec![],
            vec![
                ManualCheck::new("Demo manual check", always(), ["a"]),
                ManualCheck::new("Demo manual check", always(), ["b"]),
            ],
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigurationError::DuplicateManualCheck { ref description } if description == "Demo manual check"
        ));
    }
}
