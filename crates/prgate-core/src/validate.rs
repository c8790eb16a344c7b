//! Pre-flight validation of a rule set.

use std::collections::HashSet;

use crate::error::ConfigurationError;
use crate::rules::{AutomaticCheck, ManualCheck};

/// Check structural invariants before any evaluation happens.
///
/// Fails on the first problem found, in declaration order.
pub fn validate_rules(
    automatic: &[AutomaticCheck],
    manual: &[ManualCheck],
) -> Result<(), ConfigurationError> {
    if automatic.iter().any(|c| c.description.trim().is_empty()) {
        return Err(ConfigurationError::EmptyDescription);
    }

    let mut seen = HashSet::new();
    for check in manual {
        if check.description.trim().is_empty() {
            return Err(ConfigurationError::EmptyDescription);
        }
        if !seen.insert(check.description.as_str()) {
            return Err(ConfigurationError::DuplicateManualCheck {
                description: check.description.clone(),
            });
        }
        if check.teams.is_empty() {
            return Err(ConfigurationError::EmptyTeams {
                description: check.description.clone(),
            });
        }
    }

    tracing::debug!(
        automatic = automatic.len(),
        manual = manual.len(),
        "rule set validated"
    );
    Ok(())
}
