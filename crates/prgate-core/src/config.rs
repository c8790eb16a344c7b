//! Engine configuration.

use serde::{Deserialize, Serialize};

use crate::error::ConfigurationError;

/// Environment variable overriding [`EngineConfig::max_concurrent`].
pub const ENV_MAX_CONCURRENT: &str = "PRGATE_MAX_CONCURRENT";
/// Environment variable overriding [`EngineConfig::update_remediation`].
pub const ENV_UPDATE_REMEDIATION: &str = "PRGATE_UPDATE_REMEDIATION";

/// Knobs for one [`RuleEngine`](crate::engine::RuleEngine).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Maximum checks evaluated at once. Bounds concurrent calls into the
    /// collaborator to respect its rate limits. Never below 1.
    pub max_concurrent: usize,
    /// Let every `UpToDateWith` requirement request a branch update, not
    /// only the ones declared with `request_update`.
    pub update_remediation: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_concurrent: 4,
            update_remediation: false,
        }
    }
}

impl EngineConfig {
    pub fn with_max_concurrent(mut self, max_concurrent: usize) -> Self {
        self.max_concurrent = max_concurrent.max(1);
        self
    }

    pub fn with_update_remediation(mut self, enabled: bool) -> Self {
        self.update_remediation = enabled;
        self
    }

    /// Defaults overridden by `PRGATE_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigurationError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigurationError> {
        let mut config = Self::default();

        if let Some(raw) = lookup(ENV_MAX_CONCURRENT) {
            let value: usize = raw.trim().parse().map_err(|_| {
                ConfigurationError::Manifest(format!(
                    "{ENV_MAX_CONCURRENT} must be a positive integer, got '{raw}'"
                ))
            })?;
            config = config.with_max_concurrent(value);
        }

        if let Some(raw) = lookup(ENV_UPDATE_REMEDIATION) {
            let enabled = match raw.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" => false,
                _ => {
                    return Err(ConfigurationError::Manifest(format!(
                        "{ENV_UPDATE_REMEDIATION} must be a boolean, got '{raw}'"
                    )))
                }
            };
            config = config.with_update_remediation(enabled);
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.max_concurrent, 4);
        assert!(!config.update_remediation);
    }

    #[test]
    fn zero_workers_clamps_to_one() {
        assert_eq!(EngineConfig::default().with_max_concurrent(0).max_concurrent, 1);
    }

    #[test]
    fn env_overrides() {
        let config = EngineConfig::from_lookup(lookup(&[
            (ENV_MAX_CONCURRENT, "8"),
            (ENV_UPDATE_REMEDIATION, "yes"),
        ]))
        .unwrap();
        assert_eq!(config.max_concurrent, 8);
        assert!(config.update_remediation);
    }

    #[test]
    fn malformed_env_is_a_configuration_error() {
        let err = EngineConfig::from_lookup(lookup(&[(ENV_MAX_CONCURRENT, "many")])).unwrap_err();
        assert!(matches!(err, ConfigurationError::Manifest(_)));
    }
}
