//! Startup configuration for the engine.
//!
//! Loaded once, validated, then shared read-only behind an `Arc`.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

use crate::error::{AuthzError, Result};
use crate::roles::{ActionTable, RoleGroups};

/// Default cap on the number of submissions one user may own.
pub const DEFAULT_SUBMISSION_LIMIT: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthzConfig {
    pub roles: RoleGroups,
    /// Users owning this many submissions may not create another.
    pub submission_limit: usize,
}

impl Default for AuthzConfig {
    fn default() -> Self {
        Self {
            roles: RoleGroups::default(),
            submission_limit: DEFAULT_SUBMISSION_LIMIT,
        }
    }
}

impl AuthzConfig {
    /// Parses and validates a YAML document. Missing keys keep their defaults.
    pub fn from_yaml_str(src: &str) -> Result<Self> {
        let config: AuthzConfig = serde_yaml::from_str(src)
            .map_err(|e| AuthzError::Internal(format!("Invalid authorization config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Loads the config from `path`, or falls back to defaults when the file
    /// does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!(
                "No authorization config at {:?}, using built-in defaults",
                path
            );
            return Ok(Self::default());
        }

        let src = std::fs::read_to_string(path).map_err(|e| {
            AuthzError::Internal(format!("Failed to read config {:?}: {}", path, e))
        })?;
        let config = Self::from_yaml_str(&src)?;
        debug!("Loaded authorization config from {:?}", path);
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.submission_limit == 0 {
            return Err(AuthzError::Internal(
                "submission_limit must be greater than zero".to_string(),
            ));
        }

        let groups = [
            ("deciders", &self.roles.deciders),
            ("adders", &self.roles.adders),
            ("trial_curators", &self.roles.trial_curators),
            ("staff", &self.roles.staff),
            ("administrators", &self.roles.administrators),
        ];
        for (name, roles) in groups {
            if roles.is_empty() {
                return Err(AuthzError::Internal(format!(
                    "role group '{}' must not be empty",
                    name
                )));
            }
        }

        Ok(())
    }

    pub fn action_table(&self) -> ActionTable {
        ActionTable::from_groups(&self.roles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roles::ROLE_ADMINISTRATOR;

    #[test]
    fn test_defaults_are_valid() {
        let config = AuthzConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.submission_limit, DEFAULT_SUBMISSION_LIMIT);
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = AuthzConfig::from_yaml_str(
            r#"
submission_limit: 5
roles:
  adders: ["adder"]
"#,
        )
        .unwrap();

        assert_eq!(config.submission_limit, 5);
        assert!(config.roles.adders.contains("adder"));
        assert!(config.roles.administrators.contains(ROLE_ADMINISTRATOR));
    }

    #[test]
    fn test_zero_limit_rejected() {
        let result = AuthzConfig::from_yaml_str("submission_limit: 0");
        assert!(matches!(result, Err(AuthzError::Internal(_))));
    }

    #[test]
    fn test_empty_group_rejected() {
        let result = AuthzConfig::from_yaml_str("roles:\n  deciders: []\n");
        assert!(matches!(result, Err(AuthzError::Internal(_))));
    }

    #[test]
    fn test_malformed_yaml_rejected() {
        let result = AuthzConfig::from_yaml_str("submission_limit: [not, a, number]");
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = AuthzConfig::load(&dir.path().join("authz.yaml")).unwrap();
        assert_eq!(config, AuthzConfig::default());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("authz.yaml");
        std::fs::write(&path, "submission_limit: 3\n").unwrap();

        let config = AuthzConfig::load(&path).unwrap();
        assert_eq!(config.submission_limit, 3);
    }

    #[test]
    fn test_shipped_config_matches_defaults() {
        let shipped = AuthzConfig::from_yaml_str(include_str!("../../config/authz.yaml")).unwrap();
        assert_eq!(shipped, AuthzConfig::default());
    }
}
