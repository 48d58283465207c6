//! Engine configuration.

use serde::{Deserialize, Serialize};

/// Alias hops followed before giving up.
pub const DEFAULT_MAX_ALIAS_HOPS: usize = 4;

/// Configuration for a dispatch [`Engine`](crate::Engine).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Maximum number of alias indirections followed from one entry.
    pub max_alias_hops: usize,

    /// How two entries expanding to the same key are reconciled.
    pub collision_policy: CollisionPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_alias_hops: DEFAULT_MAX_ALIAS_HOPS,
            collision_policy: CollisionPolicy::LastDeclaredWins,
        }
    }
}

/// Resolution rule for canonical key collisions between entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CollisionPolicy {
    /// The entry declared later in the description owns the key.
    #[default]
    LastDeclaredWins,
    /// The entry declared first keeps the key.
    FirstDeclaredWins,
    /// Any collision fails compilation.
    Reject,
}

impl EngineConfig {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a configuration from TOML text. Missing fields take defaults.
    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Render the configuration as TOML.
    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    pub fn with_max_alias_hops(mut self, hops: usize) -> Self {
        self.max_alias_hops = hops;
        self
    }

    pub fn with_collision_policy(mut self, policy: CollisionPolicy) -> Self {
        self.collision_policy = policy;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.max_alias_hops, 4);
        assert_eq!(config.collision_policy, CollisionPolicy::LastDeclaredWins);
    }

    #[test]
    fn test_partial_toml() {
        let config = EngineConfig::from_toml_str("collision_policy = \"reject\"").unwrap();
        assert_eq!(config.collision_policy, CollisionPolicy::Reject);
        assert_eq!(config.max_alias_hops, 4);
    }

    #[test]
    fn test_toml_round_trip() {
        let config = EngineConfig::new()
            .with_max_alias_hops(2)
            .with_collision_policy(CollisionPolicy::FirstDeclaredWins);
        let text = config.to_toml_string().unwrap();
        assert!(text.contains("first-declared-wins"));
        assert_eq!(EngineConfig::from_toml_str(&text).unwrap(), config);
    }

    #[test]
    fn test_unknown_policy_rejected() {
        assert!(EngineConfig::from_toml_str("collision_policy = \"random\"").is_err());
    }
}
