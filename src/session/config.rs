use crate::core::{DbError, Result};
use serde::{Deserialize, Serialize};

/// Session configuration
///
/// Built in code with the setter chain or loaded from JSON; missing JSON
/// fields take their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Session name, used in log output
    pub name: String,

    /// Undo every registration of a reassociation when any part of its
    /// graph fails. When false, entities bound before the failure stay
    /// registered.
    pub atomic_graph_reassociation: bool,

    /// Maximum number of entities one reassociation may register
    pub max_graph_entities: Option<usize>,
}

impl SessionConfig {
    pub fn new() -> Self {
        Self {
            name: "session".to_string(),
            atomic_graph_reassociation: true,
            max_graph_entities: None,
        }
    }

    /// Set the session name
    pub fn name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    /// Set graph atomicity
    pub fn atomic_graph_reassociation(mut self, atomic: bool) -> Self {
        self.atomic_graph_reassociation = atomic;
        self
    }

    /// Set the graph size limit
    pub fn max_graph_entities(mut self, limit: usize) -> Self {
        self.max_graph_entities = Some(limit);
        self
    }

    /// Parse from a JSON document
    ///
    /// # Examples
    ///
    /// ```
    /// # use memodb_session::SessionConfig;
    /// let config = SessionConfig::from_json(r#"{"max_graph_entities": 500}"#).unwrap();
    /// assert_eq!(config.max_graph_entities, Some(500));
    /// assert!(config.atomic_graph_reassociation);
    /// ```
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_graph_entities == Some(0) {
            return Err(DbError::ConfigError(
                "max_graph_entities must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::new()
    }
}
