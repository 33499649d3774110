//! Engine configuration, loadable from YAML.
//!
//! ```yaml
//! session_timeout_secs: 600
//! sweep_interval_secs: 60
//! feedback:
//!   retrain_every: 50
//!   learning_rate: 0.005
//! ```
//!
//! An `attributes:` list, when present, replaces the built-in attribute table.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::attributes::{AttributeConfig, AttributeTable};
use crate::error::ConfigError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Inactivity after which a creation session times out.
    pub session_timeout_secs: u64,
    /// Period of the background expiry sweep.
    pub sweep_interval_secs: u64,
    pub feedback: FeedbackConfig,
    pub attributes: Option<Vec<AttributeConfig>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedbackConfig {
    /// Number of training examples between weight adjustments.
    pub retrain_every: usize,
    pub learning_rate: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            session_timeout_secs: 600,
            sweep_interval_secs: 60,
            feedback: FeedbackConfig::default(),
            attributes: None,
        }
    }
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        Self {
            retrain_every: 50,
            learning_rate: 0.005,
        }
    }
}

impl EngineConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.check()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_yaml_str(&text)?;
        tracing::info!(path = %path.display(), "loaded engine config");
        Ok(config)
    }

    pub fn session_timeout(&self) -> Duration {
        Duration::from_secs(self.session_timeout_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    /// The configured attribute table, or the built-in one.
    pub fn attribute_table(&self) -> Result<AttributeTable, ConfigError> {
        match &self.attributes {
            Some(attrs) => AttributeTable::new(attrs.clone()),
            None => Ok(AttributeTable::default()),
        }
    }

    /// Reject values the engine cannot run with. Configs built in code
    /// skip the YAML path, so the service calls this too.
    pub fn check(&self) -> Result<(), ConfigError> {
        if self.sweep_interval_secs == 0 {
            return Err(ConfigError::Other(
                "sweep_interval_secs must be greater than zero".into(),
            ));
        }
        if self.feedback.retrain_every == 0 {
            return Err(ConfigError::Other(
                "feedback.retrain_every must be greater than zero".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.feedback.learning_rate) {
            return Err(ConfigError::Other(format!(
                "feedback.learning_rate {} is outside [0, 1]",
                self.feedback.learning_rate
            )));
        }
        if let Some(attrs) = &self.attributes {
            AttributeTable::new(attrs.clone())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults() {
        let c = EngineConfig::default();
        assert_eq!(c.session_timeout(), Duration::from_secs(600));
        assert_eq!(c.sweep_interval(), Duration::from_secs(60));
        assert_eq!(c.feedback.retrain_every, 50);
        assert_eq!(c.feedback.learning_rate, 0.005);
    }

    #[test]
    fn partial_yaml_keeps_defaults() {
        let c = EngineConfig::from_yaml_str("session_timeout_secs: 120\n").unwrap();
        assert_eq!(c.session_timeout_secs, 120);
        assert_eq!(c.sweep_interval_secs, 60);
        assert_eq!(c.feedback, FeedbackConfig::default());
    }

    #[test]
    fn attribute_override_replaces_table() {
        let yaml = r#"
attributes:
  - name: CUSTOMER_NUMBER
    display_name: Customer Account Number
    prompt: "Account number?"
    validation_pattern: '\d{4,8}'
    validation_message: "4-8 digits please."
    min_length: 4
    max_length: 8
    data_type: NUMBER
    required: true
"#;
        let c = EngineConfig::from_yaml_str(yaml).unwrap();
        let table = c.attribute_table().unwrap();
        assert_eq!(table.required_names(), vec!["CUSTOMER_NUMBER"]);
        assert_eq!(table.get("CUSTOMER_NUMBER").unwrap().prompt, "Account number?");
    }

    #[test]
    fn rejects_bad_values() {
        assert!(EngineConfig::from_yaml_str("sweep_interval_secs: 0").is_err());
        assert!(EngineConfig::from_yaml_str("feedback:\n  learning_rate: 3.0").is_err());
        assert!(matches!(
            EngineConfig::from_yaml_str("session_timeout_secs: [1, 2]"),
            Err(ConfigError::Yaml(_))
        ));
    }

    #[test]
    fn missing_file_is_reported() {
        let err = EngineConfig::load(Path::new("/nonexistent/contract-nlp.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }
}
