//! Configuration for the failover core
//!
//! Loaded from TOML or JSON. Every field has a default, so an empty document is
//! a valid configuration.
//!
//! ```toml
//! telephony_providers = ["telephony"]
//! emergency_numbers = ["911", "112"]
//! event_capacity = 64
//!
//! [logging]
//! level = "debug"
//! json = false
//! spans = false
//! ```

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{FailoverError, Result};
use crate::logging::{parse_log_level, LoggingConfig};
use crate::registry::{AccountRegistry, ProviderRegistry};
use crate::selector::{CandidateSelector, EmergencyNumbers};
use crate::sequencer::{AttemptSequencer, DEFAULT_EVENT_CAPACITY};
use crate::types::ProviderKey;

/// Main configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FailoverConfig {
    /// Provider keys forming the plain telephony class used for emergency calls
    pub telephony_providers: Vec<ProviderKey>,
    /// Destination numbers that trigger the emergency override
    pub emergency_numbers: Vec<String>,
    /// Capacity of each run's attempt event channel
    pub event_capacity: usize,
    pub logging: LogSettings,
}

impl Default for FailoverConfig {
    fn default() -> Self {
        Self {
            telephony_providers: vec![ProviderKey::new("telephony")],
            emergency_numbers: ["911", "112", "999", "000", "110", "119"]
                .iter()
                .map(|n| n.to_string())
                .collect(),
            event_capacity: DEFAULT_EVENT_CAPACITY,
            logging: LogSettings::default(),
        }
    }
}

/// Logging section of the configuration file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    pub level: String,
    pub json: bool,
    pub file_info: bool,
    /// Log span enter/exit events
    pub spans: bool,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            file_info: false,
            spans: false,
        }
    }
}

impl FailoverConfig {
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_str(contents: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a file; `.json` files are parsed as JSON, anything else as TOML
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        if path.extension().map_or(false, |ext| ext == "json") {
            Self::from_json_str(&contents)
        } else {
            Self::from_toml_str(&contents)
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.telephony_providers.is_empty() {
            return Err(FailoverError::config("at least one telephony provider is required"));
        }
        if self.telephony_providers.iter().any(|key| key.as_str().trim().is_empty()) {
            return Err(FailoverError::config("telephony provider keys must not be blank"));
        }
        if self.emergency_numbers.iter().any(|n| n.trim().is_empty()) {
            return Err(FailoverError::config("emergency numbers must not be blank"));
        }
        if self.event_capacity == 0 {
            return Err(FailoverError::config("event_capacity must be greater than zero"));
        }
        parse_log_level(&self.logging.level)?;
        Ok(())
    }

    pub fn emergency_policy(&self) -> EmergencyNumbers {
        EmergencyNumbers::new(&self.emergency_numbers)
    }

    pub fn selector(&self, accounts: Arc<dyn AccountRegistry>) -> CandidateSelector {
        CandidateSelector::new(
            accounts,
            Arc::new(self.emergency_policy()),
            self.telephony_providers.iter().cloned(),
        )
    }

    /// A fresh sequencer for one run, sized by `event_capacity`
    pub fn sequencer(&self, registry: Arc<dyn ProviderRegistry>) -> AttemptSequencer {
        AttemptSequencer::with_event_capacity(registry, self.event_capacity)
    }

    pub fn logging_config(&self) -> Result<LoggingConfig> {
        LoggingConfig::from_settings(&self.logging)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing::Level;
    use crate::selector::EmergencyNumberPolicy;

    #[test]
    fn test_default_config_is_valid() {
        let config = FailoverConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.telephony_providers, vec![ProviderKey::new("telephony")]);
        assert!(config.emergency_policy().is_emergency_number("tel:911"));
    }

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config = FailoverConfig::from_toml_str("").unwrap();
        assert_eq!(config, FailoverConfig::default());
    }

    #[test]
    fn test_toml_config() {
        let config = FailoverConfig::from_toml_str(
            r#"
            telephony_providers = ["pstn", "sim"]
            emergency_numbers = ["112"]
            event_capacity = 8

            [logging]
            level = "debug"
            json = true
            spans = true
            "#,
        )
        .unwrap();

        assert_eq!(config.telephony_providers.len(), 2);
        assert_eq!(config.event_capacity, 8);
        assert!(config.logging.json);
        assert!(!config.logging.file_info);

        let policy = config.emergency_policy();
        assert!(policy.is_emergency_number("112"));
        assert!(!policy.is_emergency_number("911"));

        let logging = config.logging_config().unwrap();
        assert_eq!(logging.level, Level::DEBUG);
        assert!(logging.json);
        assert!(logging.spans);
    }

    #[test]
    fn test_json_config() {
        let config =
            FailoverConfig::from_json_str(r#"{"telephony_providers": ["pstn"], "event_capacity": 16}"#)
                .unwrap();
        assert_eq!(config.telephony_providers, vec![ProviderKey::new("pstn")]);
        assert_eq!(config.event_capacity, 16);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_validation_errors() {
        let err = FailoverConfig::from_toml_str("telephony_providers = []").unwrap_err();
        assert!(matches!(err, FailoverError::Configuration { .. }));

        let err = FailoverConfig::from_toml_str("event_capacity = 0").unwrap_err();
        assert!(matches!(err, FailoverError::Configuration { .. }));

        let err = FailoverConfig::from_toml_str(r#"emergency_numbers = [" "]"#).unwrap_err();
        assert!(matches!(err, FailoverError::Configuration { .. }));

        let err = FailoverConfig::from_toml_str("[logging]\nlevel = \"loud\"").unwrap_err();
        assert!(matches!(err, FailoverError::Configuration { .. }));

        let err = FailoverConfig::from_toml_str("event_capacity = \"many\"").unwrap_err();
        assert!(matches!(err, FailoverError::TomlParse(_)));
    }

    #[test]
    fn test_from_file_by_extension() {
        let dir = std::env::temp_dir().join(format!("failover-config-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();

        let json_path = dir.join("failover.json");
        std::fs::write(&json_path, r#"{"emergency_numbers": ["999"]}"#).unwrap();
        let config = FailoverConfig::from_file(&json_path).unwrap();
        assert_eq!(config.emergency_numbers, vec!["999".to_string()]);

        let toml_path = dir.join("failover.toml");
        std::fs::write(&toml_path, "event_capacity = 4").unwrap();
        let config = FailoverConfig::from_file(&toml_path).unwrap();
        assert_eq!(config.event_capacity, 4);

        let err = FailoverConfig::from_file(dir.join("missing.toml")).unwrap_err();
        assert!(matches!(err, FailoverError::Io(_)));

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
