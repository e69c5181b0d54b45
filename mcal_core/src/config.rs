//! Source configuration.
//!
//! A source is named by the environment variable that holds its feed locator,
//! so locators (which usually embed private tokens) never appear on a command
//! line or in a config file.

use std::str::FromStr;

use crate::error::ConfigError;

/// Environment variable holding the feed locator, and the label to publish
/// its events under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceConfig {
    pub key: String,
    pub label: Option<String>,
}

impl SourceConfig {
    pub fn new(key: &str, label: Option<&str>) -> Self {
        Self {
            key: key.to_string(),
            label: label.map(String::from),
        }
    }

    /// Look up the locator. Unset and blank values both count as absent.
    pub fn locator(&self, lookup: impl Fn(&str) -> Option<String>) -> Option<String> {
        lookup(&self.key).filter(|locator| !locator.trim().is_empty())
    }
}

impl FromStr for SourceConfig {
    type Err = ConfigError;

    /// Parse `KEY` or `KEY=LABEL`.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let (key, label) = match value.split_once('=') {
            Some((key, label)) => (key.trim(), Some(label.trim())),
            None => (value.trim(), None),
        };
        if key.is_empty() || label.is_some_and(str::is_empty) {
            return Err(ConfigError::InvalidSource(value.to_string()));
        }
        Ok(Self::new(key, label))
    }
}

pub fn default_labeled_sources() -> Vec<SourceConfig> {
    vec![
        SourceConfig::new("ICS_URL_A", Some("A busy")),
        SourceConfig::new("ICS_URL_B", Some("B busy")),
        SourceConfig::new("ICS_URL_C", Some("C busy")),
    ]
}

pub fn default_busy_sources() -> Vec<SourceConfig> {
    vec![
        SourceConfig::new("ICS_URL_A", None),
        SourceConfig::new("ICS_URL_B", None),
    ]
}
