//! Configuration types.
//!
//! The consumer-facing CONFIG payload is an explicit struct with every
//! recognized option and its default, validated once at load time.

use std::time::Duration;

use regex::Regex;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use crate::error::ConfigError;

/// Reload intervals shorter than this are clamped up to it.
pub const MIN_RELOAD_INTERVAL: Duration = Duration::from_secs(10);

/// Display ordering of cached items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskOrder {
    /// Remote API order.
    #[default]
    Normal,
    /// Fully reversed remote order.
    Reversed,
}

/// Coordinator configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CoordinatorConfig {
    /// Access token for the remote task-list API.
    pub access_token: SecretString,
    /// Client ID for the remote task-list API.
    pub client_id: String,
    /// Display names of the lists to track.
    pub lists: Vec<String>,
    /// Polling interval in seconds, shared by all tracked lists.
    pub interval_secs: u64,
    /// Maximum number of entries shown per list.
    pub maximum_entries: usize,
    /// Ordering of displayed items.
    pub order: TaskOrder,
    /// Lists (by display name) shown in summarized form.
    pub summarize: Vec<String>,
    /// Regex pattern; matching titles are always shown in summarized lists.
    pub always_show_pattern: Option<String>,
    /// Whether assignee initials should be resolved and shown.
    pub show_assignee: bool,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            access_token: SecretString::from(""),
            client_id: String::new(),
            lists: vec!["inbox".to_string()],
            interval_secs: 60,
            maximum_entries: 10,
            order: TaskOrder::Normal,
            summarize: Vec::new(),
            always_show_pattern: None,
            show_assignee: true,
        }
    }
}

impl CoordinatorConfig {
    /// Validate the configuration, returning a normalized copy.
    ///
    /// Clamps the interval to [`MIN_RELOAD_INTERVAL`], checks credentials are
    /// present, and compiles the always-show pattern to catch bad regexes at
    /// load time instead of on every display refresh.
    pub fn validate(mut self) -> Result<Self, ConfigError> {
        if self.access_token.expose_secret().is_empty() {
            return Err(ConfigError::MissingRequired {
                key: "access_token".to_string(),
                hint: "Set the remote API access token".to_string(),
            });
        }
        if self.client_id.is_empty() {
            return Err(ConfigError::MissingRequired {
                key: "client_id".to_string(),
                hint: "Set the remote API client ID".to_string(),
            });
        }
        if let Some(pattern) = &self.always_show_pattern {
            Regex::new(pattern).map_err(|e| ConfigError::InvalidValue {
                key: "always_show_pattern".to_string(),
                message: e.to_string(),
            })?;
        }

        let min = MIN_RELOAD_INTERVAL.as_secs();
        if self.interval_secs < min {
            tracing::warn!(
                requested = self.interval_secs,
                clamped_to = min,
                "Reload interval below minimum, clamping"
            );
            self.interval_secs = min;
        }
        Ok(self)
    }

    /// Polling interval as a [`Duration`].
    pub fn reload_interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    /// Whether the named list is displayed in summarized form.
    pub fn is_summarized(&self, list_name: &str) -> bool {
        self.summarize.iter().any(|l| l == list_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> CoordinatorConfig {
        CoordinatorConfig {
            access_token: SecretString::from("token"),
            client_id: "client".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn defaults_match_module_defaults() {
        let cfg = CoordinatorConfig::default();
        assert_eq!(cfg.lists, vec!["inbox"]);
        assert_eq!(cfg.interval_secs, 60);
        assert_eq!(cfg.maximum_entries, 10);
        assert_eq!(cfg.order, TaskOrder::Normal);
        assert!(cfg.summarize.is_empty());
        assert!(cfg.show_assignee);
    }

    #[test]
    fn validate_requires_credentials() {
        let err = CoordinatorConfig::default().validate().unwrap_err();
        assert!(matches!(err, ConfigError::MissingRequired { key, .. } if key == "access_token"));
    }

    #[test]
    fn validate_clamps_short_interval() {
        let cfg = CoordinatorConfig {
            interval_secs: 1,
            ..valid()
        };
        let cfg = cfg.validate().unwrap();
        assert_eq!(cfg.reload_interval(), MIN_RELOAD_INTERVAL);
    }

    #[test]
    fn validate_rejects_bad_pattern() {
        let cfg = CoordinatorConfig {
            always_show_pattern: Some("[unclosed".to_string()),
            ..valid()
        };
        let err = cfg.validate().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key, .. } if key == "always_show_pattern"));
    }

    #[test]
    fn config_deserializes_from_partial_payload() {
        let cfg: CoordinatorConfig = serde_json::from_str(
            r#"{"access_token": "t", "client_id": "c", "lists": ["Work"], "order": "reversed"}"#,
        )
        .unwrap();
        assert_eq!(cfg.lists, vec!["Work"]);
        assert_eq!(cfg.order, TaskOrder::Reversed);
        assert_eq!(cfg.interval_secs, 60);
    }
}
