//! Per-feature settings and their validation.
//!
//! Settings are plain string variables per feature, the same values the
//! feature templates are rendered with.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::feature::FeatureType;

pub const IS_FACEBOOK_ENABLED: &str = "is_facebook_enabled";
pub const FACEBOOK_CLIENT_ID: &str = "facebook_client_id";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid settings for {feature}: {reason}")]
pub struct SettingsError {
    pub feature: FeatureType,
    pub reason: String,
}

/// String variables keyed by feature.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureSettings {
    variables: BTreeMap<FeatureType, BTreeMap<String, String>>,
}

impl FeatureSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_variable(
        mut self,
        feature: FeatureType,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.set_variable(feature, key, value);
        self
    }

    pub fn set_variable(
        &mut self,
        feature: FeatureType,
        key: impl Into<String>,
        value: impl Into<String>,
    ) {
        self.variables
            .entry(feature)
            .or_default()
            .insert(key.into(), value.into());
    }

    pub fn variable(&self, feature: FeatureType, key: &str) -> Option<&str> {
        self.variables
            .get(&feature)
            .and_then(|vars| vars.get(key))
            .map(String::as_str)
    }

    pub fn variables(&self, feature: FeatureType) -> Option<&BTreeMap<String, String>> {
        self.variables.get(&feature)
    }

    /// Check the settings of one feature before it is deployed.
    pub fn validate(&self, feature: FeatureType) -> Result<(), SettingsError> {
        if feature == FeatureType::Identity
            && self.variable(feature, IS_FACEBOOK_ENABLED) == Some("true")
            && self.variable(feature, FACEBOOK_CLIENT_ID) == Some("")
        {
            return Err(SettingsError {
                feature,
                reason: format!(
                    "'{}' must not be empty when '{}' is true",
                    FACEBOOK_CLIENT_ID, IS_FACEBOOK_ENABLED
                ),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_settings_are_valid() {
        let settings = FeatureSettings::new();
        for feature in FeatureType::ALL {
            assert!(settings.validate(feature).is_ok());
        }
    }

    #[test]
    fn test_facebook_enabled_without_client_id() {
        let settings = FeatureSettings::new()
            .with_variable(FeatureType::Identity, IS_FACEBOOK_ENABLED, "true")
            .with_variable(FeatureType::Identity, FACEBOOK_CLIENT_ID, "");
        let err = settings.validate(FeatureType::Identity).unwrap_err();
        assert_eq!(err.feature, FeatureType::Identity);
        assert!(err.reason.contains(FACEBOOK_CLIENT_ID));
    }

    #[test]
    fn test_facebook_enabled_with_client_id() {
        let settings = FeatureSettings::new()
            .with_variable(FeatureType::Identity, IS_FACEBOOK_ENABLED, "true")
            .with_variable(FeatureType::Identity, FACEBOOK_CLIENT_ID, "1234");
        assert!(settings.validate(FeatureType::Identity).is_ok());
    }

    #[test]
    fn test_facebook_disabled_with_empty_client_id() {
        let settings = FeatureSettings::new()
            .with_variable(FeatureType::Identity, IS_FACEBOOK_ENABLED, "false")
            .with_variable(FeatureType::Identity, FACEBOOK_CLIENT_ID, "");
        assert!(settings.validate(FeatureType::Identity).is_ok());
    }

    #[test]
    fn test_rule_only_applies_to_identity() {
        let settings = FeatureSettings::new()
            .with_variable(FeatureType::Achievements, IS_FACEBOOK_ENABLED, "true")
            .with_variable(FeatureType::Achievements, FACEBOOK_CLIENT_ID, "");
        assert!(settings.validate(FeatureType::Achievements).is_ok());
    }

    #[test]
    fn test_deserialize_from_toml() {
        let toml = r#"
            [identity]
            is_facebook_enabled = "true"
            facebook_client_id = "abc"

            [gamesaving]
            max_save_slots_per_player = "10"
        "#;
        let settings: FeatureSettings = toml::from_str(toml).unwrap();
        assert_eq!(
            settings.variable(FeatureType::Identity, FACEBOOK_CLIENT_ID),
            Some("abc")
        );
        assert_eq!(
            settings.variable(FeatureType::GameStateCloudSaving, "max_save_slots_per_player"),
            Some("10")
        );
    }
}
