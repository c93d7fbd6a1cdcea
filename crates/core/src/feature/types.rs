//! Core feature data types.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// Feature identity
// ============================================================================

/// A deployable bundle of backend resources.
///
/// `Main` is the shared core every other feature builds on. The ordering of
/// the variants is the tie-break order used when sorting features that have
/// no dependency relation between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FeatureType {
    #[serde(rename = "main")]
    Main,
    #[serde(rename = "identity")]
    Identity,
    #[serde(rename = "achievements")]
    Achievements,
    #[serde(rename = "gamesaving")]
    GameStateCloudSaving,
    #[serde(rename = "usergamedata")]
    UserGameplayData,
}

impl FeatureType {
    /// Every known feature, in declaration order.
    pub const ALL: [FeatureType; 5] = [
        FeatureType::Main,
        FeatureType::Identity,
        FeatureType::Achievements,
        FeatureType::GameStateCloudSaving,
        FeatureType::UserGameplayData,
    ];

    /// Stable key used in config files, HTTP paths and collaborator commands.
    pub fn as_str(&self) -> &'static str {
        match self {
            FeatureType::Main => "main",
            FeatureType::Identity => "identity",
            FeatureType::Achievements => "achievements",
            FeatureType::GameStateCloudSaving => "gamesaving",
            FeatureType::UserGameplayData => "usergamedata",
        }
    }
}

impl fmt::Display for FeatureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string does not name a known feature.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown feature: {0}")]
pub struct UnknownFeatureError(pub String);

impl FromStr for FeatureType {
    type Err = UnknownFeatureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FeatureType::ALL
            .into_iter()
            .find(|feature| feature.as_str() == s)
            .ok_or_else(|| UnknownFeatureError(s.to_string()))
    }
}

// ============================================================================
// Status
// ============================================================================

/// Last observed lifecycle state of one feature's stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FeatureStatus {
    /// Never refreshed.
    #[default]
    Unknown,
    /// No stack exists.
    Undeployed,
    /// The provider reports an in-progress operation this process did not start.
    Running,
    /// Stack complete and healthy.
    Deployed,
    /// A prior update was rolled back; the stack is usable.
    RollbackComplete,
    /// Terminal failure.
    Error,
    GeneratingTemplates,
    UploadingDashboards,
    UploadingLayers,
    UploadingFunctions,
    DeployingResources,
    DeletingResources,
}

impl FeatureStatus {
    /// Map a raw provider stack status onto a feature status.
    ///
    /// Unrecognized values map to `Error`, never to a success state.
    pub fn from_stack_status(raw: &str) -> Self {
        let raw = raw.trim();
        match raw {
            "" | "UNDEPLOYED" | "DELETE_COMPLETE" => FeatureStatus::Undeployed,
            "ROLLBACK_COMPLETE" | "UPDATE_ROLLBACK_COMPLETE" | "IMPORT_ROLLBACK_COMPLETE" => {
                FeatureStatus::RollbackComplete
            }
            // Post-update cleanup leaves the stack healthy.
            _ if raw.contains("COMPLETE") && !raw.contains("ROLLBACK") => FeatureStatus::Deployed,
            _ if raw.contains("IN_PROGRESS") => FeatureStatus::Running,
            _ => FeatureStatus::Error,
        }
    }

    /// Human readable name.
    pub fn display_name(&self) -> &'static str {
        match self {
            FeatureStatus::Unknown => "Unknown",
            FeatureStatus::Undeployed => "Undeployed",
            FeatureStatus::Running => "Running",
            FeatureStatus::Deployed => "Deployed",
            FeatureStatus::RollbackComplete => "Rollback Complete",
            FeatureStatus::Error => "Error",
            FeatureStatus::GeneratingTemplates => "Generating Templates",
            FeatureStatus::UploadingDashboards => "Uploading Dashboards",
            FeatureStatus::UploadingLayers => "Uploading Layers",
            FeatureStatus::UploadingFunctions => "Uploading Functions",
            FeatureStatus::DeployingResources => "Deploying Resources",
            FeatureStatus::DeletingResources => "Deleting Resources",
        }
    }

    /// Statuses a feature rests in between actions.
    pub fn is_at_rest(&self) -> bool {
        matches!(
            self,
            FeatureStatus::Deployed
                | FeatureStatus::Undeployed
                | FeatureStatus::Error
                | FeatureStatus::RollbackComplete
        )
    }

    /// Something is actively happening to the stack.
    pub fn is_in_flight(&self) -> bool {
        !self.is_at_rest() && *self != FeatureStatus::Unknown
    }

    /// The stack exists and other features may build on it.
    pub fn is_usable(&self) -> bool {
        matches!(self, FeatureStatus::Deployed | FeatureStatus::RollbackComplete)
    }

    pub fn summary(&self) -> FeatureStatusSummary {
        match self {
            FeatureStatus::Deployed | FeatureStatus::RollbackComplete => {
                FeatureStatusSummary::Deployed
            }
            FeatureStatus::Undeployed => FeatureStatusSummary::Undeployed,
            FeatureStatus::Error => FeatureStatusSummary::Error,
            FeatureStatus::Unknown => FeatureStatusSummary::Unknown,
            _ => FeatureStatusSummary::Running,
        }
    }
}

impl fmt::Display for FeatureStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Coarse view of a [`FeatureStatus`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureStatusSummary {
    Deployed,
    Undeployed,
    Error,
    Running,
    Unknown,
}

// ============================================================================
// Actions
// ============================================================================

/// The three mutating actions the orchestrator can run against a feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeploymentAction {
    Create,
    Redeploy,
    Delete,
}

impl DeploymentAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeploymentAction::Create => "create",
            DeploymentAction::Redeploy => "redeploy",
            DeploymentAction::Delete => "delete",
        }
    }
}

impl fmt::Display for DeploymentAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a deployment action cannot run right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeploymentActionBlockedReason {
    NotBlocked,
    FeatureStatusIsUnknown,
    FeatureMustBeCreated,
    FeatureMustBeDeleted,
    DependenciesMustBeCreated,
    DependenciesStatusIsInvalid,
    DependenciesMustBeDeleted,
    OngoingDeployments,
    CredentialsInvalid,
}

impl DeploymentActionBlockedReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotBlocked => "not_blocked",
            Self::FeatureStatusIsUnknown => "feature_status_is_unknown",
            Self::FeatureMustBeCreated => "feature_must_be_created",
            Self::FeatureMustBeDeleted => "feature_must_be_deleted",
            Self::DependenciesMustBeCreated => "dependencies_must_be_created",
            Self::DependenciesStatusIsInvalid => "dependencies_status_is_invalid",
            Self::DependenciesMustBeDeleted => "dependencies_must_be_deleted",
            Self::OngoingDeployments => "ongoing_deployments",
            Self::CredentialsInvalid => "credentials_invalid",
        }
    }
}

impl fmt::Display for DeploymentActionBlockedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_key_roundtrip() {
        for feature in FeatureType::ALL {
            assert_eq!(feature.as_str().parse::<FeatureType>().unwrap(), feature);
        }
        assert_eq!(
            "gamesaving".parse::<FeatureType>().unwrap(),
            FeatureType::GameStateCloudSaving
        );
        assert!("leaderboards".parse::<FeatureType>().is_err());
    }

    #[test]
    fn test_feature_serde_uses_keys() {
        let json = serde_json::to_string(&FeatureType::UserGameplayData).unwrap();
        assert_eq!(json, "\"usergamedata\"");
        let parsed: FeatureType = serde_json::from_str("\"identity\"").unwrap();
        assert_eq!(parsed, FeatureType::Identity);
    }

    #[test]
    fn test_stack_status_mapping() {
        use FeatureStatus::*;
        let cases = [
            ("", Undeployed),
            ("UNDEPLOYED", Undeployed),
            ("DELETE_COMPLETE", Undeployed),
            ("CREATE_COMPLETE", Deployed),
            ("UPDATE_COMPLETE", Deployed),
            ("IMPORT_COMPLETE", Deployed),
            ("ROLLBACK_COMPLETE", RollbackComplete),
            ("UPDATE_ROLLBACK_COMPLETE", RollbackComplete),
            ("CREATE_IN_PROGRESS", Running),
            ("IMPORT_ROLLBACK_COMPLETE", RollbackComplete),
            ("UPDATE_COMPLETE_CLEANUP_IN_PROGRESS", Deployed),
            ("UPDATE_ROLLBACK_COMPLETE_CLEANUP_IN_PROGRESS", Running),
            ("UPDATE_ROLLBACK_IN_PROGRESS", Running),
            ("ROLLBACK_IN_PROGRESS", Running),
            ("CREATE_FAILED", Error),
            ("UPDATE_ROLLBACK_FAILED", Error),
            ("DELETE_FAILED", Error),
            ("SOMETHING_NEW", Error),
        ];
        for (raw, expected) in cases {
            assert_eq!(FeatureStatus::from_stack_status(raw), expected, "raw = {raw:?}");
        }
    }

    #[test]
    fn test_summary() {
        assert_eq!(
            FeatureStatus::RollbackComplete.summary(),
            FeatureStatusSummary::Deployed
        );
        assert_eq!(
            FeatureStatus::UploadingLayers.summary(),
            FeatureStatusSummary::Running
        );
        assert_eq!(FeatureStatus::Running.summary(), FeatureStatusSummary::Running);
        assert_eq!(FeatureStatus::Unknown.summary(), FeatureStatusSummary::Unknown);
        assert_eq!(FeatureStatus::Error.summary(), FeatureStatusSummary::Error);
        assert_eq!(
            FeatureStatus::Undeployed.summary(),
            FeatureStatusSummary::Undeployed
        );
    }

    #[test]
    fn test_rest_and_flight() {
        assert!(FeatureStatus::Error.is_at_rest());
        assert!(!FeatureStatus::Unknown.is_at_rest());
        assert!(!FeatureStatus::Unknown.is_in_flight());
        assert!(FeatureStatus::DeletingResources.is_in_flight());
        assert!(FeatureStatus::Running.is_in_flight());
        assert!(!FeatureStatus::Error.is_usable());
    }
}
