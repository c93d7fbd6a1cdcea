//! Types for the deployment orchestrator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::account::RegionError;
use crate::feature::{
    DeploymentAction, DeploymentActionBlockedReason, FeatureStatus, FeatureStatusSummary,
    FeatureType,
};
use crate::provider::ProviderError;
use crate::result_code::ResultCode;
use crate::settings::SettingsError;

/// Errors that can occur during orchestration.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// A gate refused the action.
    #[error("cannot {action} {}: {}", .check.target_feature, .check.reason)]
    InvalidFeatureState {
        action: DeploymentAction,
        check: DeploymentActionCheck,
    },

    /// Feature settings failed validation.
    #[error(transparent)]
    InvalidFeatureSettings(#[from] SettingsError),

    /// Credentials cannot change while a deployment runs.
    #[error("deployment in progress for: {0:?}")]
    DeploymentInProgress(Vec<FeatureType>),

    #[error("region code conversion failed: {0}")]
    RegionCodeConversionFailed(#[from] RegionError),

    /// A collaborator call failed.
    #[error("provider error: {0}")]
    Provider(#[from] ProviderError),
}

impl OrchestratorError {
    pub fn code(&self) -> ResultCode {
        match self {
            Self::InvalidFeatureState { .. } => ResultCode::ORCHESTRATION_INVALID_FEATURE_STATE,
            Self::InvalidFeatureSettings(_) => ResultCode::ORCHESTRATION_INVALID_FEATURE_SETTINGS,
            Self::DeploymentInProgress(_) => ResultCode::ORCHESTRATION_DEPLOYMENT_IN_PROGRESS,
            Self::RegionCodeConversionFailed(_) => ResultCode::REGION_CODE_CONVERSION_FAILED,
            Self::Provider(e) => e.code(),
        }
    }
}

/// Result of a gating predicate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentActionCheck {
    pub target_feature: FeatureType,
    pub can_execute: bool,
    pub reason: DeploymentActionBlockedReason,
    /// Features responsible for the block, in topological order.
    pub blocking_features: Vec<FeatureType>,
}

impl DeploymentActionCheck {
    pub fn allowed(target_feature: FeatureType) -> Self {
        Self {
            target_feature,
            can_execute: true,
            reason: DeploymentActionBlockedReason::NotBlocked,
            blocking_features: Vec::new(),
        }
    }

    pub fn blocked(
        target_feature: FeatureType,
        reason: DeploymentActionBlockedReason,
        blocking_features: Vec<FeatureType>,
    ) -> Self {
        Self {
            target_feature,
            can_execute: false,
            reason,
            blocking_features,
        }
    }
}

/// Status of one feature as reported back to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureStatusReport {
    pub feature: FeatureType,
    pub status: FeatureStatus,
    pub summary: FeatureStatusSummary,
    pub deployment_in_progress: bool,
    /// When the status last changed; absent until first read.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Outcome of a refresh or a mutating action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentResponse {
    pub result_code: ResultCode,
    pub statuses: Vec<FeatureStatusReport>,
    /// Failure detail; absent on success.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl DeploymentResponse {
    pub fn success(statuses: Vec<FeatureStatusReport>) -> Self {
        Self {
            result_code: ResultCode::SUCCESS,
            statuses,
            message: None,
        }
    }

    pub fn failure(error: &OrchestratorError, statuses: Vec<FeatureStatusReport>) -> Self {
        Self {
            result_code: error.code(),
            statuses,
            message: Some(error.to_string()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.result_code.is_success()
    }

    /// Reported status of `feature`, if it is part of this response.
    pub fn status_of(&self, feature: FeatureType) -> Option<FeatureStatus> {
        self.statuses
            .iter()
            .find(|s| s.feature == feature)
            .map(|s| s.status)
    }
}

/// Snapshot of the orchestrator as a whole.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorStatus {
    /// Session is complete and has not been rejected by the provider.
    pub credentials_valid: bool,
    /// The provider refused the current credentials.
    pub credentials_rejected: bool,
    /// Features with a deployment currently running.
    pub in_progress: Vec<FeatureType>,
    pub features: Vec<FeatureStatusReport>,
}
