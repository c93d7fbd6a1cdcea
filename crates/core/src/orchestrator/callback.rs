//! Callback adapters for callers that want results pushed to them.
//!
//! The orchestrator returns plain values. These adapters turn those values
//! into exactly one callback invocation.

use std::sync::Arc;

use crate::feature::{DeploymentActionBlockedReason, FeatureStatus, FeatureType};
use crate::result_code::ResultCode;

use super::types::{DeploymentActionCheck, DeploymentResponse};

/// Receives the features, their statuses (parallel slices) and the result code.
pub type DeploymentResponseCallback =
    Arc<dyn Fn(&[FeatureType], &[FeatureStatus], ResultCode) + Send + Sync>;

/// Receives the target, whether the action may run, the reason and the
/// blocking features.
pub type CanExecuteDeploymentActionCallback =
    Arc<dyn Fn(FeatureType, bool, DeploymentActionBlockedReason, &[FeatureType]) + Send + Sync>;

impl DeploymentResponse {
    /// Invoke `callback` once and return the result code.
    pub fn dispatch(&self, callback: &DeploymentResponseCallback) -> ResultCode {
        let (features, statuses): (Vec<FeatureType>, Vec<FeatureStatus>) = self
            .statuses
            .iter()
            .map(|report| (report.feature, report.status))
            .unzip();
        callback(&features, &statuses, self.result_code);
        self.result_code
    }
}

impl DeploymentActionCheck {
    /// Invoke `callback` once and return whether the action may run.
    pub fn dispatch(&self, callback: &CanExecuteDeploymentActionCallback) -> bool {
        callback(
            self.target_feature,
            self.can_execute,
            self.reason,
            &self.blocking_features,
        );
        self.can_execute
    }
}
