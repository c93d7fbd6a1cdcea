//! Trait definitions for the collaborators the orchestrator drives.
//!
//! All calls are blocking. Implementations that talk to a remote service do
//! so synchronously from the orchestrator's point of view.

use std::sync::Arc;

use super::error::ProviderError;
use super::resource::StackResource;
use crate::account::AccountSession;
use crate::feature::FeatureType;

/// Per-feature resource operations.
pub trait FeatureResourcesProvider: Send + Sync {
    /// Returns the feature this provider acts on.
    fn feature(&self) -> FeatureType;

    /// Whether the instance template has already been written.
    fn is_cloudformation_instance_template_present(&self) -> bool;

    /// Whether layer instances have already been written.
    fn are_layer_instances_present(&self) -> bool;

    /// Whether function instances have already been written.
    fn are_function_instances_present(&self) -> bool;

    /// Generates and saves the instance template.
    fn save_cloudformation_instance(&self) -> Result<(), ProviderError>;

    /// Generates and saves the layer instances.
    fn save_layer_instances(&self) -> Result<(), ProviderError>;

    /// Generates and saves the function instances.
    fn save_function_instances(&self) -> Result<(), ProviderError>;

    /// Uploads the feature dashboard.
    ///
    /// `all_features` lets the dashboard link to its sibling features.
    fn upload_dashboard(&self, all_features: &[FeatureType]) -> Result<(), ProviderError>;

    fn deploy_feature_layers(&self) -> Result<(), ProviderError>;

    fn deploy_feature_functions(&self) -> Result<(), ProviderError>;

    fn create_or_update_feature_stack(&self) -> Result<(), ProviderError>;

    fn delete_feature_stack(&self) -> Result<(), ProviderError>;

    /// Raw provider status of the feature's stack (e.g. `CREATE_COMPLETE`).
    fn current_stack_status(&self) -> Result<String, ProviderError>;

    /// Resources currently in the feature's stack.
    fn describe_stack_resources(&self) -> Result<Vec<StackResource>, ProviderError>;
}

/// Account-wide operations.
pub trait AccountProvider: Send + Sync {
    /// Redeploys the shared gateway stage so new routes become reachable.
    fn deploy_api_gateway_stage(&self) -> Result<(), ProviderError>;

    /// Asks the provider whether the current credentials are accepted.
    fn has_valid_credentials(&self) -> bool;
}

/// Builds collaborators for an account session.
///
/// The orchestrator caches what this returns until the session changes.
pub trait ProviderFactory: Send + Sync {
    fn feature_resources(
        &self,
        feature: FeatureType,
        session: &AccountSession,
    ) -> Arc<dyn FeatureResourcesProvider>;

    fn account(&self, session: &AccountSession) -> Arc<dyn AccountProvider>;
}
