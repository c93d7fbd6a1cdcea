use std::sync::Arc;

use gamekit_deploy_core::{Config, DeploymentOrchestrator, SanitizedConfig};

/// Shared application state
pub struct AppState {
    config: Config,
    orchestrator: Arc<DeploymentOrchestrator>,
}

impl AppState {
    pub fn new(config: Config, orchestrator: Arc<DeploymentOrchestrator>) -> Self {
        Self {
            config,
            orchestrator,
        }
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    /// Key required on `/api/v1` requests, if any.
    pub fn api_key(&self) -> Option<&str> {
        self.config
            .server
            .api_key
            .as_deref()
            .filter(|k| !k.is_empty())
    }

    pub fn orchestrator(&self) -> &Arc<DeploymentOrchestrator> {
        &self.orchestrator
    }
}
