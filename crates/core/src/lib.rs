pub mod account;
pub mod config;
pub mod feature;
pub mod metrics;
pub mod orchestrator;
pub mod provider;
pub mod result_code;
pub mod settings;
pub mod testing;

pub use account::{AccountCredentials, AccountInfo, AccountSession, RegionError, RegionMappings};
pub use config::{
    load_config, load_config_from_str, validate_config, AccountConfig, Config, ConfigError,
    SanitizedConfig, ServerConfig,
};
pub use feature::{
    DependencyGraph, DeploymentAction, DeploymentActionBlockedReason, FeatureStatus,
    FeatureStatusSummary, FeatureType, GraphError,
};
pub use orchestrator::{
    CanExecuteDeploymentActionCallback, DeploymentActionCheck, DeploymentOrchestrator,
    DeploymentResponse, DeploymentResponseCallback, FeatureStatusReport, OrchestratorConfig,
    OrchestratorError, OrchestratorStatus,
};
pub use provider::{
    AccountProvider, CommandConfig, CommandProviderFactory, FeatureResourcesProvider,
    ProviderError, ProviderFactory, StackResource,
};
pub use result_code::ResultCode;
pub use settings::{FeatureSettings, SettingsError};
