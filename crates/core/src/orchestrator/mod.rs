//! Deployment orchestrator.
//!
//! Owns the feature status store and decides whether create, redeploy and
//! delete actions are safe to run:
//! - **Gates**: pure checks over credentials, in-progress flags, own status
//!   and dependency status
//! - **Actions**: refresh, gate and mark in one critical section, then drive
//!   the collaborators upstream first
//! - **Refresh**: overwrite cached statuses from the provider

mod callback;
mod config;
mod gate;
mod runner;
mod types;

pub use callback::{CanExecuteDeploymentActionCallback, DeploymentResponseCallback};
pub use config::OrchestratorConfig;
pub use runner::DeploymentOrchestrator;
pub use types::{
    DeploymentActionCheck, DeploymentResponse, FeatureStatusReport, OrchestratorError,
    OrchestratorStatus,
};
