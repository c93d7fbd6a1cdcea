//! Features, their statuses and the dependency graph between them.

mod graph;
mod store;
mod types;

pub use graph::{standard_dependencies, DependencyGraph, DependencyTable, GraphError};
pub use store::{FeatureStatusEntry, FeatureStatusStore};
pub use types::{
    DeploymentAction, DeploymentActionBlockedReason, FeatureStatus, FeatureStatusSummary,
    FeatureType, UnknownFeatureError,
};
