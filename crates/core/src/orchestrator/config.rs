//! Orchestrator configuration.

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::feature::{DependencyGraph, DependencyTable, FeatureType, GraphError};

/// Configuration for the deployment orchestrator and the collaborators it
/// builds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Folder holding the base feature templates.
    #[serde(default = "default_base_templates_folder")]
    pub base_templates_folder: PathBuf,

    /// Folder where per-game instance files are written.
    #[serde(default = "default_instance_files_folder")]
    pub instance_files_folder: PathBuf,

    /// Game engine the backend is generated for.
    #[serde(default = "default_source_engine")]
    pub source_engine: String,

    #[serde(default = "default_plugin_version")]
    pub plugin_version: String,

    /// Replacement dependency table (`feature = ["upstream", ...]`).
    /// When absent the built-in table is used.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dependencies: Option<BTreeMap<FeatureType, Vec<FeatureType>>>,
}

fn default_base_templates_folder() -> PathBuf {
    PathBuf::from("templates")
}

fn default_instance_files_folder() -> PathBuf {
    PathBuf::from("instance")
}

fn default_source_engine() -> String {
    "UNREAL".to_string()
}

fn default_plugin_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            base_templates_folder: default_base_templates_folder(),
            instance_files_folder: default_instance_files_folder(),
            source_engine: default_source_engine(),
            plugin_version: default_plugin_version(),
            dependencies: None,
        }
    }
}

impl OrchestratorConfig {
    /// Build and validate the dependency graph this config describes.
    pub fn dependency_graph(&self) -> Result<DependencyGraph, GraphError> {
        match &self.dependencies {
            None => Ok(DependencyGraph::default()),
            Some(deps) => {
                let table: DependencyTable = deps
                    .iter()
                    .map(|(feature, upstream)| {
                        (*feature, upstream.iter().copied().collect::<BTreeSet<_>>())
                    })
                    .collect();
                DependencyGraph::new(table)
            }
        }
    }
}
