//! In-memory feature status store.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::types::{FeatureStatus, FeatureType};

/// Per-feature entry.
///
/// `deployment_in_progress` is a reentrancy flag owned by the orchestrator.
/// It is independent of `status` because the provider's view can lag an
/// operation that has already started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
pub struct FeatureStatusEntry {
    pub status: FeatureStatus,
    pub deployment_in_progress: bool,
    /// When `status` last changed. Rewriting the same status keeps it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Status map owned by one orchestrator instance.
///
/// Entries are created lazily; a feature never written reads as
/// `Unknown` and not in progress.
#[derive(Debug, Default)]
pub struct FeatureStatusStore {
    entries: HashMap<FeatureType, FeatureStatusEntry>,
}

impl FeatureStatusStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entry(&self, feature: FeatureType) -> FeatureStatusEntry {
        self.entries.get(&feature).copied().unwrap_or_default()
    }

    pub fn status(&self, feature: FeatureType) -> FeatureStatus {
        self.entry(feature).status
    }

    pub fn is_in_progress(&self, feature: FeatureType) -> bool {
        self.entry(feature).deployment_in_progress
    }

    pub fn set_status(&mut self, feature: FeatureType, status: FeatureStatus) {
        let entry = self.entries.entry(feature).or_default();
        if entry.updated_at.is_none() || entry.status != status {
            entry.status = status;
            entry.updated_at = Some(Utc::now());
        }
    }

    pub fn set_in_progress(&mut self, feature: FeatureType, in_progress: bool) {
        self.entries.entry(feature).or_default().deployment_in_progress = in_progress;
    }

    /// Features currently flagged as in progress.
    pub fn in_progress_features(&self) -> Vec<FeatureType> {
        let mut features: Vec<FeatureType> = self
            .entries
            .iter()
            .filter(|(_, e)| e.deployment_in_progress)
            .map(|(f, _)| *f)
            .collect();
        features.sort();
        features
    }

    /// Drop every entry.
    pub fn reset(&mut self) {
        self.entries.clear();
    }
}
