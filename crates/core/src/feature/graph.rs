//! Static feature dependency graph.
//!
//! The graph is built from an explicit `feature -> direct upstream` table.
//! Downstream edges are derived by inverting that table, and the whole thing
//! is validated once at construction.

use std::collections::{BTreeMap, BTreeSet};

use thiserror::Error;

use super::types::FeatureType;

/// Table of direct upstream dependencies per feature.
pub type DependencyTable = BTreeMap<FeatureType, BTreeSet<FeatureType>>;

/// Errors raised while validating a dependency table.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    #[error("feature {0} has no entry in the dependency table")]
    MissingFeature(FeatureType),

    #[error("feature {0} depends on itself")]
    SelfDependency(FeatureType),

    #[error("main must not depend on other features (found {0})")]
    MainHasUpstream(FeatureType),

    #[error("feature {0} does not depend on main")]
    NotRootedInMain(FeatureType),

    #[error("dependency cycle involving: {}", format_features(.0))]
    Cycle(Vec<FeatureType>),
}

fn format_features(features: &[FeatureType]) -> String {
    features
        .iter()
        .map(|f| f.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// The built-in dependency table.
pub fn standard_dependencies() -> DependencyTable {
    use FeatureType::*;

    let mut table = DependencyTable::new();
    table.insert(Main, BTreeSet::new());
    table.insert(Identity, BTreeSet::from([Main]));
    table.insert(Achievements, BTreeSet::from([Main, Identity]));
    table.insert(GameStateCloudSaving, BTreeSet::from([Main, Identity]));
    table.insert(UserGameplayData, BTreeSet::from([Main, Identity]));
    table
}

/// Validated, immutable dependency graph.
#[derive(Debug, Clone)]
pub struct DependencyGraph {
    upstream: DependencyTable,
    downstream: DependencyTable,
    /// Every feature, upstream first.
    order: Vec<FeatureType>,
}

impl DependencyGraph {
    /// Validate `table` and build the graph.
    pub fn new(table: DependencyTable) -> Result<Self, GraphError> {
        for feature in FeatureType::ALL {
            let deps = table
                .get(&feature)
                .ok_or(GraphError::MissingFeature(feature))?;
            if deps.contains(&feature) {
                return Err(GraphError::SelfDependency(feature));
            }
            if feature == FeatureType::Main {
                if let Some(first) = deps.iter().next() {
                    return Err(GraphError::MainHasUpstream(*first));
                }
            }
        }

        let mut downstream: DependencyTable = FeatureType::ALL
            .into_iter()
            .map(|f| (f, BTreeSet::new()))
            .collect();
        for (feature, deps) in &table {
            for dep in deps {
                downstream.entry(*dep).or_default().insert(*feature);
            }
        }

        let order = topological_order(&table)?;

        let graph = Self {
            upstream: table,
            downstream,
            order,
        };

        for feature in FeatureType::ALL {
            if feature != FeatureType::Main
                && !graph.upstream_of(feature).contains(&FeatureType::Main)
            {
                return Err(GraphError::NotRootedInMain(feature));
            }
        }

        Ok(graph)
    }

    /// All features in topological order (upstream first).
    pub fn features(&self) -> &[FeatureType] {
        &self.order
    }

    /// Direct upstream dependencies of `feature`.
    pub fn direct_upstream(&self, feature: FeatureType) -> &BTreeSet<FeatureType> {
        static EMPTY: BTreeSet<FeatureType> = BTreeSet::new();
        self.upstream.get(&feature).unwrap_or(&EMPTY)
    }

    /// Direct downstream dependents of `feature`.
    pub fn direct_downstream(&self, feature: FeatureType) -> &BTreeSet<FeatureType> {
        static EMPTY: BTreeSet<FeatureType> = BTreeSet::new();
        self.downstream.get(&feature).unwrap_or(&EMPTY)
    }

    /// Transitive upstream dependencies of `feature`, excluding itself.
    pub fn upstream_of(&self, feature: FeatureType) -> BTreeSet<FeatureType> {
        closure(&self.upstream, feature)
    }

    /// Transitive downstream dependents of `feature`, excluding itself.
    pub fn downstream_of(&self, feature: FeatureType) -> BTreeSet<FeatureType> {
        closure(&self.downstream, feature)
    }

    /// Sort `features` into topological order, dropping duplicates.
    pub fn sorted<I>(&self, features: I) -> Vec<FeatureType>
    where
        I: IntoIterator<Item = FeatureType>,
    {
        let wanted: BTreeSet<FeatureType> = features.into_iter().collect();
        self.order
            .iter()
            .copied()
            .filter(|f| wanted.contains(f))
            .collect()
    }
}

impl Default for DependencyGraph {
    fn default() -> Self {
        Self::new(standard_dependencies()).expect("standard dependency table is valid")
    }
}

fn closure(edges: &DependencyTable, start: FeatureType) -> BTreeSet<FeatureType> {
    let mut seen = BTreeSet::new();
    let mut stack: Vec<FeatureType> = edges
        .get(&start)
        .map(|s| s.iter().copied().collect())
        .unwrap_or_default();

    while let Some(next) = stack.pop() {
        if next == start || !seen.insert(next) {
            continue;
        }
        if let Some(more) = edges.get(&next) {
            stack.extend(more.iter().copied());
        }
    }
    seen
}

/// Kahn's algorithm. Ties are broken by `FeatureType` ordering so the result
/// is deterministic.
fn topological_order(table: &DependencyTable) -> Result<Vec<FeatureType>, GraphError> {
    let mut remaining: BTreeMap<FeatureType, BTreeSet<FeatureType>> = table.clone();
    let mut order = Vec::with_capacity(remaining.len());

    loop {
        let ready: Option<FeatureType> = remaining
            .iter()
            .find(|(_, deps)| deps.is_empty())
            .map(|(feature, _)| *feature);

        let Some(ready) = ready else { break };
        remaining.remove(&ready);
        for deps in remaining.values_mut() {
            deps.remove(&ready);
        }
        order.push(ready);
    }

    if remaining.is_empty() {
        Ok(order)
    } else {
        Err(GraphError::Cycle(remaining.keys().copied().collect()))
    }
}
