//! Mock provider factory for testing.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::account::AccountSession;
use crate::feature::FeatureType;
use crate::provider::{AccountProvider, FeatureResourcesProvider, ProviderFactory};

use super::mock_account::MockAccount;
use super::mock_feature_resources::MockFeatureResources;

/// Hands out one shared mock per feature, plus one shared account mock.
///
/// The mocks outlive sessions, so a test can script them before or after
/// the orchestrator asks for them.
pub struct MockProviderFactory {
    resources: Mutex<HashMap<FeatureType, Arc<MockFeatureResources>>>,
    account: Arc<MockAccount>,
    /// Sessions seen by every build call, in order.
    sessions: Mutex<Vec<AccountSession>>,
}

impl MockProviderFactory {
    pub fn new() -> Self {
        Self::with_account(MockAccount::new())
    }

    pub fn with_account(account: MockAccount) -> Self {
        Self {
            resources: Mutex::new(HashMap::new()),
            account: Arc::new(account),
            sessions: Mutex::new(Vec::new()),
        }
    }

    /// The mock backing `feature`, created on first use.
    pub fn resources(&self, feature: FeatureType) -> Arc<MockFeatureResources> {
        self.resources
            .lock()
            .unwrap()
            .entry(feature)
            .or_insert_with(|| Arc::new(MockFeatureResources::new(feature)))
            .clone()
    }

    pub fn mock_account(&self) -> Arc<MockAccount> {
        self.account.clone()
    }

    /// Set raw stack statuses for several features at once.
    pub fn set_stack_statuses(&self, statuses: &[(FeatureType, &str)]) {
        for (feature, raw) in statuses {
            self.resources(*feature).set_stack_status(raw);
        }
    }

    /// Number of collaborators built so far.
    pub fn sessions_built(&self) -> usize {
        self.sessions.lock().unwrap().len()
    }

    pub fn last_session(&self) -> Option<AccountSession> {
        self.sessions.lock().unwrap().last().cloned()
    }

    /// Calls recorded across every feature mock.
    pub fn total_calls(&self) -> usize {
        self.resources
            .lock()
            .unwrap()
            .values()
            .map(|r| r.calls().len())
            .sum::<usize>()
            + self.account.stage_deployments()
            + self.account.credential_checks()
    }
}

impl Default for MockProviderFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl ProviderFactory for MockProviderFactory {
    fn feature_resources(
        &self,
        feature: FeatureType,
        session: &AccountSession,
    ) -> Arc<dyn FeatureResourcesProvider> {
        self.sessions.lock().unwrap().push(session.clone());
        self.resources(feature)
    }

    fn account(&self, session: &AccountSession) -> Arc<dyn AccountProvider> {
        self.sessions.lock().unwrap().push(session.clone());
        self.account.clone()
    }
}
