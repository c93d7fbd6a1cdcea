//! Deployment orchestrator implementation.
//!
//! Every public call is synchronous. Create/redeploy/delete follow the same
//! template:
//! 1. refresh the statuses the action depends on
//! 2. re-run the gate and mark the plan in progress (one critical section)
//! 3. run the per-feature sequence, upstream first
//! 4. clear the in-progress flags, whatever the outcome

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Instant;

use tracing::{debug, error, info, warn};

use crate::account::{AccountCredentials, AccountInfo, AccountSession, RegionMappings};
use crate::feature::{
    DependencyGraph, DeploymentAction, DeploymentActionBlockedReason, FeatureStatus,
    FeatureStatusStore, FeatureStatusSummary, FeatureType,
};
use crate::metrics;
use crate::provider::{
    AccountProvider, FeatureResourcesProvider, ProviderError, ProviderFactory, StackResource,
};
use crate::settings::FeatureSettings;

use super::gate::Gate;
use super::types::{
    DeploymentActionCheck, DeploymentResponse, FeatureStatusReport, OrchestratorError,
    OrchestratorStatus,
};

/// One feature of an action plan.
#[derive(Debug, Clone, Copy)]
struct PlannedStep {
    feature: FeatureType,
    /// Generate on-disk artifacts before deploying.
    create: bool,
}

/// Decides whether deployment actions are safe and drives them through the
/// collaborators.
pub struct DeploymentOrchestrator {
    graph: DependencyGraph,
    regions: RegionMappings,
    settings: FeatureSettings,
    factory: Arc<dyn ProviderFactory>,

    // Runtime state
    store: RwLock<FeatureStatusStore>,
    session: RwLock<AccountSession>,
    credentials_rejected: AtomicBool,
    feature_resources: Mutex<HashMap<FeatureType, Arc<dyn FeatureResourcesProvider>>>,
    account: Mutex<Option<Arc<dyn AccountProvider>>>,
}

impl DeploymentOrchestrator {
    /// Create an orchestrator with the standard dependency graph and the
    /// built-in region table.
    pub fn new(factory: Arc<dyn ProviderFactory>) -> Self {
        Self {
            graph: DependencyGraph::default(),
            regions: RegionMappings::default(),
            settings: FeatureSettings::default(),
            factory,
            store: RwLock::new(FeatureStatusStore::new()),
            session: RwLock::new(AccountSession::default()),
            credentials_rejected: AtomicBool::new(false),
            feature_resources: Mutex::new(HashMap::new()),
            account: Mutex::new(None),
        }
    }

    pub fn with_graph(mut self, graph: DependencyGraph) -> Self {
        self.graph = graph;
        self
    }

    pub fn with_region_mappings(mut self, regions: RegionMappings) -> Self {
        self.regions = regions;
        self
    }

    pub fn with_feature_settings(mut self, settings: FeatureSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn graph(&self) -> &DependencyGraph {
        &self.graph
    }

    // =========================================================================
    // Credentials
    // =========================================================================

    /// Switch to a new account session.
    ///
    /// Refused while any deployment runs. On success the cached collaborators
    /// and every known status are dropped, since game or environment may
    /// have changed.
    pub fn set_credentials(
        &self,
        info: AccountInfo,
        credentials: AccountCredentials,
    ) -> Result<(), OrchestratorError> {
        let mut store = self.store.write().unwrap();

        let in_progress = store.in_progress_features();
        if !in_progress.is_empty() {
            warn!(features = ?in_progress, "Refusing to change credentials during a deployment");
            return Err(OrchestratorError::DeploymentInProgress(in_progress));
        }

        let short_region_code = match self.regions.five_letter_code(&credentials.region) {
            Ok(code) => code.to_string(),
            Err(e) => {
                error!(region = %credentials.region, error = %e, "Region code conversion failed");
                return Err(e.into());
            }
        };

        let session = AccountSession::new(info, credentials, &short_region_code);
        info!(
            game = %session.info.game_name,
            environment = %session.info.environment,
            region = %session.region,
            short_region_code = %session.short_region_code,
            "Account credentials set"
        );

        {
            let mut current = self.session.write().unwrap();
            *current = session;
            self.credentials_rejected.store(false, Ordering::SeqCst);
            self.feature_resources.lock().unwrap().clear();
            *self.account.lock().unwrap() = None;
        }
        store.reset();

        Ok(())
    }

    /// Session is complete and the provider has not rejected it.
    pub fn credentials_valid(&self) -> bool {
        self.session.read().unwrap().is_complete()
            && !self.credentials_rejected.load(Ordering::SeqCst)
    }

    // =========================================================================
    // Status queries
    // =========================================================================

    pub fn get_feature_status(&self, feature: FeatureType) -> FeatureStatus {
        self.store.read().unwrap().status(feature)
    }

    pub fn get_feature_status_summary(&self, feature: FeatureType) -> FeatureStatusSummary {
        self.get_feature_status(feature).summary()
    }

    pub fn is_feature_deployment_in_progress(&self, feature: FeatureType) -> bool {
        self.store.read().unwrap().is_in_progress(feature)
    }

    /// The feature is not in a resting status. `Unknown` counts as updating.
    pub fn is_feature_updating(&self, feature: FeatureType) -> bool {
        !self.get_feature_status(feature).is_at_rest()
    }

    pub fn is_any_feature_updating(&self) -> bool {
        let store = self.store.read().unwrap();
        self.graph
            .features()
            .iter()
            .any(|f| !store.status(*f).is_at_rest())
    }

    /// Reports for every feature, upstream first.
    pub fn feature_statuses(&self) -> Vec<FeatureStatusReport> {
        let store = self.store.read().unwrap();
        self.graph
            .features()
            .iter()
            .map(|f| report(&store, *f))
            .collect()
    }

    pub fn status(&self) -> OrchestratorStatus {
        let in_progress = self.store.read().unwrap().in_progress_features();
        OrchestratorStatus {
            credentials_valid: self.credentials_valid(),
            credentials_rejected: self.credentials_rejected.load(Ordering::SeqCst),
            in_progress,
            features: self.feature_statuses(),
        }
    }

    // =========================================================================
    // Refresh
    // =========================================================================

    /// Re-read one feature's status from its collaborator.
    pub fn refresh_feature_status(&self, feature: FeatureType) -> DeploymentResponse {
        self.refresh_features(&[feature], false);
        let store = self.store.read().unwrap();
        DeploymentResponse::success(vec![report(&store, feature)])
    }

    /// Re-read every feature's status, upstream first.
    pub fn refresh_feature_statuses(&self) -> DeploymentResponse {
        let features = self.graph.features().to_vec();
        self.refresh_features(&features, false);
        DeploymentResponse::success(self.feature_statuses())
    }

    /// Read and store the status of each feature, in order.
    ///
    /// With `keep_in_progress`, features whose deployment is running keep the
    /// phase status their sequence wrote.
    fn refresh_features(&self, features: &[FeatureType], keep_in_progress: bool) {
        for &feature in features {
            let status = match self.feature_resources(feature).current_stack_status() {
                Ok(raw) => {
                    let status = FeatureStatus::from_stack_status(&raw);
                    debug!(feature = %feature, raw = %raw, status = %status, "Refreshed feature status");
                    metrics::FEATURE_REFRESHES.with_label_values(&["ok"]).inc();
                    status
                }
                Err(e) => {
                    warn!(feature = %feature, code = %e.code, error = %e.message, "Failed to read stack status");
                    metrics::FEATURE_REFRESHES.with_label_values(&["error"]).inc();
                    FeatureStatus::Error
                }
            };
            let mut store = self.store.write().unwrap();
            if keep_in_progress && store.is_in_progress(feature) {
                debug!(feature = %feature, "Keeping status of feature under deployment");
                continue;
            }
            store.set_status(feature, status);
        }
    }

    /// Resources of `feature`'s stack, as its collaborator lists them.
    pub fn describe_feature_resources(
        &self,
        feature: FeatureType,
    ) -> Result<Vec<StackResource>, OrchestratorError> {
        match self.feature_resources(feature).describe_stack_resources() {
            Ok(resources) => {
                debug!(
                    feature = %feature,
                    count = resources.len(),
                    "Described feature resources"
                );
                Ok(resources)
            }
            Err(e) => {
                warn!(
                    feature = %feature,
                    code = %e.code,
                    error = %e.message,
                    "Failed to describe feature resources"
                );
                Err(e.into())
            }
        }
    }

    // =========================================================================
    // Gates
    // =========================================================================

    pub fn can_create_feature(&self, feature: FeatureType) -> DeploymentActionCheck {
        self.check(DeploymentAction::Create, feature)
    }

    pub fn can_redeploy_feature(&self, feature: FeatureType) -> DeploymentActionCheck {
        self.check(DeploymentAction::Redeploy, feature)
    }

    pub fn can_delete_feature(&self, feature: FeatureType) -> DeploymentActionCheck {
        self.check(DeploymentAction::Delete, feature)
    }

    /// Evaluate the gate for `action` against the cached state.
    pub fn check(&self, action: DeploymentAction, feature: FeatureType) -> DeploymentActionCheck {
        let store = self.store.read().unwrap();
        Gate {
            graph: &self.graph,
            store: &store,
            credentials_valid: self.credentials_valid(),
        }
        .check(action, feature)
    }

    // =========================================================================
    // Actions
    // =========================================================================

    /// Create `feature`, (re)deploying `Main` first.
    pub fn create_feature(&self, feature: FeatureType) -> DeploymentResponse {
        self.run_action(DeploymentAction::Create, feature)
    }

    /// Redeploy `feature`, (re)deploying `Main` first.
    pub fn redeploy_feature(&self, feature: FeatureType) -> DeploymentResponse {
        self.run_action(DeploymentAction::Redeploy, feature)
    }

    /// Delete `feature`'s stack. Dependents must already be undeployed.
    pub fn delete_feature(&self, feature: FeatureType) -> DeploymentResponse {
        self.run_action(DeploymentAction::Delete, feature)
    }

    fn run_action(&self, action: DeploymentAction, target: FeatureType) -> DeploymentResponse {
        let started = Instant::now();
        info!(action = %action, feature = %target, "Starting deployment action");

        let outcome = self.try_run_action(action, target);
        let statuses = self.feature_statuses();

        let (result, response) = match &outcome {
            Ok(()) => {
                info!(
                    action = %action,
                    feature = %target,
                    duration_ms = started.elapsed().as_millis() as u64,
                    "Deployment action completed"
                );
                ("success", DeploymentResponse::success(statuses))
            }
            Err(e @ OrchestratorError::InvalidFeatureState { .. }) => {
                ("blocked", DeploymentResponse::failure(e, statuses))
            }
            Err(e) => {
                error!(
                    action = %action,
                    feature = %target,
                    code = %e.code(),
                    error = %e,
                    "Deployment action failed"
                );
                ("failed", DeploymentResponse::failure(e, statuses))
            }
        };

        metrics::DEPLOYMENT_ACTIONS
            .with_label_values(&[action.as_str(), result])
            .inc();
        metrics::DEPLOYMENT_DURATION
            .with_label_values(&[action.as_str()])
            .observe(started.elapsed().as_secs_f64());

        response
    }

    fn try_run_action(
        &self,
        action: DeploymentAction,
        target: FeatureType,
    ) -> Result<(), OrchestratorError> {
        self.ensure_credentials(action, target)?;

        let chain = match action {
            DeploymentAction::Create | DeploymentAction::Redeploy => {
                let mut chain = self.graph.upstream_of(target);
                chain.insert(FeatureType::Main);
                chain.insert(target);
                chain
            }
            DeploymentAction::Delete => {
                let mut chain = self.graph.downstream_of(target);
                chain.insert(target);
                chain
            }
        };
        self.refresh_features(&self.graph.sorted(chain), true);

        let plan = self.begin(action, target)?;
        let result = match action {
            DeploymentAction::Delete => self.delete_plan(&plan),
            _ => self.deploy_plan(&plan),
        };
        self.end(&plan);
        result
    }

    /// Reject the action up front when the session cannot be used.
    fn ensure_credentials(
        &self,
        action: DeploymentAction,
        target: FeatureType,
    ) -> Result<(), OrchestratorError> {
        let invalid = || {
            DeploymentActionCheck::blocked(
                target,
                DeploymentActionBlockedReason::CredentialsInvalid,
                Vec::new(),
            )
        };

        if !self.credentials_valid() {
            return Err(self.blocked(action, invalid()));
        }

        if !self.account().has_valid_credentials() {
            self.credentials_rejected.store(true, Ordering::SeqCst);
            return Err(self.blocked(action, invalid()));
        }

        Ok(())
    }

    /// Gate the action against fresh state and mark its plan in progress.
    fn begin(
        &self,
        action: DeploymentAction,
        target: FeatureType,
    ) -> Result<Vec<PlannedStep>, OrchestratorError> {
        let mut store = self.store.write().unwrap();

        let check = {
            let gate = Gate {
                graph: &self.graph,
                store: &store,
                credentials_valid: self.credentials_valid(),
            };
            match action {
                DeploymentAction::Delete => gate.check(action, target),
                _ => gate.check_deploy_plan(action, target),
            }
        };
        if !check.can_execute {
            return Err(self.blocked(action, check));
        }

        let plan: Vec<PlannedStep> = match action {
            DeploymentAction::Delete => vec![PlannedStep {
                feature: target,
                create: false,
            }],
            _ => self
                .graph
                .sorted([FeatureType::Main, target])
                .into_iter()
                .map(|feature| PlannedStep {
                    feature,
                    create: match (action, feature == target) {
                        (DeploymentAction::Redeploy, true) => false,
                        _ => matches!(
                            store.status(feature),
                            FeatureStatus::Undeployed | FeatureStatus::Error
                        ),
                    },
                })
                .collect(),
        };

        for step in &plan {
            store.set_in_progress(step.feature, true);
        }
        debug!(action = %action, plan = ?plan, "Deployment plan started");

        Ok(plan)
    }

    fn end(&self, plan: &[PlannedStep]) {
        let mut store = self.store.write().unwrap();
        for step in plan {
            store.set_in_progress(step.feature, false);
        }
    }

    fn blocked(&self, action: DeploymentAction, check: DeploymentActionCheck) -> OrchestratorError {
        warn!(
            action = %action,
            feature = %check.target_feature,
            reason = %check.reason,
            blocking = ?check.blocking_features,
            "Deployment action blocked"
        );
        metrics::GATE_BLOCKED
            .with_label_values(&[action.as_str(), check.reason.as_str()])
            .inc();
        OrchestratorError::InvalidFeatureState { action, check }
    }

    fn deploy_plan(&self, plan: &[PlannedStep]) -> Result<(), OrchestratorError> {
        for step in plan {
            if let Err(e) = self.settings.validate(step.feature) {
                error!(feature = %step.feature, error = %e, "Feature settings are invalid");
                self.set_feature_status(step.feature, FeatureStatus::Error);
                return Err(e.into());
            }

            if let Err(e) = self.deploy_feature(*step) {
                error!(
                    feature = %step.feature,
                    code = %e.code,
                    error = %e.message,
                    "Feature deployment failed"
                );
                self.set_feature_status(step.feature, FeatureStatus::Error);
                return Err(e.into());
            }

            self.set_feature_status(step.feature, FeatureStatus::Deployed);
            info!(feature = %step.feature, "Feature deployed");
        }
        Ok(())
    }

    fn deploy_feature(&self, step: PlannedStep) -> Result<(), ProviderError> {
        let feature = step.feature;
        let resources = self.feature_resources(feature);

        if step.create {
            self.enter_phase(feature, FeatureStatus::GeneratingTemplates);
            if !resources.is_cloudformation_instance_template_present() {
                resources.save_cloudformation_instance()?;
            }
            if !resources.are_layer_instances_present() {
                resources.save_layer_instances()?;
            }
            if !resources.are_function_instances_present() {
                resources.save_function_instances()?;
            }
        }

        self.enter_phase(feature, FeatureStatus::UploadingDashboards);
        resources.upload_dashboard(self.graph.features())?;

        self.enter_phase(feature, FeatureStatus::UploadingLayers);
        resources.deploy_feature_layers()?;

        self.enter_phase(feature, FeatureStatus::UploadingFunctions);
        resources.deploy_feature_functions()?;

        self.enter_phase(feature, FeatureStatus::DeployingResources);
        resources.create_or_update_feature_stack()?;
        self.account().deploy_api_gateway_stage()?;

        Ok(())
    }

    fn delete_plan(&self, plan: &[PlannedStep]) -> Result<(), OrchestratorError> {
        for step in plan {
            self.enter_phase(step.feature, FeatureStatus::DeletingResources);
            if let Err(e) = self.feature_resources(step.feature).delete_feature_stack() {
                error!(
                    feature = %step.feature,
                    code = %e.code,
                    error = %e.message,
                    "Feature deletion failed"
                );
                self.set_feature_status(step.feature, FeatureStatus::Error);
                return Err(e.into());
            }
            self.set_feature_status(step.feature, FeatureStatus::Undeployed);
            info!(feature = %step.feature, "Feature deleted");
        }
        Ok(())
    }

    fn enter_phase(&self, feature: FeatureType, status: FeatureStatus) {
        debug!(feature = %feature, phase = %status, "Entering deployment phase");
        self.set_feature_status(feature, status);
    }

    // =========================================================================
    // Internals
    // =========================================================================

    pub(crate) fn set_feature_status(&self, feature: FeatureType, status: FeatureStatus) {
        self.store.write().unwrap().set_status(feature, status);
    }

    pub(crate) fn set_deployment_in_progress(&self, feature: FeatureType, in_progress: bool) {
        self.store
            .write()
            .unwrap()
            .set_in_progress(feature, in_progress);
    }

    fn feature_resources(&self, feature: FeatureType) -> Arc<dyn FeatureResourcesProvider> {
        let session = self.session.read().unwrap();
        let mut cache = self.feature_resources.lock().unwrap();
        cache
            .entry(feature)
            .or_insert_with(|| self.factory.feature_resources(feature, &session))
            .clone()
    }

    fn account(&self) -> Arc<dyn AccountProvider> {
        let session = self.session.read().unwrap();
        let mut account = self.account.lock().unwrap();
        account
            .get_or_insert_with(|| self.factory.account(&session))
            .clone()
    }
}

fn report(store: &FeatureStatusStore, feature: FeatureType) -> FeatureStatusReport {
    let entry = store.entry(feature);
    FeatureStatusReport {
        feature,
        status: entry.status,
        summary: entry.status.summary(),
        deployment_in_progress: entry.deployment_in_progress,
        updated_at: entry.updated_at,
    }
}
