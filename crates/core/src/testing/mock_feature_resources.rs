//! Mock feature resources for testing.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::feature::FeatureType;
use crate::provider::{FeatureResourcesProvider, ProviderError, StackResource};
use crate::result_code::ResultCode;

/// Hook run at the start of every recorded call, with the call name.
pub type CallHook = Arc<dyn Fn(&'static str) + Send + Sync>;

/// Mock implementation of the FeatureResourcesProvider trait.
///
/// Behaves like a small in-memory provider:
/// - `create_or_update_feature_stack` moves the stack to `UPDATE_COMPLETE`
/// - `delete_feature_stack` moves it to `DELETE_COMPLETE` and forgets its
///   resources
/// - save operations make the matching presence check return true
///
/// Every call is recorded by name, and any call can be scripted to fail.
///
/// # Example
///
/// ```rust,ignore
/// use gamekit_deploy_core::testing::MockFeatureResources;
///
/// let resources = MockFeatureResources::new(FeatureType::Identity);
/// resources.set_stack_status("CREATE_COMPLETE");
/// resources.fail_next("deploy_feature_layers", ResultCode::LAYER_CREATION_FAILED);
///
/// // ... run the orchestrator ...
///
/// assert!(resources.calls().contains(&"deploy_feature_layers"));
/// ```
pub struct MockFeatureResources {
    feature: FeatureType,
    stack_status: RwLock<String>,
    template_present: RwLock<bool>,
    layers_present: RwLock<bool>,
    functions_present: RwLock<bool>,
    resources: RwLock<Vec<StackResource>>,
    /// Recorded call names, in order.
    calls: RwLock<Vec<&'static str>>,
    /// Feature lists passed to `upload_dashboard`.
    dashboards: RwLock<Vec<Vec<FeatureType>>>,
    /// One-shot failures by call name.
    next_failures: RwLock<HashMap<&'static str, ResultCode>>,
    /// Failures applied to every matching call.
    failures: RwLock<HashMap<&'static str, ResultCode>>,
    hook: RwLock<Option<CallHook>>,
}

impl MockFeatureResources {
    /// Undeployed stack with no artifacts on disk.
    pub fn new(feature: FeatureType) -> Self {
        Self {
            feature,
            stack_status: RwLock::new("UNDEPLOYED".to_string()),
            template_present: RwLock::new(false),
            layers_present: RwLock::new(false),
            functions_present: RwLock::new(false),
            resources: RwLock::new(Vec::new()),
            calls: RwLock::new(Vec::new()),
            dashboards: RwLock::new(Vec::new()),
            next_failures: RwLock::new(HashMap::new()),
            failures: RwLock::new(HashMap::new()),
            hook: RwLock::new(None),
        }
    }

    /// Set the raw status the provider reports.
    pub fn set_stack_status(&self, raw: &str) {
        *self.stack_status.write().unwrap() = raw.to_string();
    }

    pub fn stack_status(&self) -> String {
        self.stack_status.read().unwrap().clone()
    }

    /// Set the resources `describe_stack_resources` lists.
    pub fn set_resources(&self, resources: Vec<StackResource>) {
        *self.resources.write().unwrap() = resources;
    }

    /// Mark every on-disk artifact as present (or absent).
    pub fn set_artifacts_present(&self, present: bool) {
        *self.template_present.write().unwrap() = present;
        *self.layers_present.write().unwrap() = present;
        *self.functions_present.write().unwrap() = present;
    }

    /// Fail the next call named `call` with `code`.
    pub fn fail_next(&self, call: &'static str, code: ResultCode) {
        self.next_failures.write().unwrap().insert(call, code);
    }

    /// Fail every call named `call` with `code` until cleared.
    pub fn fail_always(&self, call: &'static str, code: ResultCode) {
        self.failures.write().unwrap().insert(call, code);
    }

    pub fn clear_failures(&self) {
        self.next_failures.write().unwrap().clear();
        self.failures.write().unwrap().clear();
    }

    /// Run `hook` at the start of every call.
    pub fn on_call(&self, hook: CallHook) {
        *self.hook.write().unwrap() = Some(hook);
    }

    /// Recorded call names, in order.
    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.read().unwrap().clone()
    }

    pub fn call_count(&self, call: &str) -> usize {
        self.calls
            .read()
            .unwrap()
            .iter()
            .filter(|c| **c == call)
            .count()
    }

    pub fn clear_calls(&self) {
        self.calls.write().unwrap().clear();
    }

    /// Feature lists passed to `upload_dashboard`.
    pub fn dashboards(&self) -> Vec<Vec<FeatureType>> {
        self.dashboards.read().unwrap().clone()
    }

    fn record(&self, call: &'static str) -> Result<(), ProviderError> {
        let hook = self.hook.read().unwrap().clone();
        if let Some(hook) = hook {
            hook(call);
        }

        self.calls.write().unwrap().push(call);

        let code = self
            .next_failures
            .write()
            .unwrap()
            .remove(call)
            .or_else(|| self.failures.read().unwrap().get(call).copied());
        match code {
            Some(code) => Err(ProviderError::new(
                code,
                format!("mock {} failed for {}", call, self.feature),
            )),
            None => Ok(()),
        }
    }
}

impl FeatureResourcesProvider for MockFeatureResources {
    fn feature(&self) -> FeatureType {
        self.feature
    }

    fn is_cloudformation_instance_template_present(&self) -> bool {
        self.record("is_cloudformation_instance_template_present").is_ok()
            && *self.template_present.read().unwrap()
    }

    fn are_layer_instances_present(&self) -> bool {
        self.record("are_layer_instances_present").is_ok() && *self.layers_present.read().unwrap()
    }

    fn are_function_instances_present(&self) -> bool {
        self.record("are_function_instances_present").is_ok()
            && *self.functions_present.read().unwrap()
    }

    fn save_cloudformation_instance(&self) -> Result<(), ProviderError> {
        self.record("save_cloudformation_instance")?;
        *self.template_present.write().unwrap() = true;
        Ok(())
    }

    fn save_layer_instances(&self) -> Result<(), ProviderError> {
        self.record("save_layer_instances")?;
        *self.layers_present.write().unwrap() = true;
        Ok(())
    }

    fn save_function_instances(&self) -> Result<(), ProviderError> {
        self.record("save_function_instances")?;
        *self.functions_present.write().unwrap() = true;
        Ok(())
    }

    fn upload_dashboard(&self, all_features: &[FeatureType]) -> Result<(), ProviderError> {
        self.record("upload_dashboard")?;
        self.dashboards.write().unwrap().push(all_features.to_vec());
        Ok(())
    }

    fn deploy_feature_layers(&self) -> Result<(), ProviderError> {
        self.record("deploy_feature_layers")
    }

    fn deploy_feature_functions(&self) -> Result<(), ProviderError> {
        self.record("deploy_feature_functions")
    }

    fn create_or_update_feature_stack(&self) -> Result<(), ProviderError> {
        self.record("create_or_update_feature_stack")?;
        self.set_stack_status("UPDATE_COMPLETE");
        Ok(())
    }

    fn delete_feature_stack(&self) -> Result<(), ProviderError> {
        self.record("delete_feature_stack")?;
        self.set_stack_status("DELETE_COMPLETE");
        self.resources.write().unwrap().clear();
        Ok(())
    }

    fn current_stack_status(&self) -> Result<String, ProviderError> {
        self.record("current_stack_status")?;
        Ok(self.stack_status())
    }

    fn describe_stack_resources(&self) -> Result<Vec<StackResource>, ProviderError> {
        self.record("describe_stack_resources")?;
        Ok(self.resources.read().unwrap().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stack_follows_operations() {
        let resources = MockFeatureResources::new(FeatureType::Main);
        assert_eq!(resources.current_stack_status().unwrap(), "UNDEPLOYED");

        resources.create_or_update_feature_stack().unwrap();
        assert_eq!(resources.current_stack_status().unwrap(), "UPDATE_COMPLETE");

        resources.set_resources(vec![StackResource::new(
            "MainApi",
            "AWS::ApiGateway::RestApi",
            "UPDATE_COMPLETE",
        )]);
        assert_eq!(resources.describe_stack_resources().unwrap().len(), 1);

        resources.delete_feature_stack().unwrap();
        assert_eq!(resources.current_stack_status().unwrap(), "DELETE_COMPLETE");
        assert!(resources.describe_stack_resources().unwrap().is_empty());
    }

    #[test]
    fn test_save_marks_artifacts_present() {
        let resources = MockFeatureResources::new(FeatureType::Main);
        assert!(!resources.is_cloudformation_instance_template_present());
        resources.save_cloudformation_instance().unwrap();
        assert!(resources.is_cloudformation_instance_template_present());
    }

    #[test]
    fn test_fail_next_is_one_shot() {
        let resources = MockFeatureResources::new(FeatureType::Main);
        resources.fail_next("deploy_feature_layers", ResultCode::LAYER_CREATION_FAILED);

        let err = resources.deploy_feature_layers().unwrap_err();
        assert_eq!(err.code, ResultCode::LAYER_CREATION_FAILED);
        assert!(resources.deploy_feature_layers().is_ok());
        assert_eq!(resources.call_count("deploy_feature_layers"), 2);
    }

    #[test]
    fn test_fail_always() {
        let resources = MockFeatureResources::new(FeatureType::Main);
        resources.fail_always("current_stack_status", ResultCode::GENERAL);
        assert!(resources.current_stack_status().is_err());
        assert!(resources.current_stack_status().is_err());

        resources.clear_failures();
        assert!(resources.current_stack_status().is_ok());
    }

    #[test]
    fn test_hook_sees_calls() {
        let resources = MockFeatureResources::new(FeatureType::Main);
        let seen = Arc::new(RwLock::new(Vec::new()));
        let sink = seen.clone();
        resources.on_call(Arc::new(move |call| sink.write().unwrap().push(call)));

        resources.deploy_feature_functions().unwrap();
        assert_eq!(*seen.read().unwrap(), vec!["deploy_feature_functions"]);
    }
}
