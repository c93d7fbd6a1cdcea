//! Mock account provider for testing.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::RwLock;

use crate::provider::{AccountProvider, ProviderError};
use crate::result_code::ResultCode;

/// Mock implementation of the AccountProvider trait.
#[derive(Debug)]
pub struct MockAccount {
    valid_credentials: AtomicBool,
    stage_deployments: AtomicUsize,
    credential_checks: AtomicUsize,
    /// If set, the next stage deployment fails with this code.
    next_error: RwLock<Option<ResultCode>>,
}

impl MockAccount {
    /// Account whose credentials are accepted.
    pub fn new() -> Self {
        Self {
            valid_credentials: AtomicBool::new(true),
            stage_deployments: AtomicUsize::new(0),
            credential_checks: AtomicUsize::new(0),
            next_error: RwLock::new(None),
        }
    }

    /// Account whose credentials the provider refuses.
    pub fn rejecting() -> Self {
        let account = Self::new();
        account.set_valid_credentials(false);
        account
    }

    pub fn set_valid_credentials(&self, valid: bool) {
        self.valid_credentials.store(valid, Ordering::SeqCst);
    }

    /// Fail the next stage deployment with `code`.
    pub fn fail_next_stage_deployment(&self, code: ResultCode) {
        *self.next_error.write().unwrap() = Some(code);
    }

    /// Successful and failed stage deployments attempted so far.
    pub fn stage_deployments(&self) -> usize {
        self.stage_deployments.load(Ordering::SeqCst)
    }

    pub fn credential_checks(&self) -> usize {
        self.credential_checks.load(Ordering::SeqCst)
    }
}

impl Default for MockAccount {
    fn default() -> Self {
        Self::new()
    }
}

impl AccountProvider for MockAccount {
    fn deploy_api_gateway_stage(&self) -> Result<(), ProviderError> {
        self.stage_deployments.fetch_add(1, Ordering::SeqCst);
        match self.next_error.write().unwrap().take() {
            Some(code) => Err(ProviderError::new(code, "mock stage deployment failed")),
            None => Ok(()),
        }
    }

    fn has_valid_credentials(&self) -> bool {
        self.credential_checks.fetch_add(1, Ordering::SeqCst);
        self.valid_credentials.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_failure_is_one_shot() {
        let account = MockAccount::new();
        account.fail_next_stage_deployment(ResultCode::APIGATEWAY_STAGE_DEPLOYMENT_FAILED);

        assert_eq!(
            account.deploy_api_gateway_stage().unwrap_err().code,
            ResultCode::APIGATEWAY_STAGE_DEPLOYMENT_FAILED
        );
        assert!(account.deploy_api_gateway_stage().is_ok());
        assert_eq!(account.stage_deployments(), 2);
    }

    #[test]
    fn test_rejecting() {
        let account = MockAccount::rejecting();
        assert!(!account.has_valid_credentials());
        assert_eq!(account.credential_checks(), 1);
    }
}
