//! Collaborators backed by an external program.
//!
//! Every provider operation runs the configured program once, passing the
//! operation name (and feature key when relevant) as trailing arguments and
//! the account session through `GAMEKIT_*` environment variables.
//!
//! Exit status 0 means success. On failure the program may print a
//! `GAMEKIT_RESULT=0x...` line on stdout to report a precise result code;
//! otherwise the operation's default code is used.

use std::process::{Command, Output, Stdio};
use std::sync::Arc;

use once_cell::sync::Lazy;
use regex_lite::Regex;
use tracing::{debug, warn};

use super::config::CommandConfig;
use super::error::ProviderError;
use super::resource::{parse_stack_resources, StackResource};
use super::traits::{AccountProvider, FeatureResourcesProvider, ProviderFactory};
use crate::account::AccountSession;
use crate::feature::FeatureType;
use crate::orchestrator::OrchestratorConfig;
use crate::result_code::ResultCode;

static RESULT_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^GAMEKIT_RESULT=(0[xX][0-9a-fA-F]+|[0-9]+)\s*$").unwrap());

/// Provider operations understood by the external program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    TemplatePresent,
    LayersPresent,
    FunctionsPresent,
    SaveTemplate,
    SaveLayers,
    SaveFunctions,
    UploadDashboard,
    DeployLayers,
    DeployFunctions,
    DeployStack,
    DeleteStack,
    StackStatus,
    DescribeResources,
    DeployApiStage,
    CheckCredentials,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::TemplatePresent => "template-present",
            Operation::LayersPresent => "layers-present",
            Operation::FunctionsPresent => "functions-present",
            Operation::SaveTemplate => "save-template",
            Operation::SaveLayers => "save-layers",
            Operation::SaveFunctions => "save-functions",
            Operation::UploadDashboard => "upload-dashboard",
            Operation::DeployLayers => "deploy-layers",
            Operation::DeployFunctions => "deploy-functions",
            Operation::DeployStack => "deploy-stack",
            Operation::DeleteStack => "delete-stack",
            Operation::StackStatus => "stack-status",
            Operation::DescribeResources => "describe-resources",
            Operation::DeployApiStage => "deploy-api-stage",
            Operation::CheckCredentials => "check-credentials",
        }
    }

    /// Code reported when the program fails without naming one.
    pub fn default_code(&self) -> ResultCode {
        match self {
            Operation::SaveTemplate | Operation::SaveLayers => {
                ResultCode::CLOUDFORMATION_FILE_SAVE_FAILED
            }
            Operation::SaveFunctions => ResultCode::FUNCTIONS_COPY_FAILED,
            Operation::DeployLayers => ResultCode::LAYER_CREATION_FAILED,
            Operation::DeployStack => ResultCode::CLOUDFORMATION_STACK_CREATION_FAILED,
            Operation::DeleteStack => ResultCode::CLOUDFORMATION_STACK_DELETE_FAILED,
            Operation::StackStatus => ResultCode::CLOUDFORMATION_DESCRIBE_STACKS_FAILED,
            Operation::DescribeResources => ResultCode::CLOUDFORMATION_DESCRIBE_RESOURCE_FAILED,
            Operation::DeployApiStage => ResultCode::APIGATEWAY_STAGE_DEPLOYMENT_FAILED,
            _ => ResultCode::GENERAL,
        }
    }
}

/// Extract a `GAMEKIT_RESULT=` code from program output.
pub fn parse_result_code(stdout: &str) -> Option<ResultCode> {
    RESULT_LINE
        .captures_iter(stdout)
        .last()
        .and_then(|caps| caps.get(1))
        .and_then(|m| ResultCode::parse(m.as_str()))
}

/// Spawns the external program for one account session.
#[derive(Debug)]
struct CommandRunner {
    command: CommandConfig,
    settings: OrchestratorConfig,
    session: AccountSession,
}

impl CommandRunner {
    fn build(
        &self,
        operation: Operation,
        feature: Option<FeatureType>,
        extra_env: &[(&str, String)],
    ) -> Command {
        let mut cmd = Command::new(&self.command.program);
        cmd.args(&self.command.args).arg(operation.as_str());
        if let Some(feature) = feature {
            cmd.arg(feature.as_str());
        }
        if let Some(dir) = &self.command.working_dir {
            cmd.current_dir(dir);
        }

        let session = &self.session;
        cmd.env("GAMEKIT_ENVIRONMENT", &session.info.environment)
            .env("GAMEKIT_ACCOUNT_ID", &session.account_id)
            .env("GAMEKIT_COMPANY_NAME", &session.info.company_name)
            .env("GAMEKIT_GAME_NAME", &session.info.game_name)
            .env("GAMEKIT_REGION", &session.region)
            .env("GAMEKIT_SHORT_REGION_CODE", &session.short_region_code)
            .env("GAMEKIT_ACCESS_KEY", &session.access_key)
            .env("GAMEKIT_ACCESS_SECRET", &session.access_secret)
            .env("GAMEKIT_BASE_TEMPLATES_FOLDER", &self.settings.base_templates_folder)
            .env("GAMEKIT_INSTANCE_FILES_FOLDER", &self.settings.instance_files_folder)
            .env("GAMEKIT_SOURCE_ENGINE", &self.settings.source_engine)
            .env("GAMEKIT_PLUGIN_VERSION", &self.settings.plugin_version);
        for (key, value) in extra_env {
            cmd.env(key, value);
        }

        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        cmd
    }

    fn output(
        &self,
        operation: Operation,
        feature: Option<FeatureType>,
        extra_env: &[(&str, String)],
    ) -> Result<Output, ProviderError> {
        debug!(
            program = %self.command.program,
            operation = operation.as_str(),
            feature = ?feature,
            "Running provider command"
        );
        self.build(operation, feature, extra_env)
            .output()
            .map_err(|e| {
                ProviderError::new(
                    operation.default_code(),
                    format!(
                        "failed to spawn {} for {}: {}",
                        self.command.program,
                        operation.as_str(),
                        e
                    ),
                )
            })
    }

    /// Run an operation, returning its stdout on success.
    fn run(
        &self,
        operation: Operation,
        feature: Option<FeatureType>,
        extra_env: &[(&str, String)],
    ) -> Result<String, ProviderError> {
        let output = self.output(operation, feature, extra_env)?;
        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();

        if output.status.success() {
            return Ok(stdout);
        }

        let code = parse_result_code(&stdout).unwrap_or_else(|| operation.default_code());
        let stderr = String::from_utf8_lossy(&output.stderr);
        let message = match stderr.trim() {
            "" => format!("{} exited with {}", operation.as_str(), output.status),
            detail => format!("{} failed: {}", operation.as_str(), detail),
        };
        warn!(
            operation = operation.as_str(),
            feature = ?feature,
            code = %code,
            "Provider command failed"
        );
        Err(ProviderError::new(code, message))
    }

    /// Run a yes/no probe. Spawn failures and non-zero exits both mean no.
    fn probe(&self, operation: Operation, feature: Option<FeatureType>) -> bool {
        match self.output(operation, feature, &[]) {
            Ok(output) => output.status.success(),
            Err(e) => {
                warn!(operation = operation.as_str(), error = %e, "Provider probe failed");
                false
            }
        }
    }
}

/// Feature resources driven by the external program.
#[derive(Debug)]
pub struct CommandFeatureResources {
    feature: FeatureType,
    runner: Arc<CommandRunner>,
}

impl FeatureResourcesProvider for CommandFeatureResources {
    fn feature(&self) -> FeatureType {
        self.feature
    }

    fn is_cloudformation_instance_template_present(&self) -> bool {
        self.runner
            .probe(Operation::TemplatePresent, Some(self.feature))
    }

    fn are_layer_instances_present(&self) -> bool {
        self.runner.probe(Operation::LayersPresent, Some(self.feature))
    }

    fn are_function_instances_present(&self) -> bool {
        self.runner
            .probe(Operation::FunctionsPresent, Some(self.feature))
    }

    fn save_cloudformation_instance(&self) -> Result<(), ProviderError> {
        self.runner
            .run(Operation::SaveTemplate, Some(self.feature), &[])
            .map(|_| ())
    }

    fn save_layer_instances(&self) -> Result<(), ProviderError> {
        self.runner
            .run(Operation::SaveLayers, Some(self.feature), &[])
            .map(|_| ())
    }

    fn save_function_instances(&self) -> Result<(), ProviderError> {
        self.runner
            .run(Operation::SaveFunctions, Some(self.feature), &[])
            .map(|_| ())
    }

    fn upload_dashboard(&self, all_features: &[FeatureType]) -> Result<(), ProviderError> {
        let keys = all_features
            .iter()
            .map(|f| f.as_str())
            .collect::<Vec<_>>()
            .join(",");
        self.runner
            .run(
                Operation::UploadDashboard,
                Some(self.feature),
                &[("GAMEKIT_ALL_FEATURES", keys)],
            )
            .map(|_| ())
    }

    fn deploy_feature_layers(&self) -> Result<(), ProviderError> {
        self.runner
            .run(Operation::DeployLayers, Some(self.feature), &[])
            .map(|_| ())
    }

    fn deploy_feature_functions(&self) -> Result<(), ProviderError> {
        self.runner
            .run(Operation::DeployFunctions, Some(self.feature), &[])
            .map(|_| ())
    }

    fn create_or_update_feature_stack(&self) -> Result<(), ProviderError> {
        self.runner
            .run(Operation::DeployStack, Some(self.feature), &[])
            .map(|_| ())
    }

    fn delete_feature_stack(&self) -> Result<(), ProviderError> {
        self.runner
            .run(Operation::DeleteStack, Some(self.feature), &[])
            .map(|_| ())
    }

    fn current_stack_status(&self) -> Result<String, ProviderError> {
        self.runner
            .run(Operation::StackStatus, Some(self.feature), &[])
            .map(|stdout| stdout.trim().to_string())
    }

    fn describe_stack_resources(&self) -> Result<Vec<StackResource>, ProviderError> {
        let stdout = self
            .runner
            .run(Operation::DescribeResources, Some(self.feature), &[])?;
        parse_stack_resources(&stdout)
    }
}

/// Account operations driven by the external program.
#[derive(Debug)]
pub struct CommandAccount {
    runner: Arc<CommandRunner>,
}

impl AccountProvider for CommandAccount {
    fn deploy_api_gateway_stage(&self) -> Result<(), ProviderError> {
        self.runner
            .run(Operation::DeployApiStage, None, &[])
            .map(|_| ())
    }

    fn has_valid_credentials(&self) -> bool {
        self.runner.probe(Operation::CheckCredentials, None)
    }
}

/// Builds command-backed collaborators.
#[derive(Debug, Clone)]
pub struct CommandProviderFactory {
    command: CommandConfig,
    settings: OrchestratorConfig,
}

impl CommandProviderFactory {
    pub fn new(command: CommandConfig, settings: OrchestratorConfig) -> Self {
        Self { command, settings }
    }

    fn runner(&self, session: &AccountSession) -> Arc<CommandRunner> {
        Arc::new(CommandRunner {
            command: self.command.clone(),
            settings: self.settings.clone(),
            session: session.clone(),
        })
    }
}

impl ProviderFactory for CommandProviderFactory {
    fn feature_resources(
        &self,
        feature: FeatureType,
        session: &AccountSession,
    ) -> Arc<dyn FeatureResourcesProvider> {
        Arc::new(CommandFeatureResources {
            feature,
            runner: self.runner(session),
        })
    }

    fn account(&self, session: &AccountSession) -> Arc<dyn AccountProvider> {
        Arc::new(CommandAccount {
            runner: self.runner(session),
        })
    }
}
