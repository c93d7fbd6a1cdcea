//! Feature status, gating and deployment handlers.
//!
//! Every orchestrator call blocks on provider commands, so each one runs on
//! the blocking pool.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::error;

use gamekit_deploy_core::{
    DeploymentAction, DeploymentActionCheck, DeploymentOrchestrator, DeploymentResponse,
    FeatureStatusReport, FeatureType, OrchestratorStatus, ResultCode, StackResource,
};

use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

pub type ApiError = (StatusCode, Json<ErrorResponse>);

/// Body returned by refresh and mutating actions.
#[derive(Debug, Serialize)]
pub struct DeploymentResponseBody {
    pub result_code: ResultCode,
    pub success: bool,
    pub statuses: Vec<FeatureStatusReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl From<DeploymentResponse> for DeploymentResponseBody {
    fn from(response: DeploymentResponse) -> Self {
        Self {
            success: response.is_success(),
            result_code: response.result_code,
            statuses: response.statuses,
            message: response.message,
        }
    }
}

/// One feature's status plus whether it is in a transitional state.
#[derive(Debug, Serialize)]
pub struct FeatureDetail {
    #[serde(flatten)]
    pub report: FeatureStatusReport,
    pub updating: bool,
}

/// Resources of one feature's stack.
#[derive(Debug, Serialize)]
pub struct FeatureResourcesBody {
    pub feature: FeatureType,
    pub result_code: ResultCode,
    pub success: bool,
    pub resources: Vec<StackResource>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

// ============================================================================
// Helpers
// ============================================================================

fn parse_feature(raw: &str) -> Result<FeatureType, ApiError> {
    raw.parse::<FeatureType>().map_err(|e| {
        (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: e.to_string(),
            }),
        )
    })
}

/// Run an orchestrator call on the blocking pool.
pub(crate) async fn run_blocking<T, F>(state: &AppState, f: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&DeploymentOrchestrator) -> T + Send + 'static,
{
    let orchestrator = Arc::clone(state.orchestrator());
    tokio::task::spawn_blocking(move || f(&orchestrator))
        .await
        .map_err(|e| {
            error!(error = %e, "Orchestrator task failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "orchestrator task failed".to_string(),
                }),
            )
        })
}

fn action_reply(response: DeploymentResponse) -> (StatusCode, Json<DeploymentResponseBody>) {
    let status = if response.is_success() {
        StatusCode::OK
    } else {
        StatusCode::CONFLICT
    };
    (status, Json(DeploymentResponseBody::from(response)))
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /features
pub async fn list_features(State(state): State<Arc<AppState>>) -> Json<OrchestratorStatus> {
    Json(state.orchestrator().status())
}

/// GET /features/{feature}
pub async fn get_feature(
    State(state): State<Arc<AppState>>,
    Path(feature): Path<String>,
) -> Result<Json<FeatureDetail>, ApiError> {
    let feature = parse_feature(&feature)?;
    let orchestrator = state.orchestrator();

    let report = orchestrator
        .feature_statuses()
        .into_iter()
        .find(|r| r.feature == feature)
        .ok_or_else(|| {
            (
                StatusCode::NOT_FOUND,
                Json(ErrorResponse {
                    error: format!("feature not managed: {}", feature),
                }),
            )
        })?;

    Ok(Json(FeatureDetail {
        report,
        updating: orchestrator.is_feature_updating(feature),
    }))
}

/// GET /features/{feature}/resources
///
/// A provider failure is reported as 502 with its result code.
pub async fn describe_resources(
    State(state): State<Arc<AppState>>,
    Path(feature): Path<String>,
) -> Result<(StatusCode, Json<FeatureResourcesBody>), ApiError> {
    let feature = parse_feature(&feature)?;
    let outcome = run_blocking(&state, move |o| o.describe_feature_resources(feature)).await?;

    let reply = match outcome {
        Ok(resources) => (
            StatusCode::OK,
            FeatureResourcesBody {
                feature,
                result_code: ResultCode::SUCCESS,
                success: true,
                resources,
                message: None,
            },
        ),
        Err(e) => (
            StatusCode::BAD_GATEWAY,
            FeatureResourcesBody {
                feature,
                result_code: e.code(),
                success: false,
                resources: Vec::new(),
                message: Some(e.to_string()),
            },
        ),
    };
    Ok((reply.0, Json(reply.1)))
}

/// POST /features/refresh
pub async fn refresh_all(
    State(state): State<Arc<AppState>>,
) -> Result<Json<DeploymentResponseBody>, ApiError> {
    let response = run_blocking(&state, |o| o.refresh_feature_statuses()).await?;
    Ok(Json(response.into()))
}

/// POST /features/{feature}/refresh
pub async fn refresh_feature(
    State(state): State<Arc<AppState>>,
    Path(feature): Path<String>,
) -> Result<Json<DeploymentResponseBody>, ApiError> {
    let feature = parse_feature(&feature)?;
    let response = run_blocking(&state, move |o| o.refresh_feature_status(feature)).await?;
    Ok(Json(response.into()))
}

async fn check(
    state: &AppState,
    action: DeploymentAction,
    feature: &str,
) -> Result<Json<DeploymentActionCheck>, ApiError> {
    let feature = parse_feature(feature)?;
    Ok(Json(state.orchestrator().check(action, feature)))
}

/// GET /features/{feature}/can-create
pub async fn can_create(
    State(state): State<Arc<AppState>>,
    Path(feature): Path<String>,
) -> Result<Json<DeploymentActionCheck>, ApiError> {
    check(&state, DeploymentAction::Create, &feature).await
}

/// GET /features/{feature}/can-redeploy
pub async fn can_redeploy(
    State(state): State<Arc<AppState>>,
    Path(feature): Path<String>,
) -> Result<Json<DeploymentActionCheck>, ApiError> {
    check(&state, DeploymentAction::Redeploy, &feature).await
}

/// GET /features/{feature}/can-delete
pub async fn can_delete(
    State(state): State<Arc<AppState>>,
    Path(feature): Path<String>,
) -> Result<Json<DeploymentActionCheck>, ApiError> {
    check(&state, DeploymentAction::Delete, &feature).await
}

/// POST /features/{feature}/create
pub async fn create_feature(
    State(state): State<Arc<AppState>>,
    Path(feature): Path<String>,
) -> Result<(StatusCode, Json<DeploymentResponseBody>), ApiError> {
    let feature = parse_feature(&feature)?;
    let response = run_blocking(&state, move |o| o.create_feature(feature)).await?;
    Ok(action_reply(response))
}

/// POST /features/{feature}/redeploy
pub async fn redeploy_feature(
    State(state): State<Arc<AppState>>,
    Path(feature): Path<String>,
) -> Result<(StatusCode, Json<DeploymentResponseBody>), ApiError> {
    let feature = parse_feature(&feature)?;
    let response = run_blocking(&state, move |o| o.redeploy_feature(feature)).await?;
    Ok(action_reply(response))
}

/// DELETE /features/{feature}
pub async fn delete_feature(
    State(state): State<Arc<AppState>>,
    Path(feature): Path<String>,
) -> Result<(StatusCode, Json<DeploymentResponseBody>), ApiError> {
    let feature = parse_feature(&feature)?;
    let response = run_blocking(&state, move |o| o.delete_feature(feature)).await?;
    Ok(action_reply(response))
}
