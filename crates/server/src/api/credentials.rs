//! Account credential handlers.

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use std::sync::Arc;

use gamekit_deploy_core::{AccountConfig, OrchestratorError, ResultCode};

use super::features::{run_blocking, ApiError};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct SetCredentialsResponse {
    pub result_code: ResultCode,
    pub success: bool,
    pub credentials_valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// PUT /credentials
///
/// Body uses the same flat shape as the `[account]` config table.
pub async fn set_credentials(
    State(state): State<Arc<AppState>>,
    Json(body): Json<AccountConfig>,
) -> Result<(StatusCode, Json<SetCredentialsResponse>), ApiError> {
    let (outcome, credentials_valid) = run_blocking(&state, move |o| {
        let outcome = o.set_credentials(body.info(), body.credentials());
        (outcome, o.credentials_valid())
    })
    .await?;

    let reply = match outcome {
        Ok(()) => (
            StatusCode::OK,
            SetCredentialsResponse {
                result_code: ResultCode::SUCCESS,
                success: true,
                credentials_valid,
                message: None,
            },
        ),
        Err(e) => {
            let status = match &e {
                OrchestratorError::DeploymentInProgress(_) => StatusCode::CONFLICT,
                _ => StatusCode::UNPROCESSABLE_ENTITY,
            };
            (
                status,
                SetCredentialsResponse {
                    result_code: e.code(),
                    success: false,
                    credentials_valid,
                    message: Some(e.to_string()),
                },
            )
        }
    };

    Ok((reply.0, Json(reply.1)))
}
