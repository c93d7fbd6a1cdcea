use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::middleware::{api_key_middleware, metrics_middleware};
use super::{credentials, features, handlers};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    // API routes
    let api_routes = Router::new()
        // Health and config
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        // Account
        .route("/credentials", put(credentials::set_credentials))
        // Feature status
        .route("/features", get(features::list_features))
        .route("/features/refresh", post(features::refresh_all))
        .route(
            "/features/{feature}",
            get(features::get_feature).delete(features::delete_feature),
        )
        .route("/features/{feature}/refresh", post(features::refresh_feature))
        .route("/features/{feature}/resources", get(features::describe_resources))
        // Gates
        .route("/features/{feature}/can-create", get(features::can_create))
        .route("/features/{feature}/can-redeploy", get(features::can_redeploy))
        .route("/features/{feature}/can-delete", get(features::can_delete))
        // Actions
        .route("/features/{feature}/create", post(features::create_feature))
        .route("/features/{feature}/redeploy", post(features::redeploy_feature))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            api_key_middleware,
        ))
        .with_state(state.clone());

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/metrics", get(handlers::metrics))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
