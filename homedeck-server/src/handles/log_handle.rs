use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Extension, Json, Router, middleware};
use homedeck_api::models::*;

use crate::errors::ApiError;
use crate::middlewares::{TokenState, auth};
use crate::repositories::ActivityLogRepository;
use crate::services::TokenClaims;

#[derive(Clone)]
pub struct LogState {
    pub activity_log_repository: Arc<ActivityLogRepository>,
}

pub fn log_router(log_state: LogState, token_state: TokenState) -> Router {
    Router::new()
        .route("/api/logs", get(get_logs))
        .route_layer(middleware::from_fn_with_state(token_state, auth))
        .with_state(log_state)
}

#[utoipa::path(
    get,
    path = "/api/logs",
    tag = "log",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Most recent activity, newest first", body = Vec<ActivityLogResponse>),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    )
)]
pub async fn get_logs(
    Extension(token_data): Extension<TokenClaims>,
    State(state): State<LogState>,
) -> Result<Json<Vec<ActivityLogResponse>>, ApiError> {
    let entries = state
        .activity_log_repository
        .find_by_user_id(token_data.sub)
        .await?;

    Ok(Json(entries.into_iter().map(ActivityLogResponse::from).collect()))
}
