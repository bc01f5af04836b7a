use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, put};
use axum::{Extension, Json, Router, middleware};
use homedeck_api::models::*;
use time::OffsetDateTime;
use validator::Validate;

use crate::errors::{ApiError, HomeError};
use crate::middlewares::{TokenState, auth};
use crate::models::Home;
use crate::repositories::{ActivityLogRepository, HomeRepository, RoomRepository};
use crate::services::{PermissionService, TokenClaims};

#[derive(Clone)]
pub struct HomeState {
    pub home_repository: Arc<HomeRepository>,
    pub room_repository: Arc<RoomRepository>,
    pub activity_log_repository: Arc<ActivityLogRepository>,
    pub permission_service: Arc<PermissionService>,
}

pub fn home_router(home_state: HomeState, token_state: TokenState) -> Router {
    Router::new()
        .route("/api/homes", get(get_homes).post(create_home))
        .route("/api/homes/:home_id", put(update_home).delete(delete_home))
        .route("/api/homes/:home_id/rooms", get(get_rooms_by_home_id))
        .route_layer(middleware::from_fn_with_state(token_state, auth))
        .with_state(home_state)
}

#[utoipa::path(
    get,
    path = "/api/homes",
    tag = "home",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Homes owned by the current user", body = Vec<HomeResponse>),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    )
)]
pub async fn get_homes(
    Extension(token_data): Extension<TokenClaims>,
    State(state): State<HomeState>,
) -> Result<Json<Vec<HomeResponse>>, ApiError> {
    let homes = state.home_repository.find_by_owner_id(token_data.sub).await?;

    Ok(Json(homes.into_iter().map(HomeResponse::from).collect()))
}

#[utoipa::path(
    post,
    path = "/api/homes",
    tag = "home",
    request_body = CreateHomeRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Home created", body = HomeResponse),
        (status = 400, description = "Invalid request parameters", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    )
)]
pub async fn create_home(
    Extension(token_data): Extension<TokenClaims>,
    State(state): State<HomeState>,
    Json(body): Json<CreateHomeRequest>,
) -> Result<Json<HomeResponse>, ApiError> {
    body.validate()?;

    let now = OffsetDateTime::now_utc();
    let home = Home {
        id: 0,
        owner_id: token_data.sub,
        name: body.name,
        location: body.location,
        created_at: now,
        updated_at: now,
    };

    let mut tx = state.home_repository.get_pool().begin().await?;

    let home_id = state.home_repository.create(&home, &mut tx).await?;
    state
        .activity_log_repository
        .append(
            token_data.sub,
            &format!("New home created: {}", home.name),
            LogSeverity::Info,
            &mut tx,
        )
        .await?;

    tx.commit().await?;

    let created_home = state
        .home_repository
        .find_by_id(home_id)
        .await?
        .ok_or(HomeError::HomeNotFound)?;

    Ok(Json(created_home.into()))
}

#[utoipa::path(
    put,
    path = "/api/homes/{home_id}",
    tag = "home",
    params(
        ("home_id" = i32, Path, description = "Home ID")
    ),
    request_body = UpdateHomeRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Home updated", body = HomeResponse),
        (status = 400, description = "Invalid request parameters", body = ErrorResponse),
        (status = 403, description = "Home belongs to another user", body = ErrorResponse),
        (status = 404, description = "Home not found", body = ErrorResponse)
    )
)]
pub async fn update_home(
    Extension(token_data): Extension<TokenClaims>,
    State(state): State<HomeState>,
    Path(home_id): Path<i32>,
    Json(body): Json<UpdateHomeRequest>,
) -> Result<Json<HomeResponse>, ApiError> {
    body.validate()?;

    let mut home = state
        .permission_service
        .owned_home(token_data.sub, home_id)
        .await?;

    if let Some(name) = body.name {
        home.name = name;
    }
    if body.location.is_some() {
        home.location = body.location;
    }

    let mut tx = state.home_repository.get_pool().begin().await?;

    state.home_repository.update(home_id, &home, &mut tx).await?;
    state
        .activity_log_repository
        .append(
            token_data.sub,
            &format!("Home updated: {}", home.name),
            LogSeverity::Info,
            &mut tx,
        )
        .await?;

    tx.commit().await?;

    let updated_home = state
        .home_repository
        .find_by_id(home_id)
        .await?
        .ok_or(HomeError::HomeNotFound)?;

    Ok(Json(updated_home.into()))
}

#[utoipa::path(
    delete,
    path = "/api/homes/{home_id}",
    tag = "home",
    params(
        ("home_id" = i32, Path, description = "Home ID")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 204, description = "Home and its rooms deleted, devices released"),
        (status = 403, description = "Home belongs to another user", body = ErrorResponse),
        (status = 404, description = "Home not found", body = ErrorResponse)
    )
)]
pub async fn delete_home(
    Extension(token_data): Extension<TokenClaims>,
    State(state): State<HomeState>,
    Path(home_id): Path<i32>,
) -> Result<StatusCode, ApiError> {
    let home = state
        .permission_service
        .owned_home(token_data.sub, home_id)
        .await?;

    let mut tx = state.home_repository.get_pool().begin().await?;

    state.home_repository.delete(home_id, &mut tx).await?;
    state
        .activity_log_repository
        .append(
            token_data.sub,
            &format!("Home deleted: {}", home.name),
            LogSeverity::Warning,
            &mut tx,
        )
        .await?;

    tx.commit().await?;

    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/homes/{home_id}/rooms",
    tag = "room",
    params(
        ("home_id" = i32, Path, description = "Home ID")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Rooms of the home, empty once the home is gone", body = Vec<RoomResponse>),
        (status = 403, description = "Home belongs to another user", body = ErrorResponse)
    )
)]
pub async fn get_rooms_by_home_id(
    Extension(token_data): Extension<TokenClaims>,
    State(state): State<HomeState>,
    Path(home_id): Path<i32>,
) -> Result<Json<Vec<RoomResponse>>, ApiError> {
    match state.permission_service.owned_home(token_data.sub, home_id).await {
        Ok(_) => {}
        Err(ApiError::HomeError(HomeError::HomeNotFound)) => return Ok(Json(Vec::new())),
        Err(e) => return Err(e),
    }

    let rooms = state.room_repository.find_by_home_id(home_id).await?;

    Ok(Json(rooms.into_iter().map(RoomResponse::from).collect()))
}
