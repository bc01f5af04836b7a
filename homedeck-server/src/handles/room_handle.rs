use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Extension, Json, Router, middleware};
use homedeck_api::models::*;
use time::OffsetDateTime;
use validator::Validate;

use crate::errors::{ApiError, RoomError};
use crate::middlewares::{TokenState, auth};
use crate::models::Room;
use crate::repositories::{ActivityLogRepository, DeviceRepository, RoomRepository};
use crate::services::{PermissionService, TokenClaims};

#[derive(Clone)]
pub struct RoomState {
    pub room_repository: Arc<RoomRepository>,
    pub device_repository: Arc<DeviceRepository>,
    pub activity_log_repository: Arc<ActivityLogRepository>,
    pub permission_service: Arc<PermissionService>,
}

pub fn room_router(room_state: RoomState, token_state: TokenState) -> Router {
    Router::new()
        .route("/api/rooms", post(create_room))
        .route(
            "/api/rooms/:room_id",
            get(get_room).put(update_room).delete(delete_room),
        )
        .route("/api/rooms/:room_id/devices", get(get_devices_by_room_id))
        .route_layer(middleware::from_fn_with_state(token_state, auth))
        .with_state(room_state)
}

#[utoipa::path(
    post,
    path = "/api/rooms",
    tag = "room",
    request_body = CreateRoomRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Room created", body = RoomResponse),
        (status = 400, description = "Invalid request parameters", body = ErrorResponse),
        (status = 403, description = "Home belongs to another user", body = ErrorResponse),
        (status = 404, description = "Home not found", body = ErrorResponse)
    )
)]
pub async fn create_room(
    Extension(token_data): Extension<TokenClaims>,
    State(state): State<RoomState>,
    Json(body): Json<CreateRoomRequest>,
) -> Result<Json<RoomResponse>, ApiError> {
    body.validate()?;

    state
        .permission_service
        .owned_home(token_data.sub, body.home_id)
        .await?;

    let now = OffsetDateTime::now_utc();
    let room = Room {
        id: 0,
        home_id: body.home_id,
        name: body.name,
        created_at: now,
        updated_at: now,
    };

    let mut tx = state.room_repository.get_pool().begin().await?;

    let room_id = state.room_repository.create(&room, &mut tx).await?;
    state
        .activity_log_repository
        .append(
            token_data.sub,
            &format!("Room added: {}", room.name),
            LogSeverity::Info,
            &mut tx,
        )
        .await?;

    tx.commit().await?;

    let created_room = state
        .room_repository
        .find_by_id(room_id)
        .await?
        .ok_or(RoomError::RoomNotFound)?;

    Ok(Json(created_room.into()))
}

#[utoipa::path(
    get,
    path = "/api/rooms/{room_id}",
    tag = "room",
    params(
        ("room_id" = i32, Path, description = "Room ID")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Room found", body = RoomResponse),
        (status = 403, description = "Room belongs to another user", body = ErrorResponse),
        (status = 404, description = "Room not found", body = ErrorResponse)
    )
)]
pub async fn get_room(
    Extension(token_data): Extension<TokenClaims>,
    State(state): State<RoomState>,
    Path(room_id): Path<i32>,
) -> Result<Json<RoomResponse>, ApiError> {
    let room = state
        .permission_service
        .owned_room(token_data.sub, room_id)
        .await?;

    Ok(Json(room.into()))
}

#[utoipa::path(
    put,
    path = "/api/rooms/{room_id}",
    tag = "room",
    params(
        ("room_id" = i32, Path, description = "Room ID")
    ),
    request_body = UpdateRoomRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Room updated", body = RoomResponse),
        (status = 400, description = "Invalid request parameters", body = ErrorResponse),
        (status = 403, description = "Room belongs to another user", body = ErrorResponse),
        (status = 404, description = "Room not found", body = ErrorResponse)
    )
)]
pub async fn update_room(
    Extension(token_data): Extension<TokenClaims>,
    State(state): State<RoomState>,
    Path(room_id): Path<i32>,
    Json(body): Json<UpdateRoomRequest>,
) -> Result<Json<RoomResponse>, ApiError> {
    body.validate()?;

    let mut room = state
        .permission_service
        .owned_room(token_data.sub, room_id)
        .await?;

    if let Some(name) = body.name {
        room.name = name;
    }

    let mut tx = state.room_repository.get_pool().begin().await?;

    state.room_repository.update(room_id, &room, &mut tx).await?;
    state
        .activity_log_repository
        .append(
            token_data.sub,
            &format!("Room updated: {}", room.name),
            LogSeverity::Info,
            &mut tx,
        )
        .await?;

    tx.commit().await?;

    let updated_room = state
        .room_repository
        .find_by_id(room_id)
        .await?
        .ok_or(RoomError::RoomNotFound)?;

    Ok(Json(updated_room.into()))
}

#[utoipa::path(
    delete,
    path = "/api/rooms/{room_id}",
    tag = "room",
    params(
        ("room_id" = i32, Path, description = "Room ID")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 204, description = "Room deleted, devices released"),
        (status = 403, description = "Room belongs to another user", body = ErrorResponse),
        (status = 404, description = "Room not found", body = ErrorResponse)
    )
)]
pub async fn delete_room(
    Extension(token_data): Extension<TokenClaims>,
    State(state): State<RoomState>,
    Path(room_id): Path<i32>,
) -> Result<StatusCode, ApiError> {
    let room = state
        .permission_service
        .owned_room(token_data.sub, room_id)
        .await?;

    let mut tx = state.room_repository.get_pool().begin().await?;

    state.room_repository.delete(room_id, &mut tx).await?;
    state
        .activity_log_repository
        .append(
            token_data.sub,
            &format!("Room deleted: {}", room.name),
            LogSeverity::Warning,
            &mut tx,
        )
        .await?;

    tx.commit().await?;

    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/rooms/{room_id}/devices",
    tag = "device",
    params(
        ("room_id" = i32, Path, description = "Room ID")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Devices placed in the room, empty once the room is gone", body = Vec<DeviceResponse>),
        (status = 403, description = "Room belongs to another user", body = ErrorResponse)
    )
)]
pub async fn get_devices_by_room_id(
    Extension(token_data): Extension<TokenClaims>,
    State(state): State<RoomState>,
    Path(room_id): Path<i32>,
) -> Result<Json<Vec<DeviceResponse>>, ApiError> {
    match state.permission_service.owned_room(token_data.sub, room_id).await {
        Ok(_) => {}
        Err(ApiError::RoomError(RoomError::RoomNotFound)) => return Ok(Json(Vec::new())),
        Err(e) => return Err(e),
    }

    let devices = state
        .device_repository
        .find_by_room_id(room_id)
        .await?
        .into_iter()
        .map(DeviceResponse::try_from)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Json(devices))
}
