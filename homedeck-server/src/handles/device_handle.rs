use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use axum::{Extension, Json, Router, middleware};
use homedeck_api::models::*;
use time::OffsetDateTime;
use validator::Validate;

use crate::errors::{ApiError, DeviceError};
use crate::middlewares::{TokenState, auth};
use crate::models::Device;
use crate::repositories::{ActivityLogRepository, DeviceRepository};
use crate::services::{PermissionService, TokenClaims};

#[derive(Clone)]
pub struct DeviceState {
    pub device_repository: Arc<DeviceRepository>,
    pub activity_log_repository: Arc<ActivityLogRepository>,
    pub permission_service: Arc<PermissionService>,
}

pub fn device_router(device_state: DeviceState, token_state: TokenState) -> Router {
    Router::new()
        .route("/api/devices", post(create_device))
        .route("/api/devices/lan", get(discover_devices))
        .route("/api/devices/:device_id", get(get_device).delete(unassign_device))
        .route("/api/devices/:device_id/room", put(assign_device))
        .route("/api/devices/:device_id/command", post(control_device))
        .route("/api/devices/:device_id/human-detection", post(toggle_human_detection))
        .route("/api/devices/:device_id/threshold", put(set_temperature_threshold))
        .route_layer(middleware::from_fn_with_state(token_state, auth))
        .with_state(device_state)
}

impl DeviceState {
    async fn load(&self, user_id: i32, device_id: i32) -> Result<DeviceResponse, ApiError> {
        let device = self
            .permission_service
            .accessible_device(user_id, device_id)
            .await?;

        Ok(DeviceResponse::try_from(device)?)
    }

    /// Writes the device together with its activity entry, then reads it back.
    async fn persist(
        &self,
        user_id: i32,
        device: &DeviceResponse,
        message: String,
        severity: LogSeverity,
    ) -> Result<DeviceResponse, ApiError> {
        let mut tx = self.device_repository.get_pool().begin().await?;

        self.device_repository
            .update(device.id, &Device::from(device), &mut tx)
            .await?;
        self.activity_log_repository
            .append(user_id, &message, severity, &mut tx)
            .await?;

        tx.commit().await?;

        let stored = self
            .device_repository
            .find_by_id(device.id)
            .await?
            .ok_or(DeviceError::DeviceNotFound)?;

        Ok(DeviceResponse::try_from(stored)?)
    }
}

#[utoipa::path(
    post,
    path = "/api/devices",
    tag = "device",
    request_body = CreateDeviceRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Device installed", body = DeviceResponse),
        (status = 400, description = "Invalid request parameters", body = ErrorResponse),
        (status = 403, description = "Room belongs to another user", body = ErrorResponse),
        (status = 404, description = "Room not found", body = ErrorResponse)
    )
)]
pub async fn create_device(
    Extension(token_data): Extension<TokenClaims>,
    State(state): State<DeviceState>,
    Json(body): Json<CreateDeviceRequest>,
) -> Result<Json<DeviceResponse>, ApiError> {
    body.validate()?;

    if let Some(room_id) = body.room_id {
        state
            .permission_service
            .owned_room(token_data.sub, room_id)
            .await?;
    }

    let device = DeviceResponse::from_request(0, &body, OffsetDateTime::now_utc())
        .map_err(DeviceError::from)?;

    let mut tx = state.device_repository.get_pool().begin().await?;

    let device_id = state
        .device_repository
        .create(&Device::from(&device), &mut tx)
        .await?;
    state
        .activity_log_repository
        .append(
            token_data.sub,
            &format!("Device installed: {}", device.name),
            LogSeverity::Info,
            &mut tx,
        )
        .await?;

    tx.commit().await?;

    let created_device = state
        .device_repository
        .find_by_id(device_id)
        .await?
        .ok_or(DeviceError::DeviceNotFound)?;

    tracing::debug!("installed {} device {}", device.device_type, device_id);

    Ok(Json(DeviceResponse::try_from(created_device)?))
}

#[utoipa::path(
    get,
    path = "/api/devices/lan",
    tag = "device",
    params(DiscoverQuery),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Unassigned devices announced on the network", body = Vec<DeviceResponse>),
        (status = 400, description = "Missing network identifier", body = ErrorResponse)
    )
)]
pub async fn discover_devices(
    State(state): State<DeviceState>,
    Query(query): Query<DiscoverQuery>,
) -> Result<Json<Vec<DeviceResponse>>, ApiError> {
    let bssid = query.bssid.trim();
    if bssid.is_empty() {
        return Err(DeviceError::MissingNetwork.into());
    }

    let devices = state
        .device_repository
        .find_unassigned_by_bssid(bssid)
        .await?
        .into_iter()
        .map(DeviceResponse::try_from)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Json(devices))
}

#[utoipa::path(
    get,
    path = "/api/devices/{device_id}",
    tag = "device",
    params(
        ("device_id" = i32, Path, description = "Device ID")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Device", body = DeviceResponse),
        (status = 403, description = "Device placed in another user's home", body = ErrorResponse),
        (status = 404, description = "Device not found", body = ErrorResponse)
    )
)]
pub async fn get_device(
    Extension(token_data): Extension<TokenClaims>,
    State(state): State<DeviceState>,
    Path(device_id): Path<i32>,
) -> Result<Json<DeviceResponse>, ApiError> {
    Ok(Json(state.load(token_data.sub, device_id).await?))
}

#[utoipa::path(
    delete,
    path = "/api/devices/{device_id}",
    tag = "device",
    params(
        ("device_id" = i32, Path, description = "Device ID")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 204, description = "Device removed from its room"),
        (status = 403, description = "Device placed in another user's home", body = ErrorResponse),
        (status = 404, description = "Device not found", body = ErrorResponse)
    )
)]
pub async fn unassign_device(
    Extension(token_data): Extension<TokenClaims>,
    State(state): State<DeviceState>,
    Path(device_id): Path<i32>,
) -> Result<StatusCode, ApiError> {
    let mut device = state.load(token_data.sub, device_id).await?;
    device.room_id = None;

    let message = format!("Device removed: {}", device.name);
    state
        .persist(token_data.sub, &device, message, LogSeverity::Warning)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    put,
    path = "/api/devices/{device_id}/room",
    tag = "device",
    params(
        ("device_id" = i32, Path, description = "Device ID")
    ),
    request_body = AssignDeviceRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Device placed in the room", body = DeviceResponse),
        (status = 403, description = "Device or room belongs to another user", body = ErrorResponse),
        (status = 404, description = "Device or room not found", body = ErrorResponse)
    )
)]
pub async fn assign_device(
    Extension(token_data): Extension<TokenClaims>,
    State(state): State<DeviceState>,
    Path(device_id): Path<i32>,
    Json(body): Json<AssignDeviceRequest>,
) -> Result<Json<DeviceResponse>, ApiError> {
    let mut device = state.load(token_data.sub, device_id).await?;
    let room = state
        .permission_service
        .owned_room(token_data.sub, body.room_id)
        .await?;

    device.room_id = Some(room.id);

    let message = format!("Device {} assigned to {}", device.name, room.name);
    let device = state
        .persist(token_data.sub, &device, message, LogSeverity::Info)
        .await?;

    Ok(Json(device))
}

#[utoipa::path(
    post,
    path = "/api/devices/{device_id}/command",
    tag = "device",
    params(
        ("device_id" = i32, Path, description = "Device ID")
    ),
    request_body = DeviceCommand,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Command applied", body = DeviceResponse),
        (status = 400, description = "Command not supported by the device", body = ErrorResponse),
        (status = 404, description = "Device not found", body = ErrorResponse)
    )
)]
pub async fn control_device(
    Extension(token_data): Extension<TokenClaims>,
    State(state): State<DeviceState>,
    Path(device_id): Path<i32>,
    Json(body): Json<DeviceCommand>,
) -> Result<Json<DeviceResponse>, ApiError> {
    let mut device = state.load(token_data.sub, device_id).await?;
    device.apply_command(&body).map_err(DeviceError::from)?;

    let message = format!("Device {} action: {}", device.name, body);
    let device = state
        .persist(token_data.sub, &device, message, LogSeverity::Info)
        .await?;

    Ok(Json(device))
}

#[utoipa::path(
    post,
    path = "/api/devices/{device_id}/human-detection",
    tag = "device",
    params(
        ("device_id" = i32, Path, description = "Device ID")
    ),
    request_body = HumanDetectionRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Human detection updated", body = DeviceResponse),
        (status = 400, description = "Device is not a camera", body = ErrorResponse),
        (status = 404, description = "Device not found", body = ErrorResponse)
    )
)]
pub async fn toggle_human_detection(
    Extension(token_data): Extension<TokenClaims>,
    State(state): State<DeviceState>,
    Path(device_id): Path<i32>,
    Json(body): Json<HumanDetectionRequest>,
) -> Result<Json<DeviceResponse>, ApiError> {
    let mut device = state.load(token_data.sub, device_id).await?;
    device
        .set_human_detection(body.enabled)
        .map_err(DeviceError::from)?;

    let status = if body.enabled { "enabled" } else { "disabled" };
    let message = format!("Human detection {} on {}", status, device.name);
    let device = state
        .persist(token_data.sub, &device, message, LogSeverity::Info)
        .await?;

    Ok(Json(device))
}

#[utoipa::path(
    put,
    path = "/api/devices/{device_id}/threshold",
    tag = "device",
    params(
        ("device_id" = i32, Path, description = "Device ID")
    ),
    request_body = ThresholdRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Threshold updated", body = DeviceResponse),
        (status = 400, description = "Device is not a sensor", body = ErrorResponse),
        (status = 404, description = "Device not found", body = ErrorResponse)
    )
)]
pub async fn set_temperature_threshold(
    Extension(token_data): Extension<TokenClaims>,
    State(state): State<DeviceState>,
    Path(device_id): Path<i32>,
    Json(body): Json<ThresholdRequest>,
) -> Result<Json<DeviceResponse>, ApiError> {
    let mut device = state.load(token_data.sub, device_id).await?;
    device
        .set_temperature_threshold(body.threshold)
        .map_err(DeviceError::from)?;

    let message = match body.threshold {
        Some(threshold) => format!("Threshold of {} set to {}°C", device.name, threshold),
        None => format!("Threshold of {} cleared", device.name),
    };
    let device = state
        .persist(token_data.sub, &device, message, LogSeverity::Info)
        .await?;

    Ok(Json(device))
}
