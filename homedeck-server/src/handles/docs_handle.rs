use axum::Json;
use axum::Router;
use axum::routing::get;
use homedeck_api::models::*;
use serde::Serialize;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use super::{auth_handle, device_handle, home_handle, log_handle, room_handle};

#[derive(OpenApi)]
#[openapi(
    paths(
        auth_handle::register,
        auth_handle::authenticate,
        auth_handle::get_account,
        home_handle::get_homes,
        home_handle::create_home,
        home_handle::update_home,
        home_handle::delete_home,
        home_handle::get_rooms_by_home_id,
        room_handle::create_room,
        room_handle::get_room,
        room_handle::update_room,
        room_handle::delete_room,
        room_handle::get_devices_by_room_id,
        device_handle::create_device,
        device_handle::discover_devices,
        device_handle::get_device,
        device_handle::unassign_device,
        device_handle::assign_device,
        device_handle::control_device,
        device_handle::toggle_human_detection,
        device_handle::set_temperature_threshold,
        log_handle::get_logs,
        health,
    ),
    components(schemas(
        LoginRequest,
        RegisterRequest,
        AuthResponse,
        UserResponse,
        CreateHomeRequest,
        UpdateHomeRequest,
        HomeResponse,
        CreateRoomRequest,
        UpdateRoomRequest,
        RoomResponse,
        CreateDeviceRequest,
        AssignDeviceRequest,
        DeviceResponse,
        DeviceType,
        PowerState,
        DeviceAction,
        DeviceCommand,
        HumanDetectionRequest,
        ThresholdRequest,
        ActivityLogResponse,
        LogSeverity,
        ErrorResponse,
        ErrorDetail,
        HealthResponse,
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "auth", description = "Accounts and bearer tokens"),
        (name = "home", description = "Homes owned by the current user"),
        (name = "room", description = "Rooms inside a home"),
        (name = "device", description = "Device placement and control"),
        (name = "log", description = "Activity log"),
        (name = "docs", description = "Service metadata"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

pub fn docs_router() -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/openapi.json", get(openapi))
}

#[utoipa::path(
    get,
    path = "/api/health",
    tag = "docs",
    responses(
        (status = 200, description = "Service is up", body = HealthResponse)
    )
)]
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

pub async fn openapi() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
