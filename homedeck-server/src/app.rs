use std::sync::Arc;

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::configs::{Auth, SchemaManager, Settings, Storage};
use crate::handles::*;
use crate::middlewares::TokenState;
use crate::repositories::*;
use crate::services::{AuthService, PermissionService, TokenService};

pub async fn create_app(settings: &Arc<Settings>) -> Result<Router, sqlx::Error> {
    let storage = Arc::new(
        Storage::new(settings.database.clone(), SchemaManager::default()).await?,
    );

    Ok(create_router(storage, settings.auth.clone()))
}

/// Wires every handle against an already prepared storage.
pub fn create_router(storage: Arc<Storage>, auth: Auth) -> Router {
    let user_repository = Arc::new(UserRepository::new(storage.clone()));
    let home_repository = Arc::new(HomeRepository::new(storage.clone()));
    let room_repository = Arc::new(RoomRepository::new(storage.clone()));
    let device_repository = Arc::new(DeviceRepository::new(storage.clone()));
    let activity_log_repository = Arc::new(ActivityLogRepository::new(storage.clone()));

    let auth_service = Arc::new(AuthService::new());
    let token_service = Arc::new(TokenService::new(auth));
    let permission_service = Arc::new(PermissionService::new(
        home_repository.clone(),
        room_repository.clone(),
        device_repository.clone(),
    ));

    let token_state = TokenState {
        token_service: token_service.clone(),
    };

    let auth = auth_router(
        AuthState {
            auth_service,
            token_service,
            user_repository,
            activity_log_repository: activity_log_repository.clone(),
        },
        token_state.clone(),
    );

    let homes = home_router(
        HomeState {
            home_repository,
            room_repository: room_repository.clone(),
            activity_log_repository: activity_log_repository.clone(),
            permission_service: permission_service.clone(),
        },
        token_state.clone(),
    );

    let rooms = room_router(
        RoomState {
            room_repository,
            device_repository: device_repository.clone(),
            activity_log_repository: activity_log_repository.clone(),
            permission_service: permission_service.clone(),
        },
        token_state.clone(),
    );

    let devices = device_router(
        DeviceState {
            device_repository,
            activity_log_repository: activity_log_repository.clone(),
            permission_service,
        },
        token_state.clone(),
    );

    let logs = log_router(
        LogState {
            activity_log_repository,
        },
        token_state,
    );

    Router::new()
        .merge(auth)
        .merge(homes)
        .merge(rooms)
        .merge(devices)
        .merge(logs)
        .merge(docs_router())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
