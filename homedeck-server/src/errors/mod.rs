pub mod api;
pub mod auth;
pub mod device;
pub mod home;
pub mod room;

pub use api::ApiError;
pub use auth::AuthError;
pub use device::DeviceError;
pub use home::HomeError;
pub use room::RoomError;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use homedeck_api::models::{ErrorDetail, ErrorResponse};
use uuid::Uuid;

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message, error_id) = match self {
            ApiError::AuthError(e) => (e.status_code(), e.to_string(), None),
            ApiError::HomeError(e) => (e.status_code(), e.to_string(), None),
            ApiError::RoomError(e) => (e.status_code(), e.to_string(), None),
            ApiError::DeviceError(e) => (e.status_code(), e.to_string(), None),
            ApiError::ValidationError(e) => (StatusCode::BAD_REQUEST, api::describe(&e), None),
            ApiError::DatabaseError(e) => {
                let error_id = Uuid::new_v4();
                tracing::error!(error_id = ?error_id, "Database error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                    Some(error_id.to_string()),
                )
            }
            ApiError::InternalError(e) => {
                let error_id = Uuid::new_v4();
                tracing::error!(error_id = ?error_id, "Internal error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                    Some(error_id.to_string()),
                )
            }
        };

        let body = Json(ErrorResponse {
            error: ErrorDetail {
                code: status.as_u16(),
                message,
                error_id,
            },
        });

        (status, body).into_response()
    }
}
