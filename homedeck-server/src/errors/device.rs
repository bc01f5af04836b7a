use axum::http::StatusCode;
use homedeck_api::models::ControlError;

#[derive(Debug, thiserror::Error)]
pub enum DeviceError {
    #[error("Device not found")]
    DeviceNotFound,

    #[error("Insufficient permission")]
    InsufficientPermission,

    #[error("Network identifier is required")]
    MissingNetwork,

    #[error("{0}")]
    Unsupported(#[from] ControlError),
}

impl DeviceError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            DeviceError::DeviceNotFound => StatusCode::NOT_FOUND,
            DeviceError::InsufficientPermission => StatusCode::FORBIDDEN,
            DeviceError::MissingNetwork => StatusCode::BAD_REQUEST,
            DeviceError::Unsupported(_) => StatusCode::BAD_REQUEST,
        }
    }
}
