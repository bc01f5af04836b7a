use axum::http::StatusCode;

#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    #[error("Room not found")]
    RoomNotFound,

    #[error("Insufficient permission")]
    InsufficientPermission,
}

impl RoomError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            RoomError::RoomNotFound => StatusCode::NOT_FOUND,
            RoomError::InsufficientPermission => StatusCode::FORBIDDEN,
        }
    }
}
