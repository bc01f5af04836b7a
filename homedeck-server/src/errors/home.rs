use axum::http::StatusCode;

#[derive(Debug, thiserror::Error)]
pub enum HomeError {
    #[error("Home not found")]
    HomeNotFound,

    #[error("Insufficient permission")]
    InsufficientPermission,
}

impl HomeError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            HomeError::HomeNotFound => StatusCode::NOT_FOUND,
            HomeError::InsufficientPermission => StatusCode::FORBIDDEN,
        }
    }
}
