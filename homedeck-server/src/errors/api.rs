use validator::ValidationErrors;

use super::{AuthError, DeviceError, HomeError, RoomError};

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Authentication error: {0}")]
    AuthError(#[from] AuthError),

    #[error("Home error: {0}")]
    HomeError(#[from] HomeError),

    #[error("Room error: {0}")]
    RoomError(#[from] RoomError),

    #[error("Device error: {0}")]
    DeviceError(#[from] DeviceError),

    #[error("Validation error: {0}")]
    ValidationError(#[from] ValidationErrors),

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// First field message of a rejected request body.
pub fn describe(errors: &ValidationErrors) -> String {
    match homedeck_api::Error::from(errors.clone()) {
        homedeck_api::Error::Validation { message, .. } => message,
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use homedeck_api::models::CreateHomeRequest;
    use validator::Validate;

    use super::*;

    #[test]
    fn test_describe_uses_field_message() {
        let errors = CreateHomeRequest {
            name: String::new(),
            location: None,
        }
        .validate()
        .unwrap_err();

        assert_eq!(describe(&errors), "Home name is required");
    }
}
