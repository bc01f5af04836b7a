use async_trait::async_trait;
use validator::ValidationErrors;

use crate::models::*;

pub type Result<T> = std::result::Result<T, Error>;

/// Failure taxonomy shared by every registry implementation.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Bad credentials, or a missing or expired token. Callers should re-login.
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Input rejected before or by the backend.
    #[error("Validation failed: {message}")]
    Validation {
        field: Option<String>,
        message: String,
    },

    #[error("{resource} not found")]
    NotFound { resource: String },

    /// The target exists but does not support the requested change.
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// Network failure or unexpected server answer. Safe to retry.
    #[error("Transport error: {message}")]
    Transport {
        message: String,
        status: Option<u16>,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl Error {
    pub fn authentication<S: Into<String>>(message: S) -> Self {
        Self::Authentication(message.into())
    }

    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            field: None,
            message: message.into(),
        }
    }

    pub fn field<F: Into<String>, S: Into<String>>(field: F, message: S) -> Self {
        Self::Validation {
            field: Some(field.into()),
            message: message.into(),
        }
    }

    pub fn not_found<S: Into<String>>(resource: S) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    pub fn transport<S: Into<String>>(message: S) -> Self {
        Self::Transport {
            message: message.into(),
            status: None,
            source: None,
        }
    }

    pub fn transport_with_source<S: Into<String>>(
        message: S,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        Self::Transport {
            message: message.into(),
            status: None,
            source: Some(source),
        }
    }

    pub fn is_auth(&self) -> bool {
        matches!(self, Error::Authentication(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Transport { .. })
    }
}

impl From<ControlError> for Error {
    fn from(err: ControlError) -> Self {
        Error::InvalidOperation(err.to_string())
    }
}

impl From<ValidationErrors> for Error {
    fn from(errors: ValidationErrors) -> Self {
        let mut field_errors: Vec<_> = errors.field_errors().into_iter().collect();
        field_errors.sort_by(|a, b| a.0.cmp(&b.0));

        let first = field_errors.into_iter().find_map(|(field, errors)| {
            errors.first().map(|error| (field.to_string(), error.clone()))
        });

        match first {
            Some((field, error)) => {
                let message = error
                    .message
                    .as_ref()
                    .map(|message| message.to_string())
                    .unwrap_or_else(|| format!("{field} is invalid"));
                Error::field(field, message)
            }
            None => Error::validation(errors.to_string()),
        }
    }
}

/// Homes, rooms, devices and the activity log, scoped by parent identifiers.
///
/// Every mutation appends to the activity log of the implementation.
#[async_trait]
pub trait Registry: Send + Sync {
    async fn list_homes(&self) -> Result<Vec<HomeResponse>>;

    async fn create_home(&self, request: CreateHomeRequest) -> Result<HomeResponse>;

    async fn update_home(&self, id: Id, request: UpdateHomeRequest) -> Result<HomeResponse>;

    /// Removes the home and its rooms. Devices of those rooms become unassigned.
    async fn delete_home(&self, id: Id) -> Result<()>;

    async fn list_rooms(&self, home_id: Id) -> Result<Vec<RoomResponse>>;

    async fn get_room(&self, id: Id) -> Result<RoomResponse>;

    async fn create_room(&self, request: CreateRoomRequest) -> Result<RoomResponse>;

    async fn update_room(&self, id: Id, request: UpdateRoomRequest) -> Result<RoomResponse>;

    /// Removes the room. Its devices become unassigned.
    async fn delete_room(&self, id: Id) -> Result<()>;

    async fn list_devices(&self, room_id: Id) -> Result<Vec<DeviceResponse>>;

    async fn get_device(&self, id: Id) -> Result<DeviceResponse>;

    /// Unassigned devices seen on the given network. Never mutates state.
    async fn discover_devices(&self, bssid: &str) -> Result<Vec<DeviceResponse>>;

    async fn create_device(&self, request: CreateDeviceRequest) -> Result<DeviceResponse>;

    async fn assign_device(&self, id: Id, room_id: Id) -> Result<DeviceResponse>;

    /// Detaches the device from its room so it can be rediscovered later.
    async fn unassign_device(&self, id: Id) -> Result<()>;

    async fn delete_device(&self, id: Id) -> Result<()> {
        self.unassign_device(id).await
    }

    async fn control_device(&self, id: Id, command: DeviceCommand) -> Result<DeviceResponse>;

    async fn toggle_human_detection(&self, id: Id, enabled: bool) -> Result<DeviceResponse>;

    async fn set_temperature_threshold(
        &self,
        id: Id,
        threshold: Option<f32>,
    ) -> Result<DeviceResponse>;

    /// Newest first, at most [`ACTIVITY_LOG_RETENTION`] entries.
    async fn list_activity_log(&self) -> Result<Vec<ActivityLogResponse>>;
}

/// Account operations backed by the persisted token.
#[async_trait]
pub trait Session: Send + Sync {
    /// Authenticates and stores the returned token.
    async fn login(&self, request: LoginRequest) -> Result<AuthResponse>;

    async fn register(&self, request: RegisterRequest) -> Result<UserResponse>;

    async fn current_user(&self) -> Result<UserResponse>;

    /// Drops the stored token.
    async fn logout(&self) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use validator::Validate;

    use super::*;

    #[test]
    fn test_validation_errors_keep_field() {
        let request = CreateRoomRequest {
            home_id: 1,
            name: String::new(),
        };
        let error: Error = request.validate().unwrap_err().into();

        match error {
            Error::Validation { field, message } => {
                assert_eq!(field.as_deref(), Some("name"));
                assert_eq!(message, "Room name is required");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_error_classification() {
        assert!(Error::authentication("expired").is_auth());
        assert!(Error::transport("connection reset").is_retryable());
        assert!(!Error::not_found("Device 7").is_retryable());
        assert!(Error::from(ControlError::MissingSpeed).to_string().contains("SET_SPEED"));
    }
}
