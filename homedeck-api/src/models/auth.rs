use serde::{Deserialize, Serialize};
use validator::Validate;

use super::Id;

#[cfg_attr(feature = "docs", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Login name, unique per deployment
    #[validate(length(min = 3, message = "Username must be at least 3 characters"))]
    pub username: String,
    /// Contact address
    #[validate(email(message = "Email address is not valid"))]
    pub email: Option<String>,
    #[validate(length(min = 4, message = "Password must be at least 4 characters"))]
    pub password: String,
}

#[cfg_attr(feature = "docs", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 3, message = "Username must be at least 3 characters"))]
    pub username: String,
    #[validate(length(min = 4, message = "Password must be at least 4 characters"))]
    pub password: String,
}

#[cfg_attr(feature = "docs", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: Id,
    pub username: String,
    pub email: Option<String>,
}

#[cfg_attr(feature = "docs", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    /// Bearer token for subsequent requests
    pub id_token: String,
    /// Authenticated account
    pub user: UserResponse,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_request_constraints() {
        let short = LoginRequest {
            username: "ad".to_string(),
            password: "admin".to_string(),
        };
        let errors = short.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("username"));

        let valid = LoginRequest {
            username: "admin".to_string(),
            password: "admin".to_string(),
        };
        assert!(valid.validate().is_ok());
    }

    #[test]
    fn test_register_request_optional_email() {
        let mut request = RegisterRequest {
            username: "alice".to_string(),
            email: None,
            password: "secret".to_string(),
        };
        assert!(request.validate().is_ok());

        request.email = Some("not-an-email".to_string());
        let errors = request.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("email"));
    }
}
