use std::sync::Arc;

use anyhow::anyhow;
use axum::extract::State;
use axum::routing::{get, post};
use axum::{Extension, Json, Router, middleware};
use homedeck_api::models::*;
use time::OffsetDateTime;
use validator::Validate;

use crate::errors::{ApiError, AuthError};
use crate::middlewares::{TokenState, auth};
use crate::models::User;
use crate::repositories::{ActivityLogRepository, UserRepository};
use crate::services::{AuthService, TokenClaims, TokenService};

#[derive(Clone)]
pub struct AuthState {
    pub auth_service: Arc<AuthService>,
    pub token_service: Arc<TokenService>,
    pub user_repository: Arc<UserRepository>,
    pub activity_log_repository: Arc<ActivityLogRepository>,
}

pub fn auth_router(auth_state: AuthState, token_state: TokenState) -> Router {
    Router::new()
        .route("/api/auth/register", post(register))
        .route("/api/auth/authenticate", post(authenticate))
        .route(
            "/api/auth/account",
            get(get_account).route_layer(middleware::from_fn_with_state(token_state, auth)),
        )
        .with_state(auth_state)
}

#[utoipa::path(
    post,
    path = "/api/auth/register",
    tag = "auth",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "Registration successful", body = UserResponse),
        (status = 400, description = "Invalid request parameters", body = ErrorResponse),
        (status = 409, description = "Username or email already exists", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn register(
    State(state): State<AuthState>,
    Json(body): Json<RegisterRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    body.validate()?;

    if state.user_repository.find_by_username(&body.username).await?.is_some() {
        return Err(AuthError::UsernameExists.into());
    }

    if let Some(email) = &body.email {
        if state.user_repository.find_by_email(email).await?.is_some() {
            return Err(AuthError::EmailExists.into());
        }
    }

    let hash_password = state
        .auth_service
        .hash(&body.password)
        .map_err(|e| anyhow!("Failed to hash password: {}", e))?;

    let user = User {
        id: 0,
        username: body.username.clone(),
        email: body.email.clone(),
        password: hash_password,
        created_at: OffsetDateTime::now_utc(),
    };

    let mut tx = state.user_repository.get_pool().begin().await?;

    let id = state.user_repository.create(&user, &mut tx).await?;
    state
        .activity_log_repository
        .append(id, &format!("User {} registered", user.username), LogSeverity::Info, &mut tx)
        .await?;

    tx.commit().await?;

    let created_user = state
        .user_repository
        .find_by_id(id)
        .await?
        .ok_or(AuthError::UserNotFound)?;

    tracing::info!("registered user {}", created_user.username);

    Ok(Json(created_user.into()))
}

#[utoipa::path(
    post,
    path = "/api/auth/authenticate",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 400, description = "Invalid request parameters", body = ErrorResponse),
        (status = 401, description = "Invalid username or password", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn authenticate(
    State(state): State<AuthState>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    body.validate()?;

    let user = state
        .user_repository
        .find_by_username(&body.username)
        .await?
        .ok_or(AuthError::InvalidCredentials)?;

    let verified = state
        .auth_service
        .verify(&user, &body.password)
        .map_err(|e| anyhow!("Failed to verify password: {}", e))?;

    if !verified {
        return Err(AuthError::InvalidCredentials.into());
    }

    let token = state
        .token_service
        .generate_token(&user)
        .map_err(|e| anyhow!("Failed to generate token: {}", e))?;

    let mut tx = state.activity_log_repository.get_pool().begin().await?;
    state
        .activity_log_repository
        .append(user.id, &format!("User {} logged in", user.username), LogSeverity::Info, &mut tx)
        .await?;
    tx.commit().await?;

    Ok(Json(AuthResponse {
        id_token: token.token,
        user: user.into(),
    }))
}

#[utoipa::path(
    get,
    path = "/api/auth/account",
    tag = "auth",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Current account", body = UserResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "User does not exist", body = ErrorResponse)
    )
)]
pub async fn get_account(
    Extension(token_data): Extension<TokenClaims>,
    State(state): State<AuthState>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state
        .user_repository
        .find_by_id(token_data.sub)
        .await?
        .ok_or(AuthError::UserNotFound)?;

    Ok(Json(user.into()))
}
