use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use homedeck_api::models::*;
use homedeck_api::{Error, Registry, Result, Session, TokenStore};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use validator::Validate;

/// How a 400 answer of an endpoint is surfaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rejection {
    /// The request body failed validation.
    Validation,
    /// The device does not support the requested change.
    InvalidOperation,
}

/// Registry talking to the REST backend with the persisted bearer token.
pub struct RemoteRegistry {
    http_client: reqwest::Client,
    base_url: String,
    tokens: Arc<TokenStore>,
}

impl RemoteRegistry {
    pub fn new(base_url: impl Into<String>, tokens: Arc<TokenStore>) -> Self {
        let http_client = match reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .build()
        {
            Ok(client) => client,
            Err(e) => {
                tracing::warn!("Failed to configure HTTP client, using defaults: {}", e);
                reqwest::Client::default()
            }
        };

        Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            tokens,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn tokens(&self) -> &Arc<TokenStore> {
        &self.tokens
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self
            .http_client
            .request(method, format!("{}{}", self.base_url, path));

        match self.tokens.get() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn execute(&self, builder: RequestBuilder, rejection: Rejection) -> Result<Response> {
        let response = builder
            .send()
            .await
            .map_err(|e| Error::transport_with_source("Request failed", Box::new(e)))?;

        if response.status().is_success() {
            return Ok(response);
        }

        Err(self.reject(response, rejection).await)
    }

    async fn fetch<T: DeserializeOwned>(&self, builder: RequestBuilder, rejection: Rejection) -> Result<T> {
        self.execute(builder, rejection)
            .await?
            .json::<T>()
            .await
            .map_err(|e| Error::transport_with_source("Unexpected response body", Box::new(e)))
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.fetch(self.request(Method::GET, path), Rejection::Validation)
            .await
    }

    async fn send<B: Serialize, T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: &B,
        rejection: Rejection,
    ) -> Result<T> {
        self.fetch(self.request(method, path).json(body), rejection)
            .await
    }

    async fn delete(&self, path: &str) -> Result<()> {
        self.execute(self.request(Method::DELETE, path), Rejection::Validation)
            .await?;
        Ok(())
    }

    async fn reject(&self, response: Response, rejection: Rejection) -> Error {
        let status = response.status();
        let message = match response.json::<ErrorResponse>().await {
            Ok(body) => body.error.message,
            Err(_) => status
                .canonical_reason()
                .unwrap_or("Unexpected status")
                .to_string(),
        };

        tracing::debug!("request rejected with {}: {}", status, message);

        match status {
            StatusCode::UNAUTHORIZED => {
                if let Err(e) = self.tokens.clear() {
                    tracing::warn!("Failed to clear rejected token: {}", e);
                }
                Error::authentication(message)
            }
            StatusCode::NOT_FOUND => Error::not_found(message),
            StatusCode::BAD_REQUEST if rejection == Rejection::InvalidOperation => {
                Error::InvalidOperation(message)
            }
            StatusCode::BAD_REQUEST | StatusCode::CONFLICT | StatusCode::UNPROCESSABLE_ENTITY => {
                Error::validation(message)
            }
            _ => Error::Transport {
                message,
                status: Some(status.as_u16()),
                source: None,
            },
        }
    }
}

#[async_trait]
impl Registry for RemoteRegistry {
    async fn list_homes(&self) -> Result<Vec<HomeResponse>> {
        self.get("/api/homes").await
    }

    async fn create_home(&self, request: CreateHomeRequest) -> Result<HomeResponse> {
        request.validate()?;
        self.send(Method::POST, "/api/homes", &request, Rejection::Validation)
            .await
    }

    async fn update_home(&self, id: Id, request: UpdateHomeRequest) -> Result<HomeResponse> {
        request.validate()?;
        self.send(
            Method::PUT,
            &format!("/api/homes/{id}"),
            &request,
            Rejection::Validation,
        )
        .await
    }

    async fn delete_home(&self, id: Id) -> Result<()> {
        self.delete(&format!("/api/homes/{id}")).await
    }

    async fn list_rooms(&self, home_id: Id) -> Result<Vec<RoomResponse>> {
        self.get(&format!("/api/homes/{home_id}/rooms")).await
    }

    async fn get_room(&self, id: Id) -> Result<RoomResponse> {
        self.get(&format!("/api/rooms/{id}")).await
    }

    async fn create_room(&self, request: CreateRoomRequest) -> Result<RoomResponse> {
        request.validate()?;
        self.send(Method::POST, "/api/rooms", &request, Rejection::Validation)
            .await
    }

    async fn update_room(&self, id: Id, request: UpdateRoomRequest) -> Result<RoomResponse> {
        request.validate()?;
        self.send(
            Method::PUT,
            &format!("/api/rooms/{id}"),
            &request,
            Rejection::Validation,
        )
        .await
    }

    async fn delete_room(&self, id: Id) -> Result<()> {
        self.delete(&format!("/api/rooms/{id}")).await
    }

    async fn list_devices(&self, room_id: Id) -> Result<Vec<DeviceResponse>> {
        self.get(&format!("/api/rooms/{room_id}/devices")).await
    }

    async fn get_device(&self, id: Id) -> Result<DeviceResponse> {
        self.get(&format!("/api/devices/{id}")).await
    }

    async fn discover_devices(&self, bssid: &str) -> Result<Vec<DeviceResponse>> {
        let builder = self
            .request(Method::GET, "/api/devices/lan")
            .query(&[("bssid", bssid)]);
        self.fetch(builder, Rejection::Validation).await
    }

    async fn create_device(&self, request: CreateDeviceRequest) -> Result<DeviceResponse> {
        request.validate()?;
        self.send(Method::POST, "/api/devices", &request, Rejection::Validation)
            .await
    }

    async fn assign_device(&self, id: Id, room_id: Id) -> Result<DeviceResponse> {
        self.send(
            Method::PUT,
            &format!("/api/devices/{id}/room"),
            &AssignDeviceRequest { room_id },
            Rejection::Validation,
        )
        .await
    }

    async fn unassign_device(&self, id: Id) -> Result<()> {
        self.delete(&format!("/api/devices/{id}")).await
    }

    async fn control_device(&self, id: Id, command: DeviceCommand) -> Result<DeviceResponse> {
        self.send(
            Method::POST,
            &format!("/api/devices/{id}/command"),
            &command,
            Rejection::InvalidOperation,
        )
        .await
    }

    async fn toggle_human_detection(&self, id: Id, enabled: bool) -> Result<DeviceResponse> {
        self.send(
            Method::POST,
            &format!("/api/devices/{id}/human-detection"),
            &HumanDetectionRequest { enabled },
            Rejection::InvalidOperation,
        )
        .await
    }

    async fn set_temperature_threshold(
        &self,
        id: Id,
        threshold: Option<f32>,
    ) -> Result<DeviceResponse> {
        self.send(
            Method::PUT,
            &format!("/api/devices/{id}/threshold"),
            &ThresholdRequest { threshold },
            Rejection::InvalidOperation,
        )
        .await
    }

    async fn list_activity_log(&self) -> Result<Vec<ActivityLogResponse>> {
        self.get("/api/logs").await
    }
}

#[async_trait]
impl Session for RemoteRegistry {
    async fn login(&self, request: LoginRequest) -> Result<AuthResponse> {
        request.validate()?;

        let auth: AuthResponse = self
            .send(
                Method::POST,
                "/api/auth/authenticate",
                &request,
                Rejection::Validation,
            )
            .await?;

        self.tokens
            .set(auth.id_token.clone())
            .map_err(|e| Error::transport_with_source("Failed to persist token", Box::new(e)))?;

        tracing::info!("signed in as {}", auth.user.username);

        Ok(auth)
    }

    async fn register(&self, request: RegisterRequest) -> Result<UserResponse> {
        request.validate()?;
        self.send(
            Method::POST,
            "/api/auth/register",
            &request,
            Rejection::Validation,
        )
        .await
    }

    async fn current_user(&self) -> Result<UserResponse> {
        if !self.tokens.is_authenticated() {
            return Err(Error::authentication("Not signed in"));
        }

        self.get("/api/auth/account").await
    }

    async fn logout(&self) -> Result<()> {
        self.tokens
            .clear()
            .map_err(|e| Error::transport_with_source("Failed to clear token", Box::new(e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_normalized() {
        let registry = RemoteRegistry::new("http://localhost:3000/", Arc::new(TokenStore::in_memory()));
        assert_eq!(registry.base_url(), "http://localhost:3000");
    }

    #[tokio::test]
    async fn test_validation_blocks_request() {
        // Nothing listens on the discard port; validation must fail first.
        let registry = RemoteRegistry::new("http://127.0.0.1:9", Arc::new(TokenStore::in_memory()));

        let err = registry
            .create_room(CreateRoomRequest {
                home_id: 1,
                name: String::new(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_retryable() {
        let registry = RemoteRegistry::new("http://127.0.0.1:9", Arc::new(TokenStore::in_memory()));

        let err = registry.list_homes().await.unwrap_err();
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_current_user_without_token() {
        let registry = RemoteRegistry::new("http://127.0.0.1:9", Arc::new(TokenStore::in_memory()));

        assert!(registry.current_user().await.unwrap_err().is_auth());
    }
}
