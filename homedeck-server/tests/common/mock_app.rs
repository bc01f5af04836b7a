#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use homedeck_server::app::create_router;
use homedeck_server::configs::{Auth, Database, SchemaManager, Storage};
use homedeck_server::models::User;
use homedeck_server::services::TokenService;
use homedeck_server::tests::create_test_user;
use serde_json::Value;
use tower::ServiceExt;

pub const TEST_PASSWORD: &str = "password123";

pub struct MockApp {
    pub storage: Arc<Storage>,
    pub token_service: Arc<TokenService>,
    pub router: Router,
    pub admin: User,
    pub token: String,
}

fn auth() -> Auth {
    Auth {
        secret: String::from("test"),
        expiration: 1000,
    }
}

impl MockApp {
    pub async fn new() -> Self {
        let storage = Arc::new(
            Storage::new(Database::in_memory(), SchemaManager::default())
                .await
                .unwrap(),
        );

        let token_service = Arc::new(TokenService::new(auth()));

        let admin = create_test_user(storage.clone(), "admin", TEST_PASSWORD)
            .await
            .unwrap();
        let token = token_service.generate_token(&admin).unwrap().token;

        Self {
            storage,
            token_service,
            router: Router::new(),
            admin,
            token,
        }
    }

    pub fn with_router(mut self) -> Self {
        self.router = create_router(self.storage.clone(), auth());
        self
    }

    /// Creates a second account and returns it with a valid token.
    pub async fn create_other_user(&self, username: &str) -> (User, String) {
        let user = create_test_user(self.storage.clone(), username, TEST_PASSWORD)
            .await
            .unwrap();
        let token = self.token_service.generate_token(&user).unwrap().token;

        (user, token)
    }

    /// Sends a request as the admin user.
    pub async fn send(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        self.send_as(&self.token, method, uri, body).await
    }

    pub async fn send_as(
        &self,
        token: &str,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let builder = Request::builder()
            .uri(uri)
            .method(method)
            .header("Authorization", format!("Bearer {}", token));

        let request = match body {
            Some(body) => builder
                .header("Content-Type", "application/json")
                .body(Body::from(serde_json::to_string(&body).unwrap()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if body.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body).unwrap()
        };

        (status, value)
    }
}
