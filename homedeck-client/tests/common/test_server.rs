#![allow(dead_code)]

use std::sync::Arc;

use homedeck_api::models::LoginRequest;
use homedeck_api::{Session, TokenStore};
use homedeck_client::RemoteRegistry;
use homedeck_server::app::create_router;
use homedeck_server::configs::{Auth, Database, SchemaManager, Storage};
use homedeck_server::tests::create_test_user;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

pub const TEST_PASSWORD: &str = "password123";

/// Backend bound to an ephemeral local port for the lifetime of a test.
pub struct TestServer {
    pub base_url: String,
    pub storage: Arc<Storage>,
    handle: JoinHandle<()>,
}

impl TestServer {
    pub async fn start() -> Self {
        let storage = Arc::new(
            Storage::new(Database::in_memory(), SchemaManager::default())
                .await
                .unwrap(),
        );
        create_test_user(storage.clone(), "admin", TEST_PASSWORD)
            .await
            .unwrap();

        let router = create_router(
            storage.clone(),
            Auth {
                secret: String::from("test"),
                expiration: 1000,
            },
        );

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        Self {
            base_url: format!("http://{addr}"),
            storage,
            handle,
        }
    }

    pub fn registry(&self) -> RemoteRegistry {
        RemoteRegistry::new(&self.base_url, Arc::new(TokenStore::in_memory()))
    }

    /// Registry already holding a token for `admin`.
    pub async fn signed_in(&self) -> RemoteRegistry {
        let registry = self.registry();
        registry
            .login(LoginRequest {
                username: "admin".to_string(),
                password: TEST_PASSWORD.to_string(),
            })
            .await
            .unwrap();
        registry
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
