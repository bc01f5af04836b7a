use std::sync::Arc;

use async_trait::async_trait;
use homedeck_api::models::*;
use homedeck_api::{Error, Registry, Result, Session, TokenStore};
use tokio::sync::Mutex;
use validator::Validate;

use crate::settings::{Seed, SeedError, SimulationOptions};
use crate::store::SimulatedStore;

const DEMO_USERNAME: &str = "admin";
const DEMO_PASSWORD: &str = "admin";

/// Registry backed by an in-memory household instead of a server.
///
/// Each call first awaits the configured latency, then locks the store for
/// the duration of a synchronous mutation. The lock is never held across the
/// delay, so calls cannot interleave their mutation steps.
pub struct SimulatedRegistry {
    store: Mutex<SimulatedStore>,
    seed: Seed,
    options: SimulationOptions,
    tokens: Arc<TokenStore>,
}

impl SimulatedRegistry {
    pub fn new(options: SimulationOptions, tokens: Arc<TokenStore>) -> std::result::Result<Self, SeedError> {
        Self::with_seed(Seed::bundled()?, options, tokens)
    }

    pub fn with_seed(
        seed: Seed,
        options: SimulationOptions,
        tokens: Arc<TokenStore>,
    ) -> std::result::Result<Self, SeedError> {
        let store = SimulatedStore::from_seed(&seed, &options)?;

        tracing::debug!(
            "Simulated registry ready with {} homes and {} devices",
            seed.homes.len(),
            seed.devices.len()
        );

        Ok(Self {
            store: Mutex::new(store),
            seed,
            options,
            tokens,
        })
    }

    pub fn tokens(&self) -> &Arc<TokenStore> {
        &self.tokens
    }

    /// Restores the seeded household, dropping every change made so far.
    pub async fn reset(&self) -> std::result::Result<(), SeedError> {
        let fresh = SimulatedStore::from_seed(&self.seed, &self.options)?;
        *self.store.lock().await = fresh;
        Ok(())
    }

    /// Unassigns the devices of a room removed elsewhere.
    pub async fn release_room(&self, room_id: Id) -> usize {
        let released = self.store.lock().await.release_room(room_id);
        if released > 0 {
            tracing::debug!("Released {} devices of room {}", released, room_id);
        }
        released
    }

    async fn delay(&self) {
        if !self.options.latency.is_zero() {
            tokio::time::sleep(self.options.latency).await;
        }
    }
}

#[async_trait]
impl Registry for SimulatedRegistry {
    async fn list_homes(&self) -> Result<Vec<HomeResponse>> {
        self.delay().await;
        Ok(self.store.lock().await.homes())
    }

    async fn create_home(&self, request: CreateHomeRequest) -> Result<HomeResponse> {
        request.validate()?;
        self.delay().await;
        Ok(self.store.lock().await.create_home(request))
    }

    async fn update_home(&self, id: Id, request: UpdateHomeRequest) -> Result<HomeResponse> {
        request.validate()?;
        self.delay().await;
        self.store.lock().await.update_home(id, request)
    }

    async fn delete_home(&self, id: Id) -> Result<()> {
        self.delay().await;
        self.store.lock().await.delete_home(id)
    }

    async fn list_rooms(&self, home_id: Id) -> Result<Vec<RoomResponse>> {
        self.delay().await;
        Ok(self.store.lock().await.rooms(home_id))
    }

    async fn get_room(&self, id: Id) -> Result<RoomResponse> {
        self.delay().await;
        self.store.lock().await.room(id)
    }

    async fn create_room(&self, request: CreateRoomRequest) -> Result<RoomResponse> {
        request.validate()?;
        self.delay().await;
        self.store.lock().await.create_room(request)
    }

    async fn update_room(&self, id: Id, request: UpdateRoomRequest) -> Result<RoomResponse> {
        request.validate()?;
        self.delay().await;
        self.store.lock().await.update_room(id, request)
    }

    async fn delete_room(&self, id: Id) -> Result<()> {
        self.delay().await;
        self.store.lock().await.delete_room(id)
    }

    async fn list_devices(&self, room_id: Id) -> Result<Vec<DeviceResponse>> {
        self.delay().await;
        Ok(self.store.lock().await.devices(room_id))
    }

    async fn get_device(&self, id: Id) -> Result<DeviceResponse> {
        self.delay().await;
        self.store.lock().await.device(id)
    }

    async fn discover_devices(&self, bssid: &str) -> Result<Vec<DeviceResponse>> {
        self.delay().await;
        Ok(self.store.lock().await.discover(bssid))
    }

    async fn create_device(&self, request: CreateDeviceRequest) -> Result<DeviceResponse> {
        request.validate()?;
        self.delay().await;
        self.store.lock().await.create_device(request)
    }

    async fn assign_device(&self, id: Id, room_id: Id) -> Result<DeviceResponse> {
        self.delay().await;
        self.store.lock().await.assign_device(id, room_id)
    }

    async fn unassign_device(&self, id: Id) -> Result<()> {
        self.delay().await;
        self.store.lock().await.unassign_device(id)
    }

    async fn control_device(&self, id: Id, command: DeviceCommand) -> Result<DeviceResponse> {
        self.delay().await;
        self.store.lock().await.control_device(id, command)
    }

    async fn toggle_human_detection(&self, id: Id, enabled: bool) -> Result<DeviceResponse> {
        self.delay().await;
        self.store.lock().await.toggle_human_detection(id, enabled)
    }

    async fn set_temperature_threshold(
        &self,
        id: Id,
        threshold: Option<f32>,
    ) -> Result<DeviceResponse> {
        self.delay().await;
        self.store.lock().await.set_temperature_threshold(id, threshold)
    }

    async fn list_activity_log(&self) -> Result<Vec<ActivityLogResponse>> {
        self.delay().await;
        Ok(self.store.lock().await.activity_log())
    }
}

#[async_trait]
impl Session for SimulatedRegistry {
    async fn login(&self, request: LoginRequest) -> Result<AuthResponse> {
        self.delay().await;

        if request.username != DEMO_USERNAME || request.password != DEMO_PASSWORD {
            tracing::debug!("Rejected simulated login for {}", request.username);
            return Err(Error::authentication("Invalid username or password"));
        }

        let mut store = self.store.lock().await;
        let id_token = format!("mock-jwt-token-{:08x}", store.token_nonce());
        self.tokens
            .set(id_token.clone())
            .map_err(|e| Error::transport_with_source("Failed to persist token", Box::new(e)))?;
        store.log_info(format!("User {} logged in", request.username));

        Ok(AuthResponse {
            id_token,
            user: store.user().clone(),
        })
    }

    async fn register(&self, request: RegisterRequest) -> Result<UserResponse> {
        request.validate()?;
        self.delay().await;

        let mut store = self.store.lock().await;
        if request.username == store.user().username {
            return Err(Error::field("username", "Username is already taken"));
        }
        store.log_info(format!("User {} registered", request.username));

        Ok(UserResponse {
            id: store.user().id + 1,
            username: request.username,
            email: request.email,
        })
    }

    async fn current_user(&self) -> Result<UserResponse> {
        self.delay().await;

        if !self.tokens.is_authenticated() {
            return Err(Error::authentication("Not signed in"));
        }

        Ok(self.store.lock().await.user().clone())
    }

    async fn logout(&self) -> Result<()> {
        self.tokens
            .clear()
            .map_err(|e| Error::transport_with_source("Failed to clear token", Box::new(e)))
    }
}
