use std::io;
use std::sync::Arc;

use async_trait::async_trait;
use homedeck_api::models::*;
use homedeck_api::{Registry, Result, Session, TokenStore};
use homedeck_mock::{Seed, SeedError, SimulatedRegistry, SimulationOptions};

use crate::remote::RemoteRegistry;
use crate::settings::{ClientSettings, RegistryMode};

#[derive(Debug, thiserror::Error)]
pub enum ComposeError {
    #[error("Failed to open token store: {0}")]
    Token(#[from] io::Error),

    #[error("Failed to seed simulated registry: {0}")]
    Seed(#[from] SeedError),
}

/// The contract implementations selected for this process.
#[derive(Clone)]
pub struct Services {
    pub mode: RegistryMode,
    pub registry: Arc<dyn Registry>,
    pub session: Arc<dyn Session>,
    pub tokens: Arc<TokenStore>,
}

/// Builds the registry once from configuration. Callers never branch on the mode.
pub fn compose(settings: &ClientSettings) -> std::result::Result<Services, ComposeError> {
    let tokens = Arc::new(match &settings.token_path {
        Some(path) => TokenStore::persistent(path)?,
        None => TokenStore::in_memory(),
    });

    let mode = settings.mode();
    let options = SimulationOptions::default().with_latency(settings.mock_latency());

    let (registry, session): (Arc<dyn Registry>, Arc<dyn Session>) = match mode {
        RegistryMode::Simulated => {
            let simulated = Arc::new(SimulatedRegistry::new(options, tokens.clone())?);
            (simulated.clone(), simulated)
        }
        RegistryMode::Hybrid => {
            let remote = Arc::new(RemoteRegistry::new(&settings.api_base_url, tokens.clone()));
            (Arc::new(HybridRegistry::new(remote.clone(), options)?), remote)
        }
        RegistryMode::Remote => {
            let remote = Arc::new(RemoteRegistry::new(&settings.api_base_url, tokens.clone()));
            (remote.clone(), remote)
        }
    };

    tracing::debug!("composed {:?} registry", mode);

    Ok(Services {
        mode,
        registry,
        session,
        tokens,
    })
}

/// Homes and rooms from the backend, devices from the simulation.
///
/// Simulated devices start unassigned and are only placed in rooms the
/// backend confirms.
pub struct HybridRegistry {
    remote: Arc<RemoteRegistry>,
    devices: SimulatedRegistry,
}

impl HybridRegistry {
    pub fn new(
        remote: Arc<RemoteRegistry>,
        options: SimulationOptions,
    ) -> std::result::Result<Self, SeedError> {
        let devices = SimulatedRegistry::with_seed(
            Seed::bundled()?.detached(),
            options.without_room_checks(),
            remote.tokens().clone(),
        )?;

        Ok(Self { remote, devices })
    }

    pub fn devices(&self) -> &SimulatedRegistry {
        &self.devices
    }
}

#[async_trait]
impl Registry for HybridRegistry {
    async fn list_homes(&self) -> Result<Vec<HomeResponse>> {
        self.remote.list_homes().await
    }

    async fn create_home(&self, request: CreateHomeRequest) -> Result<HomeResponse> {
        self.remote.create_home(request).await
    }

    async fn update_home(&self, id: Id, request: UpdateHomeRequest) -> Result<HomeResponse> {
        self.remote.update_home(id, request).await
    }

    async fn delete_home(&self, id: Id) -> Result<()> {
        let rooms = self.remote.list_rooms(id).await?;
        self.remote.delete_home(id).await?;

        for room in rooms {
            self.devices.release_room(room.id).await;
        }

        Ok(())
    }

    async fn list_rooms(&self, home_id: Id) -> Result<Vec<RoomResponse>> {
        self.remote.list_rooms(home_id).await
    }

    async fn get_room(&self, id: Id) -> Result<RoomResponse> {
        self.remote.get_room(id).await
    }

    async fn create_room(&self, request: CreateRoomRequest) -> Result<RoomResponse> {
        self.remote.create_room(request).await
    }

    async fn update_room(&self, id: Id, request: UpdateRoomRequest) -> Result<RoomResponse> {
        self.remote.update_room(id, request).await
    }

    async fn delete_room(&self, id: Id) -> Result<()> {
        self.remote.delete_room(id).await?;
        self.devices.release_room(id).await;
        Ok(())
    }

    async fn list_devices(&self, room_id: Id) -> Result<Vec<DeviceResponse>> {
        self.devices.list_devices(room_id).await
    }

    async fn get_device(&self, id: Id) -> Result<DeviceResponse> {
        self.devices.get_device(id).await
    }

    async fn discover_devices(&self, bssid: &str) -> Result<Vec<DeviceResponse>> {
        self.devices.discover_devices(bssid).await
    }

    async fn create_device(&self, request: CreateDeviceRequest) -> Result<DeviceResponse> {
        if let Some(room_id) = request.room_id {
            self.remote.get_room(room_id).await?;
        }
        self.devices.create_device(request).await
    }

    async fn assign_device(&self, id: Id, room_id: Id) -> Result<DeviceResponse> {
        self.remote.get_room(room_id).await?;
        self.devices.assign_device(id, room_id).await
    }

    async fn unassign_device(&self, id: Id) -> Result<()> {
        self.devices.unassign_device(id).await
    }

    async fn control_device(&self, id: Id, command: DeviceCommand) -> Result<DeviceResponse> {
        self.devices.control_device(id, command).await
    }

    async fn toggle_human_detection(&self, id: Id, enabled: bool) -> Result<DeviceResponse> {
        self.devices.toggle_human_detection(id, enabled).await
    }

    async fn set_temperature_threshold(
        &self,
        id: Id,
        threshold: Option<f32>,
    ) -> Result<DeviceResponse> {
        self.devices.set_temperature_threshold(id, threshold).await
    }

    async fn list_activity_log(&self) -> Result<Vec<ActivityLogResponse>> {
        let (remote, local) = tokio::try_join!(
            self.remote.list_activity_log(),
            self.devices.list_activity_log()
        )?;

        Ok(merge_activity_logs(remote, local))
    }
}
