use std::time::Duration;

use homedeck_api::models::{ControlError, DeviceType, Id, PowerState};
use serde::Deserialize;

const BUNDLED_SEED: &str = include_str!("../fixtures/seed.toml");

/// Default artificial round trip of every simulated call.
pub const DEFAULT_LATENCY: Duration = Duration::from_millis(400);

#[derive(Debug, Clone)]
pub struct SimulationOptions {
    /// Delay awaited before each operation touches the store
    pub latency: Duration,
    /// Let sensor readings wander on every read
    pub sensor_drift: bool,
    /// Reject room references that the store does not know about.
    /// Disabled when rooms live in another backend.
    pub room_checks: bool,
    /// Fixed seed for reproducible readings
    pub rng_seed: Option<u64>,
}

impl SimulationOptions {
    /// No latency, no drift and a fixed seed.
    pub fn instant() -> Self {
        Self {
            latency: Duration::ZERO,
            sensor_drift: false,
            room_checks: true,
            rng_seed: Some(7),
        }
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn without_room_checks(mut self) -> Self {
        self.room_checks = false;
        self
    }
}

impl Default for SimulationOptions {
    fn default() -> Self {
        Self {
            latency: DEFAULT_LATENCY,
            sensor_drift: true,
            room_checks: true,
            rng_seed: None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    #[error("Failed to parse seed: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Seed room {room_id} references unknown home {home_id}")]
    DanglingHome { room_id: Id, home_id: Id },

    #[error("Seed device {device_id} references unknown room {room_id}")]
    DanglingRoom { device_id: Id, room_id: Id },

    #[error("Seed device {device_id} is invalid: {source}")]
    Device {
        device_id: Id,
        #[source]
        source: ControlError,
    },
}

/// Household loaded into a fresh simulated store.
#[derive(Debug, Clone, Deserialize)]
pub struct Seed {
    pub user: SeedUser,
    #[serde(default)]
    pub homes: Vec<SeedHome>,
    #[serde(default)]
    pub rooms: Vec<SeedRoom>,
    #[serde(default)]
    pub devices: Vec<SeedDevice>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeedUser {
    pub id: Id,
    pub username: String,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeedHome {
    pub id: Id,
    pub name: String,
    pub location: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeedRoom {
    pub id: Id,
    pub home_id: Id,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeedDevice {
    pub id: Id,
    pub room_id: Option<Id>,
    pub name: String,
    pub device_type: DeviceType,
    #[serde(default)]
    pub state: PowerState,
    pub speed: Option<u8>,
    pub stream_url: Option<String>,
    pub human_detection_enabled: Option<bool>,
    pub temperature: Option<f32>,
    pub humidity: Option<f32>,
    pub temperature_threshold: Option<f32>,
    pub controller_mac: Option<String>,
    pub bssid: Option<String>,
}

impl Seed {
    /// The demo household shipped with the crate.
    pub fn bundled() -> Result<Self, SeedError> {
        Self::from_toml(BUNDLED_SEED)
    }

    pub fn from_toml(input: &str) -> Result<Self, SeedError> {
        let seed: Seed = toml::from_str(input)?;
        seed.check_references()?;
        Ok(seed)
    }

    /// Keeps only the user and the devices, all of them unassigned.
    /// Used when homes and rooms are served by another backend.
    pub fn detached(mut self) -> Self {
        self.homes.clear();
        self.rooms.clear();
        for device in &mut self.devices {
            device.room_id = None;
        }
        self
    }

    fn check_references(&self) -> Result<(), SeedError> {
        for room in &self.rooms {
            if !self.homes.iter().any(|home| home.id == room.home_id) {
                return Err(SeedError::DanglingHome {
                    room_id: room.id,
                    home_id: room.home_id,
                });
            }
        }

        for device in &self.devices {
            if let Some(room_id) = device.room_id {
                if !self.rooms.iter().any(|room| room.id == room_id) {
                    return Err(SeedError::DanglingRoom {
                        device_id: device.id,
                        room_id,
                    });
                }
            }
        }

        Ok(())
    }
}
