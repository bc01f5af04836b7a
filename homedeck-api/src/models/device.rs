use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use validator::Validate;

use super::{ControlError, Id};

/// Lowest fan level; a fan at this level is idle but may still be powered.
pub const FAN_SPEED_OFF: u8 = 0;
/// Highest fan level.
pub const FAN_SPEED_MAX: u8 = 3;

#[cfg_attr(feature = "docs", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DeviceType {
    Light,
    Fan,
    Camera,
    Sensor,
}

impl Display for DeviceType {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            DeviceType::Light => write!(f, "LIGHT"),
            DeviceType::Fan => write!(f, "FAN"),
            DeviceType::Camera => write!(f, "CAMERA"),
            DeviceType::Sensor => write!(f, "SENSOR"),
        }
    }
}

impl FromStr for DeviceType {
    type Err = String;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        match input.to_ascii_uppercase().as_str() {
            "LIGHT" => Ok(DeviceType::Light),
            "FAN" => Ok(DeviceType::Fan),
            "CAMERA" => Ok(DeviceType::Camera),
            "SENSOR" => Ok(DeviceType::Sensor),
            other => Err(format!("unknown device type: {other}")),
        }
    }
}

#[cfg_attr(feature = "docs", derive(utoipa::ToSchema))]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PowerState {
    On,
    #[default]
    Off,
}

impl Display for PowerState {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            PowerState::On => write!(f, "ON"),
            PowerState::Off => write!(f, "OFF"),
        }
    }
}

impl FromStr for PowerState {
    type Err = String;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        match input.to_ascii_uppercase().as_str() {
            "ON" => Ok(PowerState::On),
            "OFF" => Ok(PowerState::Off),
            other => Err(format!("unknown power state: {other}")),
        }
    }
}

#[cfg_attr(feature = "docs", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateDeviceRequest {
    /// Target room, `None` registers the device as discovered but unassigned
    pub room_id: Option<Id>,
    /// Device name
    #[validate(length(min = 1, message = "Device name is required"))]
    pub name: String,
    /// Device category
    pub device_type: DeviceType,
    /// Controller hardware address
    pub controller_mac: Option<String>,
    /// Network the controller joined
    pub bssid: Option<String>,
    /// Initial fan level
    #[validate(range(max = 3, message = "Fan speed must be between 0 and 3"))]
    pub speed: Option<u8>,
    /// Camera stream locator
    pub stream_url: Option<String>,
    /// Initial human detection flag for cameras
    pub human_detection_enabled: Option<bool>,
}

impl CreateDeviceRequest {
    pub fn new(name: impl Into<String>, device_type: DeviceType) -> Self {
        Self {
            room_id: None,
            name: name.into(),
            device_type,
            controller_mac: None,
            bssid: None,
            speed: None,
            stream_url: None,
            human_detection_enabled: None,
        }
    }

    pub fn in_room(mut self, room_id: Id) -> Self {
        self.room_id = Some(room_id);
        self
    }

    pub fn on_network(mut self, bssid: impl Into<String>) -> Self {
        self.bssid = Some(bssid.into());
        self
    }
}

#[cfg_attr(feature = "docs", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignDeviceRequest {
    /// Room receiving the device
    pub room_id: Id,
}

#[cfg_attr(feature = "docs", derive(utoipa::IntoParams))]
#[cfg_attr(feature = "docs", into_params(parameter_in = Query))]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoverQuery {
    /// Network identifier to scan
    pub bssid: String,
}

#[cfg_attr(feature = "docs", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceResponse {
    /// Device identifier
    pub id: Id,
    /// Owning room, `None` while unassigned
    pub room_id: Option<Id>,
    /// Device name
    pub name: String,
    /// Device category
    pub device_type: DeviceType,
    /// Power state
    pub state: PowerState,
    /// Whether the controller is reachable
    pub online: bool,
    /// Fan level, fans only
    pub speed: Option<u8>,
    /// Stream locator, cameras only
    pub stream_url: Option<String>,
    /// Human detection flag, cameras only
    pub human_detection_enabled: Option<bool>,
    /// Whether a camera is recording, follows `state`
    pub recording: bool,
    /// Last temperature reading in Celsius, sensors only
    pub temperature: Option<f32>,
    /// Last relative humidity reading, sensors only
    pub humidity: Option<f32>,
    /// Temperature alert threshold, sensors only
    pub temperature_threshold: Option<f32>,
    /// Set when the last temperature exceeds the threshold
    pub alert: bool,
    /// Controller hardware address
    pub controller_mac: Option<String>,
    /// Network the controller joined
    pub bssid: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl DeviceResponse {
    /// Builds a fresh record from a creation request, keeping only the
    /// attributes that belong to the requested device type.
    pub fn from_request(
        id: Id,
        request: &CreateDeviceRequest,
        now: OffsetDateTime,
    ) -> Result<Self, ControlError> {
        let device_type = request.device_type;

        let speed = match device_type {
            DeviceType::Fan => {
                let speed = request.speed.unwrap_or(FAN_SPEED_OFF);
                if speed > FAN_SPEED_MAX {
                    return Err(ControlError::SpeedOutOfRange(speed));
                }
                Some(speed)
            }
            _ => None,
        };

        let (stream_url, human_detection_enabled) = match device_type {
            DeviceType::Camera => (
                request.stream_url.clone(),
                Some(request.human_detection_enabled.unwrap_or(false)),
            ),
            _ => (None, None),
        };

        let state = match device_type {
            DeviceType::Sensor => PowerState::On,
            _ => PowerState::Off,
        };

        let mut device = Self {
            id,
            room_id: request.room_id,
            name: request.name.clone(),
            device_type,
            state,
            online: true,
            speed,
            stream_url,
            human_detection_enabled,
            recording: false,
            temperature: None,
            humidity: None,
            temperature_threshold: None,
            alert: false,
            controller_mac: request.controller_mac.clone(),
            bssid: request.bssid.clone(),
            created_at: now,
            updated_at: now,
        };
        device.refresh_derived();

        Ok(device)
    }

    pub fn is_assigned(&self) -> bool {
        self.room_id.is_some()
    }

    pub fn is_on(&self) -> bool {
        self.state == PowerState::On
    }

    /// Recomputes `recording` and `alert` from the stored attributes.
    pub fn refresh_derived(&mut self) {
        self.recording = self.device_type == DeviceType::Camera && self.is_on();
        self.alert = self.device_type == DeviceType::Sensor
            && temperature_alert(self.temperature, self.temperature_threshold);
    }

    /// Stores a new sensor reading.
    pub fn record_reading(&mut self, temperature: f32, humidity: f32) {
        if self.device_type != DeviceType::Sensor {
            return;
        }
        self.temperature = Some(temperature);
        self.humidity = Some(humidity);
        self.refresh_derived();
    }
}

/// `true` only when both values are known and the reading is above the threshold.
pub fn temperature_alert(temperature: Option<f32>, threshold: Option<f32>) -> bool {
    match (temperature, threshold) {
        (Some(temperature), Some(threshold)) => temperature > threshold,
        _ => false,
    }
}
