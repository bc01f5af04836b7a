use anyhow::anyhow;
use homedeck_api::models::{DeviceResponse, DeviceType, PowerState};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::Table;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Device {
    pub id: i32,
    pub room_id: Option<i32>,
    pub name: String,
    pub device_type: String,
    pub state: String,
    pub online: bool,
    pub speed: Option<i32>,
    pub stream_url: Option<String>,
    pub human_detection_enabled: Option<bool>,
    pub temperature: Option<f32>,
    pub humidity: Option<f32>,
    pub temperature_threshold: Option<f32>,
    pub controller_mac: Option<String>,
    pub bssid: Option<String>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl TryFrom<Device> for DeviceResponse {
    type Error = anyhow::Error;

    fn try_from(device: Device) -> Result<Self, Self::Error> {
        let device_type = device
            .device_type
            .parse::<DeviceType>()
            .map_err(|e| anyhow!("Device {} is corrupt: {e}", device.id))?;
        let state = device
            .state
            .parse::<PowerState>()
            .map_err(|e| anyhow!("Device {} is corrupt: {e}", device.id))?;
        let speed = device.speed.map(u8::try_from).transpose()?;

        let mut response = DeviceResponse {
            id: device.id,
            room_id: device.room_id,
            name: device.name,
            device_type,
            state,
            online: device.online,
            speed,
            stream_url: device.stream_url,
            human_detection_enabled: device.human_detection_enabled,
            recording: false,
            temperature: device.temperature,
            humidity: device.humidity,
            temperature_threshold: device.temperature_threshold,
            alert: false,
            controller_mac: device.controller_mac,
            bssid: device.bssid,
            created_at: device.created_at,
            updated_at: device.updated_at,
        };
        response.refresh_derived();

        Ok(response)
    }
}

impl From<&DeviceResponse> for Device {
    fn from(device: &DeviceResponse) -> Self {
        Device {
            id: device.id,
            room_id: device.room_id,
            name: device.name.clone(),
            device_type: device.device_type.to_string(),
            state: device.state.to_string(),
            online: device.online,
            speed: device.speed.map(i32::from),
            stream_url: device.stream_url.clone(),
            human_detection_enabled: device.human_detection_enabled,
            temperature: device.temperature,
            humidity: device.humidity,
            temperature_threshold: device.temperature_threshold,
            controller_mac: device.controller_mac.clone(),
            bssid: device.bssid.clone(),
            created_at: device.created_at,
            updated_at: device.updated_at,
        }
    }
}

#[derive(Clone)]
pub struct DeviceTable;

impl Table for DeviceTable {
    fn name(&self) -> &'static str {
        "devices"
    }

    fn create(&self) -> String {
        String::from(
            r#"
            CREATE TABLE IF NOT EXISTS devices (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                room_id INTEGER,
                name TEXT NOT NULL,
                device_type TEXT NOT NULL,
                state TEXT NOT NULL DEFAULT 'OFF',
                online BOOLEAN NOT NULL DEFAULT TRUE,
                speed INTEGER,
                stream_url TEXT,
                human_detection_enabled BOOLEAN,
                temperature REAL,
                humidity REAL,
                temperature_threshold REAL,
                controller_mac TEXT,
                bssid TEXT,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                FOREIGN KEY (room_id) REFERENCES rooms (id) ON DELETE SET NULL
            );
            "#,
        )
    }

    fn dispose(&self) -> String {
        String::from("DROP TABLE IF EXISTS devices;")
    }

    fn dependencies(&self) -> Vec<&'static str> {
        vec!["rooms"]
    }
}

#[cfg(test)]
mod tests {
    use homedeck_api::models::CreateDeviceRequest;

    use super::*;

    #[test]
    fn test_row_round_trip_recomputes_derived_flags() {
        let now = OffsetDateTime::now_utc();
        let mut sensor = DeviceResponse::from_request(
            3,
            &CreateDeviceRequest::new("Climate", DeviceType::Sensor).in_room(1),
            now,
        )
        .unwrap();
        sensor.record_reading(31.0, 40.0);
        sensor.temperature_threshold = Some(30.0);

        let row = Device::from(&sensor);
        assert_eq!(row.device_type, "SENSOR");
        assert_eq!(row.state, "ON");

        let restored = DeviceResponse::try_from(row).unwrap();
        assert!(restored.alert);
        assert_eq!(restored.room_id, Some(1));
    }

    #[test]
    fn test_corrupt_row_rejected() {
        let now = OffsetDateTime::now_utc();
        let light = DeviceResponse::from_request(1, &CreateDeviceRequest::new("Lamp", DeviceType::Light), now).unwrap();
        let mut row = Device::from(&light);
        row.device_type = String::from("TOASTER");

        assert!(DeviceResponse::try_from(row).is_err());
    }
}
