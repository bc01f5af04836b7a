use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::{DeviceResponse, DeviceType, FAN_SPEED_MAX, FAN_SPEED_OFF, PowerState};

#[cfg_attr(feature = "docs", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeviceAction {
    /// Power on
    On,
    /// Power off
    Off,
    /// Change fan level
    SetSpeed,
}

impl Display for DeviceAction {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            DeviceAction::On => write!(f, "ON"),
            DeviceAction::Off => write!(f, "OFF"),
            DeviceAction::SetSpeed => write!(f, "SET_SPEED"),
        }
    }
}

#[cfg_attr(feature = "docs", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceCommand {
    /// Requested action
    pub action: DeviceAction,
    /// Fan level, required by `SET_SPEED`
    pub speed: Option<u8>,
}

impl DeviceCommand {
    pub fn on() -> Self {
        Self {
            action: DeviceAction::On,
            speed: None,
        }
    }

    pub fn off() -> Self {
        Self {
            action: DeviceAction::Off,
            speed: None,
        }
    }

    pub fn set_speed(speed: u8) -> Self {
        Self {
            action: DeviceAction::SetSpeed,
            speed: Some(speed),
        }
    }
}

impl Display for DeviceCommand {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self.speed {
            Some(speed) => write!(f, "{} {}", self.action, speed),
            None => write!(f, "{}", self.action),
        }
    }
}

#[cfg_attr(feature = "docs", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HumanDetectionRequest {
    pub enabled: bool,
}

#[cfg_attr(feature = "docs", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThresholdRequest {
    /// Alert threshold in Celsius, `None` clears it
    pub threshold: Option<f32>,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ControlError {
    #[error("{action} is not supported by {device_type} devices")]
    UnsupportedAction {
        action: DeviceAction,
        device_type: DeviceType,
    },

    #[error("{device_type} devices have no {attribute}")]
    UnsupportedAttribute {
        attribute: &'static str,
        device_type: DeviceType,
    },

    #[error("SET_SPEED requires a speed")]
    MissingSpeed,

    #[error("Fan speed {0} is outside 0..=3")]
    SpeedOutOfRange(u8),
}

impl DeviceResponse {
    /// Applies a power or speed command. A positive fan speed powers the fan on.
    pub fn apply_command(&mut self, command: &DeviceCommand) -> Result<(), ControlError> {
        match command.action {
            DeviceAction::On => self.state = PowerState::On,
            DeviceAction::Off => self.state = PowerState::Off,
            DeviceAction::SetSpeed => {
                if self.device_type != DeviceType::Fan {
                    return Err(ControlError::UnsupportedAction {
                        action: command.action,
                        device_type: self.device_type,
                    });
                }

                let speed = command.speed.ok_or(ControlError::MissingSpeed)?;
                if speed > FAN_SPEED_MAX {
                    return Err(ControlError::SpeedOutOfRange(speed));
                }

                self.speed = Some(speed);
                if speed > FAN_SPEED_OFF {
                    self.state = PowerState::On;
                }
            }
        }

        self.touch();

        Ok(())
    }

    pub fn set_human_detection(&mut self, enabled: bool) -> Result<(), ControlError> {
        if self.device_type != DeviceType::Camera {
            return Err(ControlError::UnsupportedAttribute {
                attribute: "human detection",
                device_type: self.device_type,
            });
        }

        self.human_detection_enabled = Some(enabled);
        self.touch();

        Ok(())
    }

    pub fn set_temperature_threshold(&mut self, threshold: Option<f32>) -> Result<(), ControlError> {
        if self.device_type != DeviceType::Sensor {
            return Err(ControlError::UnsupportedAttribute {
                attribute: "temperature threshold",
                device_type: self.device_type,
            });
        }

        self.temperature_threshold = threshold;
        self.touch();

        Ok(())
    }

    fn touch(&mut self) {
        self.refresh_derived();
        self.updated_at = OffsetDateTime::now_utc();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CreateDeviceRequest;

    fn device(device_type: DeviceType) -> DeviceResponse {
        DeviceResponse::from_request(
            1,
            &CreateDeviceRequest::new("Test", device_type),
            OffsetDateTime::now_utc(),
        )
        .unwrap()
    }

    #[test]
    fn test_power_commands() {
        let mut light = device(DeviceType::Light);
        light.apply_command(&DeviceCommand::on()).unwrap();
        assert_eq!(light.state, PowerState::On);
        light.apply_command(&DeviceCommand::off()).unwrap();
        assert_eq!(light.state, PowerState::Off);
    }

    #[test]
    fn test_set_speed_powers_on_fan() {
        let mut fan = device(DeviceType::Fan);
        assert_eq!(fan.state, PowerState::Off);

        fan.apply_command(&DeviceCommand::set_speed(2)).unwrap();
        assert_eq!(fan.state, PowerState::On);
        assert_eq!(fan.speed, Some(2));
    }

    #[test]
    fn test_set_speed_to_idle_keeps_state() {
        let mut fan = device(DeviceType::Fan);
        fan.apply_command(&DeviceCommand::set_speed(0)).unwrap();
        assert_eq!(fan.state, PowerState::Off);
        assert_eq!(fan.speed, Some(0));

        fan.apply_command(&DeviceCommand::set_speed(3)).unwrap();
        fan.apply_command(&DeviceCommand::set_speed(0)).unwrap();
        assert_eq!(fan.state, PowerState::On);
    }

    #[test]
    fn test_set_speed_rejections() {
        let mut light = device(DeviceType::Light);
        assert!(matches!(
            light.apply_command(&DeviceCommand::set_speed(1)),
            Err(ControlError::UnsupportedAction { .. })
        ));

        let mut fan = device(DeviceType::Fan);
        assert_eq!(
            fan.apply_command(&DeviceCommand::set_speed(9)),
            Err(ControlError::SpeedOutOfRange(9))
        );
        let missing = DeviceCommand {
            action: DeviceAction::SetSpeed,
            speed: None,
        };
        assert_eq!(fan.apply_command(&missing), Err(ControlError::MissingSpeed));
        assert_eq!(fan.speed, Some(0));
    }

    #[test]
    fn test_camera_recording_follows_state() {
        let mut camera = device(DeviceType::Camera);
        camera.apply_command(&DeviceCommand::on()).unwrap();
        assert!(camera.recording);
        camera.set_human_detection(true).unwrap();
        assert_eq!(camera.human_detection_enabled, Some(true));

        let mut fan = device(DeviceType::Fan);
        assert!(fan.set_human_detection(true).is_err());
    }

    #[test]
    fn test_threshold_recomputes_alert() {
        let mut sensor = device(DeviceType::Sensor);
        sensor.set_temperature_threshold(Some(20.0)).unwrap();
        assert!(!sensor.alert);

        sensor.record_reading(24.5, 60.0);
        assert!(sensor.alert);

        sensor.set_temperature_threshold(Some(30.0)).unwrap();
        assert!(!sensor.alert);

        sensor.set_temperature_threshold(None).unwrap();
        assert!(!sensor.alert);

        let mut light = device(DeviceType::Light);
        assert!(light.set_temperature_threshold(Some(10.0)).is_err());
    }

    #[test]
    fn test_command_wire_format() {
        let json = serde_json::to_value(DeviceCommand::set_speed(2)).unwrap();
        assert_eq!(json["action"], "SET_SPEED");
        assert_eq!(json["speed"], 2);
        assert_eq!(DeviceCommand::set_speed(2).to_string(), "SET_SPEED 2");
    }
}
