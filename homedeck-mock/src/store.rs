use homedeck_api::models::*;
use homedeck_api::{Error, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use time::OffsetDateTime;

use crate::settings::{Seed, SeedError, SimulationOptions};
use crate::simulate::{day_fraction, drift_reading, first_reading};

/// In-memory household. All mutations are synchronous; the caller
/// serializes access.
#[derive(Debug)]
pub struct SimulatedStore {
    user: UserResponse,
    homes: Vec<HomeResponse>,
    rooms: Vec<RoomResponse>,
    devices: Vec<DeviceResponse>,
    log: ActivityLog,
    next_id: Id,
    room_checks: bool,
    sensor_drift: bool,
    rng: StdRng,
}

impl SimulatedStore {
    pub fn from_seed(seed: &Seed, options: &SimulationOptions) -> std::result::Result<Self, SeedError> {
        let now = OffsetDateTime::now_utc();

        let homes = seed
            .homes
            .iter()
            .map(|home| HomeResponse {
                id: home.id,
                name: home.name.clone(),
                location: home.location.clone(),
                owner_id: Some(seed.user.id),
                created_at: now,
                updated_at: now,
            })
            .collect::<Vec<_>>();

        let rooms = seed
            .rooms
            .iter()
            .map(|room| RoomResponse {
                id: room.id,
                home_id: room.home_id,
                name: room.name.clone(),
                created_at: now,
                updated_at: now,
            })
            .collect::<Vec<_>>();

        let mut devices = Vec::with_capacity(seed.devices.len());
        for entry in &seed.devices {
            let request = CreateDeviceRequest {
                room_id: entry.room_id,
                name: entry.name.clone(),
                device_type: entry.device_type,
                controller_mac: entry.controller_mac.clone(),
                bssid: entry.bssid.clone(),
                speed: entry.speed,
                stream_url: entry.stream_url.clone(),
                human_detection_enabled: entry.human_detection_enabled,
            };

            let mut device = DeviceResponse::from_request(entry.id, &request, now).map_err(
                |source| SeedError::Device {
                    device_id: entry.id,
                    source,
                },
            )?;
            device.state = entry.state;
            device.temperature_threshold = entry.temperature_threshold;
            if let (Some(temperature), Some(humidity)) = (entry.temperature, entry.humidity) {
                device.record_reading(temperature, humidity);
            }
            device.refresh_derived();
            devices.push(device);
        }

        let next_id = homes
            .iter()
            .map(|home| home.id)
            .chain(rooms.iter().map(|room| room.id))
            .chain(devices.iter().map(|device| device.id))
            .max()
            .unwrap_or(0)
            + 1;

        let rng = match options.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        let mut log = ActivityLog::new();
        log.info("System initialized");

        Ok(Self {
            user: UserResponse {
                id: seed.user.id,
                username: seed.user.username.clone(),
                email: seed.user.email.clone(),
            },
            homes,
            rooms,
            devices,
            log,
            next_id,
            room_checks: options.room_checks,
            sensor_drift: options.sensor_drift,
            rng,
        })
    }

    pub fn user(&self) -> &UserResponse {
        &self.user
    }

    pub fn log_info(&mut self, message: impl Into<String>) {
        self.log.info(message);
    }

    fn next_id(&mut self) -> Id {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn homes(&self) -> Vec<HomeResponse> {
        self.homes.clone()
    }

    pub fn create_home(&mut self, request: CreateHomeRequest) -> HomeResponse {
        let now = OffsetDateTime::now_utc();
        let home = HomeResponse {
            id: self.next_id(),
            name: request.name,
            location: request.location,
            owner_id: Some(self.user.id),
            created_at: now,
            updated_at: now,
        };

        self.log.info(format!("New home created: {}", home.name));
        self.homes.push(home.clone());

        home
    }

    pub fn update_home(&mut self, id: Id, request: UpdateHomeRequest) -> Result<HomeResponse> {
        let home = self
            .homes
            .iter_mut()
            .find(|home| home.id == id)
            .ok_or_else(|| Error::not_found(format!("Home {id}")))?;

        if let Some(name) = request.name {
            home.name = name;
        }
        if request.location.is_some() {
            home.location = request.location;
        }
        home.updated_at = OffsetDateTime::now_utc();

        let home = home.clone();
        self.log.info(format!("Home updated: {}", home.name));

        Ok(home)
    }

    /// Removes the home and its rooms. Devices of those rooms become unassigned.
    pub fn delete_home(&mut self, id: Id) -> Result<()> {
        let index = self
            .homes
            .iter()
            .position(|home| home.id == id)
            .ok_or_else(|| Error::not_found(format!("Home {id}")))?;
        let home = self.homes.remove(index);

        let room_ids = self
            .rooms
            .iter()
            .filter(|room| room.home_id == id)
            .map(|room| room.id)
            .collect::<Vec<_>>();
        self.rooms.retain(|room| room.home_id != id);
        for room_id in room_ids {
            self.release_room(room_id);
        }

        self.log.warning(format!("Home deleted: {}", home.name));

        Ok(())
    }

    pub fn rooms(&self, home_id: Id) -> Vec<RoomResponse> {
        self.rooms
            .iter()
            .filter(|room| room.home_id == home_id)
            .cloned()
            .collect()
    }

    pub fn room(&self, id: Id) -> Result<RoomResponse> {
        self.rooms
            .iter()
            .find(|room| room.id == id)
            .cloned()
            .ok_or_else(|| Error::not_found(format!("Room {id}")))
    }

    pub fn create_room(&mut self, request: CreateRoomRequest) -> Result<RoomResponse> {
        if !self.homes.iter().any(|home| home.id == request.home_id) {
            return Err(Error::not_found(format!("Home {}", request.home_id)));
        }

        let now = OffsetDateTime::now_utc();
        let room = RoomResponse {
            id: self.next_id(),
            home_id: request.home_id,
            name: request.name,
            created_at: now,
            updated_at: now,
        };

        self.log.info(format!("Room added: {}", room.name));
        self.rooms.push(room.clone());

        Ok(room)
    }

    pub fn update_room(&mut self, id: Id, request: UpdateRoomRequest) -> Result<RoomResponse> {
        let room = self
            .rooms
            .iter_mut()
            .find(|room| room.id == id)
            .ok_or_else(|| Error::not_found(format!("Room {id}")))?;

        if let Some(name) = request.name {
            room.name = name;
        }
        room.updated_at = OffsetDateTime::now_utc();

        let room = room.clone();
        self.log.info(format!("Room updated: {}", room.name));

        Ok(room)
    }

    pub fn delete_room(&mut self, id: Id) -> Result<()> {
        let index = self
            .rooms
            .iter()
            .position(|room| room.id == id)
            .ok_or_else(|| Error::not_found(format!("Room {id}")))?;
        let room = self.rooms.remove(index);

        self.release_room(id);
        self.log.warning(format!("Room deleted: {}", room.name));

        Ok(())
    }

    /// Unassigns every device of a room, returning how many were released.
    pub fn release_room(&mut self, room_id: Id) -> usize {
        let now = OffsetDateTime::now_utc();
        let mut released = 0;

        for device in self.devices.iter_mut().filter(|d| d.room_id == Some(room_id)) {
            device.room_id = None;
            device.updated_at = now;
            released += 1;
        }

        released
    }

    fn ensure_room(&self, room_id: Id) -> Result<()> {
        if self.room_checks && !self.rooms.iter().any(|room| room.id == room_id) {
            return Err(Error::not_found(format!("Room {room_id}")));
        }
        Ok(())
    }

    fn device_mut(&mut self, id: Id) -> Result<&mut DeviceResponse> {
        self.devices
            .iter_mut()
            .find(|device| device.id == id)
            .ok_or_else(|| Error::not_found(format!("Device {id}")))
    }

    pub fn devices(&mut self, room_id: Id) -> Vec<DeviceResponse> {
        self.drift_sensors(|device| device.room_id == Some(room_id));
        self.devices
            .iter()
            .filter(|device| device.room_id == Some(room_id))
            .cloned()
            .collect()
    }

    pub fn device(&mut self, id: Id) -> Result<DeviceResponse> {
        self.drift_sensors(|device| device.id == id);
        self.devices
            .iter()
            .find(|device| device.id == id)
            .cloned()
            .ok_or_else(|| Error::not_found(format!("Device {id}")))
    }

    /// Unassigned devices on the given network.
    pub fn discover(&self, bssid: &str) -> Vec<DeviceResponse> {
        self.devices
            .iter()
            .filter(|device| !device.is_assigned() && device.bssid.as_deref() == Some(bssid))
            .cloned()
            .collect()
    }

    pub fn create_device(&mut self, request: CreateDeviceRequest) -> Result<DeviceResponse> {
        if let Some(room_id) = request.room_id {
            self.ensure_room(room_id)?;
        }

        let id = self.next_id();
        let mut device = DeviceResponse::from_request(id, &request, OffsetDateTime::now_utc())?;
        if device.device_type == DeviceType::Sensor {
            let (temperature, humidity) = first_reading(&mut self.rng);
            device.record_reading(temperature, humidity);
        }

        self.log.info(format!("Device installed: {}", device.name));
        self.devices.push(device.clone());

        Ok(device)
    }

    pub fn assign_device(&mut self, id: Id, room_id: Id) -> Result<DeviceResponse> {
        self.ensure_room(room_id)?;

        let room_name = self
            .rooms
            .iter()
            .find(|room| room.id == room_id)
            .map(|room| room.name.clone())
            .unwrap_or_else(|| format!("room {room_id}"));

        let device = self.device_mut(id)?;
        device.room_id = Some(room_id);
        device.updated_at = OffsetDateTime::now_utc();
        let device = device.clone();

        self.log
            .info(format!("Device {} assigned to {}", device.name, room_name));

        Ok(device)
    }

    pub fn unassign_device(&mut self, id: Id) -> Result<()> {
        let device = self.device_mut(id)?;
        device.room_id = None;
        device.updated_at = OffsetDateTime::now_utc();
        let name = device.name.clone();

        self.log.warning(format!("Device removed: {name}"));

        Ok(())
    }

    pub fn control_device(&mut self, id: Id, command: DeviceCommand) -> Result<DeviceResponse> {
        let device = self.device_mut(id)?;
        device.apply_command(&command)?;
        let device = device.clone();

        self.log
            .info(format!("Device {} action: {}", device.name, command));

        Ok(device)
    }

    pub fn toggle_human_detection(&mut self, id: Id, enabled: bool) -> Result<DeviceResponse> {
        let device = self.device_mut(id)?;
        device.set_human_detection(enabled)?;
        let device = device.clone();

        let status = if enabled { "enabled" } else { "disabled" };
        self.log
            .info(format!("Human detection {status} on {}", device.name));

        Ok(device)
    }

    pub fn set_temperature_threshold(
        &mut self,
        id: Id,
        threshold: Option<f32>,
    ) -> Result<DeviceResponse> {
        let device = self.device_mut(id)?;
        device.set_temperature_threshold(threshold)?;
        let device = device.clone();

        match threshold {
            Some(threshold) => self
                .log
                .info(format!("Threshold of {} set to {threshold}°C", device.name)),
            None => self
                .log
                .info(format!("Threshold of {} cleared", device.name)),
        };

        Ok(device)
    }

    pub fn activity_log(&self) -> Vec<ActivityLogResponse> {
        self.log.entries()
    }

    fn drift_sensors(&mut self, matches: impl Fn(&DeviceResponse) -> bool) {
        if !self.sensor_drift {
            return;
        }

        let fraction = day_fraction(OffsetDateTime::now_utc());
        let rng = &mut self.rng;
        for device in self.devices.iter_mut().filter(|device| matches(device)) {
            if let (Some(temperature), Some(humidity)) = (device.temperature, device.humidity) {
                let (temperature, humidity) = drift_reading(rng, temperature, humidity, fraction);
                device.record_reading(temperature, humidity);
            }
        }
    }

    /// Random token suffix so repeated logins are distinguishable.
    pub fn token_nonce(&mut self) -> u32 {
        self.rng.random()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> SimulatedStore {
        let seed = Seed::bundled().unwrap();
        SimulatedStore::from_seed(&seed, &SimulationOptions::instant()).unwrap()
    }

    #[test]
    fn test_seeded_household() {
        let mut store = store();
        assert_eq!(store.homes().len(), 1);
        assert_eq!(store.rooms(1).len(), 2);
        assert_eq!(store.devices(1).len(), 2);
        assert_eq!(store.discover("32:c5:1b:f7:65:fa").len(), 2);
        assert_eq!(store.activity_log()[0].message, "System initialized");

        let camera = store.device(1).unwrap();
        assert!(camera.recording);
    }

    #[test]
    fn test_new_ids_do_not_collide_with_seed() {
        let mut store = store();
        let home = store.create_home(CreateHomeRequest {
            name: "Lake House".to_string(),
            location: None,
        });
        assert_eq!(home.id, 8);
    }

    #[test]
    fn test_delete_room_unassigns_devices() {
        let mut store = store();
        store.delete_room(2).unwrap();

        assert!(store.rooms(1).iter().all(|room| room.id != 2));
        let fan = store.device(3).unwrap();
        assert_eq!(fan.room_id, None);
        assert!(store.discover("32:c5:1b:f7:65:fa").iter().any(|d| d.id == 3));

        let entry = &store.activity_log()[0];
        assert_eq!(entry.severity, LogSeverity::Warning);
        assert_eq!(entry.message, "Room deleted: Bedroom");
    }

    #[test]
    fn test_assign_unknown_room_rejected_only_with_room_checks() {
        let mut store = store();
        assert!(store.assign_device(6, 99).unwrap_err().is_not_found());

        let seed = Seed::bundled().unwrap();
        let options = SimulationOptions::instant().without_room_checks();
        let mut detached = SimulatedStore::from_seed(&seed, &options).unwrap();
        let fan = detached.assign_device(6, 99).unwrap();
        assert_eq!(fan.room_id, Some(99));
        assert_eq!(detached.release_room(99), 1);
    }

    #[test]
    fn test_unsupported_command_leaves_log_untouched() {
        let mut store = store();
        let before = store.activity_log().len();

        let err = store.control_device(2, DeviceCommand::set_speed(2)).unwrap_err();
        assert!(matches!(err, Error::InvalidOperation(_)));
        assert_eq!(store.activity_log().len(), before);
    }
}
