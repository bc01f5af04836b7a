use std::sync::Arc;

use homedeck_api::models::*;
use homedeck_api::{Error, Registry, Result, Session, TokenStore};

/// Message surfaced to the user after a failed call.
#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    /// The target disappeared; the affected collection was reloaded.
    Gone(String),
    /// Network trouble, previous data kept. Safe to retry.
    Retryable(String),
    /// Input rejected, attached to a form field when known.
    Field {
        field: Option<String>,
        message: String,
    },
    /// The device does not support the requested change.
    Rejected(String),
}

impl Notice {
    pub fn message(&self) -> &str {
        match self {
            Notice::Gone(message)
            | Notice::Retryable(message)
            | Notice::Rejected(message)
            | Notice::Field { message, .. } => message,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Collection {
    Homes,
    Rooms,
    Devices,
    Logs,
}

/// Cached view of the household driven through the registry contract.
///
/// Nothing is fetched or changed while the token store is empty. Mutations
/// await the call and then reload the affected collection. Failed reads keep
/// whatever was loaded before.
pub struct Dashboard {
    registry: Arc<dyn Registry>,
    session: Arc<dyn Session>,
    tokens: Arc<TokenStore>,
    homes: Vec<HomeResponse>,
    rooms: Vec<RoomResponse>,
    devices: Vec<DeviceResponse>,
    logs: Vec<ActivityLogResponse>,
    selected_home: Option<Id>,
    selected_room: Option<Id>,
    notices: Vec<Notice>,
    needs_login: bool,
}

impl Dashboard {
    pub fn new(
        registry: Arc<dyn Registry>,
        session: Arc<dyn Session>,
        tokens: Arc<TokenStore>,
    ) -> Self {
        Self {
            registry,
            session,
            tokens,
            homes: Vec::new(),
            rooms: Vec::new(),
            devices: Vec::new(),
            logs: Vec::new(),
            selected_home: None,
            selected_room: None,
            notices: Vec::new(),
            needs_login: false,
        }
    }

    pub fn homes(&self) -> &[HomeResponse] {
        &self.homes
    }

    pub fn rooms(&self) -> &[RoomResponse] {
        &self.rooms
    }

    pub fn devices(&self) -> &[DeviceResponse] {
        &self.devices
    }

    pub fn logs(&self) -> &[ActivityLogResponse] {
        &self.logs
    }

    pub fn selected_home(&self) -> Option<Id> {
        self.selected_home
    }

    pub fn selected_room(&self) -> Option<Id> {
        self.selected_room
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    pub fn dismiss_notices(&mut self) {
        self.notices.clear();
    }

    /// Set while no token is stored or after a call failed authentication.
    /// Cleared by a successful login.
    pub fn needs_login(&self) -> bool {
        self.needs_login
    }

    pub async fn login(&mut self, username: &str, password: &str) -> Option<UserResponse> {
        let request = LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        };

        match self.session.login(request).await {
            Ok(auth) => {
                self.needs_login = false;
                self.refresh_homes().await;
                Some(auth.user)
            }
            Err(e) => {
                self.report(e).await;
                None
            }
        }
    }

    pub async fn refresh_homes(&mut self) {
        self.refresh(Collection::Homes).await;
    }

    pub async fn refresh_rooms(&mut self) {
        self.refresh(Collection::Rooms).await;
    }

    pub async fn refresh_devices(&mut self) {
        self.refresh(Collection::Devices).await;
    }

    pub async fn refresh_logs(&mut self) {
        self.refresh(Collection::Logs).await;
    }

    pub async fn select_home(&mut self, home_id: Id) {
        if self.selected_home != Some(home_id) {
            self.selected_room = None;
            self.devices.clear();
        }
        self.selected_home = Some(home_id);
        self.refresh_rooms().await;
    }

    pub async fn select_room(&mut self, room_id: Id) {
        self.selected_room = Some(room_id);
        self.refresh_devices().await;
    }

    pub async fn create_home(&mut self, name: &str, location: Option<String>) -> Option<HomeResponse> {
        if !self.authorized() {
            return None;
        }

        let request = CreateHomeRequest {
            name: name.to_string(),
            location,
        };
        let result = self.registry.create_home(request).await;
        self.settle(result, Collection::Homes).await
    }

    pub async fn rename_home(&mut self, home_id: Id, name: &str) -> Option<HomeResponse> {
        if !self.authorized() {
            return None;
        }

        let request = UpdateHomeRequest {
            name: Some(name.to_string()),
            location: None,
        };
        let result = self.registry.update_home(home_id, request).await;
        self.settle(result, Collection::Homes).await
    }

    pub async fn delete_home(&mut self, home_id: Id) -> bool {
        if !self.authorized() {
            return false;
        }

        let result = self.registry.delete_home(home_id).await;
        if result.is_ok() && self.selected_home == Some(home_id) {
            self.selected_home = None;
            self.selected_room = None;
            self.rooms.clear();
            self.devices.clear();
        }
        self.settle(result, Collection::Homes).await.is_some()
    }

    /// Adds a room to the selected home.
    pub async fn create_room(&mut self, name: &str) -> Option<RoomResponse> {
        if !self.authorized() {
            return None;
        }

        let Some(home_id) = self.selected_home else {
            self.notices.push(Notice::Field {
                field: Some("home_id".to_string()),
                message: "Select a home first".to_string(),
            });
            return None;
        };

        let request = CreateRoomRequest {
            home_id,
            name: name.to_string(),
        };
        let result = self.registry.create_room(request).await;
        self.settle(result, Collection::Rooms).await
    }

    pub async fn rename_room(&mut self, room_id: Id, name: &str) -> Option<RoomResponse> {
        if !self.authorized() {
            return None;
        }

        let request = UpdateRoomRequest {
            name: Some(name.to_string()),
        };
        let result = self.registry.update_room(room_id, request).await;
        self.settle(result, Collection::Rooms).await
    }

    pub async fn delete_room(&mut self, room_id: Id) -> bool {
        if !self.authorized() {
            return false;
        }

        let result = self.registry.delete_room(room_id).await;
        if result.is_ok() && self.selected_room == Some(room_id) {
            self.selected_room = None;
            self.devices.clear();
        }
        self.settle(result, Collection::Rooms).await.is_some()
    }

    pub async fn device(&mut self, device_id: Id) -> Option<DeviceResponse> {
        if !self.authorized() {
            return None;
        }

        match self.registry.get_device(device_id).await {
            Ok(device) => Some(device),
            Err(e) => {
                self.report(e).await;
                None
            }
        }
    }

    /// Scans the network for unassigned devices. Leaves the cache untouched.
    pub async fn discover(&mut self, bssid: &str) -> Vec<DeviceResponse> {
        if !self.authorized() {
            return Vec::new();
        }

        match self.registry.discover_devices(bssid).await {
            Ok(devices) => devices,
            Err(e) => {
                self.report(e).await;
                Vec::new()
            }
        }
    }

    pub async fn add_device(&mut self, request: CreateDeviceRequest) -> Option<DeviceResponse> {
        if !self.authorized() {
            return None;
        }

        let result = self.registry.create_device(request).await;
        self.settle(result, Collection::Devices).await
    }

    pub async fn assign_device(&mut self, device_id: Id, room_id: Id) -> Option<DeviceResponse> {
        if !self.authorized() {
            return None;
        }

        let result = self.registry.assign_device(device_id, room_id).await;
        self.settle(result, Collection::Devices).await
    }

    pub async fn remove_device(&mut self, device_id: Id) -> bool {
        if !self.authorized() {
            return false;
        }

        let result = self.registry.unassign_device(device_id).await;
        self.settle(result, Collection::Devices).await.is_some()
    }

    pub async fn control_device(&mut self, device_id: Id, command: DeviceCommand) -> Option<DeviceResponse> {
        if !self.authorized() {
            return None;
        }

        let result = self.registry.control_device(device_id, command).await;
        self.settle(result, Collection::Devices).await
    }

    pub async fn toggle_human_detection(&mut self, device_id: Id, enabled: bool) -> Option<DeviceResponse> {
        if !self.authorized() {
            return None;
        }

        let result = self.registry.toggle_human_detection(device_id, enabled).await;
        self.settle(result, Collection::Devices).await
    }

    pub async fn set_temperature_threshold(
        &mut self,
        device_id: Id,
        threshold: Option<f32>,
    ) -> Option<DeviceResponse> {
        if !self.authorized() {
            return None;
        }

        let result = self
            .registry
            .set_temperature_threshold(device_id, threshold)
            .await;
        self.settle(result, Collection::Devices).await
    }

    /// Flags `needs_login` when the token store is empty.
    fn authorized(&mut self) -> bool {
        if !self.tokens.is_authenticated() {
            self.needs_login = true;
        }
        !self.needs_login
    }

    async fn load(&mut self, collection: Collection) -> Result<()> {
        match collection {
            Collection::Homes => {
                self.homes = self.registry.list_homes().await?;
                if let Some(home_id) = self.selected_home {
                    if self.homes.iter().all(|home| home.id != home_id) {
                        self.selected_home = None;
                        self.selected_room = None;
                        self.rooms.clear();
                        self.devices.clear();
                    }
                }
            }
            Collection::Rooms => {
                self.rooms = match self.selected_home {
                    Some(home_id) => self.registry.list_rooms(home_id).await?,
                    None => Vec::new(),
                };
            }
            Collection::Devices => {
                self.devices = match self.selected_room {
                    Some(room_id) => self.registry.list_devices(room_id).await?,
                    None => Vec::new(),
                };
            }
            Collection::Logs => {
                self.logs = self.registry.list_activity_log().await?;
            }
        }

        Ok(())
    }

    async fn refresh(&mut self, collection: Collection) {
        if !self.authorized() {
            return;
        }

        if let Err(e) = self.load(collection).await {
            self.settle_error(e, collection).await;
        }
    }

    /// Invalidates the affected collection after a mutation.
    async fn settle<T>(&mut self, result: Result<T>, collection: Collection) -> Option<T> {
        match result {
            Ok(value) => {
                self.refresh(collection).await;
                if collection != Collection::Logs {
                    self.refresh(Collection::Logs).await;
                }
                Some(value)
            }
            Err(e) => {
                self.settle_error(e, collection).await;
                None
            }
        }
    }

    async fn settle_error(&mut self, error: Error, collection: Collection) {
        let gone = error.is_not_found();
        self.report(error).await;

        if gone {
            if let Err(e) = self.load(collection).await {
                self.report(e).await;
            }
        }
    }

    async fn report(&mut self, error: Error) {
        tracing::debug!("dashboard call failed: {}", error);

        match error {
            Error::Authentication(_) => {
                if let Err(e) = self.session.logout().await {
                    tracing::warn!("Failed to clear token: {}", e);
                }
                self.needs_login = true;
            }
            Error::NotFound { resource } => self.notices.push(Notice::Gone(resource)),
            Error::Validation { field, message } => self.notices.push(Notice::Field { field, message }),
            Error::InvalidOperation(message) => self.notices.push(Notice::Rejected(message)),
            Error::Transport { message, .. } => self.notices.push(Notice::Retryable(message)),
        }
    }
}
