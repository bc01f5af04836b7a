use std::sync::Arc;

use crate::errors::{ApiError, DeviceError, HomeError, RoomError};
use crate::models::{Device, Home, Room};
use crate::repositories::{DeviceRepository, HomeRepository, RoomRepository};

/// Resolves resources on behalf of a user, enforcing home ownership.
pub struct PermissionService {
    home_repository: Arc<HomeRepository>,
    room_repository: Arc<RoomRepository>,
    device_repository: Arc<DeviceRepository>,
}

impl PermissionService {
    pub fn new(
        home_repository: Arc<HomeRepository>,
        room_repository: Arc<RoomRepository>,
        device_repository: Arc<DeviceRepository>,
    ) -> Self {
        Self {
            home_repository,
            room_repository,
            device_repository,
        }
    }

    pub async fn owned_home(&self, user_id: i32, home_id: i32) -> Result<Home, ApiError> {
        let home = self
            .home_repository
            .find_by_id(home_id)
            .await?
            .ok_or(HomeError::HomeNotFound)?;

        if home.owner_id != user_id {
            return Err(HomeError::InsufficientPermission.into());
        }

        Ok(home)
    }

    pub async fn owned_room(&self, user_id: i32, room_id: i32) -> Result<Room, ApiError> {
        let room = self
            .room_repository
            .find_by_id(room_id)
            .await?
            .ok_or(RoomError::RoomNotFound)?;

        match self.room_repository.find_owner_id(room_id).await? {
            Some(owner_id) if owner_id == user_id => Ok(room),
            _ => Err(RoomError::InsufficientPermission.into()),
        }
    }

    /// Placed devices belong to the home owner; unassigned ones to anyone on the network.
    pub async fn accessible_device(&self, user_id: i32, device_id: i32) -> Result<Device, ApiError> {
        let device = self
            .device_repository
            .find_by_id(device_id)
            .await?
            .ok_or(DeviceError::DeviceNotFound)?;

        match self.device_repository.find_owner_id(device_id).await? {
            Some(owner_id) if owner_id != user_id => {
                Err(DeviceError::InsufficientPermission.into())
            }
            _ => Ok(device),
        }
    }
}
