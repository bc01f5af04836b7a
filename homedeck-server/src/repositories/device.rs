use std::sync::Arc;

use sqlx::{Error, Sqlite, SqlitePool, Transaction};
use time::OffsetDateTime;

use crate::configs::Storage;
use crate::models::Device;

pub struct DeviceRepository {
    storage: Arc<Storage>,
}

impl DeviceRepository {
    pub fn new(storage: Arc<Storage>) -> Self {
        Self { storage }
    }

    pub fn get_pool(&self) -> &SqlitePool {
        self.storage.get_pool()
    }
}

impl DeviceRepository {
    pub async fn create(
        &self,
        item: &Device,
        transaction: &mut Transaction<'_, Sqlite>,
    ) -> Result<i32, Error> {
        let now = OffsetDateTime::now_utc();
        let id = sqlx::query(
            r#"
            INSERT INTO devices (
                room_id, name, device_type, state, online, speed, stream_url,
                human_detection_enabled, temperature, humidity, temperature_threshold,
                controller_mac, bssid, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            "#,
        )
        .bind(item.room_id)
        .bind(&item.name)
        .bind(&item.device_type)
        .bind(&item.state)
        .bind(item.online)
        .bind(item.speed)
        .bind(&item.stream_url)
        .bind(item.human_detection_enabled)
        .bind(item.temperature)
        .bind(item.humidity)
        .bind(item.temperature_threshold)
        .bind(&item.controller_mac)
        .bind(&item.bssid)
        .bind(now)
        .bind(now)
        .execute(&mut **transaction)
        .await?
        .last_insert_rowid();

        Ok(id as i32)
    }

    pub async fn find_by_id(&self, id: i32) -> Result<Option<Device>, Error> {
        let device: Option<Device> = sqlx::query_as("SELECT * FROM devices WHERE id = $1")
            .bind(id)
            .fetch_optional(self.storage.get_pool())
            .await?;

        Ok(device)
    }

    pub async fn find_by_room_id(&self, room_id: i32) -> Result<Vec<Device>, Error> {
        let devices: Vec<Device> = sqlx::query_as("SELECT * FROM devices WHERE room_id = $1 ORDER BY id")
            .bind(room_id)
            .fetch_all(self.storage.get_pool())
            .await?;

        Ok(devices)
    }

    /// Unassigned devices announced on the given network.
    pub async fn find_unassigned_by_bssid(&self, bssid: &str) -> Result<Vec<Device>, Error> {
        let devices: Vec<Device> = sqlx::query_as(
            "SELECT * FROM devices WHERE room_id IS NULL AND bssid = $1 ORDER BY id",
        )
        .bind(bssid)
        .fetch_all(self.storage.get_pool())
        .await?;

        Ok(devices)
    }

    /// Owner of the home the device is placed in, `None` while unassigned.
    pub async fn find_owner_id(&self, id: i32) -> Result<Option<i32>, Error> {
        let owner: Option<(i32,)> = sqlx::query_as(
            r#"
            SELECT h.owner_id FROM devices d
            INNER JOIN rooms r ON d.room_id = r.id
            INNER JOIN homes h ON r.home_id = h.id
            WHERE d.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(self.storage.get_pool())
        .await?;

        Ok(owner.map(|(owner_id,)| owner_id))
    }

    /// Persists the mutable attributes of a device.
    pub async fn update(
        &self,
        id: i32,
        item: &Device,
        transaction: &mut Transaction<'_, Sqlite>,
    ) -> Result<(), Error> {
        sqlx::query(
            r#"
            UPDATE devices
            SET room_id = $1, name = $2, state = $3, online = $4, speed = $5,
                stream_url = $6, human_detection_enabled = $7, temperature = $8,
                humidity = $9, temperature_threshold = $10, updated_at = $11
            WHERE id = $12
            "#,
        )
        .bind(item.room_id)
        .bind(&item.name)
        .bind(&item.state)
        .bind(item.online)
        .bind(item.speed)
        .bind(&item.stream_url)
        .bind(item.human_detection_enabled)
        .bind(item.temperature)
        .bind(item.humidity)
        .bind(item.temperature_threshold)
        .bind(OffsetDateTime::now_utc())
        .bind(id)
        .execute(&mut **transaction)
        .await?;

        Ok(())
    }
}
