use std::sync::Arc;

use sqlx::{Error, Sqlite, SqlitePool, Transaction};
use time::OffsetDateTime;

use crate::configs::Storage;
use crate::models::Room;

pub struct RoomRepository {
    storage: Arc<Storage>,
}

impl RoomRepository {
    pub fn new(storage: Arc<Storage>) -> Self {
        Self { storage }
    }

    pub fn get_pool(&self) -> &SqlitePool {
        self.storage.get_pool()
    }
}

impl RoomRepository {
    pub async fn create(
        &self,
        item: &Room,
        transaction: &mut Transaction<'_, Sqlite>,
    ) -> Result<i32, Error> {
        let now = OffsetDateTime::now_utc();
        let id = sqlx::query(
            r#"
            INSERT INTO rooms (home_id, name, created_at, updated_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(item.home_id)
        .bind(&item.name)
        .bind(now)
        .bind(now)
        .execute(&mut **transaction)
        .await?
        .last_insert_rowid();

        Ok(id as i32)
    }

    pub async fn find_by_id(&self, id: i32) -> Result<Option<Room>, Error> {
        let room: Option<Room> = sqlx::query_as("SELECT * FROM rooms WHERE id = $1")
            .bind(id)
            .fetch_optional(self.storage.get_pool())
            .await?;

        Ok(room)
    }

    pub async fn find_by_home_id(&self, home_id: i32) -> Result<Vec<Room>, Error> {
        let rooms: Vec<Room> = sqlx::query_as("SELECT * FROM rooms WHERE home_id = $1 ORDER BY id")
            .bind(home_id)
            .fetch_all(self.storage.get_pool())
            .await?;

        Ok(rooms)
    }

    /// Owner of the home the room belongs to.
    pub async fn find_owner_id(&self, id: i32) -> Result<Option<i32>, Error> {
        let owner: Option<(i32,)> = sqlx::query_as(
            r#"
            SELECT h.owner_id FROM rooms r
            INNER JOIN homes h ON r.home_id = h.id
            WHERE r.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(self.storage.get_pool())
        .await?;

        Ok(owner.map(|(owner_id,)| owner_id))
    }

    pub async fn update(
        &self,
        id: i32,
        item: &Room,
        transaction: &mut Transaction<'_, Sqlite>,
    ) -> Result<(), Error> {
        sqlx::query("UPDATE rooms SET name = $1, updated_at = $2 WHERE id = $3")
            .bind(&item.name)
            .bind(OffsetDateTime::now_utc())
            .bind(id)
            .execute(&mut **transaction)
            .await?;

        Ok(())
    }

    /// Deletes the room, leaving its devices unassigned.
    pub async fn delete(
        &self,
        id: i32,
        transaction: &mut Transaction<'_, Sqlite>,
    ) -> Result<(), Error> {
        sqlx::query("UPDATE devices SET room_id = NULL, updated_at = $1 WHERE room_id = $2")
            .bind(OffsetDateTime::now_utc())
            .bind(id)
            .execute(&mut **transaction)
            .await?;

        sqlx::query("DELETE FROM rooms WHERE id = $1")
            .bind(id)
            .execute(&mut **transaction)
            .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::repositories::test_support::setup_test_db;

    use super::*;

    async fn create_home(storage: &Arc<Storage>) -> i32 {
        sqlx::query("INSERT INTO users (username, password) VALUES ('owner', 'x')")
            .execute(storage.get_pool())
            .await
            .unwrap();
        sqlx::query("INSERT INTO homes (owner_id, name) VALUES (1, 'MyHome')")
            .execute(storage.get_pool())
            .await
            .unwrap()
            .last_insert_rowid() as i32
    }

    fn room(home_id: i32, name: &str) -> Room {
        let now = OffsetDateTime::now_utc();
        Room {
            id: 0,
            home_id,
            name: name.to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_find_rooms_by_home_and_owner() {
        let storage = setup_test_db().await;
        let home_id = create_home(&storage).await;
        let repo = RoomRepository::new(storage.clone());

        let mut tx = storage.get_pool().begin().await.unwrap();
        let living = repo.create(&room(home_id, "Living Room"), &mut tx).await.unwrap();
        repo.create(&room(home_id, "Bedroom"), &mut tx).await.unwrap();
        tx.commit().await.unwrap();

        let rooms = repo.find_by_home_id(home_id).await.unwrap();
        assert_eq!(rooms.len(), 2);
        assert_eq!(rooms[0].name, "Living Room");
        assert_eq!(repo.find_owner_id(living).await.unwrap(), Some(1));
        assert_eq!(repo.find_owner_id(404).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_delete_room_releases_devices() {
        let storage = setup_test_db().await;
        let home_id = create_home(&storage).await;
        let repo = RoomRepository::new(storage.clone());

        let mut tx = storage.get_pool().begin().await.unwrap();
        let id = repo.create(&room(home_id, "Kitchen"), &mut tx).await.unwrap();
        tx.commit().await.unwrap();

        sqlx::query("INSERT INTO devices (room_id, name, device_type) VALUES ($1, 'Lamp', 'LIGHT')")
            .bind(id)
            .execute(storage.get_pool())
            .await
            .unwrap();

        let mut tx = storage.get_pool().begin().await.unwrap();
        repo.delete(id, &mut tx).await.unwrap();
        tx.commit().await.unwrap();

        assert!(repo.find_by_id(id).await.unwrap().is_none());
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM devices WHERE room_id IS NULL")
            .fetch_one(storage.get_pool())
            .await
            .unwrap();
        assert_eq!(count, 1);
    }
}
