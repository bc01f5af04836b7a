use std::sync::Arc;

use sqlx::{Error, Sqlite, SqlitePool, Transaction};
use time::OffsetDateTime;

use crate::configs::Storage;
use crate::models::Home;

pub struct HomeRepository {
    storage: Arc<Storage>,
}

impl HomeRepository {
    pub fn new(storage: Arc<Storage>) -> Self {
        Self { storage }
    }

    pub fn get_pool(&self) -> &SqlitePool {
        self.storage.get_pool()
    }
}

impl HomeRepository {
    pub async fn create(
        &self,
        item: &Home,
        transaction: &mut Transaction<'_, Sqlite>,
    ) -> Result<i32, Error> {
        let now = OffsetDateTime::now_utc();
        let id = sqlx::query(
            r#"
            INSERT INTO homes (owner_id, name, location, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(item.owner_id)
        .bind(&item.name)
        .bind(&item.location)
        .bind(now)
        .bind(now)
        .execute(&mut **transaction)
        .await?
        .last_insert_rowid();

        Ok(id as i32)
    }

    pub async fn find_by_id(&self, id: i32) -> Result<Option<Home>, Error> {
        let home: Option<Home> = sqlx::query_as("SELECT * FROM homes WHERE id = $1")
            .bind(id)
            .fetch_optional(self.storage.get_pool())
            .await?;

        Ok(home)
    }

    pub async fn find_by_owner_id(&self, owner_id: i32) -> Result<Vec<Home>, Error> {
        let homes: Vec<Home> = sqlx::query_as("SELECT * FROM homes WHERE owner_id = $1 ORDER BY id")
            .bind(owner_id)
            .fetch_all(self.storage.get_pool())
            .await?;

        Ok(homes)
    }

    pub async fn update(
        &self,
        id: i32,
        item: &Home,
        transaction: &mut Transaction<'_, Sqlite>,
    ) -> Result<(), Error> {
        sqlx::query(
            r#"
            UPDATE homes
            SET name = $1, location = $2, updated_at = $3
            WHERE id = $4
            "#,
        )
        .bind(&item.name)
        .bind(&item.location)
        .bind(OffsetDateTime::now_utc())
        .bind(id)
        .execute(&mut **transaction)
        .await?;

        Ok(())
    }

    /// Deletes the home with its rooms, releasing the devices of those rooms.
    pub async fn delete(
        &self,
        id: i32,
        transaction: &mut Transaction<'_, Sqlite>,
    ) -> Result<(), Error> {
        sqlx::query(
            r#"
            UPDATE devices
            SET room_id = NULL, updated_at = $1
            WHERE room_id IN (SELECT id FROM rooms WHERE home_id = $2)
            "#,
        )
        .bind(OffsetDateTime::now_utc())
        .bind(id)
        .execute(&mut **transaction)
        .await?;

        sqlx::query("DELETE FROM rooms WHERE home_id = $1")
            .bind(id)
            .execute(&mut **transaction)
            .await?;

        sqlx::query("DELETE FROM homes WHERE id = $1")
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

    async fn create_owner(storage: &Arc<Storage>) -> i32 {
        sqlx::query("INSERT INTO users (username, password) VALUES ('owner', 'x')")
            .execute(storage.get_pool())
            .await
            .unwrap()
            .last_insert_rowid() as i32
    }

    fn home(owner_id: i32, name: &str) -> Home {
        let now = OffsetDateTime::now_utc();
        Home {
            id: 0,
            owner_id,
            name: name.to_string(),
            location: Some("Ha Noi".to_string()),
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_create_and_update_home() {
        let storage = setup_test_db().await;
        let owner_id = create_owner(&storage).await;
        let repo = HomeRepository::new(storage.clone());

        let mut tx = storage.get_pool().begin().await.unwrap();
        let id = repo.create(&home(owner_id, "MyHome"), &mut tx).await.unwrap();
        tx.commit().await.unwrap();

        let mut tx = storage.get_pool().begin().await.unwrap();
        repo.update(id, &home(owner_id, "Lake House"), &mut tx).await.unwrap();
        tx.commit().await.unwrap();

        let found = repo.find_by_id(id).await.unwrap().unwrap();
        assert_eq!(found.name, "Lake House");
        assert_eq!(repo.find_by_owner_id(owner_id).await.unwrap().len(), 1);
        assert!(repo.find_by_owner_id(owner_id + 1).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_home_cascades_rooms_and_releases_devices() {
        let storage = setup_test_db().await;
        let owner_id = create_owner(&storage).await;
        let repo = HomeRepository::new(storage.clone());

        let mut tx = storage.get_pool().begin().await.unwrap();
        let id = repo.create(&home(owner_id, "MyHome"), &mut tx).await.unwrap();
        tx.commit().await.unwrap();

        sqlx::query("INSERT INTO rooms (home_id, name) VALUES ($1, 'Kitchen')")
            .bind(id)
            .execute(storage.get_pool())
            .await
            .unwrap();
        sqlx::query("INSERT INTO devices (room_id, name, device_type) VALUES (1, 'Lamp', 'LIGHT')")
            .execute(storage.get_pool())
            .await
            .unwrap();

        let mut tx = storage.get_pool().begin().await.unwrap();
        repo.delete(id, &mut tx).await.unwrap();
        tx.commit().await.unwrap();

        assert!(repo.find_by_id(id).await.unwrap().is_none());

        let (rooms,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM rooms")
            .fetch_one(storage.get_pool())
            .await
            .unwrap();
        assert_eq!(rooms, 0);

        let (room_id,): (Option<i32>,) = sqlx::query_as("SELECT room_id FROM devices WHERE name = 'Lamp'")
            .fetch_one(storage.get_pool())
            .await
            .unwrap();
        assert_eq!(room_id, None);
    }
}
