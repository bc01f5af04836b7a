use homedeck_api::models::RoomResponse;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::Table;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Room {
    pub id: i32,
    pub home_id: i32,
    pub name: String,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl From<Room> for RoomResponse {
    fn from(room: Room) -> Self {
        RoomResponse {
            id: room.id,
            home_id: room.home_id,
            name: room.name,
            created_at: room.created_at,
            updated_at: room.updated_at,
        }
    }
}

#[derive(Clone)]
pub struct RoomTable;

impl Table for RoomTable {
    fn name(&self) -> &'static str {
        "rooms"
    }

    fn create(&self) -> String {
        String::from(
            r#"
            CREATE TABLE IF NOT EXISTS rooms (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                home_id INTEGER NOT NULL,
                name TEXT NOT NULL,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                FOREIGN KEY (home_id) REFERENCES homes (id) ON DELETE CASCADE
            );
            "#,
        )
    }

    fn dispose(&self) -> String {
        String::from("DROP TABLE IF EXISTS rooms;")
    }

    fn dependencies(&self) -> Vec<&'static str> {
        vec!["homes"]
    }
}
