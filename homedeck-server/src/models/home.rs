use homedeck_api::models::HomeResponse;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::Table;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Home {
    pub id: i32,
    pub owner_id: i32,
    pub name: String,
    pub location: Option<String>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl From<Home> for HomeResponse {
    fn from(home: Home) -> Self {
        HomeResponse {
            id: home.id,
            name: home.name,
            location: home.location,
            owner_id: Some(home.owner_id),
            created_at: home.created_at,
            updated_at: home.updated_at,
        }
    }
}

#[derive(Clone)]
pub struct HomeTable;

impl Table for HomeTable {
    fn name(&self) -> &'static str {
        "homes"
    }

    fn create(&self) -> String {
        String::from(
            r#"
            CREATE TABLE IF NOT EXISTS homes (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                owner_id INTEGER NOT NULL,
                name TEXT NOT NULL,
                location TEXT,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                FOREIGN KEY (owner_id) REFERENCES users (id) ON DELETE CASCADE
            );
            "#,
        )
    }

    fn dispose(&self) -> String {
        String::from("DROP TABLE IF EXISTS homes;")
    }

    fn dependencies(&self) -> Vec<&'static str> {
        vec!["users"]
    }
}
