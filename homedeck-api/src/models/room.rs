use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use validator::Validate;

use super::Id;

#[cfg_attr(feature = "docs", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateRoomRequest {
    /// Parent home identifier
    pub home_id: Id,
    /// Room name
    #[validate(length(min = 1, message = "Room name is required"))]
    pub name: String,
}

#[cfg_attr(feature = "docs", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateRoomRequest {
    /// New room name
    #[validate(length(min = 1, message = "Room name is required"))]
    pub name: Option<String>,
}

#[cfg_attr(feature = "docs", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomResponse {
    /// Room identifier
    pub id: Id,
    /// Parent home identifier
    pub home_id: Id,
    /// Room name
    pub name: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}
