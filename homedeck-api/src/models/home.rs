use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use validator::Validate;

use super::Id;

#[cfg_attr(feature = "docs", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateHomeRequest {
    /// Home name
    #[validate(length(min = 1, message = "Home name is required"))]
    pub name: String,
    /// Free-form address or city
    pub location: Option<String>,
}

#[cfg_attr(feature = "docs", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateHomeRequest {
    /// New home name
    #[validate(length(min = 1, message = "Home name is required"))]
    pub name: Option<String>,
    /// New location
    pub location: Option<String>,
}

#[cfg_attr(feature = "docs", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HomeResponse {
    /// Home identifier
    pub id: Id,
    /// Home name
    pub name: String,
    /// Free-form address or city
    pub location: Option<String>,
    /// Owning user
    pub owner_id: Option<Id>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}
