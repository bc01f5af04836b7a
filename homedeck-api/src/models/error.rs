use serde::{Deserialize, Serialize};

/// Body of every non-2xx response.
#[cfg_attr(feature = "docs", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[cfg_attr(feature = "docs", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// HTTP status code
    pub code: u16,
    /// Human readable reason
    pub message: String,
    /// Correlation id of an internal failure
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_id: Option<String>,
}
