use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Endpoints advertised by the root route
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EndpointsDto {
    pub health: String,
    pub upload_photo: String,
    pub delete_photo: String,
}

/// Response DTO for the root route
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RootResponseDto {
    #[schema(example = "ok")]
    pub status: String,
    pub message: String,
    pub endpoints: EndpointsDto,
}

/// Liveness snapshot; says nothing about storage backend reachability
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponseDto {
    #[schema(example = "ok")]
    pub status: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}
