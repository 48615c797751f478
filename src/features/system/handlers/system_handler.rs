use axum::Json;
use chrono::Utc;

use crate::features::system::dtos::{EndpointsDto, HealthResponseDto, RootResponseDto};

/// Describe the service and its endpoints
#[utoipa::path(
    get,
    path = "/",
    tag = "system",
    responses(
        (status = 200, description = "Service description", body = RootResponseDto)
    )
)]
pub async fn root() -> Json<RootResponseDto> {
    Json(RootResponseDto {
        status: "ok".to_string(),
        message: "Photo upload gateway is running".to_string(),
        endpoints: EndpointsDto {
            health: "GET /api/health".to_string(),
            upload_photo: "POST /api/upload-photo".to_string(),
            delete_photo: "DELETE /api/delete-photo/{fileId}".to_string(),
        },
    })
}

/// Liveness check
///
/// Does not contact the storage backend.
#[utoipa::path(
    get,
    path = "/api/health",
    tag = "system",
    responses(
        (status = 200, description = "Service is up", body = HealthResponseDto)
    )
)]
pub async fn health() -> Json<HealthResponseDto> {
    Json(HealthResponseDto {
        status: "ok".to_string(),
        message: "Server is healthy".to_string(),
        timestamp: Utc::now(),
    })
}

#[cfg(test)]
mod tests {
    use crate::features::system::routes;
    use axum_test::TestServer;
    use chrono::{DateTime, Duration, Utc};
    use serde_json::Value;

    #[tokio::test]
    async fn test_health_reports_ok_with_recent_timestamp() {
        let server = TestServer::new(routes()).unwrap();
        let before = Utc::now();

        let response = server.get("/api/health").await;

        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["status"], "ok");
        let timestamp: DateTime<Utc> = body["timestamp"].as_str().unwrap().parse().unwrap();
        assert!(timestamp >= before - Duration::seconds(1));
        assert!(timestamp <= Utc::now() + Duration::seconds(1));
    }

    #[tokio::test]
    async fn test_root_lists_endpoints() {
        let server = TestServer::new(routes()).unwrap();

        let response = server.get("/").await;

        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["status"], "ok");
        assert_eq!(body["endpoints"]["uploadPhoto"], "POST /api/upload-photo");
        assert_eq!(body["endpoints"]["health"], "GET /api/health");
    }
}
