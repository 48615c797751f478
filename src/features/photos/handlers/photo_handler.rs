use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        rejection::PathRejection,
        Multipart, Path, State,
    },
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use tracing::debug;
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::features::photos::dtos::{
    is_image_mime_type, DeletePhotoPath, DeletePhotoResponseDto, UploadPhotoDto,
    UploadPhotoResponseDto,
};
use crate::features::photos::services::PhotoService;
use crate::modules::storage::StagedBlob;
use crate::shared::constants::PHOTO_FIELD;
use crate::shared::types::ApiErrorResponse;

const NO_FILE_MESSAGE: &str = "No file uploaded";

fn multipart_error(e: MultipartError) -> AppError {
    debug!("Failed to read multipart body: {}", e);
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::Validation("File too large".to_string())
    } else {
        AppError::BadRequest(format!("Failed to read multipart data: {}", e.body_text()))
    }
}

/// Upload a photo
///
/// Accepts multipart/form-data with a single `photo` field holding an image.
/// Other fields are ignored.
#[utoipa::path(
    post,
    path = "/api/upload-photo",
    tag = "photos",
    request_body(
        content = UploadPhotoDto,
        content_type = "multipart/form-data",
        description = "Form with the image in the `photo` field",
    ),
    responses(
        (status = 200, description = "Photo stored", body = UploadPhotoResponseDto),
        (status = 400, description = "Missing, duplicate, oversized or non-image photo", body = ApiErrorResponse),
        (status = 500, description = "Storage backend failure", body = ApiErrorResponse)
    )
)]
pub async fn upload_photo(
    State(service): State<Arc<PhotoService>>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadPhotoResponseDto>> {
    let mut multipart = multipart.map_err(|e| {
        debug!("Upload request is not multipart: {}", e);
        AppError::Validation(NO_FILE_MESSAGE.to_string())
    })?;

    let mut staged: Option<StagedBlob> = None;

    while let Some(mut field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(PHOTO_FIELD) {
            debug!("Ignoring field: {}", field.name().unwrap_or(""));
            continue;
        }

        if staged.is_some() {
            return Err(AppError::Validation(
                "Only one photo can be uploaded per request".to_string(),
            ));
        }

        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        if !is_image_mime_type(&content_type) {
            return Err(AppError::Validation(format!(
                "File type '{}' is not allowed. Only images can be uploaded",
                content_type
            )));
        }

        let file_name = field
            .file_name()
            .filter(|name| !name.is_empty())
            .unwrap_or("photo")
            .to_string();

        let mut writer = service.begin_upload(&file_name, &content_type)?;
        while let Some(chunk) = field.chunk().await.map_err(multipart_error)? {
            if writer.size() + chunk.len() as u64 > service.max_upload_size() as u64 {
                return Err(AppError::Validation(format!(
                    "File too large. Maximum size is {} bytes ({} MB)",
                    service.max_upload_size(),
                    service.max_upload_size() / 1024 / 1024
                )));
            }
            writer
                .write_chunk(&chunk)
                .await
                .map_err(|e| AppError::Internal(format!("Failed to stage upload: {}", e)))?;
        }

        let blob = writer
            .finish()
            .await
            .map_err(|e| AppError::Internal(format!("Failed to stage upload: {}", e)))?;
        staged = Some(blob);
    }

    let blob = staged.ok_or_else(|| AppError::Validation(NO_FILE_MESSAGE.to_string()))?;
    if blob.size() == 0 {
        return Err(AppError::Validation("Uploaded photo is empty".to_string()));
    }

    let response = service.upload_photo(blob).await?;
    Ok(Json(response))
}

/// Delete a photo
///
/// The identifier is the `fileId` returned by the upload endpoint. It may
/// contain `/`.
#[utoipa::path(
    delete,
    path = "/api/delete-photo/{fileId}",
    tag = "photos",
    params(
        ("fileId" = String, Path, description = "Identifier returned by the upload endpoint")
    ),
    responses(
        (status = 200, description = "Photo deleted", body = DeletePhotoResponseDto),
        (status = 400, description = "Malformed identifier", body = ApiErrorResponse),
        (status = 500, description = "Storage backend failure, including unknown identifiers", body = ApiErrorResponse)
    )
)]
pub async fn delete_photo(
    State(service): State<Arc<PhotoService>>,
    path: std::result::Result<Path<String>, PathRejection>,
) -> Result<Json<DeletePhotoResponseDto>> {
    let Path(file_id) = path.map_err(|e| AppError::Validation(e.body_text()))?;

    let path = DeletePhotoPath { file_id };
    path.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    service.delete_photo(&path.file_id).await?;

    Ok(Json(DeletePhotoResponseDto { success: true }))
}

/// Delete request without a file id
pub async fn delete_photo_without_id() -> Result<Json<DeletePhotoResponseDto>> {
    Err(AppError::Validation("File id is required".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::StorageError;
    use crate::features::photos::routes;
    use crate::modules::storage::StagingArea;
    use crate::shared::test_helpers::RecordingStorage;
    use axum_test::multipart::{MultipartForm, Part};
    use axum_test::TestServer;
    use serde_json::{json, Value};
    use tempfile::TempDir;

    struct Harness {
        server: TestServer,
        storage: Arc<RecordingStorage>,
        staging_dir: TempDir,
    }

    impl Harness {
        fn new(storage: RecordingStorage) -> Self {
            Self::with_limit(storage, 1024)
        }

        fn with_limit(storage: RecordingStorage, max_upload_size: usize) -> Self {
            let storage = Arc::new(storage);
            let staging_dir = tempfile::tempdir().unwrap();
            let staging = StagingArea::new(staging_dir.path()).unwrap();
            let service = Arc::new(PhotoService::new(
                storage.clone(),
                staging,
                max_upload_size,
            ));
            let server = TestServer::new(routes(service)).unwrap();

            Self {
                server,
                storage,
                staging_dir,
            }
        }

        fn staged_files(&self) -> usize {
            std::fs::read_dir(self.staging_dir.path()).unwrap().count()
        }
    }

    fn photo_part(name: &str, mime: &str, data: &[u8]) -> Part {
        Part::bytes(data.to_vec()).file_name(name).mime_type(mime)
    }

    #[tokio::test]
    async fn test_upload_photo_returns_reference_and_cleans_staging() {
        let harness = Harness::new(RecordingStorage::default());

        let response = harness
            .server
            .post("/api/upload-photo")
            .multipart(
                MultipartForm::new()
                    .add_text("caption", "holiday")
                    .add_part("photo", photo_part("cat.png", "image/png", b"\x89PNGcat")),
            )
            .await;

        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(
            body,
            json!({ "success": true, "url": "https://storage.test/file-1", "fileId": "file-1" })
        );

        let uploads = harness.storage.uploads();
        assert_eq!(uploads.len(), 1);
        assert_eq!(uploads[0].original_name, "cat.png");
        assert_eq!(uploads[0].mime_type, "image/png");
        assert_eq!(uploads[0].data, b"\x89PNGcat".to_vec());
        assert!(uploads[0].staged_existed);
        assert!(!uploads[0].staged_path.exists());
        assert_eq!(harness.staged_files(), 0);
    }

    #[tokio::test]
    async fn test_upload_without_photo_is_rejected_without_backend_call() {
        let harness = Harness::new(RecordingStorage::default());

        let response = harness
            .server
            .post("/api/upload-photo")
            .multipart(MultipartForm::new().add_text("caption", "no photo here"))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(body, json!({ "success": false, "error": "No file uploaded" }));
        assert!(harness.storage.uploads().is_empty());
    }

    #[tokio::test]
    async fn test_upload_without_multipart_body_is_rejected() {
        let harness = Harness::new(RecordingStorage::default());

        let response = harness.server.post("/api/upload-photo").await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(body["success"], json!(false));
        assert_eq!(body["error"], json!("No file uploaded"));
        assert!(harness.storage.uploads().is_empty());
    }

    #[tokio::test]
    async fn test_upload_rejects_non_images() {
        let harness = Harness::new(RecordingStorage::default());

        let response = harness
            .server
            .post("/api/upload-photo")
            .multipart(
                MultipartForm::new()
                    .add_part("photo", photo_part("notes.pdf", "application/pdf", b"%PDF")),
            )
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        assert!(harness.storage.uploads().is_empty());
        assert_eq!(harness.staged_files(), 0);
    }

    #[tokio::test]
    async fn test_upload_rejects_two_photos() {
        let harness = Harness::new(RecordingStorage::default());

        let response = harness
            .server
            .post("/api/upload-photo")
            .multipart(
                MultipartForm::new()
                    .add_part("photo", photo_part("a.png", "image/png", b"a"))
                    .add_part("photo", photo_part("b.png", "image/png", b"b")),
            )
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        assert!(harness.storage.uploads().is_empty());
        assert_eq!(harness.staged_files(), 0);
    }

    #[tokio::test]
    async fn test_upload_rejects_oversized_photo() {
        let harness = Harness::with_limit(RecordingStorage::default(), 8);

        let response = harness
            .server
            .post("/api/upload-photo")
            .multipart(
                MultipartForm::new()
                    .add_part("photo", photo_part("big.png", "image/png", &[7u8; 64])),
            )
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert!(body["error"].as_str().unwrap().starts_with("File too large"));
        assert!(harness.storage.uploads().is_empty());
        assert_eq!(harness.staged_files(), 0);
    }

    #[tokio::test]
    async fn test_backend_failure_returns_500_and_cleans_staging() {
        let harness = Harness::new(RecordingStorage::failing(StorageError::Backend(
            "quota exceeded".to_string(),
        )));

        let response = harness
            .server
            .post("/api/upload-photo")
            .multipart(
                MultipartForm::new().add_part("photo", photo_part("cat.png", "image/png", b"cat")),
            )
            .await;

        response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
        let body: Value = response.json();
        assert_eq!(body, json!({ "success": false, "error": "quota exceeded" }));

        let uploads = harness.storage.uploads();
        assert_eq!(uploads.len(), 1);
        assert!(!uploads[0].staged_path.exists());
        assert_eq!(harness.staged_files(), 0);
    }

    #[tokio::test]
    async fn test_permission_failure_carries_remediation_hint() {
        let harness = Harness::new(RecordingStorage::failing(StorageError::Permission(
            "Share the folder with uploader@example.test and give it Editor access.".to_string(),
        )));

        let response = harness
            .server
            .post("/api/upload-photo")
            .multipart(
                MultipartForm::new().add_part("photo", photo_part("cat.png", "image/png", b"cat")),
            )
            .await;

        response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
        let body: Value = response.json();
        assert_eq!(body["success"], json!(false));
        assert!(body["error"].as_str().unwrap().contains("Editor"));
    }

    #[tokio::test]
    async fn test_delete_uploaded_photo_then_unknown_photo() {
        let harness = Harness::new(RecordingStorage::default());

        let uploaded: Value = harness
            .server
            .post("/api/upload-photo")
            .multipart(
                MultipartForm::new().add_part("photo", photo_part("cat.png", "image/png", b"cat")),
            )
            .await
            .json();
        let file_id = uploaded["fileId"].as_str().unwrap();

        let response = harness
            .server
            .delete(&format!("/api/delete-photo/{}", file_id))
            .await;
        response.assert_status_ok();
        assert_eq!(response.json::<Value>(), json!({ "success": true }));

        let response = harness
            .server
            .delete(&format!("/api/delete-photo/{}", file_id))
            .await;
        response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            response.json::<Value>(),
            json!({ "success": false, "error": "File not found: file-1" })
        );
    }

    #[tokio::test]
    async fn test_delete_accepts_identifiers_with_folders() {
        let harness = Harness::new(RecordingStorage::default());

        harness
            .server
            .delete("/api/delete-photo/photos/photo_0190e3f1")
            .await;

        assert_eq!(
            harness.storage.removed.lock().unwrap().clone(),
            vec!["photos/photo_0190e3f1".to_string()]
        );
    }

    #[tokio::test]
    async fn test_delete_without_identifier_returns_error_body() {
        let harness = Harness::new(RecordingStorage::default());

        for path in ["/api/delete-photo/", "/api/delete-photo"] {
            let response = harness.server.delete(path).await;

            response.assert_status(StatusCode::BAD_REQUEST);
            assert_eq!(
                response.json::<Value>(),
                json!({ "success": false, "error": "File id is required" })
            );
        }
        assert!(harness.storage.removed.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_rejects_malformed_identifier() {
        let harness = Harness::new(RecordingStorage::default());

        let response = harness.server.delete("/api/delete-photo/bad%20id").await;

        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(response.json::<Value>()["success"], json!(false));
        assert!(harness.storage.removed.lock().unwrap().is_empty());
    }
}
