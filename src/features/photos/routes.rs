use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, post},
    Router,
};
use std::sync::Arc;

use crate::features::photos::handlers::{delete_photo, delete_photo_without_id, upload_photo};
use crate::features::photos::services::PhotoService;
use crate::shared::constants::MULTIPART_OVERHEAD;

/// Create routes for the photos feature
pub fn routes(photo_service: Arc<PhotoService>) -> Router {
    let body_limit = photo_service.max_upload_size() + MULTIPART_OVERHEAD;

    Router::new()
        .route(
            "/api/upload-photo",
            post(upload_photo).layer(DefaultBodyLimit::max(body_limit)),
        )
        // Wildcard so Cloudinary public ids, which contain their folder, fit
        .route("/api/delete-photo/{*file_id}", delete(delete_photo))
        // Catch-all segments never match an empty id
        .route("/api/delete-photo", delete(delete_photo_without_id))
        .route("/api/delete-photo/", delete(delete_photo_without_id))
        .with_state(photo_service)
}
