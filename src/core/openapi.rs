use utoipa::{Modify, OpenApi};

use crate::features::photos::{dtos as photos_dtos, handlers as photos_handlers};
use crate::features::system::{dtos as system_dtos, handlers as system_handlers};
use crate::shared::types::ApiErrorResponse;

#[derive(OpenApi)]
#[openapi(
    paths(
        // System
        system_handlers::root,
        system_handlers::health,
        // Photos
        photos_handlers::upload_photo,
        photos_handlers::delete_photo,
    ),
    components(
        schemas(
            // Shared
            ApiErrorResponse,
            // System
            system_dtos::EndpointsDto,
            system_dtos::RootResponseDto,
            system_dtos::HealthResponseDto,
            // Photos
            photos_dtos::UploadPhotoDto,
            photos_dtos::UploadPhotoResponseDto,
            photos_dtos::DeletePhotoResponseDto,
        )
    ),
    tags(
        (name = "system", description = "Service description and liveness"),
        (name = "photos", description = "Photo upload and deletion"),
    ),
    info(
        title = "Photo Gateway API",
        version = "0.1.0",
        description = "Uploads photos to the configured cloud storage provider",
    )
)]
pub struct ApiDoc;

/// Modifier to override OpenAPI info from config
pub struct SwaggerInfoModifier {
    pub title: String,
    pub version: String,
    pub description: String,
}

impl Modify for SwaggerInfoModifier {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        openapi.info.title = self.title.clone();
        openapi.info.version = self.version.clone();
        openapi.info.description = Some(self.description.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_documents_every_endpoint() {
        let doc = ApiDoc::openapi();
        let paths: Vec<&String> = doc.paths.paths.keys().collect();

        for expected in [
            "/",
            "/api/health",
            "/api/upload-photo",
            "/api/delete-photo/{fileId}",
        ] {
            assert!(
                paths.iter().any(|p| p.as_str() == expected),
                "missing {}",
                expected
            );
        }
    }
}
