use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// Upload photo request DTO for OpenAPI documentation
/// Note: This struct is for Swagger UI documentation only.
/// The actual handler streams the `photo` field from axum's Multipart extractor.
#[derive(Debug, ToSchema)]
#[allow(dead_code)]
pub struct UploadPhotoDto {
    /// The image to upload
    #[schema(format = Binary, content_media_type = "application/octet-stream")]
    pub photo: String,
}

/// Response DTO for a stored photo
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadPhotoResponseDto {
    /// Always `true`
    pub success: bool,
    /// Public URL of the stored photo
    #[schema(example = "https://drive.google.com/uc?export=view&id=1AbCdEf")]
    pub url: String,
    /// Identifier to pass to the delete endpoint
    #[schema(example = "1AbCdEf")]
    pub file_id: String,
}

/// Response DTO for delete operations
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DeletePhotoResponseDto {
    /// Always `true`
    pub success: bool,
}

/// Path parameters for deleting a photo
#[derive(Debug, Deserialize, Validate)]
pub struct DeletePhotoPath {
    #[validate(
        length(min = 1, max = 512, message = "fileId must be 1-512 characters"),
        regex(
            path = "*crate::shared::validation::FILE_ID_REGEX",
            message = "fileId may only contain letters, digits, '_', '-', '.' and '/'"
        )
    )]
    pub file_id: String,
}

/// Check whether a declared content type is an image
pub fn is_image_mime_type(content_type: &str) -> bool {
    content_type
        .split(';')
        .next()
        .map(|essence| essence.trim().to_ascii_lowercase())
        .is_some_and(|essence| essence.starts_with("image/") && essence.len() > "image/".len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_image_mime_type() {
        assert!(is_image_mime_type("image/png"));
        assert!(is_image_mime_type("IMAGE/JPEG"));
        assert!(is_image_mime_type("image/webp; charset=binary"));
        assert!(!is_image_mime_type("image/"));
        assert!(!is_image_mime_type("application/pdf"));
        assert!(!is_image_mime_type("text/plain"));
    }

    #[test]
    fn test_delete_path_validation() {
        let valid = DeletePhotoPath {
            file_id: "photos/photo_0190e3f1".to_string(),
        };
        assert!(valid.validate().is_ok());

        let invalid = DeletePhotoPath {
            file_id: "bad id?".to_string(),
        };
        assert!(invalid.validate().is_err());
    }

    #[test]
    fn test_upload_response_uses_camel_case() {
        let dto = UploadPhotoResponseDto {
            success: true,
            url: "https://example.test/a.png".to_string(),
            file_id: "abc".to_string(),
        };

        let value = serde_json::to_value(&dto).unwrap();
        assert_eq!(
            value,
            serde_json::json!({ "success": true, "url": "https://example.test/a.png", "fileId": "abc" })
        );
    }
}
