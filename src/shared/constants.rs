/// Multipart field carrying the uploaded photo
pub const PHOTO_FIELD: &str = "photo";

/// Extra body allowance on top of the configured upload size for multipart framing
pub const MULTIPART_OVERHEAD: usize = 1024 * 1024;

/// Google Drive MIME type identifying folders
pub const DRIVE_FOLDER_MIME_TYPE: &str = "application/vnd.google-apps.folder";
