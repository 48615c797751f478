use serde::Deserialize;
use std::env;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

#[derive(Debug, Clone)]
pub struct Config {
    pub app: AppConfig,
    pub storage: StorageConfig,
    pub swagger: SwaggerConfig,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub cors_allowed_origins: Vec<String>,
    pub max_upload_size: usize,
    pub staging_dir: PathBuf,
}

#[derive(Debug, Clone)]
pub struct SwaggerConfig {
    pub title: String,
    pub version: String,
    pub description: String,
}

/// Which external provider receives uploaded photos
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackendKind {
    GoogleDrive,
    Cloudinary,
}

impl FromStr for StorageBackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "google_drive" | "google-drive" | "drive" => Ok(Self::GoogleDrive),
            "cloudinary" => Ok(Self::Cloudinary),
            other => Err(format!(
                "Invalid STORAGE_BACKEND '{}'. Expected 'google_drive' or 'cloudinary'",
                other
            )),
        }
    }
}

/// Storage backend selected at startup, with its provider settings
#[derive(Debug, Clone)]
pub enum StorageConfig {
    GoogleDrive(GoogleDriveConfig),
    Cloudinary(CloudinaryConfig),
}

impl StorageConfig {
    pub fn kind(&self) -> StorageBackendKind {
        match self {
            StorageConfig::GoogleDrive(_) => StorageBackendKind::GoogleDrive,
            StorageConfig::Cloudinary(_) => StorageBackendKind::Cloudinary,
        }
    }
}

/// Google service account key, as downloaded from the Cloud console
#[derive(Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default)]
    pub private_key_id: Option<String>,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    "https://oauth2.googleapis.com/token".to_string()
}

impl fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("client_email", &self.client_email)
            .field("private_key", &"<redacted>")
            .field("private_key_id", &self.private_key_id)
            .field("token_uri", &self.token_uri)
            .finish()
    }
}

impl ServiceAccountKey {
    pub fn from_json(raw: &str) -> Result<Self, String> {
        let key: ServiceAccountKey = serde_json::from_str(raw)
            .map_err(|e| format!("Invalid Google service account credentials: {}", e))?;

        if key.client_email.trim().is_empty() {
            return Err("Google service account credentials have an empty client_email".into());
        }
        if !key.private_key.contains("PRIVATE KEY") {
            return Err("Google service account credentials have no PEM private_key".into());
        }

        Ok(key)
    }
}

/// Google Drive storage configuration
#[derive(Debug, Clone)]
pub struct GoogleDriveConfig {
    pub credentials: ServiceAccountKey,
    /// Shared folder to upload into; skips the folder search when set
    pub folder_id: Option<String>,
    /// Top-level folder searched for (or created) when no folder id is set
    pub parent_folder_name: String,
    /// Sub-folder of the parent that receives the photos
    pub folder_name: String,
    pub api_base_url: String,
    pub upload_base_url: String,
}

/// Cloudinary storage configuration
#[derive(Debug, Clone)]
pub struct CloudinaryConfig {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
    pub folder: String,
    pub api_base_url: String,
}

impl Config {
    /// Reads the process environment; `.env` is loaded by the caller
    pub fn from_env() -> Result<Self, String> {
        Ok(Config {
            app: AppConfig::from_env()?,
            storage: StorageConfig::from_env()?,
            swagger: SwaggerConfig::from_env()?,
        })
    }
}

impl AppConfig {
    const DEFAULT_MAX_UPLOAD_SIZE: usize = 10 * 1024 * 1024; // 10MB

    pub fn from_env() -> Result<Self, String> {
        let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|e| format!("Invalid PORT: {}", e))?;

        let cors_allowed_origins = env::var("CORS_ALLOWED_ORIGINS")
            .unwrap_or_else(|_| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let max_upload_size = env::var("MAX_UPLOAD_SIZE")
            .unwrap_or_else(|_| Self::DEFAULT_MAX_UPLOAD_SIZE.to_string())
            .parse::<usize>()
            .map_err(|_| "MAX_UPLOAD_SIZE must be a valid number".to_string())?;

        let staging_dir = env::var("UPLOAD_STAGING_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| env::temp_dir().join("photo-gateway"));

        Ok(Self {
            host,
            port,
            cors_allowed_origins,
            max_upload_size,
            staging_dir,
        })
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl SwaggerConfig {
    pub fn from_env() -> Result<Self, String> {
        let title = env::var("SWAGGER_TITLE").unwrap_or_else(|_| "Photo Gateway API".to_string());
        let version = env::var("SWAGGER_VERSION").unwrap_or_else(|_| "0.1.0".to_string());
        let description = env::var("SWAGGER_DESCRIPTION").unwrap_or_else(|_| {
            "Uploads photos to the configured cloud storage provider".to_string()
        });

        Ok(Self {
            title,
            version,
            description,
        })
    }
}

impl StorageConfig {
    pub fn from_env() -> Result<Self, String> {
        let kind = env::var("STORAGE_BACKEND")
            .unwrap_or_else(|_| "google_drive".to_string())
            .parse::<StorageBackendKind>()?;

        match kind {
            StorageBackendKind::GoogleDrive => {
                Ok(StorageConfig::GoogleDrive(GoogleDriveConfig::from_env()?))
            }
            StorageBackendKind::Cloudinary => {
                Ok(StorageConfig::Cloudinary(CloudinaryConfig::from_env()?))
            }
        }
    }
}

impl GoogleDriveConfig {
    pub fn from_env() -> Result<Self, String> {
        let raw_credentials = match env::var("GOOGLE_SERVICE_ACCOUNT_JSON") {
            Ok(json) if !json.trim().is_empty() => json,
            _ => {
                let path = env::var("GOOGLE_APPLICATION_CREDENTIALS").map_err(|_| {
                    "GOOGLE_SERVICE_ACCOUNT_JSON or GOOGLE_APPLICATION_CREDENTIALS is required"
                        .to_string()
                })?;
                std::fs::read_to_string(&path)
                    .map_err(|e| format!("Failed to read credentials file '{}': {}", path, e))?
            }
        };
        let credentials = ServiceAccountKey::from_json(&raw_credentials)?;

        let folder_id = env::var("GOOGLE_DRIVE_FOLDER_ID")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        let parent_folder_name =
            env::var("GOOGLE_DRIVE_PARENT_FOLDER").unwrap_or_else(|_| "PhotoGateway".to_string());
        let folder_name = env::var("GOOGLE_DRIVE_FOLDER").unwrap_or_else(|_| "photos".to_string());

        let api_base_url = env::var("GOOGLE_DRIVE_API_URL")
            .unwrap_or_else(|_| "https://www.googleapis.com/drive/v3".to_string());
        let upload_base_url = env::var("GOOGLE_DRIVE_UPLOAD_URL")
            .unwrap_or_else(|_| "https://www.googleapis.com/upload/drive/v3".to_string());

        Ok(Self {
            credentials,
            folder_id,
            parent_folder_name,
            folder_name,
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
            upload_base_url: upload_base_url.trim_end_matches('/').to_string(),
        })
    }
}

impl CloudinaryConfig {
    pub fn from_env() -> Result<Self, String> {
        let cloud_name = env::var("CLOUDINARY_CLOUD_NAME")
            .map_err(|_| "CLOUDINARY_CLOUD_NAME environment variable is required".to_string())?;
        let api_key = env::var("CLOUDINARY_API_KEY")
            .map_err(|_| "CLOUDINARY_API_KEY environment variable is required".to_string())?;
        let api_secret = env::var("CLOUDINARY_API_SECRET")
            .map_err(|_| "CLOUDINARY_API_SECRET environment variable is required".to_string())?;

        let folder = env::var("CLOUDINARY_FOLDER").unwrap_or_else(|_| "photos".to_string());
        let api_base_url = env::var("CLOUDINARY_API_URL")
            .unwrap_or_else(|_| "https://api.cloudinary.com/v1_1".to_string());

        Ok(Self {
            cloud_name,
            api_key,
            api_secret,
            folder,
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
        })
    }
}
