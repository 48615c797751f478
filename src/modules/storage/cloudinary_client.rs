//! Cloudinary storage adapter
//!
//! Uploads go into one fixed folder under a time-ordered generated name.
//! Requests are authenticated with Cloudinary's signed-parameter scheme
//! (SHA-256 over the sorted parameters followed by the API secret).

use async_trait::async_trait;
use chrono::Utc;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::core::config::CloudinaryConfig;
use crate::core::error::StorageError;
use crate::modules::storage::{StagedBlob, StorageAdapter, StorageReference};

#[derive(Debug, Deserialize)]
struct UploadResponse {
    public_id: String,
    secure_url: String,
}

#[derive(Debug, Deserialize)]
struct DestroyResponse {
    result: String,
}

#[derive(Debug, Deserialize)]
struct CloudinaryErrorBody {
    error: CloudinaryErrorDetail,
}

#[derive(Debug, Deserialize)]
struct CloudinaryErrorDetail {
    message: String,
}

/// Storage adapter backed by Cloudinary
pub struct CloudinaryAdapter {
    config: CloudinaryConfig,
    http_client: reqwest::Client,
}

impl CloudinaryAdapter {
    pub fn new(config: CloudinaryConfig) -> Self {
        info!(
            "Cloudinary adapter initialized for cloud '{}' (folder: {})",
            config.cloud_name, config.folder
        );

        Self {
            config,
            http_client: reqwest::Client::new(),
        }
    }

    fn endpoint(&self, action: &str) -> String {
        format!(
            "{}/{}/image/{}",
            self.config.api_base_url, self.config.cloud_name, action
        )
    }

    /// Sign request parameters; `BTreeMap` keeps them in the required order
    fn sign(&self, params: &BTreeMap<&str, String>) -> String {
        signature(params, &self.config.api_secret)
    }
}

fn signature(params: &BTreeMap<&str, String>, api_secret: &str) -> String {
    let to_sign = params
        .iter()
        .map(|(key, value)| format!("{}={}", key, value))
        .collect::<Vec<_>>()
        .join("&");

    hex::encode(Sha256::digest(format!("{}{}", to_sign, api_secret).as_bytes()))
}

/// Unique, upload-time ordered public id for a new photo
fn generate_public_id() -> String {
    format!("photo_{}", Uuid::now_v7().simple())
}

fn transport_error(e: reqwest::Error) -> StorageError {
    error!("Cloudinary request failed: {}", e);
    StorageError::Backend(e.to_string())
}

async fn read_error(response: reqwest::Response) -> StorageError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<CloudinaryErrorBody>(&body)
        .map(|b| b.error.message)
        .unwrap_or_else(|_| format!("Cloudinary returned HTTP {}: {}", status, body));

    error!("Cloudinary error (HTTP {}): {}", status, message);
    StorageError::Backend(message)
}

#[async_trait]
impl StorageAdapter for CloudinaryAdapter {
    fn name(&self) -> &'static str {
        "cloudinary"
    }

    async fn store(&self, blob: &StagedBlob) -> Result<StorageReference, StorageError> {
        let data = blob
            .read()
            .await
            .map_err(|e| StorageError::Backend(format!("Failed to read staged upload: {}", e)))?;

        let mut params = BTreeMap::new();
        params.insert("folder", self.config.folder.clone());
        params.insert("public_id", generate_public_id());
        params.insert("timestamp", Utc::now().timestamp().to_string());
        let signature = self.sign(&params);

        let file = Part::bytes(data)
            .file_name(blob.original_name().to_string())
            .mime_str(blob.mime_type())
            .map_err(|e| StorageError::Backend(format!("Invalid upload content type: {}", e)))?;

        let mut form = Form::new()
            .part("file", file)
            .text("api_key", self.config.api_key.clone())
            .text("signature", signature)
            .text("signature_algorithm", "sha256");
        for (key, value) in params {
            form = form.text(key, value);
        }

        debug!("Uploading '{}' to Cloudinary", blob.original_name());

        let response = self
            .http_client
            .post(self.endpoint("upload"))
            .multipart(form)
            .send()
            .await
            .map_err(transport_error)?;

        if !response.status().is_success() {
            return Err(read_error(response).await);
        }

        let uploaded: UploadResponse = response.json().await.map_err(|e| {
            error!("Failed to parse Cloudinary upload response: {}", e);
            StorageError::Backend(format!("Unexpected Cloudinary response: {}", e))
        })?;

        info!(
            "Uploaded '{}' to Cloudinary as {} ({} bytes)",
            blob.original_name(),
            uploaded.public_id,
            blob.size()
        );

        Ok(StorageReference {
            file_id: uploaded.public_id,
            url: uploaded.secure_url,
        })
    }

    async fn remove(&self, file_id: &str) -> Result<(), StorageError> {
        let mut params = BTreeMap::new();
        params.insert("public_id", file_id.to_string());
        params.insert("timestamp", Utc::now().timestamp().to_string());
        let signature = self.sign(&params);

        let mut form: Vec<(&str, String)> = params.into_iter().collect();
        form.push(("api_key", self.config.api_key.clone()));
        form.push(("signature", signature));
        form.push(("signature_algorithm", "sha256".to_string()));

        let response = self
            .http_client
            .post(self.endpoint("destroy"))
            .form(&form)
            .send()
            .await
            .map_err(transport_error)?;

        if !response.status().is_success() {
            return Err(read_error(response).await);
        }

        let destroyed: DestroyResponse = response.json().await.map_err(|e| {
            error!("Failed to parse Cloudinary destroy response: {}", e);
            StorageError::Backend(format!("Unexpected Cloudinary response: {}", e))
        })?;

        // Cloudinary answers 200 with `{"result": "not found"}` for unknown ids
        if destroyed.result != "ok" {
            error!("Cloudinary refused to delete {}: {}", file_id, destroyed.result);
            return Err(StorageError::Backend(format!(
                "Cloudinary could not delete {}: {}",
                file_id, destroyed.result
            )));
        }

        info!("Deleted Cloudinary image {}", file_id);
        Ok(())
    }
}
