use chrono::Utc;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

use crate::core::config::ServiceAccountKey;
use crate::core::error::StorageError;

/// OAuth scope granting full Drive access to the service account
const DRIVE_SCOPE: &str = "https://www.googleapis.com/auth/drive";

/// Lifetime requested for signed assertions (Google caps this at one hour)
const ASSERTION_LIFETIME_SECS: i64 = 3600;

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

#[derive(Debug, Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

/// Response from Google's OAuth2 token endpoint
#[derive(Debug, Clone, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

struct TokenCache {
    token: TokenResponse,
    fetched_at: Instant,
}

/// Exchanges signed service-account assertions for Drive access tokens
pub struct GoogleTokenManager {
    client_email: String,
    token_uri: String,
    key_id: Option<String>,
    encoding_key: EncodingKey,
    client: reqwest::Client,
    cache: RwLock<Option<TokenCache>>,
    /// Refresh token this long before it expires
    refresh_margin: Duration,
}

impl GoogleTokenManager {
    /// Fails when the private key in the credentials is not a readable RSA PEM
    pub fn new(
        credentials: &ServiceAccountKey,
        client: reqwest::Client,
    ) -> Result<Self, StorageError> {
        let encoding_key = EncodingKey::from_rsa_pem(credentials.private_key.as_bytes())
            .map_err(|e| {
                StorageError::Backend(format!("Invalid service account private key: {}", e))
            })?;

        Ok(Self {
            client_email: credentials.client_email.clone(),
            token_uri: credentials.token_uri.clone(),
            key_id: credentials.private_key_id.clone(),
            encoding_key,
            client,
            cache: RwLock::new(None),
            refresh_margin: Duration::from_secs(60),
        })
    }

    pub fn client_email(&self) -> &str {
        &self.client_email
    }

    /// Get a valid access token, fetching a new one if necessary
    pub async fn access_token(&self) -> Result<String, StorageError> {
        {
            let cache = self.cache.read().await;
            if let Some(ref cached) = *cache {
                let elapsed = cached.fetched_at.elapsed();
                let expires_in = Duration::from_secs(cached.token.expires_in);

                if elapsed + self.refresh_margin < expires_in {
                    return Ok(cached.token.access_token.clone());
                }
            }
        }

        self.fetch_token().await
    }

    fn sign_assertion(&self) -> Result<String, StorageError> {
        let now = Utc::now().timestamp();
        let claims = AssertionClaims {
            iss: &self.client_email,
            scope: DRIVE_SCOPE,
            aud: &self.token_uri,
            iat: now,
            exp: now + ASSERTION_LIFETIME_SECS,
        };

        let mut header = Header::new(Algorithm::RS256);
        header.kid = self.key_id.clone();

        jsonwebtoken::encode(&header, &claims, &self.encoding_key)
            .map_err(|e| StorageError::Backend(format!("Failed to sign token assertion: {}", e)))
    }

    async fn fetch_token(&self) -> Result<String, StorageError> {
        tracing::debug!("Fetching new Google access token from {}", self.token_uri);

        let assertion = self.sign_assertion()?;

        let response = self
            .client
            .post(&self.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await
            .map_err(|e| StorageError::Backend(format!("Token request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(StorageError::Backend(format!(
                "Token request failed: HTTP {} - {}",
                status, body
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| StorageError::Backend(format!("Invalid token response: {}", e)))?;

        tracing::info!(
            "Fetched new Google access token for {}, expires in {} seconds",
            self.client_email,
            token.expires_in
        );

        let access_token = token.access_token.clone();
        let mut cache = self.cache.write().await;
        *cache = Some(TokenCache {
            token,
            fetched_at: Instant::now(),
        });

        Ok(access_token)
    }
}
