use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::error::ApiError;
use super::types::{Envelope, Mission, MissionUpdate};
use crate::config::NeuriConfig;
use crate::voice::outbox::Backend;

/// Reads are retried at most this many times.
pub const MAX_RETRIES: u32 = 3;

/// Whether a read that has failed `failures` times should be tried again.
pub fn should_retry(failures: u32, error: &ApiError) -> bool {
    error.is_retryable() && failures < MAX_RETRIES
}

/// Exponential backoff: 1s, 2s, 4s, ... capped at 30s.
pub fn retry_delay(attempt: u32) -> Duration {
    let ms = 1000u64.saturating_mul(1u64 << attempt.min(16));
    Duration::from_millis(ms.min(30_000))
}

/// Client for the mission and routine endpoints used by the voice screen.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    http: Client,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::Network(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    pub fn from_config(config: &NeuriConfig) -> Result<Self, ApiError> {
        Self::new(
            config.api_base_url(),
            Duration::from_secs(config.http_timeout_secs),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        log::debug!("[API Request] {} {}", method, path);
        self.http
            .request(method, self.url(path))
            .header("Content-Type", "application/json")
    }

    /// Send and fail on non-success status, returning the raw body text.
    async fn send(&self, req: RequestBuilder, path: &str) -> Result<String, ApiError> {
        let resp = req.send().await.map_err(|e| {
            log::error!("[Network Error] {}: {}", path, e);
            ApiError::from(e)
        })?;

        let status = resp.status();
        let text = resp.text().await?;

        if !status.is_success() {
            let err = ApiError::from_response(status, &text);
            match err {
                ApiError::Authentication => log::warn!("[Auth Error] {} requires authentication", path),
                _ => log::error!("[API Error] {} {}", path, err),
            }
            return Err(err);
        }

        log::debug!("[API Response] {} {}", status.as_u16(), path);
        Ok(text)
    }

    fn decode<T: DeserializeOwned>(text: &str) -> Result<T, ApiError> {
        let env: Envelope<T> =
            serde_json::from_str(text).map_err(|e| ApiError::Decode(e.to_string()))?;
        env.data
            .ok_or_else(|| ApiError::Decode("response has no data".to_string()))
    }

    /// DELETE /missions/{id}
    pub async fn delete_mission(&self, id: &str) -> Result<(), ApiError> {
        let path = format!("/missions/{}", id);
        self.send(self.request(Method::DELETE, &path), &path).await?;
        Ok(())
    }

    /// DELETE /routines/{id}
    pub async fn delete_routine(&self, id: &str) -> Result<(), ApiError> {
        let path = format!("/routines/{}", id);
        self.send(self.request(Method::DELETE, &path), &path).await?;
        Ok(())
    }

    /// PATCH /missions/{id}/complete
    pub async fn complete_mission(&self, id: &str) -> Result<Mission, ApiError> {
        let path = format!("/missions/{}/complete", id);
        let text = self.send(self.request(Method::PATCH, &path), &path).await?;
        Self::decode(&text)
    }

    /// PUT /missions/{id}
    pub async fn update_mission(&self, id: &str, update: &MissionUpdate) -> Result<Mission, ApiError> {
        let path = format!("/missions/{}", id);
        let req = self.request(Method::PUT, &path).json(update);
        let text = self.send(req, &path).await?;
        Self::decode(&text)
    }

    /// GET /missions/user/{user_id}/ai-context, retried with backoff.
    pub async fn ai_context(&self, user_id: &str) -> Result<Value, ApiError> {
        let path = format!("/missions/user/{}/ai-context", user_id);
        let mut failures = 0;
        loop {
            let result = self.send(self.request(Method::GET, &path), &path).await;
            match result.and_then(|text| Self::decode::<Value>(&text)) {
                Ok(ctx) => return Ok(ctx),
                Err(e) if should_retry(failures, &e) => {
                    let delay = retry_delay(failures);
                    failures += 1;
                    log::info!("Retrying {} in {:?} after: {}", path, delay, e);
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

impl Backend for ApiClient {
    async fn delete_mission(&self, id: &str) -> Result<(), ApiError> {
        ApiClient::delete_mission(self, id).await
    }

    async fn delete_routine(&self, id: &str) -> Result<(), ApiError> {
        ApiClient::delete_routine(self, id).await
    }

    async fn complete_mission(&self, id: &str) -> Result<(), ApiError> {
        ApiClient::complete_mission(self, id).await.map(|_| ())
    }
}
