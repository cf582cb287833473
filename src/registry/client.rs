use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use super::entry::RecordingEntry;
use crate::error::RegistryError;

/// Route served by the registry service
pub const RECORDINGS_PATH: &str = "/api/recordings";

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

/// HTTP client for a remote registry service
#[derive(Debug, Clone)]
pub struct RegistryClient {
    client: reqwest::Client,
    endpoint: String,
}

impl RegistryClient {
    /// `base_url` like `http://127.0.0.1:3000`
    pub fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: format!("{}{}", base_url.trim_end_matches('/'), RECORDINGS_PATH),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub async fn list(&self) -> Result<Vec<RecordingEntry>, RegistryError> {
        debug!("GET {}", self.endpoint);
        let response = self
            .client
            .get(&self.endpoint)
            .send()
            .await
            .map_err(|e| RegistryError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(rejected(response).await);
        }

        response
            .json()
            .await
            .map_err(|e| RegistryError::Read(e.to_string()))
    }

    /// POST a name; the service stores `{name}` only
    pub async fn append(&self, name: &str) -> Result<(), RegistryError> {
        debug!("POST {} ({})", self.endpoint, name);
        let response = self
            .client
            .post(&self.endpoint)
            .json(&json!({ "name": name }))
            .send()
            .await
            .map_err(|e| RegistryError::Network(e.to_string()))?;

        match response.status() {
            StatusCode::CREATED | StatusCode::OK => Ok(()),
            StatusCode::BAD_REQUEST => {
                let message = error_message(response).await;
                Err(RegistryError::Validation(message))
            }
            _ => Err(rejected(response).await),
        }
    }
}

async fn error_message(response: reqwest::Response) -> String {
    let status = response.status();
    match response.json::<ErrorBody>().await {
        Ok(body) => body.error,
        Err(_) => status.to_string(),
    }
}

async fn rejected(response: reqwest::Response) -> RegistryError {
    let status = response.status().as_u16();
    RegistryError::Rejected {
        status,
        message: error_message(response).await,
    }
}
