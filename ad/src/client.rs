//! HTTP client for a remote alerting service
//!
//! Covers the two CLI surfaces: status/config queries and silence
//! lookup/update. Responses use the service's standard envelope
//! (`{status, data, errorType, error}`).

use std::collections::HashMap;
use std::time::Duration;

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use alerttypes::{AlertError, Silence, SilenceUpdate};

/// Errors from remote API calls.
///
/// `SilenceNotFound` is distinguishable from transport failures so callers
/// can report a missing id without retrying.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("no silence found with id {0}")]
    SilenceNotFound(Uuid),

    #[error("received {status} response from server: {message}")]
    UnexpectedStatus { status: u16, message: String },

    #[error("couldn't decode response body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("server reported error: {0}")]
    Api(String),

    #[error(transparent)]
    Invalid(#[from] AlertError),
}

/// Standard response envelope
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    status: String,
    // No serde(default) here: it would demand T: Default, and a missing
    // key already deserializes to None for Option fields.
    data: Option<T>,
    #[serde(default, rename = "errorType")]
    error_type: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl<T> Envelope<T> {
    fn into_data(self) -> Result<T, ClientError> {
        if self.status != "success" {
            let kind = self.error_type.unwrap_or_else(|| "unknown".into());
            let message = self.error.unwrap_or_default();
            return Err(ClientError::Api(format!("{kind}: {message}")));
        }
        self.data.ok_or_else(|| ClientError::Api("success response with no data".into()))
    }
}

/// Running status of the remote service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteStatus {
    #[serde(default, rename = "configYAML")]
    pub config_yaml: String,
    #[serde(default, rename = "versionInfo")]
    pub version_info: HashMap<String, String>,
    #[serde(default)]
    pub uptime: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SilenceCreated {
    #[serde(rename = "silenceId")]
    silence_id: Uuid,
}

/// Client for the remote alerting service's REST API
pub struct ApiClient {
    base_url: String,
    http: reqwest::Client,
}

impl ApiClient {
    /// Create a client for the service at `base_url`
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/v1/{}", self.base_url, path)
    }

    /// Fetch the service's running status, including its config
    pub async fn status(&self) -> Result<RemoteStatus, ClientError> {
        let url = self.url("status");
        debug!(%url, "querying status");
        let res = self.http.get(&url).send().await?;
        let status = res.status();
        if !status.is_success() {
            return Err(ClientError::UnexpectedStatus {
                status: status.as_u16(),
                message: res.text().await.unwrap_or_default(),
            });
        }
        let envelope: Envelope<RemoteStatus> = res.json().await?;
        envelope.into_data()
    }

    /// Fetch a silence by id
    pub async fn get_silence(&self, id: Uuid) -> Result<Silence, ClientError> {
        let url = self.url(&format!("silence/{id}"));
        debug!(%url, "fetching silence");
        let res = self.http.get(&url).send().await?;
        let status = res.status();
        if status == StatusCode::NOT_FOUND {
            return Err(ClientError::SilenceNotFound(id));
        }
        if !status.is_success() {
            return Err(ClientError::UnexpectedStatus {
                status: status.as_u16(),
                message: res.text().await.unwrap_or_default(),
            });
        }
        let envelope: Envelope<Silence> = res.json().await?;
        envelope.into_data()
    }

    /// Submit a silence. The service treats a submission carrying an
    /// existing id as an update; the returned id identifies the stored
    /// record.
    pub async fn add_silence(&self, silence: &Silence) -> Result<Uuid, ClientError> {
        let url = self.url("silences");
        debug!(%url, "submitting silence");
        let res = self.http.post(&url).json(silence).send().await?;
        let status = res.status();
        if !status.is_success() {
            return Err(ClientError::UnexpectedStatus {
                status: status.as_u16(),
                message: res.text().await.unwrap_or_default(),
            });
        }
        let envelope: Envelope<SilenceCreated> = res.json().await?;
        Ok(envelope.into_data()?.silence_id)
    }

    /// Fetch a silence, apply the given mutations, and re-submit it
    pub async fn update_silence(&self, id: Uuid, update: &SilenceUpdate) -> Result<Uuid, ClientError> {
        let silence = self.get_silence(id).await?;
        let updated = update.apply(&silence)?;
        self.add_silence(&updated).await
    }
}
