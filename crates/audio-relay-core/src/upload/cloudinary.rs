use crate::{
    CoreResult, RelayError, SessionId,
    session::short_random,
    store::Segment,
    upload::{UploadContainer, Uploader},
};

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::{
    Client,
    multipart::{Form, Part},
};
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};

/// Public Cloudinary API host.
pub const DEFAULT_API_BASE: &str = "https://api.cloudinary.com";

/// How much of an error body ends up in the status text.
const ERROR_BODY_LIMIT: usize = 200;

/// Everything the client needs to reach an unsigned upload preset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloudinarySettings {
    /// Account cloud name.
    pub cloud_name: String,
    /// Unsigned upload preset acting as the upload-authorization token.
    pub upload_preset: String,
    /// Scheme and host of the API, without a trailing path.
    pub api_base: String,
    /// Container the PCM payload is wrapped in.
    pub container: UploadContainer,
    /// Per-request transport timeout.
    pub request_timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    #[serde(default)]
    secure_url: Option<String>,
}

/// Unsigned raw upload to Cloudinary.
pub struct CloudinaryUploader {
    client: Client,
    endpoint: String,
    upload_preset: String,
    container: UploadContainer,
}

impl CloudinaryUploader {
    /// Build a client for the given settings.
    ///
    /// # Errors
    ///
    /// [`RelayError::UploadError`] if the HTTP client cannot be constructed.
    #[track_caller]
    #[instrument(skip(settings), fields(cloud_name = %settings.cloud_name))]
    pub fn new(settings: CloudinarySettings) -> CoreResult<Self> {
        let client = Client::builder()
            .timeout(settings.request_timeout)
            .build()
            .map_err(|e| RelayError::upload(format!("Failed to build HTTP client: {}", e)))?;

        let endpoint = upload_endpoint(&settings.api_base, &settings.cloud_name);
        info!(endpoint = %endpoint, container = ?settings.container, "Upload client ready");

        Ok(Self {
            client,
            endpoint,
            upload_preset: settings.upload_preset,
            container: settings.container,
        })
    }

    /// Full upload URL.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl Uploader for CloudinaryUploader {
    #[instrument(skip(self, segment, session), fields(segment_id = %segment.id))]
    async fn upload(
        &self,
        segment: &Segment,
        session: &SessionId,
        sequence_index: usize,
    ) -> CoreResult<String> {
        let name = object_name(
            session,
            sequence_index,
            Utc::now().timestamp_millis(),
            &short_random(),
        );
        let encoded = self.container.encode(segment)?;
        let body_len = encoded.bytes.len();

        let file = Part::bytes(encoded.bytes)
            .file_name(format!("{}.{}", name, encoded.extension))
            .mime_str(&encoded.mime_type)
            .map_err(|e| RelayError::upload(format!("Invalid content type: {}", e)))?;

        let form = Form::new()
            .part("file", file)
            .text("upload_preset", self.upload_preset.clone())
            .text("public_id", name.clone());

        debug!(object = %name, bytes = body_len, "Posting segment");

        let response = self
            .client
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(|e| RelayError::upload(format!("Request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, object = %name, "Upload rejected");
            return Err(RelayError::upload(format!(
                "HTTP {}: {}",
                status,
                truncate(&body, ERROR_BODY_LIMIT)
            )));
        }

        let parsed: UploadResponse = response
            .json()
            .await
            .map_err(|e| RelayError::upload(format!("Unreadable response: {}", e)))?;

        let url = parsed
            .secure_url
            .filter(|url| !url.is_empty())
            .ok_or_else(|| RelayError::upload("Response did not include secure_url"))?;

        info!(object = %name, url = %url, "Segment uploaded");

        Ok(url)
    }
}

/// `<api_base>/v1_1/<cloud_name>/raw/upload`.
pub fn upload_endpoint(api_base: &str, cloud_name: &str) -> String {
    format!(
        "{}/v1_1/{}/raw/upload",
        api_base.trim_end_matches('/'),
        cloud_name
    )
}

/// Remote object name, unique across repeated and concurrent uploads.
pub fn object_name(session: &SessionId, sequence_index: usize, unix_ms: i64, nonce: &str) -> String {
    format!("{}_chunk_{}_{}_{}", session, sequence_index, unix_ms, nonce)
}

fn truncate(text: &str, limit: usize) -> &str {
    match text.char_indices().nth(limit) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
