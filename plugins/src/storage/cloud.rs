//! Recce Cloud backend: presigned upload through the control-plane API.

use std::time::Instant;

use async_trait::async_trait;
use recce_state_core::api::{
    PullRequestRef, StateError, StorageBackend, STATE_ARTIFACT_NAME,
};

use super::missing_pull_request;
use crate::http::{ensure_success, from_reqwest, parse_json_response};

pub struct CloudApiBackend {
    http: reqwest::Client,
    api_host: String,
    token: Option<String>,
}

impl CloudApiBackend {
    pub fn new(api_host: &str, token: Option<String>, timeout_ms: u64) -> Result<Self, StateError> {
        Ok(Self {
            http: crate::http::build_client(timeout_ms)?,
            api_host: api_host.trim_end_matches('/').to_string(),
            token,
        })
    }

    pub fn upload_url(&self, pull_request: &PullRequestRef) -> String {
        format!(
            "{}/api/v1/{}/pulls/{}/artifacts/upload?artifact_name={}",
            self.api_host, pull_request.repository, pull_request.id, STATE_ARTIFACT_NAME
        )
    }

    fn token(&self) -> Result<&str, StateError> {
        self.token
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                StateError::configuration(
                    "No Recce Cloud token is configured.",
                    "Set RECCE_CLOUD_TOKEN or pass a token in the cloud options.",
                )
            })
    }

    /// Step 1: trade the bearer token for a presigned upload URL.
    async fn presigned_url(&self, pull_request: &PullRequestRef) -> Result<String, StateError> {
        let url = self.upload_url(pull_request);
        tracing::debug!(
            target: "recce.state",
            stage = "storage.cloud.presign.in",
            url = %url
        );
        let resp = self
            .http
            .post(&url)
            .bearer_auth(self.token()?)
            .send()
            .await
            .map_err(|err| from_reqwest(err, &url))?;
        let status = resp.status();
        let body = parse_json_response(resp).await?;
        tracing::debug!(
            target: "recce.state",
            stage = "storage.cloud.presign.out",
            status = %status
        );
        body.get("presigned_url")
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .ok_or_else(|| {
                StateError::storage("decode", format!("response has no presigned_url: {body}"))
            })
    }
}

#[async_trait]
impl StorageBackend for CloudApiBackend {
    fn name(&self) -> &str {
        "cloud_api"
    }

    /// The control plane exposes no download endpoint; cloud API mode is
    /// export-only.
    async fn fetch(&self, _pull_request: Option<&PullRequestRef>) -> Result<Vec<u8>, StateError> {
        Err(StateError::Unsupported(
            "loading state from Recce Cloud is not available; cloud mode is export-only"
                .to_string(),
        ))
    }

    async fn store(
        &self,
        bytes: Vec<u8>,
        pull_request: Option<&PullRequestRef>,
    ) -> Result<String, StateError> {
        let pull_request = pull_request.ok_or_else(missing_pull_request)?;
        let started = Instant::now();
        let presigned_url = self.presigned_url(pull_request).await?;

        // Step 2: push the snapshot straight to storage.
        tracing::debug!(
            target: "recce.state",
            stage = "storage.cloud.upload.in",
            bytes = bytes.len()
        );
        let resp = self
            .http
            .put(&presigned_url)
            .body(bytes)
            .send()
            .await
            .map_err(|err| from_reqwest(err, &presigned_url))?;
        let status = resp.status();
        ensure_success(resp).await?;
        tracing::info!(
            target: "recce.state",
            stage = "storage.cloud.upload.out",
            status = %status,
            "Upload state completed in {:.2} seconds",
            started.elapsed().as_secs_f64()
        );
        Ok("The state file is uploaded to Recce Cloud.".to_string())
    }
}
