//! Response handling shared by the remote backends.

use std::fmt;
use std::time::Duration;

use recce_state_core::api::{StateError, StorageFailure};
use serde_json::Value;

const BODY_PREVIEW_LIMIT: usize = 512;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpErrorKind {
    Timeout,
    Connect,
    Request,
    Body,
    Decode,
    Status,
    Unknown,
}

impl HttpErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Timeout => "timeout",
            Self::Connect => "connect",
            Self::Request => "request",
            Self::Body => "body",
            Self::Decode => "decode",
            Self::Status => "status",
            Self::Unknown => "unknown",
        }
    }

    fn of(err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_connect() {
            Self::Connect
        } else if err.is_request() {
            Self::Request
        } else if err.is_body() {
            Self::Body
        } else if err.is_decode() {
            Self::Decode
        } else {
            Self::Unknown
        }
    }
}

impl fmt::Display for HttpErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn build_client(timeout_ms: u64) -> Result<reqwest::Client, StateError> {
    reqwest::Client::builder()
        .timeout(Duration::from_millis(timeout_ms))
        .build()
        .map_err(|err| StateError::storage("request", format!("build http client: {err}")))
}

pub fn from_reqwest(err: reqwest::Error, url: &str) -> StateError {
    let mut failure = StorageFailure::new(HttpErrorKind::of(&err).as_str(), err.to_string())
        .with_url(url);
    if let Some(status) = err.status() {
        failure = failure.with_status(status.as_u16());
    }
    StateError::Storage(failure)
}

pub fn status_error(status: u16, url: &str, body: &str) -> StateError {
    StateError::Storage(
        StorageFailure::new(HttpErrorKind::Status.as_str(), preview_body(body))
            .with_status(status)
            .with_url(url),
    )
}

fn decode_error(status: u16, url: &str, err: serde_json::Error, body: &str) -> StateError {
    StateError::Storage(
        StorageFailure::new(
            HttpErrorKind::Decode.as_str(),
            format!(
                "failed to decode response body: {} | body={}",
                err,
                preview_body(body)
            ),
        )
        .with_status(status)
        .with_url(url),
    )
}

pub fn preview_body(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "<empty body>".to_string();
    }

    let mut out = String::new();
    let mut truncated = false;
    for (idx, ch) in trimmed.chars().enumerate() {
        if idx >= BODY_PREVIEW_LIMIT {
            truncated = true;
            break;
        }
        out.push(ch);
    }

    if truncated {
        out.push_str("...");
    }

    out
}

/// Passes a 2xx response through; anything else becomes a status error
/// carrying the body preview.
pub async fn ensure_success(resp: reqwest::Response) -> Result<reqwest::Response, StateError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let url = resp.url().to_string();
    let body = resp.text().await.map_err(|err| from_reqwest(err, &url))?;
    Err(status_error(status.as_u16(), &url, &body))
}

pub async fn parse_json_response(resp: reqwest::Response) -> Result<Value, StateError> {
    let resp = ensure_success(resp).await?;
    let status = resp.status().as_u16();
    let url = resp.url().to_string();
    let body = resp.text().await.map_err(|err| from_reqwest(err, &url))?;

    if body.trim().is_empty() {
        return Ok(Value::Null);
    }

    serde_json::from_str::<Value>(&body).map_err(|err| decode_error(status, &url, err, &body))
}
