//! S3-compatible object store backend addressed by pull request.

use std::time::Instant;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Method, StatusCode, Url};
use recce_state_core::api::{ObjectStoreConfig, PullRequestRef, StateError, StorageBackend};

use super::missing_pull_request;
use super::sigv4::{self, Credentials};
use crate::http::{build_client, ensure_success, from_reqwest};

pub struct ObjectStoreBackend {
    http: reqwest::Client,
    bucket: String,
    region: String,
    endpoint: Option<String>,
    credentials: Option<Credentials>,
}

impl ObjectStoreBackend {
    pub fn new(bucket: impl Into<String>, cfg: &ObjectStoreConfig) -> Result<Self, StateError> {
        let non_blank = |v: &Option<String>| {
            v.as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };
        let credentials = match (
            non_blank(&cfg.access_key_id),
            non_blank(&cfg.secret_access_key),
        ) {
            (Some(access_key_id), Some(secret_access_key)) => Some(Credentials {
                access_key_id,
                secret_access_key,
                session_token: non_blank(&cfg.session_token),
            }),
            _ => None,
        };
        Ok(Self {
            http: build_client(cfg.timeout_ms)?,
            bucket: bucket.into(),
            region: cfg.region.clone(),
            endpoint: non_blank(&cfg.endpoint).map(|e| e.trim_end_matches('/').to_string()),
            credentials,
        })
    }

    /// Virtual-hosted AWS URL, or path-style under a custom endpoint.
    pub fn object_url(&self, key: &str) -> Result<Url, StateError> {
        let encoded = sigv4::encode_key(key);
        let raw = match &self.endpoint {
            Some(endpoint) => format!("{}/{}/{}", endpoint, self.bucket, encoded),
            None => format!(
                "https://{}.s3.{}.amazonaws.com/{}",
                self.bucket, self.region, encoded
            ),
        };
        Url::parse(&raw).map_err(|e| {
            StateError::configuration(
                format!("Invalid object store URL {raw}: {e}"),
                "Check the bucket name and the AWS_ENDPOINT_URL_S3 setting.",
            )
        })
    }

    fn credentials(&self) -> Result<&Credentials, StateError> {
        self.credentials.as_ref().ok_or_else(|| {
            StateError::configuration(
                "No object store credentials are configured.",
                "Set AWS_ACCESS_KEY_ID and AWS_SECRET_ACCESS_KEY.",
            )
        })
    }

    async fn send_signed(
        &self,
        method: Method,
        url: &Url,
        body: Vec<u8>,
    ) -> Result<reqwest::Response, StateError> {
        let payload_hash = sigv4::sha256_hex(&body);
        let headers = sigv4::sign(
            method.as_str(),
            url,
            &self.region,
            &payload_hash,
            self.credentials()?,
            Utc::now(),
        );
        let mut req = self.http.request(method, url.clone());
        for (name, value) in headers {
            req = req.header(name, value);
        }
        if !body.is_empty() {
            req = req.body(body);
        }
        req.send()
            .await
            .map_err(|err| from_reqwest(err, url.as_str()))
    }
}

#[async_trait]
impl StorageBackend for ObjectStoreBackend {
    fn name(&self) -> &str {
        "object_store"
    }

    async fn fetch(&self, pull_request: Option<&PullRequestRef>) -> Result<Vec<u8>, StateError> {
        let key = pull_request.ok_or_else(missing_pull_request)?.object_key();
        let url = self.object_url(&key)?;
        tracing::debug!(
            target: "recce.state",
            stage = "storage.object_store.fetch.in",
            bucket = %self.bucket,
            key = %key
        );
        let resp = self.send_signed(Method::GET, &url, Vec::new()).await?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Err(StateError::NotFound(format!("s3://{}/{}", self.bucket, key)));
        }
        let resp = ensure_success(resp).await?;
        let bytes = resp
            .bytes()
            .await
            .map_err(|err| from_reqwest(err, url.as_str()))?;
        Ok(bytes.to_vec())
    }

    async fn store(
        &self,
        bytes: Vec<u8>,
        pull_request: Option<&PullRequestRef>,
    ) -> Result<String, StateError> {
        let key = pull_request.ok_or_else(missing_pull_request)?.object_key();
        let url = self.object_url(&key)?;
        let started = Instant::now();
        tracing::debug!(
            target: "recce.state",
            stage = "storage.object_store.store.in",
            bucket = %self.bucket,
            key = %key,
            bytes = bytes.len()
        );
        let resp = self.send_signed(Method::PUT, &url, bytes).await?;
        ensure_success(resp).await?;
        tracing::info!(
            target: "recce.state",
            stage = "storage.object_store.store.out",
            "Upload state completed in {:.2} seconds",
            started.elapsed().as_secs_f64()
        );
        Ok(format!(
            "The state file is uploaded to 's3://{}/{}'",
            self.bucket, key
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use recce_state_core::api::StateErrorKind;

    const OBJECT_PATH: &str = "/recce-states/github/acme/widgets/pulls/42/recce-state.json";

    fn config(endpoint: Option<String>) -> ObjectStoreConfig {
        ObjectStoreConfig {
            endpoint,
            access_key_id: Some("AKIDEXAMPLE".to_string()),
            secret_access_key: Some("wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY".to_string()),
            ..Default::default()
        }
    }

    fn pr() -> PullRequestRef {
        PullRequestRef::new("acme/widgets", 42i64)
    }

    #[test]
    fn test_object_url_virtual_hosted() {
        let backend = ObjectStoreBackend::new("recce-states", &config(None)).unwrap();
        let url = backend.object_url(&pr().object_key()).unwrap();
        assert_eq!(
            url.as_str(),
            "https://recce-states.s3.us-east-1.amazonaws.com/github/acme/widgets/pulls/42/recce-state.json"
        );
    }

    #[test]
    fn test_object_url_path_style() {
        let backend =
            ObjectStoreBackend::new("recce-states", &config(Some("http://localhost:9000/".into())))
                .unwrap();
        let url = backend.object_url(&pr().object_key()).unwrap();
        assert_eq!(url.path(), OBJECT_PATH);
    }

    #[tokio::test]
    async fn test_store_puts_signed_object() {
        let mut server = Server::new_async().await;
        let body = r#"{"runs":[]}"#;
        let m = server
            .mock("PUT", OBJECT_PATH)
            .match_header(
                "authorization",
                Matcher::Regex(
                    r"^AWS4-HMAC-SHA256 Credential=AKIDEXAMPLE/\d{8}/us-east-1/s3/aws4_request, SignedHeaders=host;x-amz-content-sha256;x-amz-date, Signature=[0-9a-f]{64}$"
                        .to_string(),
                ),
            )
            .match_header(
                "x-amz-content-sha256",
                sigv4::sha256_hex(body.as_bytes()).as_str(),
            )
            .match_body(body)
            .with_status(200)
            .create_async()
            .await;

        let backend =
            ObjectStoreBackend::new("recce-states", &config(Some(server.url()))).unwrap();
        let message = backend
            .store(body.as_bytes().to_vec(), Some(&pr()))
            .await
            .unwrap();

        assert_eq!(
            message,
            "The state file is uploaded to 's3://recce-states/github/acme/widgets/pulls/42/recce-state.json'"
        );
        m.assert_async().await;
    }

    #[tokio::test]
    async fn test_store_access_denied() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("PUT", OBJECT_PATH)
            .with_status(403)
            .with_body("<Error><Code>AccessDenied</Code></Error>")
            .create_async()
            .await;

        let backend =
            ObjectStoreBackend::new("recce-states", &config(Some(server.url()))).unwrap();
        let err = backend.store(b"{}".to_vec(), Some(&pr())).await.unwrap_err();
        assert_eq!(err.kind(), StateErrorKind::Storage);
        assert!(err.detail().contains("AccessDenied"));
    }

    #[tokio::test]
    async fn test_fetch_returns_object_bytes() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", OBJECT_PATH)
            .match_header("x-amz-content-sha256", sigv4::sha256_hex(b"").as_str())
            .with_status(200)
            .with_body(r#"{"checks":[]}"#)
            .create_async()
            .await;

        let backend =
            ObjectStoreBackend::new("recce-states", &config(Some(server.url()))).unwrap();
        let bytes = backend.fetch(Some(&pr())).await.unwrap();
        assert_eq!(bytes, br#"{"checks":[]}"#);
    }

    #[tokio::test]
    async fn test_fetch_missing_object_is_not_found() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", OBJECT_PATH)
            .with_status(404)
            .with_body("<Error><Code>NoSuchKey</Code></Error>")
            .create_async()
            .await;

        let backend =
            ObjectStoreBackend::new("recce-states", &config(Some(server.url()))).unwrap();
        let err = backend.fetch(Some(&pr())).await.unwrap_err();
        assert_eq!(err.kind(), StateErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_missing_credentials_is_configuration_error() {
        let cfg = ObjectStoreConfig {
            endpoint: Some("http://127.0.0.1:9".to_string()),
            ..Default::default()
        };
        let backend = ObjectStoreBackend::new("recce-states", &cfg).unwrap();
        let err = backend.store(b"{}".to_vec(), Some(&pr())).await.unwrap_err();
        assert_eq!(err.kind(), StateErrorKind::Configuration);
        assert!(err.hint().unwrap().contains("AWS_ACCESS_KEY_ID"));
    }
}
