//! Storage backends move snapshot bytes to and from one physical medium.
//!
//! `LocalFile` lives here; the network backends are provided by the plugins
//! crate and plugged in through [`StorageBackend`].

pub mod local;

use std::path::PathBuf;

use async_trait::async_trait;

use crate::error::StateError;
use crate::loader::LoaderOptions;
use crate::state::PullRequestRef;

pub use local::{atomic_write, LocalFileBackend};

/// Host prefix that selects the object-store backend.
pub const OBJECT_STORE_SCHEME: &str = "s3://";

#[async_trait]
pub trait StorageBackend: Send + Sync {
    fn name(&self) -> &str;

    /// Fails with `NotFound` when there is nothing stored yet.
    async fn fetch(&self, pull_request: Option<&PullRequestRef>) -> Result<Vec<u8>, StateError>;

    /// Persists the full snapshot and returns a human-readable status line.
    async fn store(
        &self,
        bytes: Vec<u8>,
        pull_request: Option<&PullRequestRef>,
    ) -> Result<String, StateError>;
}

/// Which medium a loader talks to, decided once from its options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageKind {
    LocalFile(PathBuf),
    CloudApi,
    ObjectStore { bucket: String },
}

impl StorageKind {
    /// `None` when nothing is addressable: not in cloud mode and no state file.
    pub fn resolve(options: &LoaderOptions) -> Option<Self> {
        if options.cloud_mode {
            let host = options.cloud.host.as_deref().unwrap_or("").trim();
            return Some(match host.strip_prefix(OBJECT_STORE_SCHEME) {
                Some(bucket) => Self::ObjectStore {
                    bucket: bucket.trim_end_matches('/').to_string(),
                },
                None => Self::CloudApi,
            });
        }
        options.state_file.clone().map(Self::LocalFile)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LocalFile(_) => "local_file",
            Self::CloudApi => "cloud_api",
            Self::ObjectStore { .. } => "object_store",
        }
    }

    pub fn is_remote(&self) -> bool {
        !matches!(self, Self::LocalFile(_))
    }
}
