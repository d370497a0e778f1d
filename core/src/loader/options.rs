use std::path::PathBuf;

use crate::state::{PullRequestId, PullRequestRef};

/// How a loader was launched.
#[derive(Debug, Clone, Default)]
pub struct LoaderOptions {
    /// Review sessions require a pre-existing state file.
    pub review_mode: bool,
    /// Persist to a remote store instead of a local file.
    pub cloud_mode: bool,
    pub state_file: Option<PathBuf>,
    pub cloud: CloudOptions,
}

impl LoaderOptions {
    pub fn local(state_file: impl Into<PathBuf>) -> Self {
        Self {
            state_file: Some(state_file.into()),
            ..Default::default()
        }
    }

    pub fn review(state_file: Option<PathBuf>) -> Self {
        Self {
            review_mode: true,
            state_file,
            ..Default::default()
        }
    }

    pub fn cloud(cloud: CloudOptions) -> Self {
        Self {
            cloud_mode: true,
            cloud,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CloudOptions {
    /// Backend selector; `s3://bucket` picks the object store, anything else
    /// the cloud API.
    pub host: Option<String>,
    pub token: Option<String>,
    pub repository: Option<String>,
    pub pull_request_id: Option<PullRequestId>,
}

impl CloudOptions {
    /// Explicit coordinates, when both halves were given.
    pub fn pull_request_ref(&self) -> Option<PullRequestRef> {
        let repository = self
            .repository
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())?;
        Some(PullRequestRef::new(repository, self.pull_request_id.clone()?))
    }
}
