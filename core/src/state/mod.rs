//! # Snapshot model
//!
//! A [`RecceState`] records one analysis session: executed runs, saved checks,
//! the artifacts of both environments, and repository / pull request context.
//!
//! Layout on disk (JSON):
//!
//! ```text
//! { "metadata": {...}, "runs": [...], "checks": [...],
//!   "artifacts": {"base": {...}, "current": {...}},
//!   "git": {...}, "pull_request": {...} }
//! ```

pub mod models;
pub mod provider;
pub mod run;
pub mod schema;
pub mod snapshot;

pub use models::{
    ArtifactsRoot, GitRepoInfo, PullRequestId, PullRequestInfo, PullRequestRef, RecceState,
    RecceStateMetadata, STATE_ARTIFACT_NAME,
};
pub use provider::{ArtifactProvider, BranchLookup, RunExecutor, RunOutput};
pub use run::{Check, Run, RunType};
pub use schema::{
    is_supported, validate_schema_version, DEFAULT_SCHEMA_VERSION, SUPPORTED_SCHEMA_VERSIONS,
};
pub use snapshot::{deserialize, serialize};
