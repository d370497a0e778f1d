//! Stable re-exports for consumers (`cli`, `plugins`, and external crates).
//!
//! Prefer importing from `recce_state_core::api` instead of reaching into internal modules.

pub use crate::config::{
    apply_env_overrides, load_default, AppConfig, CloudConfig, LoggingConfig, ObjectStoreConfig,
};
pub use crate::error::{StateError, StateErrorKind, StorageFailure};
pub use crate::loader::{CloudOptions, ExportOutcome, LoaderOptions, StateLoader};
pub use crate::state::{
    ArtifactProvider, ArtifactsRoot, BranchLookup, Check, GitRepoInfo, PullRequestId,
    PullRequestInfo, PullRequestRef, RecceState, RecceStateMetadata, Run, RunExecutor, RunOutput,
    RunType, STATE_ARTIFACT_NAME,
};
pub use crate::storage::{LocalFileBackend, StorageBackend, StorageKind, OBJECT_STORE_SCHEME};
