//! # State loader
//!
//! The single entry point other subsystems use to obtain and persist a
//! snapshot. One loader belongs to one session; nothing here is shared or
//! locked.
//!
//! Reads are forgiving: [`StateLoader::load`] never fails, it leaves the loader
//! empty and records why in [`StateLoader::last_load_error`]. Writes are not:
//! [`StateLoader::export`] always reports whether persistence happened.
//!
//! Export is a full overwrite with no check against what the remote holds, so
//! two sessions exporting the same pull request clobber each other.

mod options;
mod outcome;

use std::time::Instant;

pub use options::{CloudOptions, LoaderOptions};
pub use outcome::ExportOutcome;

use crate::error::{StateError, StateErrorKind};
use crate::state::{deserialize, serialize, PullRequestRef, RecceState};
use crate::storage::{LocalFileBackend, StorageBackend, StorageKind};

const REVIEW_WITHOUT_FILE: &str = "Cannot launch server in review mode without a state file.";
const REVIEW_WITHOUT_FILE_HINT: &str = "Please provide a state file in the command argument.";

pub struct StateLoader {
    options: LoaderOptions,
    kind: Option<StorageKind>,
    backend: Option<Box<dyn StorageBackend>>,
    state: Option<RecceState>,
    error_message: Option<String>,
    hint_message: Option<String>,
    last_load_error: Option<StateErrorKind>,
}

impl StateLoader {
    /// `backend` must serve the medium [`StorageKind::resolve`] picks for
    /// `options`; the plugins factory takes care of that pairing.
    pub fn new(options: LoaderOptions, backend: Option<Box<dyn StorageBackend>>) -> Self {
        let kind = StorageKind::resolve(&options);
        Self {
            options,
            kind,
            backend,
            state: None,
            error_message: None,
            hint_message: None,
            last_load_error: None,
        }
    }

    /// Loader over the local state file; no remote backend is available.
    pub fn local(options: LoaderOptions) -> Self {
        let backend = match StorageKind::resolve(&options) {
            Some(StorageKind::LocalFile(path)) => {
                Some(Box::new(LocalFileBackend::new(path)) as Box<dyn StorageBackend>)
            }
            _ => None,
        };
        Self::new(options, backend)
    }

    pub fn options(&self) -> &LoaderOptions {
        &self.options
    }

    pub fn storage_kind(&self) -> Option<&StorageKind> {
        self.kind.as_ref()
    }

    /// Pre-flight check of the configuration; performs no I/O.
    ///
    /// Cloud mode always passes: credentials are only checked when an export
    /// actually talks to the remote.
    pub fn verify(&mut self) -> bool {
        self.clear_messages();
        if self.options.cloud_mode {
            return true;
        }
        if self.options.review_mode && self.options.state_file.is_none() {
            self.error_message = Some(REVIEW_WITHOUT_FILE.to_string());
            self.hint_message = Some(REVIEW_WITHOUT_FILE_HINT.to_string());
            return false;
        }
        true
    }

    fn clear_messages(&mut self) {
        self.error_message = None;
        self.hint_message = None;
    }

    pub fn error_and_hint(&self) -> (Option<&str>, Option<&str>) {
        (self.error_message.as_deref(), self.hint_message.as_deref())
    }

    /// True iff a snapshot is held.
    pub fn is_loaded(&self) -> bool {
        self.state.is_some()
    }

    /// Why the most recent load left the loader empty.
    pub fn last_load_error(&self) -> Option<StateErrorKind> {
        self.last_load_error
    }

    pub fn state(&self) -> Option<&RecceState> {
        self.state.as_ref()
    }

    pub fn state_mut(&mut self) -> Option<&mut RecceState> {
        self.state.as_mut()
    }

    pub fn update(&mut self, state: RecceState) {
        self.state = Some(state);
    }

    /// Best-effort load. Any failure clears the held state and is recorded
    /// rather than returned; check [`is_loaded`](Self::is_loaded).
    pub async fn load(&mut self) -> Option<&RecceState> {
        if let Err(err) = self.try_load().await {
            tracing::debug!(
                target: "recce.state",
                stage = "state.load.swallowed",
                kind = %err.kind(),
                error = %err
            );
        }
        self.state.as_ref()
    }

    /// Explicit load that surfaces the failure. The loader is left in the same
    /// condition [`load`](Self::load) would leave it.
    pub async fn try_load(&mut self) -> Result<&RecceState, StateError> {
        match self.fetch_state().await {
            Ok(state) => {
                self.last_load_error = None;
                let state = self.state.insert(state);
                Ok(&*state)
            }
            Err(err) => {
                self.state = None;
                self.last_load_error = Some(err.kind());
                match err.kind() {
                    StateErrorKind::SchemaVersion | StateErrorKind::Unsupported => {
                        tracing::warn!(target: "recce.state", stage = "state.load.out", error = %err);
                        self.error_message = Some(err.to_string());
                    }
                    StateErrorKind::Malformed if self.options.review_mode => {
                        tracing::warn!(target: "recce.state", stage = "state.load.out", error = %err);
                        self.error_message = Some(err.to_string());
                    }
                    _ => {}
                }
                Err(err)
            }
        }
    }

    async fn fetch_state(&self) -> Result<RecceState, StateError> {
        let backend = self.backend.as_ref().ok_or_else(|| {
            StateError::NotFound("no state file or remote store configured".to_string())
        })?;
        tracing::debug!(
            target: "recce.state",
            stage = "state.load.in",
            backend = backend.name()
        );
        let pull_request = self.options.cloud.pull_request_ref();
        let bytes = backend.fetch(pull_request.as_ref()).await?;
        let text = String::from_utf8(bytes)
            .map_err(|e| StateError::Malformed(format!("state is not UTF-8: {e}")))?;
        let state = deserialize(&text)?;
        tracing::debug!(
            target: "recce.state",
            stage = "state.load.out",
            runs = state.runs.len(),
            checks = state.checks.len()
        );
        Ok(state)
    }

    /// Serializes the full held state (after replacing it with `state`, when
    /// given) and hands it to the selected backend.
    pub async fn export(&mut self, state: Option<RecceState>) -> ExportOutcome {
        self.clear_messages();
        if let Some(state) = state {
            self.update(state);
        }
        let started = Instant::now();
        let outcome = match self.store_state().await {
            Ok(message) => ExportOutcome::Stored(message),
            Err(err) => {
                self.error_message = Some(err.detail());
                self.hint_message = err.hint().map(str::to_string);
                ExportOutcome::Failed(format!("{}: {}", self.failure_prefix(), err.detail()))
            }
        };
        tracing::info!(
            target: "recce.state",
            stage = "state.export.out",
            success = outcome.is_success(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "{}",
            outcome
        );
        outcome
    }

    async fn store_state(&self) -> Result<String, StateError> {
        let state = self.state.as_ref().ok_or_else(|| {
            StateError::configuration(
                "No state to export.",
                "Load a state file or start a session before exporting.",
            )
        })?;
        let backend = self.backend.as_ref().ok_or_else(|| {
            StateError::configuration(
                "No state file or remote store is configured.",
                "Please provide a state file in the command argument.",
            )
        })?;
        let pull_request = self.options.cloud.pull_request_ref().or_else(|| {
            state
                .pull_request
                .as_ref()
                .and_then(PullRequestRef::from_info)
        });
        tracing::debug!(
            target: "recce.state",
            stage = "state.export.in",
            backend = backend.name(),
            runs = state.runs.len(),
            checks = state.checks.len()
        );
        let bytes = serialize(state)?.into_bytes();
        backend.store(bytes, pull_request.as_ref()).await
    }

    fn failure_prefix(&self) -> &'static str {
        match self.kind {
            Some(StorageKind::CloudApi) => "Failed to upload the state file to Recce Cloud",
            Some(StorageKind::ObjectStore { .. }) => {
                "Failed to upload the state file to the object store"
            }
            _ => "Failed to store the state file",
        }
    }
}
