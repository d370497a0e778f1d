//! Snapshot text encoding.

use std::path::Path;
use std::time::Instant;

use serde_json::Value;

use super::models::RecceState;
use super::schema::validate_schema_version;
use crate::error::StateError;
use crate::storage::local::atomic_write;

fn malformed(context: &'static str, err: serde_json::Error) -> StateError {
    StateError::Malformed(format!("{context}: {err}"))
}

/// Encodes the snapshot as compact JSON. Unset optional fields are omitted.
pub fn serialize(state: &RecceState) -> Result<String, StateError> {
    serde_json::to_string(state).map_err(|e| malformed("serialize state", e))
}

/// Decodes a snapshot, gating on `metadata.schema_version` before the typed
/// decode so an unknown format reports as a version error rather than a shape
/// mismatch. Unknown top-level keys are ignored.
pub fn deserialize(text: &str) -> Result<RecceState, StateError> {
    let doc: Value = serde_json::from_str(text).map_err(|e| malformed("parse state", e))?;
    let Some(root) = doc.as_object() else {
        return Err(StateError::Malformed(
            "state document must be a JSON object".to_string(),
        ));
    };

    if let Some(metadata) = root.get("metadata").and_then(Value::as_object) {
        match metadata.get("schema_version") {
            None => {}
            Some(Value::String(tag)) => validate_schema_version(tag)?,
            Some(other) => {
                return Err(StateError::Malformed(format!(
                    "schema_version must be a string, got {other}"
                )))
            }
        }
    }

    let state: RecceState =
        serde_json::from_value(doc).map_err(|e| malformed("decode state", e))?;
    state.ensure_unique_ids()?;
    Ok(state)
}

impl RecceState {
    pub fn to_json(&self) -> Result<String, StateError> {
        serialize(self)
    }

    pub fn from_json(json: &str) -> Result<Self, StateError> {
        deserialize(json)
    }

    /// Load a snapshot from a state file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, StateError> {
        let path = path.as_ref();
        tracing::info!(target: "recce.state", "State file: '{}'", path.display());
        if !path.is_file() {
            return Err(StateError::NotFound(path.display().to_string()));
        }
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Store the snapshot to a file, replacing it atomically.
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), StateError> {
        let path = path.as_ref();
        let started = Instant::now();
        tracing::info!(target: "recce.state", "Store recce state to '{}'", path.display());
        let json = self.to_json()?;
        atomic_write(path, json.as_bytes())?;
        tracing::info!(
            target: "recce.state",
            "Store state completed in {:.2} seconds",
            started.elapsed().as_secs_f64()
        );
        Ok(())
    }
}
