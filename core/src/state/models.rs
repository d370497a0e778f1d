//! The snapshot aggregate and its metadata records.

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::provider::{ArtifactProvider, BranchLookup, RunExecutor};
use super::run::{Check, Run};
use super::schema::DEFAULT_SCHEMA_VERSION;
use crate::error::StateError;

/// File name used for the snapshot in every remote store.
pub const STATE_ARTIFACT_NAME: &str = "recce-state.json";

const GENERATED_AT_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

fn default_schema_version() -> String {
    DEFAULT_SCHEMA_VERSION.to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecceStateMetadata {
    #[serde(default = "default_schema_version")]
    pub schema_version: String,
    #[serde(
        default,
        alias = "recce_version",
        skip_serializing_if = "Option::is_none"
    )]
    pub tool_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_at: Option<String>,
}

impl RecceStateMetadata {
    /// Metadata stamped with the current schema, this build's version and now.
    pub fn current() -> Self {
        Self {
            schema_version: default_schema_version(),
            tool_version: Some(env!("CARGO_PKG_VERSION").to_string()),
            generated_at: Some(Utc::now().format(GENERATED_AT_FORMAT).to_string()),
        }
    }
}

/// Artifacts of the base and current environments, keyed by file name.
/// Values are opaque to this crate.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArtifactsRoot {
    #[serde(default)]
    pub base: BTreeMap<String, Option<Value>>,
    #[serde(default)]
    pub current: BTreeMap<String, Option<Value>>,
}

impl ArtifactsRoot {
    pub fn is_empty(&self) -> bool {
        self.base.is_empty() && self.current.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitRepoInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
}

impl GitRepoInfo {
    /// `None` when the lookup cannot name a branch (detached head, no repo).
    pub fn from_current_repository(lookup: &dyn BranchLookup) -> Option<Self> {
        lookup
            .current_branch()
            .map(|branch| Self { branch: Some(branch) })
    }
}

/// Pull request number as found on the wire: either an integer or a string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PullRequestId {
    Number(i64),
    Text(String),
}

impl fmt::Display for PullRequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{}", n),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for PullRequestId {
    fn from(n: i64) -> Self {
        Self::Number(n)
    }
}

/// An integer becomes a number, anything else is kept verbatim.
impl From<&str> for PullRequestId {
    fn from(s: &str) -> Self {
        let s = s.trim();
        s.parse::<i64>()
            .map(Self::Number)
            .unwrap_or_else(|_| Self::Text(s.to_string()))
    }
}

impl std::str::FromStr for PullRequestId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(s))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<PullRequestId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_branch: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repository: Option<String>,
}

/// The two coordinates a remote store needs to address a snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestRef {
    pub repository: String,
    pub id: PullRequestId,
}

impl PullRequestRef {
    pub fn new(repository: impl Into<String>, id: impl Into<PullRequestId>) -> Self {
        Self {
            repository: repository.into(),
            id: id.into(),
        }
    }

    /// Both `repository` and `id` must be set and non-blank.
    pub fn from_info(info: &PullRequestInfo) -> Option<Self> {
        let repository = info
            .repository
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())?;
        let id = info.id.clone()?;
        if id.to_string().trim().is_empty() {
            return None;
        }
        Some(Self::new(repository, id))
    }

    /// `github/{repository}/pulls/{id}/recce-state.json`
    pub fn object_key(&self) -> String {
        format!(
            "github/{}/pulls/{}/{}",
            self.repository, self.id, STATE_ARTIFACT_NAME
        )
    }
}

/// One captured analysis session: the unit of serialization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecceState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<RecceStateMetadata>,
    #[serde(default)]
    pub runs: Vec<Run>,
    #[serde(default)]
    pub checks: Vec<Check>,
    #[serde(default)]
    pub artifacts: ArtifactsRoot,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git: Option<GitRepoInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pull_request: Option<PullRequestInfo>,
}

impl RecceState {
    /// An empty session snapshot with fresh metadata.
    pub fn new() -> Self {
        Self {
            metadata: Some(RecceStateMetadata::current()),
            ..Self::default()
        }
    }

    /// Builds a session snapshot from the external collaborators that inspect
    /// the project and the local repository.
    pub fn capture(
        artifacts: &dyn ArtifactProvider,
        branch: &dyn BranchLookup,
        pull_request: Option<PullRequestInfo>,
    ) -> Self {
        Self {
            artifacts: artifacts.artifacts(),
            git: GitRepoInfo::from_current_repository(branch),
            pull_request,
            ..Self::new()
        }
    }

    /// Effective schema tag; snapshots without metadata are `v0`.
    pub fn schema_version(&self) -> &str {
        self.metadata
            .as_ref()
            .map(|m| m.schema_version.as_str())
            .unwrap_or(DEFAULT_SCHEMA_VERSION)
    }

    pub fn attach_artifacts(&mut self, artifacts: ArtifactsRoot) {
        self.artifacts = artifacts;
    }

    pub fn add_run(&mut self, run: Run) -> Result<(), StateError> {
        if self.runs.iter().any(|r| r.id == run.id) {
            return Err(StateError::Malformed(format!("duplicate run id: {}", run.id)));
        }
        self.runs.push(run);
        Ok(())
    }

    pub fn add_check(&mut self, check: Check) -> Result<(), StateError> {
        if self.checks.iter().any(|c| c.id == check.id) {
            return Err(StateError::Malformed(format!(
                "duplicate check id: {}",
                check.id
            )));
        }
        self.checks.push(check);
        Ok(())
    }

    /// Executes through the collaborator and appends the resulting run.
    pub fn record_run(&mut self, executor: &dyn RunExecutor, check_id: Option<Uuid>) -> &Run {
        let output = executor.execute();
        let run = Run::new(output.run_type, output.params, output.result);
        self.runs.push(match check_id {
            Some(check_id) => run.for_check(check_id),
            None => run,
        });
        &self.runs[self.runs.len() - 1]
    }

    pub fn find_run(&self, id: Uuid) -> Option<&Run> {
        self.runs.iter().find(|r| r.id == id)
    }

    pub fn find_check(&self, id: Uuid) -> Option<&Check> {
        self.checks.iter().find(|c| c.id == id)
    }

    /// Fails on the first repeated run or check identifier.
    pub fn ensure_unique_ids(&self) -> Result<(), StateError> {
        let mut seen = HashSet::new();
        for run in &self.runs {
            if !seen.insert(run.id) {
                return Err(StateError::Malformed(format!("duplicate run id: {}", run.id)));
            }
        }
        seen.clear();
        for check in &self.checks {
            if !seen.insert(check.id) {
                return Err(StateError::Malformed(format!(
                    "duplicate check id: {}",
                    check.id
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::provider::RunOutput;
    use crate::state::run::RunType;
    use serde_json::json;

    struct FixedArtifacts;

    impl ArtifactProvider for FixedArtifacts {
        fn artifacts(&self) -> ArtifactsRoot {
            let mut root = ArtifactsRoot::default();
            root.base
                .insert("manifest.json".to_string(), Some(json!({"nodes": {}})));
            root.current.insert("catalog.json".to_string(), None);
            root
        }
    }

    struct CountRows;

    impl RunExecutor for CountRows {
        fn execute(&self) -> RunOutput {
            RunOutput {
                run_type: RunType::RowCountDiff,
                params: json!({"node_names": ["orders"]}),
                result: Some(json!({"orders": {"base": 10, "curr": 12}})),
            }
        }
    }

    #[test]
    fn test_object_key_layout() {
        let pr = PullRequestRef::new("acme/widgets", 42i64);
        assert_eq!(pr.object_key(), "github/acme/widgets/pulls/42/recce-state.json");
    }

    #[test]
    fn test_pull_request_ref_requires_repository_and_id() {
        let mut info = PullRequestInfo {
            id: Some(PullRequestId::Number(7)),
            ..Default::default()
        };
        assert!(PullRequestRef::from_info(&info).is_none());
        info.repository = Some("  ".to_string());
        assert!(PullRequestRef::from_info(&info).is_none());
        info.repository = Some("acme/widgets".to_string());
        let pr = PullRequestRef::from_info(&info).unwrap();
        assert_eq!(pr.id.to_string(), "7");
    }

    #[test]
    fn test_pull_request_id_from_str() {
        assert_eq!("42".parse::<PullRequestId>().unwrap(), PullRequestId::Number(42));
        assert_eq!(PullRequestId::from(" 42 "), PullRequestId::Number(42));
        assert_eq!(
            "feature-7".parse::<PullRequestId>().unwrap(),
            PullRequestId::Text("feature-7".to_string())
        );
    }

    #[test]
    fn test_pull_request_id_keeps_wire_form() {
        let n: PullRequestId = serde_json::from_value(json!(42)).unwrap();
        let s: PullRequestId = serde_json::from_value(json!("42")).unwrap();
        assert_eq!(n, PullRequestId::Number(42));
        assert_eq!(s, PullRequestId::Text("42".to_string()));
        assert_eq!(serde_json::to_value(&n).unwrap(), json!(42));
        assert_eq!(serde_json::to_value(&s).unwrap(), json!("42"));
    }

    #[test]
    fn test_negative_pull_request_id_decodes() {
        let info: PullRequestInfo =
            serde_json::from_value(json!({"id": -1, "repository": "acme/widgets"})).unwrap();
        assert_eq!(info.id, Some(PullRequestId::Number(-1)));
    }

    #[test]
    fn test_schema_version_defaults_without_metadata() {
        let state = RecceState::default();
        assert!(state.metadata.is_none());
        assert_eq!(state.schema_version(), "v0");
    }

    #[test]
    fn test_new_state_stamps_metadata() {
        let state = RecceState::new();
        let meta = state.metadata.as_ref().unwrap();
        assert_eq!(meta.schema_version, "v0");
        assert_eq!(meta.tool_version.as_deref(), Some(env!("CARGO_PKG_VERSION")));
        let generated = meta.generated_at.as_deref().unwrap();
        assert!(generated.ends_with('Z'));
        assert_eq!(generated.len(), "2024-01-01T00:00:00Z".len());
    }

    #[test]
    fn test_capture_uses_collaborators() {
        let lookup = || Some("feature/x".to_string());
        let state = RecceState::capture(&FixedArtifacts, &lookup, None);
        assert_eq!(state.git.unwrap().branch.as_deref(), Some("feature/x"));
        assert!(state.artifacts.base.contains_key("manifest.json"));
        assert_eq!(state.artifacts.current.get("catalog.json"), Some(&None));
        assert!(state.runs.is_empty());

        let no_branch = || None;
        let state = RecceState::capture(&FixedArtifacts, &no_branch, None);
        assert!(state.git.is_none());
    }

    #[test]
    fn test_record_run_appends() {
        let mut state = RecceState::new();
        let check = Check::new(RunType::RowCountDiff, json!({"node_names": ["orders"]}));
        let check_id = check.id;
        state.add_check(check).unwrap();

        let run_id = state.record_run(&CountRows, Some(check_id)).id;
        let run = state.find_run(run_id).unwrap();
        assert_eq!(run.check_id, Some(check_id));
        assert!(run.result.is_some());
        assert!(state.find_check(check_id).is_some());
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let mut state = RecceState::new();
        let run = Run::new(RunType::Query, json!({"sql_template": "select 1"}), None);
        state.add_run(run.clone()).unwrap();
        assert!(state.add_run(run.clone()).is_err());

        state.runs.push(run);
        assert!(state.ensure_unique_ids().is_err());
    }
}
