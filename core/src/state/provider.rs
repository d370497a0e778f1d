//! Seams to the collaborators that produce snapshot content. Project
//! inspection, query execution and repository lookup live outside this crate.

use serde_json::Value;

use super::models::ArtifactsRoot;
use super::run::RunType;

/// Supplies the base/current artifact mappings for a session.
pub trait ArtifactProvider {
    fn artifacts(&self) -> ArtifactsRoot;
}

/// Names the checked-out branch of the local repository, if any.
pub trait BranchLookup {
    fn current_branch(&self) -> Option<String>;
}

impl<F> BranchLookup for F
where
    F: Fn() -> Option<String>,
{
    fn current_branch(&self) -> Option<String> {
        self()
    }
}

/// What an executed run hands back to be recorded.
#[derive(Debug, Clone, PartialEq)]
pub struct RunOutput {
    pub run_type: RunType,
    pub params: Value,
    pub result: Option<Value>,
}

pub trait RunExecutor {
    fn execute(&self) -> RunOutput;
}
