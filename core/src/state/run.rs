use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Kinds of comparison a run (or saved check) can describe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunType {
    Query,
    QueryDiff,
    ValueDiff,
    SchemaDiff,
    ProfileDiff,
    RowCountDiff,
    LineageDiff,
    TopKDiff,
    HistogramDiff,
}

impl RunType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Query => "query",
            Self::QueryDiff => "query_diff",
            Self::ValueDiff => "value_diff",
            Self::SchemaDiff => "schema_diff",
            Self::ProfileDiff => "profile_diff",
            Self::RowCountDiff => "row_count_diff",
            Self::LineageDiff => "lineage_diff",
            Self::TopKDiff => "top_k_diff",
            Self::HistogramDiff => "histogram_diff",
        }
    }
}

impl std::fmt::Display for RunType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One executed comparison or query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Run {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub run_type: RunType,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub params: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    pub run_at: DateTime<Utc>,
    /// Weak link to the check this run was executed for.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub check_id: Option<Uuid>,
}

impl Run {
    pub fn new(run_type: RunType, params: Value, result: Option<Value>) -> Self {
        Self {
            id: Uuid::new_v4(),
            run_type,
            params,
            result,
            run_at: Utc::now(),
            check_id: None,
        }
    }

    pub fn for_check(mut self, check_id: Uuid) -> Self {
        self.check_id = Some(check_id);
        self
    }
}

/// A saved comparison that can be re-run later.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Check {
    pub id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub check_type: RunType,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub params: Value,
    pub created_at: DateTime<Utc>,
    /// Weak link to the run the check was saved from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_id: Option<Uuid>,
}

impl Check {
    pub fn new(check_type: RunType, params: Value) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: None,
            description: None,
            check_type,
            params,
            created_at: Utc::now(),
            run_id: None,
        }
    }

    pub fn from_run(run: &Run, name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            run_id: Some(run.id),
            ..Self::new(run.run_type, run.params.clone())
        }
    }
}
