use std::fmt;

use thiserror::Error;

/// Coarse classification of a [`StateError`], kept by the loader after a
/// swallowed load so callers can tell "absent" from "corrupt".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateErrorKind {
    SchemaVersion,
    Malformed,
    NotFound,
    Storage,
    Configuration,
    Unsupported,
}

impl StateErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SchemaVersion => "schema_version",
            Self::Malformed => "malformed",
            Self::NotFound => "not_found",
            Self::Storage => "storage",
            Self::Configuration => "configuration",
            Self::Unsupported => "unsupported",
        }
    }
}

impl fmt::Display for StateErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Transport-level detail for a failed write or remote read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageFailure {
    /// Short stable label, e.g. `timeout`, `status`, `io`.
    pub kind: &'static str,
    pub status: Option<u16>,
    pub url: Option<String>,
    pub detail: String,
}

impl StorageFailure {
    pub fn new(kind: &'static str, detail: impl Into<String>) -> Self {
        Self {
            kind,
            status: None,
            url: None,
            detail: detail.into(),
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }
}

impl fmt::Display for StorageFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "kind={}", self.kind)?;
        if let Some(status) = self.status {
            write!(f, " status={}", status)?;
        }
        if let Some(url) = &self.url {
            write!(f, " url={}", url)?;
        }
        write!(f, ": {}", self.detail)
    }
}

#[derive(Error, Debug)]
pub enum StateError {
    #[error("Unsupported state file version: {found}")]
    SchemaVersion { found: String },

    #[error("malformed state: {0}")]
    Malformed(String),

    #[error("State file not found: {0}")]
    NotFound(String),

    #[error("storage error {0}")]
    Storage(StorageFailure),

    #[error("{message}")]
    Configuration { message: String, hint: String },

    #[error("unsupported operation: {0}")]
    Unsupported(String),
}

impl StateError {
    pub fn kind(&self) -> StateErrorKind {
        match self {
            Self::SchemaVersion { .. } => StateErrorKind::SchemaVersion,
            Self::Malformed(_) => StateErrorKind::Malformed,
            Self::NotFound(_) => StateErrorKind::NotFound,
            Self::Storage(_) => StateErrorKind::Storage,
            Self::Configuration { .. } => StateErrorKind::Configuration,
            Self::Unsupported(_) => StateErrorKind::Unsupported,
        }
    }

    pub fn configuration(message: impl Into<String>, hint: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
            hint: hint.into(),
        }
    }

    pub fn storage(kind: &'static str, detail: impl Into<String>) -> Self {
        Self::Storage(StorageFailure::new(kind, detail))
    }

    /// Remediation text, present only for configuration errors.
    pub fn hint(&self) -> Option<&str> {
        match self {
            Self::Configuration { hint, .. } => Some(hint.as_str()),
            _ => None,
        }
    }

    /// The most specific human-readable detail: the response body preview for
    /// storage failures, the message otherwise.
    pub fn detail(&self) -> String {
        match self {
            Self::Storage(failure) => failure.detail.clone(),
            other => other.to_string(),
        }
    }
}

impl From<std::io::Error> for StateError {
    fn from(err: std::io::Error) -> Self {
        Self::storage("io", err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_failure_display() {
        let err = StateError::Storage(
            StorageFailure::new("status", "forbidden")
                .with_status(403)
                .with_url("https://example.com/upload"),
        );
        let msg = err.to_string();
        assert!(msg.contains("kind=status"));
        assert!(msg.contains("status=403"));
        assert!(msg.contains("url=https://example.com/upload"));
        assert!(msg.ends_with("forbidden"));
        assert_eq!(err.detail(), "forbidden");
        assert_eq!(err.kind(), StateErrorKind::Storage);
    }

    #[test]
    fn test_configuration_carries_hint() {
        let err = StateError::configuration("no file", "pass a file");
        assert_eq!(err.to_string(), "no file");
        assert_eq!(err.hint(), Some("pass a file"));
        assert_eq!(err.kind().as_str(), "configuration");
    }

    #[test]
    fn test_schema_version_message() {
        let err = StateError::SchemaVersion {
            found: "v99".to_string(),
        };
        assert_eq!(err.to_string(), "Unsupported state file version: v99");
        assert!(err.hint().is_none());
    }
}
