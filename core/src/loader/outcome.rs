use std::fmt;

/// Result of [`StateLoader::export`](super::StateLoader::export). Never an
/// error value: export reports, it does not raise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    Stored(String),
    Failed(String),
}

impl ExportOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Stored(_))
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Stored(m) | Self::Failed(m) => m,
        }
    }
}

impl fmt::Display for ExportOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}
