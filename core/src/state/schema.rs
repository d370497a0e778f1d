//! Schema version gate for persisted snapshots.

use crate::error::StateError;

/// Version assumed when a snapshot carries no metadata, or metadata without a
/// `schema_version` field.
pub const DEFAULT_SCHEMA_VERSION: &str = "v0";

/// Every schema tag this build can read. Writers always emit
/// [`DEFAULT_SCHEMA_VERSION`].
pub const SUPPORTED_SCHEMA_VERSIONS: &[&str] = &[DEFAULT_SCHEMA_VERSION];

pub fn is_supported(tag: &str) -> bool {
    SUPPORTED_SCHEMA_VERSIONS.contains(&tag)
}

/// Rejects any tag outside [`SUPPORTED_SCHEMA_VERSIONS`]. Never lenient: an
/// unknown tag means the document may use a layout this build cannot honor.
pub fn validate_schema_version(tag: &str) -> Result<(), StateError> {
    if is_supported(tag) {
        Ok(())
    } else {
        Err(StateError::SchemaVersion {
            found: tag.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StateErrorKind;

    #[test]
    fn test_v0_is_supported() {
        assert!(is_supported("v0"));
        validate_schema_version("v0").unwrap();
    }

    #[test]
    fn test_unknown_versions_rejected() {
        for tag in ["v1", "v99", "", "V0"] {
            let err = validate_schema_version(tag).unwrap_err();
            assert_eq!(err.kind(), StateErrorKind::SchemaVersion);
        }
    }
}
