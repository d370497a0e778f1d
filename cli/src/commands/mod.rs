pub mod cli;
pub mod state;

use recce_state_core::api::{StateError, StateErrorKind};

// 0: success
// 11: configuration error (bad options, missing credentials, review without file)
// 20: storage / IO error
// 30: state file not found
// 31: state file rejected (malformed or unsupported schema)
// 50: internal/uncategorized
pub const EXIT_CONFIG: i32 = 11;
pub const EXIT_STORAGE: i32 = 20;
pub const EXIT_NOT_FOUND: i32 = 30;
pub const EXIT_INVALID_STATE: i32 = 31;
pub const EXIT_INTERNAL: i32 = 50;

pub fn exit_code_for_error(e: &anyhow::Error) -> i32 {
    match e.downcast_ref::<StateError>().map(StateError::kind) {
        Some(StateErrorKind::Configuration) => EXIT_CONFIG,
        Some(StateErrorKind::Storage) | Some(StateErrorKind::Unsupported) => EXIT_STORAGE,
        Some(StateErrorKind::NotFound) => EXIT_NOT_FOUND,
        Some(StateErrorKind::SchemaVersion) | Some(StateErrorKind::Malformed) => {
            EXIT_INVALID_STATE
        }
        None => EXIT_INTERNAL,
    }
}
