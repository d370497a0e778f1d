pub mod cloud;
pub mod object_store;
pub mod sigv4;

pub use cloud::CloudApiBackend;
pub use object_store::ObjectStoreBackend;
pub use sigv4::Credentials;

use recce_state_core::api::StateError;

pub(crate) fn missing_pull_request() -> StateError {
    StateError::configuration(
        "Cannot address the remote state: the pull request repository and id are unknown.",
        "Provide the repository and pull request number in the cloud options.",
    )
}
