//! Recce state snapshots: the model, its schema-versioned encoding, and the
//! loader that moves it between a session and local or remote storage.

pub mod api;
pub mod config;
pub mod error;
pub mod loader;
pub mod state;
pub mod storage;
