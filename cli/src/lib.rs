//! recce-state-cli library: command modules exposed for unit tests.

pub mod commands;
