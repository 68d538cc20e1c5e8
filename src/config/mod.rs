//! JSON run configuration.

pub mod run_config;
