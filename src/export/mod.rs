//! Dataset export: generated files plus an `annotations.json` manifest.

pub mod manifest;
