//! Result storage shared by the orchestrator, animation tasks and export.

pub mod results;
