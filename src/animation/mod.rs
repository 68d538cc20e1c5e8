//! Per-result animation tasks.
//!
//! Each task runs on its own thread, independent of the generation run, and only touches the
//! animation field and status of its own result.

pub mod task;
