//! Shared data types, the error taxonomy and timing primitives.

pub mod core;
pub mod error;
pub mod timing;
