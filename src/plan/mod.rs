//! Prompt planning.
//!
//! Turns user options into the ordered scenario and obstacle prompt lists that drive a run.

pub mod planner;
pub mod rules;
