//! Job execution.
//!
//! [`orchestrator::Orchestrator`] runs a job plan strictly sequentially, reporting progress
//! through [`events::RunObserver`] and finishing with an [`outcome::RunReport`].

pub mod events;
pub mod orchestrator;
pub mod outcome;
