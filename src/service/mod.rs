//! External generative service boundary.
//!
//! The pipeline talks to the service only through [`api::GenerativeService`]; every call is
//! wrapped by [`retry::RetryingCaller`].

pub mod api;
pub mod command;
pub mod retry;
