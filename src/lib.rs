//! Sea-augment expands a handful of maritime source images into a synthetic dataset by driving
//! an external generative-image service.
//!
//! - Expand user options into a deterministic [`JobPlan`] with [`plan`]
//! - Execute it with an [`Orchestrator`], which retries rate-limited calls, waits a cooldown
//!   after every call and honours a [`CancelToken`]
//! - Optionally animate stored results with an [`Animator`]
//! - Write the [`ResultStore`] out with [`export_dataset`]
#![forbid(unsafe_code)]

mod foundation;

pub mod animation;
pub mod config;
pub mod export;
pub mod perturb;
pub mod pipeline;
pub mod plan;
pub mod service;
pub mod store;

pub use crate::foundation::core::{BoundingBox, ImagePayload, ResultId, SeaState, SourceImage};
pub use crate::foundation::error::{AugmentError, AugmentResult};
pub use crate::foundation::timing::{CancelToken, Sleeper, ThreadSleeper};

pub use crate::animation::task::{Animator, DEFAULT_POLL_INTERVAL};
pub use crate::config::run_config::{AugmentConfig, RetryConfig};
pub use crate::export::manifest::{AnnotationRecord, ExportSummary, export_dataset};
pub use crate::perturb::transform::{PerturbationConfig, apply_perturbations, reencode};
pub use crate::pipeline::events::{InMemoryObserver, LogObserver, RunEvent, RunObserver, Stage};
pub use crate::pipeline::orchestrator::{DEFAULT_COOLDOWN, Orchestrator, RunOptions};
pub use crate::pipeline::outcome::{RunOutcome, RunReport, RunStatus};
pub use crate::plan::planner::{JobPlan, ObstacleModifiers, ObstacleSpec, plan};
pub use crate::plan::rules::{StyleRule, apply_style_rules, default_style_rules};
pub use crate::service::api::{
    AnimationPoll, BlockReason, EditOutcome, GenerativeService, OperationHandle, ServiceError,
    is_rate_limit,
};
pub use crate::service::command::{CommandService, CommandServiceConfig};
pub use crate::service::retry::{RetryNotice, RetryPolicy, RetryingCaller};
pub use crate::store::results::{AnimationStatus, GenerationResult, NewResult, ResultStore};
