use crate::foundation::core::ResultId;
use crate::service::retry::RetryNotice;

/// Step of a job currently being executed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    /// Generating the base scenery.
    Scenery,
    /// Checking that the principal subject survived the scenery edit.
    Verifying,
    /// Classifying the sea state of the scenery.
    ClassifyingSeaState,
    /// Compositing an obstacle.
    Obstacle,
    /// Evaluating whether the result is a hard example.
    EvaluatingHardExample,
    /// Applying perturbations before storing a result.
    Perturbing,
}

/// Notification emitted by a run, in execution order.
#[derive(Clone, Debug, PartialEq)]
pub enum RunEvent {
    /// The run started; `total_jobs` is the progress denominator.
    Started {
        /// Planned job count.
        total_jobs: u64,
    },
    /// A job started or was skipped because of an upstream failure.
    Progress {
        /// Jobs accounted for so far.
        current: u64,
        /// Planned job count.
        total: u64,
    },
    /// The current job entered a new step.
    Stage(Stage),
    /// A rate-limited call is backing off.
    Retry(RetryNotice),
    /// A result was appended to the store.
    ResultAdded {
        /// Identifier of the new result.
        id: ResultId,
    },
    /// A job produced no usable output.
    JobFailed {
        /// Human-readable cause.
        reason: String,
    },
    /// A scenery failed verification and its dependent jobs were dropped.
    Discarded {
        /// Number of dependent obstacle jobs dropped.
        jobs: u64,
    },
}

/// Receiver of [`RunEvent`]s.
pub trait RunObserver {
    /// Called synchronously from the run's thread.
    fn on_event(&mut self, event: &RunEvent);
}

/// Observer that records every event, for tests and debugging.
#[derive(Debug, Default)]
pub struct InMemoryObserver {
    events: Vec<RunEvent>,
}

impl InMemoryObserver {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorded events in emission order.
    pub fn events(&self) -> &[RunEvent] {
        &self.events
    }
}

impl RunObserver for InMemoryObserver {
    fn on_event(&mut self, event: &RunEvent) {
        self.events.push(event.clone());
    }
}

/// Observer that forwards events to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogObserver;

impl RunObserver for LogObserver {
    fn on_event(&mut self, event: &RunEvent) {
        match event {
            RunEvent::Started { total_jobs } => tracing::info!(total_jobs, "generation started"),
            RunEvent::Progress { current, total } => {
                tracing::info!("generating variation {current} of {total}")
            }
            RunEvent::Stage(stage) => tracing::debug!(?stage, "stage"),
            RunEvent::Retry(n) => tracing::info!(
                "API rate limit reached; retrying in {}s (attempt {} of {})",
                n.delay.as_millis().div_ceil(1000),
                n.attempt,
                n.max_attempts
            ),
            RunEvent::ResultAdded { id } => tracing::debug!(%id, "result stored"),
            RunEvent::JobFailed { reason } => tracing::debug!(%reason, "job failed"),
            RunEvent::Discarded { jobs } => tracing::debug!(jobs, "obstacle jobs discarded"),
        }
    }
}
