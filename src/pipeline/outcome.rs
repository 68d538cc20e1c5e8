use std::fmt;

/// Counters accumulated during a run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunOutcome {
    /// Results appended to the store.
    pub succeeded: u64,
    /// Jobs that produced no image.
    pub failed: u64,
    /// Obstacle jobs dropped because their scenery failed verification.
    pub discarded: u64,
    /// Sceneries that failed the preservation check.
    pub rejected: u64,
}

/// How a run ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RunStatus {
    /// The whole plan was executed.
    Completed,
    /// Cancellation was requested.
    Stopped,
    /// A non-recoverable error stopped the run.
    Aborted {
        /// User-facing error message.
        message: String,
    },
}

/// Final summary of a run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunReport {
    /// Terminal state.
    pub status: RunStatus,
    /// Counters.
    pub outcome: RunOutcome,
    /// Planned job count.
    pub total_jobs: u64,
    /// Jobs accounted for by the progress counter (executed or skipped).
    pub attempted: u64,
}

impl RunReport {
    /// Return `true` when the run was aborted by an error.
    pub fn is_aborted(&self) -> bool {
        matches!(self.status, RunStatus::Aborted { .. })
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let o = &self.outcome;
        match &self.status {
            RunStatus::Completed => {
                write!(
                    f,
                    "completed: {} of {} images created successfully",
                    o.succeeded, self.total_jobs
                )?;
                if o.failed > 0 {
                    write!(f, ", {} failed", o.failed)?;
                }
                if o.rejected > 0 {
                    write!(f, ", {} sceneries rejected", o.rejected)?;
                }
                if o.discarded > 0 {
                    write!(f, ", {} discarded", o.discarded)?;
                }
                Ok(())
            }
            RunStatus::Stopped => write!(
                f,
                "stopped after cancellation: {} images created successfully so far",
                o.succeeded
            ),
            RunStatus::Aborted { message } => write!(f, "aborted: {message}"),
        }
    }
}
