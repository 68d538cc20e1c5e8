use crate::foundation::core::{ImagePayload, ResultId};
use crate::foundation::error::{AugmentError, AugmentResult};
use crate::foundation::timing::Sleeper;
use crate::service::api::GenerativeService;
use crate::service::retry::{RetryNotice, RetryingCaller};
use crate::store::results::ResultStore;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

/// Interval between two status polls of an animation request.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);

const VIDEO_MIME: &str = "video/mp4";

/// Starts and drives animation requests for stored results.
#[derive(Clone)]
pub struct Animator {
    service: Arc<dyn GenerativeService>,
    store: ResultStore,
    caller: RetryingCaller,
    sleeper: Arc<dyn Sleeper>,
    poll_interval: Duration,
}

impl Animator {
    /// Create an animator that records progress in `store` and polls every
    /// [`DEFAULT_POLL_INTERVAL`].
    pub fn new(
        service: Arc<dyn GenerativeService>,
        store: ResultStore,
        caller: RetryingCaller,
        sleeper: Arc<dyn Sleeper>,
    ) -> Self {
        Self {
            service,
            store,
            caller,
            sleeper,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Override the interval between two status polls.
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Spawn an animation task for `id`.
    ///
    /// Returns `None` without side effects when the result is unknown or an animation for it is
    /// already running.
    pub fn start(&self, id: ResultId) -> Option<JoinHandle<()>> {
        let result = self.store.get(id)?;
        if !self.store.begin_animation(id, "Starting...") {
            tracing::debug!(%id, "animation already running");
            return None;
        }

        let this = self.clone();
        let handle = std::thread::Builder::new()
            .name(format!("animate-{}", id.0))
            .spawn(move || this.run_task(id, &result.image));
        match handle {
            Ok(handle) => Some(handle),
            Err(err) => {
                self.store
                    .finish_animation(id, Err(format!("failed to start animation: {err}")));
                None
            }
        }
    }

    #[tracing::instrument(skip_all, fields(%id))]
    fn run_task(&self, id: ResultId, image: &ImagePayload) {
        let store = &self.store;
        let outcome = self
            .animate(image, &mut |msg: &str| store.update_animation(id, msg))
            .and_then(|video| store.attach_animation(id, video));
        match outcome {
            Ok(()) => {
                tracing::info!("animation finished");
                store.finish_animation(id, Ok("Done!".to_string()));
            }
            Err(err) => {
                tracing::warn!(%err, "animation failed");
                store.finish_animation(id, Err(err.to_string()));
            }
        }
    }

    /// Request an animated rendition of `image` and wait for it.
    ///
    /// `on_progress` receives a human-readable message at every step, including each poll.
    pub fn animate(
        &self,
        image: &ImagePayload,
        on_progress: &mut dyn FnMut(&str),
    ) -> AugmentResult<ImagePayload> {
        let service = self.service.as_ref();
        let mut quiet = |_: RetryNotice| {};

        on_progress("Submitting animation request...");
        let handle = self
            .caller
            .call(|| service.request_animation(image), &mut quiet)?;
        on_progress("Generation started (this can take minutes)...");

        let mut elapsed = Duration::ZERO;
        let uri = loop {
            self.sleeper.sleep(self.poll_interval);
            elapsed += self.poll_interval;
            on_progress(&format!("Checking... ({}s)", elapsed.as_secs()));

            let poll = self
                .caller
                .call(|| service.poll_animation(&handle), &mut quiet)?;
            if !poll.done {
                continue;
            }
            if let Some(err) = poll.error {
                return Err(AugmentError::animation(err));
            }
            match poll.result_uri {
                Some(uri) => break uri,
                None => {
                    return Err(AugmentError::animation(
                        "video generation completed, but no download link was found",
                    ));
                }
            }
        };

        on_progress("Downloading video...");
        let bytes = self
            .caller
            .call(|| service.fetch_animation_bytes(&uri), &mut quiet)?;
        Ok(ImagePayload::new(VIDEO_MIME, bytes))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/animation/task.rs"]
mod tests;
