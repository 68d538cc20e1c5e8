use crate::foundation::core::{BoundingBox, ImagePayload, ResultId, SeaState, SourceImage};
use crate::foundation::error::{AugmentError, AugmentResult};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Result fields known when a job completes; the store assigns the identifier.
#[derive(Clone, Debug, PartialEq)]
pub struct NewResult {
    /// Source image the result was derived from.
    pub source: Arc<SourceImage>,
    /// Generated (and possibly perturbed) image.
    pub image: ImagePayload,
    /// Prompt text recorded for export.
    pub prompt: String,
    /// Box around the inserted obstacle.
    pub bounding_box: Option<BoundingBox>,
    /// Classified sea state of the scenery.
    pub sea_state: Option<SeaState>,
    /// Hard-example flag, set when the evaluation ran.
    pub is_hard_example: Option<bool>,
}

/// One produced image.
#[derive(Clone, Debug, PartialEq)]
pub struct GenerationResult {
    /// Stable identifier assigned on append.
    pub id: ResultId,
    /// Source image the result was derived from.
    pub source: Arc<SourceImage>,
    /// Generated (and possibly perturbed) image.
    pub image: ImagePayload,
    /// Prompt text recorded for export.
    pub prompt: String,
    /// Box around the inserted obstacle.
    pub bounding_box: Option<BoundingBox>,
    /// Classified sea state of the scenery.
    pub sea_state: Option<SeaState>,
    /// Hard-example flag, set when the evaluation ran.
    pub is_hard_example: Option<bool>,
    /// Animated rendition attached later by an animation task.
    pub animation: Option<ImagePayload>,
}

/// Lifecycle of one animation task.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AnimationStatus {
    /// The task is in flight.
    pub is_running: bool,
    /// Latest progress message.
    pub progress_message: String,
    /// Terminal failure, if any.
    pub error: Option<String>,
}

#[derive(Default)]
struct Inner {
    results: Vec<GenerationResult>,
    animations: HashMap<ResultId, AnimationStatus>,
    next_id: u64,
}

/// Shared collection of produced results and their animation status.
///
/// Appends come from the orchestrator; animation tasks only touch the animation field and status
/// of their own result. Structural changes and field updates are serialized by a lock.
#[derive(Clone, Default)]
pub struct ResultStore {
    inner: Arc<RwLock<Inner>>,
}

impl ResultStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a result and return its identifier.
    pub fn append(&self, new: NewResult) -> ResultId {
        let mut inner = self.inner.write();
        let id = ResultId(inner.next_id);
        inner.next_id += 1;
        inner.results.push(GenerationResult {
            id,
            source: new.source,
            image: new.image,
            prompt: new.prompt,
            bounding_box: new.bounding_box,
            sea_state: new.sea_state,
            is_hard_example: new.is_hard_example,
            animation: None,
        });
        id
    }

    /// Number of stored results.
    pub fn len(&self) -> usize {
        self.inner.read().results.len()
    }

    /// Return `true` when nothing has been stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Clone of one result.
    pub fn get(&self, id: ResultId) -> Option<GenerationResult> {
        self.inner.read().results.iter().find(|r| r.id == id).cloned()
    }

    /// Clone of every result in insertion order.
    pub fn snapshot(&self) -> Vec<GenerationResult> {
        self.inner.read().results.clone()
    }

    /// Attach an animated rendition to an existing result.
    pub fn attach_animation(&self, id: ResultId, animation: ImagePayload) -> AugmentResult<()> {
        let mut inner = self.inner.write();
        let result = inner
            .results
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| AugmentError::animation(format!("unknown result {id}")))?;
        result.animation = Some(animation);
        Ok(())
    }

    /// Mark an animation as started.
    ///
    /// Returns `false` (and changes nothing) when the result is unknown or already animating.
    pub fn begin_animation(&self, id: ResultId, message: impl Into<String>) -> bool {
        let mut inner = self.inner.write();
        if !inner.results.iter().any(|r| r.id == id) {
            return false;
        }
        if inner.animations.get(&id).is_some_and(|s| s.is_running) {
            return false;
        }
        inner.animations.insert(
            id,
            AnimationStatus {
                is_running: true,
                progress_message: message.into(),
                error: None,
            },
        );
        true
    }

    /// Update the progress message of a running animation.
    pub fn update_animation(&self, id: ResultId, message: impl Into<String>) {
        if let Some(status) = self.inner.write().animations.get_mut(&id) {
            status.progress_message = message.into();
        }
    }

    /// Record the terminal state of an animation; the status is kept for display.
    pub fn finish_animation(&self, id: ResultId, outcome: Result<String, String>) {
        if let Some(status) = self.inner.write().animations.get_mut(&id) {
            status.is_running = false;
            match outcome {
                Ok(message) => {
                    status.progress_message = message;
                    status.error = None;
                }
                Err(error) => {
                    status.progress_message.clear();
                    status.error = Some(error);
                }
            }
        }
    }

    /// Current animation status of a result.
    pub fn animation_status(&self, id: ResultId) -> Option<AnimationStatus> {
        self.inner.read().animations.get(&id).cloned()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/store/results.rs"]
mod tests;
