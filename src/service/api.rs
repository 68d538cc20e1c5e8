use crate::foundation::core::{BoundingBox, ImagePayload, SeaState};
use std::fmt;

/// Failure of a single external-service call.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    /// The service answered with an error status and message (possibly a JSON error body).
    #[error("{message}")]
    Api {
        /// HTTP-like status code, when known.
        code: Option<u16>,
        /// Error text as reported by the service.
        message: String,
    },

    /// The service could not be reached.
    #[error("transport failure: {0}")]
    Transport(String),

    /// The service answered with something that does not follow the contract.
    #[error("protocol violation: {0}")]
    Protocol(String),
}

impl ServiceError {
    /// Build a [`ServiceError::Api`] value without a status code.
    pub fn api(message: impl Into<String>) -> Self {
        Self::Api {
            code: None,
            message: message.into(),
        }
    }
}

/// Return `true` when `err` reports resource exhaustion / too many requests.
///
/// Only [`ServiceError::Api`] can be a rate limit. Checks the status code, the message (a
/// `resource_exhausted` marker or a standalone `429` token) and the `error.status` /
/// `error.code` fields of a JSON-encoded error body carried in the message.
pub fn is_rate_limit(err: &ServiceError) -> bool {
    let message = match err {
        ServiceError::Api { code: Some(429), .. } => return true,
        ServiceError::Api { message, .. } => message,
        ServiceError::Transport(_) | ServiceError::Protocol(_) => return false,
    };
    if message.to_lowercase().contains("resource_exhausted") || has_status_token(message) {
        return true;
    }
    json_body_is_rate_limit(message)
}

fn has_status_token(message: &str) -> bool {
    message
        .split(|c: char| !c.is_ascii_alphanumeric())
        .any(|token| token == "429")
}

fn json_body_is_rate_limit(message: &str) -> bool {
    let Ok(body) = serde_json::from_str::<serde_json::Value>(message.trim()) else {
        return false;
    };
    let Some(error) = body.get("error") else {
        return false;
    };
    error.get("status").and_then(|s| s.as_str()) == Some("RESOURCE_EXHAUSTED")
        || error.get("code").and_then(|c| c.as_u64()) == Some(429)
}

/// Why the edit service produced no image.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BlockReason {
    /// Blocked by safety filtering, optionally naming the blocked category.
    Safety {
        /// Category reported as blocked, if any.
        category: Option<String>,
    },
    /// Blocked by the recitation policy.
    Recitation,
    /// Failed for a reason the service did not specify.
    Other,
    /// Failed with an unrecognised finish reason.
    Unknown(String),
    /// The service answered with text instead of an image.
    TextOnly(String),
    /// No image and no explanation.
    NoImage,
}

impl BlockReason {
    /// Map a service finish reason onto a block reason.
    pub fn from_finish_reason(reason: &str, category: Option<String>) -> Self {
        match reason {
            "SAFETY" => Self::Safety { category },
            "RECITATION" => Self::Recitation,
            "OTHER" => Self::Other,
            other => Self::Unknown(other.to_string()),
        }
    }
}

impl fmt::Display for BlockReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Safety { category: None } => {
                write!(f, "generation was blocked for safety reasons; try a simpler prompt")
            }
            Self::Safety {
                category: Some(category),
            } => write!(
                f,
                "generation was blocked for safety reasons; try a simpler prompt (category: {category})"
            ),
            Self::Recitation => write!(
                f,
                "generation was blocked by a policy violation (recitation); try a different prompt"
            ),
            Self::Other => write!(f, "generation failed for a reason the service did not specify"),
            Self::Unknown(reason) => write!(f, "generation failed (reason: {reason})"),
            Self::TextOnly(text) => {
                write!(f, "the service returned only text instead of an image: \"{text}\"")
            }
            Self::NoImage => write!(f, "the service did not return an image; try a different request"),
        }
    }
}

/// Result of an edit request.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EditOutcome {
    /// Edited image, absent when the request was blocked.
    pub image: Option<ImagePayload>,
    /// Box around the inserted object, when one was requested and found.
    pub bounding_box: Option<BoundingBox>,
    /// Cause reported when `image` is absent.
    pub blocked: Option<BlockReason>,
}

impl EditOutcome {
    /// Successful edit.
    pub fn image(image: ImagePayload, bounding_box: Option<BoundingBox>) -> Self {
        Self {
            image: Some(image),
            bounding_box,
            blocked: None,
        }
    }

    /// Edit that produced no image.
    pub fn blocked(reason: BlockReason) -> Self {
        Self {
            image: None,
            bounding_box: None,
            blocked: Some(reason),
        }
    }

    /// Human-readable cause for a missing image.
    pub fn failure_reason(&self) -> String {
        self.blocked
            .clone()
            .unwrap_or(BlockReason::NoImage)
            .to_string()
    }
}

/// Opaque handle of a long-running animation request.
#[derive(Clone, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct OperationHandle(pub String);

/// Status of an animation request.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AnimationPoll {
    /// The operation finished (successfully or not).
    pub done: bool,
    /// Location of the rendered video once done.
    pub result_uri: Option<String>,
    /// Failure message once done.
    pub error: Option<String>,
}

/// Generative image/video capability consumed by the pipeline.
///
/// Implementations perform exactly one remote call per method; retries are layered on top by
/// [`crate::service::retry::RetryingCaller`].
pub trait GenerativeService: Send + Sync {
    /// Edit `image` according to `prompt`, optionally locating the inserted object.
    fn edit_image(
        &self,
        image: &ImagePayload,
        prompt: &str,
        want_bounding_box: bool,
    ) -> Result<EditOutcome, ServiceError>;

    /// Check that the principal subject of `original` is still recognizable in `candidate`.
    fn check_preservation(
        &self,
        original: &ImagePayload,
        candidate: &ImagePayload,
    ) -> Result<bool, ServiceError>;

    /// Classify the sea state shown in `image`.
    fn classify_sea_state(&self, image: &ImagePayload) -> Result<Option<SeaState>, ServiceError>;

    /// Return `true` when the principal subject is occluded or indistinct.
    fn evaluate_hard_example(&self, image: &ImagePayload) -> Result<bool, ServiceError>;

    /// Submit an animation request for `image`.
    fn request_animation(&self, image: &ImagePayload) -> Result<OperationHandle, ServiceError>;

    /// Poll an animation request.
    fn poll_animation(&self, handle: &OperationHandle) -> Result<AnimationPoll, ServiceError>;

    /// Download the rendered video.
    fn fetch_animation_bytes(&self, uri: &str) -> Result<Vec<u8>, ServiceError>;
}

#[cfg(test)]
#[path = "../../tests/unit/service/api.rs"]
mod tests;
