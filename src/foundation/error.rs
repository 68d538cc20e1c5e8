use crate::service::api::ServiceError;

/// Convenience result type used across the crate.
pub type AugmentResult<T> = Result<T, AugmentError>;

/// Top-level error taxonomy used by pipeline APIs.
#[derive(thiserror::Error, Debug)]
pub enum AugmentError {
    /// Invalid user-provided configuration or input data.
    #[error("validation error: {0}")]
    Validation(String),

    /// A non-rate-limit failure reported by the external service.
    #[error("service error: {0}")]
    Service(#[from] ServiceError),

    /// Every retry attempt hit the service rate limit.
    #[error("rate limit exceeded after {attempts} attempts; last error: {last}")]
    RateLimitExhausted {
        /// Number of attempts made before giving up.
        attempts: u32,
        /// Message of the final underlying error.
        last: String,
    },

    /// Errors while decoding, transforming or encoding image payloads.
    #[error("image error: {0}")]
    Image(String),

    /// Errors raised by an animation task.
    #[error("animation error: {0}")]
    Animation(String),

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl AugmentError {
    /// Build a [`AugmentError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`AugmentError::Image`] value.
    pub fn image(msg: impl Into<String>) -> Self {
        Self::Image(msg.into())
    }

    /// Build a [`AugmentError::Animation`] value.
    pub fn animation(msg: impl Into<String>) -> Self {
        Self::Animation(msg.into())
    }

    /// Build a [`AugmentError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    /// Return `true` when the error is the terminal exhausted-retries failure.
    pub fn is_rate_limit_exhausted(&self) -> bool {
        matches!(self, Self::RateLimitExhausted { .. })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
