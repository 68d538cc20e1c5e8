use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        AugmentError::validation("x")
            .to_string()
            .contains("validation error:")
    );
    assert!(AugmentError::image("x").to_string().contains("image error:"));
    assert!(
        AugmentError::animation("x")
            .to_string()
            .contains("animation error:")
    );
    assert!(
        AugmentError::serde("x")
            .to_string()
            .contains("serialization error:")
    );
}

#[test]
fn exhausted_retries_mention_attempts_and_last_error() {
    let err = AugmentError::RateLimitExhausted {
        attempts: 5,
        last: "429 Too Many Requests".to_string(),
    };
    let msg = err.to_string();
    assert!(msg.contains("after 5 attempts"));
    assert!(msg.contains("429 Too Many Requests"));
    assert!(err.is_rate_limit_exhausted());
    assert!(!AugmentError::validation("x").is_rate_limit_exhausted());
}

#[test]
fn service_errors_convert() {
    let err: AugmentError = ServiceError::Transport("connection reset".to_string()).into();
    assert!(err.to_string().starts_with("service error:"));
    assert!(err.to_string().contains("connection reset"));
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = AugmentError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}
