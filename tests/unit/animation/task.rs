use super::*;
use crate::foundation::core::SeaState;
use crate::service::api::{AnimationPoll, EditOutcome, OperationHandle, ServiceError};
use crate::service::retry::RetryPolicy;
use parking_lot::Mutex;

#[derive(Default)]
struct RecordingSleeper {
    waits: Mutex<Vec<Duration>>,
}

impl Sleeper for RecordingSleeper {
    fn sleep(&self, dur: Duration) {
        self.waits.lock().push(dur);
    }
}

/// Answers `pending` polls with "not done" before finishing with `last`.
struct VideoService {
    pending: Mutex<u32>,
    last: AnimationPoll,
}

impl VideoService {
    fn new(pending: u32, last: AnimationPoll) -> Self {
        Self {
            pending: Mutex::new(pending),
            last,
        }
    }
}

impl GenerativeService for VideoService {
    fn edit_image(&self, _: &ImagePayload, _: &str, _: bool) -> Result<EditOutcome, ServiceError> {
        Err(ServiceError::api("unused"))
    }

    fn check_preservation(&self, _: &ImagePayload, _: &ImagePayload) -> Result<bool, ServiceError> {
        Ok(true)
    }

    fn classify_sea_state(&self, _: &ImagePayload) -> Result<Option<SeaState>, ServiceError> {
        Ok(None)
    }

    fn evaluate_hard_example(&self, _: &ImagePayload) -> Result<bool, ServiceError> {
        Ok(false)
    }

    fn request_animation(&self, _: &ImagePayload) -> Result<OperationHandle, ServiceError> {
        Ok(OperationHandle("op-1".to_string()))
    }

    fn poll_animation(&self, handle: &OperationHandle) -> Result<AnimationPoll, ServiceError> {
        assert_eq!(handle.0, "op-1");
        let mut pending = self.pending.lock();
        if *pending > 0 {
            *pending -= 1;
            return Ok(AnimationPoll::default());
        }
        Ok(self.last.clone())
    }

    fn fetch_animation_bytes(&self, uri: &str) -> Result<Vec<u8>, ServiceError> {
        Ok(uri.as_bytes().to_vec())
    }
}

fn animator(service: VideoService, sleeper: Arc<RecordingSleeper>) -> Animator {
    let caller = RetryingCaller::new(RetryPolicy::default(), sleeper.clone());
    Animator::new(Arc::new(service), ResultStore::new(), caller, sleeper)
}

fn still() -> ImagePayload {
    ImagePayload::new("image/png", vec![1, 2, 3])
}

#[test]
fn polls_until_done_and_downloads() {
    let sleeper = Arc::new(RecordingSleeper::default());
    let done = AnimationPoll {
        done: true,
        result_uri: Some("video://clip".to_string()),
        error: None,
    };
    let animator = animator(VideoService::new(2, done), sleeper.clone());
    let mut messages = Vec::new();

    let video = animator
        .animate(&still(), &mut |m| messages.push(m.to_string()))
        .unwrap();

    assert_eq!(video.mime_type, "video/mp4");
    assert_eq!(video.bytes.as_slice(), b"video://clip");
    assert_eq!(
        messages,
        vec![
            "Submitting animation request...",
            "Generation started (this can take minutes)...",
            "Checking... (10s)",
            "Checking... (20s)",
            "Checking... (30s)",
            "Downloading video...",
        ]
    );
    assert_eq!(*sleeper.waits.lock(), vec![DEFAULT_POLL_INTERVAL; 3]);
}

#[test]
fn reported_failure_becomes_an_error() {
    let sleeper = Arc::new(RecordingSleeper::default());
    let failed = AnimationPoll {
        done: true,
        result_uri: None,
        error: Some("unsafe content".to_string()),
    };
    let animator = animator(VideoService::new(0, failed), sleeper);

    let err = animator.animate(&still(), &mut |_| {}).unwrap_err();
    assert!(matches!(err, AugmentError::Animation(_)));
    assert!(err.to_string().contains("unsafe content"));
}

#[test]
fn missing_download_link_is_an_error() {
    let sleeper = Arc::new(RecordingSleeper::default());
    let empty = AnimationPoll {
        done: true,
        ..AnimationPoll::default()
    };
    let animator = animator(VideoService::new(0, empty), sleeper);

    let err = animator.animate(&still(), &mut |_| {}).unwrap_err();
    assert!(err.to_string().contains("no download link"));
}

#[test]
fn unknown_result_is_not_started() {
    let sleeper = Arc::new(RecordingSleeper::default());
    let animator = animator(VideoService::new(0, AnimationPoll::default()), sleeper);
    assert!(animator.start(ResultId(42)).is_none());
    assert!(animator.store.animation_status(ResultId(42)).is_none());
}
