use super::*;
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

fn caller(sleeper: Arc<RecordingSleeper>) -> RetryingCaller {
    let policy = RetryPolicy {
        max_jitter: Duration::ZERO,
        ..RetryPolicy::default()
    };
    RetryingCaller::new(policy, sleeper)
}

fn rate_limited() -> ServiceError {
    ServiceError::api("429 RESOURCE_EXHAUSTED")
}

#[test]
fn succeeds_after_four_rate_limits() {
    let sleeper = Arc::new(RecordingSleeper::default());
    let caller = caller(sleeper.clone());
    let mut attempts = 0u32;
    let mut notices = Vec::new();

    let out = caller.call(
        || {
            attempts += 1;
            if attempts <= 4 {
                Err(rate_limited())
            } else {
                Ok("image")
            }
        },
        &mut |n| notices.push(n),
    );

    assert_eq!(out.unwrap(), "image");
    assert_eq!(attempts, 5);
    assert_eq!(
        notices.iter().map(|n| n.attempt).collect::<Vec<_>>(),
        vec![1, 2, 3, 4]
    );
    assert!(notices.iter().all(|n| n.max_attempts == 5));
    assert_eq!(
        *sleeper.waits.lock(),
        vec![
            Duration::from_secs(2),
            Duration::from_secs(4),
            Duration::from_secs(8),
            Duration::from_secs(16),
        ]
    );
}

#[test]
fn five_rate_limits_exhaust_the_budget() {
    let sleeper = Arc::new(RecordingSleeper::default());
    let caller = caller(sleeper.clone());
    let mut attempts = 0u32;
    let mut retries = 0u32;

    let err = caller
        .call::<()>(
            || {
                attempts += 1;
                Err(rate_limited())
            },
            &mut |_| retries += 1,
        )
        .unwrap_err();

    assert_eq!(attempts, 5);
    assert_eq!(retries, 4);
    assert_eq!(sleeper.waits.lock().len(), 4);
    assert!(err.is_rate_limit_exhausted());
    let msg = err.to_string();
    assert!(msg.contains("after 5 attempts"));
    assert!(msg.contains("RESOURCE_EXHAUSTED"));
}

#[test]
fn other_failures_are_not_retried() {
    let sleeper = Arc::new(RecordingSleeper::default());
    let caller = caller(sleeper.clone());
    let mut attempts = 0u32;

    let err = caller
        .call::<()>(
            || {
                attempts += 1;
                Err(ServiceError::api("invalid argument"))
            },
            &mut |_| panic!("no retry expected"),
        )
        .unwrap_err();

    assert_eq!(attempts, 1);
    assert!(sleeper.waits.lock().is_empty());
    assert!(matches!(err, AugmentError::Service(_)));
}

#[test]
fn jitter_stays_within_bound() {
    let policy = RetryPolicy::default();
    for _ in 0..32 {
        assert!(policy.jitter() <= policy.max_jitter);
    }
    assert_eq!(policy.backoff(0), Duration::from_secs(2));
    assert_eq!(policy.backoff(3), Duration::from_secs(16));
}
