use crate::tests::fast_retry;
use crate::{DnsError, RetryPolicy, with_retry};

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

#[test]
fn given_default_schedule_when_delays_computed_then_exponential_from_base() {
    let policy = fast_retry();

    assert_eq!(policy.delay_for(1), Duration::from_millis(1000));
    assert_eq!(policy.delay_for(2), Duration::from_millis(2000));
    assert_eq!(policy.delay_for(3), Duration::from_millis(4000));
}

#[test]
fn given_low_cap_when_delays_computed_then_capped() {
    let policy = RetryPolicy {
        max_delay: Duration::from_millis(1500),
        ..fast_retry()
    };

    assert_eq!(policy.delay_for(4), Duration::from_millis(1500));
}

#[tokio::test(start_paused = true)]
async fn given_server_errors_when_retried_then_succeeds_on_third_attempt() {
    // Given
    let counter = AtomicU32::new(0);
    let calls = &counter;

    // When
    let result = with_retry(&fast_retry(), "op", move || async move {
        match calls.fetch_add(1, Ordering::SeqCst) {
            0 | 1 => Err(DnsError::provider_api(502, 0, "bad gateway")),
            _ => Ok("done"),
        }
    })
    .await;

    // Then
    assert_eq!(result.unwrap(), "done");
    assert_eq!(counter.load(Ordering::SeqCst), 3);
}

#[tokio::test(start_paused = true)]
async fn given_rate_limit_forever_when_retried_then_gives_up_after_max_attempts() {
    let counter = AtomicU32::new(0);
    let calls = &counter;

    let result: Result<(), DnsError> = with_retry(&fast_retry(), "op", move || async move {
        calls.fetch_add(1, Ordering::SeqCst);
        Err(DnsError::provider_api(429, 10000, "rate limited"))
    })
    .await;

    assert!(matches!(result, Err(DnsError::ProviderApi { status: 429, .. })));
    assert_eq!(counter.load(Ordering::SeqCst), 3);
}

#[tokio::test(start_paused = true)]
async fn given_client_error_when_retried_then_fails_immediately() {
    let counter = AtomicU32::new(0);
    let calls = &counter;

    let result: Result<(), DnsError> = with_retry(&fast_retry(), "op", move || async move {
        calls.fetch_add(1, Ordering::SeqCst);
        Err(DnsError::provider_api(403, 9109, "Unauthorized"))
    })
    .await;

    assert!(result.is_err());
    assert_eq!(counter.load(Ordering::SeqCst), 1);
}

#[test]
fn given_error_kinds_when_classified_then_only_transient_retryable() {
    assert!(DnsError::provider_api(500, 0, "x").is_retryable());
    assert!(DnsError::provider_api(429, 0, "x").is_retryable());
    assert!(!DnsError::provider_api(404, 0, "x").is_retryable());
    assert!(!DnsError::configuration("x").is_retryable());
}
