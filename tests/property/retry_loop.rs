//! Property tests for the retry loop.
//!
//! Invariants tested:
//! - The work runs exactly as many times as it takes to call stop()
//! - An error at iteration n ends the loop after exactly n invocations
//! - Any positive finite timeout is accepted and reported verbatim
//! - Non-positive fractional timeouts are rejected

use proptest::prelude::*;
use retry_loop::{LoopError, RetryLoop, Timeout};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::runtime::Runtime;

#[derive(Debug, Clone, PartialEq)]
struct TestError(usize);

impl std::fmt::Display for TestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "failed at iteration {}", self.0)
    }
}

impl std::error::Error for TestError {}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    /// Property: stopping at iteration n invokes the work exactly n times
    #[test]
    fn stops_after_exactly_n_iterations(stop_at in 1usize..50) {
        let rt = Runtime::new().unwrap();
        let calls = rt.block_on(async {
            let calls = AtomicUsize::new(0);
            let retry_loop = RetryLoop::new(Timeout::from_secs(30)).unwrap();

            retry_loop
                .execute(|control| {
                    let count = calls.fetch_add(1, Ordering::SeqCst) + 1;
                    async move {
                        if count == stop_at {
                            control.stop();
                        }
                        Ok::<_, TestError>(())
                    }
                })
                .await
                .unwrap();

            calls.load(Ordering::SeqCst)
        });

        prop_assert_eq!(calls, stop_at);
    }

    /// Property: an error ends the loop at once and is returned unchanged
    #[test]
    fn error_ends_loop_immediately(fail_at in 1usize..50) {
        let rt = Runtime::new().unwrap();
        let (result, calls) = rt.block_on(async {
            let calls = AtomicUsize::new(0);
            let retry_loop = RetryLoop::unbounded();

            let result = retry_loop
                .execute(|_control| {
                    let count = calls.fetch_add(1, Ordering::SeqCst) + 1;
                    async move {
                        if count == fail_at {
                            Err(TestError(count))
                        } else {
                            Ok(())
                        }
                    }
                })
                .await;

            (result, calls.load(Ordering::SeqCst))
        });

        prop_assert_eq!(result, Err(LoopError::Work(TestError(fail_at))));
        prop_assert_eq!(calls, fail_at);
    }

    /// Property: positive finite timeouts are accepted and kept as configured
    #[test]
    fn positive_timeouts_are_valid(millis in 1u64..10_000_000) {
        let timeout = Timeout::from_millis(millis);
        let retry_loop = RetryLoop::new(timeout).unwrap();
        prop_assert_eq!(retry_loop.timeout(), timeout);
        prop_assert_eq!(retry_loop.timeout().duration(), Some(Duration::from_millis(millis)));
    }

    /// Property: zero and negative fractional timeouts are rejected
    #[test]
    fn non_positive_timeouts_are_invalid(secs in -1.0e9f64..=0.0) {
        prop_assert!(Timeout::from_secs_f64(secs).is_err());
    }

    /// Property: whole-second timeouts render as integers in the timeout message
    #[test]
    fn whole_second_timeout_message(secs in 1u64..100_000) {
        let err: LoopError<TestError> = LoopError::TimeoutExceeded {
            timeout: Timeout::from_secs(secs),
        };
        prop_assert_eq!(err.to_string(), format!("Timeout of {} seconds exceeded.", secs));
    }
}
