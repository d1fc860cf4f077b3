//! Retry loop metrics regression tests

use super::helpers::*;
use retry_loop::{RetryLoop, Timeout};
use serial_test::serial;
use std::time::Duration;

#[tokio::test]
#[serial]
async fn retry_loop_completion_metrics() {
    init_recorder();

    let retry_loop = RetryLoop::builder()
        .name("test_retry_loop")
        .timeout(Timeout::from_secs(5))
        .build()
        .unwrap();

    let _ = retry_loop
        .execute(|control| async move {
            if control.iteration() == 2 {
                control.stop();
            }
            Ok::<_, &'static str>(())
        })
        .await;

    assert_counter_exists("retry_loop_executions_total");
    assert_metric_has_label("retry_loop_executions_total", "retry_loop", "test_retry_loop");
    assert_metric_has_label("retry_loop_executions_total", "result", "completed");

    assert_histogram_exists("retry_loop_iterations");
    assert_histogram_exists("retry_loop_execution_duration_seconds");
    assert_metric_has_label(
        "retry_loop_execution_duration_seconds",
        "retry_loop",
        "test_retry_loop",
    );
}

#[tokio::test]
#[serial]
async fn retry_loop_timeout_metrics() {
    init_recorder();

    let retry_loop = RetryLoop::builder()
        .name("timeout_retry_loop")
        .timeout_duration(Duration::from_millis(30))
        .build()
        .unwrap();

    let _ = retry_loop
        .execute(|_control| async {
            tokio::time::sleep(Duration::from_millis(100)).await;
            Ok::<_, &'static str>(())
        })
        .await;

    assert_metric_has_label("retry_loop_executions_total", "retry_loop", "timeout_retry_loop");
    assert_metric_has_label("retry_loop_executions_total", "result", "timed_out");
    assert_metric_has_label(
        "retry_loop_execution_duration_seconds",
        "retry_loop",
        "timeout_retry_loop",
    );
}

#[tokio::test]
#[serial]
async fn retry_loop_work_error_metrics() {
    init_recorder();

    let retry_loop = RetryLoop::builder()
        .name("failing_retry_loop")
        .build()
        .unwrap();

    let _ = retry_loop
        .execute(|_control| async { Err::<(), _>("store down") })
        .await;

    assert_metric_has_label("retry_loop_executions_total", "retry_loop", "failing_retry_loop");
    assert_metric_has_label("retry_loop_executions_total", "result", "work_failed");
}
