//! Tests for logging, timing, tagging, hooks and parameter sweeps.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use pretty_assertions::assert_eq;
use testdecor::prelude::*;

#[derive(Default)]
struct RecordingHooks {
    calls: Mutex<Vec<String>>,
}

impl Hooks for RecordingHooks {
    fn before(&self, name: &str) {
        self.calls.lock().unwrap().push(format!("before:{name}"));
    }

    fn after(&self, name: &str) {
        self.calls.lock().unwrap().push(format!("after:{name}"));
    }
}

#[test]
fn logged_blocking_returns_results_unchanged() {
    let ok = logged_blocking("test_example", || Ok::<_, DecorError>(1 + 1));
    assert_eq!(ok.unwrap(), 2);

    let err = logged_blocking("test_example", || {
        Err::<(), _>(DecorError::assertion("1 + 1 != 3"))
    })
    .unwrap_err();
    assert_eq!(err.to_string(), "assertion failure: 1 + 1 != 3");
}

#[tokio::test]
async fn logged_returns_results_unchanged() {
    let ok = logged("test_example", async { Ok::<_, DecorError>("passed") }).await;
    assert_eq!(ok.unwrap(), "passed");

    let err = logged("test_example", async {
        Err::<(), _>(DecorError::connection("down"))
    })
    .await
    .unwrap_err();
    assert_eq!(err.failure_kind(), FailureKind::Connection);
}

#[tokio::test(start_paused = true)]
async fn timed_report_measures_virtual_time() {
    let (result, report) = timed_report("test_slow_function", async {
        tokio::time::sleep(Duration::from_secs(5)).await;
        Ok::<_, DecorError>(())
    })
    .await;

    assert!(result.is_ok());
    assert_eq!(report.operation, "test_slow_function");
    assert!(report.succeeded);
    assert!(report.elapsed >= Duration::from_secs(5));
    assert!(report.elapsed < Duration::from_secs(6));
}

#[test]
fn timed_report_blocking_covers_failures_and_serializes() {
    let (result, report) = timed_report_blocking("test_broken", || {
        Err::<(), _>(DecorError::invalid_value("bad input"))
    });

    assert!(matches!(result, Err(DecorError::Failed { .. })));
    assert!(!report.succeeded);

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["operation"], "test_broken");
    assert_eq!(json["succeeded"], false);
    assert!(json["started_at"].is_string());
}

#[test]
fn timed_blocking_returns_value() {
    let value = timed_blocking("test_fast", || Ok::<_, DecorError>(vec![1, 2, 3])).unwrap();
    assert_eq!(value, vec![1, 2, 3]);
}

#[tokio::test]
async fn test_meta_run_passes_result_through() {
    let meta = TestMeta::builder()
        .name("test_login_functionality")
        .priority(Priority::High)
        .category("login")
        .build();

    let result = meta.run(async { Ok::<_, DecorError>("success") }).await;

    assert_eq!(result.unwrap(), "success");
    assert_eq!(meta.priority.to_string(), "high");
}

#[test]
fn around_calls_hooks_in_order_on_success() {
    let hooks = RecordingHooks::default();

    let value = around_blocking("test_hooks", &hooks, || Ok::<_, DecorError>(10)).unwrap();

    assert_eq!(value, 10);
    assert_eq!(
        *hooks.calls.lock().unwrap(),
        vec!["before:test_hooks".to_string(), "after:test_hooks".to_string()]
    );
}

#[tokio::test]
async fn around_skips_after_hook_on_failure() {
    let hooks = RecordingHooks::default();

    let result = around("test_hooks", &hooks, async {
        Err::<(), _>(DecorError::assertion("failed"))
    })
    .await;

    assert!(result.is_err());
    assert_eq!(*hooks.calls.lock().unwrap(), vec!["before:test_hooks".to_string()]);
}

#[test]
fn around_accepts_logging_hooks() {
    let result = around_blocking("test_logging_hooks", &LoggingHooks, || Ok::<_, DecorError>(1));
    assert_eq!(result.unwrap(), 1);
}

#[test]
fn parameterize_blocking_runs_every_set_in_order() {
    let results = parameterize_blocking("test_addition", [(1, 2), (2, 3), (3, 4)], |(a, b)| {
        Ok::<_, DecorError>(a + b)
    })
    .unwrap();

    assert_eq!(results, vec![3, 5, 7]);
}

#[test]
fn parameterize_blocking_stops_at_first_failure() {
    let calls = AtomicUsize::new(0);

    let err = parameterize_blocking("test_positive", [1, -1, 2], |n: i32| {
        calls.fetch_add(1, Ordering::SeqCst);
        if n > 0 {
            Ok(n)
        } else {
            Err(DecorError::invalid_value(format!("{n} is not positive")))
        }
    })
    .unwrap_err();

    assert_eq!(err.to_string(), "invalid_value failure: -1 is not positive");
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn parameterize_handles_empty_and_async_sets() {
    let empty: Vec<u8> = parameterize("test_nothing", Vec::<u8>::new(), |n| async move {
        Ok::<_, DecorError>(n)
    })
    .await
    .unwrap();
    assert!(empty.is_empty());

    let doubled = parameterize("test_double", vec![1u32, 2, 3], |n| async move {
        Ok::<_, DecorError>(n * 2)
    })
    .await
    .unwrap();
    assert_eq!(doubled, vec![2, 4, 6]);
}

#[test]
fn wrappers_compose_innermost_first() {
    let retry = RetryPolicy::fixed(3, Duration::ZERO).unwrap();
    let timeout = TimeoutPolicy::from_secs(5).unwrap();
    let meta = TestMeta::named("test_flaky_api");
    let calls = Arc::new(AtomicUsize::new(0));

    let status = logged_blocking("test_flaky_api", || {
        timed_blocking("test_flaky_api", || {
            meta.run_blocking(|| {
                retry.execute_blocking("test_flaky_api", || {
                    let calls = calls.clone();
                    timeout.execute_blocking("test_flaky_api", move || {
                        if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                            Err(DecorError::connection("503 Service Unavailable"))
                        } else {
                            Ok(200)
                        }
                    })
                })
            })
        })
    })
    .unwrap();

    assert_eq!(status, 200);
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}
