//! Poll Scenarios - End-to-end poller behaviour with scripted collaborators
//!
//! Dispatch outcomes are fed in as JSON, the way the CLI receives them.

use hostpoll_core::application::{cancel_channel, AsyncPoller};
use hostpoll_core::domain::{DispatchOutcome, DomainError, JobId, StatusReport};
use hostpoll_core::port::notifier::mocks::{NotifierEvent, RecordingNotifier};
use hostpoll_core::port::status_checker::mocks::{ScriptedAnswer, ScriptedStatusChecker};
use hostpoll_core::port::time_provider::mocks::ManualTimeProvider;
use hostpoll_core::AppError;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

fn poller_for(
    dispatch_json: &str,
    checker: &ScriptedStatusChecker,
    notifier: &RecordingNotifier,
    clock: &ManualTimeProvider,
) -> Result<AsyncPoller, AppError> {
    let dispatch = DispatchOutcome::from_json_str(dispatch_json)?;
    AsyncPoller::new(
        dispatch,
        Arc::new(checker.clone()),
        Arc::new(notifier.clone()),
        Arc::new(clock.clone()),
    )
}

fn finished(rc: i64) -> serde_json::Value {
    json!({"finished": 1, "rc": rc})
}

/// Scenario 1: started host finishes on the second poll, dark host kept from dispatch
#[tokio::test]
async fn test_started_host_finishes_on_second_poll() {
    let checker = ScriptedStatusChecker::new([
        ScriptedAnswer::AllRunning,
        ScriptedAnswer::Report(StatusReport::new().with_contacted("A", finished(0))),
    ]);
    let notifier = RecordingNotifier::new();
    let clock = ManualTimeProvider::new(0);

    let mut poller = poller_for(
        r#"{
            "contacted": {"A": {"started": 1, "finished": 0, "job_id": "42"}},
            "dark": {"B": {"unreachable": true, "msg": "no route to host"}}
        }"#,
        &checker,
        &notifier,
        &clock,
    )
    .unwrap();

    assert_eq!(poller.job_id(), Some(&JobId::new("42")));
    assert!(poller.aggregate().dark.contains_key("B"));

    let first = poller.poll().await;
    assert!(first.contacted.is_empty());
    assert!(first.dark.is_empty());
    assert!(first.polled.contains_key("A"));
    assert!(!poller.is_done());

    let second = poller.poll().await;
    assert!(second.contacted.contains_key("A"));
    assert!(poller.is_done());
    assert_eq!(notifier.ok_hosts(), vec!["A"]);

    // Only the started host is ever asked
    for (job_id, hosts) in checker.calls() {
        assert_eq!(job_id, JobId::new("42"));
        assert_eq!(hosts, vec!["A"]);
    }

    println!("✅ Scenario 1: second poll finishes A");
}

/// Scenario 2: every host dark at dispatch, wait returns immediately
#[tokio::test]
async fn test_all_dark_dispatch_returns_immediately() {
    let checker = ScriptedStatusChecker::never_finishing();
    let notifier = RecordingNotifier::new();
    let clock = ManualTimeProvider::new(0);

    let mut poller = poller_for(
        r#"{"dark": {"a": {"msg": "refused"}, "b": {"msg": "timeout"}}}"#,
        &checker,
        &notifier,
        &clock,
    )
    .unwrap();

    assert!(poller.job_id().is_none());
    assert!(poller.pending().is_empty());

    let aggregate = poller.wait(60, 5).await.unwrap();

    assert_eq!(aggregate.dark.len(), 2);
    assert_eq!(checker.call_count(), 0);
    assert_eq!(clock.sleep_count(), 0);
    assert!(notifier.poll_events().is_empty());
}

/// Scenario 3: host goes dark between cycles and never comes back
#[tokio::test]
async fn test_host_goes_dark_between_cycles() {
    let checker = ScriptedStatusChecker::new([
        ScriptedAnswer::Report(
            StatusReport::new()
                .with_contacted("web1", json!({"started": 1, "finished": 0, "job_id": "7"}))
                .with_dark("web2", json!({"unreachable": true, "msg": "connection lost"})),
        ),
        ScriptedAnswer::Report(StatusReport::new().with_contacted("web1", finished(0))),
    ]);
    let notifier = RecordingNotifier::new();
    let clock = ManualTimeProvider::new(0);

    let mut poller = poller_for(
        r#"{"contacted": {
            "web1": {"started": 1, "job_id": "7"},
            "web2": {"started": 1, "job_id": "7"}
        }}"#,
        &checker,
        &notifier,
        &clock,
    )
    .unwrap();

    let aggregate = poller.wait(30, 10).await.unwrap();

    assert!(aggregate.dark.contains_key("web2"));
    assert!(aggregate.contacted.contains_key("web1"));
    assert_eq!(notifier.failed_hosts(), vec!["web2"]);

    let calls = checker.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[1].1, vec!["web1"]);
}

/// Scenario 4: budget exhausted, unresolved hosts are absent from the aggregate
#[tokio::test]
async fn test_deadline_leaves_hosts_unresolved() {
    let checker = ScriptedStatusChecker::new([ScriptedAnswer::Report(
        StatusReport::new()
            .with_contacted("fast", finished(2))
            .with_contacted("slow", json!({"started": 1, "finished": 0, "job_id": "9"})),
    )]);
    let notifier = RecordingNotifier::new();
    let clock = ManualTimeProvider::new(0);

    let mut poller = poller_for(
        r#"{"contacted": {
            "fast": {"started": 1, "job_id": "9"},
            "slow": {"started": 1, "job_id": "9"}
        }}"#,
        &checker,
        &notifier,
        &clock,
    )
    .unwrap();

    let aggregate = poller.wait(30, 10).await.unwrap();

    assert!(!aggregate.contains("slow"));
    assert!(poller.pending().contains("slow"));
    assert_eq!(checker.call_count(), 3);
    assert_eq!(clock.sleeps(), vec![Duration::from_secs(10); 3]);
    assert_eq!(notifier.failed_hosts(), vec!["fast"]);
    assert_eq!(
        notifier.poll_events(),
        vec![
            ("slow".to_string(), 20),
            ("slow".to_string(), 10),
            ("slow".to_string(), 0)
        ]
    );

    let summary = aggregate.summary();
    assert_eq!(summary.failed, 1);
    assert!(!summary.all_ok());
}

/// Scenario 5: status-check transport failure marks every targeted host dark
#[tokio::test]
async fn test_transport_failure_marks_targets_dark() {
    let checker = ScriptedStatusChecker::new([ScriptedAnswer::Fail("connection pool exhausted".into())]);
    let notifier = RecordingNotifier::new();
    let clock = ManualTimeProvider::new(0);

    let mut poller = poller_for(
        r#"{"contacted": {
            "a": {"started": 1, "job_id": "3"},
            "b": {"started": 1, "job_id": "3"},
            "c": {"rc": 0}
        }}"#,
        &checker,
        &notifier,
        &clock,
    )
    .unwrap();

    let delta = poller.poll().await;

    assert_eq!(delta.dark.len(), 2);
    assert!(delta.dark["a"]
        .as_value()["msg"]
        .as_str()
        .unwrap()
        .contains("connection pool exhausted"));
    assert!(poller.is_done());
    assert!(poller.aggregate().contacted.contains_key("c"));
    assert_eq!(notifier.failed_hosts(), vec!["a", "b"]);
}

/// Scenario 6: inconsistent job ids are rejected at construction
#[tokio::test]
async fn test_mismatched_job_ids_rejected() {
    let checker = ScriptedStatusChecker::never_finishing();
    let notifier = RecordingNotifier::new();
    let clock = ManualTimeProvider::new(0);

    let result = poller_for(
        r#"{"contacted": {
            "a": {"started": 1, "job_id": "1"},
            "b": {"started": 1, "job_id": "2"}
        }}"#,
        &checker,
        &notifier,
        &clock,
    );

    assert!(matches!(
        result,
        Err(AppError::Domain(DomainError::JobIdMismatch { .. }))
    ));
}

/// Scenario 7: cancellation stops the wait before the deadline
#[tokio::test]
async fn test_cancelled_wait_keeps_progress() {
    let checker = ScriptedStatusChecker::never_finishing();
    let notifier = RecordingNotifier::new();
    let clock = ManualTimeProvider::new(0);

    let mut poller = poller_for(
        r#"{"contacted": {"a": {"started": 1, "job_id": "5"}}}"#,
        &checker,
        &notifier,
        &clock,
    )
    .unwrap();

    let (cancel_tx, cancel_token) = cancel_channel();
    cancel_tx.cancel();

    let aggregate = poller
        .wait_with_cancel(3600, 1, cancel_token)
        .await
        .unwrap();

    assert!(aggregate.is_empty());
    assert!(poller.pending().contains("a"));
    assert_eq!(checker.call_count(), 0);
    assert!(!notifier
        .events()
        .iter()
        .any(|event| matches!(event, NotifierEvent::Poll { .. })));
}
