mod common;

use std::time::Duration;

use askdesk_core::{ChatError, JobId, JobOutcome, JobStatus};
use askdesk_engine::{JobPoller, PollSettings, PollStep, TransportPolicy};
use common::{complete, failed, init_logging, network_error, pending, processing, ScriptedBackend};
use pretty_assertions::assert_eq;
use serde_json::json;
use tokio_util::sync::CancellationToken;

fn settings(max_attempts: u32) -> PollSettings {
    PollSettings {
        interval: Duration::from_millis(1),
        max_attempts,
        transport_policy: TransportPolicy::RetryWithinBudget,
    }
}

fn poller(max_attempts: u32) -> JobPoller {
    JobPoller::new(JobId::new("job-1"), settings(max_attempts))
}

#[tokio::test]
async fn completes_after_pending_statuses() {
    init_logging();
    let backend = ScriptedBackend::new(vec![
        Ok(pending()),
        Ok(pending()),
        Ok(complete(json!({ "response": { "text": "final [source: kb]" } }))),
    ]);

    let outcome = poller(15).run(&backend, &CancellationToken::new()).await;

    assert_eq!(
        outcome,
        Some(JobOutcome::Answered("final [source: kb]".to_string()))
    );
    assert_eq!(backend.status_calls(), 3);
}

#[tokio::test]
async fn times_out_after_max_attempts_and_stops_querying() {
    init_logging();
    let backend = ScriptedBackend::new(vec![Ok(processing())]);

    let outcome = poller(4).run(&backend, &CancellationToken::new()).await;

    assert_eq!(
        outcome,
        Some(JobOutcome::Failed(ChatError::JobTimeout { attempts: 4 }))
    );
    assert_eq!(backend.status_calls(), 4);
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(backend.status_calls(), 4);
}

#[tokio::test]
async fn backend_error_status_fails_job_with_detail() {
    init_logging();
    let backend = ScriptedBackend::new(vec![Ok(pending()), Ok(failed("index offline"))]);

    let outcome = poller(15).run(&backend, &CancellationToken::new()).await;

    assert_eq!(
        outcome,
        Some(JobOutcome::Failed(ChatError::JobFailed(Some(
            "index offline".to_string()
        ))))
    );
    assert_eq!(backend.status_calls(), 2);
}

#[tokio::test]
async fn transport_errors_are_retried_within_budget() {
    init_logging();
    let backend = ScriptedBackend::new(vec![
        Err(network_error()),
        Err(network_error()),
        Ok(complete(json!("recovered"))),
    ]);

    let outcome = poller(5).run(&backend, &CancellationToken::new()).await;

    assert_eq!(outcome, Some(JobOutcome::Answered("recovered".to_string())));
    assert_eq!(backend.status_calls(), 3);
}

#[tokio::test]
async fn transport_error_on_last_attempt_is_terminal() {
    init_logging();
    let backend = ScriptedBackend::new(vec![Ok(pending()), Err(network_error())]);

    let outcome = poller(2).run(&backend, &CancellationToken::new()).await;

    match outcome {
        Some(JobOutcome::Failed(ChatError::TransportFailure(message))) => {
            assert!(message.contains("connection reset"));
        }
        other => panic!("unexpected outcome {other:?}"),
    }
    assert_eq!(backend.status_calls(), 2);
}

#[tokio::test]
async fn fail_fast_policy_stops_on_first_transport_error() {
    init_logging();
    let backend = ScriptedBackend::new(vec![Err(network_error()), Ok(complete(json!("late")))]);
    let settings = PollSettings {
        transport_policy: TransportPolicy::FailFast,
        ..settings(10)
    };

    let outcome = JobPoller::new(JobId::new("job-1"), settings)
        .run(&backend, &CancellationToken::new())
        .await;

    assert!(matches!(
        outcome,
        Some(JobOutcome::Failed(ChatError::TransportFailure(_)))
    ));
    assert_eq!(backend.status_calls(), 1);
}

#[tokio::test]
async fn complete_without_response_is_a_job_failure() {
    init_logging();
    let mut report = complete(json!(null));
    report.response = None;
    let backend = ScriptedBackend::new(vec![Ok(report)]);

    let outcome = poller(3).run(&backend, &CancellationToken::new()).await;

    assert!(matches!(
        outcome,
        Some(JobOutcome::Failed(ChatError::JobFailed(Some(_))))
    ));
}

#[tokio::test]
async fn single_steps_expose_attempt_and_status() {
    init_logging();
    let backend = ScriptedBackend::new(vec![Ok(processing()), Ok(complete(json!("ok")))]);
    let mut poller = poller(15);
    assert_eq!(poller.attempt(), 0);
    assert_eq!(poller.status(), JobStatus::Pending);

    assert_eq!(poller.poll_once(&backend).await, Some(PollStep::Continue));
    assert_eq!(poller.attempt(), 1);
    assert_eq!(poller.status(), JobStatus::Processing);

    assert_eq!(
        poller.poll_once(&backend).await,
        Some(PollStep::Finished(JobOutcome::Answered("ok".to_string())))
    );
    assert!(poller.is_finished());

    // A finished poller never queries again.
    assert_eq!(poller.poll_once(&backend).await, None);
    assert_eq!(backend.status_calls(), 2);
}

#[tokio::test]
async fn cancelled_poller_reports_nothing() {
    init_logging();
    let backend = ScriptedBackend::new(Vec::new());
    let token = CancellationToken::new();
    token.cancel();
    token.cancel();

    let outcome = poller(15).run(&backend, &token).await;

    assert_eq!(outcome, None);
    assert_eq!(backend.status_calls(), 0);
}

#[tokio::test]
async fn cancelling_mid_run_stops_queries() {
    init_logging();
    let backend = std::sync::Arc::new(ScriptedBackend::new(Vec::new()));
    let token = CancellationToken::new();
    let settings = PollSettings {
        interval: Duration::from_millis(10),
        ..settings(1_000)
    };

    let task = {
        let backend = backend.clone();
        let token = token.clone();
        tokio::spawn(async move {
            JobPoller::new(JobId::new("job-1"), settings)
                .run(backend.as_ref(), &token)
                .await
        })
    };
    tokio::time::sleep(Duration::from_millis(55)).await;
    token.cancel();

    assert_eq!(task.await.unwrap(), None);
    let calls = backend.status_calls();
    assert!(calls >= 1);
    tokio::time::sleep(Duration::from_millis(40)).await;
    assert_eq!(backend.status_calls(), calls);
}

#[test]
fn budget_is_attempts_times_interval() {
    let settings = PollSettings::default();
    assert_eq!(settings.max_attempts, 15);
    assert_eq!(settings.budget(), Duration::from_secs(60));

    let zero = PollSettings {
        max_attempts: 0,
        ..PollSettings::default()
    };
    assert_eq!(zero.budget(), zero.interval);
}
