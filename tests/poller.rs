//! Poller state machine: attempt accounting, fixed-interval sleeps,
//! verbatim terminal statuses.
//!
//! All tests run on paused tokio time, so every suspension advances
//! the clock by exactly one poll interval and the sleep count is
//! observable as elapsed time.

use std::time::Duration;

use mockall::Sequence;
use tokio::time::Instant;

use learn_cli::api::{BuildStatus, MockLearnApi};
use learn_cli::error::ApiError;
use learn_cli::poll::BuildPoller;

const INTERVAL: Duration = Duration::from_secs(2);

fn poller(attempts: u8) -> BuildPoller {
    BuildPoller {
        interval: INTERVAL,
        attempts,
    }
}

fn status(tag: &str) -> BuildStatus {
    BuildStatus {
        release_id: 7,
        status: tag.to_string(),
        ..BuildStatus::default()
    }
}

#[tokio::test(start_paused = true)]
async fn terminal_status_on_first_fetch_returns_without_sleeping() {
    let mut api = MockLearnApi::new();
    api.expect_release_status()
        .withf(|id| *id == 7)
        .times(1)
        .returning(|_| {
            Ok(BuildStatus {
                preview_url: Some("https://learn.example/preview/7".to_string()),
                ..status("live")
            })
        });

    let started = Instant::now();
    let settled = poller(20)
        .wait_for_build(&api, 7)
        .await
        .expect("terminal status should be returned");

    assert_eq!(settled.status, "live");
    assert_eq!(started.elapsed(), Duration::ZERO);
}

#[tokio::test(start_paused = true)]
async fn unknown_status_is_terminal_and_returned_verbatim() {
    let mut api = MockLearnApi::new();
    api.expect_release_status()
        .times(1)
        .returning(|_| Ok(status("errored")));

    let settled = poller(20).wait_for_build(&api, 7).await.unwrap();
    assert_eq!(settled.status, "errored");
}

#[tokio::test(start_paused = true)]
async fn pending_then_terminal_sleeps_once_per_pending_fetch() {
    let mut api = MockLearnApi::new();
    let mut seq = Sequence::new();
    for tag in ["processing", "pending"] {
        api.expect_release_status()
            .times(1)
            .in_sequence(&mut seq)
            .returning(move |_| Ok(status(tag)));
    }
    api.expect_release_status()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_| Ok(status("live")));

    let started = Instant::now();
    let settled = poller(20).wait_for_build(&api, 7).await.unwrap();

    assert_eq!(settled.status, "live");
    // Two pending fetches, one fixed-interval suspension after each.
    assert_eq!(started.elapsed(), 2 * INTERVAL);
}

#[tokio::test(start_paused = true)]
async fn budget_of_n_permits_exactly_n_fetches() {
    let mut api = MockLearnApi::new();
    api.expect_release_status()
        .times(3)
        .returning(|_| Ok(status("pending")));

    let started = Instant::now();
    let err = poller(3)
        .wait_for_build(&api, 7)
        .await
        .expect_err("pending forever should exhaust the budget");

    assert!(matches!(err, ApiError::RetryExhausted { attempts: 3 }));
    // The last attempt is consumed on entry to the exhaustion check:
    // no sleep follows it, so only N-1 suspensions happen.
    assert_eq!(started.elapsed(), 2 * INTERVAL);
}

#[tokio::test(start_paused = true)]
async fn budget_of_one_fetches_once_then_exhausts_without_sleeping() {
    let mut api = MockLearnApi::new();
    api.expect_release_status()
        .times(1)
        .returning(|_| Ok(status("processing")));

    let started = Instant::now();
    let err = poller(1).wait_for_build(&api, 7).await.expect_err("exhausted");

    assert!(matches!(err, ApiError::RetryExhausted { attempts: 1 }));
    assert_eq!(started.elapsed(), Duration::ZERO);
}

#[tokio::test(start_paused = true)]
async fn non_success_poll_response_aborts_immediately() {
    let mut api = MockLearnApi::new();
    let mut seq = Sequence::new();
    api.expect_release_status()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_| Ok(status("pending")));
    api.expect_release_status()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_| Err(ApiError::rejection(502, Some("upstream gone".to_string()))));

    let err = poller(20).wait_for_build(&api, 7).await.expect_err("rejection");
    match err {
        ApiError::RemoteRejection { status, message } => {
            assert_eq!(status, 502);
            assert_eq!(message.as_deref(), Some("upstream gone"));
        }
        other => panic!("expected RemoteRejection, got {other:?}"),
    }
}
