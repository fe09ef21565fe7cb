use std::time::Duration;

use casa::{CasaError, EnrichmentOutcome, SkipReason};
use casa_mock::{DynamicMockConnector, MemorySink, MockBehavior};

use crate::helpers::{casa_with, casa_with_timeout, detail, id, transient};

fn assert_gaps_within(times: &[tokio::time::Instant], lo: Duration, hi: Duration) {
    for pair in times.windows(2) {
        let gap = pair[1] - pair[0];
        assert!(gap >= lo && gap <= hi, "gap {gap:?} outside [{lo:?}, {hi:?}]");
    }
}

#[tokio::test(start_paused = true)]
async fn two_transient_failures_then_success_makes_three_attempts() {
    let (mock, controller) = DynamicMockConnector::new_with_controller("P0");
    let l = id(1);
    controller
        .script_detail(
            l.clone(),
            vec![
                MockBehavior::Fail(transient()),
                MockBehavior::Fail(transient()),
                MockBehavior::Return(detail(&l, "Harderwijkoever 16")),
            ],
        )
        .await;
    let casa = casa_with(mock, &MemorySink::new());

    let out = casa.enrich(&l).await;
    assert!(matches!(out, EnrichmentOutcome::Success(_)), "{out:?}");

    let attempts = controller.detail_attempts(&l).await;
    assert_eq!(attempts.len(), 3);
    assert_gaps_within(&attempts, Duration::from_secs(1), Duration::from_secs(3));
}

#[tokio::test(start_paused = true)]
async fn three_transient_failures_fail_without_a_fourth_attempt() {
    let (mock, controller) = DynamicMockConnector::new_with_controller("P0");
    let l = id(2);
    controller
        .set_detail_behavior(l.clone(), MockBehavior::Fail(transient()))
        .await;
    let casa = casa_with(mock, &MemorySink::new());

    match casa.enrich(&l).await {
        EnrichmentOutcome::Failed(CasaError::RetriesExhausted { attempts, last }) => {
            assert_eq!(attempts, 3);
            assert!(last.is_transient());
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
    let attempts = controller.detail_attempts(&l).await;
    assert_eq!(attempts.len(), 3);
    assert_gaps_within(&attempts, Duration::from_secs(1), Duration::from_secs(3));
}

#[tokio::test(start_paused = true)]
async fn removed_listing_is_skipped_without_retry() {
    let (mock, controller) = DynamicMockConnector::new_with_controller("P0");
    let l = id(3);
    controller
        .set_detail_behavior(
            l.clone(),
            MockBehavior::Fail(CasaError::not_found("listing")),
        )
        .await;
    let casa = casa_with(mock, &MemorySink::new());

    assert_eq!(
        casa.enrich(&l).await,
        EnrichmentOutcome::Skipped(SkipReason::ListingUnavailable)
    );
    assert_eq!(controller.detail_attempts(&l).await.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn fatal_detail_error_is_terminal() {
    let (mock, controller) = DynamicMockConnector::new_with_controller("P0");
    let l = id(4);
    controller
        .set_detail_behavior(
            l.clone(),
            MockBehavior::Fail(CasaError::connector("P0", "malformed page")),
        )
        .await;
    let casa = casa_with(mock, &MemorySink::new());

    assert!(matches!(
        casa.enrich(&l).await,
        EnrichmentOutcome::Failed(CasaError::Connector { .. })
    ));
    assert_eq!(controller.detail_attempts(&l).await.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn stalled_detail_call_times_out_and_is_retried() {
    let (mock, controller) = DynamicMockConnector::new_with_controller("P0");
    let l = id(5);
    controller
        .script_detail(
            l.clone(),
            vec![
                MockBehavior::Hang,
                MockBehavior::Return(detail(&l, "Harderwijkoever 16")),
            ],
        )
        .await;
    let casa = casa_with_timeout(mock, &MemorySink::new(), Duration::from_secs(5));

    let out = casa.enrich(&l).await;
    assert!(matches!(out, EnrichmentOutcome::Success(_)), "{out:?}");

    let attempts = controller.detail_attempts(&l).await;
    assert_eq!(attempts.len(), 2);
    // five seconds of timeout plus the jittered wait
    assert_gaps_within(&attempts, Duration::from_secs(6), Duration::from_secs(8));
}
