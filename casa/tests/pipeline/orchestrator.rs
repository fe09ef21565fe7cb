use std::sync::Arc;

use casa::{Casa, CasaError};
use casa_core::ListingId;
use casa_mock::{DynamicMockConnector, L1, L2, MemorySink, MockBehavior, MockConnector};
use rust_decimal::Decimal;

use crate::helpers::{almere_filter, casa_with, detail, id, init_tracing};

#[tokio::test]
async fn almere_scenario_enriches_and_persists_both_listings() {
    init_tracing();
    let sink = MemorySink::new();
    let casa = casa_with(Arc::new(MockConnector::new()), &sink);

    let summary = casa.run(&[almere_filter()]).await;
    assert_eq!(summary.succeeded, 2);
    assert_eq!(summary.skipped, 0);
    assert_eq!(summary.failed, 0);

    let l1 = sink.get(&ListingId::new(L1)).await.expect("L1 persisted");
    assert_eq!(l1.detail.asking_price, Decimal::from(350_000));
    assert_eq!(l1.detail.area_to_live, 90);
    assert!(l1.estimate.is_none());
    assert_eq!(l1.history.len(), 1);
    assert_eq!(l1.history.entries[0].year, 2023);
    assert_eq!(l1.history.entries[0].value, Decimal::from(340_000));

    let l2 = sink.get(&ListingId::new(L2)).await.expect("L2 persisted");
    assert!(l2.estimate.is_some());
}

#[tokio::test]
async fn validation_failure_does_not_affect_sibling() {
    init_tracing();
    let (mock, controller) = DynamicMockConnector::new_with_controller("P0");
    let (a, b) = (id(1), id(2));
    let mut bad = detail(&a, "Harderwijkoever 16");
    bad.asking_price = Decimal::ZERO;
    controller
        .set_detail_behavior(a.clone(), MockBehavior::Return(bad))
        .await;
    controller
        .set_detail_behavior(b.clone(), MockBehavior::Return(detail(&b, "Kruidenweg 8")))
        .await;
    let sink = MemorySink::new();
    let casa = casa_with(mock, &sink);

    let summary = casa.run_listings([a.clone(), b.clone()]).await;
    assert_eq!((summary.succeeded, summary.skipped, summary.failed), (1, 0, 1));
    assert_eq!(summary.total(), 2);
    assert_eq!(
        summary.failures,
        vec![(
            a.clone(),
            CasaError::Validation {
                field: "asking_price".into(),
                value: "0".into(),
            }
        )]
    );
    assert!(sink.get(&a).await.is_none());
    assert!(sink.get(&b).await.is_some());
}

#[tokio::test]
async fn sink_rejection_is_counted_and_others_are_written() {
    let sink = MemorySink::new();
    sink.fail_on(ListingId::new(L1)).await;
    let casa = casa_with(Arc::new(MockConnector::new()), &sink);

    let summary = casa.run(&[almere_filter()]).await;
    assert_eq!((summary.succeeded, summary.failed), (1, 1));
    assert!(matches!(
        summary.failures[0],
        (ref id, CasaError::Persistence { .. }) if id.as_str() == L1
    ));
    assert!(sink.get(&ListingId::new(L2)).await.is_some());
}

#[tokio::test]
async fn panicking_pipeline_is_counted_as_failed() {
    let (mock, controller) = DynamicMockConnector::new_with_controller("P0");
    let (a, b) = (id(1), id(2));
    controller
        .set_detail_behavior(a.clone(), MockBehavior::Panic)
        .await;
    controller
        .set_detail_behavior(b.clone(), MockBehavior::Return(detail(&b, "Kruidenweg 8")))
        .await;
    let sink = MemorySink::new();
    let casa = casa_with(mock, &sink);

    let summary = casa.run_listings([a.clone(), b.clone()]).await;
    assert_eq!((summary.succeeded, summary.failed), (1, 1));
    assert_eq!(summary.failures[0].0, a);
    assert!(matches!(summary.failures[0].1, CasaError::Other(_)));
    assert!(sink.get(&b).await.is_some());
}

#[tokio::test]
async fn removed_and_broken_listings_are_tallied() {
    let sink = MemorySink::new();
    let casa = casa_with(Arc::new(MockConnector::new()), &sink);

    let summary = casa
        .run_listings([
            ListingId::new(L1),
            ListingId::new("https://catalog.test/GONE/1"),
            ListingId::new("https://catalog.test/FAIL/2"),
        ])
        .await;
    assert_eq!(
        (summary.succeeded, summary.skipped, summary.failed),
        (1, 1, 1)
    );
    assert_eq!(sink.len().await, 1);
}

#[tokio::test]
async fn rerunning_is_idempotent() {
    let sink = MemorySink::new();
    let casa = casa_with(Arc::new(MockConnector::new()), &sink);

    let first = casa.run(&[almere_filter()]).await;
    let second = casa.run(&[almere_filter()]).await;
    assert_eq!(first.succeeded, 2);
    assert_eq!(second.succeeded, 2);
    assert_eq!(sink.len().await, 2);
    assert_eq!(sink.upsert_calls(), 4);
    // second pass finds identical content
    assert_eq!(sink.write_count(), 2);
}

#[tokio::test]
async fn capped_concurrency_still_completes_every_listing() {
    let sink = MemorySink::new();
    let casa = Casa::builder()
        .with_connector(Arc::new(MockConnector::new()))
        .with_sink(Arc::new(sink.clone()))
        .max_concurrency(1)
        .build()
        .unwrap();

    let summary = casa.run(&[almere_filter()]).await;
    assert_eq!(summary.succeeded, 2);
    assert_eq!(sink.len().await, 2);
}

#[tokio::test]
async fn empty_worklist_yields_empty_summary() {
    let casa = casa_with(Arc::new(MockConnector::new()), &MemorySink::new());
    let summary = casa.run(&[]).await;
    assert_eq!(summary.total(), 0);
    assert!(summary.failures.is_empty());
}
