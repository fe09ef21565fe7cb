use std::sync::Arc;
use std::time::Duration;

use casa::{CasaError, EnrichmentOutcome, SkipReason};
use casa_core::{EnergyLabel, ListingId};
use casa_mock::{DynamicMockConnector, L1, L2, MemorySink, MockBehavior, MockConnector};

use crate::helpers::{
    address_of, casa_with, casa_with_timeout, detail, id, one_year_history, transient,
};

#[tokio::test]
async fn estimate_no_match_yields_absent_estimate() {
    let (mock, controller) = DynamicMockConnector::new_with_controller("P0");
    let l = id(10);
    let d = detail(&l, "Harderwijkoever 16");
    let addr = address_of(&d);
    controller
        .set_detail_behavior(l.clone(), MockBehavior::Return(d))
        .await;
    controller
        .set_estimate_behavior(addr.clone(), MockBehavior::Return(None))
        .await;
    controller
        .set_history_behavior(addr, MockBehavior::Return(Some(one_year_history())))
        .await;
    let casa = casa_with(mock, &MemorySink::new());

    let out = casa.enrich(&l).await;
    let record = out.record().expect("success");
    assert!(record.estimate.is_none());
    assert_eq!(record.history.len(), 1);
}

#[tokio::test]
async fn not_found_from_lookups_degrades_instead_of_failing() {
    let (mock, controller) = DynamicMockConnector::new_with_controller("P0");
    let l = id(11);
    let d = detail(&l, "Harderwijkoever 16");
    let addr = address_of(&d);
    controller
        .set_detail_behavior(l.clone(), MockBehavior::Return(d))
        .await;
    controller
        .set_estimate_behavior(
            addr.clone(),
            MockBehavior::Fail(CasaError::not_found("autocomplete")),
        )
        .await;
    controller
        .set_history_behavior(addr, MockBehavior::Fail(CasaError::not_found("suggest")))
        .await;
    let casa = casa_with(mock, &MemorySink::new());

    let out = casa.enrich(&l).await;
    let record = out.record().expect("success");
    assert!(record.estimate.is_none());
    assert!(record.history.is_empty());
}

#[tokio::test]
async fn history_transport_failure_fails_listing_without_retry() {
    let (mock, controller) = DynamicMockConnector::new_with_controller("P0");
    let l = id(12);
    let d = detail(&l, "Harderwijkoever 16");
    let addr = address_of(&d);
    controller
        .set_detail_behavior(l.clone(), MockBehavior::Return(d))
        .await;
    controller
        .set_history_behavior(addr, MockBehavior::Fail(transient()))
        .await;
    let casa = casa_with(mock, &MemorySink::new());

    assert!(matches!(
        casa.enrich(&l).await,
        EnrichmentOutcome::Failed(CasaError::Transient { .. })
    ));
    let history_calls = controller
        .calls()
        .await
        .into_iter()
        .filter(|c| c.capability == "history")
        .count();
    assert_eq!(history_calls, 1);
}

#[tokio::test(start_paused = true)]
async fn lookups_are_issued_concurrently() {
    let (mock, controller) = DynamicMockConnector::new_with_controller("P0");
    let l = id(13);
    let d = detail(&l, "Harderwijkoever 16");
    let addr = address_of(&d);
    controller
        .set_detail_behavior(l.clone(), MockBehavior::Return(d))
        .await;
    controller
        .set_estimate_behavior(addr.clone(), MockBehavior::Hang)
        .await;
    controller
        .set_history_behavior(addr, MockBehavior::Return(Some(one_year_history())))
        .await;
    let casa = casa_with_timeout(mock, &MemorySink::new(), Duration::from_secs(10));

    assert!(matches!(
        casa.enrich(&l).await,
        EnrichmentOutcome::Failed(CasaError::ProviderTimeout { .. })
    ));
    let calls = controller.calls().await;
    let at = |cap: &str| calls.iter().find(|c| c.capability == cap).map(|c| c.at);
    assert!(at("history").is_some());
    assert_eq!(at("estimate"), at("history"));
}

#[tokio::test]
async fn missing_address_is_skipped() {
    let (mock, controller) = DynamicMockConnector::new_with_controller("P0");
    let l = id(14);
    let mut d = detail(&l, "Harderwijkoever 16");
    d.postal_code.clear();
    controller
        .set_detail_behavior(l.clone(), MockBehavior::Return(d))
        .await;
    let casa = casa_with(mock, &MemorySink::new());

    assert_eq!(
        casa.enrich(&l).await,
        EnrichmentOutcome::Skipped(SkipReason::AddressUnresolvable)
    );
    assert!(
        controller
            .calls()
            .await
            .iter()
            .all(|c| c.capability == "detail")
    );
}

#[tokio::test]
async fn energy_labels_are_reconciled() {
    let casa = casa_with(Arc::new(MockConnector::new()), &MemorySink::new());

    // coarse metadata tier accepts the specific badge
    let l1 = casa.enrich(&ListingId::new(L1)).await;
    assert_eq!(
        l1.record().expect("L1 enriches").detail.energy_label,
        EnergyLabel::A3Plus
    );

    // unexplained disagreement keeps the badge value
    let l2 = casa.enrich(&ListingId::new(L2)).await;
    assert_eq!(
        l2.record().expect("L2 enriches").detail.energy_label,
        EnergyLabel::C
    );
}

#[tokio::test]
async fn invalid_record_names_field_and_value() {
    let (mock, controller) = DynamicMockConnector::new_with_controller("P0");
    let l = id(15);
    let mut d = detail(&l, "Harderwijkoever 16");
    d.year_built = 1650;
    controller
        .set_detail_behavior(l.clone(), MockBehavior::Return(d))
        .await;
    let casa = casa_with(mock, &MemorySink::new());

    assert_eq!(
        casa.enrich(&l).await,
        EnrichmentOutcome::Failed(CasaError::Validation {
            field: "year_built".into(),
            value: "1650".into(),
        })
    );
}
