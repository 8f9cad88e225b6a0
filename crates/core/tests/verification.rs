mod common;

use assert_matches::assert_matches;

use common::{entry, entry_with_fine, setup};
use patrouille_core::catalog::CheckItemFilter;
use patrouille_core::error::CoreError;
use patrouille_core::lifecycle::SourceRecord;
use patrouille_core::store::VerificationStore;
use patrouille_core::verification::{SourceType, VerificationResult};

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

#[tokio::test]
async fn catalog_filter_includes_items_applicable_to_both() {
    let app = setup();
    let filter = CheckItemFilter {
        applicable_to: Some(SourceType::Control),
        ..Default::default()
    };
    let codes: Vec<_> = app
        .services
        .verifications
        .list_check_items(&filter)
        .await
        .unwrap()
        .into_iter()
        .map(|i| i.code)
        .collect();

    assert_eq!(codes, vec!["PERMIS_CONDUIRE", "ASSURANCE", "FEUX_AVANT"]);
}

// ---------------------------------------------------------------------------
// Batch save
// ---------------------------------------------------------------------------

#[tokio::test]
async fn batch_counts_results_and_sums_resolved_fines() {
    let app = setup();
    let controle_id = app.new_controle().await;

    let result = app
        .services
        .verifications
        .save_batch(
            SourceType::Control,
            controle_id,
            &[
                entry(app.permis.id, VerificationResult::Pass),
                entry(app.assurance.id, VerificationResult::Fail),
                entry_with_fine(app.feux.id, VerificationResult::Fail, 2000),
            ],
        )
        .await
        .unwrap();

    let counters = result.verifications.counters;
    assert_eq!(counters.total, 3);
    assert_eq!(counters.total_ok, 1);
    assert_eq!(counters.total_echec, 2);
    assert_eq!(counters.montant_total, 7000);
    assert_eq!(result.failed_count(), 0);

    let controle = app.services.lifecycle.get_controle(controle_id).await.unwrap();
    assert_eq!(controle.total_verifications, 3);
    assert_eq!(controle.verifications_ok, 1);
    assert_eq!(controle.verifications_echec, 2);
    assert_eq!(controle.montant_total_amendes, 7000);
}

#[tokio::test]
async fn batch_replaces_the_previous_set() {
    let app = setup();
    let controle_id = app.new_controle().await;
    let verifications = &app.services.verifications;

    verifications
        .save_batch(
            SourceType::Control,
            controle_id,
            &[
                entry(app.permis.id, VerificationResult::Fail),
                entry(app.assurance.id, VerificationResult::Fail),
            ],
        )
        .await
        .unwrap();
    let result = verifications
        .save_batch(
            SourceType::Control,
            controle_id,
            &[entry(app.feux.id, VerificationResult::Warning)],
        )
        .await
        .unwrap();

    let items: Vec<_> = result
        .verifications
        .verifications
        .iter()
        .map(|v| v.check_item.code.as_str())
        .collect();
    assert_eq!(items, vec!["FEUX_AVANT"]);
    assert_eq!(result.verifications.counters.total_attention, 1);
    assert_eq!(result.verifications.counters.montant_total, 0);
}

#[tokio::test]
async fn repeated_item_in_batch_keeps_one_option() {
    let app = setup();
    let controle_id = app.new_controle().await;

    let result = app
        .services
        .verifications
        .save_batch(
            SourceType::Control,
            controle_id,
            &[
                entry(app.assurance.id, VerificationResult::Fail),
                entry(app.assurance.id, VerificationResult::Pass),
            ],
        )
        .await
        .unwrap();

    let stored = app
        .store
        .list_check_options(SourceType::Control, controle_id)
        .await
        .unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].result, VerificationResult::Pass);
    assert_eq!(result.verifications.counters.total, 1);
}

#[tokio::test]
async fn failing_entries_are_reported_without_failing_the_batch() {
    let app = setup();
    let controle_id = app.new_controle().await;

    let result = app
        .services
        .verifications
        .save_batch(
            SourceType::Control,
            controle_id,
            &[
                entry(app.assurance.id, VerificationResult::Pass),
                entry(app.freinage.id, VerificationResult::Fail),
                entry(9999, VerificationResult::Fail),
                entry_with_fine(app.feux.id, VerificationResult::Fail, -5),
            ],
        )
        .await
        .unwrap();

    assert_eq!(result.failed_count(), 3);
    let failed: Vec<_> = result
        .outcomes
        .iter()
        .filter(|o| !o.ok)
        .map(|o| o.index)
        .collect();
    assert_eq!(failed, vec![1, 2, 3]);
    assert!(result.outcomes[2].error.as_deref().unwrap().contains("not found"));
    assert_eq!(result.verifications.counters.total, 1);
}

#[tokio::test]
async fn oversized_fine_is_reported_and_counters_stay_consistent() {
    let app = setup();
    let controle_id = app.new_controle().await;

    let result = app
        .services
        .verifications
        .save_batch(
            SourceType::Control,
            controle_id,
            &[
                entry_with_fine(app.assurance.id, VerificationResult::Fail, i64::MAX),
                entry_with_fine(app.feux.id, VerificationResult::Fail, 1),
            ],
        )
        .await
        .unwrap();

    assert_eq!(result.failed_count(), 1);
    assert!(!result.outcomes[0].ok);
    assert_eq!(result.verifications.counters.total, 1);
    assert_eq!(result.verifications.counters.montant_total, 1);

    let record = app
        .services
        .lifecycle
        .get_controle(controle_id)
        .await
        .unwrap();
    assert_eq!(record.total_verifications, 1);
    assert_eq!(record.montant_total_amendes, 1);
}

#[tokio::test]
async fn batch_for_unknown_source_writes_nothing() {
    let app = setup();

    let err = app
        .services
        .verifications
        .save_batch(
            SourceType::Inspection,
            4242,
            &[entry(app.assurance.id, VerificationResult::Pass)],
        )
        .await
        .unwrap_err();

    assert_matches!(err, CoreError::NotFound { entity: "Inspection", id: 4242 });
    let stored = app
        .store
        .list_check_options(SourceType::Inspection, 4242)
        .await
        .unwrap();
    assert!(stored.is_empty());
}

#[tokio::test]
async fn inspection_counts_warnings() {
    let app = setup();
    let created = app
        .services
        .lifecycle
        .create_inspection(common::inspection_request("XY-999-ZZ"))
        .await
        .unwrap();
    let inspection_id = created.record.id();

    app.services
        .verifications
        .save_batch(
            SourceType::Inspection,
            inspection_id,
            &[
                entry(app.freinage.id, VerificationResult::Warning),
                entry(app.feux.id, VerificationResult::NotChecked),
            ],
        )
        .await
        .unwrap();

    let inspection = app
        .services
        .lifecycle
        .get_inspection(inspection_id)
        .await
        .unwrap();
    assert_eq!(inspection.total_verifications, 2);
    assert_eq!(inspection.verifications_attention, 1);
    assert_eq!(inspection.verifications_ok, 0);
}

// ---------------------------------------------------------------------------
// Reads
// ---------------------------------------------------------------------------

#[tokio::test]
async fn read_back_is_in_checklist_order_with_items() {
    let app = setup();
    let controle_id = app.new_controle().await;
    app.services
        .verifications
        .save_batch(
            SourceType::Control,
            controle_id,
            &[
                entry(app.feux.id, VerificationResult::Pass),
                entry(app.permis.id, VerificationResult::Pass),
                entry(app.assurance.id, VerificationResult::NotChecked),
            ],
        )
        .await
        .unwrap();

    let list = app
        .services
        .verifications
        .get_by_source(SourceType::Control, controle_id)
        .await
        .unwrap();

    let codes: Vec<_> = list
        .verifications
        .iter()
        .map(|v| v.check_item.code.as_str())
        .collect();
    assert_eq!(codes, vec!["PERMIS_CONDUIRE", "ASSURANCE", "FEUX_AVANT"]);
    assert_eq!(list.counters.total_non_verifie, 1);
    let json = serde_json::to_value(&list).unwrap();
    assert_eq!(json["total_ok"], 2);
    assert_eq!(json["verifications"][0]["result"], "PASS");
}

#[tokio::test]
async fn refresh_counters_rewrites_the_cache() {
    let app = setup();
    let controle_id = app.new_controle().await;
    app.services
        .verifications
        .save_verification(
            SourceType::Control,
            controle_id,
            &entry(app.assurance.id, VerificationResult::Fail),
        )
        .await
        .unwrap();

    let before = app.services.lifecycle.get_controle(controle_id).await.unwrap();
    assert_eq!(before.total_verifications, 0);

    let record = app
        .services
        .verifications
        .refresh_counters(SourceType::Control, controle_id)
        .await
        .unwrap();
    assert_matches!(record, SourceRecord::Controle(c) if c.verifications_echec == 1 && c.montant_total_amendes == 5000);
}
