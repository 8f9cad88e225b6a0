mod common;

use assert_matches::assert_matches;

use common::{entry, setup, TestApp};
use patrouille_core::clock::Clock;
use patrouille_core::error::CoreError;
use patrouille_core::pv::{numero_pv, NewProcesVerbal, PvStatus, RecordInfraction};
use patrouille_core::store::{InfractionStore, VerificationStore};
use patrouille_core::types::DbId;
use patrouille_core::verification::{SourceType, VerificationResult};

async fn infraction(app: &TestApp, controle_id: DbId, libelle: &str, montant: i64) -> DbId {
    app.services
        .pv
        .record_infraction(
            controle_id,
            RecordInfraction {
                libelle: Some(libelle.to_string()),
                montant_amende: Some(montant),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .id
}

// ---------------------------------------------------------------------------
// Infractions
// ---------------------------------------------------------------------------

#[tokio::test]
async fn infraction_from_failed_verification_takes_its_defaults() {
    let app = setup();
    let controle_id = app.new_controle().await;
    app.services
        .verifications
        .save_batch(
            SourceType::Control,
            controle_id,
            &[entry(app.permis.id, VerificationResult::Fail)],
        )
        .await
        .unwrap();
    let option = app
        .store
        .list_check_options(SourceType::Control, controle_id)
        .await
        .unwrap()
        .remove(0);

    let infraction = app
        .services
        .pv
        .record_infraction(
            controle_id,
            RecordInfraction {
                check_option_id: Some(option.id),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(infraction.libelle, "Permis de conduire valide");
    assert_eq!(infraction.montant_amende, 25000);
    assert_eq!(infraction.points_retires, 3);
    let linked = app.store.find_check_option(option.id).await.unwrap().unwrap();
    assert_eq!(linked.infraction_id, Some(infraction.id));

    let again = app
        .services
        .pv
        .record_infraction(
            controle_id,
            RecordInfraction {
                check_option_id: Some(option.id),
                ..Default::default()
            },
        )
        .await;
    assert_matches!(again, Err(CoreError::Conflict(_)));
}

#[tokio::test]
async fn passed_verification_cannot_raise_an_infraction() {
    let app = setup();
    let controle_id = app.new_controle().await;
    let option = app
        .services
        .verifications
        .save_verification(
            SourceType::Control,
            controle_id,
            &entry(app.assurance.id, VerificationResult::Pass),
        )
        .await
        .unwrap();

    let err = app
        .services
        .pv
        .record_infraction(
            controle_id,
            RecordInfraction {
                check_option_id: Some(option.id),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert_matches!(err, CoreError::Validation(msg) if msg.contains("PASS"));
}

#[tokio::test]
async fn resaving_verifications_unlinks_their_infractions() {
    let app = setup();
    let controle_id = app.new_controle().await;
    let failing = [entry(app.permis.id, VerificationResult::Fail)];
    app.services
        .verifications
        .save_batch(SourceType::Control, controle_id, &failing)
        .await
        .unwrap();
    let option = app
        .store
        .list_check_options(SourceType::Control, controle_id)
        .await
        .unwrap()
        .remove(0);
    let infraction = app
        .services
        .pv
        .record_infraction(
            controle_id,
            RecordInfraction {
                check_option_id: Some(option.id),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    app.services
        .verifications
        .save_batch(SourceType::Control, controle_id, &failing)
        .await
        .unwrap();

    let kept = app.store.find_infraction(infraction.id).await.unwrap().unwrap();
    assert_eq!(kept.check_option_id, None);
    assert_eq!(kept.montant_amende, 25000);
}

#[tokio::test]
async fn manual_infraction_needs_label_and_amount() {
    let app = setup();
    let controle_id = app.new_controle().await;
    let err = app
        .services
        .pv
        .record_infraction(
            controle_id,
            RecordInfraction {
                libelle: Some("Excès de vitesse".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert_matches!(err, CoreError::Validation(msg) if msg.contains("montant_amende"));
}

#[tokio::test]
async fn oversized_manual_fine_is_rejected() {
    let app = setup();
    let controle_id = app.new_controle().await;
    let err = app
        .services
        .pv
        .record_infraction(
            controle_id,
            RecordInfraction {
                libelle: Some("Excès de vitesse".to_string()),
                montant_amende: Some(i64::MAX),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert_matches!(err, CoreError::Validation(msg) if msg.contains("montant_amende"));

    let listed = app.services.pv.list_infractions(controle_id).await.unwrap();
    assert!(listed.is_empty());
}

// ---------------------------------------------------------------------------
// PV generation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn pv_leaves_out_infractions_already_in_a_pv() {
    let app = setup();
    let controle_id = app.new_controle().await;
    let a = infraction(&app, controle_id, "A", 3000).await;
    let b = infraction(&app, controle_id, "B", 2000).await;
    let first = app.services.pv.generate_pv(controle_id, &[b]).await.unwrap();

    let pv = app
        .services
        .pv
        .generate_pv(controle_id, &[a, b])
        .await
        .unwrap();

    assert_eq!(pv.infraction_ids, vec![a]);
    assert_eq!(pv.pv.montant_total, 3000);
    let b_row = app.store.find_infraction(b).await.unwrap().unwrap();
    assert_eq!(b_row.pv_id, Some(first.pv.id));
}

#[tokio::test]
async fn pv_fields_follow_the_clock() {
    let app = setup();
    let controle_id = app.new_controle().await;
    let a = infraction(&app, controle_id, "A", 3000).await;
    let now = app.services.pv.generate_pv(controle_id, &[a]).await.map(|s| s.pv).unwrap();

    assert!(now.numero_pv.starts_with("PV20240315"));
    assert_eq!(now.numero_pv.len(), 16);
    assert_eq!(now.statut, PvStatus::Emis);
    assert_eq!(
        now.date_limite_paiement - now.date_emission,
        chrono::Duration::days(45)
    );
}

#[tokio::test]
async fn empty_or_invalid_selection_creates_no_pv() {
    let app = setup();
    let controle_id = app.new_controle().await;
    let other_controle = app.new_controle().await;
    let foreign = infraction(&app, other_controle, "Autre", 1000).await;

    assert_matches!(
        app.services.pv.generate_pv(controle_id, &[]).await,
        Err(CoreError::NoValidInfractions)
    );
    assert_matches!(
        app.services.pv.generate_pv(controle_id, &[foreign, 123456]).await,
        Err(CoreError::NoValidInfractions)
    );
    let foreign_row = app.store.find_infraction(foreign).await.unwrap().unwrap();
    assert_eq!(foreign_row.pv_id, None);
}

#[tokio::test]
async fn pv_for_unknown_controle_is_not_found() {
    let app = setup();
    assert_matches!(
        app.services.pv.generate_pv(999, &[1]).await,
        Err(CoreError::NotFound { entity: "Controle", id: 999 })
    );
}

#[tokio::test]
async fn colliding_pv_number_is_retried() {
    let app = setup();
    let controle_id = app.new_controle().await;
    let a = infraction(&app, controle_id, "A", 3000).await;
    let now = app.clock.now();
    app.store
        .create_pv(&NewProcesVerbal {
            numero_pv: numero_pv(now, 0),
            controle_id,
            montant_total: 0,
            date_emission: now,
            date_limite_paiement: now,
            infraction_ids: vec![],
        })
        .await
        .unwrap();

    let summary = app.services.pv.generate_pv(controle_id, &[a]).await.unwrap();
    assert_eq!(summary.pv.numero_pv, numero_pv(now, 1));
}

#[tokio::test]
async fn overlapping_generations_attach_each_infraction_once() {
    let app = setup();
    let controle_id = app.new_controle().await;
    let a = infraction(&app, controle_id, "A", 3000).await;

    let pv = &app.services.pv;
    let ids = [a];
    let (left, right) = tokio::join!(
        pv.generate_pv(controle_id, &ids),
        pv.generate_pv(controle_id, &ids)
    );

    let successes = [&left, &right].iter().filter(|r| r.is_ok()).count();
    assert_eq!(successes, 1);
    let loser = if left.is_ok() { right } else { left };
    assert_matches!(loser, Err(CoreError::NoValidInfractions | CoreError::Conflict(_)));
}

#[tokio::test]
async fn pv_read_back_lists_attached_infractions() {
    let app = setup();
    let controle_id = app.new_controle().await;
    let a = infraction(&app, controle_id, "A", 3000).await;
    let b = infraction(&app, controle_id, "B", 1500).await;
    let created = app
        .services
        .pv
        .generate_pv(controle_id, &[a, b, a])
        .await
        .unwrap();

    let read = app.services.pv.get_pv(created.pv.id).await.unwrap();
    assert_eq!(read.infraction_ids, vec![a, b]);
    assert_eq!(read.nombre_infractions, 2);
    assert_eq!(read.pv.montant_total, 4500);
}
