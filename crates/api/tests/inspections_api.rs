//! HTTP-level integration tests for the `/inspections` and `/pvs`
//! statistics endpoints.

mod common;

use axum::http::StatusCode;
use common::{body_json, build_test_app, TestApp};
use serde_json::{json, Value};

async fn create_inspection(app: &TestApp) -> Value {
    app.clock.advance(chrono::Duration::seconds(1));
    let response = app
        .post_json(
            "/api/v1/inspections",
            json!({
                "commissariat_id": 2,
                "inspecteur_id": 9,
                "vehicule_immatriculation": "XY-987-ZT",
                "vehicule_type": "Camion",
            }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["data"]["record"].clone()
}

#[tokio::test]
async fn test_inspection_starts_waiting() {
    let app = build_test_app();
    let record = create_inspection(&app).await;

    assert_eq!(record["statut"], "EN_ATTENTE");
    assert!(record["reference"].as_str().unwrap().starts_with("INS-20240315-"));
    assert_eq!(record["verifications_attention"], 0);
}

#[tokio::test]
async fn test_batch_rejects_control_only_items_but_succeeds() {
    let app = build_test_app();
    let id = create_inspection(&app).await["id"].as_i64().unwrap();

    let body = json!({
        "verifications": [
            { "check_item_id": app.item_id("FREINAGE").await, "resultat": "FAIL" },
            { "check_item_id": app.item_id("PERMIS_CONDUIRE").await, "resultat": "PASS" },
            { "check_item_id": app.item_id("PNEUMATIQUES").await, "resultat": "WARNING" },
            { "check_item_id": app.item_id("EXTINCTEUR").await, "resultat": "NOT_CHECKED" },
        ]
    });
    let response = app
        .post_json(&format!("/api/v1/inspections/{id}/verifications"), body)
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let data = body_json(response).await["data"].clone();
    assert_eq!(data["total"], 3);
    assert_eq!(data["total_echec"], 1);
    assert_eq!(data["total_attention"], 1);
    assert_eq!(data["total_non_verifie"], 1);
    assert_eq!(data["montant_total"], 30000);

    let failed: Vec<i64> = data["outcomes"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|o| o["ok"] == false)
        .map(|o| o["index"].as_i64().unwrap())
        .collect();
    assert_eq!(failed, vec![1]);

    let record = body_json(app.get(&format!("/api/v1/inspections/{id}")).await).await;
    assert_eq!(record["data"]["verifications_attention"], 1);
    assert_eq!(record["data"]["montant_total_amendes"], 30000);
}

#[tokio::test]
async fn test_inspection_status_flow() {
    let app = build_test_app();
    let id = create_inspection(&app).await["id"].as_i64().unwrap();
    let uri = format!("/api/v1/inspections/{id}/statut");

    for statut in ["EN_COURS", "TERMINE", "CONFORME"] {
        let response = app.patch_json(&uri, json!({ "statut": statut })).await;
        assert_eq!(response.status(), StatusCode::OK, "moving to {statut}");
    }

    let response = app.patch_json(&uri, json!({ "statut": "NON_CONFORME" })).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app.patch_json(&uri, json!({ "statut": "FOO" })).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_inspection_statistics_without_period() {
    let app = build_test_app();
    create_inspection(&app).await;
    create_inspection(&app).await;

    let response = app.get("/api/v1/inspections/statistiques?commissariat_id=2").await;
    assert_eq!(response.status(), StatusCode::OK);

    let stats = body_json(response).await["data"].clone();
    assert_eq!(stats["total"], 2);
    assert_eq!(stats["en_attente"], 2);
    assert_eq!(stats["taux_conformite"], 0.0);
    assert_eq!(stats["evolution_total"], "0");
    assert!(stats.get("periode_precedente").is_none());
}

#[tokio::test]
async fn test_pv_statistics_on_empty_store() {
    let app = build_test_app();
    let response = app.get("/api/v1/pvs/statistiques").await;
    assert_eq!(response.status(), StatusCode::OK);

    let stats = body_json(response).await["data"].clone();
    assert_eq!(stats["total"], 0);
    assert_eq!(stats["montant_total"], 0);
    assert_eq!(stats["taux_paiement"], 0.0);
}
