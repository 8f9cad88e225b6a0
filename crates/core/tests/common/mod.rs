//! Shared fixtures for service-level tests.

#![allow(dead_code)]

use std::sync::Arc;

use chrono::{TimeZone, Timelike};
use serde_json::json;

use patrouille_core::catalog::{Applicability, CheckCategory, CheckItem};
use patrouille_core::clock::FixedClock;
use patrouille_core::lifecycle::{CreateRequest, NewControle, NewInspection};
use patrouille_core::services::Services;
use patrouille_core::store::memory::MemoryStore;
use patrouille_core::types::{DbId, Timestamp};
use patrouille_core::verification::{VerificationEntry, VerificationResult};

pub struct TestApp {
    pub services: Services,
    pub store: Arc<MemoryStore>,
    pub clock: Arc<FixedClock>,
    pub assurance: CheckItem,
    pub permis: CheckItem,
    pub freinage: CheckItem,
    pub feux: CheckItem,
}

/// 2024-03-15 10:00:00.123456789 UTC.
pub fn test_now() -> Timestamp {
    chrono::Utc
        .with_ymd_and_hms(2024, 3, 15, 10, 0, 0)
        .unwrap()
        .with_nanosecond(123_456_789)
        .unwrap()
}

pub fn at(y: i32, m: u32, d: u32) -> Timestamp {
    chrono::Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
}

/// Services over an in-memory store with a small catalog:
/// ASSURANCE (both, 5000), PERMIS (control, 25000, 3 points),
/// FREINAGE (inspection, 30000), FEUX (both, 10000).
pub fn setup() -> TestApp {
    let clock = Arc::new(FixedClock::new(test_now()));
    let store = Arc::new(MemoryStore::new(clock.clone()));
    let assurance = store.add_check_item(
        "ASSURANCE",
        "Attestation d'assurance valide",
        CheckCategory::Document,
        Applicability::Both,
        5000,
        0,
        |item| item.display_order = 30,
    );
    let permis = store.add_check_item(
        "PERMIS_CONDUIRE",
        "Permis de conduire valide",
        CheckCategory::Document,
        Applicability::Control,
        25000,
        3,
        |item| item.display_order = 10,
    );
    let freinage = store.add_check_item(
        "FREINAGE",
        "Système de freinage",
        CheckCategory::Safety,
        Applicability::Inspection,
        30000,
        0,
        |item| item.display_order = 80,
    );
    let feux = store.add_check_item(
        "FEUX_AVANT",
        "Feux avant fonctionnels",
        CheckCategory::Lighting,
        Applicability::Both,
        10000,
        0,
        |item| item.display_order = 120,
    );
    let services = Services::new(store.clone(), clock.clone(), 45);
    TestApp {
        services,
        store,
        clock,
        assurance,
        permis,
        freinage,
        feux,
    }
}

pub fn entry(check_item_id: DbId, result: VerificationResult) -> VerificationEntry {
    VerificationEntry {
        check_item_id,
        result,
        notes: None,
        fine_override: None,
        evidence_file_id: None,
    }
}

pub fn entry_with_fine(
    check_item_id: DbId,
    result: VerificationResult,
    fine: i64,
) -> VerificationEntry {
    VerificationEntry {
        fine_override: Some(fine),
        ..entry(check_item_id, result)
    }
}

pub fn controle_request(immatriculation: &str) -> CreateRequest<NewControle> {
    serde_json::from_value(json!({
        "commissariat_id": 1,
        "agent_id": 7,
        "lieu": "Carrefour Ancienne Mairie",
        "vehicule_immatriculation": immatriculation,
        "vehicule_marque": "Toyota",
        "conducteur_nom": "Diallo",
    }))
    .unwrap()
}

pub fn inspection_request(immatriculation: &str) -> CreateRequest<NewInspection> {
    serde_json::from_value(json!({
        "commissariat_id": 1,
        "inspecteur_id": 9,
        "vehicule_immatriculation": immatriculation,
    }))
    .unwrap()
}

impl TestApp {
    /// Each helper-created record moves the clock one second so default
    /// references stay unique.
    pub async fn new_controle(&self) -> DbId {
        self.clock.advance(chrono::Duration::seconds(1));
        self.services
            .lifecycle
            .create_controle(controle_request("AB-123-CD"))
            .await
            .unwrap()
            .record
            .id()
    }

    pub async fn new_controle_on(&self, commissariat_id: DbId, date: Timestamp) -> DbId {
        let mut request = controle_request("AB-123-CD");
        request.record.commissariat_id = Some(commissariat_id);
        request.record.date_controle = Some(date);
        self.clock.advance(chrono::Duration::seconds(1));
        self.services
            .lifecycle
            .create_controle(request)
            .await
            .unwrap()
            .record
            .id()
    }
}
