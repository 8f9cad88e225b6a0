//! In-process [`Store`] backed by ordered maps behind a mutex.
//!
//! Mirrors the PostgreSQL schema's constraints that the services rely on:
//! one verification per (source, item), unique PV numbers, and guarded PV
//! attachment.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;

use super::{
    CatalogStore, InfractionStore, SourceStore, StatsStore, Store, StoreResult, VerificationStore,
};
use crate::catalog::{sort_check_items, Applicability, CheckCategory, CheckItem, CheckItemFilter};
use crate::clock::Clock;
use crate::error::CoreError;
use crate::lifecycle::{
    Controle, ControleRow, Inspection, InspectionRow, SourceRecord, SourceStateUpdate,
};
use crate::pv::{
    Infraction, NewInfraction, NewProcesVerbal, ProcesVerbal, PvStatus, PV_NUMBER_CONSTRAINT,
};
use crate::statistics::{StatsFilter, StatsKind, Tally};
use crate::types::{Amount, DbId};
use crate::verification::{CheckOption, NewCheckOption, SourceType};

/// Standard checklist, identical to the rows seeded by the SQL migrations.
///
/// `(code, name, category, applicable_to, mandatory, display_order,
/// default_fine, default_points)`
pub const STANDARD_CATALOG: &[(
    &str,
    &str,
    CheckCategory,
    Applicability,
    bool,
    i32,
    Amount,
    i32,
)] = &[
    ("PERMIS_CONDUIRE", "Permis de conduire valide", CheckCategory::Document, Applicability::Control, true, 10, 25000, 3),
    ("CARTE_GRISE", "Carte grise présentée", CheckCategory::Document, Applicability::Both, true, 20, 15000, 0),
    ("ASSURANCE", "Attestation d'assurance valide", CheckCategory::Document, Applicability::Both, true, 30, 50000, 0),
    ("VISITE_TECHNIQUE", "Visite technique à jour", CheckCategory::Document, Applicability::Both, true, 40, 20000, 0),
    ("PLAQUES", "Plaques d'immatriculation conformes", CheckCategory::Identification, Applicability::Both, true, 50, 10000, 0),
    ("CEINTURE", "Port de la ceinture de sécurité", CheckCategory::Safety, Applicability::Control, false, 60, 10000, 2),
    ("CASQUE", "Port du casque (deux-roues)", CheckCategory::Safety, Applicability::Control, false, 70, 10000, 2),
    ("FREINAGE", "Système de freinage", CheckCategory::Safety, Applicability::Inspection, true, 80, 30000, 0),
    ("PNEUMATIQUES", "État des pneumatiques", CheckCategory::Equipment, Applicability::Both, true, 90, 15000, 0),
    ("EXTINCTEUR", "Extincteur présent", CheckCategory::Equipment, Applicability::Both, false, 100, 5000, 0),
    ("TRIANGLE", "Triangle de signalisation", CheckCategory::Equipment, Applicability::Both, false, 110, 5000, 0),
    ("FEUX_AVANT", "Feux avant fonctionnels", CheckCategory::Lighting, Applicability::Both, true, 120, 10000, 0),
    ("FEUX_ARRIERE", "Feux arrière et stop", CheckCategory::Lighting, Applicability::Both, true, 130, 10000, 0),
    ("CLIGNOTANTS", "Clignotants", CheckCategory::Lighting, Applicability::Inspection, false, 140, 5000, 0),
    ("PARE_BRISE", "Pare-brise intact", CheckCategory::Visibility, Applicability::Both, false, 150, 10000, 0),
    ("RETROVISEURS", "Rétroviseurs", CheckCategory::Visibility, Applicability::Both, false, 160, 5000, 0),
    ("VITRES_TEINTEES", "Vitres teintées non autorisées", CheckCategory::Visibility, Applicability::Control, false, 170, 25000, 0),
    ("EMISSIONS", "Émissions polluantes", CheckCategory::Environment, Applicability::Inspection, false, 180, 20000, 0),
];

#[derive(Default)]
struct Tables {
    last_id: DbId,
    check_items: BTreeMap<DbId, CheckItem>,
    check_options: BTreeMap<DbId, CheckOption>,
    controles: BTreeMap<DbId, Controle>,
    inspections: BTreeMap<DbId, Inspection>,
    infractions: BTreeMap<DbId, Infraction>,
    pvs: BTreeMap<DbId, ProcesVerbal>,
}

impl Tables {
    fn next_id(&mut self) -> DbId {
        self.last_id += 1;
        self.last_id
    }

    fn source(&self, source_type: SourceType, id: DbId) -> Option<SourceRecord> {
        match source_type {
            SourceType::Control => self.controles.get(&id).cloned().map(SourceRecord::Controle),
            SourceType::Inspection => self
                .inspections
                .get(&id)
                .cloned()
                .map(SourceRecord::Inspection),
        }
    }
}

/// Thread-safe in-memory store.
pub struct MemoryStore {
    tables: Mutex<Tables>,
    clock: Arc<dyn Clock>,
}

impl MemoryStore {
    /// An empty store (no catalog).
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            tables: Mutex::new(Tables::default()),
            clock,
        }
    }

    /// A store seeded with [`STANDARD_CATALOG`].
    pub fn with_standard_catalog(clock: Arc<dyn Clock>) -> Self {
        let store = Self::new(clock);
        for &(code, name, category, applicable_to, mandatory, order, fine, points) in
            STANDARD_CATALOG
        {
            store.add_check_item(code, name, category, applicable_to, fine, points, |item| {
                item.mandatory = mandatory;
                item.display_order = order;
            });
        }
        store
    }

    /// Insert a catalog item; `customize` may adjust the remaining fields.
    #[allow(clippy::too_many_arguments)]
    pub fn add_check_item(
        &self,
        code: &str,
        name: &str,
        category: CheckCategory,
        applicable_to: Applicability,
        default_fine: Amount,
        default_points: i32,
        customize: impl FnOnce(&mut CheckItem),
    ) -> CheckItem {
        let now = self.clock.now();
        let mut tables = self.lock();
        let id = tables.next_id();
        let mut item = CheckItem {
            id,
            code: code.to_string(),
            name: name.to_string(),
            description: None,
            category,
            applicable_to,
            mandatory: false,
            active: true,
            display_order: 0,
            default_fine,
            default_points,
            created_at: now,
            updated_at: now,
        };
        customize(&mut item);
        tables.check_items.insert(id, item.clone());
        item
    }

    fn lock(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl CatalogStore for MemoryStore {
    async fn list_check_items(&self, filter: &CheckItemFilter) -> StoreResult<Vec<CheckItem>> {
        let mut items: Vec<_> = self
            .lock()
            .check_items
            .values()
            .filter(|item| filter.matches(item))
            .cloned()
            .collect();
        sort_check_items(&mut items);
        Ok(items)
    }

    async fn find_check_item(&self, id: DbId) -> StoreResult<Option<CheckItem>> {
        Ok(self.lock().check_items.get(&id).cloned())
    }

    async fn find_check_item_by_code(&self, code: &str) -> StoreResult<Option<CheckItem>> {
        Ok(self
            .lock()
            .check_items
            .values()
            .find(|item| item.code == code)
            .cloned())
    }
}

#[async_trait]
impl VerificationStore for MemoryStore {
    async fn upsert_check_option(&self, input: &NewCheckOption) -> StoreResult<CheckOption> {
        let now = self.clock.now();
        let mut tables = self.lock();

        let existing = tables
            .check_options
            .values()
            .find(|o| {
                o.source_type == input.source_type
                    && o.source_id == input.source_id
                    && o.check_item_id == input.check_item_id
            })
            .map(|o| (o.id, o.created_at));

        let (id, created_at) = match existing {
            Some(found) => found,
            None => (tables.next_id(), now),
        };
        let option = CheckOption {
            id,
            source_type: input.source_type,
            source_id: input.source_id,
            check_item_id: input.check_item_id,
            result: input.result,
            notes: input.notes.clone(),
            fine_amount: input.fine_amount,
            checked_at: input.checked_at,
            evidence_file_id: input.evidence_file_id,
            infraction_id: None,
            created_at,
            updated_at: now,
        };
        tables.check_options.insert(id, option.clone());
        Ok(option)
    }

    async fn delete_check_options(
        &self,
        source_type: SourceType,
        source_id: DbId,
    ) -> StoreResult<u64> {
        let mut tables = self.lock();
        let removed: Vec<DbId> = tables
            .check_options
            .values()
            .filter(|o| o.source_type == source_type && o.source_id == source_id)
            .map(|o| o.id)
            .collect();
        for id in &removed {
            tables.check_options.remove(id);
        }
        // ON DELETE SET NULL on infractions.check_option_id.
        for infraction in tables.infractions.values_mut() {
            if infraction
                .check_option_id
                .is_some_and(|id| removed.contains(&id))
            {
                infraction.check_option_id = None;
            }
        }
        Ok(removed.len() as u64)
    }

    async fn list_check_options(
        &self,
        source_type: SourceType,
        source_id: DbId,
    ) -> StoreResult<Vec<CheckOption>> {
        Ok(self
            .lock()
            .check_options
            .values()
            .filter(|o| o.source_type == source_type && o.source_id == source_id)
            .cloned()
            .collect())
    }

    async fn find_check_option(&self, id: DbId) -> StoreResult<Option<CheckOption>> {
        Ok(self.lock().check_options.get(&id).cloned())
    }

    async fn link_infraction(&self, check_option_id: DbId, infraction_id: DbId) -> StoreResult<bool> {
        let now = self.clock.now();
        let mut tables = self.lock();
        match tables.check_options.get_mut(&check_option_id) {
            Some(option) if option.infraction_id.is_none() => {
                option.infraction_id = Some(infraction_id);
                option.updated_at = now;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[async_trait]
impl SourceStore for MemoryStore {
    async fn create_controle(&self, row: &ControleRow) -> StoreResult<Controle> {
        let now = self.clock.now();
        let mut tables = self.lock();
        if tables.controles.values().any(|c| c.reference == row.reference) {
            return Err(CoreError::Conflict(format!(
                "Duplicate value violates unique constraint: uq_controles_reference ({})",
                row.reference
            )));
        }
        let id = tables.next_id();
        let input = &row.input;
        let controle = Controle {
            id,
            reference: row.reference.clone(),
            commissariat_id: input.commissariat_id,
            agent_id: input.agent_id,
            date_controle: row.date_controle,
            lieu: input.lieu.clone(),
            vehicule: input.vehicule.clone(),
            conducteur: input.conducteur.clone(),
            statut: row.statut,
            observations: input.observations.clone(),
            total_verifications: 0,
            verifications_ok: 0,
            verifications_echec: 0,
            montant_total_amendes: 0,
            created_at: now,
            updated_at: now,
        };
        tables.controles.insert(id, controle.clone());
        Ok(controle)
    }

    async fn create_inspection(&self, row: &InspectionRow) -> StoreResult<Inspection> {
        let now = self.clock.now();
        let mut tables = self.lock();
        if tables.inspections.values().any(|i| i.reference == row.reference) {
            return Err(CoreError::Conflict(format!(
                "Duplicate value violates unique constraint: uq_inspections_reference ({})",
                row.reference
            )));
        }
        let id = tables.next_id();
        let input = &row.input;
        let inspection = Inspection {
            id,
            reference: row.reference.clone(),
            commissariat_id: input.commissariat_id,
            inspecteur_id: input.inspecteur_id,
            date_inspection: row.date_inspection,
            lieu: input.lieu.clone(),
            vehicule: input.vehicule.clone(),
            conducteur: input.conducteur.clone(),
            statut: row.statut,
            observations: input.observations.clone(),
            total_verifications: 0,
            verifications_ok: 0,
            verifications_echec: 0,
            verifications_attention: 0,
            montant_total_amendes: 0,
            created_at: now,
            updated_at: now,
        };
        tables.inspections.insert(id, inspection.clone());
        Ok(inspection)
    }

    async fn find_source(
        &self,
        source_type: SourceType,
        id: DbId,
    ) -> StoreResult<Option<SourceRecord>> {
        Ok(self.lock().source(source_type, id))
    }

    async fn update_source(
        &self,
        source_type: SourceType,
        id: DbId,
        update: &SourceStateUpdate,
    ) -> StoreResult<Option<SourceRecord>> {
        let now = self.clock.now();
        let mut tables = self.lock();
        match source_type {
            SourceType::Control => {
                let Some(c) = tables.controles.get_mut(&id) else {
                    return Ok(None);
                };
                if let Some(statut) = update.statut {
                    c.statut = statut;
                }
                if let Some(counters) = update.counters {
                    c.total_verifications = counters.total_verifications;
                    c.verifications_ok = counters.verifications_ok;
                    c.verifications_echec = counters.verifications_echec;
                    c.montant_total_amendes = counters.montant_total_amendes;
                }
                if let Some(observations) = &update.observations {
                    c.observations = Some(observations.clone());
                }
                c.updated_at = now;
            }
            SourceType::Inspection => {
                let Some(i) = tables.inspections.get_mut(&id) else {
                    return Ok(None);
                };
                if let Some(statut) = update.statut {
                    i.statut = statut;
                }
                if let Some(counters) = update.counters {
                    i.total_verifications = counters.total_verifications;
                    i.verifications_ok = counters.verifications_ok;
                    i.verifications_echec = counters.verifications_echec;
                    i.verifications_attention = counters.verifications_attention.unwrap_or(0);
                    i.montant_total_amendes = counters.montant_total_amendes;
                }
                if let Some(observations) = &update.observations {
                    i.observations = Some(observations.clone());
                }
                i.updated_at = now;
            }
        }
        Ok(tables.source(source_type, id))
    }
}

#[async_trait]
impl InfractionStore for MemoryStore {
    async fn create_infraction(&self, input: &NewInfraction) -> StoreResult<Infraction> {
        let now = self.clock.now();
        let mut tables = self.lock();
        if !tables.controles.contains_key(&input.controle_id) {
            return Err(CoreError::not_found("Controle", input.controle_id));
        }
        let id = tables.next_id();
        let infraction = Infraction {
            id,
            controle_id: input.controle_id,
            check_option_id: input.check_option_id,
            libelle: input.libelle.clone(),
            montant_amende: input.montant_amende,
            points_retires: input.points_retires,
            pv_id: None,
            date_infraction: input.date_infraction,
            created_at: now,
            updated_at: now,
        };
        tables.infractions.insert(id, infraction.clone());
        Ok(infraction)
    }

    async fn find_infraction(&self, id: DbId) -> StoreResult<Option<Infraction>> {
        Ok(self.lock().infractions.get(&id).cloned())
    }

    async fn list_infractions(&self, controle_id: DbId) -> StoreResult<Vec<Infraction>> {
        Ok(self
            .lock()
            .infractions
            .values()
            .filter(|i| i.controle_id == controle_id)
            .cloned()
            .collect())
    }

    async fn create_pv(&self, input: &NewProcesVerbal) -> StoreResult<ProcesVerbal> {
        let now = self.clock.now();
        let mut tables = self.lock();

        if tables.pvs.values().any(|pv| pv.numero_pv == input.numero_pv) {
            return Err(CoreError::Conflict(format!(
                "Duplicate value violates unique constraint: {PV_NUMBER_CONSTRAINT} ({})",
                input.numero_pv
            )));
        }
        let claimable = input.infraction_ids.iter().all(|id| {
            tables
                .infractions
                .get(id)
                .is_some_and(|i| i.pv_id.is_none() && i.controle_id == input.controle_id)
        });
        if !claimable {
            return Err(CoreError::Conflict(
                "An infraction was attached to another PV concurrently".to_string(),
            ));
        }

        let id = tables.next_id();
        let pv = ProcesVerbal {
            id,
            numero_pv: input.numero_pv.clone(),
            controle_id: input.controle_id,
            montant_total: input.montant_total,
            date_emission: input.date_emission,
            date_limite_paiement: input.date_limite_paiement,
            statut: PvStatus::Emis,
            created_at: now,
            updated_at: now,
        };
        tables.pvs.insert(id, pv.clone());
        for infraction_id in &input.infraction_ids {
            if let Some(inf) = tables.infractions.get_mut(infraction_id) {
                inf.pv_id = Some(id);
                inf.updated_at = now;
            }
        }
        Ok(pv)
    }

    async fn find_pv(&self, id: DbId) -> StoreResult<Option<ProcesVerbal>> {
        Ok(self.lock().pvs.get(&id).cloned())
    }

    async fn list_pv_infraction_ids(&self, pv_id: DbId) -> StoreResult<Vec<DbId>> {
        Ok(self
            .lock()
            .infractions
            .values()
            .filter(|i| i.pv_id == Some(pv_id))
            .map(|i| i.id)
            .collect())
    }
}

#[async_trait]
impl StatsStore for MemoryStore {
    async fn tally(&self, kind: StatsKind, filter: &StatsFilter) -> StoreResult<Tally> {
        let tables = self.lock();
        let in_scope = |commissariat_id: Option<DbId>| {
            filter.commissariat_id.is_none() || filter.commissariat_id == commissariat_id
        };

        let rows: Vec<(&'static str, Amount)> = match kind {
            StatsKind::Controles => tables
                .controles
                .values()
                .filter(|c| in_scope(c.commissariat_id) && filter.contains(c.date_controle))
                .map(|c| (c.statut.as_str(), c.montant_total_amendes))
                .collect(),
            StatsKind::Inspections => tables
                .inspections
                .values()
                .filter(|i| in_scope(i.commissariat_id) && filter.contains(i.date_inspection))
                .map(|i| (i.statut.as_str(), i.montant_total_amendes))
                .collect(),
            StatsKind::ProcesVerbaux => tables
                .pvs
                .values()
                .filter(|pv| {
                    let commissariat = tables
                        .controles
                        .get(&pv.controle_id)
                        .and_then(|c| c.commissariat_id);
                    in_scope(commissariat) && filter.contains(pv.date_emission)
                })
                .map(|pv| (pv.statut.as_str(), pv.montant_total))
                .collect(),
        };

        let mut tally = Tally::default();
        for (status, montant) in rows {
            *tally.by_status.entry(status.to_string()).or_insert(0) += 1;
            tally.montant = tally.montant.saturating_add(montant);
        }
        Ok(tally)
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}
