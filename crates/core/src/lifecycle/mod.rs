//! Control and Inspection records and their workflow states.
//!
//! Both records snapshot vehicle and driver data at the time of the check and
//! cache the verification counters of their checklist. Status changes are
//! always caller-driven; nothing here transitions a record on its own.

pub mod service;

use serde::{Deserialize, Serialize};

use crate::codes::define_code_enum;
use crate::error::CoreError;
use crate::types::{Amount, DbId, Timestamp};
use crate::verification::{EntryOutcome, SourceType, VerificationCounters, VerificationEntry};

define_code_enum! {
    /// Workflow state shared by Controls and Inspections.
    SourceStatus {
        /// Initial state of an Inspection only.
        EnAttente = "EN_ATTENTE",
        EnCours = "EN_COURS",
        Termine = "TERMINE",
        Conforme = "CONFORME",
        NonConforme = "NON_CONFORME",
    }
}

impl SourceStatus {
    /// State a freshly created record starts in.
    pub fn initial(source_type: SourceType) -> Self {
        match source_type {
            SourceType::Control => SourceStatus::EnCours,
            SourceType::Inspection => SourceStatus::EnAttente,
        }
    }

    /// Statuses a record of this type may ever hold.
    pub fn valid_for(source_type: SourceType) -> &'static [SourceStatus] {
        match source_type {
            SourceType::Control => &[
                SourceStatus::EnCours,
                SourceStatus::Termine,
                SourceStatus::Conforme,
                SourceStatus::NonConforme,
            ],
            SourceType::Inspection => SourceStatus::ALL,
        }
    }

    pub fn is_final(self) -> bool {
        matches!(self, SourceStatus::Conforme | SourceStatus::NonConforme)
    }

    fn rank(self) -> u8 {
        match self {
            SourceStatus::EnAttente => 0,
            SourceStatus::EnCours => 1,
            SourceStatus::Termine => 2,
            SourceStatus::Conforme | SourceStatus::NonConforme => 3,
        }
    }
}

/// Check that `from -> to` is a legal move for a record of `source_type`.
///
/// Records only move forward: `EN_ATTENTE -> EN_COURS -> TERMINE ->
/// {CONFORME | NON_CONFORME}`, any step may be skipped, and the final
/// verdicts are terminal. Re-applying the current status is accepted so
/// observations and counters can be refreshed without moving the record.
pub fn validate_transition(
    source_type: SourceType,
    from: SourceStatus,
    to: SourceStatus,
) -> Result<(), CoreError> {
    if !SourceStatus::valid_for(source_type).contains(&to) {
        return Err(CoreError::Validation(format!(
            "Status {to} is not valid for a {}",
            source_type.entity_name()
        )));
    }
    if from == to {
        return Ok(());
    }
    if from.is_final() {
        return Err(CoreError::Validation(format!(
            "{} is already closed with status {from}",
            source_type.entity_name()
        )));
    }
    if to.rank() <= from.rank() {
        return Err(CoreError::Validation(format!(
            "Cannot move a {} from {from} back to {to}",
            source_type.entity_name()
        )));
    }
    Ok(())
}

/// Vehicle data copied onto the record at check time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VehicleSnapshot {
    pub vehicule_immatriculation: String,
    pub vehicule_marque: Option<String>,
    pub vehicule_modele: Option<String>,
    pub vehicule_type: Option<String>,
}

/// Driver data copied onto the record at check time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DriverSnapshot {
    pub conducteur_nom: Option<String>,
    pub conducteur_prenom: Option<String>,
    pub conducteur_permis: Option<String>,
    pub conducteur_telephone: Option<String>,
}

/// A roadside check.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Controle {
    pub id: DbId,
    pub reference: String,
    pub commissariat_id: Option<DbId>,
    pub agent_id: Option<DbId>,
    pub date_controle: Timestamp,
    pub lieu: Option<String>,
    #[serde(flatten)]
    pub vehicule: VehicleSnapshot,
    #[serde(flatten)]
    pub conducteur: DriverSnapshot,
    pub statut: SourceStatus,
    pub observations: Option<String>,
    pub total_verifications: i64,
    pub verifications_ok: i64,
    pub verifications_echec: i64,
    pub montant_total_amendes: Amount,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A technical inspection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Inspection {
    pub id: DbId,
    pub reference: String,
    pub commissariat_id: Option<DbId>,
    pub inspecteur_id: Option<DbId>,
    pub date_inspection: Timestamp,
    pub lieu: Option<String>,
    #[serde(flatten)]
    pub vehicule: VehicleSnapshot,
    #[serde(flatten)]
    pub conducteur: DriverSnapshot,
    pub statut: SourceStatus,
    pub observations: Option<String>,
    pub total_verifications: i64,
    pub verifications_ok: i64,
    pub verifications_echec: i64,
    pub verifications_attention: i64,
    pub montant_total_amendes: Amount,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Either kind of source record.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SourceRecord {
    Controle(Controle),
    Inspection(Inspection),
}

impl SourceRecord {
    pub fn id(&self) -> DbId {
        match self {
            SourceRecord::Controle(c) => c.id,
            SourceRecord::Inspection(i) => i.id,
        }
    }

    pub fn source_type(&self) -> SourceType {
        match self {
            SourceRecord::Controle(_) => SourceType::Control,
            SourceRecord::Inspection(_) => SourceType::Inspection,
        }
    }

    pub fn statut(&self) -> SourceStatus {
        match self {
            SourceRecord::Controle(c) => c.statut,
            SourceRecord::Inspection(i) => i.statut,
        }
    }
}

/// Counter columns as stored on a source record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedCounters {
    pub total_verifications: i64,
    pub verifications_ok: i64,
    pub verifications_echec: i64,
    pub verifications_attention: Option<i64>,
    pub montant_total_amendes: Amount,
}

impl From<VerificationCounters> for CachedCounters {
    fn from(c: VerificationCounters) -> Self {
        Self {
            total_verifications: c.total,
            verifications_ok: c.total_ok,
            verifications_echec: c.total_echec,
            verifications_attention: Some(c.total_attention),
            montant_total_amendes: c.montant_total,
        }
    }
}

impl CachedCounters {
    /// Compare with a projection, ignoring the warning count when the caller
    /// did not supply one.
    pub fn agrees_with(&self, projected: &CachedCounters) -> bool {
        self.total_verifications == projected.total_verifications
            && self.verifications_ok == projected.verifications_ok
            && self.verifications_echec == projected.verifications_echec
            && self.montant_total_amendes == projected.montant_total_amendes
            && self
                .verifications_attention
                .map_or(true, |a| Some(a) == projected.verifications_attention)
    }
}

/// Insert payload for a Control.
#[derive(Debug, Clone, Deserialize)]
pub struct NewControle {
    pub reference: Option<String>,
    pub commissariat_id: Option<DbId>,
    pub agent_id: Option<DbId>,
    pub date_controle: Option<Timestamp>,
    pub lieu: Option<String>,
    #[serde(flatten)]
    pub vehicule: VehicleSnapshot,
    #[serde(flatten)]
    pub conducteur: DriverSnapshot,
    pub observations: Option<String>,
}

/// Insert payload for an Inspection.
#[derive(Debug, Clone, Deserialize)]
pub struct NewInspection {
    pub reference: Option<String>,
    pub commissariat_id: Option<DbId>,
    pub inspecteur_id: Option<DbId>,
    pub date_inspection: Option<Timestamp>,
    pub lieu: Option<String>,
    #[serde(flatten)]
    pub vehicule: VehicleSnapshot,
    #[serde(flatten)]
    pub conducteur: DriverSnapshot,
    pub observations: Option<String>,
}

/// Fully resolved insert row: defaults applied by the service.
#[derive(Debug, Clone)]
pub struct ControleRow {
    pub input: NewControle,
    pub reference: String,
    pub date_controle: Timestamp,
    pub statut: SourceStatus,
}

/// Fully resolved insert row: defaults applied by the service.
#[derive(Debug, Clone)]
pub struct InspectionRow {
    pub input: NewInspection,
    pub reference: String,
    pub date_inspection: Timestamp,
    pub statut: SourceStatus,
}

/// State written back onto a source record.
#[derive(Debug, Clone)]
pub struct SourceStateUpdate {
    pub statut: Option<SourceStatus>,
    pub counters: Option<CachedCounters>,
    /// `Some` replaces the stored observations.
    pub observations: Option<String>,
}

/// A status change request (`PATCH .../statut`).
#[derive(Debug, Clone, Deserialize)]
pub struct ChangeStatus {
    pub statut: SourceStatus,
    pub observations: Option<String>,
    pub total_verifications: Option<i64>,
    pub verifications_ok: Option<i64>,
    pub verifications_echec: Option<i64>,
    pub verifications_attention: Option<i64>,
    pub montant_total_amendes: Option<Amount>,
}

impl ChangeStatus {
    /// Counters the caller sent, if it sent the full core set.
    pub fn supplied_counters(&self) -> Option<CachedCounters> {
        Some(CachedCounters {
            total_verifications: self.total_verifications?,
            verifications_ok: self.verifications_ok?,
            verifications_echec: self.verifications_echec?,
            verifications_attention: self.verifications_attention,
            montant_total_amendes: self.montant_total_amendes?,
        })
    }
}

/// A created record plus the outcome of seeding its initial verifications.
#[derive(Debug, Clone, Serialize)]
pub struct CreatedSource {
    pub record: SourceRecord,
    pub outcomes: Vec<EntryOutcome>,
}

/// Creation request: the record plus optional initial verifications.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateRequest<T> {
    #[serde(flatten)]
    pub record: T,
    #[serde(default)]
    pub initial_options: Vec<VerificationEntry>,
}

/// Default reference: `CTL-YYYYMMDD-HHMMSS` / `INS-...` from the clock.
pub fn default_reference(source_type: SourceType, now: Timestamp) -> String {
    let prefix = match source_type {
        SourceType::Control => "CTL",
        SourceType::Inspection => "INS",
    };
    format!("{prefix}-{}", now.format("%Y%m%d-%H%M%S%3f"))
}
