//! Infractions and the fine documents (procès-verbaux) that aggregate them.

pub mod service;

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::codes::define_code_enum;
use crate::error::CoreError;
use crate::types::{Amount, DbId, Timestamp};

/// Days between issuing a PV and its payment deadline.
pub const DEFAULT_PAYMENT_DAYS: i64 = 45;

/// Attempts at persisting a PV when its number collides with an existing one.
pub const PV_NUMBER_ATTEMPTS: u32 = 3;

/// Unique constraint guarding `numero_pv`. Stores name it in the conflict
/// message so a number collision can be told apart from other conflicts.
pub const PV_NUMBER_CONSTRAINT: &str = "uq_proces_verbaux_numero_pv";

define_code_enum! {
    /// Payment state of a PV. Only `EMIS` is set here; the rest belong to
    /// the payment and appeal workflows.
    PvStatus {
        Emis = "EMIS",
        Paye = "PAYE",
        Conteste = "CONTESTE",
        Annule = "ANNULE",
    }
}

/// A recorded violation attached to a Control.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Infraction {
    pub id: DbId,
    pub controle_id: DbId,
    pub check_option_id: Option<DbId>,
    pub libelle: String,
    pub montant_amende: Amount,
    pub points_retires: i32,
    pub pv_id: Option<DbId>,
    pub date_infraction: Timestamp,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Insert payload for an infraction.
#[derive(Debug, Clone)]
pub struct NewInfraction {
    pub controle_id: DbId,
    pub check_option_id: Option<DbId>,
    pub libelle: String,
    pub montant_amende: Amount,
    pub points_retires: i32,
    pub date_infraction: Timestamp,
}

/// Request body for recording an infraction on a Control.
///
/// With `check_option_id` the missing fields default from the failed
/// verification and its catalog item.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecordInfraction {
    pub check_option_id: Option<DbId>,
    pub libelle: Option<String>,
    pub montant_amende: Option<Amount>,
    pub points_retires: Option<i32>,
    pub date_infraction: Option<Timestamp>,
}

/// A fine document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcesVerbal {
    pub id: DbId,
    pub numero_pv: String,
    pub controle_id: DbId,
    pub montant_total: Amount,
    pub date_emission: Timestamp,
    pub date_limite_paiement: Timestamp,
    pub statut: PvStatus,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Insert payload for a PV together with the infractions it claims.
#[derive(Debug, Clone)]
pub struct NewProcesVerbal {
    pub numero_pv: String,
    pub controle_id: DbId,
    pub montant_total: Amount,
    pub date_emission: Timestamp,
    pub date_limite_paiement: Timestamp,
    pub infraction_ids: Vec<DbId>,
}

/// A PV with the ids of the infractions it aggregates.
#[derive(Debug, Clone, Serialize)]
pub struct PvSummary {
    #[serde(flatten)]
    pub pv: ProcesVerbal,
    pub infraction_ids: Vec<DbId>,
    pub nombre_infractions: usize,
}

impl PvSummary {
    pub fn new(pv: ProcesVerbal, infraction_ids: Vec<DbId>) -> Self {
        let nombre_infractions = infraction_ids.len();
        Self {
            pv,
            infraction_ids,
            nombre_infractions,
        }
    }
}

/// Why a requested infraction was left out of a PV.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    Missing,
    OtherControle,
    AlreadyInPv,
    Duplicate,
}

impl SkipReason {
    pub fn as_str(self) -> &'static str {
        match self {
            SkipReason::Missing => "missing",
            SkipReason::OtherControle => "other_controle",
            SkipReason::AlreadyInPv => "already_in_pv",
            SkipReason::Duplicate => "duplicate",
        }
    }
}

/// Outcome of filtering a requested infraction set.
#[derive(Debug, Default)]
pub struct InfractionSelection {
    pub kept: Vec<Infraction>,
    pub skipped: Vec<(DbId, SkipReason)>,
}

impl InfractionSelection {
    /// Sum of the kept fines; a total past `Amount::MAX` is a validation error.
    pub fn montant_total(&self) -> Result<Amount, CoreError> {
        self.kept
            .iter()
            .try_fold(0 as Amount, |acc, i| acc.checked_add(i.montant_amende))
            .ok_or_else(|| {
                CoreError::Validation("PV total exceeds the supported amount".to_string())
            })
    }

    pub fn kept_ids(&self) -> Vec<DbId> {
        self.kept.iter().map(|i| i.id).collect()
    }
}

/// Keep the requested infractions that can go into a new PV for
/// `controle_id`, preserving request order.
///
/// `lookup` pairs each requested id with what the store returned for it.
pub fn select_infractions(
    controle_id: DbId,
    lookup: Vec<(DbId, Option<Infraction>)>,
) -> InfractionSelection {
    let mut seen = HashSet::new();
    let mut selection = InfractionSelection::default();

    for (id, found) in lookup {
        if !seen.insert(id) {
            selection.skipped.push((id, SkipReason::Duplicate));
            continue;
        }
        match found {
            None => selection.skipped.push((id, SkipReason::Missing)),
            Some(inf) if inf.controle_id != controle_id => {
                selection.skipped.push((id, SkipReason::OtherControle))
            }
            Some(inf) if inf.pv_id.is_some() => {
                selection.skipped.push((id, SkipReason::AlreadyInPv))
            }
            Some(inf) => selection.kept.push(inf),
        }
    }

    selection
}

/// Build a PV number: `PV` + `YYYYMMDD` + six digits taken from the clock's
/// sub-second nanoseconds.
///
/// `attempt` shifts the suffix so a retry after a collision never reuses the
/// number that just failed, even under a frozen clock.
pub fn numero_pv(now: Timestamp, attempt: u32) -> String {
    let suffix = (now.timestamp_subsec_nanos() + attempt) % 1_000_000;
    format!("PV{}{suffix:06}", now.format("%Y%m%d"))
}

/// Payment deadline for a PV issued at `now`.
pub fn payment_deadline(now: Timestamp, days: i64) -> Timestamp {
    now + chrono::Duration::days(days)
}

#[cfg(test)]
pub(crate) fn sample_infraction(
    id: DbId,
    controle_id: DbId,
    montant_amende: Amount,
    pv_id: Option<DbId>,
) -> Infraction {
    let at = chrono::DateTime::UNIX_EPOCH;
    Infraction {
        id,
        controle_id,
        check_option_id: None,
        libelle: format!("infraction {id}"),
        montant_amende,
        points_retires: 0,
        pv_id,
        date_infraction: at,
        created_at: at,
        updated_at: at,
    }
}
