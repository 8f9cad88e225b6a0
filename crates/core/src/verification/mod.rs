//! Verification results recorded against the checklist catalog.
//!
//! A verification (check option) answers one [`CheckItem`] for one source,
//! a Control or an Inspection. This module holds the pure rules: fine
//! resolution and the counter projection cached on the source record.

pub mod service;

use serde::{Deserialize, Serialize};

use crate::catalog::CheckItem;
use crate::codes::define_code_enum;
use crate::error::CoreError;
use crate::types::{Amount, DbId, Timestamp};

define_code_enum! {
    /// The kind of record a verification belongs to.
    SourceType {
        Control = "CONTROL",
        Inspection = "INSPECTION",
    }
}

impl SourceType {
    /// Entity name used in not-found errors.
    pub fn entity_name(self) -> &'static str {
        match self {
            SourceType::Control => "Controle",
            SourceType::Inspection => "Inspection",
        }
    }
}

define_code_enum! {
    /// Outcome of one checklist question.
    VerificationResult {
        Pass = "PASS",
        Fail = "FAIL",
        Warning = "WARNING",
        NotChecked = "NOT_CHECKED",
    }
}

/// A stored verification result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckOption {
    pub id: DbId,
    pub source_type: SourceType,
    pub source_id: DbId,
    pub check_item_id: DbId,
    pub result: VerificationResult,
    pub notes: Option<String>,
    pub fine_amount: Amount,
    pub checked_at: Timestamp,
    pub evidence_file_id: Option<DbId>,
    pub infraction_id: Option<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Insert payload for a verification. Replaces any row for the same
/// `(source_type, source_id, check_item_id)`.
#[derive(Debug, Clone)]
pub struct NewCheckOption {
    pub source_type: SourceType,
    pub source_id: DbId,
    pub check_item_id: DbId,
    pub result: VerificationResult,
    pub notes: Option<String>,
    pub fine_amount: Amount,
    pub checked_at: Timestamp,
    pub evidence_file_id: Option<DbId>,
}

/// One caller-supplied verification, as accepted by the batch endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct VerificationEntry {
    pub check_item_id: DbId,
    #[serde(rename = "resultat")]
    pub result: VerificationResult,
    pub notes: Option<String>,
    #[serde(rename = "montant_amende")]
    pub fine_override: Option<Amount>,
    pub evidence_file_id: Option<DbId>,
}

/// A verification joined with the catalog item it answers.
#[derive(Debug, Clone, Serialize)]
pub struct VerificationView {
    #[serde(flatten)]
    pub option: CheckOption,
    pub check_item: CheckItem,
}

/// Derived counters for one source's verification set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationCounters {
    pub total: i64,
    pub total_ok: i64,
    pub total_echec: i64,
    pub total_attention: i64,
    pub total_non_verifie: i64,
    pub montant_total: Amount,
}

/// Read-back of a source's verifications with their counters.
#[derive(Debug, Clone, Serialize)]
pub struct ListVerificationsResult {
    pub source_type: SourceType,
    pub source_id: DbId,
    pub verifications: Vec<VerificationView>,
    #[serde(flatten)]
    pub counters: VerificationCounters,
}

/// Per-entry outcome of a best-effort bulk write.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntryOutcome {
    pub index: usize,
    pub check_item_id: DbId,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl EntryOutcome {
    pub fn succeeded(index: usize, check_item_id: DbId) -> Self {
        Self {
            index,
            check_item_id,
            ok: true,
            error: None,
        }
    }

    pub fn failed(index: usize, check_item_id: DbId, err: &CoreError) -> Self {
        Self {
            index,
            check_item_id,
            ok: false,
            error: Some(err.to_string()),
        }
    }
}

/// Result of a full-replace batch save.
#[derive(Debug, Clone, Serialize)]
pub struct BatchVerificationResult {
    #[serde(flatten)]
    pub verifications: ListVerificationsResult,
    pub outcomes: Vec<EntryOutcome>,
}

impl BatchVerificationResult {
    pub fn failed_count(&self) -> usize {
        self.outcomes.iter().filter(|o| !o.ok).count()
    }
}

/// Largest fine a single verification or infraction may carry.
pub const MAX_FINE: Amount = 1_000_000_000;

/// Reject fines outside `0..=MAX_FINE`.
pub fn check_fine(amount: Amount) -> Result<Amount, CoreError> {
    if !(0..=MAX_FINE).contains(&amount) {
        return Err(CoreError::Validation(format!(
            "montant_amende must be between 0 and {MAX_FINE}, got {amount}"
        )));
    }
    Ok(amount)
}

/// Resolve the fine recorded on a verification.
///
/// An explicit override always wins. Otherwise only a failed check carries
/// the item's default fine; every other result records zero.
pub fn resolve_fine(
    item: &CheckItem,
    result: VerificationResult,
    fine_override: Option<Amount>,
) -> Result<Amount, CoreError> {
    match fine_override {
        Some(amount) => check_fine(amount),
        None if result == VerificationResult::Fail => Ok(item.default_fine),
        None => Ok(0),
    }
}

/// Project the cached counters from a verification set.
pub fn project_counters<'a, I>(options: I) -> VerificationCounters
where
    I: IntoIterator<Item = &'a CheckOption>,
{
    options
        .into_iter()
        .fold(VerificationCounters::default(), |mut acc, option| {
            acc.total += 1;
            match option.result {
                VerificationResult::Pass => acc.total_ok += 1,
                VerificationResult::Fail => acc.total_echec += 1,
                VerificationResult::Warning => acc.total_attention += 1,
                VerificationResult::NotChecked => acc.total_non_verifie += 1,
            }
            acc.montant_total = acc.montant_total.saturating_add(option.fine_amount);
            acc
        })
}

#[cfg(test)]
pub(crate) fn sample_option(
    id: DbId,
    check_item_id: DbId,
    result: VerificationResult,
    fine_amount: Amount,
) -> CheckOption {
    let at = chrono::DateTime::UNIX_EPOCH;
    CheckOption {
        id,
        source_type: SourceType::Control,
        source_id: 1,
        check_item_id,
        result,
        notes: None,
        fine_amount,
        checked_at: at,
        evidence_file_id: None,
        infraction_id: None,
        created_at: at,
        updated_at: at,
    }
}
