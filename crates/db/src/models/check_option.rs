use patrouille_core::error::CoreError;
use patrouille_core::types::{DbId, Timestamp};
use patrouille_core::verification::CheckOption;
use sqlx::FromRow;

use super::parse_code;

/// A row from the `check_options` table.
#[derive(Debug, Clone, FromRow)]
pub struct CheckOptionRecord {
    pub id: DbId,
    pub source_type: String,
    pub source_id: DbId,
    pub check_item_id: DbId,
    pub result: String,
    pub notes: Option<String>,
    pub fine_amount: i64,
    pub checked_at: Timestamp,
    pub evidence_file_id: Option<DbId>,
    pub infraction_id: Option<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl TryFrom<CheckOptionRecord> for CheckOption {
    type Error = CoreError;

    fn try_from(row: CheckOptionRecord) -> Result<Self, Self::Error> {
        Ok(CheckOption {
            source_type: parse_code("check_options.source_type", &row.source_type)?,
            result: parse_code("check_options.result", &row.result)?,
            id: row.id,
            source_id: row.source_id,
            check_item_id: row.check_item_id,
            notes: row.notes,
            fine_amount: row.fine_amount,
            checked_at: row.checked_at,
            evidence_file_id: row.evidence_file_id,
            infraction_id: row.infraction_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}
