use patrouille_core::catalog::CheckItem;
use patrouille_core::error::CoreError;
use patrouille_core::types::{DbId, Timestamp};
use sqlx::FromRow;

use super::parse_code;

/// A row from the `check_items` table.
#[derive(Debug, Clone, FromRow)]
pub struct CheckItemRecord {
    pub id: DbId,
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub category: String,
    pub applicable_to: String,
    pub mandatory: bool,
    pub active: bool,
    pub display_order: i32,
    pub default_fine: i64,
    pub default_points: i32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl TryFrom<CheckItemRecord> for CheckItem {
    type Error = CoreError;

    fn try_from(row: CheckItemRecord) -> Result<Self, Self::Error> {
        Ok(CheckItem {
            category: parse_code("check_items.category", &row.category)?,
            applicable_to: parse_code("check_items.applicable_to", &row.applicable_to)?,
            id: row.id,
            code: row.code,
            name: row.name,
            description: row.description,
            mandatory: row.mandatory,
            active: row.active,
            display_order: row.display_order,
            default_fine: row.default_fine,
            default_points: row.default_points,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}
