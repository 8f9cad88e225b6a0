//! Repository for the `check_items` table (read-only catalog).

use patrouille_core::catalog::CheckItemFilter;
use patrouille_core::types::DbId;
use sqlx::PgPool;

use crate::models::check_item::CheckItemRecord;

/// Column list for `check_items` queries.
const COLUMNS: &str = "\
    id, code, name, description, category, applicable_to, mandatory, active, \
    display_order, default_fine, default_points, created_at, updated_at";

pub struct CheckItemRepo;

impl CheckItemRepo {
    /// List items matching `filter` in checklist order.
    ///
    /// An `applicable_to` filter also matches items marked `BOTH`.
    pub async fn list(
        pool: &PgPool,
        filter: &CheckItemFilter,
    ) -> Result<Vec<CheckItemRecord>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM check_items \
             WHERE ($1::TEXT IS NULL OR applicable_to = $1 OR applicable_to = 'BOTH') \
               AND ($2::TEXT IS NULL OR category = $2) \
               AND (NOT $3 OR active) \
             ORDER BY display_order ASC, code ASC"
        );
        sqlx::query_as::<_, CheckItemRecord>(&query)
            .bind(filter.applicable_to.map(|s| s.as_str()))
            .bind(filter.category.map(|c| c.as_str()))
            .bind(filter.active_only)
            .fetch_all(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<CheckItemRecord>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM check_items WHERE id = $1");
        sqlx::query_as::<_, CheckItemRecord>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_code(
        pool: &PgPool,
        code: &str,
    ) -> Result<Option<CheckItemRecord>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM check_items WHERE code = $1");
        sqlx::query_as::<_, CheckItemRecord>(&query)
            .bind(code)
            .fetch_optional(pool)
            .await
    }
}
