//! Repository for the `check_options` table.

use patrouille_core::types::DbId;
use patrouille_core::verification::{NewCheckOption, SourceType};
use sqlx::PgPool;

use crate::models::check_option::CheckOptionRecord;

/// Column list for `check_options` queries.
const COLUMNS: &str = "\
    id, source_type, source_id, check_item_id, result, notes, fine_amount, \
    checked_at, evidence_file_id, infraction_id, created_at, updated_at";

pub struct CheckOptionRepo;

impl CheckOptionRepo {
    /// Insert a verification, replacing the row for the same source and
    /// item if there is one. A replaced answer loses its infraction link.
    pub async fn upsert(
        pool: &PgPool,
        input: &NewCheckOption,
    ) -> Result<CheckOptionRecord, sqlx::Error> {
        let query = format!(
            "INSERT INTO check_options \
                 (source_type, source_id, check_item_id, result, notes, fine_amount, \
                  checked_at, evidence_file_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             ON CONFLICT ON CONSTRAINT uq_check_options_source_item DO UPDATE SET \
                 result           = EXCLUDED.result, \
                 notes            = EXCLUDED.notes, \
                 fine_amount      = EXCLUDED.fine_amount, \
                 checked_at       = EXCLUDED.checked_at, \
                 evidence_file_id = EXCLUDED.evidence_file_id, \
                 infraction_id    = NULL \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, CheckOptionRecord>(&query)
            .bind(input.source_type.as_str())
            .bind(input.source_id)
            .bind(input.check_item_id)
            .bind(input.result.as_str())
            .bind(&input.notes)
            .bind(input.fine_amount)
            .bind(input.checked_at)
            .bind(input.evidence_file_id)
            .fetch_one(pool)
            .await
    }

    /// Delete every verification of a source. Returns the number deleted.
    pub async fn delete_by_source(
        pool: &PgPool,
        source_type: SourceType,
        source_id: DbId,
    ) -> Result<u64, sqlx::Error> {
        let result =
            sqlx::query("DELETE FROM check_options WHERE source_type = $1 AND source_id = $2")
                .bind(source_type.as_str())
                .bind(source_id)
                .execute(pool)
                .await?;
        Ok(result.rows_affected())
    }

    pub async fn list_by_source(
        pool: &PgPool,
        source_type: SourceType,
        source_id: DbId,
    ) -> Result<Vec<CheckOptionRecord>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM check_options \
             WHERE source_type = $1 AND source_id = $2 ORDER BY id ASC"
        );
        sqlx::query_as::<_, CheckOptionRecord>(&query)
            .bind(source_type.as_str())
            .bind(source_id)
            .fetch_all(pool)
            .await
    }

    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<CheckOptionRecord>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM check_options WHERE id = $1");
        sqlx::query_as::<_, CheckOptionRecord>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Link a verification to its infraction unless it is linked already.
    /// Returns whether the link was written.
    pub async fn link_infraction(
        pool: &PgPool,
        id: DbId,
        infraction_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE check_options SET infraction_id = $2 \
             WHERE id = $1 AND infraction_id IS NULL",
        )
        .bind(id)
        .bind(infraction_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }
}
