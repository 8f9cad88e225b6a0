//! Repository for the `proces_verbaux` table.

use patrouille_core::pv::NewProcesVerbal;
use patrouille_core::types::DbId;
use sqlx::PgPool;

use crate::models::proces_verbal::ProcesVerbalRecord;

/// Column list for `proces_verbaux` queries.
const COLUMNS: &str = "\
    id, numero_pv, controle_id, montant_total, date_emission, \
    date_limite_paiement, statut, created_at, updated_at";

pub struct PvRepo;

impl PvRepo {
    /// Insert a PV and attach its infractions in one transaction.
    ///
    /// Attachment only touches infractions of the same control that have no
    /// PV yet. If fewer rows than requested are claimed the transaction is
    /// rolled back and `Ok(None)` is returned.
    pub async fn create_with_infractions(
        pool: &PgPool,
        input: &NewProcesVerbal,
    ) -> Result<Option<ProcesVerbalRecord>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let insert_query = format!(
            "INSERT INTO proces_verbaux \
                 (numero_pv, controle_id, montant_total, date_emission, date_limite_paiement) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {COLUMNS}"
        );
        let pv = sqlx::query_as::<_, ProcesVerbalRecord>(&insert_query)
            .bind(&input.numero_pv)
            .bind(input.controle_id)
            .bind(input.montant_total)
            .bind(input.date_emission)
            .bind(input.date_limite_paiement)
            .fetch_one(&mut *tx)
            .await?;

        let claimed = sqlx::query(
            "UPDATE infractions SET pv_id = $1 \
             WHERE id = ANY($2) AND controle_id = $3 AND pv_id IS NULL",
        )
        .bind(pv.id)
        .bind(&input.infraction_ids)
        .bind(input.controle_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if claimed != input.infraction_ids.len() as u64 {
            tx.rollback().await?;
            return Ok(None);
        }

        tx.commit().await?;
        Ok(Some(pv))
    }

    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<ProcesVerbalRecord>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM proces_verbaux WHERE id = $1");
        sqlx::query_as::<_, ProcesVerbalRecord>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }
}
