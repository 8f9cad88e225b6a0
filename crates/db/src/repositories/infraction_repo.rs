//! Repository for the `infractions` table.

use patrouille_core::pv::NewInfraction;
use patrouille_core::types::DbId;
use sqlx::PgPool;

use crate::models::infraction::InfractionRecord;

/// Column list for `infractions` queries.
const COLUMNS: &str = "\
    id, controle_id, check_option_id, libelle, montant_amende, points_retires, \
    pv_id, date_infraction, created_at, updated_at";

pub struct InfractionRepo;

impl InfractionRepo {
    pub async fn create(
        pool: &PgPool,
        input: &NewInfraction,
    ) -> Result<InfractionRecord, sqlx::Error> {
        let query = format!(
            "INSERT INTO infractions \
                 (controle_id, check_option_id, libelle, montant_amende, points_retires, \
                  date_infraction) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, InfractionRecord>(&query)
            .bind(input.controle_id)
            .bind(input.check_option_id)
            .bind(&input.libelle)
            .bind(input.montant_amende)
            .bind(input.points_retires)
            .bind(input.date_infraction)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<InfractionRecord>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM infractions WHERE id = $1");
        sqlx::query_as::<_, InfractionRecord>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list_by_controle(
        pool: &PgPool,
        controle_id: DbId,
    ) -> Result<Vec<InfractionRecord>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM infractions \
             WHERE controle_id = $1 ORDER BY id ASC"
        );
        sqlx::query_as::<_, InfractionRecord>(&query)
            .bind(controle_id)
            .fetch_all(pool)
            .await
    }

    pub async fn list_ids_by_pv(pool: &PgPool, pv_id: DbId) -> Result<Vec<DbId>, sqlx::Error> {
        sqlx::query_scalar::<_, DbId>("SELECT id FROM infractions WHERE pv_id = $1 ORDER BY id ASC")
            .bind(pv_id)
            .fetch_all(pool)
            .await
    }
}
