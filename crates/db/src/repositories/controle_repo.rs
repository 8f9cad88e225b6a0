//! Repository for the `controles` table.

use patrouille_core::lifecycle::{ControleRow, SourceStateUpdate};
use patrouille_core::types::DbId;
use sqlx::PgPool;

use crate::models::controle::ControleRecord;

/// Column list for `controles` queries.
const COLUMNS: &str = "\
    id, reference, commissariat_id, agent_id, date_controle, lieu, \
    vehicule_immatriculation, vehicule_marque, vehicule_modele, vehicule_type, \
    conducteur_nom, conducteur_prenom, conducteur_permis, conducteur_telephone, \
    statut, observations, total_verifications, verifications_ok, \
    verifications_echec, montant_total_amendes, created_at, updated_at";

pub struct ControleRepo;

impl ControleRepo {
    pub async fn create(pool: &PgPool, row: &ControleRow) -> Result<ControleRecord, sqlx::Error> {
        let input = &row.input;
        let query = format!(
            "INSERT INTO controles \
                 (reference, commissariat_id, agent_id, date_controle, lieu, \
                  vehicule_immatriculation, vehicule_marque, vehicule_modele, vehicule_type, \
                  conducteur_nom, conducteur_prenom, conducteur_permis, conducteur_telephone, \
                  statut, observations) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ControleRecord>(&query)
            .bind(&row.reference)
            .bind(input.commissariat_id)
            .bind(input.agent_id)
            .bind(row.date_controle)
            .bind(&input.lieu)
            .bind(&input.vehicule.vehicule_immatriculation)
            .bind(&input.vehicule.vehicule_marque)
            .bind(&input.vehicule.vehicule_modele)
            .bind(&input.vehicule.vehicule_type)
            .bind(&input.conducteur.conducteur_nom)
            .bind(&input.conducteur.conducteur_prenom)
            .bind(&input.conducteur.conducteur_permis)
            .bind(&input.conducteur.conducteur_telephone)
            .bind(row.statut.as_str())
            .bind(&input.observations)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<ControleRecord>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM controles WHERE id = $1");
        sqlx::query_as::<_, ControleRecord>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Apply a state update. Only supplied fields change; a warning count
    /// has no column here and is ignored.
    pub async fn update_state(
        pool: &PgPool,
        id: DbId,
        update: &SourceStateUpdate,
    ) -> Result<Option<ControleRecord>, sqlx::Error> {
        let counters = update.counters;
        let query = format!(
            "UPDATE controles SET \
                 statut                = COALESCE($2, statut), \
                 total_verifications   = COALESCE($3, total_verifications), \
                 verifications_ok      = COALESCE($4, verifications_ok), \
                 verifications_echec   = COALESCE($5, verifications_echec), \
                 montant_total_amendes = COALESCE($6, montant_total_amendes), \
                 observations          = COALESCE($7, observations) \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ControleRecord>(&query)
            .bind(id)
            .bind(update.statut.map(|s| s.as_str()))
            .bind(counters.map(|c| c.total_verifications))
            .bind(counters.map(|c| c.verifications_ok))
            .bind(counters.map(|c| c.verifications_echec))
            .bind(counters.map(|c| c.montant_total_amendes))
            .bind(&update.observations)
            .fetch_optional(pool)
            .await
    }
}
