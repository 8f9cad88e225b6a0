//! Repository for the `inspections` table.

use patrouille_core::lifecycle::{InspectionRow, SourceStateUpdate};
use patrouille_core::types::DbId;
use sqlx::PgPool;

use crate::models::inspection::InspectionRecord;

/// Column list for `inspections` queries.
const COLUMNS: &str = "\
    id, reference, commissariat_id, inspecteur_id, date_inspection, lieu, \
    vehicule_immatriculation, vehicule_marque, vehicule_modele, vehicule_type, \
    conducteur_nom, conducteur_prenom, conducteur_permis, conducteur_telephone, \
    statut, observations, total_verifications, verifications_ok, \
    verifications_echec, verifications_attention, montant_total_amendes, \
    created_at, updated_at";

pub struct InspectionRepo;

impl InspectionRepo {
    pub async fn create(
        pool: &PgPool,
        row: &InspectionRow,
    ) -> Result<InspectionRecord, sqlx::Error> {
        let input = &row.input;
        let query = format!(
            "INSERT INTO inspections \
                 (reference, commissariat_id, inspecteur_id, date_inspection, lieu, \
                  vehicule_immatriculation, vehicule_marque, vehicule_modele, vehicule_type, \
                  conducteur_nom, conducteur_prenom, conducteur_permis, conducteur_telephone, \
                  statut, observations) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, InspectionRecord>(&query)
            .bind(&row.reference)
            .bind(input.commissariat_id)
            .bind(input.inspecteur_id)
            .bind(row.date_inspection)
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

    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<InspectionRecord>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM inspections WHERE id = $1");
        sqlx::query_as::<_, InspectionRecord>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Apply a state update. Only supplied fields change.
    pub async fn update_state(
        pool: &PgPool,
        id: DbId,
        update: &SourceStateUpdate,
    ) -> Result<Option<InspectionRecord>, sqlx::Error> {
        let counters = update.counters;
        let query = format!(
            "UPDATE inspections SET \
                 statut                  = COALESCE($2, statut), \
                 total_verifications     = COALESCE($3, total_verifications), \
                 verifications_ok        = COALESCE($4, verifications_ok), \
                 verifications_echec     = COALESCE($5, verifications_echec), \
                 verifications_attention = COALESCE($6, verifications_attention), \
                 montant_total_amendes   = COALESCE($7, montant_total_amendes), \
                 observations            = COALESCE($8, observations) \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, InspectionRecord>(&query)
            .bind(id)
            .bind(update.statut.map(|s| s.as_str()))
            .bind(counters.map(|c| c.total_verifications))
            .bind(counters.map(|c| c.verifications_ok))
            .bind(counters.map(|c| c.verifications_echec))
            .bind(counters.and_then(|c| c.verifications_attention))
            .bind(counters.map(|c| c.montant_total_amendes))
            .bind(&update.observations)
            .fetch_optional(pool)
            .await
    }
}
