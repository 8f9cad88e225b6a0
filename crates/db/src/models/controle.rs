use patrouille_core::error::CoreError;
use patrouille_core::lifecycle::{Controle, DriverSnapshot, VehicleSnapshot};
use patrouille_core::types::{DbId, Timestamp};
use sqlx::FromRow;

use super::parse_code;

/// A row from the `controles` table.
#[derive(Debug, Clone, FromRow)]
pub struct ControleRecord {
    pub id: DbId,
    pub reference: String,
    pub commissariat_id: Option<DbId>,
    pub agent_id: Option<DbId>,
    pub date_controle: Timestamp,
    pub lieu: Option<String>,
    pub vehicule_immatriculation: String,
    pub vehicule_marque: Option<String>,
    pub vehicule_modele: Option<String>,
    pub vehicule_type: Option<String>,
    pub conducteur_nom: Option<String>,
    pub conducteur_prenom: Option<String>,
    pub conducteur_permis: Option<String>,
    pub conducteur_telephone: Option<String>,
    pub statut: String,
    pub observations: Option<String>,
    pub total_verifications: i64,
    pub verifications_ok: i64,
    pub verifications_echec: i64,
    pub montant_total_amendes: i64,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl TryFrom<ControleRecord> for Controle {
    type Error = CoreError;

    fn try_from(row: ControleRecord) -> Result<Self, Self::Error> {
        Ok(Controle {
            statut: parse_code("controles.statut", &row.statut)?,
            id: row.id,
            reference: row.reference,
            commissariat_id: row.commissariat_id,
            agent_id: row.agent_id,
            date_controle: row.date_controle,
            lieu: row.lieu,
            vehicule: VehicleSnapshot {
                vehicule_immatriculation: row.vehicule_immatriculation,
                vehicule_marque: row.vehicule_marque,
                vehicule_modele: row.vehicule_modele,
                vehicule_type: row.vehicule_type,
            },
            conducteur: DriverSnapshot {
                conducteur_nom: row.conducteur_nom,
                conducteur_prenom: row.conducteur_prenom,
                conducteur_permis: row.conducteur_permis,
                conducteur_telephone: row.conducteur_telephone,
            },
            observations: row.observations,
            total_verifications: row.total_verifications,
            verifications_ok: row.verifications_ok,
            verifications_echec: row.verifications_echec,
            montant_total_amendes: row.montant_total_amendes,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}
