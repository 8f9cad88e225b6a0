use patrouille_core::error::CoreError;
use patrouille_core::pv::ProcesVerbal;
use patrouille_core::types::{DbId, Timestamp};
use sqlx::FromRow;

use super::parse_code;

/// A row from the `proces_verbaux` table.
#[derive(Debug, Clone, FromRow)]
pub struct ProcesVerbalRecord {
    pub id: DbId,
    pub numero_pv: String,
    pub controle_id: DbId,
    pub montant_total: i64,
    pub date_emission: Timestamp,
    pub date_limite_paiement: Timestamp,
    pub statut: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl TryFrom<ProcesVerbalRecord> for ProcesVerbal {
    type Error = CoreError;

    fn try_from(row: ProcesVerbalRecord) -> Result<Self, Self::Error> {
        Ok(ProcesVerbal {
            statut: parse_code("proces_verbaux.statut", &row.statut)?,
            id: row.id,
            numero_pv: row.numero_pv,
            controle_id: row.controle_id,
            montant_total: row.montant_total,
            date_emission: row.date_emission,
            date_limite_paiement: row.date_limite_paiement,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}
