use patrouille_core::pv::Infraction;
use patrouille_core::types::{DbId, Timestamp};
use sqlx::FromRow;

/// A row from the `infractions` table. Has no code columns, so it maps
/// one-to-one onto the domain type.
#[derive(Debug, Clone, FromRow)]
pub struct InfractionRecord {
    pub id: DbId,
    pub controle_id: DbId,
    pub check_option_id: Option<DbId>,
    pub libelle: String,
    pub montant_amende: i64,
    pub points_retires: i32,
    pub pv_id: Option<DbId>,
    pub date_infraction: Timestamp,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl From<InfractionRecord> for Infraction {
    fn from(row: InfractionRecord) -> Self {
        Infraction {
            id: row.id,
            controle_id: row.controle_id,
            check_option_id: row.check_option_id,
            libelle: row.libelle,
            montant_amende: row.montant_amende,
            points_retires: row.points_retires,
            pv_id: row.pv_id,
            date_infraction: row.date_infraction,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}
