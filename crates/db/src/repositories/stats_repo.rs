//! Per-status aggregates for the dashboard statistics.

use patrouille_core::statistics::{StatsFilter, StatsKind};
use sqlx::PgPool;

/// One `GROUP BY statut` row: status code, row count, amount sum.
pub type StatusTotals = (String, i64, i64);

pub struct StatsRepo;

impl StatsRepo {
    /// Count rows and sum amounts per status for `kind` within `filter`.
    ///
    /// PVs are scoped to a commissariat through their control.
    pub async fn totals_by_status(
        pool: &PgPool,
        kind: StatsKind,
        filter: &StatsFilter,
    ) -> Result<Vec<StatusTotals>, sqlx::Error> {
        let query = match kind {
            StatsKind::Controles => {
                "SELECT statut, COUNT(*)::BIGINT, COALESCE(SUM(montant_total_amendes), 0)::BIGINT \
                 FROM controles \
                 WHERE ($1::BIGINT IS NULL OR commissariat_id = $1) \
                   AND ($2::TIMESTAMPTZ IS NULL OR date_controle >= $2) \
                   AND ($3::TIMESTAMPTZ IS NULL OR date_controle <= $3) \
                 GROUP BY statut"
            }
            StatsKind::Inspections => {
                "SELECT statut, COUNT(*)::BIGINT, COALESCE(SUM(montant_total_amendes), 0)::BIGINT \
                 FROM inspections \
                 WHERE ($1::BIGINT IS NULL OR commissariat_id = $1) \
                   AND ($2::TIMESTAMPTZ IS NULL OR date_inspection >= $2) \
                   AND ($3::TIMESTAMPTZ IS NULL OR date_inspection <= $3) \
                 GROUP BY statut"
            }
            StatsKind::ProcesVerbaux => {
                "SELECT pv.statut, COUNT(*)::BIGINT, COALESCE(SUM(pv.montant_total), 0)::BIGINT \
                 FROM proces_verbaux pv \
                 JOIN controles c ON c.id = pv.controle_id \
                 WHERE ($1::BIGINT IS NULL OR c.commissariat_id = $1) \
                   AND ($2::TIMESTAMPTZ IS NULL OR pv.date_emission >= $2) \
                   AND ($3::TIMESTAMPTZ IS NULL OR pv.date_emission <= $3) \
                 GROUP BY pv.statut"
            }
        };
        sqlx::query_as::<_, StatusTotals>(query)
            .bind(filter.commissariat_id)
            .bind(filter.date_debut)
            .bind(filter.date_fin)
            .fetch_all(pool)
            .await
    }
}
