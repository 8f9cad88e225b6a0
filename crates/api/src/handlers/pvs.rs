//! Handlers for issued PVs (procès-verbaux).

use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::Json;
use patrouille_core::statistics::StatsKind;
use patrouille_core::types::DbId;

use crate::error::AppResult;
use crate::handlers::sources;
use crate::query::StatsParams;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/pvs/{id}
///
/// The PV with the ids of the infractions it aggregates.
pub async fn get_pv(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let pv = state.services.pv.get_pv(id).await?;

    Ok(Json(DataResponse { data: pv }))
}

/// GET /api/v1/pvs/statistiques
pub async fn pv_statistiques(
    State(state): State<AppState>,
    query: Result<Query<StatsParams>, QueryRejection>,
) -> AppResult<impl IntoResponse> {
    let Query(params) = query?;
    sources::statistiques(&state, StatsKind::ProcesVerbaux, params).await
}
