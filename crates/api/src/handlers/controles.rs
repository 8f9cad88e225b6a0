//! Handlers for roadside Controls, their infractions and PV generation.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::Json;
use patrouille_core::lifecycle::{ChangeStatus, CreateRequest, NewControle};
use patrouille_core::pv::RecordInfraction;
use patrouille_core::statistics::StatsKind;
use patrouille_core::types::DbId;
use patrouille_core::verification::SourceType;
use serde::Deserialize;
use validator::Validate;

use crate::error::AppResult;
use crate::handlers::sources::{self, created, SaveVerificationsRequest};
use crate::query::StatsParams;
use crate::response::DataResponse;
use crate::state::AppState;

/// Body of `POST /controles/{id}/pv`.
#[derive(Debug, Deserialize, Validate)]
pub struct GeneratePvRequest {
    #[validate(length(min = 1, message = "at least one infraction is required"))]
    pub infractions: Vec<DbId>,
}

// ---------------------------------------------------------------------------
// Lifecycle
// ---------------------------------------------------------------------------

/// POST /api/v1/controles
///
/// Create a Control, optionally seeding `initial_options`. Seeding is best
/// effort; the per-entry outcomes are returned next to the record.
pub async fn create_controle(
    State(state): State<AppState>,
    body: Result<Json<CreateRequest<NewControle>>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    let Json(input) = body?;
    let result = state.services.lifecycle.create_controle(input).await?;

    Ok(created(result))
}

/// GET /api/v1/controles/{id}
pub async fn get_controle(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let controle = state.services.lifecycle.get_controle(id).await?;

    Ok(Json(DataResponse { data: controle }))
}

/// PATCH /api/v1/controles/{id}/statut
pub async fn change_controle_status(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    body: Result<Json<ChangeStatus>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    let Json(input) = body?;
    sources::change_status(&state, SourceType::Control, id, input).await
}

// ---------------------------------------------------------------------------
// Verifications
// ---------------------------------------------------------------------------

/// POST /api/v1/controles/{id}/verifications
pub async fn save_controle_verifications(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    body: Result<Json<SaveVerificationsRequest>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    let Json(input) = body?;
    sources::save_verifications(&state, SourceType::Control, id, input).await
}

/// GET /api/v1/controles/{id}/verifications
pub async fn list_controle_verifications(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    sources::list_verifications(&state, SourceType::Control, id).await
}

/// POST /api/v1/controles/{id}/verifications/refresh
pub async fn refresh_controle_counters(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    sources::refresh_counters(&state, SourceType::Control, id).await
}

// ---------------------------------------------------------------------------
// Infractions and PV
// ---------------------------------------------------------------------------

/// POST /api/v1/controles/{id}/infractions
pub async fn record_infraction(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    body: Result<Json<RecordInfraction>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    let Json(input) = body?;
    let infraction = state.services.pv.record_infraction(id, input).await?;

    Ok(created(infraction))
}

/// GET /api/v1/controles/{id}/infractions
pub async fn list_infractions(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let infractions = state.services.pv.list_infractions(id).await?;

    Ok(Json(DataResponse { data: infractions }))
}

/// POST /api/v1/controles/{id}/pv
///
/// Promote the listed infractions into a PV. Infractions that are unknown,
/// belong to another Control or are already in a PV are skipped; when none
/// remain the response is `400 NO_VALID_INFRACTIONS`.
pub async fn generate_pv(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    body: Result<Json<GeneratePvRequest>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    let Json(input) = body?;
    input.validate()?;

    let pv = state.services.pv.generate_pv(id, &input.infractions).await?;

    Ok(created(pv))
}

// ---------------------------------------------------------------------------
// Statistics
// ---------------------------------------------------------------------------

/// GET /api/v1/controles/statistiques
pub async fn controle_statistiques(
    State(state): State<AppState>,
    query: Result<Query<StatsParams>, QueryRejection>,
) -> AppResult<impl IntoResponse> {
    let Query(params) = query?;
    sources::statistiques(&state, StatsKind::Controles, params).await
}
