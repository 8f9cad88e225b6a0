//! Handlers for technical Inspections.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::Json;
use patrouille_core::lifecycle::{ChangeStatus, CreateRequest, NewInspection};
use patrouille_core::statistics::StatsKind;
use patrouille_core::types::DbId;
use patrouille_core::verification::SourceType;

use crate::error::AppResult;
use crate::handlers::sources::{self, created, SaveVerificationsRequest};
use crate::query::StatsParams;
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /api/v1/inspections
pub async fn create_inspection(
    State(state): State<AppState>,
    body: Result<Json<CreateRequest<NewInspection>>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    let Json(input) = body?;
    let result = state.services.lifecycle.create_inspection(input).await?;

    Ok(created(result))
}

/// GET /api/v1/inspections/{id}
pub async fn get_inspection(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let inspection = state.services.lifecycle.get_inspection(id).await?;

    Ok(Json(DataResponse { data: inspection }))
}

/// PATCH /api/v1/inspections/{id}/statut
pub async fn change_inspection_status(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    body: Result<Json<ChangeStatus>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    let Json(input) = body?;
    sources::change_status(&state, SourceType::Inspection, id, input).await
}

/// POST /api/v1/inspections/{id}/verifications
pub async fn save_inspection_verifications(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    body: Result<Json<SaveVerificationsRequest>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    let Json(input) = body?;
    sources::save_verifications(&state, SourceType::Inspection, id, input).await
}

/// GET /api/v1/inspections/{id}/verifications
pub async fn list_inspection_verifications(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    sources::list_verifications(&state, SourceType::Inspection, id).await
}

/// POST /api/v1/inspections/{id}/verifications/refresh
pub async fn refresh_inspection_counters(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    sources::refresh_counters(&state, SourceType::Inspection, id).await
}

/// GET /api/v1/inspections/statistiques
pub async fn inspection_statistiques(
    State(state): State<AppState>,
    query: Result<Query<StatsParams>, QueryRejection>,
) -> AppResult<impl IntoResponse> {
    let Query(params) = query?;
    sources::statistiques(&state, StatsKind::Inspections, params).await
}
