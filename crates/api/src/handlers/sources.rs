//! Request handling shared by Controls and Inspections.
//!
//! Both resources expose the same verification, status and statistics
//! endpoints; the per-resource handler modules pick the [`SourceType`] and
//! delegate here.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use patrouille_core::lifecycle::ChangeStatus;
use patrouille_core::statistics::StatsKind;
use patrouille_core::types::DbId;
use patrouille_core::verification::{SourceType, VerificationEntry};
use serde::Deserialize;

use crate::error::AppResult;
use crate::query::StatsParams;
use crate::response::DataResponse;
use crate::state::AppState;

/// Body of `POST .../verifications`: the full replacement set.
#[derive(Debug, Deserialize)]
pub struct SaveVerificationsRequest {
    pub verifications: Vec<VerificationEntry>,
}

pub(crate) async fn save_verifications(
    state: &AppState,
    source_type: SourceType,
    source_id: DbId,
    input: SaveVerificationsRequest,
) -> AppResult<impl IntoResponse> {
    let result = state
        .services
        .verifications
        .save_batch(source_type, source_id, &input.verifications)
        .await?;

    let failed = result.failed_count();
    if failed > 0 {
        tracing::warn!(
            source_type = %source_type,
            source_id,
            failed,
            "Verification batch saved with rejected entries",
        );
    }

    Ok(Json(DataResponse { data: result }))
}

pub(crate) async fn list_verifications(
    state: &AppState,
    source_type: SourceType,
    source_id: DbId,
) -> AppResult<impl IntoResponse> {
    let result = state
        .services
        .verifications
        .get_by_source(source_type, source_id)
        .await?;

    Ok(Json(DataResponse { data: result }))
}

pub(crate) async fn refresh_counters(
    state: &AppState,
    source_type: SourceType,
    source_id: DbId,
) -> AppResult<impl IntoResponse> {
    let record = state
        .services
        .verifications
        .refresh_counters(source_type, source_id)
        .await?;

    Ok(Json(DataResponse { data: record }))
}

pub(crate) async fn change_status(
    state: &AppState,
    source_type: SourceType,
    id: DbId,
    input: ChangeStatus,
) -> AppResult<impl IntoResponse> {
    let record = state
        .services
        .lifecycle
        .change_status(source_type, id, input)
        .await?;

    Ok(Json(DataResponse { data: record }))
}

pub(crate) async fn statistiques(
    state: &AppState,
    kind: StatsKind,
    params: StatsParams,
) -> AppResult<impl IntoResponse> {
    let query = params.into_query()?;
    let stats = state.services.stats.get_statistiques(kind, &query).await?;

    Ok(Json(DataResponse { data: stats }))
}

/// `201 Created` with the standard envelope.
pub(crate) fn created<T: serde::Serialize>(data: T) -> impl IntoResponse {
    (StatusCode::CREATED, Json(DataResponse { data }))
}
