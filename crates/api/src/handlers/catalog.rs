//! Handlers for the read-only checklist catalog.

use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::Json;
use patrouille_core::catalog::CheckItemFilter;
use patrouille_core::types::DbId;

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/check-items
///
/// List catalog items in display order, filtered by
/// `applicable_to`, `category` and `active_only`.
pub async fn list_check_items(
    State(state): State<AppState>,
    query: Result<Query<CheckItemFilter>, QueryRejection>,
) -> AppResult<impl IntoResponse> {
    let Query(filter) = query?;
    let items = state.services.verifications.list_check_items(&filter).await?;

    Ok(Json(DataResponse { data: items }))
}

/// GET /api/v1/check-items/{id}
pub async fn get_check_item(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let item = state.services.verifications.get_check_item(id).await?;

    Ok(Json(DataResponse { data: item }))
}

/// GET /api/v1/check-items/code/{code}
pub async fn get_check_item_by_code(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> AppResult<impl IntoResponse> {
    let item = state
        .services
        .verifications
        .get_check_item_by_code(&code)
        .await?;

    Ok(Json(DataResponse { data: item }))
}
