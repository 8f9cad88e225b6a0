use axum::routing::{get, patch, post};
use axum::Router;

use crate::handlers::inspections;
use crate::state::AppState;

/// Inspection routes mounted at `/inspections`.
///
/// ```text
/// POST  /                                -> create_inspection
/// GET   /statistiques                    -> inspection_statistiques
/// GET   /{id}                            -> get_inspection
/// PATCH /{id}/statut                     -> change_inspection_status
/// POST  /{id}/verifications              -> save_inspection_verifications
/// GET   /{id}/verifications              -> list_inspection_verifications
/// POST  /{id}/verifications/refresh      -> refresh_inspection_counters
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(inspections::create_inspection))
        .route("/statistiques", get(inspections::inspection_statistiques))
        .route("/{id}", get(inspections::get_inspection))
        .route("/{id}/statut", patch(inspections::change_inspection_status))
        .route(
            "/{id}/verifications",
            get(inspections::list_inspection_verifications)
                .post(inspections::save_inspection_verifications),
        )
        .route(
            "/{id}/verifications/refresh",
            post(inspections::refresh_inspection_counters),
        )
}
