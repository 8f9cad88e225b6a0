use axum::routing::{get, patch, post};
use axum::Router;

use crate::handlers::controles;
use crate::state::AppState;

/// Control routes mounted at `/controles`.
///
/// ```text
/// POST  /                                -> create_controle
/// GET   /statistiques                    -> controle_statistiques
/// GET   /{id}                            -> get_controle
/// PATCH /{id}/statut                     -> change_controle_status
/// POST  /{id}/verifications              -> save_controle_verifications
/// GET   /{id}/verifications              -> list_controle_verifications
/// POST  /{id}/verifications/refresh      -> refresh_controle_counters
/// POST  /{id}/infractions                -> record_infraction
/// GET   /{id}/infractions                -> list_infractions
/// POST  /{id}/pv                         -> generate_pv
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(controles::create_controle))
        .route("/statistiques", get(controles::controle_statistiques))
        .route("/{id}", get(controles::get_controle))
        .route("/{id}/statut", patch(controles::change_controle_status))
        .route(
            "/{id}/verifications",
            get(controles::list_controle_verifications)
                .post(controles::save_controle_verifications),
        )
        .route(
            "/{id}/verifications/refresh",
            post(controles::refresh_controle_counters),
        )
        .route(
            "/{id}/infractions",
            get(controles::list_infractions).post(controles::record_infraction),
        )
        .route("/{id}/pv", post(controles::generate_pv))
}
