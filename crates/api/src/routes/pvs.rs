use axum::routing::get;
use axum::Router;

use crate::handlers::pvs;
use crate::state::AppState;

/// PV routes mounted at `/pvs`.
///
/// ```text
/// GET /statistiques    -> pv_statistiques
/// GET /{id}            -> get_pv
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/statistiques", get(pvs::pv_statistiques))
        .route("/{id}", get(pvs::get_pv))
}
