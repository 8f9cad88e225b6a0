pub mod catalog;
pub mod controles;
pub mod health;
pub mod inspections;
pub mod pvs;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /check-items                                     list (filterable)
/// /check-items/{id}                                get by id
/// /check-items/code/{code}                         get by code
///
/// /controles                                       create
/// /controles/statistiques                          dashboard statistics
/// /controles/{id}                                  get
/// /controles/{id}/statut                           change status (PATCH)
/// /controles/{id}/verifications                    save batch, list
/// /controles/{id}/verifications/refresh            recompute counters
/// /controles/{id}/infractions                      record, list
/// /controles/{id}/pv                               generate PV
///
/// /inspections                                     create
/// /inspections/statistiques                        dashboard statistics
/// /inspections/{id}                                get
/// /inspections/{id}/statut                         change status (PATCH)
/// /inspections/{id}/verifications                  save batch, list
/// /inspections/{id}/verifications/refresh          recompute counters
///
/// /pvs/statistiques                                dashboard statistics
/// /pvs/{id}                                        get with infraction ids
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/check-items", catalog::router())
        .nest("/controles", controles::router())
        .nest("/inspections", inspections::router())
        .nest("/pvs", pvs::router())
}
