use axum::routing::get;
use axum::Router;

use crate::handlers::catalog;
use crate::state::AppState;

/// Catalog routes mounted at `/check-items`.
///
/// ```text
/// GET /                -> list_check_items
/// GET /{id}            -> get_check_item
/// GET /code/{code}     -> get_check_item_by_code
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(catalog::list_check_items))
        .route("/{id}", get(catalog::get_check_item))
        .route("/code/{code}", get(catalog::get_check_item_by_code))
}
