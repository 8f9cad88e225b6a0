use patrouille_core::services::Services;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheap to clone: every service holds `Arc`s to the store and clock.
#[derive(Clone)]
pub struct AppState {
    /// Domain services wired over the configured store.
    pub services: Services,
}
