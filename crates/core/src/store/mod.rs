//! Persistence seams of the verification workflow.
//!
//! Services only see these traits. `patrouille-db` implements them on
//! PostgreSQL; [`memory::MemoryStore`] implements them in process for tests
//! and local runs. Point lookups return `Ok(None)` when the row is absent;
//! unique-constraint violations surface as [`CoreError::Conflict`].

pub mod memory;

use async_trait::async_trait;

use crate::catalog::{CheckItem, CheckItemFilter};
use crate::error::CoreError;
use crate::lifecycle::{
    ControleRow, Controle, Inspection, InspectionRow, SourceRecord, SourceStateUpdate,
};
use crate::pv::{Infraction, NewInfraction, NewProcesVerbal, ProcesVerbal};
use crate::statistics::{StatsFilter, StatsKind, Tally};
use crate::types::DbId;
use crate::verification::{CheckOption, NewCheckOption, SourceType};

pub type StoreResult<T> = Result<T, CoreError>;

/// Read access to the checklist catalog.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn list_check_items(&self, filter: &CheckItemFilter) -> StoreResult<Vec<CheckItem>>;

    async fn find_check_item(&self, id: DbId) -> StoreResult<Option<CheckItem>>;

    async fn find_check_item_by_code(&self, code: &str) -> StoreResult<Option<CheckItem>>;
}

/// Verification results keyed by source.
#[async_trait]
pub trait VerificationStore: Send + Sync {
    /// Insert, replacing any row for the same source and item.
    async fn upsert_check_option(&self, input: &NewCheckOption) -> StoreResult<CheckOption>;

    /// Remove every verification of a source. Returns the number deleted.
    async fn delete_check_options(&self, source_type: SourceType, source_id: DbId)
        -> StoreResult<u64>;

    async fn list_check_options(
        &self,
        source_type: SourceType,
        source_id: DbId,
    ) -> StoreResult<Vec<CheckOption>>;

    async fn find_check_option(&self, id: DbId) -> StoreResult<Option<CheckOption>>;

    /// Link a failed verification to the infraction derived from it.
    async fn link_infraction(&self, check_option_id: DbId, infraction_id: DbId)
        -> StoreResult<bool>;
}

/// Control and Inspection records.
#[async_trait]
pub trait SourceStore: Send + Sync {
    async fn create_controle(&self, row: &ControleRow) -> StoreResult<Controle>;

    async fn create_inspection(&self, row: &InspectionRow) -> StoreResult<Inspection>;

    async fn find_source(
        &self,
        source_type: SourceType,
        id: DbId,
    ) -> StoreResult<Option<SourceRecord>>;

    /// Apply a state update; `None` when the record does not exist.
    async fn update_source(
        &self,
        source_type: SourceType,
        id: DbId,
        update: &SourceStateUpdate,
    ) -> StoreResult<Option<SourceRecord>>;
}

/// Infractions and PVs.
#[async_trait]
pub trait InfractionStore: Send + Sync {
    async fn create_infraction(&self, input: &NewInfraction) -> StoreResult<Infraction>;

    async fn find_infraction(&self, id: DbId) -> StoreResult<Option<Infraction>>;

    async fn list_infractions(&self, controle_id: DbId) -> StoreResult<Vec<Infraction>>;

    /// Persist a PV and attach its infractions as one unit.
    ///
    /// Attachment only claims infractions that have no PV yet; if any listed
    /// infraction was claimed in the meantime nothing is written and
    /// [`CoreError::Conflict`] is returned.
    async fn create_pv(&self, input: &NewProcesVerbal) -> StoreResult<ProcesVerbal>;

    async fn find_pv(&self, id: DbId) -> StoreResult<Option<ProcesVerbal>>;

    async fn list_pv_infraction_ids(&self, pv_id: DbId) -> StoreResult<Vec<DbId>>;
}

/// Aggregation reads for dashboards.
#[async_trait]
pub trait StatsStore: Send + Sync {
    async fn tally(&self, kind: StatsKind, filter: &StatsFilter) -> StoreResult<Tally>;
}

/// Everything the services need from persistence.
#[async_trait]
pub trait Store:
    CatalogStore + VerificationStore + SourceStore + InfractionStore + StatsStore
{
    /// Cheap liveness probe used by the health endpoint.
    async fn ping(&self) -> StoreResult<()>;
}
