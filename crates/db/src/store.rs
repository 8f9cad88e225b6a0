//! [`Store`] implementation over the PostgreSQL repositories.

use async_trait::async_trait;
use patrouille_core::catalog::{CheckItem, CheckItemFilter};
use patrouille_core::error::CoreError;
use patrouille_core::lifecycle::{
    Controle, ControleRow, Inspection, InspectionRow, SourceRecord, SourceStateUpdate,
};
use patrouille_core::pv::{Infraction, NewInfraction, NewProcesVerbal, ProcesVerbal};
use patrouille_core::statistics::{StatsFilter, StatsKind, Tally};
use patrouille_core::store::{
    CatalogStore, InfractionStore, SourceStore, StatsStore, Store, StoreResult, VerificationStore,
};
use patrouille_core::types::DbId;
use patrouille_core::verification::{CheckOption, NewCheckOption, SourceType};

use crate::error::classify_sqlx_error;
use crate::repositories::{
    CheckItemRepo, CheckOptionRepo, ControleRepo, InfractionRepo, InspectionRepo, PvRepo,
    StatsRepo,
};
use crate::DbPool;

/// PostgreSQL-backed store. Cheap to clone.
#[derive(Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn convert_all<R, T>(rows: Vec<R>) -> StoreResult<Vec<T>>
where
    T: TryFrom<R, Error = CoreError>,
{
    rows.into_iter().map(T::try_from).collect()
}

fn convert_opt<R, T>(row: Option<R>) -> StoreResult<Option<T>>
where
    T: TryFrom<R, Error = CoreError>,
{
    row.map(T::try_from).transpose()
}

#[async_trait]
impl CatalogStore for PgStore {
    async fn list_check_items(&self, filter: &CheckItemFilter) -> StoreResult<Vec<CheckItem>> {
        let rows = CheckItemRepo::list(&self.pool, filter)
            .await
            .map_err(classify_sqlx_error)?;
        convert_all(rows)
    }

    async fn find_check_item(&self, id: DbId) -> StoreResult<Option<CheckItem>> {
        let row = CheckItemRepo::find_by_id(&self.pool, id)
            .await
            .map_err(classify_sqlx_error)?;
        convert_opt(row)
    }

    async fn find_check_item_by_code(&self, code: &str) -> StoreResult<Option<CheckItem>> {
        let row = CheckItemRepo::find_by_code(&self.pool, code)
            .await
            .map_err(classify_sqlx_error)?;
        convert_opt(row)
    }
}

#[async_trait]
impl VerificationStore for PgStore {
    async fn upsert_check_option(&self, input: &NewCheckOption) -> StoreResult<CheckOption> {
        CheckOptionRepo::upsert(&self.pool, input)
            .await
            .map_err(classify_sqlx_error)?
            .try_into()
    }

    async fn delete_check_options(
        &self,
        source_type: SourceType,
        source_id: DbId,
    ) -> StoreResult<u64> {
        CheckOptionRepo::delete_by_source(&self.pool, source_type, source_id)
            .await
            .map_err(classify_sqlx_error)
    }

    async fn list_check_options(
        &self,
        source_type: SourceType,
        source_id: DbId,
    ) -> StoreResult<Vec<CheckOption>> {
        let rows = CheckOptionRepo::list_by_source(&self.pool, source_type, source_id)
            .await
            .map_err(classify_sqlx_error)?;
        convert_all(rows)
    }

    async fn find_check_option(&self, id: DbId) -> StoreResult<Option<CheckOption>> {
        let row = CheckOptionRepo::find_by_id(&self.pool, id)
            .await
            .map_err(classify_sqlx_error)?;
        convert_opt(row)
    }

    async fn link_infraction(&self, check_option_id: DbId, infraction_id: DbId) -> StoreResult<bool> {
        CheckOptionRepo::link_infraction(&self.pool, check_option_id, infraction_id)
            .await
            .map_err(classify_sqlx_error)
    }
}

#[async_trait]
impl SourceStore for PgStore {
    async fn create_controle(&self, row: &ControleRow) -> StoreResult<Controle> {
        ControleRepo::create(&self.pool, row)
            .await
            .map_err(classify_sqlx_error)?
            .try_into()
    }

    async fn create_inspection(&self, row: &InspectionRow) -> StoreResult<Inspection> {
        InspectionRepo::create(&self.pool, row)
            .await
            .map_err(classify_sqlx_error)?
            .try_into()
    }

    async fn find_source(
        &self,
        source_type: SourceType,
        id: DbId,
    ) -> StoreResult<Option<SourceRecord>> {
        match source_type {
            SourceType::Control => {
                let row = ControleRepo::find_by_id(&self.pool, id)
                    .await
                    .map_err(classify_sqlx_error)?;
                Ok(convert_opt::<_, Controle>(row)?.map(SourceRecord::Controle))
            }
            SourceType::Inspection => {
                let row = InspectionRepo::find_by_id(&self.pool, id)
                    .await
                    .map_err(classify_sqlx_error)?;
                Ok(convert_opt::<_, Inspection>(row)?.map(SourceRecord::Inspection))
            }
        }
    }

    async fn update_source(
        &self,
        source_type: SourceType,
        id: DbId,
        update: &SourceStateUpdate,
    ) -> StoreResult<Option<SourceRecord>> {
        match source_type {
            SourceType::Control => {
                let row = ControleRepo::update_state(&self.pool, id, update)
                    .await
                    .map_err(classify_sqlx_error)?;
                Ok(convert_opt::<_, Controle>(row)?.map(SourceRecord::Controle))
            }
            SourceType::Inspection => {
                let row = InspectionRepo::update_state(&self.pool, id, update)
                    .await
                    .map_err(classify_sqlx_error)?;
                Ok(convert_opt::<_, Inspection>(row)?.map(SourceRecord::Inspection))
            }
        }
    }
}

#[async_trait]
impl InfractionStore for PgStore {
    async fn create_infraction(&self, input: &NewInfraction) -> StoreResult<Infraction> {
        InfractionRepo::create(&self.pool, input)
            .await
            .map(Infraction::from)
            .map_err(classify_sqlx_error)
    }

    async fn find_infraction(&self, id: DbId) -> StoreResult<Option<Infraction>> {
        InfractionRepo::find_by_id(&self.pool, id)
            .await
            .map(|row| row.map(Infraction::from))
            .map_err(classify_sqlx_error)
    }

    async fn list_infractions(&self, controle_id: DbId) -> StoreResult<Vec<Infraction>> {
        InfractionRepo::list_by_controle(&self.pool, controle_id)
            .await
            .map(|rows| rows.into_iter().map(Infraction::from).collect())
            .map_err(classify_sqlx_error)
    }

    async fn create_pv(&self, input: &NewProcesVerbal) -> StoreResult<ProcesVerbal> {
        match PvRepo::create_with_infractions(&self.pool, input)
            .await
            .map_err(classify_sqlx_error)?
        {
            Some(row) => row.try_into(),
            None => Err(CoreError::Conflict(
                "An infraction was attached to another PV concurrently".to_string(),
            )),
        }
    }

    async fn find_pv(&self, id: DbId) -> StoreResult<Option<ProcesVerbal>> {
        let row = PvRepo::find_by_id(&self.pool, id)
            .await
            .map_err(classify_sqlx_error)?;
        convert_opt(row)
    }

    async fn list_pv_infraction_ids(&self, pv_id: DbId) -> StoreResult<Vec<DbId>> {
        InfractionRepo::list_ids_by_pv(&self.pool, pv_id)
            .await
            .map_err(classify_sqlx_error)
    }
}

#[async_trait]
impl StatsStore for PgStore {
    async fn tally(&self, kind: StatsKind, filter: &StatsFilter) -> StoreResult<Tally> {
        let rows = StatsRepo::totals_by_status(&self.pool, kind, filter)
            .await
            .map_err(classify_sqlx_error)?;
        let mut tally = Tally::default();
        for (statut, count, montant) in rows {
            tally.by_status.insert(statut, count);
            tally.montant = tally.montant.saturating_add(montant);
        }
        Ok(tally)
    }
}

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> StoreResult<()> {
        crate::health_check(&self.pool)
            .await
            .map_err(classify_sqlx_error)
    }
}
