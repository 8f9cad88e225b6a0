//! Creation and status changes of Controls and Inspections.

use std::sync::Arc;

use crate::clock::Clock;
use crate::error::CoreError;
use crate::store::Store;
use crate::types::DbId;
use crate::verification::service::VerificationService;
use crate::verification::{SourceType, VerificationEntry};

use super::{
    default_reference, validate_transition, ChangeStatus, Controle, ControleRow, CreateRequest,
    CreatedSource, Inspection, InspectionRow, NewControle, NewInspection, SourceRecord,
    SourceStateUpdate, SourceStatus, VehicleSnapshot,
};

#[derive(Clone)]
pub struct LifecycleService {
    store: Arc<dyn Store>,
    clock: Arc<dyn Clock>,
    verifications: VerificationService,
}

impl LifecycleService {
    pub fn new(
        store: Arc<dyn Store>,
        clock: Arc<dyn Clock>,
        verifications: VerificationService,
    ) -> Self {
        Self {
            store,
            clock,
            verifications,
        }
    }

    /// Create a Control, then seed its initial verifications best effort.
    ///
    /// The insert itself is the only hard failure; a rejected seed entry is
    /// reported in the outcomes and never removes the created record.
    pub async fn create_controle(
        &self,
        request: CreateRequest<NewControle>,
    ) -> Result<CreatedSource, CoreError> {
        validate_vehicle(&request.record.vehicule)?;
        let now = self.clock.now();
        let row = ControleRow {
            reference: non_blank(request.record.reference.as_deref())
                .unwrap_or_else(|| default_reference(SourceType::Control, now)),
            date_controle: request.record.date_controle.unwrap_or(now),
            statut: SourceStatus::initial(SourceType::Control),
            input: request.record,
        };
        let controle = self.store.create_controle(&row).await?;
        tracing::info!(
            controle_id = controle.id,
            reference = %controle.reference,
            immatriculation = %controle.vehicule.vehicule_immatriculation,
            "Controle created",
        );

        self.seed(SourceType::Control, controle.id, request.initial_options)
            .await
    }

    /// Create an Inspection, then seed its initial verifications best effort.
    pub async fn create_inspection(
        &self,
        request: CreateRequest<NewInspection>,
    ) -> Result<CreatedSource, CoreError> {
        validate_vehicle(&request.record.vehicule)?;
        let now = self.clock.now();
        let row = InspectionRow {
            reference: non_blank(request.record.reference.as_deref())
                .unwrap_or_else(|| default_reference(SourceType::Inspection, now)),
            date_inspection: request.record.date_inspection.unwrap_or(now),
            statut: SourceStatus::initial(SourceType::Inspection),
            input: request.record,
        };
        let inspection = self.store.create_inspection(&row).await?;
        tracing::info!(
            inspection_id = inspection.id,
            reference = %inspection.reference,
            immatriculation = %inspection.vehicule.vehicule_immatriculation,
            "Inspection created",
        );

        self.seed(SourceType::Inspection, inspection.id, request.initial_options)
            .await
    }

    async fn seed(
        &self,
        source_type: SourceType,
        source_id: DbId,
        entries: Vec<VerificationEntry>,
    ) -> Result<CreatedSource, CoreError> {
        let outcomes = self
            .verifications
            .save_entries(source_type, source_id, &entries)
            .await;
        let failed = outcomes.iter().filter(|o| !o.ok).count();
        if failed > 0 {
            tracing::warn!(
                source_type = %source_type,
                source_id,
                failed,
                "Some initial verifications were not saved",
            );
        }
        let record = self
            .verifications
            .refresh_counters(source_type, source_id)
            .await?;
        Ok(CreatedSource { record, outcomes })
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    pub async fn get_source(
        &self,
        source_type: SourceType,
        id: DbId,
    ) -> Result<SourceRecord, CoreError> {
        self.store
            .find_source(source_type, id)
            .await?
            .ok_or(CoreError::not_found(source_type.entity_name(), id))
    }

    pub async fn get_controle(&self, id: DbId) -> Result<Controle, CoreError> {
        match self.get_source(SourceType::Control, id).await? {
            SourceRecord::Controle(c) => Ok(c),
            SourceRecord::Inspection(_) => Err(CoreError::not_found("Controle", id)),
        }
    }

    pub async fn get_inspection(&self, id: DbId) -> Result<Inspection, CoreError> {
        match self.get_source(SourceType::Inspection, id).await? {
            SourceRecord::Inspection(i) => Ok(i),
            SourceRecord::Controle(_) => Err(CoreError::not_found("Inspection", id)),
        }
    }

    // -----------------------------------------------------------------------
    // Status
    // -----------------------------------------------------------------------

    /// Move a record to a new status.
    ///
    /// Counters are always recomputed from the stored verifications; values
    /// sent by the caller are only compared against the projection.
    pub async fn change_status(
        &self,
        source_type: SourceType,
        id: DbId,
        request: ChangeStatus,
    ) -> Result<SourceRecord, CoreError> {
        let current = self.get_source(source_type, id).await?;
        let from = current.statut();
        validate_transition(source_type, from, request.statut)?;

        let projected = self
            .verifications
            .projected_counters(source_type, id)
            .await?;
        if let Some(supplied) = request.supplied_counters() {
            if !supplied.agrees_with(&projected) {
                tracing::warn!(
                    source_type = %source_type,
                    source_id = id,
                    supplied = ?supplied,
                    projected = ?projected,
                    "Caller counters disagree with stored verifications; using stored",
                );
            }
        }

        let updated = self
            .store
            .update_source(
                source_type,
                id,
                &SourceStateUpdate {
                    statut: Some(request.statut),
                    counters: Some(projected),
                    observations: request.observations,
                },
            )
            .await?
            .ok_or(CoreError::not_found(source_type.entity_name(), id))?;

        tracing::info!(
            source_type = %source_type,
            source_id = id,
            from = %from,
            to = %request.statut,
            "Status changed",
        );
        Ok(updated)
    }
}

fn validate_vehicle(vehicule: &VehicleSnapshot) -> Result<(), CoreError> {
    if vehicule.vehicule_immatriculation.trim().is_empty() {
        return Err(CoreError::Validation(
            "vehicule_immatriculation must not be empty".to_string(),
        ));
    }
    Ok(())
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
