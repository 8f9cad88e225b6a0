//! Infraction recording and PV generation.

use std::sync::Arc;

use crate::clock::Clock;
use crate::error::CoreError;
use crate::store::Store;
use crate::types::DbId;
use crate::verification::{check_fine, SourceType, VerificationResult};

use super::{
    numero_pv, payment_deadline, select_infractions, Infraction, NewInfraction, NewProcesVerbal,
    PvSummary, RecordInfraction, PV_NUMBER_ATTEMPTS, PV_NUMBER_CONSTRAINT,
};

#[derive(Clone)]
pub struct PvService {
    store: Arc<dyn Store>,
    clock: Arc<dyn Clock>,
    payment_days: i64,
}

impl PvService {
    pub fn new(store: Arc<dyn Store>, clock: Arc<dyn Clock>, payment_days: i64) -> Self {
        Self {
            store,
            clock,
            payment_days,
        }
    }

    // -----------------------------------------------------------------------
    // Infractions
    // -----------------------------------------------------------------------

    /// Record an infraction on a Control.
    ///
    /// When derived from a verification, that verification must be a FAIL
    /// of the same Control not yet linked to an infraction; missing fields
    /// default from it and from its catalog item.
    pub async fn record_infraction(
        &self,
        controle_id: DbId,
        request: RecordInfraction,
    ) -> Result<Infraction, CoreError> {
        self.require_controle(controle_id).await?;

        let (libelle, montant_amende, points_retires) = match request.check_option_id {
            Some(option_id) => {
                let option = self
                    .store
                    .find_check_option(option_id)
                    .await?
                    .ok_or(CoreError::not_found("CheckOption", option_id))?;
                if option.source_type != SourceType::Control || option.source_id != controle_id {
                    return Err(CoreError::Validation(format!(
                        "Verification {option_id} does not belong to controle {controle_id}"
                    )));
                }
                if option.result != VerificationResult::Fail {
                    return Err(CoreError::Validation(format!(
                        "Verification {option_id} is {}, only FAIL can raise an infraction",
                        option.result
                    )));
                }
                if let Some(existing) = option.infraction_id {
                    return Err(CoreError::Conflict(format!(
                        "Verification {option_id} already raised infraction {existing}"
                    )));
                }
                let item = self
                    .store
                    .find_check_item(option.check_item_id)
                    .await?
                    .ok_or(CoreError::not_found("CheckItem", option.check_item_id))?;
                (
                    request.libelle.unwrap_or(item.name),
                    request.montant_amende.unwrap_or(option.fine_amount),
                    request.points_retires.unwrap_or(item.default_points),
                )
            }
            None => {
                let libelle = request
                    .libelle
                    .filter(|l| !l.trim().is_empty())
                    .ok_or_else(|| CoreError::Validation("libelle is required".to_string()))?;
                let montant = request.montant_amende.ok_or_else(|| {
                    CoreError::Validation("montant_amende is required".to_string())
                })?;
                (libelle, montant, request.points_retires.unwrap_or(0))
            }
        };
        let montant_amende = check_fine(montant_amende)?;
        if points_retires < 0 {
            return Err(CoreError::Validation(format!(
                "points_retires must be non-negative, got {points_retires}"
            )));
        }

        let infraction = self
            .store
            .create_infraction(&NewInfraction {
                controle_id,
                check_option_id: request.check_option_id,
                libelle,
                montant_amende,
                points_retires,
                date_infraction: request.date_infraction.unwrap_or_else(|| self.clock.now()),
            })
            .await?;

        if let Some(option_id) = request.check_option_id {
            if !self.store.link_infraction(option_id, infraction.id).await? {
                tracing::warn!(
                    check_option_id = option_id,
                    infraction_id = infraction.id,
                    "Verification was linked to another infraction concurrently",
                );
            }
        }

        tracing::info!(
            controle_id,
            infraction_id = infraction.id,
            montant_amende,
            "Infraction recorded",
        );
        Ok(infraction)
    }

    pub async fn list_infractions(&self, controle_id: DbId) -> Result<Vec<Infraction>, CoreError> {
        self.require_controle(controle_id).await?;
        self.store.list_infractions(controle_id).await
    }

    // -----------------------------------------------------------------------
    // PV
    // -----------------------------------------------------------------------

    /// Issue a PV for the requested infractions of a Control.
    ///
    /// Infractions that are unknown, belong to another Control, already sit
    /// in a PV or repeat in the request are skipped. If none survive, no PV
    /// is written.
    pub async fn generate_pv(
        &self,
        controle_id: DbId,
        infraction_ids: &[DbId],
    ) -> Result<PvSummary, CoreError> {
        self.require_controle(controle_id).await?;

        let mut lookup = Vec::with_capacity(infraction_ids.len());
        for &id in infraction_ids {
            lookup.push((id, self.store.find_infraction(id).await?));
        }
        let selection = select_infractions(controle_id, lookup);
        for (infraction_id, reason) in &selection.skipped {
            tracing::warn!(
                controle_id,
                infraction_id,
                reason = reason.as_str(),
                "Infraction left out of PV",
            );
        }
        if selection.kept.is_empty() {
            return Err(CoreError::NoValidInfractions);
        }

        let montant_total = selection.montant_total()?;
        let issued_at = self.clock.now();
        let kept_ids = selection.kept_ids();
        let mut input = NewProcesVerbal {
            numero_pv: String::new(),
            controle_id,
            montant_total,
            date_emission: issued_at,
            date_limite_paiement: payment_deadline(issued_at, self.payment_days),
            infraction_ids: kept_ids.clone(),
        };

        let mut attempt = 0;
        let pv = loop {
            input.numero_pv = numero_pv(self.clock.now(), attempt);
            match self.store.create_pv(&input).await {
                Ok(pv) => break pv,
                Err(CoreError::Conflict(msg))
                    if msg.contains(PV_NUMBER_CONSTRAINT) && attempt + 1 < PV_NUMBER_ATTEMPTS =>
                {
                    tracing::warn!(
                        controle_id,
                        numero_pv = %input.numero_pv,
                        attempt,
                        "PV number already taken, retrying",
                    );
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        };

        tracing::info!(
            controle_id,
            pv_id = pv.id,
            numero_pv = %pv.numero_pv,
            montant_total = pv.montant_total,
            infractions = kept_ids.len(),
            "PV generated",
        );
        Ok(PvSummary::new(pv, kept_ids))
    }

    pub async fn get_pv(&self, id: DbId) -> Result<PvSummary, CoreError> {
        let pv = self
            .store
            .find_pv(id)
            .await?
            .ok_or(CoreError::not_found("ProcesVerbal", id))?;
        let infraction_ids = self.store.list_pv_infraction_ids(id).await?;
        Ok(PvSummary::new(pv, infraction_ids))
    }

    async fn require_controle(&self, controle_id: DbId) -> Result<(), CoreError> {
        match self
            .store
            .find_source(SourceType::Control, controle_id)
            .await?
        {
            Some(_) => Ok(()),
            None => Err(CoreError::not_found("Controle", controle_id)),
        }
    }
}
