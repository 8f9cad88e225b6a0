//! Verification read/write path.

use std::collections::HashMap;
use std::sync::Arc;

use crate::catalog::{sort_check_items, CheckItem, CheckItemFilter};
use crate::clock::Clock;
use crate::error::CoreError;
use crate::lifecycle::{CachedCounters, SourceRecord, SourceStateUpdate};
use crate::store::Store;
use crate::types::DbId;

use super::{
    project_counters, resolve_fine, BatchVerificationResult, CheckOption, EntryOutcome,
    ListVerificationsResult, NewCheckOption, SourceType, VerificationEntry, VerificationView,
};

/// Catalog lookups and verification writes for Controls and Inspections.
#[derive(Clone)]
pub struct VerificationService {
    store: Arc<dyn Store>,
    clock: Arc<dyn Clock>,
}

impl VerificationService {
    pub fn new(store: Arc<dyn Store>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    // -----------------------------------------------------------------------
    // Catalog
    // -----------------------------------------------------------------------

    pub async fn list_check_items(
        &self,
        filter: &CheckItemFilter,
    ) -> Result<Vec<CheckItem>, CoreError> {
        let mut items = self.store.list_check_items(filter).await?;
        sort_check_items(&mut items);
        Ok(items)
    }

    pub async fn get_check_item(&self, id: DbId) -> Result<CheckItem, CoreError> {
        self.store
            .find_check_item(id)
            .await?
            .ok_or(CoreError::not_found("CheckItem", id))
    }

    pub async fn get_check_item_by_code(&self, code: &str) -> Result<CheckItem, CoreError> {
        self.store
            .find_check_item_by_code(code)
            .await?
            .ok_or_else(|| CoreError::NotFoundByKey {
                entity: "CheckItem",
                key: code.to_string(),
            })
    }

    // -----------------------------------------------------------------------
    // Writes
    // -----------------------------------------------------------------------

    /// Record one verification, replacing any previous answer to the same
    /// item for this source.
    pub async fn save_verification(
        &self,
        source_type: SourceType,
        source_id: DbId,
        entry: &VerificationEntry,
    ) -> Result<CheckOption, CoreError> {
        let item = self.get_check_item(entry.check_item_id).await?;
        if !item.applicable_to.allows(source_type) {
            return Err(CoreError::Validation(format!(
                "Check item {} applies to {} only, not {source_type}",
                item.code, item.applicable_to
            )));
        }
        let fine_amount = resolve_fine(&item, entry.result, entry.fine_override)?;

        let option = self
            .store
            .upsert_check_option(&NewCheckOption {
                source_type,
                source_id,
                check_item_id: item.id,
                result: entry.result,
                notes: entry.notes.clone(),
                fine_amount,
                checked_at: self.clock.now(),
                evidence_file_id: entry.evidence_file_id,
            })
            .await?;

        tracing::debug!(
            source_type = %source_type,
            source_id,
            check_item = %item.code,
            result = %option.result,
            fine_amount,
            "Verification saved",
        );
        Ok(option)
    }

    /// Replace the whole verification set of a source.
    ///
    /// The source must exist. Existing verifications are deleted, then each
    /// entry is saved on its own; an entry that fails is logged and reported
    /// in the outcomes without failing the call. Counters are recomputed and
    /// written onto the source before returning.
    pub async fn save_batch(
        &self,
        source_type: SourceType,
        source_id: DbId,
        entries: &[VerificationEntry],
    ) -> Result<BatchVerificationResult, CoreError> {
        self.require_source(source_type, source_id).await?;

        let deleted = self
            .store
            .delete_check_options(source_type, source_id)
            .await?;
        let outcomes = self.save_entries(source_type, source_id, entries).await;
        self.refresh_counters(source_type, source_id).await?;

        let result = BatchVerificationResult {
            verifications: self.list_for_source(source_type, source_id).await?,
            outcomes,
        };
        tracing::info!(
            source_type = %source_type,
            source_id,
            deleted,
            saved = entries.len() - result.failed_count(),
            failed = result.failed_count(),
            "Verifications replaced",
        );
        Ok(result)
    }

    /// Save each entry through the single-save path, best effort.
    pub(crate) async fn save_entries(
        &self,
        source_type: SourceType,
        source_id: DbId,
        entries: &[VerificationEntry],
    ) -> Vec<EntryOutcome> {
        let mut outcomes = Vec::with_capacity(entries.len());
        for (index, entry) in entries.iter().enumerate() {
            match self.save_verification(source_type, source_id, entry).await {
                Ok(_) => outcomes.push(EntryOutcome::succeeded(index, entry.check_item_id)),
                Err(e) => {
                    tracing::warn!(
                        source_type = %source_type,
                        source_id,
                        index,
                        check_item_id = entry.check_item_id,
                        error = %e,
                        "Skipping verification entry",
                    );
                    outcomes.push(EntryOutcome::failed(index, entry.check_item_id, &e));
                }
            }
        }
        outcomes
    }

    /// Recompute the cached counters of a source from its stored
    /// verifications.
    pub async fn refresh_counters(
        &self,
        source_type: SourceType,
        source_id: DbId,
    ) -> Result<SourceRecord, CoreError> {
        let counters = self.projected_counters(source_type, source_id).await?;
        self.store
            .update_source(
                source_type,
                source_id,
                &SourceStateUpdate {
                    statut: None,
                    counters: Some(counters),
                    observations: None,
                },
            )
            .await?
            .ok_or(CoreError::not_found(source_type.entity_name(), source_id))
    }

    pub(crate) async fn projected_counters(
        &self,
        source_type: SourceType,
        source_id: DbId,
    ) -> Result<CachedCounters, CoreError> {
        let options = self
            .store
            .list_check_options(source_type, source_id)
            .await?;
        Ok(project_counters(&options).into())
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    /// Verifications of a source joined with their catalog items, in
    /// checklist order, with counters.
    pub async fn get_by_source(
        &self,
        source_type: SourceType,
        source_id: DbId,
    ) -> Result<ListVerificationsResult, CoreError> {
        self.require_source(source_type, source_id).await?;
        self.list_for_source(source_type, source_id).await
    }

    async fn list_for_source(
        &self,
        source_type: SourceType,
        source_id: DbId,
    ) -> Result<ListVerificationsResult, CoreError> {
        let options = self
            .store
            .list_check_options(source_type, source_id)
            .await?;
        let counters = project_counters(&options);

        let items: HashMap<DbId, CheckItem> = self
            .store
            .list_check_items(&CheckItemFilter::default())
            .await?
            .into_iter()
            .map(|item| (item.id, item))
            .collect();

        let mut verifications = Vec::with_capacity(options.len());
        for option in options {
            match items.get(&option.check_item_id) {
                Some(item) => verifications.push(VerificationView {
                    check_item: item.clone(),
                    option,
                }),
                None => tracing::warn!(
                    check_option_id = option.id,
                    check_item_id = option.check_item_id,
                    "Verification references an unknown check item",
                ),
            }
        }
        verifications.sort_by(|a, b| {
            a.check_item
                .display_order
                .cmp(&b.check_item.display_order)
                .then_with(|| a.check_item.code.cmp(&b.check_item.code))
        });

        Ok(ListVerificationsResult {
            source_type,
            source_id,
            verifications,
            counters,
        })
    }

    async fn require_source(
        &self,
        source_type: SourceType,
        source_id: DbId,
    ) -> Result<SourceRecord, CoreError> {
        self.store
            .find_source(source_type, source_id)
            .await?
            .ok_or(CoreError::not_found(source_type.entity_name(), source_id))
    }
}
