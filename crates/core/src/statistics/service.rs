use std::sync::Arc;

use serde_json::{Map, Value};

use crate::error::CoreError;
use crate::store::Store;

use super::{aggregate, evolution, stats_map, StatsKind, StatsQuery};

/// Dashboard statistics over the store.
#[derive(Clone)]
pub struct StatsService {
    store: Arc<dyn Store>,
}

impl StatsService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Aggregate `kind` for the requested window and, when a period is given,
    /// compare it with the preceding window.
    pub async fn get_statistiques(
        &self,
        kind: StatsKind,
        query: &StatsQuery,
    ) -> Result<Map<String, Value>, CoreError> {
        if let (Some(debut), Some(fin)) = (query.date_debut, query.date_fin) {
            if debut > fin {
                return Err(CoreError::Validation(format!(
                    "date_debut ({debut}) must not be after date_fin ({fin})"
                )));
            }
        }

        let current = aggregate(kind, &self.store.tally(kind, &query.filter()).await?);

        let window = query.previous_window();
        let previous = match window {
            Some(window) => {
                let filter = query.with_window(window).filter();
                Some(aggregate(kind, &self.store.tally(kind, &filter).await?))
            }
            None => None,
        };

        tracing::debug!(
            kind = %kind,
            commissariat_id = ?query.commissariat_id,
            compared = previous.is_some(),
            "Statistics computed",
        );
        let evolution = evolution(&current, previous.as_ref());
        Ok(stats_map(&current, evolution, window))
    }
}
