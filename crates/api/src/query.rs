//! Shared query parameter types for API handlers.

use patrouille_core::error::CoreError;
use patrouille_core::statistics::{parse_date_bound, Periode, StatsQuery};
use patrouille_core::types::DbId;
use serde::Deserialize;

/// Query parameters of the `/statistiques` endpoints
/// (`?commissariat_id=&date_debut=&date_fin=&periode=`).
///
/// Dates are kept as strings so a malformed value surfaces as a
/// `VALIDATION_ERROR` body rather than an extractor rejection.
#[derive(Debug, Default, Deserialize)]
pub struct StatsParams {
    pub commissariat_id: Option<DbId>,
    pub date_debut: Option<String>,
    pub date_fin: Option<String>,
    pub periode: Option<String>,
}

impl StatsParams {
    /// Parse into a [`StatsQuery`]. Blank values count as absent.
    pub fn into_query(self) -> Result<StatsQuery, CoreError> {
        let date_debut = non_blank(self.date_debut)
            .map(|raw| parse_date_bound(&raw, false))
            .transpose()?;
        let date_fin = non_blank(self.date_fin)
            .map(|raw| parse_date_bound(&raw, true))
            .transpose()?;

        Ok(StatsQuery {
            commissariat_id: self.commissariat_id,
            date_debut,
            date_fin,
            periode: non_blank(self.periode).map(|p| Periode::parse(&p)),
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn blank_values_are_ignored() {
        let query = StatsParams {
            commissariat_id: Some(4),
            date_debut: Some(" ".into()),
            date_fin: None,
            periode: Some(String::new()),
        }
        .into_query()
        .unwrap();

        assert_eq!(query.commissariat_id, Some(4));
        assert!(query.date_debut.is_none());
        assert!(query.periode.is_none());
    }

    #[test]
    fn bare_end_date_covers_the_whole_day() {
        let query = StatsParams {
            date_debut: Some("2024-03-01".into()),
            date_fin: Some("2024-03-31".into()),
            periode: Some("mois".into()),
            ..Default::default()
        }
        .into_query()
        .unwrap();

        assert_eq!(
            query.date_fin.unwrap().to_rfc3339(),
            "2024-03-31T23:59:59+00:00"
        );
        assert_eq!(query.periode, Some(Periode::Mois));
    }

    #[test]
    fn malformed_date_is_a_validation_error() {
        let params = StatsParams {
            date_debut: Some("31/03/2024".into()),
            ..Default::default()
        };
        assert_matches!(params.into_query(), Err(CoreError::Validation(_)));
    }
}
