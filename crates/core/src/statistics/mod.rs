//! Dashboard statistics and period-over-period evolution.
//!
//! The aggregation itself is a pure function of the per-status tally the
//! store returns for a filter. Evolution compares two such aggregates: the
//! requested window and the window that immediately precedes it.

pub mod service;

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, FixedOffset, Months, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::codes::define_code_enum;
use crate::error::CoreError;
use crate::lifecycle::SourceStatus;
use crate::pv::PvStatus;
use crate::types::{Amount, DbId, Timestamp};

define_code_enum! {
    /// Which records a statistics request aggregates.
    StatsKind {
        Controles = "CONTROLES",
        Inspections = "INSPECTIONS",
        ProcesVerbaux = "PROCES_VERBAUX",
    }
}

impl StatsKind {
    /// Status codes reported as individual counts, in output order.
    pub fn status_codes(self) -> Vec<&'static str> {
        match self {
            StatsKind::Controles => [
                SourceStatus::EnCours,
                SourceStatus::Termine,
                SourceStatus::Conforme,
                SourceStatus::NonConforme,
            ]
            .iter()
            .map(|s| s.as_str())
            .collect(),
            StatsKind::Inspections => SourceStatus::ALL.iter().map(|s| s.as_str()).collect(),
            StatsKind::ProcesVerbaux => PvStatus::ALL.iter().map(|s| s.as_str()).collect(),
        }
    }

    /// Output key of the summed amount.
    pub fn amount_key(self) -> &'static str {
        match self {
            StatsKind::Controles | StatsKind::Inspections => "montant_total_amendes",
            StatsKind::ProcesVerbaux => "montant_total",
        }
    }

    /// The headline rate: output key and the status counted in its numerator.
    pub fn rate(self) -> (&'static str, &'static str) {
        match self {
            StatsKind::Controles | StatsKind::Inspections => {
                ("taux_conformite", SourceStatus::Conforme.as_str())
            }
            StatsKind::ProcesVerbaux => ("taux_paiement", PvStatus::Paye.as_str()),
        }
    }
}

/// The period token of a statistics request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Periode {
    Jour,
    Semaine,
    Mois,
    Annee,
    /// Any other token: compare with the same window one year earlier.
    Autre(String),
}

impl Periode {
    pub fn parse(token: &str) -> Self {
        match token.trim().to_lowercase().as_str() {
            "jour" => Periode::Jour,
            "semaine" => Periode::Semaine,
            "mois" => Periode::Mois,
            "annee" | "année" => Periode::Annee,
            _ => Periode::Autre(token.to_string()),
        }
    }
}

/// A closed time window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Window {
    pub debut: DateTime<FixedOffset>,
    pub fin: DateTime<FixedOffset>,
}

/// Filter handed to the store for one aggregation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsFilter {
    pub commissariat_id: Option<DbId>,
    pub date_debut: Option<Timestamp>,
    pub date_fin: Option<Timestamp>,
}

impl StatsFilter {
    pub fn contains(&self, at: Timestamp) -> bool {
        self.date_debut.map_or(true, |d| at >= d) && self.date_fin.map_or(true, |f| at <= f)
    }
}

/// A statistics request as received from the HTTP layer.
#[derive(Debug, Clone, Default)]
pub struct StatsQuery {
    pub commissariat_id: Option<DbId>,
    pub date_debut: Option<DateTime<FixedOffset>>,
    pub date_fin: Option<DateTime<FixedOffset>>,
    pub periode: Option<Periode>,
}

impl StatsQuery {
    pub fn filter(&self) -> StatsFilter {
        StatsFilter {
            commissariat_id: self.commissariat_id,
            date_debut: self.date_debut.map(|d| d.with_timezone(&Utc)),
            date_fin: self.date_fin.map(|d| d.with_timezone(&Utc)),
        }
    }

    /// The preceding window, when a period and both bounds were supplied.
    pub fn previous_window(&self) -> Option<Window> {
        match (&self.periode, self.date_debut, self.date_fin) {
            (Some(periode), Some(debut), Some(fin)) => previous_window(periode, debut, fin),
            _ => None,
        }
    }

    pub fn with_window(&self, window: Window) -> StatsQuery {
        StatsQuery {
            commissariat_id: self.commissariat_id,
            date_debut: Some(window.debut),
            date_fin: Some(window.fin),
            periode: None,
        }
    }
}

/// Raw per-status counts and amount sum returned by the store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tally {
    pub by_status: BTreeMap<String, i64>,
    pub montant: Amount,
}

/// Aggregated metrics for one window.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Aggregate {
    pub counts: BTreeMap<String, i64>,
    pub rates: BTreeMap<String, f64>,
}

/// Percentage rounded to one decimal; zero when there is nothing to divide.
pub fn rate(numerator: i64, total: i64) -> f64 {
    if total <= 0 {
        return 0.0;
    }
    round1(numerator as f64 / total as f64 * 100.0)
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Build the metrics of `kind` from a store tally.
pub fn aggregate(kind: StatsKind, tally: &Tally) -> Aggregate {
    let mut counts = BTreeMap::new();
    let total: i64 = tally.by_status.values().sum();
    counts.insert("total".to_string(), total);
    for code in kind.status_codes() {
        let n = tally.by_status.get(code).copied().unwrap_or(0);
        counts.insert(code.to_lowercase(), n);
    }
    counts.insert(kind.amount_key().to_string(), tally.montant);

    let (rate_key, numerator) = kind.rate();
    let numerator = tally.by_status.get(numerator).copied().unwrap_or(0);
    let mut rates = BTreeMap::new();
    rates.insert(rate_key.to_string(), rate(numerator, total));

    Aggregate { counts, rates }
}

/// Signed integer delta: `+N`, `-N`, or `0`.
pub fn format_count_delta(delta: i64) -> String {
    match delta {
        0 => "0".to_string(),
        d if d > 0 => format!("+{d}"),
        d => d.to_string(),
    }
}

/// Signed one-decimal delta: `+N.N`, `-N.N`, or `0`.
pub fn format_rate_delta(delta: f64) -> String {
    let delta = round1(delta);
    if delta == 0.0 || delta.is_nan() {
        "0".to_string()
    } else if delta > 0.0 {
        format!("+{delta:.1}")
    } else {
        format!("{delta:.1}")
    }
}

/// `evolution_<metric>` for every metric of `current`. Without a previous
/// aggregate every field is `"0"`.
pub fn evolution(current: &Aggregate, previous: Option<&Aggregate>) -> BTreeMap<String, String> {
    let mut out = BTreeMap::new();
    for (key, value) in &current.counts {
        let delta = previous
            .map(|p| value - p.counts.get(key).copied().unwrap_or(0))
            .unwrap_or(0);
        out.insert(format!("evolution_{key}"), format_count_delta(delta));
    }
    for (key, value) in &current.rates {
        let delta = previous
            .map(|p| value - p.rates.get(key).copied().unwrap_or(0.0))
            .unwrap_or(0.0);
        out.insert(format!("evolution_{key}"), format_rate_delta(delta));
    }
    out
}

/// Flatten metrics, evolution and the compared window into the response map.
pub fn stats_map(
    current: &Aggregate,
    evolution: BTreeMap<String, String>,
    previous_window: Option<Window>,
) -> Map<String, Value> {
    let mut map = Map::new();
    for (key, value) in &current.counts {
        map.insert(key.clone(), Value::from(*value));
    }
    for (key, value) in &current.rates {
        map.insert(key.clone(), Value::from(*value));
    }
    for (key, value) in evolution {
        map.insert(key, Value::String(value));
    }
    if let Some(window) = previous_window {
        map.insert(
            "periode_precedente".to_string(),
            serde_json::json!({
                "date_debut": window.debut.to_rfc3339(),
                "date_fin": window.fin.to_rfc3339(),
            }),
        );
    }
    map
}

// ---------------------------------------------------------------------------
// Window arithmetic
// ---------------------------------------------------------------------------

fn at_local(offset: FixedOffset, naive: NaiveDateTime) -> Option<DateTime<FixedOffset>> {
    offset.from_local_datetime(&naive).single()
}

fn start_of(offset: FixedOffset, date: NaiveDate) -> Option<DateTime<FixedOffset>> {
    at_local(offset, date.and_time(chrono::NaiveTime::MIN))
}

/// Compute the window preceding `[debut, fin]` for `periode`, in the offset
/// of `debut`.
///
/// - `Jour`: the previous calendar day, 00:00:00 to 23:59:59.
/// - `Semaine`: `[debut - 7d, debut - 1s]`.
/// - `Mois`: the full calendar month before the month of `debut`.
/// - `Annee`: the full calendar year before the year of `debut`.
/// - `Autre`: both bounds shifted back one year (Feb 29 clamps to Feb 28).
pub fn previous_window(
    periode: &Periode,
    debut: DateTime<FixedOffset>,
    fin: DateTime<FixedOffset>,
) -> Option<Window> {
    let offset = *debut.offset();
    let one_second = chrono::Duration::seconds(1);
    let date = debut.date_naive();

    let window = match periode {
        Periode::Jour => {
            let today = start_of(offset, date)?;
            Window {
                debut: today - chrono::Duration::days(1),
                fin: today - one_second,
            }
        }
        Periode::Semaine => Window {
            debut: debut - chrono::Duration::days(7),
            fin: debut - one_second,
        },
        Periode::Mois => {
            let first = date.with_day(1)?;
            let previous_first = first.checked_sub_months(Months::new(1))?;
            Window {
                debut: start_of(offset, previous_first)?,
                fin: start_of(offset, first)? - one_second,
            }
        }
        Periode::Annee => {
            let jan1 = NaiveDate::from_ymd_opt(date.year(), 1, 1)?;
            let previous_jan1 = NaiveDate::from_ymd_opt(date.year() - 1, 1, 1)?;
            Window {
                debut: start_of(offset, previous_jan1)?,
                fin: start_of(offset, jan1)? - one_second,
            }
        }
        Periode::Autre(_) => Window {
            debut: debut.checked_sub_months(Months::new(12))?,
            fin: fin.checked_sub_months(Months::new(12))?,
        },
    };
    Some(window)
}

/// Parse a query-string date bound.
///
/// Accepts RFC 3339 (`2024-03-01T00:00:00+01:00`) or a bare date
/// (`2024-03-01`), read as UTC. A bare end date covers the whole day.
pub fn parse_date_bound(raw: &str, end_of_day: bool) -> Result<DateTime<FixedOffset>, CoreError> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt);
    }
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| {
        CoreError::Validation(format!(
            "Invalid date '{raw}'. Expected YYYY-MM-DD or an RFC 3339 timestamp"
        ))
    })?;
    let utc = FixedOffset::east_opt(0)
        .ok_or_else(|| CoreError::Internal("UTC offset unavailable".to_string()))?;
    let time = if end_of_day {
        chrono::NaiveTime::from_hms_opt(23, 59, 59)
    } else {
        Some(chrono::NaiveTime::MIN)
    };
    time.and_then(|t| at_local(utc, date.and_time(t)))
        .ok_or_else(|| CoreError::Validation(format!("Date '{raw}' is out of range")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn dt(raw: &str) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(raw).unwrap()
    }

    fn window(periode: Periode, debut: &str, fin: &str) -> Window {
        previous_window(&periode, dt(debut), dt(fin)).unwrap()
    }

    #[test]
    fn mois_resolves_to_leap_february() {
        let w = window(Periode::Mois, "2024-03-01T00:00:00Z", "2024-03-31T23:59:59Z");
        assert_eq!(w.debut, dt("2024-02-01T00:00:00Z"));
        assert_eq!(w.fin, dt("2024-02-29T23:59:59Z"));
    }

    #[test]
    fn mois_handles_thirty_day_and_year_boundaries() {
        let w = window(Periode::Mois, "2023-05-15T10:00:00Z", "2023-05-31T23:59:59Z");
        assert_eq!(w.debut, dt("2023-04-01T00:00:00Z"));
        assert_eq!(w.fin, dt("2023-04-30T23:59:59Z"));

        let w = window(Periode::Mois, "2024-01-01T00:00:00Z", "2024-01-31T23:59:59Z");
        assert_eq!(w.debut, dt("2023-12-01T00:00:00Z"));
        assert_eq!(w.fin, dt("2023-12-31T23:59:59Z"));

        let w = window(Periode::Mois, "2023-03-01T00:00:00Z", "2023-03-31T23:59:59Z");
        assert_eq!(w.fin, dt("2023-02-28T23:59:59Z"));
    }

    #[test]
    fn jour_crosses_new_year() {
        let w = window(Periode::Jour, "2024-01-01T00:00:00Z", "2024-01-01T23:59:59Z");
        assert_eq!(w.debut, dt("2023-12-31T00:00:00Z"));
        assert_eq!(w.fin, dt("2023-12-31T23:59:59Z"));
    }

    #[test]
    fn jour_keeps_the_offset_of_debut() {
        let w = window(
            Periode::Jour,
            "2024-03-10T14:00:00+01:00",
            "2024-03-10T18:00:00+01:00",
        );
        assert_eq!(w.debut, dt("2024-03-09T00:00:00+01:00"));
        assert_eq!(w.fin, dt("2024-03-09T23:59:59+01:00"));
        assert_eq!(w.debut.offset().local_minus_utc(), 3600);
    }

    #[test]
    fn semaine_is_the_seven_days_before_debut() {
        let w = window(Periode::Semaine, "2024-03-04T00:00:00Z", "2024-03-10T23:59:59Z");
        assert_eq!(w.debut, dt("2024-02-26T00:00:00Z"));
        assert_eq!(w.fin, dt("2024-03-03T23:59:59Z"));
    }

    #[test]
    fn annee_covers_the_full_leap_year() {
        let w = window(Periode::Annee, "2025-01-01T00:00:00Z", "2025-12-31T23:59:59Z");
        assert_eq!(w.debut, dt("2024-01-01T00:00:00Z"));
        assert_eq!(w.fin, dt("2024-12-31T23:59:59Z"));
        assert_eq!((w.fin - w.debut).num_days(), 365);
    }

    #[test]
    fn unknown_token_shifts_both_bounds_by_a_year() {
        let w = window(
            Periode::parse("trimestre"),
            "2024-02-29T00:00:00Z",
            "2024-05-31T23:59:59Z",
        );
        assert_eq!(w.debut, dt("2023-02-28T00:00:00Z"));
        assert_eq!(w.fin, dt("2023-05-31T23:59:59Z"));
    }

    #[test]
    fn periode_tokens_parse() {
        assert_eq!(Periode::parse("jour"), Periode::Jour);
        assert_eq!(Periode::parse("Semaine"), Periode::Semaine);
        assert_eq!(Periode::parse("mois"), Periode::Mois);
        assert_eq!(Periode::parse("annee"), Periode::Annee);
        assert_eq!(Periode::parse("x"), Periode::Autre("x".to_string()));
    }

    #[test]
    fn no_window_without_both_bounds() {
        let query = StatsQuery {
            periode: Some(Periode::Mois),
            date_debut: Some(dt("2024-03-01T00:00:00Z")),
            ..Default::default()
        };
        assert!(query.previous_window().is_none());
    }

    #[test]
    fn rate_is_zero_when_total_is_zero() {
        assert_eq!(rate(0, 0), 0.0);
        assert_eq!(rate(5, 0), 0.0);
        assert_eq!(rate(1, 3), 33.3);
        assert_eq!(rate(2, 3), 66.7);
    }

    #[test]
    fn aggregate_fills_every_status_and_rate() {
        let mut tally = Tally::default();
        tally.by_status.insert("CONFORME".to_string(), 3);
        tally.by_status.insert("EN_COURS".to_string(), 1);
        tally.montant = 12000;

        let agg = aggregate(StatsKind::Controles, &tally);
        assert_eq!(agg.counts["total"], 4);
        assert_eq!(agg.counts["conforme"], 3);
        assert_eq!(agg.counts["non_conforme"], 0);
        assert_eq!(agg.counts["termine"], 0);
        assert_eq!(agg.counts["montant_total_amendes"], 12000);
        assert_eq!(agg.rates["taux_conformite"], 75.0);
        assert!(!agg.counts.contains_key("en_attente"));
    }

    #[test]
    fn empty_tally_has_zero_rate() {
        let agg = aggregate(StatsKind::ProcesVerbaux, &Tally::default());
        assert_eq!(agg.counts["total"], 0);
        assert_eq!(agg.rates["taux_paiement"], 0.0);
    }

    #[test]
    fn deltas_are_signed() {
        assert_eq!(format_count_delta(3), "+3");
        assert_eq!(format_count_delta(-2), "-2");
        assert_eq!(format_count_delta(0), "0");
        assert_eq!(format_rate_delta(12.5), "+12.5");
        assert_eq!(format_rate_delta(-3.25), "-3.3");
        assert_eq!(format_rate_delta(0.01), "0");
    }

    #[test]
    fn evolution_without_previous_is_all_zero() {
        let agg = aggregate(StatsKind::Inspections, &Tally::default());
        let evo = evolution(&agg, None);
        assert_eq!(evo.len(), agg.counts.len() + agg.rates.len());
        assert!(evo.values().all(|v| v == "0"));
        assert_eq!(evo["evolution_en_attente"], "0");
        assert_eq!(evo["evolution_taux_conformite"], "0");
    }

    #[test]
    fn evolution_compares_current_with_previous() {
        let mut now = Tally::default();
        now.by_status.insert("CONFORME".to_string(), 3);
        now.by_status.insert("NON_CONFORME".to_string(), 1);
        let mut before = Tally::default();
        before.by_status.insert("CONFORME".to_string(), 1);
        before.by_status.insert("NON_CONFORME".to_string(), 3);

        let current = aggregate(StatsKind::Controles, &now);
        let previous = aggregate(StatsKind::Controles, &before);
        let evo = evolution(&current, Some(&previous));

        assert_eq!(evo["evolution_total"], "0");
        assert_eq!(evo["evolution_conforme"], "+2");
        assert_eq!(evo["evolution_non_conforme"], "-2");
        assert_eq!(evo["evolution_taux_conformite"], "+50.0");
    }

    #[test]
    fn stats_map_carries_every_field() {
        let agg = aggregate(StatsKind::Controles, &Tally::default());
        let evo = evolution(&agg, None);
        let map = stats_map(&agg, evo, None);
        assert_eq!(map["total"], 0);
        assert_eq!(map["taux_conformite"], 0.0);
        assert_eq!(map["evolution_montant_total_amendes"], "0");
        assert!(!map.contains_key("periode_precedente"));
    }

    #[test]
    fn date_bounds_parse_bare_dates_and_rfc3339() {
        assert_eq!(
            parse_date_bound("2024-03-01", false).unwrap(),
            dt("2024-03-01T00:00:00Z")
        );
        assert_eq!(
            parse_date_bound("2024-03-31", true).unwrap(),
            dt("2024-03-31T23:59:59Z")
        );
        assert_eq!(
            parse_date_bound("2024-03-01T08:00:00+02:00", false).unwrap(),
            dt("2024-03-01T08:00:00+02:00")
        );
        assert_matches!(
            parse_date_bound("01/03/2024", false),
            Err(CoreError::Validation(_))
        );
    }
}
