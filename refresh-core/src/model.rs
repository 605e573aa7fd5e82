use chrono::{DateTime, TimeZone};
use serde::{Deserialize, Serialize};

use crate::error::LocationError;

/// A stored favorite as returned by the favorites store.
///
/// Coordinates are optional because stored records are not trusted: a record
/// with a missing coordinate still takes part in the run and surfaces as a
/// per-location error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FavoriteLocation {
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub location_name: String,
}

/// Deduplication key: bit patterns of the coordinate pair, with `-0.0`
/// folded into `0.0` so that equal values share a key.
pub type CoordinateKey = (Option<u64>, Option<u64>);

impl FavoriteLocation {
    pub fn new(latitude: f64, longitude: f64, location_name: impl Into<String>) -> Self {
        Self {
            latitude: Some(latitude),
            longitude: Some(longitude),
            location_name: location_name.into(),
        }
    }

    pub fn key(&self) -> CoordinateKey {
        (coordinate_bits(self.latitude), coordinate_bits(self.longitude))
    }

    /// Validated `(latitude, longitude)`.
    pub fn coordinates(&self) -> Result<(f64, f64), LocationError> {
        let lat = self
            .latitude
            .ok_or_else(|| LocationError::InvalidRecord("missing latitude".to_string()))?;
        let lon = self
            .longitude
            .ok_or_else(|| LocationError::InvalidRecord("missing longitude".to_string()))?;

        if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
            return Err(LocationError::InvalidRecord(format!("latitude out of range: {lat}")));
        }
        if !lon.is_finite() || !(-180.0..=180.0).contains(&lon) {
            return Err(LocationError::InvalidRecord(format!("longitude out of range: {lon}")));
        }

        Ok((lat, lon))
    }
}

fn coordinate_bits(value: Option<f64>) -> Option<u64> {
    value.map(|v| if v == 0.0 { 0f64.to_bits() } else { v.to_bits() })
}

/// Provider payload for one coordinate and one calendar date. Opaque here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DaySummary(pub serde_json::Value);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum OutcomeStatus {
    Success { data: DaySummary },
    Error { error: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationOutcome {
    pub location: String,
    #[serde(flatten)]
    pub status: OutcomeStatus,
}

impl LocationOutcome {
    pub fn success(location: impl Into<String>, data: DaySummary) -> Self {
        Self { location: location.into(), status: OutcomeStatus::Success { data } }
    }

    pub fn error(location: impl Into<String>, error: impl ToString) -> Self {
        Self { location: location.into(), status: OutcomeStatus::Error { error: error.to_string() } }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.status, OutcomeStatus::Success { .. })
    }

    pub fn data(&self) -> Option<&DaySummary> {
        match &self.status {
            OutcomeStatus::Success { data } => Some(data),
            OutcomeStatus::Error { .. } => None,
        }
    }
}

/// Tally of one run. `details` is in deduplicated input order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    pub total: usize,
    pub successes: usize,
    pub errors: usize,
    pub details: Vec<LocationOutcome>,
}

impl RunResult {
    pub fn from_outcomes(details: Vec<LocationOutcome>) -> Self {
        let successes = details.iter().filter(|d| d.is_success()).count();
        Self { total: details.len(), successes, errors: details.len() - successes, details }
    }
}

/// What a run did. An empty favorites list is not the same as a run whose
/// locations all failed.
#[derive(Debug, Clone, PartialEq)]
pub enum RefreshOutcome {
    NoFavorites,
    Completed(RunResult),
}

impl RefreshOutcome {
    pub fn into_report(self) -> RunReport {
        match self {
            RefreshOutcome::NoFavorites => RunReport {
                message: "No favorite locations to refresh".to_string(),
                summary: RunResult::default(),
            },
            RefreshOutcome::Completed(summary) => RunReport {
                message: "Favorites weather refresh completed".to_string(),
                summary,
            },
        }
    }
}

/// Serialized result handed back to whoever triggered the run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub message: String,
    pub summary: RunResult,
}

/// Yesterday relative to `now`, as `YYYY-MM-DD`.
pub fn reference_date<Tz: TimeZone>(now: &DateTime<Tz>) -> String {
    let today = now.date_naive();
    today.pred_opt().unwrap_or(today).format("%Y-%m-%d").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, Utc};
    use serde_json::json;

    #[test]
    fn reference_date_is_yesterday() {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 0, 30, 0).unwrap();
        assert_eq!(reference_date(&now), "2024-02-29");
    }

    #[test]
    fn reference_date_uses_the_given_offset() {
        // 23:30 UTC on Jan 1st is already Jan 2nd at UTC+2.
        let tz = FixedOffset::east_opt(2 * 3600).unwrap();
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 23, 30, 0).unwrap().with_timezone(&tz);
        assert_eq!(reference_date(&now), "2024-01-01");
    }

    #[test]
    fn negative_zero_shares_key_with_zero() {
        let a = FavoriteLocation::new(0.0, 10.0, "a");
        let b = FavoriteLocation::new(-0.0, 10.0, "b");
        assert_eq!(a.key(), b.key());
        assert_ne!(a.key(), FavoriteLocation::new(0.0, 10.000001, "c").key());
    }

    #[test]
    fn coordinates_reject_missing_and_out_of_range() {
        let missing = FavoriteLocation { latitude: None, longitude: Some(1.0), location_name: "x".into() };
        assert!(matches!(missing.coordinates(), Err(LocationError::InvalidRecord(_))));

        let bad = FavoriteLocation::new(91.0, 0.0, "x");
        assert!(bad.coordinates().is_err());

        let nan = FavoriteLocation::new(f64::NAN, 0.0, "x");
        assert!(nan.coordinates().is_err());

        assert_eq!(FavoriteLocation::new(48.85, 2.35, "Paris").coordinates().unwrap(), (48.85, 2.35));
    }

    #[test]
    fn outcome_serializes_with_status_tag() {
        let ok = LocationOutcome::success("Paris", DaySummary(json!({"temp": 12})));
        assert_eq!(
            serde_json::to_value(&ok).unwrap(),
            json!({"location": "Paris", "status": "success", "data": {"temp": 12}})
        );

        let err = LocationOutcome::error("NYC", "boom");
        assert_eq!(
            serde_json::to_value(&err).unwrap(),
            json!({"location": "NYC", "status": "error", "error": "boom"})
        );
    }

    #[test]
    fn run_result_tallies_outcomes() {
        let result = RunResult::from_outcomes(vec![
            LocationOutcome::success("a", DaySummary(json!(1))),
            LocationOutcome::error("b", "nope"),
            LocationOutcome::success("c", DaySummary(json!(2))),
        ]);
        assert_eq!(result.total, 3);
        assert_eq!(result.successes, 2);
        assert_eq!(result.errors, 1);
        assert_eq!(result.total, result.successes + result.errors);
    }

    #[test]
    fn empty_run_report_has_zero_summary() {
        let report = RefreshOutcome::NoFavorites.into_report();
        assert_eq!(report.summary, RunResult::default());
        assert_eq!(report.message, "No favorite locations to refresh");
    }

    #[test]
    fn favorite_with_null_coordinate_deserializes() {
        let fav: FavoriteLocation =
            serde_json::from_value(json!({"latitude": null, "longitude": 2.0, "location_name": "x"}))
                .unwrap();
        assert_eq!(fav.latitude, None);
        assert_eq!(fav.longitude, Some(2.0));
    }
}
