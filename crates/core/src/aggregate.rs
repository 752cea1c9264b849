//! Correlation of MedicationStatements with same-day Observations.
//!
//! Each supplement entry takes its biomarker values from the Observations
//! whose effective date matches the supplement's start date. Matching is
//! delegated to a [`DateMatch`] strategy; the default, [`ExactDate`],
//! compares the raw strings and performs no date parsing at all. The write
//! bundle copies the start date verbatim into every Observation it emits,
//! so exact matching is what makes a written record read back intact.

use std::borrow::Cow;
use std::collections::HashMap;

use chrono::NaiveDate;

use crate::biomarker::BiomarkerCode;
use crate::record::{HistoryTimeline, ObservationRecord, SupplementRecord};
use crate::resource::{MedicationStatement, Observation};

/// Strategy turning an effective date into the key observations are grouped by
pub trait DateMatch {
    fn key<'a>(&self, date: &'a str) -> Cow<'a, str>;
}

/// Raw string equality: case- and format-sensitive
#[derive(Debug, Clone, Copy, Default)]
pub struct ExactDate;

impl DateMatch for ExactDate {
    fn key<'a>(&self, date: &'a str) -> Cow<'a, str> {
        Cow::Borrowed(date)
    }
}

/// Same calendar day: compares the leading `YYYY-MM-DD` when it parses,
/// so `2024-01-10` matches `2024-01-10T08:30:00Z`. Unparseable dates
/// fall back to raw equality.
#[derive(Debug, Clone, Copy, Default)]
pub struct CalendarDay;

impl DateMatch for CalendarDay {
    fn key<'a>(&self, date: &'a str) -> Cow<'a, str> {
        date.get(..10)
            .and_then(|day| NaiveDate::parse_from_str(day, "%Y-%m-%d").ok())
            .map(|day| Cow::Owned(day.format("%Y-%m-%d").to_string()))
            .unwrap_or(Cow::Borrowed(date))
    }
}

/// Flatten Observations, skipping those without a numeric value
pub fn flatten(observations: &[Observation]) -> Vec<ObservationRecord> {
    let records: Vec<_> = observations
        .iter()
        .filter_map(ObservationRecord::from_resource)
        .collect();
    if records.len() < observations.len() {
        tracing::debug!(
            skipped = observations.len() - records.len(),
            "Skipped observations without a numeric value"
        );
    }
    records
}

/// Builds a [`HistoryTimeline`] from raw resource collections
#[derive(Debug, Clone, Default)]
pub struct Aggregator<M = ExactDate> {
    matcher: M,
}

impl Aggregator<ExactDate> {
    pub fn new() -> Self {
        Self { matcher: ExactDate }
    }
}

impl<M: DateMatch> Aggregator<M> {
    pub fn with_matcher(matcher: M) -> Self {
        Self { matcher }
    }

    /// Aggregate raw Observations and MedicationStatements
    pub fn build(
        &self,
        observations: &[Observation],
        medications: &[MedicationStatement],
    ) -> HistoryTimeline {
        self.build_from_records(&flatten(observations), medications)
    }

    /// Aggregate already-flattened Observations with raw MedicationStatements.
    /// The timeline has exactly one entry per statement, in source order.
    pub fn build_from_records(
        &self,
        records: &[ObservationRecord],
        medications: &[MedicationStatement],
    ) -> HistoryTimeline {
        let mut by_date: HashMap<Cow<'_, str>, Vec<&ObservationRecord>> = HashMap::new();
        for record in records {
            by_date
                .entry(self.matcher.key(&record.effective_date))
                .or_default()
                .push(record);
        }

        let timeline = medications
            .iter()
            .map(|statement| {
                let mut entry = SupplementRecord::from_statement(statement);
                let group: &[&ObservationRecord] = {
                    let key = self.matcher.key(&entry.start_date);
                    by_date
                        .get(&*key)
                        .map(Vec::as_slice)
                        .unwrap_or_default()
                };
                for biomarker in BiomarkerCode::ALL {
                    let value = group
                        .iter()
                        .find(|r| r.biomarker == Some(biomarker))
                        .map(|r| r.value)
                        .unwrap_or(0.0);
                    entry.set_value(biomarker, value);
                }
                entry
            })
            .collect();

        HistoryTimeline::new(timeline)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::FhirResource;
    use serde_json::{Value as JsonValue, json};

    fn observation(code: &str, value: f64, date: &str) -> Observation {
        Observation::from_json(json!({
            "resourceType": "Observation",
            "status": "final",
            "code": {"coding": [{"system": "http://loinc.org", "code": code}]},
            "effectiveDateTime": date,
            "valueQuantity": {"value": value}
        }))
        .unwrap()
    }

    fn statement(name: &str, start: Option<&str>) -> MedicationStatement {
        let mut json = json!({
            "resourceType": "MedicationStatement",
            "status": "active",
            "medicationCodeableConcept": {"text": name},
            "dosage": [{"text": "1000mg"}]
        });
        if let Some(start) = start {
            json["effectivePeriod"] = json!({"start": start});
        }
        MedicationStatement::from_json(json).unwrap()
    }

    #[test]
    fn correlates_same_day_observations() {
        let timeline = Aggregator::new().build(
            &[
                observation("2093-3", 210.0, "2024-01-10"),
                observation("14635-7", 30.0, "2024-01-10"),
            ],
            &[statement("Omega-3", Some("2024-01-10"))],
        );

        let record = &timeline.records()[0];
        assert_eq!(record.total_cholesterol, 210.0);
        assert_eq!(record.vitamin_d, 30.0);
        assert_eq!(record.triglycerides, 0.0);
        assert_eq!(record.omega3_index, 0.0);

        let json = serde_json::to_value(record).unwrap();
        assert_eq!(json["colesterol_total"], 210.0);
        assert_eq!(json["vitamina_d"], 30.0);
        assert_eq!(json["trigliceridos"], 0.0);
        assert_eq!(json["omega3_indice"], 0.0);
    }

    #[test]
    fn next_day_observations_do_not_correlate() {
        let timeline = Aggregator::new().build(
            &[
                observation("2093-3", 210.0, "2024-01-11"),
                observation("14635-7", 30.0, "2024-01-11"),
            ],
            &[statement("Omega-3", Some("2024-01-10"))],
        );

        let record = &timeline.records()[0];
        for biomarker in BiomarkerCode::ALL {
            assert_eq!(record.value(biomarker), 0.0);
        }
    }

    #[test]
    fn matching_is_format_sensitive() {
        let timeline = Aggregator::new().build(
            &[observation("2093-3", 180.0, "2024-01-10T00:00:00Z")],
            &[statement("Omega-3", Some("2024-01-10"))],
        );
        assert_eq!(timeline.records()[0].total_cholesterol, 0.0);
    }

    #[test]
    fn calendar_day_matcher_ignores_time_part() {
        let aggregator = Aggregator::with_matcher(CalendarDay);
        let timeline = aggregator.build(
            &[observation("2093-3", 180.0, "2024-01-10T08:30:00Z")],
            &[statement("Omega-3", Some("2024-01-10"))],
        );
        assert_eq!(timeline.records()[0].total_cholesterol, 180.0);
        assert_eq!(CalendarDay.key("not a date"), "not a date");
    }

    #[test]
    fn one_entry_per_statement_in_source_order() {
        let statements = vec![
            statement("Zinc", Some("2024-05-01")),
            statement("Omega-3", Some("2023-01-01")),
            statement("Zinc", Some("2024-05-01")),
            MedicationStatement::from_json_or_default(JsonValue::Null),
        ];
        let timeline = Aggregator::new().build(
            &[observation("2571-8", 95.5, "2024-05-01")],
            &statements,
        );

        assert_eq!(timeline.len(), statements.len());
        let names: Vec<_> = timeline.iter().map(|r| r.supplement.as_str()).collect();
        assert_eq!(names, ["Zinc", "Omega-3", "Zinc", "unknown"]);
        assert_eq!(timeline.records()[0].triglycerides, 95.5);
        assert_eq!(timeline.records()[2].triglycerides, 95.5);
        assert_eq!(timeline.records()[1].triglycerides, 0.0);
    }

    #[test]
    fn first_observation_per_code_wins() {
        let timeline = Aggregator::new().build(
            &[
                observation("2093-3", 200.0, "2024-01-10"),
                observation("2093-3", 150.0, "2024-01-10"),
            ],
            &[statement("Omega-3", Some("2024-01-10"))],
        );
        assert_eq!(timeline.records()[0].total_cholesterol, 200.0);
    }

    #[test]
    fn empty_start_date_matches_only_undated_observations() {
        let undated = Observation::from_json(json!({
            "code": {"coding": [{"code": "omega3_indice"}]},
            "valueQuantity": {"value": 6.5}
        }))
        .unwrap();

        let timeline = Aggregator::new().build(
            &[observation("2093-3", 210.0, "2024-01-10")],
            &[statement("Omega-3", None)],
        );
        assert_eq!(timeline.records()[0].total_cholesterol, 0.0);

        let timeline = Aggregator::new().build(&[undated], &[statement("Omega-3", None)]);
        assert_eq!(timeline.records()[0].omega3_index, 6.5);
    }

    #[test]
    fn unknown_codes_are_flattened_but_not_correlated() {
        let observations = [
            observation("8867-4", 72.0, "2024-01-10"),
            observation("2093-3", 190.0, "2024-01-10"),
        ];
        let records = flatten(&observations);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].biomarker, None);

        let timeline =
            Aggregator::new().build_from_records(&records, &[statement("Omega-3", Some("2024-01-10"))]);
        assert_eq!(timeline.records()[0].total_cholesterol, 190.0);
    }

    #[test]
    fn malformed_observations_never_abort() {
        let broken = Observation::from_json(json!({
            "code": [1, 2, 3],
            "valueQuantity": "lots"
        }))
        .unwrap();
        let timeline = Aggregator::new().build(
            &[broken, observation("14635-7", 41.0, "2024-02-02")],
            &[statement("VitD", Some("2024-02-02"))],
        );
        assert_eq!(timeline.records()[0].vitamin_d, 41.0);
    }

    #[test]
    fn no_statements_yield_empty_timeline() {
        let timeline = Aggregator::new().build(&[observation("2093-3", 1.0, "2024-01-10")], &[]);
        assert!(timeline.is_empty());
    }
}
