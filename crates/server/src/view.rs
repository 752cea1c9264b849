//! Loading the patient detail view from a FHIR backend

use supplement_core::{FhirError, PatientDetail, ResourceFetcher};

/// Fetch everything the detail view needs.
///
/// The patient is read first so a missing patient short-circuits before any
/// search is issued; observations and medications are then fetched
/// concurrently. A failed search fails the whole load; nothing is aggregated
/// from the other half.
pub async fn load_detail<F>(fetcher: &F, id: &str) -> Result<PatientDetail, FhirError>
where
    F: ResourceFetcher + Sync,
{
    let patient = fetcher.fetch_patient(id).await?;

    let (observations, medications) =
        tokio::join!(fetcher.fetch_observations(id), fetcher.fetch_medications(id));
    let observations = observations?;
    let medications = medications?;

    tracing::debug!(
        patient_id = %id,
        observations = observations.len(),
        medications = medications.len(),
        "Assembling patient detail"
    );

    Ok(PatientDetail::assemble(id, &patient, &observations, &medications))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use serde_json::json;
    use supplement_core::{FhirResource, MedicationStatement, Observation, Patient};

    #[derive(Default)]
    struct StubFetcher {
        patient: Option<Patient>,
        observations: Vec<Observation>,
        medications: Vec<MedicationStatement>,
        searches: AtomicUsize,
    }

    impl ResourceFetcher for StubFetcher {
        async fn fetch_patient(&self, id: &str) -> Result<Patient, FhirError> {
            self.patient
                .clone()
                .ok_or_else(|| FhirError::NotFound(format!("Patient/{} not found", id)))
        }

        async fn fetch_observations(&self, _id: &str) -> Result<Vec<Observation>, FhirError> {
            self.searches.fetch_add(1, Ordering::SeqCst);
            Ok(self.observations.clone())
        }

        async fn fetch_medications(&self, _id: &str) -> Result<Vec<MedicationStatement>, FhirError> {
            self.searches.fetch_add(1, Ordering::SeqCst);
            Ok(self.medications.clone())
        }
    }

    fn patient() -> Patient {
        Patient::from_json(json!({
            "resourceType": "Patient",
            "id": "p1",
            "name": [{"given": ["Ana"], "family": "Rojas"}]
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn missing_patient_skips_searches() {
        let fetcher = StubFetcher::default();
        let err = load_detail(&fetcher, "p1").await.unwrap_err();
        assert!(matches!(err, FhirError::NotFound(_)));
        assert_eq!(fetcher.searches.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn no_medications_means_empty_timeline() {
        let fetcher = StubFetcher {
            patient: Some(patient()),
            observations: vec![
                Observation::from_json(json!({
                    "resourceType": "Observation",
                    "code": {"coding": [{"code": "2093-3"}]},
                    "effectiveDateTime": "2024-01-10",
                    "valueQuantity": {"value": 210.0, "unit": "mg/dL"}
                }))
                .unwrap(),
            ],
            ..Default::default()
        };

        let detail = load_detail(&fetcher, "p1").await.unwrap();
        assert!(detail.timeline.is_empty());
        assert_eq!(detail.observations.len(), 1);
        assert_eq!(detail.patient.name.as_deref(), Some("Ana Rojas"));
        assert_eq!(fetcher.searches.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn timeline_joins_by_start_date() {
        let fetcher = StubFetcher {
            patient: Some(patient()),
            observations: vec![
                Observation::from_json(json!({
                    "resourceType": "Observation",
                    "code": {"coding": [{"code": "14635-7"}]},
                    "effectiveDateTime": "2024-01-10",
                    "valueQuantity": {"value": 30.0}
                }))
                .unwrap(),
            ],
            medications: vec![
                MedicationStatement::from_json(json!({
                    "resourceType": "MedicationStatement",
                    "medicationCodeableConcept": {"text": "Vitamina D"},
                    "effectivePeriod": {"start": "2024-01-10"}
                }))
                .unwrap(),
            ],
            ..Default::default()
        };

        let detail = load_detail(&fetcher, "p1").await.unwrap();
        let record = &detail.timeline.records()[0];
        assert_eq!(record.supplement, "Vitamina D");
        assert_eq!(record.vitamin_d, 30.0);
        assert_eq!(record.total_cholesterol, 0.0);
    }
}
