//! HTTP client for the FHIR backend

use std::time::Duration;

use serde::Serialize;
use serde_json::Value as JsonValue;
use supplement_core::fetch::{resources_from_response, typed_resources};
use supplement_core::{
    Bundle, BundleSubmitter, FhirError, FhirResource, MedicationStatement, Observation,
    OperationOutcome, Patient, ResourceFetcher,
};

const FHIR_JSON: &str = "application/fhir+json";

/// Upper bound on resources requested per search
const SEARCH_COUNT: &str = "1000";

/// Resources of one patient exactly as the backend returned them
#[derive(Debug, Clone, Serialize)]
pub struct RawPatientRecord {
    pub patient: JsonValue,
    pub observations: Vec<JsonValue>,
    pub medications: Vec<JsonValue>,
}

/// Client for a FHIR R4 REST backend
#[derive(Clone)]
pub struct FhirClient {
    http: reqwest::Client,
    base_url: String,
}

impl FhirClient {
    /// Create a client for the given base URL (e.g. `http://localhost:8000/fhir`)
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, FhirError> {
        let base_url = base_url.trim_end_matches('/').to_string();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(FhirError::Invalid(format!(
                "FHIR base URL must use http or https: {}",
                base_url
            )));
        }

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FhirError::Transport(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// List every patient on the backend
    pub async fn search_patients(&self) -> Result<Vec<Patient>, FhirError> {
        let body = self
            .get_json("Patient", &[("_count", SEARCH_COUNT.to_string())])
            .await?;
        typed_resources(body)
    }

    /// Fetch a patient and its records without any normalisation
    pub async fn fetch_raw(&self, id: &str) -> Result<RawPatientRecord, FhirError> {
        check_id(id)?;
        let patient = self.get_json(&format!("Patient/{}", id), &[]).await?;
        let (observations, medications) = tokio::join!(
            self.search_by_patient(Observation::RESOURCE_TYPE, id),
            self.search_by_patient(MedicationStatement::RESOURCE_TYPE, id)
        );

        Ok(RawPatientRecord {
            patient,
            observations: resources_from_response(observations?)?,
            medications: resources_from_response(medications?)?,
        })
    }

    /// Probe the backend's capability statement
    pub async fn ping(&self) -> Result<(), FhirError> {
        self.get_json("metadata", &[]).await.map(|_| ())
    }

    async fn get_json(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<JsonValue, FhirError> {
        let url = format!("{}/{}", self.base_url, path);
        tracing::debug!(url = %url, "FHIR GET");

        let response = self
            .http
            .get(&url)
            .header(reqwest::header::ACCEPT, FHIR_JSON)
            .query(query)
            .send()
            .await
            .map_err(|e| FhirError::Transport(format!("HTTP request failed: {}", e)))?;

        handle_response(response, path).await
    }

    async fn search_by_patient(&self, resource_type: &str, id: &str) -> Result<JsonValue, FhirError> {
        check_id(id)?;
        self.get_json(
            resource_type,
            &[
                ("subject", format!("Patient/{}", id)),
                ("_count", SEARCH_COUNT.to_string()),
            ],
        )
        .await
    }
}

impl ResourceFetcher for FhirClient {
    async fn fetch_patient(&self, id: &str) -> Result<Patient, FhirError> {
        check_id(id)?;
        let body = self.get_json(&format!("Patient/{}", id), &[]).await?;
        Ok(Patient::from_json_or_default(body))
    }

    async fn fetch_observations(&self, id: &str) -> Result<Vec<Observation>, FhirError> {
        let body = self.search_by_patient(Observation::RESOURCE_TYPE, id).await?;
        typed_resources(body)
    }

    async fn fetch_medications(&self, id: &str) -> Result<Vec<MedicationStatement>, FhirError> {
        let body = self
            .search_by_patient(MedicationStatement::RESOURCE_TYPE, id)
            .await?;
        typed_resources(body)
    }
}

impl BundleSubmitter for FhirClient {
    async fn submit(&self, bundle: &Bundle) -> Result<Bundle, FhirError> {
        tracing::debug!(entries = bundle.entry.len(), "Submitting transaction bundle");

        let response = self
            .http
            .post(&self.base_url)
            .header(reqwest::header::ACCEPT, FHIR_JSON)
            .json(bundle)
            .send()
            .await
            .map_err(|e| FhirError::Transport(format!("HTTP request failed: {}", e)))?;

        let body = handle_response(response, "Bundle").await?;
        Ok(serde_json::from_value(body)?)
    }
}

/// Map status codes onto the error taxonomy and decode the JSON body
async fn handle_response(response: reqwest::Response, what: &str) -> Result<JsonValue, FhirError> {
    let status = response.status();
    if status.is_success() {
        return response
            .json()
            .await
            .map_err(|e| FhirError::Transport(format!("Failed to read response: {}", e)));
    }

    let body = response.text().await.unwrap_or_default();
    if status == reqwest::StatusCode::NOT_FOUND {
        return Err(FhirError::NotFound(format!("{} not found", what)));
    }

    let detail = serde_json::from_str::<OperationOutcome>(&body)
        .map(|outcome| outcome.summary())
        .unwrap_or(body);
    Err(FhirError::Transport(format!(
        "FHIR backend error ({}): {}",
        status, detail
    )))
}

/// FHIR logical ids: 1-64 characters of `[A-Za-z0-9-.]`
pub fn check_id(id: &str) -> Result<(), FhirError> {
    let valid = !id.is_empty()
        && id.len() <= 64
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.');
    if valid {
        Ok(())
    } else {
        Err(FhirError::Invalid(format!("Invalid resource id: {:?}", id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_http_base_url() {
        assert!(matches!(
            FhirClient::new("ftp://example.org/fhir", Duration::from_secs(1)),
            Err(FhirError::Invalid(_))
        ));
    }

    #[test]
    fn trailing_slash_is_trimmed() {
        let client = FhirClient::new("http://localhost:8000/fhir/", Duration::from_secs(1)).unwrap();
        assert_eq!(client.base_url(), "http://localhost:8000/fhir");
    }

    #[test]
    fn id_charset() {
        assert!(check_id("0b8e6c1e-4f57-4c8a-9a3c-1f2d3e4f5a6b").is_ok());
        assert!(check_id("abc.1").is_ok());
        assert!(check_id("").is_err());
        assert!(check_id("../Patient").is_err());
        assert!(check_id(&"a".repeat(65)).is_err());
    }
}
