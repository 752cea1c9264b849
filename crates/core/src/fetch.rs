//! Contracts with the resource backend

use std::future::Future;

use serde_json::Value as JsonValue;

use crate::bundle::Bundle;
use crate::error::FhirError;
use crate::resource::{FhirResource, MedicationStatement, Observation, Patient};

/// Read side of the backend.
///
/// `fetch_patient` fails with [`FhirError::NotFound`] when the identifier is
/// unknown; the collection calls answer an empty `Vec` when the patient has
/// no records. Every call may fail with [`FhirError::Transport`].
pub trait ResourceFetcher {
    fn fetch_patient(&self, id: &str) -> impl Future<Output = Result<Patient, FhirError>> + Send;

    fn fetch_observations(
        &self,
        id: &str,
    ) -> impl Future<Output = Result<Vec<Observation>, FhirError>> + Send;

    fn fetch_medications(
        &self,
        id: &str,
    ) -> impl Future<Output = Result<Vec<MedicationStatement>, FhirError>> + Send;
}

/// Write side of the backend. Failures are reported once; no retries.
pub trait BundleSubmitter {
    fn submit(&self, bundle: &Bundle) -> impl Future<Output = Result<Bundle, FhirError>> + Send;
}

/// Resources split by type out of an arbitrary Bundle or array
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResourceSet {
    pub patients: Vec<Patient>,
    pub observations: Vec<Observation>,
    pub medications: Vec<MedicationStatement>,
}

impl ResourceSet {
    pub fn from_bundle(bundle: Bundle) -> Self {
        Self::from_resources(bundle.into_resources())
    }

    /// Dispatch on `resourceType`. Unknown types and untyped values are ignored.
    pub fn from_resources(resources: Vec<JsonValue>) -> Self {
        let mut set = Self::default();
        for resource in resources {
            let resource_type = resource
                .get("resourceType")
                .and_then(|v| v.as_str())
                .map(str::to_string);
            match resource_type.as_deref() {
                Some(Patient::RESOURCE_TYPE) => {
                    set.patients.push(Patient::from_json_or_default(resource))
                }
                Some(Observation::RESOURCE_TYPE) => {
                    set.observations.push(Observation::from_json_or_default(resource))
                }
                Some(MedicationStatement::RESOURCE_TYPE) => set
                    .medications
                    .push(MedicationStatement::from_json_or_default(resource)),
                other => {
                    tracing::debug!(resource_type = ?other, "Ignoring resource");
                }
            }
        }
        set
    }
}

/// Parse a backend response that is either a Bundle or a bare array of resources
pub fn resources_from_response(body: JsonValue) -> Result<Vec<JsonValue>, FhirError> {
    let is_bundle = body.get("resourceType").and_then(|v| v.as_str()) == Some("Bundle");
    match body {
        JsonValue::Array(items) => Ok(items),
        JsonValue::Object(_) if is_bundle => {
            let bundle: Bundle = serde_json::from_value(body)?;
            Ok(bundle.into_resources())
        }
        other => Err(FhirError::Malformed(format!(
            "expected a Bundle or an array, got {}",
            type_name(&other)
        ))),
    }
}

/// Parse a response into resources of one type. Entries of the wrong type are
/// dropped; malformed entries of the right type degrade to defaults.
pub fn typed_resources<T: FhirResource>(body: JsonValue) -> Result<Vec<T>, FhirError> {
    Ok(resources_from_response(body)?
        .into_iter()
        .filter(|r| {
            r.get("resourceType")
                .and_then(|v| v.as_str())
                .is_none_or(|t| t == T::RESOURCE_TYPE)
        })
        .map(T::from_json_or_default)
        .collect())
}

fn type_name(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "a boolean",
        JsonValue::Number(_) => "a number",
        JsonValue::String(_) => "a string",
        JsonValue::Array(_) => "an array",
        JsonValue::Object(_) => "an object",
    }
}
