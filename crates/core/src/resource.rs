//! Loosely-typed FHIR R4 resources as they arrive from the backend.
//!
//! Every field is optional and deserialized leniently: a value of the wrong
//! JSON shape becomes `None` (or is dropped from its array) instead of failing
//! the whole resource. The same structs serialize the resources we write.

use serde::de::{DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::error::FhirError;

fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = JsonValue::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

fn lenient_seq<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = JsonValue::deserialize(deserializer)?;
    Ok(match value {
        JsonValue::Array(items) => items
            .into_iter()
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect(),
        _ => Vec::new(),
    })
}

/// Common behaviour of the resource types this crate reads and writes
pub trait FhirResource: Serialize + DeserializeOwned + Default {
    const RESOURCE_TYPE: &'static str;

    /// Parse a raw JSON resource; fails only when the value is not an object
    /// of this resource type
    fn from_json(value: JsonValue) -> Result<Self, FhirError> {
        let Some(obj) = value.as_object() else {
            return Err(FhirError::Malformed(format!(
                "{} is not a JSON object",
                Self::RESOURCE_TYPE
            )));
        };
        match obj.get("resourceType").and_then(|v| v.as_str()) {
            Some(other) if other != Self::RESOURCE_TYPE => {
                return Err(FhirError::Malformed(format!(
                    "expected {}, got {}",
                    Self::RESOURCE_TYPE,
                    other
                )));
            }
            _ => {}
        }
        Ok(serde_json::from_value(value)?)
    }

    /// Parse a raw JSON resource, degrading to an empty resource when malformed
    fn from_json_or_default(value: JsonValue) -> Self {
        Self::from_json(value).unwrap_or_else(|e| {
            tracing::warn!(
                resource_type = Self::RESOURCE_TYPE,
                error = %e,
                "Degrading malformed resource to placeholder"
            );
            Self::default()
        })
    }

    fn to_json(&self) -> Result<JsonValue, FhirError> {
        Ok(serde_json::to_value(self)?)
    }
}

/// Patient resource
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Patient {
    #[serde(deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<String>,
    #[serde(deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(deserialize_with = "lenient_seq", skip_serializing_if = "Vec::is_empty")]
    pub identifier: Vec<Identifier>,
    #[serde(deserialize_with = "lenient_seq", skip_serializing_if = "Vec::is_empty")]
    pub name: Vec<HumanName>,
    #[serde(deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<String>,
    #[serde(deserialize_with = "lenient_seq", skip_serializing_if = "Vec::is_empty")]
    pub telecom: Vec<ContactPoint>,
    #[serde(deserialize_with = "lenient_seq", skip_serializing_if = "Vec::is_empty")]
    pub contact: Vec<PatientContact>,
}

impl FhirResource for Patient {
    const RESOURCE_TYPE: &'static str = "Patient";
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Identifier {
    #[serde(deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    #[serde(deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HumanName {
    #[serde(deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub family: Option<String>,
    #[serde(deserialize_with = "lenient_seq", skip_serializing_if = "Vec::is_empty")]
    pub given: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContactPoint {
    #[serde(deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    #[serde(deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

/// Patient.contact (emergency contact, next of kin)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatientContact {
    #[serde(deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub name: Option<HumanName>,
    #[serde(deserialize_with = "lenient_seq", skip_serializing_if = "Vec::is_empty")]
    pub telecom: Vec<ContactPoint>,
}

/// Observation resource
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Observation {
    #[serde(deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<String>,
    #[serde(deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub code: Option<CodeableConcept>,
    #[serde(deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub subject: Option<Reference>,
    #[serde(deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub effective_date_time: Option<String>,
    #[serde(deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub value_quantity: Option<Quantity>,
}

impl FhirResource for Observation {
    const RESOURCE_TYPE: &'static str = "Observation";
}

/// MedicationStatement resource
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MedicationStatement {
    #[serde(deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<String>,
    #[serde(deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub medication_codeable_concept: Option<CodeableConcept>,
    #[serde(deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub subject: Option<Reference>,
    #[serde(deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub effective_period: Option<Period>,
    #[serde(deserialize_with = "lenient_seq", skip_serializing_if = "Vec::is_empty")]
    pub dosage: Vec<Dosage>,
    #[serde(deserialize_with = "lenient_seq", skip_serializing_if = "Vec::is_empty")]
    pub note: Vec<Annotation>,
}

impl FhirResource for MedicationStatement {
    const RESOURCE_TYPE: &'static str = "MedicationStatement";
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodeableConcept {
    #[serde(deserialize_with = "lenient_seq", skip_serializing_if = "Vec::is_empty")]
    pub coding: Vec<Coding>,
    #[serde(deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl CodeableConcept {
    /// Code of the first coding entry
    pub fn first_code(&self) -> Option<&str> {
        self.coding.first().and_then(|c| c.code.as_deref())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Coding {
    #[serde(deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    #[serde(deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Quantity {
    #[serde(deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    #[serde(deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    #[serde(deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Reference {
    #[serde(deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
}

impl Reference {
    pub fn patient(id: &str) -> Self {
        Self {
            reference: Some(format!("Patient/{}", id)),
            display: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Period {
    #[serde(deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub start: Option<String>,
    #[serde(deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub end: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Dosage {
    #[serde(deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub timing: Option<Timing>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timing {
    #[serde(deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub code: Option<CodeableConcept>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Annotation {
    #[serde(deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}
