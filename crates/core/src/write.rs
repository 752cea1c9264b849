//! Caregiver form to FHIR transaction bundle.
//!
//! A biomarker is written only when its value is strictly positive: zero,
//! blank and unparseable inputs all mean "not measured". On the read side a
//! missing biomarker comes back as zero, so both directions agree on what
//! zero means. Every Observation carries the form's start date verbatim as
//! its effective date so the aggregator correlates it with the statement.

use serde::de::Deserializer;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::biomarker::{BiomarkerCode, UCUM_SYSTEM};
use crate::bundle::{Bundle, BundleEntry};
use crate::error::FhirError;
use crate::resource::{
    Annotation, CodeableConcept, Coding, Dosage, FhirResource, MedicationStatement, Observation,
    Period, Quantity, Reference, Timing,
};

/// Coding system of the supplement catalogue
pub const SUPPLEMENT_SYSTEM: &str = "http://suplementos.cl/codigo";

/// Known supplements: (code, display)
pub const SUPPLEMENT_CATALOGUE: &[(&str, &str)] = &[
    ("Omega3", "Omega-3"),
    ("VitD", "Vitamina D"),
    ("Multi", "Multivitamínico"),
    ("CoQ10", "Coenzima Q10"),
    ("Magnesio", "Magnesio"),
    ("VitB12", "Vitamina B12"),
    ("Zinc", "Zinc"),
];

/// Form values as entered by the caregiver
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SupplementForm {
    #[serde(rename = "suplemento", default)]
    pub supplement: String,
    #[serde(rename = "dosis", default)]
    pub dosage: String,
    #[serde(rename = "fecha_inicio", default)]
    pub start_date: String,
    #[serde(rename = "duracion", default)]
    pub duration: Option<String>,
    #[serde(rename = "colesterol_total", default, deserialize_with = "form_number")]
    pub total_cholesterol: Option<f64>,
    #[serde(rename = "trigliceridos", default, deserialize_with = "form_number")]
    pub triglycerides: Option<f64>,
    #[serde(rename = "vitamina_d", default, deserialize_with = "form_number")]
    pub vitamin_d: Option<f64>,
    #[serde(rename = "omega3_indice", default, deserialize_with = "form_number")]
    pub omega3_index: Option<f64>,
    #[serde(rename = "observaciones", default)]
    pub note: String,
}

/// Accept JSON numbers, numeric strings, and blanks (as `None`).
/// Non-finite results (`inf`, `NaN`, `1e999`) are not measurements.
fn form_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = match JsonValue::deserialize(deserializer)? {
        JsonValue::Number(n) => n.as_f64(),
        JsonValue::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    Ok(value.filter(|v| v.is_finite()))
}

impl SupplementForm {
    pub fn value(&self, biomarker: BiomarkerCode) -> Option<f64> {
        match biomarker {
            BiomarkerCode::TotalCholesterol => self.total_cholesterol,
            BiomarkerCode::Triglycerides => self.triglycerides,
            BiomarkerCode::VitaminD => self.vitamin_d,
            BiomarkerCode::Omega3Index => self.omega3_index,
        }
    }

    /// Biomarkers with a finite, strictly positive value, in table order
    pub fn measured(&self) -> Vec<(BiomarkerCode, f64)> {
        BiomarkerCode::ALL
            .into_iter()
            .filter_map(|b| {
                self.value(b)
                    .filter(|v| v.is_finite() && *v > 0.0)
                    .map(|v| (b, v))
            })
            .collect()
    }
}

/// Builds the transaction bundle for one form submission
#[derive(Debug, Clone)]
pub struct WriteBundleBuilder<'a> {
    patient_id: &'a str,
}

impl<'a> WriteBundleBuilder<'a> {
    pub fn new(patient_id: &'a str) -> Self {
        Self { patient_id }
    }

    /// Build one MedicationStatement plus one Observation per measured biomarker
    pub fn build(&self, form: &SupplementForm) -> Result<Bundle, FhirError> {
        if self.patient_id.trim().is_empty() {
            return Err(FhirError::Invalid("patient id is required".to_string()));
        }

        let mut entries = vec![BundleEntry::create(
            MedicationStatement::RESOURCE_TYPE,
            self.medication_statement(form).to_json()?,
        )];
        for (biomarker, value) in form.measured() {
            entries.push(BundleEntry::create(
                Observation::RESOURCE_TYPE,
                self.observation(biomarker, value, &form.start_date).to_json()?,
            ));
        }

        Ok(Bundle::transaction(entries))
    }

    pub fn medication_statement(&self, form: &SupplementForm) -> MedicationStatement {
        let coding = supplement_coding(form.supplement.trim());
        let duration = form
            .duration
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty());

        let dosage = if form.dosage.trim().is_empty() && duration.is_none() {
            Vec::new()
        } else {
            vec![Dosage {
                text: non_blank(&form.dosage),
                timing: duration.map(|d| Timing {
                    code: Some(CodeableConcept {
                        coding: Vec::new(),
                        text: Some(d.to_string()),
                    }),
                }),
            }]
        };

        MedicationStatement {
            resource_type: Some(MedicationStatement::RESOURCE_TYPE.to_string()),
            id: None,
            status: Some("active".to_string()),
            medication_codeable_concept: Some(CodeableConcept {
                text: coding.display.clone(),
                coding: vec![coding],
            }),
            subject: Some(Reference::patient(self.patient_id)),
            effective_period: non_blank(&form.start_date).map(|start| Period {
                start: Some(start),
                end: None,
            }),
            dosage,
            note: non_blank(&form.note)
                .map(|text| vec![Annotation { text: Some(text) }])
                .unwrap_or_default(),
        }
    }

    pub fn observation(&self, biomarker: BiomarkerCode, value: f64, date: &str) -> Observation {
        Observation {
            resource_type: Some(Observation::RESOURCE_TYPE.to_string()),
            id: None,
            status: Some("final".to_string()),
            code: Some(CodeableConcept {
                coding: vec![Coding {
                    system: Some(biomarker.system().to_string()),
                    code: Some(biomarker.code().to_string()),
                    display: Some(biomarker.name().to_string()),
                }],
                text: None,
            }),
            subject: Some(Reference::patient(self.patient_id)),
            effective_date_time: non_blank(date),
            value_quantity: Some(Quantity {
                value: Some(value),
                unit: Some(biomarker.unit().to_string()),
                system: Some(UCUM_SYSTEM.to_string()),
                code: Some(biomarker.unit().to_string()),
            }),
        }
    }
}

/// Catalogue coding for a known supplement code or display, else the raw name
pub fn supplement_coding(name: &str) -> Coding {
    let (code, display) = SUPPLEMENT_CATALOGUE
        .iter()
        .find(|(code, display)| *code == name || *display == name)
        .copied()
        .unwrap_or((name, name));

    Coding {
        system: Some(SUPPLEMENT_SYSTEM.to_string()),
        code: non_blank(code),
        display: non_blank(display),
    }
}

fn non_blank(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::Aggregator;
    use crate::bundle::{BundleType, HttpVerb};
    use crate::fetch::ResourceSet;
    use serde_json::json;

    fn form(values: [f64; 4]) -> SupplementForm {
        SupplementForm {
            supplement: "Omega3".to_string(),
            dosage: "1000mg".to_string(),
            start_date: "2024-01-10".to_string(),
            duration: Some("3 meses".to_string()),
            total_cholesterol: Some(values[0]),
            triglycerides: Some(values[1]),
            vitamin_d: Some(values[2]),
            omega3_index: Some(values[3]),
            note: "Control periódico".to_string(),
        }
    }

    fn observation_codes(bundle: &Bundle) -> Vec<String> {
        bundle
            .resources()
            .filter(|r| r["resourceType"] == "Observation")
            .map(|r| r["code"]["coding"][0]["code"].as_str().unwrap().to_string())
            .collect()
    }

    #[test]
    fn zero_cholesterol_is_not_written() {
        let bundle = WriteBundleBuilder::new("p1")
            .build(&form([0.0, 0.0, 0.0, 0.0]))
            .unwrap();
        assert_eq!(bundle.entry.len(), 1);
        assert!(observation_codes(&bundle).is_empty());
    }

    #[test]
    fn positive_cholesterol_is_written_once() {
        let bundle = WriteBundleBuilder::new("p1")
            .build(&form([150.0, 0.0, 0.0, 0.0]))
            .unwrap();
        assert_eq!(observation_codes(&bundle), vec!["2093-3".to_string()]);
    }

    #[test]
    fn negative_and_blank_values_are_not_measured() {
        let mut input = form([-5.0, 0.0, 0.0, 0.0]);
        input.vitamin_d = None;
        input.omega3_index = Some(f64::NAN);
        let bundle = WriteBundleBuilder::new("p1").build(&input).unwrap();
        assert_eq!(bundle.entry.len(), 1);
    }

    #[test]
    fn non_finite_form_values_are_not_measured() {
        let input: SupplementForm = serde_json::from_value(json!({
            "suplemento": "Omega3",
            "fecha_inicio": "2024-01-10",
            "colesterol_total": "inf",
            "trigliceridos": "infinity",
            "vitamina_d": "1e999",
            "omega3_indice": "NaN"
        }))
        .unwrap();
        assert_eq!(input.total_cholesterol, None);
        assert_eq!(input.triglycerides, None);
        assert_eq!(input.vitamin_d, None);
        assert_eq!(input.omega3_index, None);

        let bundle = WriteBundleBuilder::new("p1").build(&input).unwrap();
        assert_eq!(bundle.entry.len(), 1);
    }

    #[test]
    fn infinite_values_set_directly_are_not_written() {
        let input = form([f64::INFINITY, 120.0, f64::NEG_INFINITY, 0.0]);
        assert_eq!(input.measured(), vec![(BiomarkerCode::Triglycerides, 120.0)]);

        let bundle = WriteBundleBuilder::new("p1").build(&input).unwrap();
        assert_eq!(observation_codes(&bundle), vec!["2571-8".to_string()]);
        assert!(
            bundle
                .resources()
                .all(|r| !r["valueQuantity"].is_object() || r["valueQuantity"]["value"].is_number())
        );
    }

    #[test]
    fn transaction_shape() {
        let bundle = WriteBundleBuilder::new("p1")
            .build(&form([180.0, 120.0, 35.0, 6.0]))
            .unwrap();
        assert_eq!(bundle.bundle_type, BundleType::Transaction);
        assert_eq!(bundle.entry.len(), 5);
        for entry in &bundle.entry {
            let request = entry.request.as_ref().unwrap();
            assert_eq!(request.method, HttpVerb::Post);
            let resource = entry.resource.as_ref().unwrap();
            assert_eq!(resource["resourceType"], request.url.as_str());
            assert_eq!(resource["subject"]["reference"], "Patient/p1");
        }

        let statement = bundle.entry[0].resource.as_ref().unwrap();
        assert_eq!(statement["status"], "active");
        assert_eq!(statement["medicationCodeableConcept"]["coding"][0]["code"], "Omega3");
        assert_eq!(statement["medicationCodeableConcept"]["text"], "Omega-3");
        assert_eq!(statement["effectivePeriod"]["start"], "2024-01-10");
        assert_eq!(statement["dosage"][0]["text"], "1000mg");
        assert_eq!(statement["note"][0]["text"], "Control periódico");

        for entry in &bundle.entry[1..] {
            let observation = entry.resource.as_ref().unwrap();
            assert_eq!(observation["effectiveDateTime"], "2024-01-10");
            assert_eq!(observation["status"], "final");
        }
    }

    #[test]
    fn blank_patient_id_is_rejected() {
        let err = WriteBundleBuilder::new("  ").build(&form([1.0; 4])).unwrap_err();
        assert!(matches!(err, FhirError::Invalid(_)));
    }

    #[test]
    fn unknown_supplement_keeps_raw_name() {
        let coding = supplement_coding("Cúrcuma");
        assert_eq!(coding.code.as_deref(), Some("Cúrcuma"));
        assert_eq!(coding.display.as_deref(), Some("Cúrcuma"));
        assert_eq!(supplement_coding("Vitamina D").code.as_deref(), Some("VitD"));
    }

    #[test]
    fn form_accepts_strings_and_blanks() {
        let form: SupplementForm = serde_json::from_value(json!({
            "suplemento": "Omega3",
            "dosis": "1000mg",
            "fecha_inicio": "2024-01-10",
            "colesterol_total": "150",
            "trigliceridos": "",
            "vitamina_d": 32.5,
            "omega3_indice": null,
            "observaciones": ""
        }))
        .unwrap();
        assert_eq!(form.total_cholesterol, Some(150.0));
        assert_eq!(form.triglycerides, None);
        assert_eq!(form.vitamin_d, Some(32.5));
        assert_eq!(form.omega3_index, None);
        assert_eq!(
            form.measured(),
            vec![(BiomarkerCode::TotalCholesterol, 150.0), (BiomarkerCode::VitaminD, 32.5)]
        );
    }

    #[test]
    fn written_values_read_back_exactly() {
        let values = [212.5, 143.0, 28.4, 7.1];
        let input = form(values);
        let bundle = WriteBundleBuilder::new("p1").build(&input).unwrap();

        let set = ResourceSet::from_bundle(bundle);
        let timeline = Aggregator::new().build(&set.observations, &set.medications);

        assert_eq!(timeline.len(), 1);
        let record = &timeline.records()[0];
        for (biomarker, expected) in BiomarkerCode::ALL.into_iter().zip(values) {
            assert_eq!(record.value(biomarker), expected);
        }
        assert_eq!(record.supplement, "Omega-3");
        assert_eq!(record.dosage, "1000mg");
        assert_eq!(record.start_date, "2024-01-10");
        assert_eq!(record.duration.as_deref(), Some("3 meses"));
        assert_eq!(record.note, "Control periódico");
    }

    #[test]
    fn written_values_read_back_without_start_date() {
        let mut input = form([190.0, 101.0, 44.0, 5.5]);
        input.start_date = String::new();
        let bundle = WriteBundleBuilder::new("p1").build(&input).unwrap();

        let set = ResourceSet::from_bundle(bundle);
        let timeline = Aggregator::new().build(&set.observations, &set.medications);
        assert_eq!(timeline.records()[0].vitamin_d, 44.0);
    }

    #[test]
    fn bundle_is_conformant_r4b() {
        let bundle = WriteBundleBuilder::new("p1")
            .build(&form([180.0, 120.0, 35.0, 6.0]))
            .unwrap();
        let json = serde_json::to_value(&bundle).unwrap();
        let parsed: Result<fhir_sdk::r4b::resources::Bundle, _> = serde_json::from_value(json);
        assert!(parsed.is_ok(), "{:?}", parsed.err());
    }
}
