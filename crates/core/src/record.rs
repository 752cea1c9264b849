//! Flattened, display-ready records built from raw resources

use serde::{Deserialize, Serialize};

use crate::biomarker::BiomarkerCode;
use crate::resource::{MedicationStatement, Observation};

/// Name used when a MedicationStatement carries no usable medication text or code
pub const UNKNOWN_SUPPLEMENT: &str = "unknown";

/// A single Observation flattened to code, value and date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservationRecord {
    /// Raw code of the first coding entry, empty when absent
    pub code: String,
    /// Recognized biomarker, `None` for codes outside the tracked set
    pub biomarker: Option<BiomarkerCode>,
    pub value: f64,
    pub unit: Option<String>,
    /// Effective date-time exactly as sent, empty when absent
    pub effective_date: String,
}

impl ObservationRecord {
    /// Flatten an Observation. Returns `None` when it has no numeric value,
    /// since such a record cannot be correlated.
    pub fn from_resource(observation: &Observation) -> Option<Self> {
        let quantity = observation.value_quantity.as_ref()?;
        let value = quantity.value?;
        let code = observation
            .code
            .as_ref()
            .and_then(|c| c.first_code())
            .unwrap_or_default()
            .to_string();

        Some(Self {
            biomarker: BiomarkerCode::from_code(&code),
            code,
            value,
            unit: quantity.unit.clone(),
            effective_date: observation.effective_date_time.clone().unwrap_or_default(),
        })
    }
}

/// One row of the supplement history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupplementRecord {
    #[serde(rename = "suplemento")]
    pub supplement: String,
    #[serde(rename = "dosis")]
    pub dosage: String,
    #[serde(rename = "fecha_inicio")]
    pub start_date: String,
    #[serde(rename = "duracion", default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    #[serde(rename = "observaciones")]
    pub note: String,
    #[serde(rename = "colesterol_total")]
    pub total_cholesterol: f64,
    #[serde(rename = "trigliceridos")]
    pub triglycerides: f64,
    #[serde(rename = "vitamina_d")]
    pub vitamin_d: f64,
    #[serde(rename = "omega3_indice")]
    pub omega3_index: f64,
}

impl SupplementRecord {
    /// Extract the supplement fields of a MedicationStatement with every
    /// biomarker at zero. Absent fields degrade to empty strings.
    pub fn from_statement(statement: &MedicationStatement) -> Self {
        let medication = statement.medication_codeable_concept.as_ref();
        let first_coding = medication.and_then(|m| m.coding.first());
        let supplement = medication
            .and_then(|m| non_blank(m.text.as_deref()))
            .or_else(|| first_coding.and_then(|c| non_blank(c.display.as_deref())))
            .or_else(|| first_coding.and_then(|c| non_blank(c.code.as_deref())))
            .unwrap_or(UNKNOWN_SUPPLEMENT);

        let dosage = statement.dosage.first();

        Self {
            supplement: supplement.to_string(),
            dosage: dosage
                .and_then(|d| d.text.clone())
                .unwrap_or_default(),
            start_date: statement
                .effective_period
                .as_ref()
                .and_then(|p| p.start.clone())
                .unwrap_or_default(),
            duration: dosage
                .and_then(|d| d.timing.as_ref())
                .and_then(|t| t.code.as_ref())
                .and_then(|c| c.text.clone()),
            note: statement
                .note
                .first()
                .and_then(|n| n.text.clone())
                .unwrap_or_default(),
            total_cholesterol: 0.0,
            triglycerides: 0.0,
            vitamin_d: 0.0,
            omega3_index: 0.0,
        }
    }

    pub fn value(&self, biomarker: BiomarkerCode) -> f64 {
        match biomarker {
            BiomarkerCode::TotalCholesterol => self.total_cholesterol,
            BiomarkerCode::Triglycerides => self.triglycerides,
            BiomarkerCode::VitaminD => self.vitamin_d,
            BiomarkerCode::Omega3Index => self.omega3_index,
        }
    }

    pub fn set_value(&mut self, biomarker: BiomarkerCode, value: f64) {
        match biomarker {
            BiomarkerCode::TotalCholesterol => self.total_cholesterol = value,
            BiomarkerCode::Triglycerides => self.triglycerides = value,
            BiomarkerCode::VitaminD => self.vitamin_d = value,
            BiomarkerCode::Omega3Index => self.omega3_index = value,
        }
    }
}

/// Supplement history in MedicationStatement source order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HistoryTimeline(Vec<SupplementRecord>);

impl HistoryTimeline {
    pub fn new(records: Vec<SupplementRecord>) -> Self {
        Self(records)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn records(&self) -> &[SupplementRecord] {
        &self.0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SupplementRecord> {
        self.0.iter()
    }

    pub fn into_inner(self) -> Vec<SupplementRecord> {
        self.0
    }
}

impl IntoIterator for HistoryTimeline {
    type Item = SupplementRecord;
    type IntoIter = std::vec::IntoIter<SupplementRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::FhirResource;
    use serde_json::json;

    #[test]
    fn observation_without_value_is_skipped() {
        let obs = Observation::from_json(json!({
            "code": {"coding": [{"code": "2093-3"}]},
            "effectiveDateTime": "2024-01-10"
        }))
        .unwrap();
        assert_eq!(ObservationRecord::from_resource(&obs), None);
    }

    #[test]
    fn unknown_code_is_retained() {
        let obs = Observation::from_json(json!({
            "code": {"coding": [{"code": "8867-4"}, {"code": "2093-3"}]},
            "effectiveDateTime": "2024-01-10",
            "valueQuantity": {"value": 72, "unit": "/min"}
        }))
        .unwrap();
        let record = ObservationRecord::from_resource(&obs).unwrap();
        assert_eq!(record.code, "8867-4");
        assert_eq!(record.biomarker, None);
        assert_eq!(record.value, 72.0);
    }

    #[test]
    fn supplement_name_fallbacks() {
        let with_text = MedicationStatement::from_json(json!({
            "medicationCodeableConcept": {
                "text": "Omega-3",
                "coding": [{"code": "Omega3", "display": "Omega 3"}]
            }
        }))
        .unwrap();
        assert_eq!(SupplementRecord::from_statement(&with_text).supplement, "Omega-3");

        let display_only = MedicationStatement::from_json(json!({
            "medicationCodeableConcept": {"coding": [{"code": "VitD", "display": "Vitamina D"}]}
        }))
        .unwrap();
        assert_eq!(SupplementRecord::from_statement(&display_only).supplement, "Vitamina D");

        let code_only = MedicationStatement::from_json(json!({
            "medicationCodeableConcept": {"text": " ", "coding": [{"code": "Zinc"}]}
        }))
        .unwrap();
        assert_eq!(SupplementRecord::from_statement(&code_only).supplement, "Zinc");

        let nothing = MedicationStatement::default();
        let record = SupplementRecord::from_statement(&nothing);
        assert_eq!(record.supplement, UNKNOWN_SUPPLEMENT);
        assert_eq!(record.start_date, "");
        assert_eq!(record.dosage, "");
        assert_eq!(record.note, "");
    }

    #[test]
    fn serializes_with_history_field_names() {
        let statement = MedicationStatement::from_json(json!({
            "medicationCodeableConcept": {"text": "Magnesio"},
            "effectivePeriod": {"start": "2024-03-01"},
            "dosage": [{"text": "400mg", "timing": {"code": {"text": "3 meses"}}}],
            "note": [{"text": "Sin efectos adversos"}]
        }))
        .unwrap();
        let json = serde_json::to_value(SupplementRecord::from_statement(&statement)).unwrap();
        assert_eq!(
            json,
            json!({
                "suplemento": "Magnesio",
                "dosis": "400mg",
                "fecha_inicio": "2024-03-01",
                "duracion": "3 meses",
                "observaciones": "Sin efectos adversos",
                "colesterol_total": 0.0,
                "trigliceridos": 0.0,
                "vitamina_d": 0.0,
                "omega3_indice": 0.0
            })
        );
    }
}
