use serde::{Deserialize, Serialize};

/// LOINC coding system used for laboratory biomarkers
pub const LOINC_SYSTEM: &str = "http://loinc.org";

/// Local coding system for biomarkers without a LOINC code
pub const LOCAL_BIOMARKER_SYSTEM: &str = "http://suplementos.cl/biomarcador";

/// UCUM units system
pub const UCUM_SYSTEM: &str = "http://unitsofmeasure.org";

/// The biomarkers tracked against supplement intake
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum BiomarkerCode {
    TotalCholesterol,
    Triglycerides,
    VitaminD,
    Omega3Index,
}

impl BiomarkerCode {
    pub const ALL: [BiomarkerCode; 4] = [
        BiomarkerCode::TotalCholesterol,
        BiomarkerCode::Triglycerides,
        BiomarkerCode::VitaminD,
        BiomarkerCode::Omega3Index,
    ];

    /// Resolve a clinical code. Exact, case-sensitive match.
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "2093-3" => Some(BiomarkerCode::TotalCholesterol),
            "2571-8" => Some(BiomarkerCode::Triglycerides),
            "14635-7" => Some(BiomarkerCode::VitaminD),
            "omega3_indice" | "omega3-index" | "omega3_index" => Some(BiomarkerCode::Omega3Index),
            _ => None,
        }
    }

    /// Code written on outgoing Observations
    pub fn code(self) -> &'static str {
        match self {
            BiomarkerCode::TotalCholesterol => "2093-3",
            BiomarkerCode::Triglycerides => "2571-8",
            BiomarkerCode::VitaminD => "14635-7",
            BiomarkerCode::Omega3Index => "omega3-index",
        }
    }

    pub fn system(self) -> &'static str {
        match self {
            BiomarkerCode::Omega3Index => LOCAL_BIOMARKER_SYSTEM,
            _ => LOINC_SYSTEM,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            BiomarkerCode::TotalCholesterol => "total cholesterol",
            BiomarkerCode::Triglycerides => "triglycerides",
            BiomarkerCode::VitaminD => "vitamin D",
            BiomarkerCode::Omega3Index => "omega-3 index",
        }
    }

    pub fn unit(self) -> &'static str {
        match self {
            BiomarkerCode::TotalCholesterol | BiomarkerCode::Triglycerides => "mg/dL",
            BiomarkerCode::VitaminD => "ng/mL",
            BiomarkerCode::Omega3Index => "%",
        }
    }

    /// Inverse of [`BiomarkerCode::field_name`]
    pub fn from_field_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|b| b.field_name() == name)
    }

    /// Field name used by the history wire format and the caregiver form
    pub fn field_name(self) -> &'static str {
        match self {
            BiomarkerCode::TotalCholesterol => "colesterol_total",
            BiomarkerCode::Triglycerides => "trigliceridos",
            BiomarkerCode::VitaminD => "vitamina_d",
            BiomarkerCode::Omega3Index => "omega3_indice",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_written_code_reads_back() {
        for biomarker in BiomarkerCode::ALL {
            assert_eq!(BiomarkerCode::from_code(biomarker.code()), Some(biomarker));
        }
    }

    #[test]
    fn omega3_aliases() {
        for code in ["omega3_indice", "omega3-index", "omega3_index"] {
            assert_eq!(BiomarkerCode::from_code(code), Some(BiomarkerCode::Omega3Index));
        }
        assert_eq!(BiomarkerCode::from_code("OMEGA3-INDEX"), None);
    }

    #[test]
    fn field_names_round_trip() {
        for biomarker in BiomarkerCode::ALL {
            assert_eq!(BiomarkerCode::from_field_name(biomarker.field_name()), Some(biomarker));
        }
        assert_eq!(BiomarkerCode::from_field_name("2093-3"), None);
    }

    #[test]
    fn unknown_codes() {
        assert_eq!(BiomarkerCode::from_code("8867-4"), None);
        assert_eq!(BiomarkerCode::from_code(""), None);
    }
}
