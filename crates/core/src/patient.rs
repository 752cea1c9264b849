use serde::{Deserialize, Serialize};

use crate::resource::{HumanName, Patient};

/// Rendered in place of any absent patient field
pub const PLACEHOLDER: &str = "Not available";

/// Display-ready reference to a patient
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientRef {
    pub id: String,
    pub name: Option<String>,
    pub national_id: Option<String>,
    pub birth_date: Option<String>,
    pub emergency_contact: Option<String>,
}

impl PatientRef {
    /// Flatten a raw Patient. `fallback_id` is used when the resource carries no id.
    pub fn from_resource(patient: &Patient, fallback_id: &str) -> Self {
        Self {
            id: non_blank(patient.id.as_deref()).unwrap_or_else(|| fallback_id.to_string()),
            name: patient.name.first().and_then(format_name),
            national_id: patient
                .identifier
                .iter()
                .find_map(|i| non_blank(i.value.as_deref())),
            birth_date: non_blank(patient.birth_date.as_deref()),
            emergency_contact: patient.contact.first().and_then(|c| {
                c.name
                    .as_ref()
                    .and_then(format_name)
                    .or_else(|| c.telecom.iter().find_map(|t| non_blank(t.value.as_deref())))
            }),
        }
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(PLACEHOLDER)
    }

    pub fn display_birth_date(&self) -> &str {
        self.birth_date.as_deref().unwrap_or(PLACEHOLDER)
    }

    pub fn display_emergency_contact(&self) -> &str {
        self.emergency_contact.as_deref().unwrap_or(PLACEHOLDER)
    }

    /// Same reference with every absent field replaced by the placeholder
    pub fn rendered(&self) -> PatientCard {
        PatientCard {
            id: self.id.clone(),
            name: self.display_name().to_string(),
            national_id: self.national_id.as_deref().unwrap_or(PLACEHOLDER).to_string(),
            birth_date: self.display_birth_date().to_string(),
            emergency_contact: self.display_emergency_contact().to_string(),
        }
    }
}

/// PatientRef with placeholders applied, as handed to the presentation layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientCard {
    pub id: String,
    pub name: String,
    pub national_id: String,
    pub birth_date: String,
    pub emergency_contact: String,
}

/// "given family", falling back to the free-text name
fn format_name(name: &HumanName) -> Option<String> {
    let mut parts: Vec<&str> = name.given.iter().map(|g| g.trim()).collect();
    if let Some(family) = name.family.as_deref() {
        parts.push(family.trim());
    }
    let joined = parts
        .into_iter()
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    if joined.is_empty() {
        non_blank(name.text.as_deref())
    } else {
        Some(joined)
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
