use crate::outcome::{IssueType, OperationOutcome};
use thiserror::Error;

/// Errors surfaced by the supplement history core
#[derive(Debug, Error)]
pub enum FhirError {
    /// The requested resource does not exist on the backend
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Network or HTTP failure talking to the backend
    #[error("Transport error: {0}")]
    Transport(String),

    /// A resource is missing a required nested field or has the wrong shape
    #[error("Malformed resource: {0}")]
    Malformed(String),

    /// Caller-supplied input cannot be turned into a resource
    #[error("Invalid input: {0}")]
    Invalid(String),
}

impl FhirError {
    /// Convert into an OperationOutcome for HTTP responses
    pub fn to_outcome(&self) -> OperationOutcome {
        match self {
            FhirError::NotFound(msg) => OperationOutcome::not_found(msg),
            FhirError::Transport(msg) => OperationOutcome::error(IssueType::Transient, msg),
            FhirError::Malformed(msg) => OperationOutcome::error(IssueType::Structure, msg),
            FhirError::Invalid(msg) => OperationOutcome::invalid(msg),
        }
    }
}

impl From<serde_json::Error> for FhirError {
    fn from(err: serde_json::Error) -> Self {
        FhirError::Malformed(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outcome::IssueSeverity;

    #[test]
    fn not_found_maps_to_not_found_issue() {
        let outcome = FhirError::NotFound("Patient/42".into()).to_outcome();
        assert_eq!(outcome.issue[0].code, IssueType::NotFound);
        assert_eq!(outcome.issue[0].severity, IssueSeverity::Error);
    }

    #[test]
    fn transport_maps_to_transient_issue() {
        let outcome = FhirError::Transport("timeout".into()).to_outcome();
        assert_eq!(outcome.issue[0].code, IssueType::Transient);
    }
}
