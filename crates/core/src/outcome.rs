use serde::{Deserialize, Serialize};

/// Severity of the issue
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum IssueSeverity {
    Fatal,
    Error,
    Warning,
    Information,
}

/// Type of issue (subset of the FHIR issue-type value set used here)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum IssueType {
    Invalid,
    Structure,
    Required,
    Value,
    NotFound,
    NotSupported,
    Processing,
    Transient,
    Exception,
    Timeout,
    Throttled,
    Informational,
    #[serde(other)]
    Unknown,
}

/// FHIR OperationOutcome resource
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationOutcome {
    pub resource_type: String,
    #[serde(default)]
    pub issue: Vec<OperationOutcomeIssue>,
}

/// A single issue in an OperationOutcome
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationOutcomeIssue {
    pub severity: IssueSeverity,
    pub code: IssueType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnostics: Option<String>,
}

impl OperationOutcome {
    fn single(severity: IssueSeverity, code: IssueType, message: &str) -> Self {
        Self {
            resource_type: "OperationOutcome".to_string(),
            issue: vec![OperationOutcomeIssue {
                severity,
                code,
                diagnostics: Some(message.to_string()),
            }],
        }
    }

    /// Create an error outcome
    pub fn error(code: IssueType, message: &str) -> Self {
        Self::single(IssueSeverity::Error, code, message)
    }

    /// Create a not-found outcome
    pub fn not_found(message: &str) -> Self {
        Self::error(IssueType::NotFound, message)
    }

    /// Create an invalid-input outcome
    pub fn invalid(message: &str) -> Self {
        Self::error(IssueType::Invalid, message)
    }

    /// Join all diagnostics into one line, for logging backend failures
    pub fn summary(&self) -> String {
        self.issue
            .iter()
            .filter_map(|i| i.diagnostics.as_deref())
            .collect::<Vec<_>>()
            .join("; ")
    }
}
