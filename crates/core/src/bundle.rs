use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// FHIR Bundle types
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum BundleType {
    Searchset,
    History,
    Collection,
    Document,
    Message,
    Transaction,
    TransactionResponse,
    Batch,
    BatchResponse,
}

/// HTTP verb of a transaction entry
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpVerb {
    Get,
    Post,
    Put,
    Delete,
}

/// FHIR Bundle resource (simplified)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bundle {
    pub resource_type: String,

    #[serde(rename = "type")]
    pub bundle_type: BundleType,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<u32>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub link: Vec<BundleLink>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub entry: Vec<BundleEntry>,
}

impl Bundle {
    /// Create a transaction bundle from the given entries
    pub fn transaction(entries: Vec<BundleEntry>) -> Self {
        Self {
            resource_type: "Bundle".to_string(),
            bundle_type: BundleType::Transaction,
            total: None,
            link: Vec::new(),
            entry: entries,
        }
    }

    /// Iterate over the resources carried by the entries, skipping empty entries
    pub fn resources(&self) -> impl Iterator<Item = &JsonValue> {
        self.entry.iter().filter_map(|e| e.resource.as_ref())
    }

    /// Consume the bundle and return its resources
    pub fn into_resources(self) -> Vec<JsonValue> {
        self.entry.into_iter().filter_map(|e| e.resource).collect()
    }
}

/// Bundle link (for pagination)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BundleLink {
    pub relation: String,
    pub url: String,
}

/// Bundle entry containing a resource
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleEntry {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<JsonValue>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request: Option<BundleRequest>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<BundleResponse>,
}

impl BundleEntry {
    pub fn new(full_url: Option<String>, resource: JsonValue) -> Self {
        Self {
            full_url,
            resource: Some(resource),
            request: None,
            response: None,
        }
    }

    /// Entry that creates `resource` under a fresh `urn:uuid:` placeholder id
    pub fn create(resource_type: &str, resource: JsonValue) -> Self {
        Self {
            full_url: Some(format!("urn:uuid:{}", uuid::Uuid::new_v4())),
            resource: Some(resource),
            request: Some(BundleRequest {
                method: HttpVerb::Post,
                url: resource_type.to_string(),
            }),
            response: None,
        }
    }
}

/// Request part of a transaction entry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BundleRequest {
    pub method: HttpVerb,
    pub url: String,
}

/// Response part of a transaction-response entry
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleResponse {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}
