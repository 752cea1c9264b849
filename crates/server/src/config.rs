//! Server configuration

use std::time::Duration;

/// Server configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub bind_address: String,
    /// Base URL of the FHIR backend, e.g. `http://localhost:8000/fhir`
    pub fhir_base_url: String,
    /// Base URL of the remote insight service; insight routes are disabled when unset
    pub insights_base_url: Option<String>,
    pub cors_origins: Vec<String>,
    pub rate_limit_rps: u32,
    pub request_timeout: Duration,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            bind_address: std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:8080".into()),
            fhir_base_url: std::env::var("FHIR_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:8000/fhir".into()),
            insights_base_url: std::env::var("INSIGHTS_BASE_URL")
                .ok()
                .filter(|v| !v.trim().is_empty()),
            cors_origins: std::env::var("CORS_ORIGINS")
                .map(|v| parse_list(&v))
                .unwrap_or_else(|_| vec!["*".to_string()]),
            rate_limit_rps: std::env::var("RATE_LIMIT_RPS")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|v| *v > 0)
                .unwrap_or(100),
            request_timeout: Duration::from_secs(
                std::env::var("FHIR_TIMEOUT_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(30),
            ),
        }
    }
}

fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
