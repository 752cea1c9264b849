pub mod health;
mod insights;
pub mod metrics;
mod patient;

use axum::{
    Router,
    routing::{get, post},
};

use crate::fhir::FhirClient;
use crate::insights::InsightsClient;

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub fhir: FhirClient,
    /// `None` when no insight service is configured
    pub insights: Option<InsightsClient>,
}

/// Build the patient-facing routes
pub fn patient_routes() -> Router<AppState> {
    Router::new()
        .route("/patients", get(patient::list))
        .route("/patients/{id}", get(patient::detail))
        .route(
            "/patients/{id}/history",
            get(patient::history).post(patient::record),
        )
        .route("/patients/{id}/fhir", get(patient::raw))
        .route(
            "/patients/{id}/insights/recommendations",
            post(insights::recommendations),
        )
        .route("/patients/{id}/insights/trends", post(insights::trends))
        .route("/patients/{id}/insights/anomalies", post(insights::anomalies))
        .route(
            "/patients/{id}/insights/optimization",
            post(insights::optimization),
        )
}
