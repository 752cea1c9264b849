//! Patient list, detail and supplement history handlers

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Serialize;
use supplement_core::{
    BundleSubmitter, FhirError, HistoryTimeline, ObservationRecord, PatientCard, PatientRef,
    SupplementForm, WriteBundleBuilder,
};

use super::AppState;
use crate::error::AppError;
use crate::fhir::client::check_id;
use crate::view::load_detail;

/// Patient detail as handed to the viewer
#[derive(Debug, Serialize)]
pub struct DetailResponse {
    pub patient: PatientCard,
    pub timeline: HistoryTimeline,
    pub observations: Vec<ObservationRecord>,
}

/// GET /patients - Every patient on the backend, placeholders applied
pub async fn list(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let patients = state.fhir.search_patients().await?;
    let cards: Vec<PatientCard> = patients
        .iter()
        .map(|p| PatientRef::from_resource(p, "").rendered())
        .collect();

    Ok(Json(cards))
}

/// GET /patients/{id} - Patient card, supplement timeline and all observations
pub async fn detail(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let detail = load_detail(&state.fhir, &id).await?;

    Ok(Json(DetailResponse {
        patient: detail.patient.rendered(),
        timeline: detail.timeline,
        observations: detail.observations,
    }))
}

/// GET /patients/{id}/history - Supplement timeline only
pub async fn history(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let detail = load_detail(&state.fhir, &id).await?;
    Ok(Json(detail.timeline))
}

/// POST /patients/{id}/history - Record a supplement and its biomarkers
pub async fn record(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(form): Json<SupplementForm>,
) -> Result<impl IntoResponse, AppError> {
    check_id(&id)?;
    if form.supplement.trim().is_empty() {
        return Err(AppError::BadRequest("suplemento is required".to_string()));
    }

    // Only a bad id is the caller's fault; failing to encode our own resources is not
    let bundle = WriteBundleBuilder::new(&id)
        .build(&form)
        .map_err(|e| match e {
            FhirError::Invalid(msg) => AppError::BadRequest(msg),
            other => AppError::Internal(format!("Failed to build transaction: {}", other)),
        })?;
    let entries = bundle.entry.len();
    let response = state.fhir.submit(&bundle).await?;

    metrics::counter!("supplement_history_writes_total").increment(1);
    metrics::counter!("biomarker_observations_written_total").increment(entries as u64 - 1);

    tracing::info!(
        patient_id = %id,
        supplement = %form.supplement,
        entries,
        "Supplement history recorded"
    );

    Ok((StatusCode::CREATED, Json(response)))
}

/// GET /patients/{id}/fhir - Raw resources for the raw-data panel
pub async fn raw(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.fhir.fetch_raw(&id).await?))
}
