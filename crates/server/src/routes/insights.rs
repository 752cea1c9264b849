//! Proxies to the remote insight service

use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use serde::Deserialize;
use supplement_core::BiomarkerCode;

use super::AppState;
use crate::error::AppError;
use crate::insights::{InsightError, InsightsClient};

const DEFAULT_TREND_BIOMARKER: &str = "colesterol_total";
const DEFAULT_PREDICTION_DAYS: u32 = 90;
const MAX_PREDICTION_DAYS: u32 = 365;

#[derive(Debug, Deserialize)]
pub struct TrendParams {
    #[serde(default = "default_biomarker")]
    pub biomarcador: String,
    #[serde(default = "default_days")]
    pub dias_prediccion: u32,
}

fn default_biomarker() -> String {
    DEFAULT_TREND_BIOMARKER.to_string()
}

fn default_days() -> u32 {
    DEFAULT_PREDICTION_DAYS
}

impl Default for TrendParams {
    fn default() -> Self {
        Self {
            biomarcador: default_biomarker(),
            dias_prediccion: default_days(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct OptimizationParams {
    #[serde(default)]
    pub objetivo: Option<String>,
}

fn client(state: &AppState) -> Result<&InsightsClient, AppError> {
    state
        .insights
        .as_ref()
        .ok_or_else(|| AppError::from(InsightError::NotConfigured))
}

/// POST /patients/{id}/insights/recommendations
pub async fn recommendations(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(client(&state)?.recommendations(&id).await?))
}

/// POST /patients/{id}/insights/trends
pub async fn trends(
    State(state): State<AppState>,
    Path(id): Path<String>,
    params: Option<Json<TrendParams>>,
) -> Result<impl IntoResponse, AppError> {
    let insights = client(&state)?;
    let params = params.map(|Json(p)| p).unwrap_or_default();
    let biomarker = BiomarkerCode::from_field_name(&params.biomarcador).ok_or_else(|| {
        AppError::BadRequest(format!("Unknown biomarker: {}", params.biomarcador))
    })?;
    if !(1..=MAX_PREDICTION_DAYS).contains(&params.dias_prediccion) {
        return Err(AppError::BadRequest(format!(
            "dias_prediccion must be between 1 and {}",
            MAX_PREDICTION_DAYS
        )));
    }

    Ok(Json(
        insights
            .trends(&id, biomarker, params.dias_prediccion)
            .await?,
    ))
}

/// POST /patients/{id}/insights/anomalies
pub async fn anomalies(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(client(&state)?.anomalies(&id).await?))
}

/// POST /patients/{id}/insights/optimization
pub async fn optimization(
    State(state): State<AppState>,
    Path(id): Path<String>,
    params: Option<Json<OptimizationParams>>,
) -> Result<impl IntoResponse, AppError> {
    let params = params.map(|Json(p)| p).unwrap_or_default();
    Ok(Json(
        client(&state)?
            .optimization(&id, params.objetivo.as_deref())
            .await?,
    ))
}
