//! Client for the remote insight service (recommendations, trend prediction,
//! anomaly detection, supplement optimization)

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use supplement_core::BiomarkerCode;

use super::InsightError;

const RECOMMENDATIONS_PATH: &str = "/ai/recomendaciones";
const TRENDS_PATH: &str = "/ai/prediccion-tendencias";
const ANOMALIES_PATH: &str = "/ai/deteccion-anomalias";
const OPTIMIZATION_PATH: &str = "/ai/optimizacion-suplementos";

/// Stateless client; every call is an independent request/response
#[derive(Clone)]
pub struct InsightsClient {
    http: reqwest::Client,
    base_url: String,
}

/// Body shared by the patient-scoped insight requests
#[derive(Debug, Serialize)]
struct PatientRequest<'a> {
    paciente_id: &'a str,
}

#[derive(Debug, Serialize)]
struct TrendRequest<'a> {
    paciente_id: &'a str,
    biomarcador: &'static str,
    dias_prediccion: u32,
}

#[derive(Debug, Serialize)]
struct OptimizationRequest<'a> {
    paciente_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    objetivo: Option<&'a str>,
}

/// Personalized recommendations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recommendations {
    #[serde(rename = "recomendaciones", default)]
    pub items: Vec<Recommendation>,
    #[serde(rename = "explicacion", default)]
    pub explanation: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recommendation {
    #[serde(rename = "tipo", default)]
    pub kind: String,
    #[serde(rename = "descripcion", default)]
    pub description: String,
}

/// Direction and speed of a predicted biomarker trend
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    AscendenteRapida,
    AscendenteLenta,
    Estable,
    DescendenteLenta,
    DescendenteRapida,
    #[serde(other)]
    Desconocida,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendPrediction {
    #[serde(rename = "valor_actual", default)]
    pub current_value: Option<f64>,
    #[serde(rename = "tendencia")]
    pub trend: Trend,
    #[serde(rename = "recomendacion", default)]
    pub recommendation: String,
    #[serde(rename = "predicciones", default)]
    pub predictions: Vec<PredictedValue>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictedValue {
    #[serde(rename = "fecha")]
    pub date: String,
    #[serde(rename = "valor_predicho")]
    pub value: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnomalyReport {
    #[serde(rename = "fecha_analisis", default)]
    pub analysed_at: Option<String>,
    #[serde(rename = "mensaje", default)]
    pub message: String,
    #[serde(rename = "anomalias", default)]
    pub anomalies: Vec<Anomaly>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Anomaly {
    #[serde(rename = "biomarcador", default)]
    pub biomarker: Option<String>,
    #[serde(rename = "valor", default)]
    pub value: Option<f64>,
    #[serde(rename = "unidad", default)]
    pub unit: Option<String>,
    /// `alto` or `bajo`
    #[serde(rename = "tipo", default)]
    pub kind: Option<String>,
    #[serde(rename = "rango_normal", default)]
    pub normal_range: Option<String>,
    #[serde(rename = "recomendacion", default)]
    pub recommendation: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupplementPlan {
    #[serde(rename = "objetivo", default)]
    pub objective: String,
    #[serde(rename = "suplementos_recomendados", default)]
    pub supplements: Vec<PlannedSupplement>,
    #[serde(rename = "consideraciones", default)]
    pub considerations: Vec<String>,
    #[serde(rename = "seguimiento_recomendado", default)]
    pub follow_up: Option<String>,
    #[serde(rename = "explicacion_detallada", default)]
    pub detailed_explanation: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannedSupplement {
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "dosis", default)]
    pub dosage: String,
    #[serde(rename = "frecuencia", default)]
    pub frequency: Option<String>,
    #[serde(rename = "momento", default)]
    pub timing: Option<String>,
    #[serde(rename = "duracion", default)]
    pub duration: Option<String>,
    #[serde(rename = "justificacion", default)]
    pub rationale: Option<String>,
}

/// Error detail returned by the insight service
#[derive(Debug, Deserialize)]
struct ApiError {
    detail: String,
}

impl InsightsClient {
    /// Create a new client for the given base URL
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, InsightError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| InsightError::Transport(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub async fn recommendations(&self, patient_id: &str) -> Result<Recommendations, InsightError> {
        self.post(RECOMMENDATIONS_PATH, &PatientRequest { paciente_id: patient_id })
            .await
    }

    pub async fn trends(
        &self,
        patient_id: &str,
        biomarker: BiomarkerCode,
        days: u32,
    ) -> Result<TrendPrediction, InsightError> {
        let request = TrendRequest {
            paciente_id: patient_id,
            biomarcador: biomarker.field_name(),
            dias_prediccion: days,
        };
        self.post(TRENDS_PATH, &request).await
    }

    pub async fn anomalies(&self, patient_id: &str) -> Result<AnomalyReport, InsightError> {
        self.post(ANOMALIES_PATH, &PatientRequest { paciente_id: patient_id })
            .await
    }

    pub async fn optimization(
        &self,
        patient_id: &str,
        objective: Option<&str>,
    ) -> Result<SupplementPlan, InsightError> {
        let request = OptimizationRequest {
            paciente_id: patient_id,
            objetivo: objective.map(str::trim).filter(|o| !o.is_empty()),
        };
        self.post(OPTIMIZATION_PATH, &request).await
    }

    /// Send one request; no retries
    async fn post<Req, Resp>(&self, path: &str, request: &Req) -> Result<Resp, InsightError>
    where
        Req: Serialize + ?Sized,
        Resp: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .http
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| InsightError::Transport(format!("HTTP request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiError>(&body)
                .map(|e| e.detail)
                .unwrap_or(body);
            return Err(InsightError::Upstream {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json::<Resp>()
            .await
            .map_err(|e| InsightError::Decode(e.to_string()))
    }
}
