//! supplement-server library crate
//!
//! Exposes `build_app` and `config` for integration tests.
//! The actual binary entrypoint is in `main.rs`.

pub mod config;
mod error;
pub mod fhir;
pub mod insights;
mod middleware;
mod routes;
pub mod view;

use std::sync::OnceLock;

use axum::{Extension, Router, http::HeaderValue, middleware as axum_mw, routing::get};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use supplement_core::FhirError;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use config::Config;
use fhir::FhirClient;
use insights::InsightsClient;
use routes::AppState;

/// Build the full application router with all routes and middleware.
///
/// Extracted from `main()` so integration tests can construct the app
/// without binding to a TCP port. Fails only when the FHIR base URL is unusable.
pub fn build_app(config: &Config) -> Result<Router, FhirError> {
    let fhir = FhirClient::new(&config.fhir_base_url, config.request_timeout)?;

    let insights = match config.insights_base_url.as_deref() {
        Some(url) => match InsightsClient::new(url, config.request_timeout) {
            Ok(client) => Some(client),
            Err(e) => {
                tracing::warn!(error = %e, "Insight client unavailable, insight routes disabled");
                None
            }
        },
        None => None,
    };

    let state = AppState { fhir, insights };

    let rate_limiter = middleware::create_rate_limiter(config.rate_limit_rps);

    let api_routes = routes::patient_routes()
        .layer(axum_mw::from_fn(middleware::rate_limit_middleware))
        .layer(Extension(rate_limiter));

    let public_routes = Router::new()
        .route("/health", get(routes::health::check))
        .route("/metrics", get(routes::metrics::get))
        .layer(Extension(prometheus_handle()));

    Ok(Router::new()
        .merge(public_routes)
        .merge(api_routes)
        .with_state(state)
        .layer(axum_mw::from_fn(middleware::audit_middleware))
        .layer(axum_mw::from_fn(middleware::request_id_middleware))
        .layer(cors_layer(&config.cors_origins))
        .layer(TraceLayer::new_for_http())
        .layer(axum_mw::from_fn(middleware::metrics_middleware)))
}

/// Install the global Prometheus recorder once and hand out its handle.
/// Later calls (e.g. one app per integration test) reuse the first recorder.
fn prometheus_handle() -> PrometheusHandle {
    static HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();
    HANDLE
        .get_or_init(|| {
            let recorder = PrometheusBuilder::new().build_recorder();
            let handle = recorder.handle();
            if metrics::set_global_recorder(recorder).is_err() {
                tracing::warn!("A metrics recorder was already installed");
            }
            handle
        })
        .clone()
}

/// `*` allows any origin; otherwise only the listed ones that parse
fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origins.iter().any(|o| o == "*") {
        return layer.allow_origin(Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match o.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %o, "Ignoring unparseable CORS origin");
                None
            }
        })
        .collect();
    layer.allow_origin(allowed)
}
