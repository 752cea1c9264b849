//! Audit logging for writes to the FHIR backend

use axum::{body::Body, extract::Request, http::Method, middleware::Next, response::Response};

use super::request_id::RequestId;

/// Log every history write with its outcome. Insight requests are POSTs too
/// but never mutate the backend, so only `/history` paths are audited.
pub async fn audit_middleware(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let request_id = request
        .extensions()
        .get::<RequestId>()
        .map(|r| r.0.clone())
        .unwrap_or_else(|| "unknown".to_string());

    let response = next.run(request).await;

    if method == Method::POST && path.ends_with("/history") {
        tracing::info!(
            target: "audit",
            request_id = %request_id,
            method = %method,
            path = %path,
            status = response.status().as_u16(),
            "Supplement history write"
        );
    }

    response
}
