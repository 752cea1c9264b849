//! Prometheus metrics collection middleware
//!
//! Every request updates `http_requests_total` and
//! `http_request_duration_seconds`, labelled by method, route and status.
//! Upstream failures (502/503) additionally bump `upstream_failures_total`
//! so a flapping FHIR backend or insight service shows up on its own.

use axum::{extract::Request, middleware::Next, response::Response};
use std::time::Instant;

/// Collapse the patient id segment so per-patient requests share one label.
/// Patient ids are opaque backend ids, not only UUIDs, so the segment is
/// recognised by position rather than shape.
fn route_label(path: &str) -> String {
    let mut segments = path.split('/');
    let mut label = Vec::new();
    while let Some(seg) = segments.next() {
        label.push(seg);
        if seg == "patients" {
            if let Some(id) = segments.next() {
                label.push(if id.is_empty() { id } else { ":id" });
            }
        }
    }
    label.join("/")
}

pub async fn metrics_middleware(request: Request, next: Next) -> Response {
    let method = request.method().to_string();
    let route = route_label(request.uri().path());

    let start = Instant::now();
    let response = next.run(request).await;
    let elapsed = start.elapsed().as_secs_f64();

    let status = response.status();
    if status.as_u16() == 502 || status.as_u16() == 503 {
        metrics::counter!("upstream_failures_total", "route" => route.clone()).increment(1);
    }

    metrics::counter!(
        "http_requests_total",
        "method" => method.clone(),
        "path" => route.clone(),
        "status" => status.as_u16().to_string()
    )
    .increment(1);
    metrics::histogram!("http_request_duration_seconds", "method" => method, "path" => route)
        .record(elapsed);

    response
}

#[cfg(test)]
mod tests {
    use super::route_label;

    #[test]
    fn patient_ids_are_collapsed() {
        assert_eq!(route_label("/patients/abc-1/history"), "/patients/:id/history");
        assert_eq!(
            route_label("/patients/7/insights/trends"),
            "/patients/:id/insights/trends"
        );
        assert_eq!(route_label("/patients"), "/patients");
        assert_eq!(route_label("/patients/"), "/patients/");
        assert_eq!(route_label("/health"), "/health");
    }
}
