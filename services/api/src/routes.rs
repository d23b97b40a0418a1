use crate::infra::{deserialize_optional_date, evaluation_instant, AppState};
use crate::report::{evaluate_snapshot, SnapshotFile};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use chrono::NaiveDate;
use grantflow::compliance::{
    compliance_router, ComplianceOverview, ComplianceService, ComplianceStore,
};
use grantflow::error::AppError;
use serde::Deserialize;
use serde_json::json;
use std::io::Cursor;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub(crate) struct ComplianceReportRequest {
    #[serde(flatten)]
    pub(crate) snapshot: SnapshotFile,
    #[serde(default, deserialize_with = "deserialize_optional_date")]
    pub(crate) today: Option<NaiveDate>,
    #[serde(default)]
    pub(crate) tracking_csv: Option<String>,
}

pub(crate) fn with_compliance_routes<S>(service: Arc<ComplianceService<S>>) -> axum::Router
where
    S: ComplianceStore + 'static,
{
    compliance_router(service)
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
        .route(
            "/api/v1/compliance/report",
            axum::routing::post(compliance_report_endpoint),
        )
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

/// Stateless evaluation of posted records; nothing is persisted.
pub(crate) async fn compliance_report_endpoint(
    Json(payload): Json<ComplianceReportRequest>,
) -> Result<Json<ComplianceOverview>, AppError> {
    let ComplianceReportRequest {
        snapshot,
        today,
        tracking_csv,
    } = payload;

    let csv = tracking_csv.map(|raw| Cursor::new(raw.into_bytes()));
    let overview = evaluate_snapshot(snapshot, csv, evaluation_instant(today)).await?;
    Ok(Json(overview))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use grantflow::compliance::{AlertThresholds, InMemoryComplianceStore, OverallStatus};
    use metrics_exporter_prometheus::PrometheusBuilder;
    use std::sync::atomic::AtomicBool;
    use tower::ServiceExt;

    fn test_app(ready: bool) -> axum::Router {
        let store = Arc::new(InMemoryComplianceStore::default());
        let service = Arc::new(ComplianceService::new(store, AlertThresholds::default()));
        let state = AppState {
            readiness: Arc::new(AtomicBool::new(ready)),
            metrics: Arc::new(PrometheusBuilder::new().build_recorder().handle()),
        };
        with_compliance_routes(service).layer(Extension(state))
    }

    async fn status_of(app: axum::Router, uri: &str) -> StatusCode {
        let request = Request::builder()
            .uri(uri)
            .body(Body::empty())
            .expect("request");
        app.oneshot(request).await.expect("response").status()
    }

    #[tokio::test]
    async fn health_and_readiness_reflect_state() {
        assert_eq!(status_of(test_app(false), "/health").await, StatusCode::OK);
        assert_eq!(
            status_of(test_app(false), "/ready").await,
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(status_of(test_app(true), "/ready").await, StatusCode::OK);
        assert_eq!(status_of(test_app(true), "/metrics").await, StatusCode::OK);
    }

    #[tokio::test]
    async fn compliance_routes_are_mounted() {
        assert_eq!(
            status_of(test_app(true), "/api/compliance").await,
            StatusCode::BAD_REQUEST
        );
    }

    #[tokio::test]
    async fn report_endpoint_evaluates_posted_records() {
        let request: ComplianceReportRequest = serde_json::from_value(json!({
            "today": "2026-10-16",
            "documents": [
                { "name": "Indirect cost agreement", "expiration_date": "2026-10-01", "status": "uploaded" }
            ],
            "tracking_csv": "Title,Deadline,Status,Priority,Category\nQuarterly narrative,2026-10-30,Started,Medium,Program\n"
        }))
        .expect("request deserializes");

        let Json(overview) = compliance_report_endpoint(Json(request))
            .await
            .expect("report builds");

        assert_eq!(overview.evaluated_on.to_string(), "2026-10-16");
        assert_eq!(overview.overall_status, OverallStatus::Critical);
        assert_eq!(overview.expired_documents.len(), 1);
        assert_eq!(overview.warning_items.len(), 1);
    }

    #[tokio::test]
    async fn report_endpoint_rejects_bad_csv_dates() {
        let request: ComplianceReportRequest = serde_json::from_value(json!({
            "tracking_csv": "Title,Deadline,Status,Priority,Category\nSingle audit,someday,,,\n"
        }))
        .expect("request deserializes");

        let err = compliance_report_endpoint(Json(request))
            .await
            .expect_err("bad date rejected");
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }
}
