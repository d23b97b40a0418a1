use crate::cli::ServeArgs;
use crate::infra::{default_rules, AppState};
use crate::routes::with_compliance_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use grantflow::compliance::{ComplianceService, InMemoryComplianceStore};
use grantflow::config::AppConfig;
use grantflow::error::AppError;
use grantflow::telemetry;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let store = Arc::new(InMemoryComplianceStore::with_rules(default_rules()));
    let thresholds = config.compliance.default_thresholds;
    let service = Arc::new(ComplianceService::new(store, thresholds));

    let app = with_compliance_routes(service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        critical_days = thresholds.critical,
        warning_days = thresholds.warning,
        info_days = thresholds.info,
        "grant compliance service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
