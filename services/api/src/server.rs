use crate::cli::ServeArgs;
use crate::infra::AppState;
use crate::routes;
use axum_prometheus::PrometheusMetricLayer;
use std::sync::Arc;
use student_performance::config::AppConfig;
use student_performance::error::AppError;
use student_performance::prediction::PredictionService;
use student_performance::telemetry;
use tracing::{info, warn};

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let service = Arc::new(PredictionService::initialize(&config.model));
    if !service.is_ready() {
        warn!("starting without a usable model; /api/health will report the failure");
    }

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let app_state = AppState {
        metrics: Arc::new(prometheus_handle),
    };

    let app = routes::app(service.clone(), app_state).layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!(
        ?config.environment,
        %addr,
        model_ready = service.is_ready(),
        strict_validation = config.model.strict_validation,
        "student performance api ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
