use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Extension, Json, Router};
use serde_json::json;
use std::any::Any;
use std::sync::Arc;
use student_performance::prediction::{catalog, prediction_router, PredictionService};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any as AnyOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::error;

/// Full HTTP surface: prediction endpoints plus index, metrics, and fallbacks.
pub(crate) fn app(service: Arc<PredictionService>, state: AppState) -> Router {
    prediction_router(service)
        .route("/", get(index))
        .route("/metrics", get(metrics_endpoint))
        .fallback(not_found)
        .layer(Extension(state))
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(AnyOrigin)
                .allow_methods(AnyOrigin)
                .allow_headers(AnyOrigin),
        )
}

pub(crate) async fn index() -> Json<serde_json::Value> {
    Json(json!({
        "status": "online",
        "mensaje": "API de Predicción de Rendimiento Académico",
        "version": env!("CARGO_PKG_VERSION"),
        "modelo": catalog::MODEL_NAME,
        "endpoints": {
            "health": "/api/health",
            "predict": "/api/predict (POST)",
            "model_info": "/api/model-info",
            "test": "/api/test",
            "metrics": "/metrics",
        },
    }))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

pub(crate) async fn not_found() -> Response {
    let payload = json!({
        "error": "Ruta no encontrada",
        "mensaje": "El endpoint solicitado no existe",
    });
    (StatusCode::NOT_FOUND, Json(payload)).into_response()
}

fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic payload");
    error!(panic = detail, "request handler panicked");

    let payload = json!({
        "error": "Error interno del servidor",
        "mensaje": "Ocurrió un error inesperado",
    });
    (StatusCode::INTERNAL_SERVER_ERROR, Json(payload)).into_response()
}
