use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tracing::{error, warn};

use super::features::FEATURE_ORDER;
use super::service::{PredictionError, PredictionService};
use super::RawStudentInput;

/// Router builder exposing health, prediction, model metadata, and smoke-test endpoints.
pub fn prediction_router(service: Arc<PredictionService>) -> Router {
    Router::new()
        .route("/api/health", get(health_handler))
        .route("/api/predict", post(predict_handler))
        .route("/api/model-info", get(model_info_handler))
        .route("/api/test", get(sample_handler))
        .with_state(service)
}

pub(crate) async fn health_handler(State(service): State<Arc<PredictionService>>) -> Response {
    let status = service.status();
    if status.ready {
        let payload = json!({
            "status": "healthy",
            "modelo_cargado": true,
            "mensaje": "Sistema funcionando correctamente",
            "cargado_en": status.loaded_at,
        });
        (StatusCode::OK, Json(payload)).into_response()
    } else {
        let payload = json!({
            "status": "error",
            "modelo_cargado": false,
            "mensaje": "Modelo no cargado. Coloca modelo_rl.json y scaler.json en model/",
            "detalle": status.reason,
        });
        (StatusCode::INTERNAL_SERVER_ERROR, Json(payload)).into_response()
    }
}

pub(crate) async fn predict_handler(
    State(service): State<Arc<PredictionService>>,
    body: Bytes,
) -> Response {
    if !service.is_ready() {
        let payload = json!({
            "error": "Modelo no disponible",
            "detalle": "Los archivos modelo_rl.json y scaler.json deben estar en model/",
        });
        return (StatusCode::INTERNAL_SERVER_ERROR, Json(payload)).into_response();
    }

    let raw = match parse_body(&body) {
        Ok(raw) => raw,
        Err(detail) => {
            warn!(%detail, "prediction request without usable body");
            let payload = json!({
                "error": "No se recibieron datos",
                "detalle": detail,
            });
            return (StatusCode::BAD_REQUEST, Json(payload)).into_response();
        }
    };

    match service.predict(&raw) {
        Ok(result) => (StatusCode::OK, Json(result)).into_response(),
        Err(err) => prediction_error_response(err),
    }
}

pub(crate) async fn model_info_handler(
    State(service): State<Arc<PredictionService>>,
) -> Response {
    (StatusCode::OK, Json(service.model_info())).into_response()
}

pub(crate) async fn sample_handler(State(service): State<Arc<PredictionService>>) -> Response {
    if !service.is_ready() {
        let payload = json!({ "error": "Modelo no disponible" });
        return (StatusCode::INTERNAL_SERVER_ERROR, Json(payload)).into_response();
    }

    match service.run_sample() {
        Ok((sent, result)) => {
            let payload = json!({
                "mensaje": "Prueba exitosa",
                "datos_enviados": sent,
                "resultado": result,
            });
            (StatusCode::OK, Json(payload)).into_response()
        }
        Err(err) => {
            error!(error = %err, "sample prediction failed");
            let payload = json!({
                "error": "Error en prueba",
                "detalle": err.to_string(),
            });
            (StatusCode::INTERNAL_SERVER_ERROR, Json(payload)).into_response()
        }
    }
}

/// Accepts only a non-empty JSON object.
fn parse_body(body: &[u8]) -> Result<RawStudentInput, String> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err("El body del request debe contener datos en formato JSON".to_string());
    }

    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(map)) if !map.is_empty() => Ok(map),
        Ok(_) => Err("El body del request debe ser un objeto JSON con datos".to_string()),
        Err(err) => Err(format!("JSON inválido: {err}")),
    }
}

fn prediction_error_response(err: PredictionError) -> Response {
    match err {
        PredictionError::MissingFields { missing } => {
            let required: Vec<&str> = FEATURE_ORDER.iter().map(|field| field.key()).collect();
            let payload = json!({
                "error": "Campos faltantes",
                "campos_requeridos": required,
                "campos_faltantes": missing,
            });
            (StatusCode::BAD_REQUEST, Json(payload)).into_response()
        }
        PredictionError::Validation(error) => {
            let payload = json!({
                "error": "Error en validación de datos",
                "campo": error.field(),
                "detalle": error.to_string(),
            });
            (StatusCode::BAD_REQUEST, Json(payload)).into_response()
        }
        PredictionError::ModelUnavailable { reason } => {
            let payload = json!({
                "error": "Modelo no disponible",
                "detalle": reason,
            });
            (StatusCode::INTERNAL_SERVER_ERROR, Json(payload)).into_response()
        }
        other @ PredictionError::Inference(_) => {
            let payload = json!({
                "error": "Error interno del servidor",
                "detalle": other.to_string(),
            });
            (StatusCode::INTERNAL_SERVER_ERROR, Json(payload)).into_response()
        }
    }
}
