//! End-to-end checks of the prediction pipeline against the bundled model artifacts.

use std::path::PathBuf;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

use student_performance::config::ModelConfig;
use student_performance::prediction::{
    key_factors, prediction_router, recommendations, sample_input, PerformanceTier,
    PredictionError, PredictionService, StudentFeatures, DEFAULT_FACTORS, FEATURE_ORDER,
};

fn fixture_config() -> ModelConfig {
    let model_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../model");
    ModelConfig {
        model_path: model_dir.join("modelo_rl.json"),
        scaler_path: model_dir.join("scaler.json"),
        strict_validation: false,
    }
}

fn absent_config(dir: &tempfile::TempDir) -> ModelConfig {
    ModelConfig {
        model_path: dir.path().join("modelo_rl.json"),
        scaler_path: dir.path().join("scaler.json"),
        strict_validation: false,
    }
}

async fn read_json_body(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

#[test]
fn bundled_artifacts_load_and_predict_sample() {
    let service = PredictionService::initialize(&fixture_config());
    assert!(service.is_ready(), "status: {:?}", service.status());

    let (_, result) = service.run_sample().expect("sample prediction");
    let probabilities = result.probabilities;
    assert!((probabilities.sum() - 1.0).abs() < 1e-6);
    assert_eq!(result.confidence, probabilities.max());
    assert_eq!(probabilities.get(result.prediction), probabilities.max());
    assert!(!result.key_factors.is_empty() && result.key_factors.len() <= 5);
}

#[test]
fn sample_factors_follow_rule_order() {
    let features = StudentFeatures::from_raw(&sample_input()).expect("valid sample");
    assert_eq!(
        key_factors(&features),
        vec![
            "Alto Apoyo Familiar",
            "Buenos Hábitos de Estudio",
            "Alta Motivación",
            "Excelente Asistencia",
            "Buen Clima Familiar",
        ]
    );
}

#[test]
fn recommendation_counts_do_not_depend_on_features() {
    let mut weak = sample_input();
    for (key, value) in [
        ("apoyo_familiar", json!(1)),
        ("horas_estudio", json!(0)),
        ("motivacion", json!(1)),
        ("asistencia", json!(0)),
    ] {
        weak.insert(key.to_string(), value);
    }

    for raw in [sample_input(), weak] {
        let features = StudentFeatures::from_raw(&raw).expect("valid input");
        assert!(recommendations(PerformanceTier::Low, &features).len() >= 5);
        assert_eq!(recommendations(PerformanceTier::High, &features).len(), 4);
    }
}

#[test]
fn neutral_student_gets_default_factors() {
    let mut raw = sample_input();
    for (key, value) in [
        ("apoyo_familiar", json!(3)),
        ("ingresos_familiares", json!(3)),
        ("horas_estudio", json!(10)),
        ("nivel_educativo_padres", json!(3)),
        ("clima_familiar", json!(3)),
        ("asistencia", json!(80)),
        ("motivacion", json!(3)),
    ] {
        raw.insert(key.to_string(), value);
    }

    let features = StudentFeatures::from_raw(&raw).expect("valid input");
    assert_eq!(key_factors(&features), DEFAULT_FACTORS.to_vec());
}

#[test]
fn missing_each_field_is_reported_alone() {
    let service = PredictionService::initialize(&fixture_config());
    for field in FEATURE_ORDER {
        let mut raw = sample_input();
        raw.remove(field.key());
        match service.predict(&raw) {
            Err(PredictionError::MissingFields { missing }) => {
                assert_eq!(missing, vec![field.key()])
            }
            other => panic!("{} removed, got {other:?}", field.key()),
        }
    }
}

#[tokio::test]
async fn health_reflects_absent_artifacts() {
    let dir = tempfile::tempdir().expect("temp dir");
    let router = prediction_router(Arc::new(PredictionService::initialize(&absent_config(
        &dir,
    ))));

    let response = router
        .oneshot(Request::get("/api/health").body(Body::empty()).unwrap())
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let payload = read_json_body(response).await;
    assert_eq!(payload["modelo_cargado"], json!(false));
}

#[tokio::test]
async fn health_reflects_loaded_artifacts() {
    let router = prediction_router(Arc::new(PredictionService::initialize(&fixture_config())));

    let response = router
        .oneshot(Request::get("/api/health").body(Body::empty()).unwrap())
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["modelo_cargado"], json!(true));
}

#[tokio::test]
async fn predict_accepts_unknown_gender_token() {
    let router = prediction_router(Arc::new(PredictionService::initialize(&fixture_config())));
    let mut raw = sample_input();
    raw.insert("genero".to_string(), json!("No binario"));

    let response = router
        .oneshot(
            Request::post("/api/predict")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(&raw).unwrap()))
                .unwrap(),
        )
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    for key in ["prediccion", "probabilidades", "factores_clave", "recomendaciones", "confianza"] {
        assert!(payload.get(key).is_some(), "missing {key}");
    }
}

#[tokio::test]
async fn model_info_surfaces_training_metrics() {
    let router = prediction_router(Arc::new(PredictionService::initialize(&fixture_config())));

    let response = router
        .oneshot(Request::get("/api/model-info").body(Body::empty()).unwrap())
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["metricas"]["precision_prueba"], json!("40.0%"));
    assert_eq!(payload["orden_caracteristicas"][3], json!("Horas_Estudio"));
}
