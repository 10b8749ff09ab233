use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use super::artifacts::{ArtifactError, ModelArtifacts};
use super::catalog::{self, VariableInfo};
use super::factors::key_factors;
use super::features::{StudentFeatures, FEATURE_ORDER};
use super::inference::InferenceError;
use super::recommendations::recommendations;
use super::result::PredictionResult;
use super::validation::{missing_fields, validate_input, ValidationError};
use super::RawStudentInput;
use crate::config::ModelConfig;

#[derive(Debug, Error)]
pub enum PredictionError {
    #[error("model unavailable: {reason}")]
    ModelUnavailable { reason: String },
    #[error("missing required fields: {}", .missing.join(", "))]
    MissingFields { missing: Vec<&'static str> },
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("Error en la predicción: {0}")]
    Inference(#[from] InferenceError),
}

/// Outcome of the startup load.
#[derive(Debug, Clone)]
pub enum ModelState {
    Ready {
        artifacts: Arc<ModelArtifacts>,
        loaded_at: DateTime<Utc>,
    },
    Unavailable {
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelStatus {
    pub ready: bool,
    pub loaded_at: Option<DateTime<Utc>>,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelInfo {
    pub modelo: &'static str,
    pub descripcion: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metricas: Option<std::collections::BTreeMap<String, String>>,
    pub variables: Vec<VariableInfo>,
    pub clases: [&'static str; 3],
    pub orden_caracteristicas: Vec<&'static str>,
}

/// Request-independent context shared by every handler. Read-only after construction.
#[derive(Debug, Clone)]
pub struct PredictionService {
    state: ModelState,
    strict_validation: bool,
}

impl PredictionService {
    /// Loads both artifacts. A failed load leaves the service unavailable instead of failing.
    pub fn initialize(config: &ModelConfig) -> Self {
        let state = match ModelArtifacts::load(&config.model_path, &config.scaler_path) {
            Ok(artifacts) => {
                info!(
                    model = %config.model_path.display(),
                    scaler = %config.scaler_path.display(),
                    normalizer = artifacts.normalizer.kind(),
                    "model artifacts loaded"
                );
                ModelState::Ready {
                    artifacts: Arc::new(artifacts),
                    loaded_at: Utc::now(),
                }
            }
            Err(err) => {
                error!(
                    error = %err,
                    model = %config.model_path.display(),
                    scaler = %config.scaler_path.display(),
                    "model artifacts unavailable; serving in degraded mode"
                );
                ModelState::Unavailable {
                    reason: err.to_string(),
                }
            }
        };

        Self {
            state,
            strict_validation: config.strict_validation,
        }
    }

    pub fn with_artifacts(artifacts: ModelArtifacts) -> Self {
        Self {
            state: ModelState::Ready {
                artifacts: Arc::new(artifacts),
                loaded_at: Utc::now(),
            },
            strict_validation: false,
        }
    }

    pub fn unavailable(error: &ArtifactError) -> Self {
        Self {
            state: ModelState::Unavailable {
                reason: error.to_string(),
            },
            strict_validation: false,
        }
    }

    pub fn strict(mut self, strict_validation: bool) -> Self {
        self.strict_validation = strict_validation;
        self
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.state, ModelState::Ready { .. })
    }

    pub fn state(&self) -> &ModelState {
        &self.state
    }

    pub fn status(&self) -> ModelStatus {
        match &self.state {
            ModelState::Ready { loaded_at, .. } => ModelStatus {
                ready: true,
                loaded_at: Some(*loaded_at),
                reason: None,
            },
            ModelState::Unavailable { reason } => ModelStatus {
                ready: false,
                loaded_at: None,
                reason: Some(reason.clone()),
            },
        }
    }

    fn artifacts(&self) -> Result<&ModelArtifacts, PredictionError> {
        match &self.state {
            ModelState::Ready { artifacts, .. } => Ok(artifacts.as_ref()),
            ModelState::Unavailable { reason } => Err(PredictionError::ModelUnavailable {
                reason: reason.clone(),
            }),
        }
    }

    /// Runs the full pipeline for one raw request object.
    pub fn predict(&self, raw: &RawStudentInput) -> Result<PredictionResult, PredictionError> {
        let artifacts = self.artifacts()?;

        let missing = missing_fields(raw);
        if !missing.is_empty() {
            warn!(?missing, "prediction request missing fields");
            return Err(PredictionError::MissingFields { missing });
        }

        if self.strict_validation {
            validate_input(raw)?;
        }

        let features = StudentFeatures::from_raw(raw).map_err(|err| {
            warn!(field = err.field(), error = %err, "prediction request rejected");
            err
        })?;

        let inference = artifacts.infer(&features.to_vector()).map_err(|err| {
            error!(error = %err, "inference failed");
            err
        })?;

        info!(
            prediction = inference.tier.label(),
            confidence = inference.probabilities.max(),
            "prediction completed"
        );
        debug!(probabilities = ?inference.probabilities, "class probabilities");

        let factors = key_factors(&features);
        let advice = recommendations(inference.tier, &features);
        Ok(PredictionResult::assemble(inference, factors, advice))
    }

    /// Pipeline over the built-in sample student.
    pub fn run_sample(&self) -> Result<(RawStudentInput, PredictionResult), PredictionError> {
        let sample = catalog::sample_input();
        let result = self.predict(&sample)?;
        Ok((sample, result))
    }

    pub fn model_info(&self) -> ModelInfo {
        let metricas = match &self.state {
            ModelState::Ready { artifacts, .. } if !artifacts.classifier.metrics.is_empty() => {
                Some(artifacts.classifier.metrics.clone())
            }
            _ => None,
        };

        ModelInfo {
            modelo: catalog::MODEL_NAME,
            descripcion: catalog::MODEL_DESCRIPTION,
            metricas,
            variables: catalog::variables(),
            clases: catalog::CLASS_LABELS,
            orden_caracteristicas: FEATURE_ORDER.iter().map(|field| field.column()).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prediction::artifacts::tests::artifacts;
    use crate::prediction::inference::PerformanceTier;
    use crate::prediction::sample_input;
    use serde_json::json;
    use std::path::PathBuf;

    #[test]
    fn missing_artifacts_leave_service_unavailable() {
        let dir = tempfile::tempdir().expect("temp dir");
        let service = PredictionService::initialize(&ModelConfig {
            model_path: dir.path().join("modelo_rl.json"),
            scaler_path: PathBuf::from("scaler.json"),
            strict_validation: false,
        });

        assert!(!service.is_ready());
        let status = service.status();
        assert!(status.reason.expect("reason").contains("modelo_rl.json"));

        let err = service.predict(&sample_input()).expect_err("unavailable");
        assert!(matches!(err, PredictionError::ModelUnavailable { .. }));
    }

    #[test]
    fn model_check_precedes_field_checks() {
        let dir = tempfile::tempdir().expect("temp dir");
        let service = PredictionService::initialize(&ModelConfig {
            model_path: dir.path().join("absent.json"),
            scaler_path: dir.path().join("absent-scaler.json"),
            strict_validation: false,
        });
        let err = service
            .predict(&RawStudentInput::new())
            .expect_err("unavailable");
        assert!(matches!(err, PredictionError::ModelUnavailable { .. }));
    }

    #[test]
    fn sample_runs_through_full_pipeline() {
        let service = PredictionService::with_artifacts(artifacts());
        let (sent, result) = service.run_sample().expect("sample prediction");

        assert_eq!(sent, sample_input());
        assert_eq!(result.prediction, PerformanceTier::High);
        assert_eq!(result.confidence, result.probabilities.max());
        assert!((result.probabilities.sum() - 1.0).abs() < 1e-6);
        assert_eq!(result.recommendations.len(), 4);
        assert!(!result.key_factors.is_empty() && result.key_factors.len() <= 5);
    }

    #[test]
    fn reports_all_missing_fields() {
        let service = PredictionService::with_artifacts(artifacts());
        let mut raw = sample_input();
        raw.remove("clima_familiar");
        match service.predict(&raw) {
            Err(PredictionError::MissingFields { missing }) => {
                assert_eq!(missing, vec!["clima_familiar"])
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn strict_mode_rejects_unknown_gender_that_lenient_mode_accepts() {
        let mut raw = sample_input();
        raw.insert("genero".to_string(), json!("X"));

        let lenient = PredictionService::with_artifacts(artifacts());
        assert!(lenient.predict(&raw).is_ok());

        let strict = PredictionService::with_artifacts(artifacts()).strict(true);
        let err = strict.predict(&raw).expect_err("strict rejects");
        assert!(matches!(
            err,
            PredictionError::Validation(ValidationError::InvalidGender { .. })
        ));
    }

    #[test]
    fn model_info_lists_feature_order_and_metrics() {
        let mut loaded = artifacts();
        loaded
            .classifier
            .metrics
            .insert("precision_prueba".to_string(), "40.0%".to_string());
        let info = PredictionService::with_artifacts(loaded).model_info();

        assert_eq!(info.clases, ["Alto", "Medio", "Bajo"]);
        assert_eq!(info.orden_caracteristicas.first(), Some(&"Genero"));
        assert_eq!(info.variables.len(), 10);
        assert!(info.metricas.is_some());

        let unloaded = PredictionService::unavailable(&ArtifactError::NotFound {
            path: PathBuf::from("model/modelo_rl.json"),
        });
        assert!(unloaded.model_info().metricas.is_none());
    }
}
