//! Request-to-prediction pipeline: validation, encoding, inference, and the
//! explanatory factors and recommendations attached to each result.

pub mod artifacts;
pub mod catalog;
pub mod factors;
pub mod features;
pub mod inference;
pub mod recommendations;
pub mod result;
pub mod router;
pub mod service;
pub mod validation;

/// Raw request object as received on the wire.
pub type RawStudentInput = serde_json::Map<String, serde_json::Value>;

pub use artifacts::{ArtifactError, Classifier, ModelArtifacts, Normalizer};
pub use catalog::sample_input;
pub use factors::{key_factors, FactorRule, Threshold, DEFAULT_FACTORS, FACTOR_RULES};
pub use features::{
    FeatureField, FeatureVector, FieldKind, Gender, StudentFeatures, FEATURE_COUNT, FEATURE_ORDER,
};
pub use inference::{ClassProbabilities, Inference, InferenceError, PerformanceTier};
pub use recommendations::recommendations;
pub use result::PredictionResult;
pub use router::prediction_router;
pub use service::{ModelInfo, ModelState, ModelStatus, PredictionError, PredictionService};
pub use validation::{missing_fields, validate_input, ValidationError};
