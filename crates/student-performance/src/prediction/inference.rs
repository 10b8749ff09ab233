use serde::Serialize;
use thiserror::Error;

use super::artifacts::ModelArtifacts;
use super::features::FeatureVector;

pub const CLASS_COUNT: usize = 3;

/// Predicted academic-performance tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum PerformanceTier {
    #[serde(rename = "Bajo")]
    Low,
    #[serde(rename = "Medio")]
    Medium,
    #[serde(rename = "Alto")]
    High,
}

impl PerformanceTier {
    /// Class id → tier, in the order the classifier was trained with.
    pub const BY_CLASS_ID: [Self; CLASS_COUNT] = [Self::Low, Self::Medium, Self::High];

    pub fn from_class_id(id: usize) -> Option<Self> {
        Self::BY_CLASS_ID.get(id).copied()
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Low => "Bajo",
            Self::Medium => "Medio",
            Self::High => "Alto",
        }
    }
}

/// Probability per tier; serializes as the `Bajo`/`Medio`/`Alto` mapping.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ClassProbabilities {
    #[serde(rename = "Bajo")]
    pub low: f64,
    #[serde(rename = "Medio")]
    pub medium: f64,
    #[serde(rename = "Alto")]
    pub high: f64,
}

impl ClassProbabilities {
    pub fn get(&self, tier: PerformanceTier) -> f64 {
        match tier {
            PerformanceTier::Low => self.low,
            PerformanceTier::Medium => self.medium,
            PerformanceTier::High => self.high,
        }
    }

    pub fn max(&self) -> f64 {
        self.low.max(self.medium).max(self.high)
    }

    pub fn sum(&self) -> f64 {
        self.low + self.medium + self.high
    }
}

/// Output of the classifier for one feature vector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Inference {
    pub tier: PerformanceTier,
    pub probabilities: ClassProbabilities,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum InferenceError {
    #[error("feature vector has {actual} values but the model expects {expected}")]
    FeatureCountMismatch { expected: usize, actual: usize },
    #[error("model produced non-finite scores for the given input")]
    NonFiniteOutput,
}

impl ModelArtifacts {
    /// Normalizes the vector, scores every class, and picks the most probable tier.
    pub fn infer(&self, features: &FeatureVector) -> Result<Inference, InferenceError> {
        self.infer_slice(features.as_slice())
    }

    pub(crate) fn infer_slice(&self, values: &[f64]) -> Result<Inference, InferenceError> {
        let expected = self.normalizer.n_features();
        if values.len() != expected {
            return Err(InferenceError::FeatureCountMismatch {
                expected,
                actual: values.len(),
            });
        }

        let scaled = self.normalizer.transform(values);
        let logits: Vec<f64> = self
            .classifier
            .coefficients
            .iter()
            .zip(&self.classifier.intercepts)
            .map(|(weights, intercept)| {
                weights
                    .iter()
                    .zip(&scaled)
                    .map(|(weight, value)| weight * value)
                    .sum::<f64>()
                    + intercept
            })
            .collect();
        let probabilities = softmax(&logits)?;

        let mut by_tier = [0.0; CLASS_COUNT];
        for (column, &class) in self.classifier.classes.iter().enumerate() {
            by_tier[class] = probabilities[column];
        }

        let (best, _) = by_tier
            .iter()
            .enumerate()
            .fold((0, f64::NEG_INFINITY), |best, (index, &probability)| {
                if probability > best.1 {
                    (index, probability)
                } else {
                    best
                }
            });
        let tier = PerformanceTier::from_class_id(best).ok_or(InferenceError::NonFiniteOutput)?;

        Ok(Inference {
            tier,
            probabilities: ClassProbabilities {
                low: by_tier[0],
                medium: by_tier[1],
                high: by_tier[2],
            },
        })
    }
}

/// Softmax with max-subtraction. Fails instead of returning NaN probabilities.
fn softmax(logits: &[f64]) -> Result<Vec<f64>, InferenceError> {
    if logits.iter().any(|logit| !logit.is_finite()) {
        return Err(InferenceError::NonFiniteOutput);
    }

    let max = logits.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = logits.iter().map(|logit| (logit - max).exp()).collect();
    let total: f64 = exps.iter().sum();
    if !total.is_finite() || total <= 0.0 {
        return Err(InferenceError::NonFiniteOutput);
    }

    Ok(exps.into_iter().map(|value| value / total).collect())
}
