//! Loading and validation of the pre-trained normalizer and classifier.
//!
//! Both artifacts are plain JSON exports of the fitted estimators. They are read
//! once at startup, checked for shape consistency, and never mutated afterwards.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Deserialize;
use thiserror::Error;

use super::features::{FEATURE_COUNT, FEATURE_ORDER};
use super::inference::CLASS_COUNT;

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("artifact not found at {}", .path.display())]
    NotFound { path: PathBuf },
    #[error("failed to read artifact {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("artifact {} is not valid JSON: {source}", .path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("artifact {}: {detail}", .path.display())]
    Shape { path: PathBuf, detail: String },
}

/// Feature scaling fitted at training time.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Normalizer {
    MinMax {
        data_min: Vec<f64>,
        data_max: Vec<f64>,
        #[serde(default)]
        feature_names: Option<Vec<String>>,
    },
    Standard {
        mean: Vec<f64>,
        scale: Vec<f64>,
        #[serde(default)]
        feature_names: Option<Vec<String>>,
    },
}

impl Normalizer {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MinMax { .. } => "min_max",
            Self::Standard { .. } => "standard",
        }
    }

    pub fn feature_names(&self) -> Option<&[String]> {
        match self {
            Self::MinMax { feature_names, .. } | Self::Standard { feature_names, .. } => {
                feature_names.as_deref()
            }
        }
    }

    pub fn n_features(&self) -> usize {
        match self {
            Self::MinMax { data_min, .. } => data_min.len(),
            Self::Standard { mean, .. } => mean.len(),
        }
    }

    /// Maps raw values into the scale the classifier was trained on.
    ///
    /// Constant columns (zero range or zero scale) are divided by 1.
    pub fn transform(&self, values: &[f64]) -> Vec<f64> {
        match self {
            Self::MinMax {
                data_min, data_max, ..
            } => values
                .iter()
                .zip(data_min.iter().zip(data_max))
                .map(|(value, (min, max))| (value - min) / non_zero(max - min))
                .collect(),
            Self::Standard { mean, scale, .. } => values
                .iter()
                .zip(mean.iter().zip(scale))
                .map(|(value, (mean, scale))| (value - mean) / non_zero(*scale))
                .collect(),
        }
    }

    fn validate(&self, path: &Path) -> Result<(), ArtifactError> {
        let (first, second, names) = match self {
            Self::MinMax {
                data_min,
                data_max,
                feature_names,
            } => (data_min, data_max, feature_names),
            Self::Standard {
                mean,
                scale,
                feature_names,
            } => (mean, scale, feature_names),
        };

        expect_len(path, "normalizer parameters", first.len(), FEATURE_COUNT)?;
        expect_len(path, "normalizer parameters", second.len(), FEATURE_COUNT)?;
        expect_finite(path, "normalizer parameters", first.iter().chain(second))?;
        check_feature_names(path, names.as_deref())
    }
}

fn non_zero(value: f64) -> f64 {
    if value == 0.0 {
        1.0
    } else {
        value
    }
}

/// Multinomial logistic regression weights.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Classifier {
    /// Class id for each probability column.
    pub classes: Vec<usize>,
    /// `[n_classes][n_features]`
    pub coefficients: Vec<Vec<f64>>,
    pub intercepts: Vec<f64>,
    #[serde(default)]
    pub feature_names: Option<Vec<String>>,
    /// Training metrics reported by `/api/model-info`.
    #[serde(default)]
    pub metrics: BTreeMap<String, String>,
}

impl Classifier {
    fn validate(&self, path: &Path) -> Result<(), ArtifactError> {
        expect_len(path, "classes", self.classes.len(), CLASS_COUNT)?;
        expect_len(path, "coefficient rows", self.coefficients.len(), CLASS_COUNT)?;
        expect_len(path, "intercepts", self.intercepts.len(), CLASS_COUNT)?;
        for row in &self.coefficients {
            expect_len(path, "coefficient columns", row.len(), FEATURE_COUNT)?;
        }
        expect_finite(
            path,
            "classifier weights",
            self.coefficients.iter().flatten().chain(&self.intercepts),
        )?;

        let mut seen = [false; CLASS_COUNT];
        for &class in &self.classes {
            match seen.get_mut(class) {
                Some(slot) if !*slot => *slot = true,
                _ => {
                    return Err(shape(
                        path,
                        format!("classes must be a permutation of 0..{CLASS_COUNT}, got {:?}", self.classes),
                    ))
                }
            }
        }

        check_feature_names(path, self.feature_names.as_deref())
    }
}

/// Both artifacts, validated against each other and the feature order.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelArtifacts {
    pub normalizer: Normalizer,
    pub classifier: Classifier,
}

impl ModelArtifacts {
    pub fn new(normalizer: Normalizer, classifier: Classifier) -> Result<Self, ArtifactError> {
        normalizer.validate(Path::new("<normalizer>"))?;
        classifier.validate(Path::new("<classifier>"))?;
        Ok(Self {
            normalizer,
            classifier,
        })
    }

    pub fn load(model_path: &Path, scaler_path: &Path) -> Result<Self, ArtifactError> {
        let classifier: Classifier = read_json(model_path)?;
        classifier.validate(model_path)?;

        let normalizer: Normalizer = read_json(scaler_path)?;
        normalizer.validate(scaler_path)?;

        Ok(Self {
            normalizer,
            classifier,
        })
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, ArtifactError> {
    let bytes = fs::read(path).map_err(|source| {
        if source.kind() == std::io::ErrorKind::NotFound {
            ArtifactError::NotFound {
                path: path.to_path_buf(),
            }
        } else {
            ArtifactError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;

    serde_json::from_slice(&bytes).map_err(|source| ArtifactError::Decode {
        path: path.to_path_buf(),
        source,
    })
}

fn shape(path: &Path, detail: String) -> ArtifactError {
    ArtifactError::Shape {
        path: path.to_path_buf(),
        detail,
    }
}

fn expect_len(path: &Path, what: &str, actual: usize, expected: usize) -> Result<(), ArtifactError> {
    if actual == expected {
        Ok(())
    } else {
        Err(shape(path, format!("expected {expected} {what}, found {actual}")))
    }
}

fn expect_finite<'a>(
    path: &Path,
    what: &str,
    mut values: impl Iterator<Item = &'a f64>,
) -> Result<(), ArtifactError> {
    if values.all(|value| value.is_finite()) {
        Ok(())
    } else {
        Err(shape(path, format!("{what} contain non-finite values")))
    }
}

fn check_feature_names(path: &Path, names: Option<&[String]>) -> Result<(), ArtifactError> {
    let Some(names) = names else {
        return Ok(());
    };

    let expected = FEATURE_ORDER.map(|field| field.column());
    if names.iter().map(String::as_str).eq(expected) {
        Ok(())
    } else {
        Err(shape(
            path,
            format!("feature_names {names:?} do not match expected order {expected:?}"),
        ))
    }
}
