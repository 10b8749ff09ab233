use serde::Serialize;

use super::inference::{ClassProbabilities, Inference, PerformanceTier};

/// Response record for one prediction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionResult {
    #[serde(rename = "prediccion")]
    pub prediction: PerformanceTier,
    #[serde(rename = "probabilidades")]
    pub probabilities: ClassProbabilities,
    #[serde(rename = "factores_clave")]
    pub key_factors: Vec<&'static str>,
    #[serde(rename = "recomendaciones")]
    pub recommendations: Vec<&'static str>,
    #[serde(rename = "confianza")]
    pub confidence: f64,
}

impl PredictionResult {
    pub fn assemble(
        inference: Inference,
        key_factors: Vec<&'static str>,
        recommendations: Vec<&'static str>,
    ) -> Self {
        Self {
            prediction: inference.tier,
            probabilities: inference.probabilities,
            key_factors,
            recommendations,
            confidence: inference.probabilities.max(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn serializes_with_wire_keys() {
        let result = PredictionResult::assemble(
            Inference {
                tier: PerformanceTier::Medium,
                probabilities: ClassProbabilities {
                    low: 0.25,
                    medium: 0.5,
                    high: 0.25,
                },
            },
            vec!["Alta Motivación"],
            vec!["Mantener comunicación constante con docentes"],
        );

        assert_eq!(result.confidence, 0.5);
        assert_eq!(
            serde_json::to_value(&result).expect("serializes"),
            json!({
                "prediccion": "Medio",
                "probabilidades": {"Bajo": 0.25, "Medio": 0.5, "Alto": 0.25},
                "factores_clave": ["Alta Motivación"],
                "recomendaciones": ["Mantener comunicación constante con docentes"],
                "confianza": 0.5
            })
        );
    }
}
