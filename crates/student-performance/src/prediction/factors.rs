//! Human-facing key factors derived from raw feature values.
//!
//! These thresholds are heuristics for the report, not a reading of the
//! classifier's weights.

use super::features::{FeatureField, StudentFeatures};

pub const MAX_FACTORS: usize = 5;

/// Emitted when no rule fires.
pub const DEFAULT_FACTORS: [&str; 3] = ["Apoyo Familiar", "Horas de Estudio", "Motivación"];

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Threshold {
    AtLeast(f64),
    AtMost(f64),
    Below(f64),
}

impl Threshold {
    pub fn matches(self, value: f64) -> bool {
        match self {
            Self::AtLeast(limit) => value >= limit,
            Self::AtMost(limit) => value <= limit,
            Self::Below(limit) => value < limit,
        }
    }
}

/// One feature's positive rule and optional warning rule. The warning is
/// only checked when the positive rule does not fire.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FactorRule {
    pub field: FeatureField,
    pub positive: (Threshold, &'static str),
    pub warning: Option<(Threshold, &'static str)>,
}

impl FactorRule {
    fn evaluate(&self, features: &StudentFeatures) -> Option<&'static str> {
        let value = features.value(self.field);
        let (threshold, label) = self.positive;
        if threshold.matches(value) {
            return Some(label);
        }
        self.warning
            .filter(|(threshold, _)| threshold.matches(value))
            .map(|(_, label)| label)
    }
}

/// Evaluation order is output order.
pub const FACTOR_RULES: [FactorRule; 7] = [
    FactorRule {
        field: FeatureField::FamilySupport,
        positive: (Threshold::AtLeast(4.0), "Alto Apoyo Familiar"),
        warning: Some((Threshold::AtMost(2.0), "Bajo Apoyo Familiar (⚠️)")),
    },
    FactorRule {
        field: FeatureField::StudyHours,
        positive: (Threshold::AtLeast(15.0), "Buenos Hábitos de Estudio"),
        warning: Some((Threshold::Below(5.0), "Pocas Horas de Estudio (⚠️)")),
    },
    FactorRule {
        field: FeatureField::Motivation,
        positive: (Threshold::AtLeast(4.0), "Alta Motivación"),
        warning: Some((Threshold::AtMost(2.0), "Baja Motivación (⚠️)")),
    },
    FactorRule {
        field: FeatureField::Attendance,
        positive: (Threshold::AtLeast(90.0), "Excelente Asistencia"),
        warning: Some((Threshold::Below(70.0), "Baja Asistencia (⚠️)")),
    },
    FactorRule {
        field: FeatureField::FamilyClimate,
        positive: (Threshold::AtLeast(4.0), "Buen Clima Familiar"),
        warning: None,
    },
    FactorRule {
        field: FeatureField::ParentalEducation,
        positive: (Threshold::AtLeast(4.0), "Alto Nivel Educativo de los Padres"),
        warning: None,
    },
    FactorRule {
        field: FeatureField::FamilyIncome,
        positive: (Threshold::AtLeast(4.0), "Buenos Recursos Económicos"),
        warning: Some((Threshold::AtMost(2.0), "Recursos Económicos Limitados (⚠️)")),
    },
];

pub fn key_factors(features: &StudentFeatures) -> Vec<&'static str> {
    let factors: Vec<&'static str> = FACTOR_RULES
        .iter()
        .filter_map(|rule| rule.evaluate(features))
        .take(MAX_FACTORS)
        .collect();

    if factors.is_empty() {
        DEFAULT_FACTORS.to_vec()
    } else {
        factors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prediction::features::Gender;

    fn neutral() -> StudentFeatures {
        StudentFeatures {
            gender: Gender::Male,
            family_support: 3,
            family_income: 3,
            study_hours: 10.0,
            extracurricular_hours: 5.0,
            parental_education: 3,
            internet_access: 1,
            family_climate: 3,
            attendance: 80.0,
            motivation: 3,
        }
    }

    #[test]
    fn falls_back_to_default_factors_when_nothing_fires() {
        assert_eq!(key_factors(&neutral()), DEFAULT_FACTORS.to_vec());
    }

    #[test]
    fn caps_at_five_in_rule_order() {
        let strong = StudentFeatures {
            family_support: 5,
            family_income: 5,
            study_hours: 30.0,
            parental_education: 5,
            family_climate: 5,
            attendance: 95.0,
            motivation: 5,
            ..neutral()
        };

        assert_eq!(
            key_factors(&strong),
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
    fn emits_warnings_for_low_values() {
        let weak = StudentFeatures {
            family_support: 1,
            family_income: 2,
            study_hours: 4.9,
            attendance: 69.9,
            motivation: 2,
            ..neutral()
        };

        assert_eq!(
            key_factors(&weak),
            vec![
                "Bajo Apoyo Familiar (⚠️)",
                "Pocas Horas de Estudio (⚠️)",
                "Baja Motivación (⚠️)",
                "Baja Asistencia (⚠️)",
                "Recursos Económicos Limitados (⚠️)",
            ]
        );
    }

    #[test]
    fn climate_and_parental_education_have_no_warning() {
        let features = StudentFeatures {
            family_climate: 1,
            parental_education: 1,
            ..neutral()
        };
        assert_eq!(key_factors(&features), DEFAULT_FACTORS.to_vec());
    }

    #[test]
    fn thresholds_are_inclusive_where_declared() {
        let at_edges = StudentFeatures {
            study_hours: 15.0,
            attendance: 90.0,
            ..neutral()
        };
        assert_eq!(
            key_factors(&at_edges),
            vec!["Buenos Hábitos de Estudio", "Excelente Asistencia"]
        );

        let just_inside = StudentFeatures {
            study_hours: 5.0,
            attendance: 70.0,
            ..neutral()
        };
        assert_eq!(key_factors(&just_inside), DEFAULT_FACTORS.to_vec());
    }
}
