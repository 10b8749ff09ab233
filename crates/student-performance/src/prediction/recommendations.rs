use super::factors::Threshold;
use super::features::{FeatureField, StudentFeatures};
use super::inference::PerformanceTier;

pub const LOW_TIER: [&str; 5] = [
    "Incrementar las horas de estudio semanales",
    "Buscar apoyo tutorial o asesoría académica",
    "Mejorar la asistencia a clases",
    "Establecer un plan de estudio estructurado",
    "Fomentar la comunicación con la familia sobre el progreso académico",
];

/// Conditional suggestions for the medium tier, emitted in this order.
pub const MEDIUM_TIER_CONDITIONAL: [(FeatureField, Threshold, &str); 3] = [
    (
        FeatureField::StudyHours,
        Threshold::Below(10.0),
        "Aumentar gradualmente las horas de estudio",
    ),
    (
        FeatureField::Motivation,
        Threshold::AtMost(3.0),
        "Participar en actividades que refuercen el interés académico",
    ),
    (
        FeatureField::Attendance,
        Threshold::Below(85.0),
        "Mejorar la asistencia regular a clases",
    ),
];

pub const MEDIUM_TIER_CLOSING: [&str; 2] = [
    "Establecer metas académicas claras a corto plazo",
    "Mantener comunicación constante con docentes",
];

pub const HIGH_TIER: [&str; 4] = [
    "Mantener los buenos hábitos de estudio",
    "Participar en actividades de liderazgo académico",
    "Considerar programas de tutoría para apoyar a otros estudiantes",
    "Explorar oportunidades de investigación o proyectos avanzados",
];

pub fn recommendations(tier: PerformanceTier, features: &StudentFeatures) -> Vec<&'static str> {
    match tier {
        PerformanceTier::Low => LOW_TIER.to_vec(),
        PerformanceTier::Medium => MEDIUM_TIER_CONDITIONAL
            .iter()
            .filter(|(field, threshold, _)| threshold.matches(features.value(*field)))
            .map(|(_, _, text)| *text)
            .chain(MEDIUM_TIER_CLOSING)
            .collect(),
        PerformanceTier::High => HIGH_TIER.to_vec(),
    }
}
