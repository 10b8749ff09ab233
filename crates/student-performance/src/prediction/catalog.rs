use serde::Serialize;
use serde_json::json;

use super::features::{FeatureField, FieldKind, FEATURE_ORDER};
use super::RawStudentInput;

pub const MODEL_NAME: &str = "Regresión Logística";
pub const MODEL_DESCRIPTION: &str = "Modelo de clasificación para predecir rendimiento académico";

/// Class names as listed by the model metadata.
pub const CLASS_LABELS: [&str; 3] = ["Alto", "Medio", "Bajo"];

/// Built-in student used by the smoke test endpoint and the CLI demo.
pub fn sample_input() -> RawStudentInput {
    [
        ("genero", json!("F")),
        ("apoyo_familiar", json!(4)),
        ("ingresos_familiares", json!(3)),
        ("horas_estudio", json!(15)),
        ("actividades_extra", json!(5)),
        ("nivel_educativo_padres", json!(4)),
        ("acceso_internet", json!(1)),
        ("clima_familiar", json!(4)),
        ("asistencia", json!(90)),
        ("motivacion", json!(4)),
    ]
    .into_iter()
    .map(|(key, value)| (key.to_string(), value))
    .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VariableInfo {
    pub nombre: &'static str,
    pub clave: &'static str,
    pub tipo: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rango: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valores: Option<serde_json::Value>,
}

impl VariableInfo {
    fn describe(field: FeatureField) -> Self {
        let (tipo, rango, valores) = match (field, field.kind()) {
            (_, FieldKind::Categorical { values }) => ("Categórico", None, Some(json!(values))),
            (FeatureField::InternetAccess, FieldKind::Integer { min, max }) => {
                ("Binario", None, Some(json!([min, max])))
            }
            (_, FieldKind::Integer { min, max }) => ("Numérico", Some(format!("{min}-{max}")), None),
            (FeatureField::Attendance, FieldKind::Decimal { min, max }) => {
                ("Numérico", Some(format!("{min}-{max}%")), None)
            }
            (_, FieldKind::Decimal { min, max }) => ("Numérico", Some(format!("{min}-{max}")), None),
        };

        Self {
            nombre: field.label(),
            clave: field.key(),
            tipo,
            rango,
            valores,
        }
    }
}

pub fn variables() -> Vec<VariableInfo> {
    FEATURE_ORDER.into_iter().map(VariableInfo::describe).collect()
}
