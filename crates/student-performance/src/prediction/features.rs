use serde::Serialize;
use serde_json::Value;

use super::validation::{coerce_decimal, coerce_integer, ValidationError};
use super::RawStudentInput;

/// Number of columns the normalizer and classifier were fit with.
pub const FEATURE_COUNT: usize = 10;

/// Column order shared by training and inference. Reordering this silently
/// breaks every prediction, so the artifacts may also carry the column names
/// and are checked against it at load time.
pub const FEATURE_ORDER: [FeatureField; FEATURE_COUNT] = [
    FeatureField::Gender,
    FeatureField::FamilySupport,
    FeatureField::FamilyIncome,
    FeatureField::StudyHours,
    FeatureField::ExtracurricularHours,
    FeatureField::ParentalEducation,
    FeatureField::InternetAccess,
    FeatureField::FamilyClimate,
    FeatureField::Attendance,
    FeatureField::Motivation,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeatureField {
    Gender,
    FamilySupport,
    FamilyIncome,
    StudyHours,
    ExtracurricularHours,
    ParentalEducation,
    InternetAccess,
    FamilyClimate,
    Attendance,
    Motivation,
}

/// How a field is coerced and which values it accepts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldKind {
    Categorical { values: [&'static str; 2] },
    Integer { min: i64, max: i64 },
    Decimal { min: f64, max: f64 },
}

impl FeatureField {
    /// Request key used on the wire.
    pub const fn key(self) -> &'static str {
        match self {
            Self::Gender => "genero",
            Self::FamilySupport => "apoyo_familiar",
            Self::FamilyIncome => "ingresos_familiares",
            Self::StudyHours => "horas_estudio",
            Self::ExtracurricularHours => "actividades_extra",
            Self::ParentalEducation => "nivel_educativo_padres",
            Self::InternetAccess => "acceso_internet",
            Self::FamilyClimate => "clima_familiar",
            Self::Attendance => "asistencia",
            Self::Motivation => "motivacion",
        }
    }

    /// Column name the artifacts were trained with.
    pub const fn column(self) -> &'static str {
        match self {
            Self::Gender => "Genero",
            Self::FamilySupport => "Apoyo_Familiar",
            Self::FamilyIncome => "Ingresos_Familiares",
            Self::StudyHours => "Horas_Estudio",
            Self::ExtracurricularHours => "Actividades_Extra",
            Self::ParentalEducation => "Nivel_Educativo_Padres",
            Self::InternetAccess => "Acceso_Internet",
            Self::FamilyClimate => "Clima_Familiar",
            Self::Attendance => "Asistencia",
            Self::Motivation => "Motivacion",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Gender => "Género",
            Self::FamilySupport => "Apoyo Familiar",
            Self::FamilyIncome => "Ingresos Familiares",
            Self::StudyHours => "Horas de Estudio",
            Self::ExtracurricularHours => "Actividades Extracurriculares",
            Self::ParentalEducation => "Nivel Educativo Padres",
            Self::InternetAccess => "Acceso a Internet",
            Self::FamilyClimate => "Clima Familiar",
            Self::Attendance => "Asistencia",
            Self::Motivation => "Motivación",
        }
    }

    pub const fn kind(self) -> FieldKind {
        match self {
            Self::Gender => FieldKind::Categorical { values: ["M", "F"] },
            Self::FamilySupport
            | Self::FamilyIncome
            | Self::ParentalEducation
            | Self::FamilyClimate
            | Self::Motivation => FieldKind::Integer { min: 1, max: 5 },
            Self::InternetAccess => FieldKind::Integer { min: 0, max: 1 },
            Self::StudyHours => FieldKind::Decimal {
                min: 0.0,
                max: 168.0,
            },
            Self::ExtracurricularHours => FieldKind::Decimal {
                min: 0.0,
                max: 40.0,
            },
            Self::Attendance => FieldKind::Decimal {
                min: 0.0,
                max: 100.0,
            },
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        FEATURE_ORDER.into_iter().find(|field| field.key() == key)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Gender {
    #[serde(rename = "M")]
    Male,
    #[serde(rename = "F")]
    Female,
}

impl Gender {
    /// Case-insensitive `M`/`F`; anything else is rejected.
    pub fn parse_strict(raw: &str) -> Option<Self> {
        match raw.to_uppercase().as_str() {
            "M" => Some(Self::Male),
            "F" => Some(Self::Female),
            _ => None,
        }
    }

    /// Encoder mapping: unrecognized tokens fall back to `Male` instead of failing.
    pub fn encode_lenient(raw: &Value) -> Self {
        Self::parse_strict(&token_text(raw)).unwrap_or(Self::Male)
    }

    pub const fn code(self) -> u8 {
        match self {
            Self::Male => 0,
            Self::Female => 1,
        }
    }
}

/// Textual form of a raw token; non-string JSON values use their JSON rendering.
pub(crate) fn token_text(raw: &Value) -> String {
    match raw {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// One student's attributes after coercion and range checks.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudentFeatures {
    pub gender: Gender,
    pub family_support: u8,
    pub family_income: u8,
    pub study_hours: f64,
    pub extracurricular_hours: f64,
    pub parental_education: u8,
    pub internet_access: u8,
    pub family_climate: u8,
    pub attendance: f64,
    pub motivation: u8,
}

impl StudentFeatures {
    /// Coerces and range-checks every numeric field. Gender is encoded leniently.
    pub fn from_raw(raw: &RawStudentInput) -> Result<Self, ValidationError> {
        let gender = Gender::encode_lenient(field_value(raw, FeatureField::Gender)?);

        Ok(Self {
            gender,
            family_support: ordinal(raw, FeatureField::FamilySupport)?,
            family_income: ordinal(raw, FeatureField::FamilyIncome)?,
            study_hours: bounded(raw, FeatureField::StudyHours)?,
            extracurricular_hours: bounded(raw, FeatureField::ExtracurricularHours)?,
            parental_education: ordinal(raw, FeatureField::ParentalEducation)?,
            internet_access: ordinal(raw, FeatureField::InternetAccess)?,
            family_climate: ordinal(raw, FeatureField::FamilyClimate)?,
            attendance: bounded(raw, FeatureField::Attendance)?,
            motivation: ordinal(raw, FeatureField::Motivation)?,
        })
    }

    /// Raw (unnormalized) value of a single field.
    pub fn value(&self, field: FeatureField) -> f64 {
        match field {
            FeatureField::Gender => f64::from(self.gender.code()),
            FeatureField::FamilySupport => f64::from(self.family_support),
            FeatureField::FamilyIncome => f64::from(self.family_income),
            FeatureField::StudyHours => self.study_hours,
            FeatureField::ExtracurricularHours => self.extracurricular_hours,
            FeatureField::ParentalEducation => f64::from(self.parental_education),
            FeatureField::InternetAccess => f64::from(self.internet_access),
            FeatureField::FamilyClimate => f64::from(self.family_climate),
            FeatureField::Attendance => self.attendance,
            FeatureField::Motivation => f64::from(self.motivation),
        }
    }

    pub fn to_vector(&self) -> FeatureVector {
        FeatureVector(FEATURE_ORDER.map(|field| self.value(field)))
    }
}

/// Fixed-order numeric encoding fed to the normalizer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureVector(pub [f64; FEATURE_COUNT]);

impl FeatureVector {
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }
}

fn field_value(raw: &RawStudentInput, field: FeatureField) -> Result<&Value, ValidationError> {
    raw.get(field.key())
        .ok_or(ValidationError::MissingField { field: field.key() })
}

fn ordinal(raw: &RawStudentInput, field: FeatureField) -> Result<u8, ValidationError> {
    let value = coerce_integer(field, field_value(raw, field)?)?;
    // Range-checked above, so the value fits.
    Ok(value as u8)
}

fn bounded(raw: &RawStudentInput, field: FeatureField) -> Result<f64, ValidationError> {
    coerce_decimal(field, field_value(raw, field)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prediction::sample_input;
    use serde_json::json;

    #[test]
    fn feature_order_matches_training_columns() {
        let columns: Vec<&str> = FEATURE_ORDER.iter().map(|field| field.column()).collect();
        assert_eq!(
            columns,
            vec![
                "Genero",
                "Apoyo_Familiar",
                "Ingresos_Familiares",
                "Horas_Estudio",
                "Actividades_Extra",
                "Nivel_Educativo_Padres",
                "Acceso_Internet",
                "Clima_Familiar",
                "Asistencia",
                "Motivacion",
            ]
        );
    }

    #[test]
    fn sample_encodes_in_feature_order() {
        let features = StudentFeatures::from_raw(&sample_input()).expect("sample is valid");
        assert_eq!(
            features.to_vector().0,
            [1.0, 4.0, 3.0, 15.0, 5.0, 4.0, 1.0, 4.0, 90.0, 4.0]
        );
    }

    #[test]
    fn gender_matching_is_case_insensitive() {
        assert_eq!(Gender::encode_lenient(&json!("m")), Gender::Male);
        assert_eq!(Gender::encode_lenient(&json!("M")), Gender::Male);
        assert_eq!(Gender::encode_lenient(&json!("f")), Gender::Female);
        assert_eq!(Gender::encode_lenient(&json!("F")), Gender::Female);
    }

    #[test]
    fn unrecognized_gender_defaults_to_male_encoding() {
        for token in [json!("X"), json!("female"), json!(""), json!(1), json!(null)] {
            assert_eq!(Gender::encode_lenient(&token).code(), 0, "token {token}");
        }

        let mut raw = sample_input();
        raw.insert("genero".to_string(), json!("otro"));
        let features = StudentFeatures::from_raw(&raw).expect("lenient gender does not fail");
        assert_eq!(features.to_vector().0[0], 0.0);
    }

    #[test]
    fn accepts_numeric_strings_and_truncates_integer_floats() {
        let mut raw = sample_input();
        raw.insert("apoyo_familiar".to_string(), json!(" 5 "));
        raw.insert("motivacion".to_string(), json!(2.9));
        raw.insert("horas_estudio".to_string(), json!("12.5"));
        raw.insert("acceso_internet".to_string(), json!(true));

        let features = StudentFeatures::from_raw(&raw).expect("coercible input");
        assert_eq!(features.family_support, 5);
        assert_eq!(features.motivation, 2);
        assert_eq!(features.study_hours, 12.5);
        assert_eq!(features.internet_access, 1);
    }

    #[test]
    fn looks_up_fields_by_wire_key() {
        assert_eq!(
            FeatureField::from_key("asistencia"),
            Some(FeatureField::Attendance)
        );
        assert_eq!(FeatureField::from_key("Asistencia"), None);
    }
}
