use serde_json::Value;
use thiserror::Error;

use super::features::{token_text, FeatureField, FieldKind, Gender, FEATURE_ORDER};
use super::RawStudentInput;

/// Rejection of a raw request field. Messages are surfaced to API clients.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Campo faltante: {field}")]
    MissingField { field: &'static str },
    #[error("Género debe ser M o F. Valor recibido: {value}")]
    InvalidGender { value: String },
    #[error("Error en conversión de datos: {field} debe ser numérico. Valor recibido: {value}")]
    Malformed { field: &'static str, value: String },
    #[error("{field} debe estar entre {min} y {max}. Valor recibido: {value}")]
    OutOfRange {
        field: &'static str,
        min: f64,
        max: f64,
        value: f64,
    },
}

impl ValidationError {
    /// Wire key of the offending field.
    pub fn field(&self) -> &'static str {
        match self {
            Self::MissingField { field }
            | Self::Malformed { field, .. }
            | Self::OutOfRange { field, .. } => field,
            Self::InvalidGender { .. } => FeatureField::Gender.key(),
        }
    }
}

/// Required keys absent from the request, in feature order.
pub fn missing_fields(raw: &RawStudentInput) -> Vec<&'static str> {
    FEATURE_ORDER
        .iter()
        .map(|field| field.key())
        .filter(|key| !raw.contains_key(*key))
        .collect()
}

/// Strict gate: every field present, gender `M`/`F`, numerics coercible and in range.
///
/// The encoder itself tolerates unknown gender tokens; this check is the only
/// place they are rejected.
pub fn validate_input(raw: &RawStudentInput) -> Result<(), ValidationError> {
    if let Some(field) = missing_fields(raw).into_iter().next() {
        return Err(ValidationError::MissingField { field });
    }

    for field in FEATURE_ORDER {
        let value = &raw[field.key()];
        match field.kind() {
            FieldKind::Categorical { .. } => {
                let token = token_text(value);
                if Gender::parse_strict(&token).is_none() {
                    return Err(ValidationError::InvalidGender { value: token });
                }
            }
            FieldKind::Integer { .. } => {
                coerce_integer(field, value)?;
            }
            FieldKind::Decimal { .. } => {
                coerce_decimal(field, value)?;
            }
        }
    }

    Ok(())
}

/// Integer coercion: integers, finite floats (truncated), booleans, and
/// base-10 integer strings. The result is range-checked.
pub(crate) fn coerce_integer(field: FeatureField, value: &Value) -> Result<i64, ValidationError> {
    let parsed = match value {
        Value::Number(number) => number
            .as_i64()
            .or_else(|| number.as_f64().map(|float| float.trunc() as i64)),
        Value::Bool(flag) => Some(i64::from(*flag)),
        Value::String(text) => text.trim().parse::<i64>().ok(),
        _ => None,
    };

    let parsed = parsed.ok_or_else(|| malformed(field, value))?;
    check_range(field, parsed as f64)?;
    Ok(parsed)
}

/// Decimal coercion: any JSON number, booleans, and decimal strings. The
/// result is range-checked.
pub(crate) fn coerce_decimal(field: FeatureField, value: &Value) -> Result<f64, ValidationError> {
    let parsed = match value {
        Value::Number(number) => number.as_f64(),
        Value::Bool(flag) => Some(if *flag { 1.0 } else { 0.0 }),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    };

    let parsed = parsed.ok_or_else(|| malformed(field, value))?;
    check_range(field, parsed)?;
    Ok(parsed)
}

fn check_range(field: FeatureField, value: f64) -> Result<(), ValidationError> {
    let (min, max) = match field.kind() {
        FieldKind::Integer { min, max } => (min as f64, max as f64),
        FieldKind::Decimal { min, max } => (min, max),
        FieldKind::Categorical { .. } => return Ok(()),
    };

    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(ValidationError::OutOfRange {
            field: field.key(),
            min,
            max,
            value,
        })
    }
}

fn malformed(field: FeatureField, value: &Value) -> ValidationError {
    ValidationError::Malformed {
        field: field.key(),
        value: token_text(value),
    }
}
