use crate::infra::{model_config_with_overrides, parse_percentage};
use clap::Args;
use serde_json::{json, Value};
use std::path::PathBuf;
use student_performance::config::{AppConfig, ModelConfig};
use student_performance::error::AppError;
use student_performance::prediction::{
    sample_input, ModelArtifacts, PerformanceTier, PredictionResult, PredictionService,
    RawStudentInput, FEATURE_ORDER,
};

#[derive(Args, Debug, Default)]
pub(crate) struct ArtifactArgs {
    /// Classifier artifact (defaults to MODEL_PATH or model/modelo_rl.json)
    #[arg(long)]
    pub(crate) model: Option<PathBuf>,
    /// Normalizer artifact (defaults to SCALER_PATH or model/scaler.json)
    #[arg(long)]
    pub(crate) scaler: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub(crate) struct StudentArgs {
    /// Gender token, "M" or "F"
    #[arg(long)]
    pub(crate) genero: String,
    /// Family support, 1-5
    #[arg(long)]
    pub(crate) apoyo_familiar: i64,
    /// Family income level, 1-5
    #[arg(long)]
    pub(crate) ingresos_familiares: i64,
    /// Weekly study hours, 0-168
    #[arg(long)]
    pub(crate) horas_estudio: f64,
    /// Weekly extracurricular hours, 0-40
    #[arg(long)]
    pub(crate) actividades_extra: f64,
    /// Parental education level, 1-5
    #[arg(long)]
    pub(crate) nivel_educativo_padres: i64,
    /// Internet access at home, 0 or 1
    #[arg(long)]
    pub(crate) acceso_internet: i64,
    /// Family climate, 1-5
    #[arg(long)]
    pub(crate) clima_familiar: i64,
    /// Attendance percentage, 0-100
    #[arg(long, value_parser = parse_percentage)]
    pub(crate) asistencia: f64,
    /// Motivation, 1-5
    #[arg(long)]
    pub(crate) motivacion: i64,
}

impl StudentArgs {
    /// Request object with the same keys the HTTP endpoint accepts.
    pub(crate) fn to_raw(&self) -> RawStudentInput {
        [
            ("genero", json!(self.genero)),
            ("apoyo_familiar", json!(self.apoyo_familiar)),
            ("ingresos_familiares", json!(self.ingresos_familiares)),
            ("horas_estudio", json!(self.horas_estudio)),
            ("actividades_extra", json!(self.actividades_extra)),
            ("nivel_educativo_padres", json!(self.nivel_educativo_padres)),
            ("acceso_internet", json!(self.acceso_internet)),
            ("clima_familiar", json!(self.clima_familiar)),
            ("asistencia", json!(self.asistencia)),
            ("motivacion", json!(self.motivacion)),
        ]
        .into_iter()
        .map(|(key, value)| (key.to_string(), value))
        .collect()
    }
}

#[derive(Args, Debug)]
pub(crate) struct PredictArgs {
    #[command(flatten)]
    pub(crate) student: StudentArgs,
    /// Print the result as JSON instead of a readable report
    #[arg(long)]
    pub(crate) json: bool,
    #[command(flatten)]
    pub(crate) artifacts: ArtifactArgs,
}

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Print the result as JSON instead of a readable report
    #[arg(long)]
    pub(crate) json: bool,
    #[command(flatten)]
    pub(crate) artifacts: ArtifactArgs,
}

pub(crate) fn run_predict(args: PredictArgs) -> Result<(), AppError> {
    let PredictArgs {
        student,
        json,
        artifacts,
    } = args;

    let service = load_service(artifacts)?;
    let raw = student.to_raw();
    let result = service.predict(&raw)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        render_input(&raw);
        render_result(&result);
    }
    Ok(())
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let service = load_service(args.artifacts)?;
    let (sent, result) = service.run_sample()?;

    if args.json {
        let payload = json!({
            "mensaje": "Prueba exitosa",
            "datos_enviados": sent,
            "resultado": result,
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }

    println!("Student performance demo (built-in sample)");
    render_input(&sent);
    render_result(&result);
    Ok(())
}

pub(crate) fn run_check(args: ArtifactArgs) -> Result<(), AppError> {
    let config = resolve_model_config(args)?;
    println!("Model artifact:  {}", config.model_path.display());
    println!("Scaler artifact: {}", config.scaler_path.display());

    let artifacts = ModelArtifacts::load(&config.model_path, &config.scaler_path)?;
    let classifier = &artifacts.classifier;
    let normalizer = &artifacts.normalizer;

    println!("\nNormalizer");
    println!("  Kind: {}", normalizer.kind());
    println!("  Features expected: {}", normalizer.n_features());
    render_feature_names(normalizer.feature_names());

    println!("\nClassifier");
    println!(
        "  Features expected: {}",
        classifier.coefficients.first().map_or(0, Vec::len)
    );
    let tiers: Vec<String> = classifier
        .classes
        .iter()
        .map(|id| match PerformanceTier::from_class_id(*id) {
            Some(tier) => format!("{id} => {}", tier.label()),
            None => format!("{id} => ?"),
        })
        .collect();
    println!("  Classes: {}", tiers.join(", "));
    render_feature_names(classifier.feature_names.as_deref());
    if classifier.metrics.is_empty() {
        println!("  Training metrics: none recorded");
    } else {
        println!("  Training metrics:");
        for (name, value) in &classifier.metrics {
            println!("    {name}: {value}");
        }
    }

    let service =
        PredictionService::with_artifacts(artifacts).strict(config.strict_validation);
    let (_, result) = service.run_sample()?;
    println!("\nSample prediction");
    render_result(&result);
    Ok(())
}

fn resolve_model_config(args: ArtifactArgs) -> Result<ModelConfig, AppError> {
    let base = AppConfig::load()?.model;
    Ok(model_config_with_overrides(base, args.model, args.scaler))
}

/// One-shot commands fail fast instead of running degraded.
fn load_service(args: ArtifactArgs) -> Result<PredictionService, AppError> {
    let config = resolve_model_config(args)?;
    let artifacts = ModelArtifacts::load(&config.model_path, &config.scaler_path)?;
    Ok(PredictionService::with_artifacts(artifacts).strict(config.strict_validation))
}

fn render_feature_names(names: Option<&[String]>) {
    match names {
        Some(names) => {
            println!("  Feature names:");
            for (index, name) in names.iter().enumerate() {
                println!("    {}. {}", index + 1, name);
            }
        }
        None => println!("  Feature names: not recorded"),
    }
}

fn render_input(raw: &RawStudentInput) {
    println!("\nStudent");
    for field in FEATURE_ORDER {
        let value = raw
            .get(field.key())
            .map(display_value)
            .unwrap_or_else(|| "-".to_string());
        println!("  {:<32} {}", field.label(), value);
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

fn render_result(result: &PredictionResult) {
    println!(
        "\nPrediction: {} (confidence {:.1}%)",
        result.prediction.label(),
        result.confidence * 100.0
    );
    println!("Probabilities:");
    for tier in [
        PerformanceTier::High,
        PerformanceTier::Medium,
        PerformanceTier::Low,
    ] {
        println!(
            "  {:<6} {:>6.2}%",
            tier.label(),
            result.probabilities.get(tier) * 100.0
        );
    }

    println!("Key factors:");
    for factor in &result.key_factors {
        println!("  - {factor}");
    }

    println!("Recommendations:");
    for recommendation in &result.recommendations {
        println!("  - {recommendation}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use student_performance::prediction::StudentFeatures;

    fn sample_student() -> StudentArgs {
        StudentArgs {
            genero: "F".to_string(),
            apoyo_familiar: 4,
            ingresos_familiares: 3,
            horas_estudio: 15.0,
            actividades_extra: 5.0,
            nivel_educativo_padres: 4,
            acceso_internet: 1,
            clima_familiar: 4,
            asistencia: 90.0,
            motivacion: 4,
        }
    }

    #[test]
    fn student_args_cover_every_feature_key() {
        let raw = sample_student().to_raw();
        for field in FEATURE_ORDER {
            assert!(raw.contains_key(field.key()), "missing {}", field.key());
        }
        assert_eq!(raw.len(), FEATURE_ORDER.len());
    }

    #[test]
    fn student_args_encode_like_builtin_sample() {
        let from_args = StudentFeatures::from_raw(&sample_student().to_raw()).expect("valid");
        let from_sample = StudentFeatures::from_raw(&sample_input()).expect("valid");
        assert_eq!(from_args.to_vector(), from_sample.to_vector());
    }

    #[test]
    fn out_of_range_student_is_rejected_by_pipeline() {
        let mut student = sample_student();
        student.motivacion = 9;
        let err = StudentFeatures::from_raw(&student.to_raw()).expect_err("out of range");
        assert_eq!(err.field(), "motivacion");
    }

    #[test]
    fn display_value_unquotes_strings() {
        assert_eq!(display_value(&json!("F")), "F");
        assert_eq!(display_value(&json!(90.5)), "90.5");
    }
}
