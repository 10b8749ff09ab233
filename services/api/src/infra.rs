use metrics_exporter_prometheus::PrometheusHandle;
use std::path::PathBuf;
use std::sync::Arc;
use student_performance::config::ModelConfig;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Resolves artifact paths for one-shot commands, preferring explicit flags over the environment.
pub(crate) fn model_config_with_overrides(
    base: ModelConfig,
    model: Option<PathBuf>,
    scaler: Option<PathBuf>,
) -> ModelConfig {
    ModelConfig {
        model_path: model.unwrap_or(base.model_path),
        scaler_path: scaler.unwrap_or(base.scaler_path),
        ..base
    }
}

/// Accepts percentages written either as `90` or `90%`.
pub(crate) fn parse_percentage(raw: &str) -> Result<f64, String> {
    let trimmed = raw.trim().trim_end_matches('%').trim();
    trimmed
        .parse::<f64>()
        .map_err(|err| format!("failed to parse '{raw}' as a percentage ({err})"))
}
