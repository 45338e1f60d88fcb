//! Server configuration

use anyhow::{Context, Result};
use predictor_lib::artifacts::{
    ArtifactNames, LoaderConfig, DEFAULT_FEATURE_COLUMNS_NAME, DEFAULT_MODEL_NAME,
    DEFAULT_SCALER_NAME,
};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Server configuration, read from `BOXOFFICE_*` environment variables
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Directory holding the trained artifacts
    #[serde(default = "default_artifact_dir")]
    pub artifact_dir: PathBuf,

    /// HTTP port for predictions, health and metrics
    #[serde(default = "default_api_port")]
    pub api_port: u16,

    #[serde(default = "default_model_name")]
    pub model_name: String,

    #[serde(default = "default_feature_columns_name")]
    pub feature_columns_name: String,

    #[serde(default = "default_scaler_name")]
    pub scaler_name: String,

    /// Artifacts larger than this many MiB are refused
    #[serde(default = "default_max_artifact_mb")]
    pub max_artifact_mb: usize,

    /// Inference slower than this logs a warning
    #[serde(default = "default_slow_inference_ms")]
    pub slow_inference_ms: u64,
}

fn default_artifact_dir() -> PathBuf {
    PathBuf::from("artifacts")
}

fn default_api_port() -> u16 {
    8080
}

fn default_model_name() -> String {
    DEFAULT_MODEL_NAME.to_string()
}

fn default_feature_columns_name() -> String {
    DEFAULT_FEATURE_COLUMNS_NAME.to_string()
}

fn default_scaler_name() -> String {
    DEFAULT_SCALER_NAME.to_string()
}

fn default_max_artifact_mb() -> usize {
    64
}

fn default_slow_inference_ms() -> u64 {
    50
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            artifact_dir: default_artifact_dir(),
            api_port: default_api_port(),
            model_name: default_model_name(),
            feature_columns_name: default_feature_columns_name(),
            scaler_name: default_scaler_name(),
            max_artifact_mb: default_max_artifact_mb(),
            slow_inference_ms: default_slow_inference_ms(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from the environment
    pub fn load() -> Result<Self> {
        Self::from_source(config::Environment::with_prefix("BOXOFFICE"))
    }

    fn from_source<S>(source: S) -> Result<Self>
    where
        S: config::Source + Send + Sync + 'static,
    {
        let config = config::Config::builder()
            .add_source(source)
            .build()
            .context("Failed to read configuration")?;

        config
            .try_deserialize()
            .context("Invalid BOXOFFICE_* configuration")
    }

    pub fn loader_config(&self) -> LoaderConfig {
        LoaderConfig {
            names: ArtifactNames {
                model: self.model_name.clone(),
                feature_columns: self.feature_columns_name.clone(),
                scaler: self.scaler_name.clone(),
            },
            max_artifact_bytes: self.max_artifact_mb * 1024 * 1024,
        }
    }

    pub fn slow_inference_threshold(&self) -> Duration {
        Duration::from_millis(self.slow_inference_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> config::Environment {
        let source: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        config::Environment::with_prefix("BOXOFFICE").source(Some(source))
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = ServerConfig::from_source(env(&[])).unwrap();
        assert_eq!(config.api_port, 8080);
        assert_eq!(config.artifact_dir, PathBuf::from("artifacts"));
        assert_eq!(config.model_name, "predict_box_office.onnx");
        assert_eq!(config.slow_inference_threshold(), Duration::from_millis(50));
        assert_eq!(config.loader_config().max_artifact_bytes, 64 * 1024 * 1024);
    }

    #[test]
    fn test_environment_overrides() {
        let config = ServerConfig::from_source(env(&[
            ("BOXOFFICE_ARTIFACT_DIR", "/srv/models"),
            ("BOXOFFICE_API_PORT", "9000"),
            ("BOXOFFICE_MODEL_NAME", "model.json"),
        ]))
        .unwrap();

        assert_eq!(config.artifact_dir, PathBuf::from("/srv/models"));
        assert_eq!(config.api_port, 9000);
        assert_eq!(config.loader_config().names.model, "model.json");
        assert_eq!(config.loader_config().names.scaler, "scaler.json");
    }

    #[test]
    fn test_invalid_port_is_an_error() {
        let result = ServerConfig::from_source(env(&[("BOXOFFICE_API_PORT", "not-a-port")]));
        assert!(result.is_err());
    }
}
