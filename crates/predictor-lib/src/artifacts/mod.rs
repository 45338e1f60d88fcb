//! Loading of trained artifacts
//!
//! This module provides:
//! - Per-artifact loads that report which artifact failed and why
//! - `load_all`, which only succeeds when model, feature columns and scaler
//!   all load and agree with each other
//! - SHA256 fingerprints identifying the loaded artifact set

mod store;

pub use store::{ArtifactStore, DirectoryStore, MemoryStore};

use crate::error::{ArtifactError, PredictionError};
use crate::features::FeatureColumns;
use crate::predictor::{LinearRegressor, ModelFormat, OnnxRegressor, Regressor, StandardScaler};
use sha2::{Digest, Sha256};
use std::io;
use tracing::{debug, info, warn};

/// Default logical name of the trained model
pub const DEFAULT_MODEL_NAME: &str = "predict_box_office.onnx";

/// Default logical name of the feature column list
pub const DEFAULT_FEATURE_COLUMNS_NAME: &str = "feature_columns.json";

/// Default logical name of the fitted scaler
pub const DEFAULT_SCALER_NAME: &str = "scaler.json";

/// Artifacts larger than this are rejected before decoding (64 MiB)
pub const DEFAULT_MAX_ARTIFACT_BYTES: usize = 64 * 1024 * 1024;

/// Logical names of the three artifacts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactNames {
    pub model: String,
    pub feature_columns: String,
    pub scaler: String,
}

impl Default for ArtifactNames {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL_NAME.to_string(),
            feature_columns: DEFAULT_FEATURE_COLUMNS_NAME.to_string(),
            scaler: DEFAULT_SCALER_NAME.to_string(),
        }
    }
}

/// Configuration for artifact loading
#[derive(Debug, Clone)]
pub struct LoaderConfig {
    pub names: ArtifactNames,
    pub max_artifact_bytes: usize,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            names: ArtifactNames::default(),
            max_artifact_bytes: DEFAULT_MAX_ARTIFACT_BYTES,
        }
    }
}

/// Identity of one loaded artifact
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactInfo {
    pub name: String,
    pub checksum: String,
    pub size_bytes: usize,
}

/// A decoded artifact together with its identity
#[derive(Debug)]
pub struct Loaded<T> {
    pub value: T,
    pub info: ArtifactInfo,
}

/// The complete, mutually consistent artifact set
pub struct Resources {
    pub model: Box<dyn Regressor>,
    pub feature_columns: FeatureColumns,
    pub scaler: StandardScaler,
    /// SHA256 over the three artifact checksums
    pub fingerprint: String,
    pub artifacts: Vec<ArtifactInfo>,
}

impl std::fmt::Debug for Resources {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resources")
            .field("model", &self.model.kind())
            .field("feature_columns", &self.feature_columns.len())
            .field("fingerprint", &self.fingerprint)
            .finish()
    }
}

/// Reads and decodes artifacts from a store
pub struct ResourceLoader<S> {
    store: S,
    config: LoaderConfig,
}

impl<S: ArtifactStore> ResourceLoader<S> {
    pub fn new(store: S) -> Self {
        Self::with_config(store, LoaderConfig::default())
    }

    pub fn with_config(store: S, config: LoaderConfig) -> Self {
        Self { store, config }
    }

    pub fn names(&self) -> &ArtifactNames {
        &self.config.names
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Read one artifact's bytes, enforcing the size limit
    fn fetch(&self, name: &str) -> Result<(Vec<u8>, ArtifactInfo), ArtifactError> {
        let bytes = self.store.fetch(name).map_err(|source| match source.kind() {
            io::ErrorKind::NotFound => ArtifactError::Missing {
                name: name.to_string(),
            },
            _ => ArtifactError::Io {
                name: name.to_string(),
                source,
            },
        })?;

        if bytes.len() > self.config.max_artifact_bytes {
            return Err(ArtifactError::TooLarge {
                name: name.to_string(),
                size: bytes.len(),
                limit: self.config.max_artifact_bytes,
            });
        }

        let info = ArtifactInfo {
            name: name.to_string(),
            checksum: compute_checksum(&bytes),
            size_bytes: bytes.len(),
        };
        debug!(
            artifact = %info.name,
            size = info.size_bytes,
            checksum = %info.checksum,
            "Fetched artifact"
        );
        Ok((bytes, info))
    }

    /// Load the ordered feature column list
    pub fn load_feature_columns(&self) -> Result<Loaded<FeatureColumns>, ArtifactError> {
        let name = &self.config.names.feature_columns;
        let (bytes, info) = self.fetch(name)?;
        let value = FeatureColumns::from_json(&bytes).map_err(|e| ArtifactError::decode(name, e))?;
        Ok(Loaded { value, info })
    }

    /// Load the fitted scaler
    pub fn load_scaler(&self) -> Result<Loaded<StandardScaler>, ArtifactError> {
        let name = &self.config.names.scaler;
        let (bytes, info) = self.fetch(name)?;
        let value = StandardScaler::from_json(&bytes).map_err(|e| ArtifactError::decode(name, e))?;
        Ok(Loaded { value, info })
    }

    /// Load the trained model for rows of `n_features` columns
    pub fn load_model(&self, n_features: usize) -> Result<Loaded<Box<dyn Regressor>>, ArtifactError> {
        let name = &self.config.names.model;
        let format = ModelFormat::from_name(name).ok_or_else(|| {
            ArtifactError::invalid(name, "unknown model format, expected a .onnx or .json artifact")
        })?;
        let (bytes, info) = self.fetch(name)?;

        let value: Box<dyn Regressor> = match format {
            ModelFormat::Onnx => Box::new(
                OnnxRegressor::from_bytes(&bytes, n_features)
                    .map_err(|e| ArtifactError::decode(name, format!("{:#}", e)))?,
            ),
            ModelFormat::LinearJson => Box::new(
                LinearRegressor::from_json(&bytes).map_err(|e| ArtifactError::decode(name, e))?,
            ),
        };
        Ok(Loaded { value, info })
    }

    /// Load all three artifacts, or none of them
    ///
    /// Any individual failure, or any disagreement between the artifacts,
    /// is reported as `ResourceUnavailable`.
    pub fn load_all(&self) -> Result<Resources, PredictionError> {
        match self.try_load_all() {
            Ok(resources) => {
                info!(
                    store = %self.store.describe(),
                    fingerprint = %resources.fingerprint,
                    columns = resources.feature_columns.len(),
                    scheme = %resources.feature_columns.scheme(),
                    model = resources.model.kind(),
                    "Loaded prediction artifacts"
                );
                Ok(resources)
            }
            Err(err) => {
                warn!(
                    store = %self.store.describe(),
                    artifact = %err.artifact(),
                    error = %err,
                    "Prediction artifacts unavailable"
                );
                Err(err.into())
            }
        }
    }

    fn try_load_all(&self) -> Result<Resources, ArtifactError> {
        let columns = self.load_feature_columns()?;
        let scaler = self.load_scaler()?;
        let width = columns.value.len();

        if scaler.value.n_features() != width {
            return Err(ArtifactError::invalid(
                &scaler.info.name,
                format!(
                    "scaler has {} columns but the feature list has {}",
                    scaler.value.n_features(),
                    width
                ),
            ));
        }
        if let Some(names) = scaler.value.feature_names() {
            if names != columns.value.names() {
                return Err(ArtifactError::invalid(
                    &scaler.info.name,
                    "scaler feature names differ from the feature column list",
                ));
            }
        }

        let model = self.load_model(width)?;
        if let Some(model_width) = model.value.n_features() {
            if model_width != width {
                return Err(ArtifactError::invalid(
                    &model.info.name,
                    format!(
                        "model expects {} features but the feature list has {}",
                        model_width, width
                    ),
                ));
            }
        }

        let artifacts = vec![model.info, columns.info, scaler.info];
        let fingerprint = fingerprint(&artifacts);

        Ok(Resources {
            model: model.value,
            feature_columns: columns.value,
            scaler: scaler.value,
            fingerprint,
            artifacts,
        })
    }
}

/// Compute SHA256 checksum of data
fn compute_checksum(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

fn fingerprint(artifacts: &[ArtifactInfo]) -> String {
    let mut hasher = Sha256::new();
    for artifact in artifacts {
        hasher.update(artifact.checksum.as_bytes());
    }
    hex::encode(hasher.finalize())
}
