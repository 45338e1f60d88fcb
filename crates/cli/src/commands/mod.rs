//! CLI command implementations

pub mod config;
pub mod features;
pub mod predict;
pub mod record;

use anyhow::{Context, Result};
use predictor_lib::{
    ArtifactNames, BoxOfficePredictor, DirectoryStore, FeatureColumns, FeatureListing,
    LoaderConfig, Prediction, RawAttributes, ResourceLoader,
};
use std::path::Path;
use tracing::debug;

use crate::client::ApiClient;

/// Where predictions are computed
pub enum Backend {
    /// Artifacts loaded in-process from a local directory
    Local(BoxOfficePredictor),
    /// A running prediction server
    Remote(ApiClient),
}

impl Backend {
    /// Load the artifact set from `dir`
    pub fn local(dir: &Path, model_name: Option<&str>) -> Result<Self> {
        let mut names = ArtifactNames::default();
        if let Some(model) = model_name {
            names.model = model.to_string();
        }

        let loader = ResourceLoader::with_config(
            DirectoryStore::new(dir),
            LoaderConfig {
                names,
                ..Default::default()
            },
        );
        let predictor = BoxOfficePredictor::load(&loader)
            .with_context(|| format!("Failed to load artifacts from {}", dir.display()))?;
        debug!(dir = %dir.display(), fingerprint = %predictor.fingerprint(), "Using local artifacts");

        Ok(Backend::Local(predictor))
    }

    pub fn remote(api_url: &str) -> Result<Self> {
        let client = ApiClient::new(api_url)?;
        debug!(url = %client.base_url(), "Using prediction server");
        Ok(Backend::Remote(client))
    }

    pub async fn predict(&self, attributes: &RawAttributes) -> Result<Prediction> {
        match self {
            Backend::Local(predictor) => Ok(predictor.predict(attributes)?),
            Backend::Remote(client) => client.predict(attributes).await,
        }
    }

    pub async fn features(&self) -> Result<FeatureListing> {
        match self {
            Backend::Local(predictor) => Ok(predictor.listing()),
            Backend::Remote(client) => client.features().await,
        }
    }

    /// The feature columns in force, used to decide which inputs are required
    pub async fn feature_columns(&self) -> Result<FeatureColumns> {
        match self {
            Backend::Local(predictor) => Ok(predictor.feature_columns().clone()),
            Backend::Remote(client) => {
                let listing = client.features().await?;
                FeatureColumns::new(listing.columns)
                    .map_err(|reason| anyhow::anyhow!("Server returned invalid feature columns: {}", reason))
            }
        }
    }
}
