//! Fitted per-column standardization

use crate::error::{PredictionError, Result};
use crate::models::AlignedRow;
use serde::{Deserialize, Serialize};

/// Standardization transform `(x - mean) / scale` fitted at training time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    mean: Vec<f64>,
    scale: Vec<f64>,
    /// Column names the scaler was fitted on, when the training pipeline kept them
    #[serde(default, skip_serializing_if = "Option::is_none")]
    feature_names: Option<Vec<String>>,
}

impl StandardScaler {
    pub fn new(
        mean: Vec<f64>,
        scale: Vec<f64>,
        feature_names: Option<Vec<String>>,
    ) -> std::result::Result<Self, String> {
        let scaler = Self {
            mean,
            scale,
            feature_names,
        };
        scaler.validate()?;
        Ok(scaler)
    }

    /// Decode the JSON artifact
    pub fn from_json(bytes: &[u8]) -> std::result::Result<Self, String> {
        let scaler: Self = serde_json::from_slice(bytes).map_err(|e| e.to_string())?;
        scaler.validate()?;
        Ok(scaler)
    }

    fn validate(&self) -> std::result::Result<(), String> {
        if self.mean.is_empty() {
            return Err("scaler has no columns".to_string());
        }
        if self.mean.len() != self.scale.len() {
            return Err(format!(
                "scaler has {} means but {} scales",
                self.mean.len(),
                self.scale.len()
            ));
        }
        if let Some(names) = &self.feature_names {
            if names.len() != self.mean.len() {
                return Err(format!(
                    "scaler has {} columns but {} feature names",
                    self.mean.len(),
                    names.len()
                ));
            }
        }
        if self.mean.iter().any(|m| !m.is_finite()) {
            return Err("scaler mean contains non-finite values".to_string());
        }
        if self.scale.iter().any(|s| !s.is_finite() || *s < 0.0) {
            return Err("scaler scale must be finite and non-negative".to_string());
        }
        Ok(())
    }

    pub fn n_features(&self) -> usize {
        self.mean.len()
    }

    pub fn feature_names(&self) -> Option<&[String]> {
        self.feature_names.as_deref()
    }

    /// Standardize an aligned row
    ///
    /// The row must have exactly the fitted width, and when the scaler kept
    /// its column names they must match the row element for element.
    pub fn transform(&self, row: &AlignedRow) -> Result<Vec<f64>> {
        if row.len() != self.n_features() {
            return Err(PredictionError::shape(
                format!("{} columns", self.n_features()),
                format!("{} columns", row.len()),
            ));
        }

        if let Some(names) = &self.feature_names {
            if let Some((i, (fitted, given))) = names
                .iter()
                .zip(row.columns())
                .enumerate()
                .find(|(_, (fitted, given))| fitted != given)
            {
                return Err(PredictionError::shape(
                    format!("column {} = `{}`", i, fitted),
                    format!("`{}`", given),
                ));
            }
        }

        Ok(row
            .values()
            .iter()
            .zip(self.mean.iter().zip(&self.scale))
            .map(|(x, (mean, scale))| {
                // Constant training columns are stored with a zero scale
                let scale = if *scale == 0.0 { 1.0 } else { *scale };
                (x - mean) / scale
            })
            .collect())
    }
}
