//! Regression model inference
//!
//! Trained regressors are exported either to ONNX, which runs through tract,
//! or to a plain linear model serialized as JSON. Both answer in the model's
//! trained output space (log1p of revenue).

use super::Regressor;
use crate::error::{PredictionError, Result};
use anyhow::Context;
use serde::Deserialize;
use std::path::Path;
use tract_onnx::prelude::*;

type TractModel = SimplePlan<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>;

/// Serialized model encoding, chosen from the artifact name's extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelFormat {
    Onnx,
    LinearJson,
}

impl ModelFormat {
    pub fn from_name(name: &str) -> Option<Self> {
        match Path::new(name).extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("onnx") => Some(ModelFormat::Onnx),
            Some(ext) if ext.eq_ignore_ascii_case("json") => Some(ModelFormat::LinearJson),
            _ => None,
        }
    }
}

/// ONNX regressor run with tract
pub struct OnnxRegressor {
    model: TractModel,
    n_features: usize,
}

impl OnnxRegressor {
    /// Load and optimize an ONNX model taking one row of `n_features` floats
    pub fn from_bytes(model_bytes: &[u8], n_features: usize) -> anyhow::Result<Self> {
        let model = tract_onnx::onnx()
            .model_for_read(&mut std::io::Cursor::new(model_bytes))
            .context("Failed to parse ONNX model")?
            .with_input_fact(0, f32::fact([1, n_features]).into())
            .context("Failed to set input shape")?
            .into_optimized()
            .context("Failed to optimize model")?
            .into_runnable()
            .context("Failed to create runnable model")?;
        Ok(Self { model, n_features })
    }

    fn run_row(&self, row: &[f64]) -> Result<f64> {
        // Models are exported with f32 inputs
        let values: Vec<f32> = row.iter().map(|v| *v as f32).collect();
        let input: Tensor = tract_ndarray::Array2::from_shape_vec((1, self.n_features), values)
            .map_err(|e| PredictionError::InferenceFailure(e.to_string()))?
            .into();

        let result = self
            .model
            .run(tvec!(input.into()))
            .map_err(|e| PredictionError::InferenceFailure(format!("{:#}", e)))?;
        let output = result
            .first()
            .ok_or_else(|| PredictionError::InferenceFailure("no output from model".into()))?;
        let view = output
            .to_array_view::<f32>()
            .map_err(|e| PredictionError::InferenceFailure(e.to_string()))?;

        view.iter()
            .next()
            .map(|v| *v as f64)
            .ok_or_else(|| PredictionError::InferenceFailure("model returned an empty tensor".into()))
    }
}

impl Regressor for OnnxRegressor {
    fn predict(&self, rows: &[Vec<f64>]) -> Result<Vec<f64>> {
        rows.iter()
            .map(|row| {
                if row.len() != self.n_features {
                    return Err(PredictionError::shape(
                        format!("{} model inputs", self.n_features),
                        format!("{} values", row.len()),
                    ));
                }
                self.run_row(row)
            })
            .collect()
    }

    fn n_features(&self) -> Option<usize> {
        Some(self.n_features)
    }

    fn kind(&self) -> &'static str {
        "onnx"
    }
}

/// Linear regressor `intercept + coefficients · x`
#[derive(Debug, Clone, Deserialize)]
pub struct LinearRegressor {
    coefficients: Vec<f64>,
    intercept: f64,
}

impl LinearRegressor {
    pub fn new(coefficients: Vec<f64>, intercept: f64) -> Self {
        Self {
            coefficients,
            intercept,
        }
    }

    pub fn from_json(bytes: &[u8]) -> std::result::Result<Self, String> {
        let model: Self = serde_json::from_slice(bytes).map_err(|e| e.to_string())?;
        if model.coefficients.is_empty() {
            return Err("linear model has no coefficients".to_string());
        }
        if !model.intercept.is_finite() || model.coefficients.iter().any(|c| !c.is_finite()) {
            return Err("linear model weights must be finite".to_string());
        }
        Ok(model)
    }
}

impl Regressor for LinearRegressor {
    fn predict(&self, rows: &[Vec<f64>]) -> Result<Vec<f64>> {
        rows.iter()
            .map(|row| {
                if row.len() != self.coefficients.len() {
                    return Err(PredictionError::shape(
                        format!("{} coefficients", self.coefficients.len()),
                        format!("{} values", row.len()),
                    ));
                }
                Ok(self.intercept
                    + row
                        .iter()
                        .zip(&self.coefficients)
                        .map(|(x, w)| x * w)
                        .sum::<f64>())
            })
            .collect()
    }

    fn n_features(&self) -> Option<usize> {
        Some(self.coefficients.len())
    }

    fn kind(&self) -> &'static str {
        "linear"
    }
}
