//! ML prediction engine

mod inference;
mod output;
mod scaler;

pub use inference::{LinearRegressor, ModelFormat, OnnxRegressor};
pub use output::{expm1, log1p, OutputConfig, OutputFormatter, MIN_REVENUE};
pub use scaler::StandardScaler;

use crate::error::{PredictionError, Result};
use crate::models::AlignedRow;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Inference latency above which a warning is logged
pub const DEFAULT_SLOW_INFERENCE: Duration = Duration::from_millis(50);

/// Trait for trained regression models
pub trait Regressor: Send + Sync {
    /// One prediction per row, in the model's trained output space
    fn predict(&self, rows: &[Vec<f64>]) -> Result<Vec<f64>>;

    /// Input width the model was exported with, when known
    fn n_features(&self) -> Option<usize>;

    /// Short label for logs
    fn kind(&self) -> &'static str;
}

/// Output of a single [`Predictor::predict`] call
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PredictorOutput {
    pub revenue: f64,
    pub log_revenue: f64,
}

/// Scales an aligned row, runs the model and reverses the output transform
pub struct Predictor {
    model: Box<dyn Regressor>,
    scaler: StandardScaler,
    formatter: OutputFormatter,
    slow_inference: Duration,
}

impl Predictor {
    pub fn new(model: Box<dyn Regressor>, scaler: StandardScaler) -> Self {
        Self {
            model,
            scaler,
            formatter: OutputFormatter::new(),
            slow_inference: DEFAULT_SLOW_INFERENCE,
        }
    }

    pub fn with_formatter(mut self, formatter: OutputFormatter) -> Self {
        self.formatter = formatter;
        self
    }

    pub fn with_slow_inference_threshold(mut self, threshold: Duration) -> Self {
        self.slow_inference = threshold;
        self
    }

    pub fn scaler(&self) -> &StandardScaler {
        &self.scaler
    }

    pub fn model_kind(&self) -> &'static str {
        self.model.kind()
    }

    pub fn predict(&self, row: &AlignedRow) -> Result<PredictorOutput> {
        let scaled = self.scaler.transform(row)?;

        let start = Instant::now();
        let outputs = self.model.predict(std::slice::from_ref(&scaled))?;
        let elapsed = start.elapsed();

        if elapsed > self.slow_inference {
            warn!(
                elapsed_ms = elapsed.as_millis() as u64,
                threshold_ms = self.slow_inference.as_millis() as u64,
                model = self.model.kind(),
                "Inference exceeded latency target"
            );
        } else {
            debug!(elapsed_us = elapsed.as_micros() as u64, "Inference completed");
        }

        let log_revenue = *outputs
            .first()
            .ok_or_else(|| PredictionError::InferenceFailure("model returned no rows".into()))?;
        let revenue = self.formatter.to_revenue(log_revenue)?;

        Ok(PredictorOutput {
            revenue,
            log_revenue,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingModel;

    impl Regressor for FailingModel {
        fn predict(&self, _rows: &[Vec<f64>]) -> Result<Vec<f64>> {
            Err(PredictionError::InferenceFailure("numeric error".into()))
        }
        fn n_features(&self) -> Option<usize> {
            None
        }
        fn kind(&self) -> &'static str {
            "failing"
        }
    }

    struct EmptyModel;

    impl Regressor for EmptyModel {
        fn predict(&self, _rows: &[Vec<f64>]) -> Result<Vec<f64>> {
            Ok(Vec::new())
        }
        fn n_features(&self) -> Option<usize> {
            None
        }
        fn kind(&self) -> &'static str {
            "empty"
        }
    }

    fn row(values: &[f64]) -> AlignedRow {
        AlignedRow::new(
            (0..values.len()).map(|i| format!("f{}", i)).collect(),
            values.to_vec(),
        )
    }

    #[test]
    fn test_scale_infer_inverse() {
        let scaler = StandardScaler::new(vec![1.0, 10.0], vec![1.0, 5.0], None).unwrap();
        let model = LinearRegressor::new(vec![1.0, 1.0], 10.0);
        let predictor = Predictor::new(Box::new(model), scaler);

        // scaled = [1.0, 2.0] -> log_revenue = 13.0
        let out = predictor.predict(&row(&[2.0, 20.0])).unwrap();
        assert_eq!(out.log_revenue, 13.0);
        assert!((out.revenue - 13f64.exp_m1()).abs() < 1e-6);
    }

    #[test]
    fn test_shape_mismatch_surfaces() {
        let scaler = StandardScaler::new(vec![0.0; 3], vec![1.0; 3], None).unwrap();
        let predictor = Predictor::new(Box::new(LinearRegressor::new(vec![1.0; 3], 0.0)), scaler);
        let err = predictor.predict(&row(&[1.0, 2.0])).unwrap_err();
        assert_eq!(err.kind(), "shape_mismatch");
    }

    #[test]
    fn test_model_failure_surfaces() {
        let scaler = StandardScaler::new(vec![0.0], vec![1.0], None).unwrap();
        let predictor = Predictor::new(Box::new(FailingModel), scaler);
        assert_eq!(
            predictor.predict(&row(&[1.0])).unwrap_err().kind(),
            "inference_failure"
        );

        let scaler = StandardScaler::new(vec![0.0], vec![1.0], None).unwrap();
        let predictor = Predictor::new(Box::new(EmptyModel), scaler);
        assert_eq!(
            predictor.predict(&row(&[1.0])).unwrap_err().kind(),
            "inference_failure"
        );
    }

    #[test]
    fn test_repeated_calls_are_bit_identical() {
        let scaler = StandardScaler::new(vec![0.3, 7.1], vec![1.7, 2.9], None).unwrap();
        let predictor = Predictor::new(
            Box::new(LinearRegressor::new(vec![0.11, 0.37], 15.2)),
            scaler,
        );
        let input = row(&[4.2, 16.9]);
        let first = predictor.predict(&input).unwrap();
        let second = predictor.predict(&input).unwrap();
        assert_eq!(first.revenue.to_bits(), second.revenue.to_bits());
    }
}
