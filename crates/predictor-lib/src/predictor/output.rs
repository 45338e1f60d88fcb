//! Prediction output post-processing
//!
//! The model is trained on `log1p(final box office)`; outputs are mapped back
//! to currency units with `expm1`.

use crate::error::{PredictionError, Result};
use tracing::warn;

/// Smallest revenue ever reported
pub const MIN_REVENUE: f64 = 0.0;

/// Training-time output transform
pub fn log1p(revenue: f64) -> f64 {
    revenue.ln_1p()
}

/// Inverse of [`log1p`]
pub fn expm1(log_revenue: f64) -> f64 {
    log_revenue.exp_m1()
}

/// Configuration for output formatting
#[derive(Debug, Clone)]
pub struct OutputConfig {
    /// Predictions below this value are clamped to it
    pub min_revenue: f64,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            min_revenue: MIN_REVENUE,
        }
    }
}

/// Maps raw model outputs to currency values
#[derive(Debug, Clone, Default)]
pub struct OutputFormatter {
    config: OutputConfig,
}

impl OutputFormatter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: OutputConfig) -> Self {
        Self { config }
    }

    /// Reverse the output transform of one raw model output
    pub fn to_revenue(&self, log_revenue: f64) -> Result<f64> {
        if !log_revenue.is_finite() {
            return Err(PredictionError::InferenceFailure(format!(
                "model produced a non-finite output ({})",
                log_revenue
            )));
        }

        let revenue = expm1(log_revenue);
        if !revenue.is_finite() {
            return Err(PredictionError::InferenceFailure(format!(
                "model output {} overflows when mapped back to currency",
                log_revenue
            )));
        }

        if revenue < self.config.min_revenue {
            warn!(
                log_revenue = log_revenue,
                revenue = revenue,
                "Model predicted below the minimum revenue, clamping"
            );
            return Ok(self.config.min_revenue);
        }
        Ok(revenue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_is_exact_within_tolerance() {
        let budgets = [
            0.0,
            1.0,
            999.99,
            150_000.0,
            20_000_000.0,
            356_000_000.0,
            2.5e9,
        ];
        for b in budgets {
            let back = expm1(log1p(b));
            let tolerance = 1e-9 * b.abs().max(1.0);
            assert!((back - b).abs() <= tolerance, "{} came back as {}", b, back);
        }
    }

    #[test]
    fn test_zero_maps_to_zero() {
        assert_eq!(log1p(0.0), 0.0);
        assert_eq!(OutputFormatter::new().to_revenue(0.0).unwrap(), 0.0);
    }

    #[test]
    fn test_negative_output_clamped() {
        let formatter = OutputFormatter::new();
        assert_eq!(formatter.to_revenue(-0.5).unwrap(), 0.0);
    }

    #[test]
    fn test_custom_minimum() {
        let formatter = OutputFormatter::with_config(OutputConfig { min_revenue: 100.0 });
        assert_eq!(formatter.to_revenue(1.0).unwrap(), 100.0);
        assert!(formatter.to_revenue(10.0).unwrap() > 100.0);
    }

    #[test]
    fn test_non_finite_outputs_fail() {
        let formatter = OutputFormatter::new();
        for bad in [f64::NAN, f64::INFINITY, 1e6] {
            let err = formatter.to_revenue(bad).unwrap_err();
            assert_eq!(err.kind(), "inference_failure");
        }
    }
}
