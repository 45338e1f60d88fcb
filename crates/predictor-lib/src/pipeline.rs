//! End-to-end prediction pipeline
//!
//! Raw attributes -> feature alignment -> scaling -> inference -> inverse
//! output transform. The loaded artifacts are immutable, so one
//! `BoxOfficePredictor` can be shared across concurrent requests.

use crate::artifacts::{ArtifactStore, ResourceLoader, Resources};
use crate::error::Result;
use crate::features::{FeatureAligner, FeatureColumns, InputScheme};
use crate::models::{AlignedRow, FeatureListing, Prediction, RawAttributes};
use crate::observability::{PredictorMetrics, StructuredLogger};
use crate::predictor::Predictor;
use std::time::{Duration, Instant};

/// Box office predictor bound to one loaded artifact set
pub struct BoxOfficePredictor {
    columns: FeatureColumns,
    aligner: FeatureAligner,
    predictor: Predictor,
    fingerprint: String,
    metrics: PredictorMetrics,
    logger: StructuredLogger,
}

impl BoxOfficePredictor {
    pub fn new(resources: Resources) -> Self {
        let Resources {
            model,
            feature_columns,
            scaler,
            fingerprint,
            ..
        } = resources;

        let metrics = PredictorMetrics::new();
        metrics.set_artifacts(
            &fingerprint,
            &feature_columns.scheme().to_string(),
            model.kind(),
            feature_columns.len(),
        );

        Self {
            columns: feature_columns,
            aligner: FeatureAligner::new(),
            predictor: Predictor::new(model, scaler),
            fingerprint,
            metrics,
            logger: StructuredLogger::new("predictor"),
        }
    }

    /// Load every artifact from `loader`; fails with `ResourceUnavailable`
    /// unless all three load
    pub fn load<S: ArtifactStore>(loader: &ResourceLoader<S>) -> Result<Self> {
        match loader.load_all() {
            Ok(resources) => Ok(Self::new(resources)),
            Err(err) => {
                PredictorMetrics::new().inc_artifact_load_failures();
                Err(err)
            }
        }
    }

    pub fn with_aligner(mut self, aligner: FeatureAligner) -> Self {
        self.aligner = aligner;
        self
    }

    pub fn with_logger(mut self, logger: StructuredLogger) -> Self {
        self.logger = logger;
        self
    }

    pub fn with_slow_inference_threshold(mut self, threshold: Duration) -> Self {
        self.predictor = self.predictor.with_slow_inference_threshold(threshold);
        self
    }

    pub fn feature_columns(&self) -> &FeatureColumns {
        &self.columns
    }

    pub fn scheme(&self) -> InputScheme {
        self.columns.scheme()
    }

    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    pub fn listing(&self) -> FeatureListing {
        FeatureListing {
            columns: self.columns.names().to_vec(),
            scheme: self.columns.scheme(),
            model_fingerprint: self.fingerprint.clone(),
        }
    }

    /// Align raw attributes without running the model
    pub fn align(&self, raw: &RawAttributes) -> Result<AlignedRow> {
        self.aligner.align(raw, &self.columns)
    }

    /// Predict final box office revenue for one movie
    pub fn predict(&self, raw: &RawAttributes) -> Result<Prediction> {
        let start = Instant::now();
        let result = self
            .align(raw)
            .and_then(|row| self.predictor.predict(&row));
        let elapsed = start.elapsed();

        match result {
            Ok(output) => {
                self.metrics.observe_prediction_latency(elapsed.as_secs_f64());
                self.metrics.inc_predictions();
                self.logger.log_prediction(
                    output.revenue,
                    output.log_revenue,
                    &self.fingerprint,
                    elapsed.as_micros() as u64,
                );
                Ok(Prediction {
                    revenue: output.revenue,
                    log_revenue: output.log_revenue,
                    scheme: self.columns.scheme(),
                    model_fingerprint: self.fingerprint.clone(),
                    generated_at: chrono::Utc::now().timestamp(),
                })
            }
            Err(err) => {
                self.metrics.inc_prediction_errors(err.kind());
                self.logger.log_prediction_failed(err.kind(), &err.to_string());
                Err(err)
            }
        }
    }
}
