//! Box office revenue prediction library
//!
//! This crate provides the core functionality for:
//! - Loading the trained model, feature column list and scaler
//! - Aligning raw movie attributes to the training-time feature layout
//! - Scaling, inference and the inverse log transform
//! - Health checks and observability

pub mod artifacts;
pub mod error;
pub mod features;
pub mod health;
pub mod models;
pub mod observability;
pub mod pipeline;
pub mod predictor;

pub use artifacts::{
    ArtifactNames, ArtifactStore, DirectoryStore, LoaderConfig, MemoryStore, ResourceLoader,
    Resources,
};
pub use error::{ArtifactError, PredictionError, Result};
pub use features::{FeatureAligner, FeatureColumns, FieldKind, InputScheme, RawField};
pub use health::{
    ComponentHealth, ComponentStatus, HealthRegistry, HealthResponse, ReadinessResponse,
};
pub use models::*;
pub use observability::{PredictorMetrics, StructuredLogger};
pub use pipeline::BoxOfficePredictor;
