//! Error taxonomy for the prediction pipeline
//!
//! `ArtifactError` describes why a single artifact could not be loaded.
//! `PredictionError` is what callers of the pipeline see; every failure of a
//! request maps to exactly one of its four kinds.

use thiserror::Error;

/// Failure to load one named artifact from the artifact store
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("artifact `{name}` not found in store")]
    Missing { name: String },

    #[error("failed to read artifact `{name}`: {source}")]
    Io {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("artifact `{name}` is {size} bytes, exceeding the {limit} byte limit")]
    TooLarge {
        name: String,
        size: usize,
        limit: usize,
    },

    #[error("failed to decode artifact `{name}`: {reason}")]
    Decode { name: String, reason: String },

    #[error("artifact `{name}` is invalid: {reason}")]
    Invalid { name: String, reason: String },
}

impl ArtifactError {
    /// Logical name of the artifact that failed
    pub fn artifact(&self) -> &str {
        match self {
            ArtifactError::Missing { name }
            | ArtifactError::Io { name, .. }
            | ArtifactError::TooLarge { name, .. }
            | ArtifactError::Decode { name, .. }
            | ArtifactError::Invalid { name, .. } => name,
        }
    }

    pub(crate) fn decode(name: &str, reason: impl ToString) -> Self {
        ArtifactError::Decode {
            name: name.to_string(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn invalid(name: &str, reason: impl ToString) -> Self {
        ArtifactError::Invalid {
            name: name.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Error returned by a prediction request
#[derive(Debug, Error)]
pub enum PredictionError {
    /// Model, feature list or scaler could not be loaded. All three are
    /// treated as unavailable together.
    #[error("resources unavailable ({artifact}): {reason}")]
    ResourceUnavailable { artifact: String, reason: String },

    /// A required raw attribute is missing or has the wrong type/domain
    #[error("malformed input `{field}`: {reason}")]
    MalformedInput { field: String, reason: String },

    /// Aligned row does not match what the scaler or model was fitted on
    #[error("shape mismatch: expected {expected}, got {actual}")]
    ShapeMismatch { expected: String, actual: String },

    /// The model failed while running or produced an unusable value
    #[error("inference failed: {0}")]
    InferenceFailure(String),
}

impl PredictionError {
    /// Stable label used in logs, metrics and HTTP error bodies
    pub fn kind(&self) -> &'static str {
        match self {
            PredictionError::ResourceUnavailable { .. } => "resource_unavailable",
            PredictionError::MalformedInput { .. } => "malformed_input",
            PredictionError::ShapeMismatch { .. } => "shape_mismatch",
            PredictionError::InferenceFailure(_) => "inference_failure",
        }
    }

    pub(crate) fn malformed(field: impl Into<String>, reason: impl Into<String>) -> Self {
        PredictionError::MalformedInput {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn shape(expected: impl ToString, actual: impl ToString) -> Self {
        PredictionError::ShapeMismatch {
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }
}

impl From<ArtifactError> for PredictionError {
    fn from(err: ArtifactError) -> Self {
        PredictionError::ResourceUnavailable {
            artifact: err.artifact().to_string(),
            reason: err.to_string(),
        }
    }
}

/// Result alias for pipeline operations
pub type Result<T> = std::result::Result<T, PredictionError>;
