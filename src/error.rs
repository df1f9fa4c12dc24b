//! Error types for the predictor.
//!
//! `PredictorError` covers everything that can go wrong around the pipeline
//! (artifacts, configuration, out-of-range input). `PredictionAssemblyFailure`
//! is the single error the pipeline itself returns.

use serde::Serialize;
use thiserror::Error;

/// Result type alias for predictor operations.
pub type Result<T> = std::result::Result<T, PredictorError>;

/// Errors raised outside the assembly pipeline.
#[derive(Debug, Error)]
pub enum PredictorError {
    /// An artifact could not be read or parsed.
    #[error("Failed to load artifact {path}: {message}")]
    Artifact { path: String, message: String },

    /// A select field needs an encoder the encoder set does not have.
    #[error("No encoder for categorical field `{0}`")]
    MissingEncoder(String),

    /// An encoder lists the same class twice, so its codes are ambiguous.
    #[error("Duplicate encoder class `{0}`")]
    DuplicateClass(String),

    /// A submitted value falls outside the field's bounds.
    #[error("{field} must be within {min}..={max}, got {value}")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Model runtime error outside a prediction (load, warm-up).
    #[error("Model error: {0}")]
    Model(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PredictorError {
    pub fn artifact(path: impl Into<String>, message: impl ToString) -> Self {
        Self::Artifact {
            path: path.into(),
            message: message.to_string(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn model(msg: impl Into<String>) -> Self {
        Self::Model(msg.into())
    }

    /// Check if this error was caused by the submitted input.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::OutOfRange { .. })
    }
}

/// What went wrong while assembling or scoring a feature vector.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AssemblyFault {
    #[error("feature `{feature}` has non-numeric value {value:?}")]
    NonNumeric { feature: String, value: String },

    #[error("feature vector has {got} columns, model expects {expected}")]
    WidthMismatch { got: usize, expected: usize },

    #[error("model rejected input: {0}")]
    Model(String),

    #[error("model returned no prediction")]
    EmptyPrediction,

    #[error("model returned non-finite prediction {0}")]
    NonFinite(f64),
}

/// The pipeline failed as a unit. Carries the field-name sets needed to
/// debug an encoder/model artifact mismatch.
#[derive(Debug, Clone, Error)]
#[error("Prediction failed: {fault}")]
pub struct PredictionAssemblyFailure {
    pub fault: AssemblyFault,
    /// Columns of the raw input record, in input order.
    pub input_features: Vec<String>,
    /// The feature order list the model expects.
    pub model_features: Vec<String>,
    /// Columns of the encoded record, if assembly got that far.
    pub encoded_features: Option<Vec<String>>,
}

impl PredictionAssemblyFailure {
    /// JSON body for API clients.
    pub fn diagnostics(&self) -> FailureDiagnostics {
        FailureDiagnostics {
            error: self.to_string(),
            input_features: self.input_features.clone(),
            model_features: self.model_features.clone(),
            encoded_features: self.encoded_features.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FailureDiagnostics {
    pub error: String,
    pub input_features: Vec<String>,
    pub model_features: Vec<String>,
    pub encoded_features: Option<Vec<String>>,
}
