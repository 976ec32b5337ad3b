//! Typed failures of the pure scoring and pricing engines

use thiserror::Error;

/// Errors raised by the quality scorer, factor calculator and price composer
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    /// The image analysis carried no objects, colors or labels
    #[error("Image analysis is too sparse to score: no objects, colors or labels detected")]
    InsufficientAnalysis,

    /// Malformed input rejected before any computation
    #[error("Validation error on {field}: {message}")]
    Validation { field: String, message: String },

    /// A commodity profile whose tables break their invariants
    #[error("Invalid commodity profile: {0}")]
    InvalidProfile(String),
}

impl EngineError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        EngineError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
