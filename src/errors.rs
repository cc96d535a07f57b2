use thiserror::Error;

use crate::types::CalculationId;

#[derive(Error, Debug)]
pub enum EstimatorError {
    #[error("invalid input for {field}: {message}")]
    InvalidInput {
        field: String,
        message: String,
    },

    #[error("cost estimation unavailable, please try again: {message}")]
    EstimationUnavailable {
        message: String,
    },

    #[error("invalid configuration: {message}")]
    InvalidConfiguration {
        message: String,
    },

    #[error("calculation not found: {id}")]
    CalculationNotFound {
        id: CalculationId,
    },

    #[error("calculation {id} belongs to another owner")]
    Forbidden {
        id: CalculationId,
    },

    #[error("calculation storage failed: {message}")]
    Storage {
        message: String,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl EstimatorError {
    pub fn invalid_input(field: &str, message: impl Into<String>) -> Self {
        EstimatorError::InvalidInput {
            field: field.to_string(),
            message: message.into(),
        }
    }

    /// whether the caller should offer a "try again"
    pub fn is_retryable(&self) -> bool {
        matches!(self, EstimatorError::EstimationUnavailable { .. })
    }
}

pub type Result<T> = std::result::Result<T, EstimatorError>;
