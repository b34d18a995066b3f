use crate::models::ModelName;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GenError {
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("{0}")]
    ValidationError(String),
    #[error("Request error: {0}")]
    RequestError(String),
    #[error("Response error: {0}")]
    ResponseError(String),
    #[error("Image generation failed or API did not return an image.")]
    NoImageReturned,
    #[error("Serialization error: {0}")]
    SerializationError(String),
    #[error("Image generation with {} failed.", .0.display_name())]
    ModelFailed(ModelName),
    #[error("One or more image generations failed.")]
    BatchFailed,
    #[error("Internal error: {0}")]
    InternalError(String),
}

pub const UNKNOWN_ERROR_MESSAGE: &str = "An unknown error occurred. Please try again.";

impl GenError {
    /// The single message shown to the user for this error.
    pub fn user_message(&self) -> String {
        match self {
            GenError::ConfigError(_)
            | GenError::ValidationError(_)
            | GenError::ModelFailed(_)
            | GenError::BatchFailed => self.to_string(),
            _ => UNKNOWN_ERROR_MESSAGE.to_string(),
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, GenError::ValidationError(_))
    }
}

pub type Result<T> = std::result::Result<T, GenError>;
