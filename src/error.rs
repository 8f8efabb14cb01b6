use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::api_connection::connection::ApiConnectionError;
use crate::store::StoreError;

/// Errors surfaced to the caller of a recipe operation. Malformed reasoning-service
/// output is not represented here: it degrades to a no-substitution result instead.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Configuration(String),
    #[error("AI service error: {0}")]
    AiServiceUnavailable(String),
    #[error("Record store error: {0}")]
    Store(#[from] StoreError),
}

/// Status classification of an error for whatever transport carries the result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorClass {
    BadRequest,
    NotFound,
    ServerError,
}

impl ErrorClass {
    pub const fn status_code(&self) -> u16 {
        match self {
            ErrorClass::BadRequest => 400,
            ErrorClass::NotFound => 404,
            ErrorClass::ServerError => 500,
        }
    }
}

impl EngineError {
    pub fn class(&self) -> ErrorClass {
        match self {
            EngineError::Validation(_) => ErrorClass::BadRequest,
            EngineError::NotFound(_) => ErrorClass::NotFound,
            EngineError::Configuration(_)
            | EngineError::AiServiceUnavailable(_)
            | EngineError::Store(_) => ErrorClass::ServerError,
        }
    }

    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse {
            error: self.to_string(),
        }
    }
}

impl From<ApiConnectionError> for EngineError {
    fn from(err: ApiConnectionError) -> Self {
        match err {
            ApiConnectionError::MissingApiKey(key_name) => EngineError::Configuration(format!(
                "OpenRouter API key not configured (set {})",
                key_name
            )),
            other => EngineError::AiServiceUnavailable(other.to_string()),
        }
    }
}

/// Serialized error record, `{"error": "..."}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
