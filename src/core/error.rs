use std::time::Duration;

use thiserror::Error;

/// Failure of a single generation attempt, or of a whole generation cycle.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GenerationError {
    #[error("No Gemini API key configured")]
    MissingCredential,

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Gemini API error: {status} - {body}")]
    Status { status: u16, body: String },

    #[error("Content blocked by safety filter: {0}")]
    ContentFiltered(String),

    #[error("Invalid response structure: {0}")]
    MalformedResponse(String),

    #[error("Only {found} valid tips after {attempts} attempts (need {required})")]
    InsufficientCandidates {
        found: usize,
        required: usize,
        attempts: usize,
    },
}

impl GenerationError {
    /// Whether another attempt could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, GenerationError::MissingCredential)
    }
}

#[derive(Error, Debug)]
pub enum WisdomError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Generation error: {0}")]
    Generation(#[from] GenerationError),
}

pub type Result<T> = std::result::Result<T, WisdomError>;
