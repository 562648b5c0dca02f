//! Error types for the forecasting engine

use thiserror::Error;

/// Custom error types for the forecasting engine
#[derive(Debug, Error)]
pub enum ForecastError {
    /// Input shapes or parameters the engine cannot work with
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Training could not produce a usable model
    #[error("training failure: {0}")]
    TrainingFailure(String),

    /// Synthetic history generation failed
    #[error("synthesis error: {0}")]
    Synthesis(String),

    /// Attribution computation failed; callers degrade the explanation,
    /// the forecast itself still returns
    #[error("attribution error: {0}")]
    Attribution(String),

    /// Error from IO operations
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Error from artifact serialization
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type with our custom error
pub type Result<T> = std::result::Result<T, ForecastError>;
