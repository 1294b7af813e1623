//! Error types shared by every stage of the pipeline.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum IrisError {
    /// Tabular input is empty, header-only, or has no well-formed rows.
    #[error("malformed CSV: {0}")]
    Format(String),

    #[error("insufficient training data: {0}")]
    InsufficientData(String),

    /// A prediction input failed validation; the model was not consulted.
    #[error("invalid input: {0}")]
    Validation(String),

    #[error("training already in progress")]
    Busy,

    #[error("no model has been trained yet")]
    ModelNotTrained,

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("training was stopped before the first epoch completed")]
    Cancelled,

    /// Anything raised while building or fitting the model.
    #[error("training failed: {0}")]
    Training(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, IrisError>;
