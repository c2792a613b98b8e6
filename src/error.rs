use thiserror::Error;

use crate::decode::DecodeError;

/// Errors raised while loading reference data, validating forms or
/// talking to a solver backend.
#[derive(Error, Debug)]
pub enum PlannerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Validation(String),

    #[error("catalog error (row {row}): {message}")]
    Catalog { row: usize, message: String },

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("solver backend failed for '{problem_id}': {message}")]
    Backend { problem_id: String, message: String },
}

pub type Result<T> = std::result::Result<T, PlannerError>;
