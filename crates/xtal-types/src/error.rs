use thiserror::Error;

#[derive(Error, Debug)]
pub enum XtalError {
    #[error("Unknown space group: {0} (supported: P1, P212121)")]
    UnknownSpaceGroup(String),

    #[error("Shape mismatch for {what}: expected {expected:?}, found {found:?}")]
    ShapeMismatch {
        what: String,
        expected: Vec<usize>,
        found: Vec<usize>,
    },

    #[error("Numerical instability: {0}")]
    NumericalInstability(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type XtalResult<T> = Result<T, XtalError>;
