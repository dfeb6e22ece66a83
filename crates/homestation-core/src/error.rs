use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    // Device errors
    #[error("Actuator not fitted: {0}")]
    ActuatorNotFitted(String),

    #[error("Hardware operation failed: {0}")]
    HardwareError(String),

    // HTTP errors
    #[error("Malformed request: {0}")]
    MalformedRequest(String),

    #[error("Request too large: {size} bytes (max {max_size})")]
    RequestTooLarge { size: usize, max_size: usize },

    #[error("Unsupported: {0}")]
    Unsupported(String),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;
