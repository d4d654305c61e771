use thiserror::Error;

pub type FrontleafResult<T> = Result<T, FrontleafError>;

#[derive(Error, Debug)]
pub enum FrontleafError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation error: {0}")]
    Validation(String),

    /// Non-2xx response from the ingestion endpoint. `path` is the URL path
    /// that was posted to, e.g. `/api/track/event`.
    #[error("cannot POST {path} ({status})")]
    Http { status: u16, path: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl FrontleafError {
    /// Whether a failed delivery is worth another attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            FrontleafError::Transport(_) => true,
            FrontleafError::Http { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    /// HTTP status carried by the error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            FrontleafError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}
