use luasense_api::ApiError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LuasenseError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON serialization/deserialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Catalog error: {0}")]
    Catalog(#[from] ApiError),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Internal error: {0}")]
    Internal(String),
    #[error("No open session for document {0}")]
    SessionClosed(String),
}

pub type Result<T> = std::result::Result<T, LuasenseError>;
