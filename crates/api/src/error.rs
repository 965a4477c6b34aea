#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Catalog format error: {0}")]
    Format(#[from] serde_json::Error),
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;
