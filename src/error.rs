use crate::fetch::FetchError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Invalid search spec: {0}")]
    InvalidSpec(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),
}
