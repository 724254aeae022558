use thiserror::Error;

pub type Result<T> = std::result::Result<T, ServiceError>;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("user {0} not found")]
    NotFound(String),
    #[error("validation error: {0}")]
    Validation(String),
    #[error("user {0} has no banking details")]
    NoBankingDetails(String),
    #[error("invariant violation: {0}")]
    InvariantViolation(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("backend unavailable: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl From<redis::RedisError> for ServiceError {
    fn from(err: redis::RedisError) -> Self {
        Self::Backend(Box::new(err))
    }
}

impl From<lapin::Error> for ServiceError {
    fn from(err: lapin::Error) -> Self {
        Self::Backend(Box::new(err))
    }
}
