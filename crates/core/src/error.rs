use crate::timer::TimerError;
use crate::types::DbId;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<TimerError> for CoreError {
    fn from(err: TimerError) -> Self {
        match err {
            TimerError::InvalidDuration { .. } => CoreError::Validation(err.to_string()),
            TimerError::NoTimeRemaining => CoreError::Conflict(err.to_string()),
        }
    }
}
