//! Error type for the schedule lifecycle services.
//!
//! Callers (the HTTP layer, the sweeper) see this small fixed set of kinds
//! and never raw provider or storage internals; each kind maps to a stable
//! external status.

use thiserror::Error;

use crate::db::repository::RepositoryError;
use crate::provider::ProviderError;

/// Result type for service layer operations.
pub type ServiceResult<T> = Result<T, ScheduleError>;

/// Errors surfaced by the schedule lifecycle services.
#[derive(Debug, Error)]
pub enum ScheduleError {
    /// The caller's input is unusable (blank description, blank id,
    /// incoherent field combination).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The id references no stored schedule.
    #[error("{0}")]
    NotFound(String),

    /// The provider reply carried no parseable schedule array.
    #[error("malformed provider response: {0}")]
    MalformedResponse(String),

    /// The provider reply parsed, but every record was unusable.
    #[error("generation produced no usable schedules")]
    GenerationEmpty,

    /// A storage operation failed.
    #[error("storage operation failed: {0}")]
    PersistenceFailure(#[source] RepositoryError),

    /// The text-generation call failed or timed out.
    #[error("text-generation provider failed: {0}")]
    ProviderFailure(#[from] ProviderError),
}

impl From<RepositoryError> for ScheduleError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { message, .. } => ScheduleError::NotFound(message),
            other => ScheduleError::PersistenceFailure(other),
        }
    }
}
