//! Storage error type shared by every repository backend.
//!
//! Both backends funnel their failures into [`RepositoryError`] so the
//! service layer can treat storage uniformly. Each variant carries an
//! [`ErrorContext`] naming the operation and entity that failed, and the
//! Postgres backend consults [`RepositoryError::is_retryable`] when deciding
//! whether another attempt is worth it.

use std::fmt;

/// Result alias used throughout the storage layer.
pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Where and how a storage operation failed.
///
/// Built incrementally by the backends; every field is optional so call
/// sites attach only what they know.
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    /// Repository method that failed ("insert_batch", "update", ...).
    pub operation: Option<String>,
    /// Entity kind the operation touched.
    pub entity: Option<String>,
    /// Identifier of the entity, when one exists.
    pub entity_id: Option<String>,
    /// Backend detail such as a constraint name or pool state.
    pub details: Option<String>,
    /// Whether a retry has a chance of succeeding.
    pub retryable: bool,
}

impl ErrorContext {
    /// Start a context naming the repository method that failed.
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: Some(operation.into()),
            ..Default::default()
        }
    }

    /// Name the entity kind the operation touched.
    pub fn with_entity(mut self, entity: impl Into<String>) -> Self {
        self.entity = Some(entity.into());
        self
    }

    /// Attach the identifier of the entity involved.
    pub fn with_entity_id(mut self, id: impl ToString) -> Self {
        self.entity_id = Some(id.to_string());
        self
    }

    /// Attach a backend-specific detail string.
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Flag the failure as worth retrying.
    pub fn retryable(mut self) -> Self {
        self.retryable = true;
        self
    }

    fn is_empty(&self) -> bool {
        self.operation.is_none()
            && self.entity.is_none()
            && self.entity_id.is_none()
            && self.details.is_none()
            && !self.retryable
    }
}

/// Renders as `" (operation=update, entity=schedule, ...)"` with a leading
/// space so it can sit directly after an error message, or as nothing at all
/// when the context is empty.
impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return Ok(());
        }
        let mut parts = Vec::new();
        if let Some(ref operation) = self.operation {
            parts.push(format!("operation={}", operation));
        }
        if let Some(ref entity) = self.entity {
            parts.push(format!("entity={}", entity));
        }
        if let Some(ref id) = self.entity_id {
            parts.push(format!("id={}", id));
        }
        if let Some(ref details) = self.details {
            parts.push(format!("details={}", details));
        }
        if self.retryable {
            parts.push("retryable=true".to_string());
        }
        write!(f, " ({})", parts.join(", "))
    }
}

/// Failures surfaced by the schedule stores.
#[derive(Debug, thiserror::Error)]
#[allow(clippy::result_large_err)]
pub enum RepositoryError {
    /// The backend could not be reached or the pool handed out no connection.
    #[error("connection failure: {message}{context}")]
    ConnectionError {
        message: String,
        context: ErrorContext,
    },

    /// A statement failed to execute.
    #[error("query failure: {message}{context}")]
    QueryError {
        message: String,
        context: ErrorContext,
    },

    /// No row matched the requested id. The message already names the
    /// missing entity, so no prefix is added.
    #[error("{message}{context}")]
    NotFound {
        message: String,
        context: ErrorContext,
    },

    /// A row failed shape checks on the way in or out of the store.
    #[error("validation failure: {message}{context}")]
    ValidationError {
        message: String,
        context: ErrorContext,
    },

    /// The backend was misconfigured or never initialized.
    #[error("configuration failure: {message}{context}")]
    ConfigurationError {
        message: String,
        context: ErrorContext,
    },

    /// A failure nothing more specific describes.
    #[error("internal storage failure: {message}{context}")]
    InternalError {
        message: String,
        context: ErrorContext,
    },

    /// A transaction failed to commit or roll back.
    #[error("transaction failure: {message}{context}")]
    TransactionError {
        message: String,
        context: ErrorContext,
    },

    /// The operation gave up waiting on a connection or a statement.
    #[error("storage timeout: {message}{context}")]
    TimeoutError {
        message: String,
        context: ErrorContext,
    },
}

impl RepositoryError {
    /// Connection failure. Always retryable.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::connection_with_context(message, ErrorContext::default())
    }

    /// Connection failure with context. Always retryable.
    pub fn connection_with_context(message: impl Into<String>, context: ErrorContext) -> Self {
        Self::ConnectionError {
            message: message.into(),
            context: context.retryable(),
        }
    }

    /// Statement failure. Not retryable unless the context says so.
    pub fn query(message: impl Into<String>) -> Self {
        Self::query_with_context(message, ErrorContext::default())
    }

    /// Statement failure with context.
    pub fn query_with_context(message: impl Into<String>, context: ErrorContext) -> Self {
        Self::QueryError {
            message: message.into(),
            context,
        }
    }

    /// Missing-entity failure.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::not_found_with_context(message, ErrorContext::default())
    }

    /// Missing-entity failure with context.
    pub fn not_found_with_context(message: impl Into<String>, context: ErrorContext) -> Self {
        Self::NotFound {
            message: message.into(),
            context,
        }
    }

    /// Row shape failure.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::validation_with_context(message, ErrorContext::default())
    }

    /// Row shape failure with context.
    pub fn validation_with_context(message: impl Into<String>, context: ErrorContext) -> Self {
        Self::ValidationError {
            message: message.into(),
            context,
        }
    }

    /// Setup or configuration failure.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::ConfigurationError {
            message: message.into(),
            context: ErrorContext::default(),
        }
    }

    /// Catch-all failure.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::internal_with_context(message, ErrorContext::default())
    }

    /// Catch-all failure with context.
    pub fn internal_with_context(message: impl Into<String>, context: ErrorContext) -> Self {
        Self::InternalError {
            message: message.into(),
            context,
        }
    }

    /// Commit or rollback failure.
    pub fn transaction(message: impl Into<String>) -> Self {
        Self::TransactionError {
            message: message.into(),
            context: ErrorContext::default(),
        }
    }

    /// Timed-out operation. Always retryable.
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::TimeoutError {
            message: message.into(),
            context: ErrorContext::default().retryable(),
        }
    }

    /// Whether another attempt at the same operation might succeed.
    ///
    /// Connection failures and timeouts always are. Query and transaction
    /// failures only when the backend flagged them, as it does for Postgres
    /// serialization failures. Everything else is final.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::ConnectionError { .. } | Self::TimeoutError { .. } => true,
            Self::QueryError { context, .. } | Self::TransactionError { context, .. } => {
                context.retryable
            }
            _ => false,
        }
    }

    /// Context attached to this error, whichever the variant.
    pub fn context(&self) -> &ErrorContext {
        match self {
            Self::ConnectionError { context, .. }
            | Self::QueryError { context, .. }
            | Self::NotFound { context, .. }
            | Self::ValidationError { context, .. }
            | Self::ConfigurationError { context, .. }
            | Self::InternalError { context, .. }
            | Self::TransactionError { context, .. }
            | Self::TimeoutError { context, .. } => context,
        }
    }

    fn context_mut(&mut self) -> &mut ErrorContext {
        match self {
            Self::ConnectionError { context, .. }
            | Self::QueryError { context, .. }
            | Self::NotFound { context, .. }
            | Self::ValidationError { context, .. }
            | Self::ConfigurationError { context, .. }
            | Self::InternalError { context, .. }
            | Self::TransactionError { context, .. }
            | Self::TimeoutError { context, .. } => context,
        }
    }

    /// Tag the error with the repository method it came from.
    pub fn with_operation(mut self, operation: impl Into<String>) -> Self {
        self.context_mut().operation = Some(operation.into());
        self
    }
}

#[cfg(feature = "postgres-repo")]
impl From<diesel::result::Error> for RepositoryError {
    fn from(err: diesel::result::Error) -> Self {
        use diesel::result::{DatabaseErrorKind, Error};

        match err {
            Error::NotFound => RepositoryError::not_found("Record not found"),
            Error::DatabaseError(kind, info) => {
                let mut context =
                    ErrorContext::default().with_details(format!("db_error_kind={:?}", kind));
                // Serialization failures are worth retrying.
                if matches!(kind, DatabaseErrorKind::SerializationFailure) {
                    context = context.retryable();
                }
                RepositoryError::QueryError {
                    message: info.message().to_string(),
                    context,
                }
            }
            Error::QueryBuilderError(e) => {
                RepositoryError::query(format!("query builder: {}", e))
            }
            Error::DeserializationError(e) => {
                RepositoryError::validation(format!("row deserialization: {}", e))
            }
            Error::SerializationError(e) => {
                RepositoryError::validation(format!("value serialization: {}", e))
            }
            Error::RollbackErrorOnCommit { commit_error, .. } => {
                RepositoryError::transaction(format!("commit failed: {}", commit_error))
            }
            Error::BrokenTransactionManager => {
                RepositoryError::transaction("transaction manager broken")
            }
            other => RepositoryError::query(other.to_string()),
        }
    }
}

#[cfg(feature = "postgres-repo")]
impl From<diesel::r2d2::PoolError> for RepositoryError {
    fn from(err: diesel::r2d2::PoolError) -> Self {
        RepositoryError::connection_with_context(
            err.to_string(),
            ErrorContext::default().with_details("connection pool"),
        )
    }
}
