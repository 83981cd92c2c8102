//! Error types for pgrecord

use std::time::Duration;
use thiserror::Error;

/// Result type alias for pgrecord operations
pub type RecordResult<T> = Result<T, RecordError>;

/// Errors surfaced by the clause builder and the entity layer.
#[derive(Debug, Error)]
pub enum RecordError {
    /// Missing or malformed input, caught before any SQL is built
    #[error("Validation error: {0}")]
    Validation(String),

    /// A statement that needs at least one column was given none
    #[error("{operation} requires at least one field")]
    EmptyFields { operation: &'static str },

    /// Failure reported by the execution layer
    #[error(transparent)]
    Database(#[from] DatabaseError),

    /// Configuration loading error
    #[error("Config error: {0}")]
    Config(String),
}

impl RecordError {
    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create an empty-fields error for the named operation
    pub fn empty_fields(operation: &'static str) -> Self {
        Self::EmptyFields { operation }
    }

    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// True for input errors raised before a statement reaches the database.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_) | Self::EmptyFields { .. })
    }

    /// Check if this is an empty-fields error
    pub fn is_empty_fields(&self) -> bool {
        matches!(self, Self::EmptyFields { .. })
    }

    /// Check if this error came from the execution layer
    pub fn is_database(&self) -> bool {
        matches!(self, Self::Database(_))
    }

    /// The underlying database error, if any
    pub fn as_database(&self) -> Option<&DatabaseError> {
        match self {
            Self::Database(err) => Some(err),
            _ => None,
        }
    }
}

impl From<tokio_postgres::Error> for RecordError {
    fn from(err: tokio_postgres::Error) -> Self {
        Self::Database(DatabaseError::from_db_error(err))
    }
}

#[cfg(feature = "pool")]
impl From<deadpool_postgres::PoolError> for RecordError {
    fn from(err: deadpool_postgres::PoolError) -> Self {
        Self::Database(DatabaseError::Pool(Box::new(err)))
    }
}

/// Error types for database operations
///
/// Variants classified from a driver error keep that error as their
/// `source()`, so SQLSTATE and server detail stay reachable.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Database connection error
    #[error("Connection error: {message}")]
    Connection {
        message: String,
        #[source]
        source: Option<tokio_postgres::Error>,
    },

    /// Query execution error
    #[error("Query error: {0}")]
    Query(#[from] tokio_postgres::Error),

    /// Unique constraint violation
    #[error("Unique constraint violation: {constraint}: {message}")]
    UniqueViolation {
        constraint: String,
        message: String,
        #[source]
        source: tokio_postgres::Error,
    },

    /// Foreign key constraint violation
    #[error("Foreign key violation: {constraint}: {message}")]
    ForeignKeyViolation {
        constraint: String,
        message: String,
        #[source]
        source: tokio_postgres::Error,
    },

    /// Check constraint violation
    #[error("Check constraint violation: {constraint}: {message}")]
    CheckViolation {
        constraint: String,
        message: String,
        #[source]
        source: tokio_postgres::Error,
    },

    /// Row decode error
    #[error("Decode error on column '{column}': {message}")]
    Decode { column: String, message: String },

    /// Pool checkout error, holding the pool's own error
    #[error("Pool error: {0}")]
    Pool(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Statement timeout
    #[error("Query timeout after {0:?}")]
    Timeout(Duration),

    /// Other errors
    #[error("{0}")]
    Other(String),
}

impl DatabaseError {
    /// Create a connection error with no driver error attached
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
            source: None,
        }
    }

    /// Create a decode error for a specific column
    pub fn decode(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            column: column.into(),
            message: message.into(),
        }
    }

    /// Check if this is a unique violation error
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, Self::UniqueViolation { .. })
    }

    /// Check if this is a timeout error
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }

    /// The driver error this was classified from, if any.
    pub fn pg_error(&self) -> Option<&tokio_postgres::Error> {
        match self {
            Self::Query(err)
            | Self::UniqueViolation { source: err, .. }
            | Self::ForeignKeyViolation { source: err, .. }
            | Self::CheckViolation { source: err, .. } => Some(err),
            Self::Connection { source, .. } => source.as_ref(),
            _ => None,
        }
    }

    /// The pool error behind a [`DatabaseError::Pool`].
    #[cfg(feature = "pool")]
    pub fn pool_error(&self) -> Option<&deadpool_postgres::PoolError> {
        match self {
            Self::Pool(err) => err.downcast_ref(),
            _ => None,
        }
    }

    /// SQLSTATE reported by the server, if any.
    pub fn sqlstate(&self) -> Option<&tokio_postgres::error::SqlState> {
        self.pg_error().and_then(tokio_postgres::Error::code)
    }

    /// Parse a tokio_postgres error into a more specific DatabaseError
    pub fn from_db_error(err: tokio_postgres::Error) -> Self {
        let classified = err.as_db_error().and_then(|db_err| {
            let kind = match db_err.code().code() {
                "23505" => Violation::Unique,
                "23503" => Violation::ForeignKey,
                "23514" => Violation::Check,
                _ => return None,
            };
            let constraint = db_err.constraint().unwrap_or("unknown").to_string();
            Some((kind, constraint, db_err.message().to_string()))
        });

        match classified {
            Some((Violation::Unique, constraint, message)) => Self::UniqueViolation {
                constraint,
                message,
                source: err,
            },
            Some((Violation::ForeignKey, constraint, message)) => Self::ForeignKeyViolation {
                constraint,
                message,
                source: err,
            },
            Some((Violation::Check, constraint, message)) => Self::CheckViolation {
                constraint,
                message,
                source: err,
            },
            None if err.is_closed() => Self::Connection {
                message: err.to_string(),
                source: Some(err),
            },
            None => Self::Query(err),
        }
    }
}

enum Violation {
    Unique,
    ForeignKey,
    Check,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_fields_counts_as_validation() {
        let err = RecordError::empty_fields("create");
        assert!(err.is_validation());
        assert!(err.is_empty_fields());
        assert_eq!(err.to_string(), "create requires at least one field");
    }

    #[test]
    fn database_errors_pass_through_display() {
        let err = RecordError::from(DatabaseError::Timeout(Duration::from_millis(250)));
        assert!(err.is_database());
        assert!(!err.is_validation());
        assert_eq!(err.to_string(), "Query timeout after 250ms");
        assert!(err.as_database().is_some_and(DatabaseError::is_timeout));
    }

    #[cfg(feature = "pool")]
    #[test]
    fn pool_errors_keep_their_source() {
        use std::error::Error as _;

        let err = RecordError::from(deadpool_postgres::PoolError::Closed);
        let source = err.source().expect("pool error should be the source");
        assert!(source.downcast_ref::<deadpool_postgres::PoolError>().is_some());

        let db = err.as_database().unwrap();
        assert!(matches!(
            db.pool_error(),
            Some(deadpool_postgres::PoolError::Closed)
        ));
        assert!(db.pg_error().is_none());
    }

    #[test]
    fn connection_without_driver_error_has_no_source() {
        use std::error::Error as _;

        let err = DatabaseError::connection("connection reset");
        assert_eq!(err.to_string(), "Connection error: connection reset");
        assert!(err.source().is_none());
        assert!(err.sqlstate().is_none());
    }
}
