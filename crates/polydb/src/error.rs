//! Error types for polydb

use crate::statement::{Preview, StatementKind};
use thiserror::Error;

/// Result type alias for polydb operations
pub type DbResult<T> = Result<T, DbError>;

/// Error types for statement building and execution
#[derive(Debug, Error)]
pub enum DbError {
    /// Column name is empty, contains whitespace or the identifier quote character
    #[error("Invalid column name: {0}")]
    InvalidColumn(String),

    /// Date/datetime literal is not `YYYY-MM-DD` or `YYYY-MM-DD HH:MM:SS`
    #[error("Invalid datetime format `{0}`: it must be `YYYY-MM-DD HH:MM:SS` or `YYYY-MM-DD`")]
    InvalidDateFormat(String),

    /// Binding key contains whitespace or does not start with `:`
    #[error("Invalid binding key `{0}`: it must look like `:name` without whitespace")]
    InvalidBindingKey(String),

    /// A placeholder in the statement text has no bound value
    #[error("Placeholder `{0}` has no bound value")]
    UnboundParameter(String),

    /// Two fragments bind the same key
    #[error("Duplicate binding key `{0}`")]
    DuplicateBindingKey(String),

    /// Statement kind does not match the method it was passed to
    #[error("{method}() cannot run a {found} statement: {hint}")]
    WrongStatementKind {
        method: &'static str,
        found: StatementKind,
        hint: &'static str,
    },

    /// Insert was called without any row
    #[error("insert() needs at least one row")]
    EmptyInsertValues,

    /// Sequence-driven insert target is missing a part
    #[error("Sequenced insert target must have a non-empty `{0}`")]
    MissingSequenceSpec(&'static str),

    /// Driver tag does not name a supported dialect
    #[error("Unknown dialect `{0}`: driver must be one of pdo_mysql, mysql, mariadb, oci8, oracle")]
    UnknownDialect(String),

    /// Value could not be read as the requested type
    #[error("Decode error on column '{column}': {message}")]
    Decode { column: String, message: String },

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration could not be read or parsed
    #[error("Configuration error: {0}")]
    Config(String),

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Connection-level failure reported by the driver
    #[error("Connection error: {0}")]
    Connection(String),

    /// Error raised by the underlying driver
    #[error("Driver error: {0}")]
    Driver(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Debug mode short-circuit: the statement was rendered instead of executed
    #[error("Statement not executed (debug mode): {0}")]
    Preview(Box<Preview>),
}

impl DbError {
    /// Create a decode error for a specific column
    pub fn decode(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            column: column.into(),
            message: message.into(),
        }
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a connection error
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection(message.into())
    }

    /// Wrap a driver error, keeping it as the source
    pub fn driver(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Driver(Box::new(err))
    }

    /// Check if this error was raised by the kind/method match
    pub fn is_wrong_statement_kind(&self) -> bool {
        matches!(self, Self::WrongStatementKind { .. })
    }

    /// Check if this is a binding key error
    pub fn is_invalid_binding_key(&self) -> bool {
        matches!(self, Self::InvalidBindingKey(_))
    }

    /// Check if this error came from the driver or the connection
    pub fn is_connection(&self) -> bool {
        matches!(self, Self::Connection(_) | Self::Driver(_))
    }

    /// The rendered statement, if this is a debug-mode preview
    pub fn preview(&self) -> Option<&Preview> {
        match self {
            Self::Preview(p) => Some(p),
            _ => None,
        }
    }
}
