//! Error types for NexusFeed
//!
//! Every repository and service operation resolves to either a value or
//! exactly one `AppError` kind. Store-level `sqlx` errors are classified
//! here, in one place, so callers never match on driver errors.

use std::fmt;

use thiserror::Error;

/// Application-wide error type
#[derive(Debug, Error)]
pub enum AppError {
    /// The requested row does not exist (or is no longer visible)
    #[error("record not found")]
    RecordNotFound,

    /// The row targeted by an update vanished before the write landed
    #[error("unable to update the record due to an edit conflict, please try again")]
    EditConflict,

    /// One or more caller-supplied fields were rejected
    #[error("validation failed: {0}")]
    ValidationFailed(ValidationErrors),

    /// Transient store failure (timeout, connectivity). Safe to retry.
    #[error("query failed: {0}")]
    QueryFailed(String),

    /// The store rejected a write (constraint violation and the like)
    #[error("write rejected: {0}")]
    WriteFailed(String),

    /// A stored row could not be mapped to its entity
    #[error("malformed stored data: {0}")]
    Decode(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// Which side of the store an operation touches.
///
/// The same driver error means different things for reads and writes: a
/// database-reported error on insert is a rejected row, on select it is a
/// failed query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOp {
    Read,
    Write,
}

impl AppError {
    /// Classify a driver error raised by a store operation.
    pub fn from_store(op: StoreOp, err: sqlx::Error) -> Self {
        use sqlx::Error as E;

        match err {
            E::RowNotFound => AppError::RecordNotFound,
            E::ColumnDecode { .. } | E::Decode(_) | E::ColumnNotFound(_) | E::TypeNotFound { .. } => {
                AppError::Decode(err.to_string())
            }
            E::Database(db_err) => match op {
                StoreOp::Write => AppError::WriteFailed(db_err.to_string()),
                StoreOp::Read => AppError::QueryFailed(db_err.to_string()),
            },
            E::Io(_)
            | E::Tls(_)
            | E::Protocol(_)
            | E::PoolTimedOut
            | E::PoolClosed
            | E::WorkerCrashed => AppError::QueryFailed(err.to_string()),
            other => AppError::Internal(anyhow::Error::new(other)),
        }
    }

    /// Short label used for logs and the error counter.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::RecordNotFound => "record_not_found",
            AppError::EditConflict => "edit_conflict",
            AppError::ValidationFailed(_) => "validation_failed",
            AppError::QueryFailed(_) => "query_failed",
            AppError::WriteFailed(_) => "write_failed",
            AppError::Decode(_) => "decode",
            AppError::Config(_) => "config",
            AppError::Internal(_) => "internal",
        }
    }

    /// Only transient store failures are worth retrying.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AppError::QueryFailed(_))
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::from_store(StoreOp::Read, err)
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        AppError::ValidationFailed(errors)
    }
}

/// Ordered collection of `(field, message)` pairs.
///
/// Only the first message recorded for a field is kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    fields: Vec<(String, String)>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        if self.get(field).is_none() {
            self.fields.push((field.to_string(), message.into()));
        }
    }

    /// Record `message` against `field` unless `ok` holds.
    pub fn check(&mut self, ok: bool, field: &str, message: impl Into<String>) {
        if !ok {
            self.add(field, message);
        }
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, message)| message.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields
            .iter()
            .map(|(field, message)| (field.as_str(), message.as_str()))
    }

    /// `Ok(())` when nothing was recorded, otherwise `ValidationFailed`.
    pub fn into_result(self) -> Result<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(AppError::ValidationFailed(self))
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (field, message)) in self.fields.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{field}: {message}")?;
        }
        Ok(())
    }
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;
