#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    /// The field could not be parsed at all (wrong format, not a date).
    /// Kept distinct from [`RecordError::InvalidField`] so callers can tell
    /// a syntax problem apart from a semantic one.
    #[error("field '{field}' is malformed: {message}")]
    MalformedField {
        field: &'static str,
        message: String,
    },
    /// The field parsed but violates a domain rule (unknown gender value,
    /// out-of-range birth date).
    #[error("field '{field}' is invalid: {message}")]
    InvalidField {
        field: &'static str,
        message: String,
    },
    #[error("no fields supplied to update")]
    EmptyUpdate,
    #[error("patient '{0}' already exists")]
    Conflict(String),
    #[error("patient '{0}' does not exist")]
    NotFound(String),
    #[error("storage error: {0}")]
    Storage(#[from] sqlx::Error),
}

pub type RecordResult<T> = std::result::Result<T, RecordError>;
