/// Errors that can occur within the storage layer.
///
/// # Examples
///
/// ```rust
/// use wxmon_storage::error::StorageError;
///
/// let err = StorageError::NotFound {
///     entity: "alert_rule",
///     id: 99,
/// };
/// assert!(err.to_string().contains("alert_rule"));
/// ```
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// A required record was not found (or is not owned by the caller).
    #[error("storage: {entity} not found (id={id})")]
    NotFound { entity: &'static str, id: i64 },

    /// An underlying database error.
    #[error("storage: database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// A stored `metric_type` column no longer parses as a known metric.
    #[error("storage: invalid metric type in row: {0}")]
    InvalidMetric(String),

    /// A stored `severity` column no longer parses as a known severity.
    #[error("storage: invalid severity in row: {0}")]
    InvalidSeverity(String),
}

/// Convenience alias so callers can write `error::Result<T>`.
pub type Result<T> = std::result::Result<T, StorageError>;
