/// All errors that can cross the storage boundary.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The query body is missing required fields or carries unrecognized values.
    #[error("malformed query: {0}")]
    MalformedQuery(String),

    /// The executor could not run the query at all.
    #[error("query execution failed: {0}")]
    QueryFailed(String),

    /// Storage statistics are not available.
    #[error("storage statistics unavailable")]
    StatsUnavailable,

    /// A backend-specific storage error (connection, serialization, etc.).
    #[error("storage backend error: {0}")]
    Backend(String),
}
