use async_trait::async_trait;

use crate::error::StorageError;
use crate::query::{QueryRequest, QueryResult, StorageStats};

/// The executor contract for historical twin data.
///
/// Implementations own persistence and query evaluation entirely; the
/// gateway passes [`QueryRequest`] values through unchanged and transports
/// whatever comes back.
///
/// ## Outcome semantics
///
/// - `Ok` with `success == true` — the query ran and `records` holds the
///   matching rows.
/// - `Ok` with `success == false` — the executor understood the query but
///   could not satisfy it (bad bounds, unsupported combination); the reason
///   travels in `error` and surfaces to HTTP clients as a client error.
/// - `Err(StorageError)` — the executor itself failed; surfaces as a
///   server-side error carrying the error's message text.
///
/// ## Thread safety
///
/// Implementations must be `Send + Sync + 'static` to be shared with axum
/// handlers across async task boundaries. Calls may take arbitrarily long;
/// the gateway imposes no timeout of its own.
#[async_trait]
pub trait TwinStorage: Send + Sync + 'static {
    /// Run one historical query.
    async fn execute_query(&self, request: QueryRequest) -> Result<QueryResult, StorageError>;

    /// Aggregate statistics for what the executor currently holds.
    async fn storage_stats(&self) -> Result<StorageStats, StorageError>;
}
