//! In-memory reference executor.
//!
//! Keeps every recorded row for the lifetime of the process, one ordered
//! list per record class. Demos and tests run against it; it is not a
//! storage-engine design, just the smallest thing that honors the
//! [`TwinStorage`] contract.

use std::sync::{PoisonError, RwLock, RwLockReadGuard};

use async_trait::async_trait;

use crate::error::StorageError;
use crate::query::{
    QueryRange, QueryRequest, QueryResourceType, QueryResult, QueryType, StorageStats,
};
use crate::traits::TwinStorage;

#[derive(Debug, Clone)]
struct Row {
    timestamp_ms: i64,
    record: serde_json::Value,
}

/// Unbounded in-memory [`TwinStorage`] backend.
#[derive(Debug, Default)]
pub struct InMemoryTwinStorage {
    properties: RwLock<Vec<Row>>,
    states: RwLock<Vec<Row>>,
    notifications: RwLock<Vec<Row>>,
    actions: RwLock<Vec<Row>>,
}

impl InMemoryTwinStorage {
    pub fn new() -> Self {
        InMemoryTwinStorage::default()
    }

    /// Record one property variation.
    pub fn record_property(&self, key: &str, value: serde_json::Value, timestamp_ms: i64) {
        self.push(
            &self.properties,
            timestamp_ms,
            serde_json::json!({"key": key, "value": value, "timestamp_ms": timestamp_ms}),
        );
    }

    /// Record one full state snapshot.
    pub fn record_state(&self, state: serde_json::Value, timestamp_ms: i64) {
        self.push(&self.states, timestamp_ms, state);
    }

    /// Record one event notification.
    pub fn record_notification(&self, notification: serde_json::Value, timestamp_ms: i64) {
        self.push(&self.notifications, timestamp_ms, notification);
    }

    /// Record one incoming action request.
    pub fn record_action(&self, key: &str, body: &str, timestamp_ms: i64) {
        self.push(
            &self.actions,
            timestamp_ms,
            serde_json::json!({"key": key, "body": body, "timestamp_ms": timestamp_ms}),
        );
    }

    fn push(&self, rows: &RwLock<Vec<Row>>, timestamp_ms: i64, record: serde_json::Value) {
        rows.write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Row {
                timestamp_ms,
                record,
            });
    }

    fn rows(&self, resource_type: QueryResourceType) -> RwLockReadGuard<'_, Vec<Row>> {
        let rows = match resource_type {
            QueryResourceType::Property => &self.properties,
            QueryResourceType::State => &self.states,
            QueryResourceType::Event | QueryResourceType::Notification => &self.notifications,
            QueryResourceType::Action => &self.actions,
        };
        rows.read().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl TwinStorage for InMemoryTwinStorage {
    async fn execute_query(&self, request: QueryRequest) -> Result<QueryResult, StorageError> {
        let rows = self.rows(request.resource_type);

        let result = match (request.query_type, request.range) {
            (QueryType::TimeRange, Some(QueryRange::Time { start_ms, end_ms })) => {
                if start_ms > end_ms {
                    QueryResult::fail(format!(
                        "time range start {start_ms} is after end {end_ms}"
                    ))
                } else {
                    QueryResult::ok(
                        rows.iter()
                            .filter(|r| r.timestamp_ms >= start_ms && r.timestamp_ms <= end_ms)
                            .map(|r| r.record.clone())
                            .collect(),
                    )
                }
            }
            (
                QueryType::SampleRange,
                Some(QueryRange::Samples {
                    start_index,
                    end_index,
                }),
            ) => {
                if start_index > end_index {
                    QueryResult::fail(format!(
                        "sample range start {start_index} is after end {end_index}"
                    ))
                } else {
                    // End-exclusive, clamped to what is actually stored.
                    let end = end_index.min(rows.len());
                    let start = start_index.min(end);
                    QueryResult::ok(rows[start..end].iter().map(|r| r.record.clone()).collect())
                }
            }
            (QueryType::LastValue, _) => {
                QueryResult::ok(rows.last().map(|r| r.record.clone()).into_iter().collect())
            }
            (QueryType::Count, _) => {
                QueryResult::ok(vec![serde_json::json!({"count": rows.len()})])
            }
            (query_type, range) => QueryResult::fail(format!(
                "query type {query_type:?} does not match range {range:?}"
            )),
        };

        Ok(result)
    }

    async fn storage_stats(&self) -> Result<StorageStats, StorageError> {
        let all = [
            self.properties.read().unwrap_or_else(PoisonError::into_inner),
            self.states.read().unwrap_or_else(PoisonError::into_inner),
            self.notifications
                .read()
                .unwrap_or_else(PoisonError::into_inner),
            self.actions.read().unwrap_or_else(PoisonError::into_inner),
        ];

        let timestamps = all.iter().flat_map(|rows| rows.iter().map(|r| r.timestamp_ms));

        Ok(StorageStats {
            property_count: all[0].len() as u64,
            state_count: all[1].len() as u64,
            notification_count: all[2].len() as u64,
            action_count: all[3].len() as u64,
            oldest_entry_ms: timestamps.clone().min(),
            newest_entry_ms: timestamps.max(),
        })
    }
}
