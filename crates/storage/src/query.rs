//! The typed historical-query model.
//!
//! Wire shape of a query body (all JSON):
//!
//! ```json
//! {"resourceType": "PROPERTY", "queryType": "TIME_RANGE",
//!  "startTimestampMs": 0, "endTimestampMs": 1700000000000}
//! ```
//!
//! `resourceType` and `queryType` are mandatory; range bounds are optional
//! with documented defaults. Results come back from the executor as an
//! envelope the gateway transports verbatim.

use serde::{Deserialize, Serialize};

use crate::error::StorageError;

/// Stored record class a historical query targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QueryResourceType {
    Property,
    Event,
    Action,
    State,
    Notification,
}

/// Selection mode of a historical query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QueryType {
    TimeRange,
    SampleRange,
    LastValue,
    Count,
}

/// Bounds of a range query.
///
/// Exactly one form exists per request, selected by the query type; the enum
/// makes a request carrying both forms unrepresentable. Sample indices are
/// end-exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryRange {
    Time { start_ms: i64, end_ms: i64 },
    Samples { start_index: usize, end_index: usize },
}

/// A typed historical query, parsed from an HTTP request body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryRequest {
    pub resource_type: QueryResourceType,
    pub query_type: QueryType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range: Option<QueryRange>,
}

impl QueryRequest {
    /// Parse a raw JSON body into a typed query.
    ///
    /// `resourceType` and `queryType` are mandatory; the absence of either is
    /// malformed. Time-range bounds default to 0 (start) and `now_ms` (end);
    /// sample-range bounds default to 0. The non-range query types carry no
    /// bounds and are passed through for the executor to judge.
    pub fn from_body(body: &serde_json::Value, now_ms: i64) -> Result<Self, StorageError> {
        let resource_type: QueryResourceType = required_field(body, "resourceType")?;
        let query_type: QueryType = required_field(body, "queryType")?;

        let range = match query_type {
            QueryType::TimeRange => Some(QueryRange::Time {
                start_ms: body
                    .get("startTimestampMs")
                    .and_then(serde_json::Value::as_i64)
                    .unwrap_or(0),
                end_ms: body
                    .get("endTimestampMs")
                    .and_then(serde_json::Value::as_i64)
                    .unwrap_or(now_ms),
            }),
            QueryType::SampleRange => Some(QueryRange::Samples {
                start_index: index_field(body, "startIndex"),
                end_index: index_field(body, "endIndex"),
            }),
            QueryType::LastValue | QueryType::Count => None,
        };

        Ok(QueryRequest {
            resource_type,
            query_type,
            range,
        })
    }
}

fn required_field<T: serde::de::DeserializeOwned>(
    body: &serde_json::Value,
    field: &str,
) -> Result<T, StorageError> {
    let value = body
        .get(field)
        .ok_or_else(|| StorageError::MalformedQuery(format!("missing '{field}' field")))?;
    serde_json::from_value(value.clone())
        .map_err(|_| StorageError::MalformedQuery(format!("unrecognized {field}: {value}")))
}

fn index_field(body: &serde_json::Value, field: &str) -> usize {
    body.get(field)
        .and_then(serde_json::Value::as_u64)
        .and_then(|v| usize::try_from(v).ok())
        .unwrap_or(0)
}

/// Executor outcome for one query. Produced only by the executor; the
/// gateway constructs nothing but the transport envelope around it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    pub success: bool,
    pub records: Vec<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl QueryResult {
    pub fn ok(records: Vec<serde_json::Value>) -> Self {
        QueryResult {
            success: true,
            records,
            error: None,
        }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        QueryResult {
            success: false,
            records: Vec::new(),
            error: Some(message.into()),
        }
    }
}

/// Aggregate statistics over what an executor currently holds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageStats {
    pub property_count: u64,
    pub state_count: u64,
    pub notification_count: u64,
    pub action_count: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oldest_entry_ms: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub newest_entry_ms: Option<i64>,
}
