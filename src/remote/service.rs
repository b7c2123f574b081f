use crate::window::QueryWindow;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    Api(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("service response missing field '{0}'")]
    MissingField(&'static str),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, ServiceError>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogGroup {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogStream {
    pub name: String,
    /// Epoch milliseconds of the newest event; None for never-written streams
    pub last_event_timestamp: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEvent {
    pub event_id: String,
    /// Event time, epoch milliseconds
    pub timestamp: i64,
    pub stream_name: String,
    pub message: String,
}

/// One page of a paginated listing plus the cursor for the next one
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_token: Option<String>,
}

impl<T> Page<T> {
    pub fn last(items: Vec<T>) -> Self {
        Self {
            items,
            next_token: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StreamOrder {
    #[default]
    LogStreamName,
    LastEventTime,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamsRequest {
    pub group: String,
    pub prefix: Option<String>,
    pub order_by: StreamOrder,
    pub descending: bool,
}

impl StreamsRequest {
    pub fn new(group: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            ..Default::default()
        }
    }
}

/// A Logs Insights query submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsightsQuery {
    pub groups: Vec<String>,
    /// Epoch seconds
    pub start: i64,
    /// Epoch seconds
    pub end: i64,
    pub query: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryStatus {
    Scheduled,
    Running,
    Complete,
    Failed,
    Cancelled,
    Timeout,
    Unknown,
}

impl QueryStatus {
    pub fn from_name(name: &str) -> Self {
        match name {
            "Scheduled" => Self::Scheduled,
            "Running" => Self::Running,
            "Complete" => Self::Complete,
            "Failed" => Self::Failed,
            "Cancelled" => Self::Cancelled,
            "Timeout" => Self::Timeout,
            _ => Self::Unknown,
        }
    }

    /// Statuses after which polling can never reach Complete
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed | Self::Cancelled | Self::Timeout)
    }
}

impl fmt::Display for QueryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Scheduled => "Scheduled",
            Self::Running => "Running",
            Self::Complete => "Complete",
            Self::Failed => "Failed",
            Self::Cancelled => "Cancelled",
            Self::Timeout => "Timeout",
            Self::Unknown => "Unknown",
        };
        f.write_str(name)
    }
}

/// One row of query output: `(field, value)` pairs in service order
pub type ResultRow = Vec<(String, String)>;

#[derive(Debug, Clone)]
pub struct QueryResults {
    pub status: QueryStatus,
    pub rows: Vec<ResultRow>,
}

/// Page-level operations of the remote log store.
///
/// Implementations fetch exactly one page per call; cursor handling lives in
/// [`crate::remote::PagedClient`].
#[async_trait]
pub trait LogService: Send + Sync {
    async fn describe_log_groups(
        &self,
        prefix: Option<&str>,
        next_token: Option<String>,
    ) -> Result<Page<LogGroup>>;

    async fn describe_log_streams(
        &self,
        request: &StreamsRequest,
        next_token: Option<String>,
    ) -> Result<Page<LogStream>>;

    /// Events in `window`, interleaved across streams
    async fn filter_log_events(
        &self,
        window: &QueryWindow,
        next_token: Option<String>,
    ) -> Result<Page<LogEvent>>;

    /// Submit a query; returns its id
    async fn start_query(&self, query: &InsightsQuery) -> Result<String>;

    async fn get_query_results(&self, query_id: &str) -> Result<QueryResults>;
}
