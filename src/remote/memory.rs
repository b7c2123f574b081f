//! In-memory [`LogService`] used by the test suites.
//!
//! Pagination, window filtering and stream ordering follow the remote API
//! closely enough to drive the pagination client and the tail engine
//! without a network. Filter patterns are matched as plain substrings.

use super::service::{
    InsightsQuery, LogEvent, LogGroup, LogService, LogStream, Page, QueryResults, QueryStatus,
    Result, ResultRow, ServiceError, StreamOrder, StreamsRequest,
};
use crate::window::QueryWindow;
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

const DEFAULT_PAGE_SIZE: usize = 50;

#[derive(Debug, Default)]
struct GroupState {
    streams: BTreeMap<String, Option<i64>>,
    events: Vec<LogEvent>,
}

#[derive(Debug, Default)]
struct State {
    groups: BTreeMap<String, GroupState>,
    failing_groups: HashMap<String, String>,
    failing_filter_page: Option<(usize, String)>,
    filter_calls: usize,
    query_statuses: VecDeque<QueryStatus>,
    query_rows: Vec<ResultRow>,
    query_polls: usize,
}

/// Shared handle; clones see the same store
#[derive(Debug, Clone)]
pub struct MemoryLogService {
    state: Arc<Mutex<State>>,
    page_size: usize,
}

impl Default for MemoryLogService {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryLogService {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(State::default())),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        // A poisoned lock only means a test thread panicked; keep going
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn put_group(&self, group: &str) {
        self.lock().groups.entry(group.to_string()).or_default();
    }

    pub fn put_stream(&self, group: &str, stream: &str, last_event_timestamp: Option<i64>) {
        self.lock()
            .groups
            .entry(group.to_string())
            .or_default()
            .streams
            .insert(stream.to_string(), last_event_timestamp);
    }

    /// Append an event, creating its group and stream as needed
    pub fn put_event(&self, group: &str, stream: &str, event_id: &str, timestamp: i64, message: &str) {
        let mut state = self.lock();
        let group_state = state.groups.entry(group.to_string()).or_default();

        let last = group_state.streams.entry(stream.to_string()).or_insert(None);
        *last = Some(last.map_or(timestamp, |t| t.max(timestamp)));

        group_state.events.push(LogEvent {
            event_id: event_id.to_string(),
            timestamp,
            stream_name: stream.to_string(),
            message: message.to_string(),
        });
    }

    /// Make every filter request against `group` fail
    pub fn fail_group(&self, group: &str, message: &str) {
        self.lock()
            .failing_groups
            .insert(group.to_string(), message.to_string());
    }

    /// Make the request for page `page_index` (0-based) of any filter fail
    pub fn fail_filter_page(&self, page_index: usize, message: &str) {
        self.lock().failing_filter_page = Some((page_index, message.to_string()));
    }

    /// Statuses returned by successive result polls; the last one repeats
    pub fn script_query(&self, statuses: Vec<QueryStatus>, rows: Vec<ResultRow>) {
        let mut state = self.lock();
        state.query_statuses = statuses.into();
        state.query_rows = rows;
    }

    pub fn filter_calls(&self) -> usize {
        self.lock().filter_calls
    }

    pub fn query_polls(&self) -> usize {
        self.lock().query_polls
    }

    fn paginate<T: Clone>(&self, items: &[T], next_token: Option<String>) -> Result<Page<T>> {
        let page_index = parse_token(next_token)?;
        let start = page_index * self.page_size;
        let end = (start + self.page_size).min(items.len());

        let page_items = items.get(start..end).map(<[T]>::to_vec).unwrap_or_default();
        let next_token = (end < items.len()).then(|| (page_index + 1).to_string());

        Ok(Page {
            items: page_items,
            next_token,
        })
    }
}

fn parse_token(token: Option<String>) -> Result<usize> {
    match token {
        None => Ok(0),
        Some(t) => t
            .parse()
            .map_err(|_| ServiceError::Other(format!("invalid next token '{}'", t))),
    }
}

fn unknown_group(group: &str) -> ServiceError {
    ServiceError::Other(format!("ResourceNotFoundException: log group '{}' does not exist", group))
}

#[async_trait]
impl LogService for MemoryLogService {
    async fn describe_log_groups(
        &self,
        prefix: Option<&str>,
        next_token: Option<String>,
    ) -> Result<Page<LogGroup>> {
        let groups: Vec<LogGroup> = self
            .lock()
            .groups
            .keys()
            .filter(|name| prefix.map_or(true, |p| name.starts_with(p)))
            .map(|name| LogGroup { name: name.clone() })
            .collect();

        self.paginate(&groups, next_token)
    }

    async fn describe_log_streams(
        &self,
        request: &StreamsRequest,
        next_token: Option<String>,
    ) -> Result<Page<LogStream>> {
        let mut streams: Vec<LogStream> = {
            let state = self.lock();
            let group = state
                .groups
                .get(&request.group)
                .ok_or_else(|| unknown_group(&request.group))?;

            group
                .streams
                .iter()
                .filter(|(name, _)| {
                    request
                        .prefix
                        .as_deref()
                        .map_or(true, |p| name.starts_with(p))
                })
                .map(|(name, last)| LogStream {
                    name: name.clone(),
                    last_event_timestamp: *last,
                })
                .collect()
        };

        match request.order_by {
            StreamOrder::LogStreamName => streams.sort_by(|a, b| a.name.cmp(&b.name)),
            StreamOrder::LastEventTime => {
                streams.sort_by(|a, b| a.last_event_timestamp.cmp(&b.last_event_timestamp))
            }
        }
        if request.descending {
            streams.reverse();
        }

        self.paginate(&streams, next_token)
    }

    async fn filter_log_events(
        &self,
        window: &QueryWindow,
        next_token: Option<String>,
    ) -> Result<Page<LogEvent>> {
        let events: Vec<LogEvent> = {
            let mut state = self.lock();
            state.filter_calls += 1;

            if let Some(message) = state.failing_groups.get(&window.group) {
                return Err(ServiceError::Other(message.clone()));
            }
            if let Some((page_index, message)) = &state.failing_filter_page {
                if parse_token(next_token.clone())? == *page_index {
                    return Err(ServiceError::Other(message.clone()));
                }
            }

            let group = state
                .groups
                .get(&window.group)
                .ok_or_else(|| unknown_group(&window.group))?;

            let mut matching: Vec<LogEvent> = group
                .events
                .iter()
                .filter(|e| window.contains(e.timestamp))
                .filter(|e| {
                    window
                        .stream_names
                        .as_ref()
                        .map_or(true, |names| names.contains(&e.stream_name))
                })
                .filter(|e| {
                    window
                        .filter_pattern
                        .as_deref()
                        .map_or(true, |p| e.message.contains(p))
                })
                .cloned()
                .collect();

            // Interleaved delivery: time order across streams, stable on ties
            matching.sort_by_key(|e| e.timestamp);
            matching
        };

        self.paginate(&events, next_token)
    }

    async fn start_query(&self, query: &InsightsQuery) -> Result<String> {
        let state = self.lock();
        if let Some(missing) = query.groups.iter().find(|g| !state.groups.contains_key(*g)) {
            return Err(unknown_group(missing));
        }
        Ok("query-1".to_string())
    }

    async fn get_query_results(&self, _query_id: &str) -> Result<QueryResults> {
        let mut state = self.lock();
        state.query_polls += 1;

        let status = if state.query_statuses.len() > 1 {
            state.query_statuses.pop_front()
        } else {
            state.query_statuses.front().copied()
        }
        .unwrap_or(QueryStatus::Complete);

        let rows = if status == QueryStatus::Complete {
            state.query_rows.clone()
        } else {
            Vec::new()
        };

        Ok(QueryResults { status, rows })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_event_tracks_stream_activity() {
        let service = MemoryLogService::new();
        service.put_event("app", "web-1", "a", 300, "x");
        service.put_event("app", "web-1", "b", 100, "y");

        let page = service
            .describe_log_streams(&StreamsRequest::new("app"), None)
            .await
            .unwrap();

        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].last_event_timestamp, Some(300));
    }

    #[tokio::test]
    async fn test_streams_order_by_last_event_descending() {
        let service = MemoryLogService::new();
        service.put_stream("app", "idle", None);
        service.put_stream("app", "old", Some(10));
        service.put_stream("app", "new", Some(20));

        let request = StreamsRequest {
            order_by: StreamOrder::LastEventTime,
            descending: true,
            ..StreamsRequest::new("app")
        };
        let page = service.describe_log_streams(&request, None).await.unwrap();
        let names: Vec<_> = page.items.iter().map(|s| s.name.as_str()).collect();

        assert_eq!(names, vec!["new", "old", "idle"]);
    }

    #[tokio::test]
    async fn test_unknown_group_is_error() {
        let service = MemoryLogService::new();
        let result = service
            .filter_log_events(&QueryWindow::new("missing", 0), None)
            .await;

        assert!(result.is_err());
    }
}
