use super::service::{
    InsightsQuery, LogEvent, LogGroup, LogService, LogStream, Page, QueryResults, QueryStatus,
    ServiceError, StreamsRequest,
};
use crate::window::QueryWindow;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_QUERY_POLL_INTERVAL: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    ListGroups,
    ListStreams,
    FilterEvents,
    StartQuery,
    QueryResults,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::ListGroups => "describe log groups",
            Operation::ListStreams => "describe log streams",
            Operation::FilterEvents => "filter log events",
            Operation::StartQuery => "start query",
            Operation::QueryResults => "get query results",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
#[error("failed to {operation}: {source}")]
pub struct RemoteError {
    pub operation: Operation,
    #[source]
    pub source: ServiceError,
}

impl RemoteError {
    fn new(operation: Operation, source: ServiceError) -> Self {
        Self { operation, source }
    }
}

pub type Result<T> = std::result::Result<T, RemoteError>;

/// Drives cursor pagination over a [`LogService`].
///
/// Every listing returns the in-order concatenation of all pages, or the
/// first page error. Partial results are never returned.
#[derive(Clone)]
pub struct PagedClient {
    service: Arc<dyn LogService>,
    query_poll_interval: Duration,
}

impl fmt::Debug for PagedClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PagedClient")
            .field("query_poll_interval", &self.query_poll_interval)
            .finish_non_exhaustive()
    }
}

impl PagedClient {
    pub fn new(service: Arc<dyn LogService>) -> Self {
        Self {
            service,
            query_poll_interval: DEFAULT_QUERY_POLL_INTERVAL,
        }
    }

    pub fn with_query_poll_interval(mut self, interval: Duration) -> Self {
        self.query_poll_interval = interval;
        self
    }

    pub async fn list_groups(&self, prefix: Option<&str>) -> Result<Vec<LogGroup>> {
        collect_pages(Operation::ListGroups, |token| {
            self.service.describe_log_groups(prefix, token)
        })
        .await
    }

    pub async fn list_streams(&self, request: &StreamsRequest) -> Result<Vec<LogStream>> {
        collect_pages(Operation::ListStreams, |token| {
            self.service.describe_log_streams(request, token)
        })
        .await
    }

    pub async fn filter_events(&self, window: &QueryWindow) -> Result<Vec<LogEvent>> {
        collect_pages(Operation::FilterEvents, |token| {
            self.service.filter_log_events(window, token)
        })
        .await
    }

    /// Submit a query and poll on a fixed interval until it completes.
    ///
    /// There is no backoff and no overall timeout. A terminal failure status
    /// (failed, cancelled, timed out) ends polling with an error.
    pub async fn run_query(&self, query: &InsightsQuery) -> Result<QueryResults> {
        let query_id = self
            .service
            .start_query(query)
            .await
            .map_err(|e| RemoteError::new(Operation::StartQuery, e))?;

        tracing::debug!(query_id = %query_id, "Submitted query");

        loop {
            tokio::time::sleep(self.query_poll_interval).await;

            let results = self
                .service
                .get_query_results(&query_id)
                .await
                .map_err(|e| RemoteError::new(Operation::QueryResults, e))?;

            match results.status {
                QueryStatus::Complete => return Ok(results),
                status if status.is_failure() => {
                    return Err(RemoteError::new(
                        Operation::QueryResults,
                        ServiceError::Other(format!("query {} ended with status {}", query_id, status)),
                    ));
                }
                status => {
                    tracing::trace!(query_id = %query_id, status = %status, "Query not complete yet");
                }
            }
        }
    }
}

/// Keep requesting pages until the service stops returning a cursor.
///
/// A cursor equal to the one just sent also ends the walk; some list APIs
/// echo their final token instead of omitting it.
async fn collect_pages<T, F, Fut>(operation: Operation, mut fetch: F) -> Result<Vec<T>>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = std::result::Result<Page<T>, ServiceError>>,
{
    let mut items = Vec::new();
    let mut token: Option<String> = None;
    let mut pages = 0usize;

    loop {
        let page = fetch(token.clone())
            .await
            .map_err(|e| RemoteError::new(operation, e))?;
        pages += 1;
        items.extend(page.items);

        match page.next_token {
            Some(next) if token.as_deref() != Some(next.as_str()) => token = Some(next),
            _ => break,
        }
    }

    tracing::trace!(operation = %operation, pages = pages, items = items.len(), "Collected pages");

    Ok(items)
}
