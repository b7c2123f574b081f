use super::watermark::{Observation, Watermark};
use crate::output::{Formatter, LineSender};
use crate::remote::{PagedClient, RemoteError};
use crate::window::QueryWindow;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Error)]
pub enum TailError {
    #[error(transparent)]
    Fetch(#[from] RemoteError),

    #[error("output channel closed")]
    OutputClosed,
}

/// Counts from one poll of the window
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PollStats {
    pub fetched: usize,
    pub emitted: usize,
    pub duplicates: usize,
    pub stale: usize,
}

/// Incremental tail over the event filter API.
///
/// The filter API only takes a millisecond start/end, so each poll re-queries
/// from the watermark instant inclusively and drops events already shown at
/// that instant. Each engine owns its window and watermark; concurrent
/// engines share nothing but the client and the output channel.
#[derive(Debug)]
pub struct TailEngine {
    client: PagedClient,
    window: QueryWindow,
    watermark: Watermark,
    formatter: Arc<Formatter>,
    output: LineSender,
    poll_interval: Duration,
}

impl TailEngine {
    pub fn new(
        client: PagedClient,
        window: QueryWindow,
        formatter: Arc<Formatter>,
        output: LineSender,
    ) -> Self {
        Self {
            client,
            window,
            watermark: Watermark::new(),
            formatter,
            output,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn window(&self) -> &QueryWindow {
        &self.window
    }

    pub fn watermark(&self) -> &Watermark {
        &self.watermark
    }

    /// Fetch the current window once, emit unseen events in arrival order and
    /// move the window start up to the watermark.
    pub async fn poll_once(&mut self) -> Result<PollStats, TailError> {
        let events = self.client.filter_events(&self.window).await?;
        let mut stats = PollStats {
            fetched: events.len(),
            ..PollStats::default()
        };

        for event in &events {
            match self.watermark.observe(event.timestamp, &event.event_id) {
                Observation::New => {
                    let line = self.formatter.format(event);
                    self.output
                        .send(line)
                        .await
                        .map_err(|_| TailError::OutputClosed)?;
                    self.watermark.record(event.timestamp, &event.event_id);
                    stats.emitted += 1;
                }
                Observation::Duplicate => stats.duplicates += 1,
                Observation::Stale => {
                    debug!(
                        group = %self.window.group,
                        event_id = %event.event_id,
                        timestamp = event.timestamp,
                        watermark = ?self.watermark.last_seen(),
                        "Dropping event older than watermark"
                    );
                    stats.stale += 1;
                }
            }
        }

        if let Some(last_seen) = self.watermark.last_seen() {
            self.window.start = last_seen;
        }

        trace!(
            group = %self.window.group,
            fetched = stats.fetched,
            emitted = stats.emitted,
            duplicates = stats.duplicates,
            start = self.window.start,
            "Polled window"
        );

        Ok(stats)
    }

    /// Poll until cancelled or a fetch fails.
    ///
    /// Cancellation abandons the current poll between lines: events already
    /// sent stay sent and the rest of that poll is never emitted.
    pub async fn run(mut self, cancel: CancellationToken) -> Result<(), TailError> {
        info!(group = %self.window.group, start = self.window.start, "Starting tail");

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                result = self.poll_once() => {
                    result?;
                }
            }

            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(self.poll_interval) => {}
            }
        }

        info!(group = %self.window.group, "Tail cancelled");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::types::OutputConfig;
    use crate::output::{create_channel, OutputMode};
    use crate::remote::MemoryLogService;

    fn engine(service: &MemoryLogService, start: i64) -> (TailEngine, crate::output::LineReceiver) {
        let (tx, rx) = create_channel();
        let formatter = Arc::new(Formatter::new(OutputMode::Raw, &OutputConfig::default()));
        let client = PagedClient::new(Arc::new(service.clone()));
        let engine = TailEngine::new(client, QueryWindow::new("app", start), formatter, tx)
            .with_poll_interval(Duration::from_millis(5));
        (engine, rx)
    }

    fn drain(rx: &mut crate::output::LineReceiver) -> Vec<String> {
        let mut lines = Vec::new();
        while let Ok(line) = rx.try_recv() {
            lines.push(line);
        }
        lines
    }

    #[tokio::test]
    async fn test_window_start_follows_watermark() {
        let service = MemoryLogService::new();
        service.put_event("app", "web-1", "a", 1000, "first");
        service.put_event("app", "web-1", "b", 1500, "second");

        let (mut engine, mut rx) = engine(&service, 0);
        let stats = engine.poll_once().await.unwrap();

        assert_eq!(stats.emitted, 2);
        assert_eq!(engine.window().start, 1500);
        assert_eq!(drain(&mut rx), vec!["first", "second"]);
    }

    #[tokio::test]
    async fn test_same_millisecond_arrivals_are_not_missed() {
        let service = MemoryLogService::new();
        service.put_event("app", "web-1", "a", 1000, "a");

        let (mut engine, mut rx) = engine(&service, 0);
        engine.poll_once().await.unwrap();

        // Arrives after the first fetch of its millisecond
        service.put_event("app", "web-2", "b", 1000, "b");
        let stats = engine.poll_once().await.unwrap();

        assert_eq!(stats.fetched, 2);
        assert_eq!(stats.duplicates, 1);
        assert_eq!(drain(&mut rx), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_empty_poll_is_not_an_error() {
        let service = MemoryLogService::new();
        service.put_group("app");

        let (mut engine, _rx) = engine(&service, 500);
        let stats = engine.poll_once().await.unwrap();

        assert_eq!(stats, PollStats::default());
        assert_eq!(engine.window().start, 500);
        assert!(engine.watermark().last_seen().is_none());
    }

    #[tokio::test]
    async fn test_fetch_error_stops_run() {
        let service = MemoryLogService::new();
        service.put_group("app");
        service.fail_group("app", "AccessDeniedException");

        let (engine, _rx) = engine(&service, 0);
        let err = engine.run(CancellationToken::new()).await.unwrap_err();

        assert!(matches!(err, TailError::Fetch(_)));
        assert!(err.to_string().contains("AccessDeniedException"));
    }

    #[tokio::test]
    async fn test_run_returns_ok_when_cancelled() {
        let service = MemoryLogService::new();
        service.put_event("app", "web-1", "a", 1000, "a");

        let (engine, mut rx) = engine(&service, 0);
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(engine.run(cancel.clone()));

        let first = rx.recv().await.unwrap();
        assert_eq!(first, "a");

        cancel.cancel();
        handle.await.unwrap().unwrap();
        // Re-polls of the same instant never re-emit
        assert!(drain(&mut rx).is_empty());
    }

    #[tokio::test]
    async fn test_closed_output_is_error() {
        let service = MemoryLogService::new();
        service.put_event("app", "web-1", "a", 1000, "a");

        let (mut engine, rx) = engine(&service, 0);
        drop(rx);

        assert!(matches!(engine.poll_once().await, Err(TailError::OutputClosed)));
    }
}
