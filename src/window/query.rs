use super::time::{parse_time, TimeParseError};
use chrono::{DateTime, Utc};

/// One `[start, end)` request against the event filter API.
///
/// The tail engine only ever moves `start`; every other field is fixed for
/// the lifetime of a loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryWindow {
    pub group: String,
    /// Inclusive start, epoch milliseconds
    pub start: i64,
    /// Exclusive end, epoch milliseconds. None means open-ended.
    pub end: Option<i64>,
    pub stream_names: Option<Vec<String>>,
    pub filter_pattern: Option<String>,
}

impl QueryWindow {
    pub fn new(group: impl Into<String>, start: i64) -> Self {
        Self {
            group: group.into(),
            start,
            end: None,
            stream_names: None,
            filter_pattern: None,
        }
    }

    pub fn with_end(mut self, end: Option<i64>) -> Self {
        self.end = end;
        self
    }

    pub fn with_streams(mut self, stream_names: Option<Vec<String>>) -> Self {
        self.stream_names = stream_names;
        self
    }

    pub fn with_filter(mut self, filter_pattern: Option<String>) -> Self {
        self.filter_pattern = filter_pattern.filter(|f| !f.is_empty());
        self
    }

    /// Whether an event timestamp falls inside this window
    pub fn contains(&self, timestamp: i64) -> bool {
        timestamp >= self.start && self.end.map_or(true, |end| timestamp < end)
    }
}

/// Start and optional stop expressions resolved against one reference
/// instant, so relative values share the same "now".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    pub start: DateTime<Utc>,
    pub end: Option<DateTime<Utc>>,
}

impl TimeRange {
    pub fn resolve(
        start: &str,
        stop: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Self, TimeParseError> {
        let start = parse_time(start, now)?;
        let end = stop.map(|s| parse_time(s, now)).transpose()?;
        Ok(Self { start, end })
    }

    pub fn start_millis(&self) -> i64 {
        self.start.timestamp_millis()
    }

    pub fn end_millis(&self) -> Option<i64> {
        self.end.map(|e| e.timestamp_millis())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_window_contains_is_half_open() {
        let window = QueryWindow::new("app", 1000).with_end(Some(2000));
        assert!(window.contains(1000));
        assert!(window.contains(1999));
        assert!(!window.contains(2000));
        assert!(!window.contains(999));

        let open = QueryWindow::new("app", 1000);
        assert!(open.contains(i64::MAX));
    }

    #[test]
    fn test_empty_filter_is_dropped() {
        let window = QueryWindow::new("app", 0).with_filter(Some(String::new()));
        assert!(window.filter_pattern.is_none());

        let window = QueryWindow::new("app", 0).with_filter(Some("ERROR".to_string()));
        assert_eq!(window.filter_pattern.as_deref(), Some("ERROR"));
    }

    #[test]
    fn test_time_range_shares_reference() {
        let now = Utc.with_ymd_and_hms(2018, 12, 1, 15, 30, 0).unwrap();
        let range = TimeRange::resolve("-1m", Some("now"), now).unwrap();

        assert_eq!(range.end_millis(), Some(now.timestamp_millis()));
        assert_eq!(range.start_millis(), now.timestamp_millis() - 60_000);
    }

    #[test]
    fn test_time_range_rejects_bad_stop() {
        let now = Utc::now();
        let err = TimeRange::resolve("-1m", Some("yesterday"), now).unwrap_err();
        assert_eq!(err.input, "yesterday");
    }
}
