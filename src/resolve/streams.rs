use crate::remote::LogStream;

/// FilterLogEvents accepts at most this many stream names per request
pub const MAX_FILTER_STREAMS: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamSelection {
    /// Most recently active first
    pub names: Vec<String>,
    /// Candidates left out because of the cap
    pub dropped: usize,
}

/// Pick the `max` most recently active streams.
///
/// Streams beyond the cap are not queried at all. The count of dropped
/// streams is returned so callers can tell the user their scope shrank.
/// Streams that never received an event sort after every active one.
pub fn select_streams(streams: &[LogStream], max: usize) -> StreamSelection {
    let mut ranked: Vec<&LogStream> = streams.iter().collect();
    // None < Some(_), so reversing the comparison puts never-written streams last
    ranked.sort_by(|a, b| b.last_event_timestamp.cmp(&a.last_event_timestamp));

    let dropped = ranked.len().saturating_sub(max);
    let names = ranked
        .into_iter()
        .take(max)
        .map(|s| s.name.clone())
        .collect();

    StreamSelection { names, dropped }
}
