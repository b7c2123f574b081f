use std::collections::HashSet;

/// How an event relates to what a tail loop has already displayed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Observation {
    /// Not shown yet
    New,
    /// Same instant as the watermark and already shown
    Duplicate,
    /// Older than the watermark. The filter API should never produce these
    /// after the window moved, so they are dropped rather than shown late.
    Stale,
}

/// Latest instant processed by one tail loop plus the ids shown at exactly
/// that instant.
///
/// `seen_ids` only ever holds ids whose timestamp equals `last_seen`, so its
/// size is bounded by the number of events in a single millisecond.
#[derive(Debug, Default, Clone)]
pub struct Watermark {
    last_seen: Option<i64>,
    seen_ids: HashSet<String>,
}

impl Watermark {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_seen(&self) -> Option<i64> {
        self.last_seen
    }

    pub fn seen_count(&self) -> usize {
        self.seen_ids.len()
    }

    /// Classify an event, advancing the watermark when it is strictly newer.
    ///
    /// Advancing clears the seen set. The id is not recorded here; call
    /// [`Watermark::record`] once the event has actually been emitted.
    pub fn observe(&mut self, timestamp: i64, event_id: &str) -> Observation {
        match self.last_seen {
            Some(last) if timestamp < last => Observation::Stale,
            Some(last) if timestamp == last => {
                if self.seen_ids.contains(event_id) {
                    Observation::Duplicate
                } else {
                    Observation::New
                }
            }
            _ => {
                self.last_seen = Some(timestamp);
                self.seen_ids.clear();
                Observation::New
            }
        }
    }

    /// Remember an emitted event. Ids from instants other than the current
    /// watermark are ignored to keep the set bounded.
    pub fn record(&mut self, timestamp: i64, event_id: &str) {
        if self.last_seen == Some(timestamp) {
            self.seen_ids.insert(event_id.to_string());
        }
    }
}
