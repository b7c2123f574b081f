pub mod engine;
pub mod watermark;

pub use engine::{PollStats, TailEngine, TailError, DEFAULT_POLL_INTERVAL};
pub use watermark::{Observation, Watermark};
