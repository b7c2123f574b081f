pub mod query;
pub mod time;

pub use query::{QueryWindow, TimeRange};
pub use time::{parse_time, TimeParseError};
