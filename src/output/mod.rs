pub mod colorjson;
pub mod format;
pub mod sink;
pub mod table;

pub use format::{Formatter, OutputMode};
pub use sink::{create_channel, spawn_printer, LineReceiver, LineSender};
