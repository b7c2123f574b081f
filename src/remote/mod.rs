pub mod cloudwatch;
pub mod memory;
pub mod paginate;
pub mod service;

pub use cloudwatch::CloudWatchLogs;
pub use memory::MemoryLogService;
pub use paginate::{Operation, PagedClient, RemoteError};
pub use service::{
    InsightsQuery, LogEvent, LogGroup, LogService, LogStream, QueryResults, QueryStatus,
    ServiceError, StreamOrder, StreamsRequest,
};
