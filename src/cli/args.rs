use crate::config::OutputConfig;
use crate::remote::StreamOrder;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

const TIME_HELP: &str = "Takes an absolute timestamp in RFC3339 format, a simple date \
(2006-01-02 or \"2006-01-02 15:04:05\"), or a relative time (eg. -2h). \
Valid time units are \"ns\", \"us\" (or \"µs\"), \"ms\", \"s\", \"m\", \"h\".";

#[derive(Debug, Parser)]
#[command(name = "saw", version)]
#[command(about = "A fast, multipurpose tool for AWS CloudWatch Logs")]
#[command(
    long_about = "Saw is a fast, multipurpose tool for cutting through AWS CloudWatch Logs.",
    after_help = "Examples:\n  saw groups --prefix /aws\n  saw streams production --prefix api\n  saw watch production --prefix api --filter ERROR"
)]
pub struct Cli {
    /// Config file (default: ~/.config/saw/config.yml, then /etc/saw/config.yml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// AWS region, overrides config and environment
    #[arg(long, global = true)]
    pub region: Option<String>,

    /// AWS shared config profile, overrides config and environment
    #[arg(long, global = true)]
    pub profile: Option<String>,

    /// Log debug diagnostics to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// List log groups
    Groups(GroupsArgs),
    /// List streams in log group
    Streams(StreamsArgs),
    /// Get log events
    Get(GetArgs),
    /// Continuously stream log events
    Watch(WatchArgs),
    /// Query CloudWatch Logs Insights
    Query(QueryArgs),
    /// Prints the version string
    Version,
}

/// How the positional log group argument is interpreted
#[derive(Debug, Clone, Args)]
pub struct GroupTarget {
    /// Log group name
    pub group: String,

    /// Treat the group as a substring that must match exactly one group
    #[arg(long, conflicts_with = "regex")]
    pub fuzzy: bool,

    /// Treat the group as a regex and run against every matching group
    #[arg(long)]
    pub regex: bool,
}

#[derive(Debug, Clone, Default, Args)]
pub struct StreamScope {
    /// Log stream name prefix filter
    #[arg(long, conflicts_with = "streams")]
    pub prefix: Option<String>,

    /// Explicit comma-separated log stream names
    #[arg(long, value_delimiter = ',')]
    pub streams: Vec<String>,
}

#[derive(Debug, Clone, Default, Args)]
pub struct OutputArgs {
    /// Indent JSON log messages
    #[arg(long)]
    pub expand: bool,

    /// Print JSON strings without escaping
    #[arg(long = "raw-string", alias = "rawString")]
    pub raw_string: bool,

    /// Invert colors for light terminal themes
    #[arg(long)]
    pub invert: bool,

    /// Disable color output
    #[arg(long)]
    pub no_color: bool,
}

impl OutputArgs {
    /// Flags switch options on; they never switch off a config value
    pub fn merge(&self, base: OutputConfig) -> OutputConfig {
        OutputConfig {
            expand: base.expand || self.expand,
            invert: base.invert || self.invert,
            raw_string: base.raw_string || self.raw_string,
            no_color: base.no_color || self.no_color,
        }
    }
}

#[derive(Debug, Clone, Args)]
pub struct GroupsArgs {
    /// Log group name prefix filter
    #[arg(long)]
    pub prefix: Option<String>,

    /// Only list groups containing this substring
    #[arg(long)]
    pub fuzzy: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OrderByArg {
    #[default]
    #[value(name = "LogStreamName", alias = "log-stream-name")]
    LogStreamName,
    #[value(name = "LastEventTime", alias = "last-event-time")]
    LastEventTime,
}

impl From<OrderByArg> for StreamOrder {
    fn from(arg: OrderByArg) -> Self {
        match arg {
            OrderByArg::LogStreamName => StreamOrder::LogStreamName,
            OrderByArg::LastEventTime => StreamOrder::LastEventTime,
        }
    }
}

#[derive(Debug, Clone, Args)]
pub struct StreamsArgs {
    #[command(flatten)]
    pub target: GroupTarget,

    /// Stream prefix filter
    #[arg(long)]
    pub prefix: Option<String>,

    /// Order streams by LogStreamName or LastEventTime
    #[arg(long = "order-by", alias = "orderBy", value_enum, default_value_t = OrderByArg::LogStreamName)]
    pub order_by: OrderByArg,

    /// Order streams descending
    #[arg(long)]
    pub descending: bool,
}

#[derive(Debug, Clone, Args)]
pub struct GetArgs {
    #[command(flatten)]
    pub target: GroupTarget,

    #[command(flatten)]
    pub scope: StreamScope,

    /// Start getting the logs from this point (default from config, -10m)
    #[arg(long, allow_hyphen_values = true, long_help = format!("Start getting the logs from this point.\n{}", TIME_HELP))]
    pub start: Option<String>,

    /// Stop getting the logs at this point
    #[arg(long, default_value = "now", allow_hyphen_values = true, long_help = format!("Stop getting the logs at this point.\n{}", TIME_HELP))]
    pub stop: String,

    /// Event filter pattern
    #[arg(long)]
    pub filter: Option<String>,

    /// Print timestamp, stream name and colorized JSON instead of the raw message
    #[arg(long)]
    pub pretty: bool,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Debug, Clone, Args)]
pub struct WatchArgs {
    #[command(flatten)]
    pub target: GroupTarget,

    #[command(flatten)]
    pub scope: StreamScope,

    /// Start watching from this point (default from config, -10m)
    #[arg(long, allow_hyphen_values = true, long_help = format!("Start watching from this point.\n{}", TIME_HELP))]
    pub start: Option<String>,

    /// Event filter pattern
    #[arg(long)]
    pub filter: Option<String>,

    /// Print raw log event without timestamp or stream prefix
    #[arg(long)]
    pub raw: bool,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Debug, Clone, Args)]
pub struct QueryArgs {
    /// CloudWatch Log Groups to query against
    #[arg(long = "groups", required = true, value_delimiter = ',')]
    pub groups: Vec<String>,

    /// CloudWatch Logs Insights query to run
    #[arg(long)]
    pub query: String,

    /// Start of the queried range (default from config, -10m)
    #[arg(long, allow_hyphen_values = true, long_help = format!("Start of the queried range.\n{}", TIME_HELP))]
    pub start: Option<String>,

    /// End of the queried range
    #[arg(long, default_value = "now", allow_hyphen_values = true, long_help = format!("End of the queried range.\n{}", TIME_HELP))]
    pub stop: String,

    /// Do not print field headers
    #[arg(long)]
    pub no_headers: bool,
}
