use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub aws: AwsConfig,
    pub tail: TailConfig,
    pub query: QueryConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AwsConfig {
    pub region: Option<String>,
    pub profile: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TailConfig {
    /// Delay between polls of a watched window
    #[serde(with = "humantime_serde")]
    pub poll_interval: Duration,
    /// Start expression used when `--start` is not given
    pub default_start: String,
}

impl Default for TailConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(1),
            default_start: "-10m".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    /// Delay between completion checks of a submitted Insights query
    #[serde(with = "humantime_serde")]
    pub poll_interval: Duration,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(2),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Indent JSON messages
    pub expand: bool,
    /// Dark JSON keys for light terminal themes
    pub invert: bool,
    /// Print JSON strings without escaping
    pub raw_string: bool,
    pub no_color: bool,
}
