use super::colorjson::{ColorJson, Palette};
use crate::config::types::OutputConfig;
use crate::remote::LogEvent;
use chrono::{DateTime, SecondsFormat, Utc};
use console::Style;
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Message body only
    Raw,
    /// Timestamp and stream prefix, JSON bodies colorized
    Pretty,
}

/// Turns one event into one display line
#[derive(Debug, Clone)]
pub struct Formatter {
    mode: OutputMode,
    json: ColorJson,
    timestamp_style: Style,
    stream_style: Style,
}

impl Formatter {
    pub fn new(mode: OutputMode, config: &OutputConfig) -> Self {
        let mut timestamp_style = Style::new().red();
        let mut stream_style = Style::new().white();
        if config.no_color {
            timestamp_style = timestamp_style.force_styling(false);
            stream_style = stream_style.force_styling(false);
        }

        Self {
            mode,
            json: ColorJson {
                palette: Palette::new(config.invert, config.no_color),
                indent: if config.expand { 4 } else { 0 },
                raw_strings: config.raw_string,
            },
            timestamp_style,
            stream_style,
        }
    }

    pub fn format(&self, event: &LogEvent) -> String {
        let line = match self.mode {
            OutputMode::Raw => event.message.clone(),
            OutputMode::Pretty => self.pretty(event),
        };
        line.trim_end_matches('\n').to_string()
    }

    fn pretty(&self, event: &LogEvent) -> String {
        let date = DateTime::<Utc>::from_timestamp_millis(event.timestamp)
            .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Secs, true))
            .unwrap_or_else(|| event.timestamp.to_string());

        let body = match serde_json::from_str::<Value>(&event.message) {
            Ok(value @ Value::Object(_)) => self.json.render(&value),
            _ => event.message.clone(),
        };

        format!(
            "[{}] ({}) {}",
            self.timestamp_style.apply_to(date),
            self.stream_style.apply_to(&event.stream_name),
            body
        )
    }
}
