use super::expand_env_vars;
use super::types::*;
use crate::window::parse_time;
use chrono::Utc;
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("validation failed:\n{}", .0.join("\n"))]
    ValidationList(Vec<String>),
}

pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let yaml_string = fs::read_to_string(path).map_err(|e| {
        ConfigError::Io(std::io::Error::new(
            e.kind(),
            format!("failed to read config file '{}': {}", path.display(), e),
        ))
    })?;

    parse_config(&yaml_string)
}

/// Parse and validate config text. An empty document yields the defaults.
pub fn parse_config(yaml_string: &str) -> Result<Config, ConfigError> {
    let yaml_string = expand_env_vars(yaml_string);

    let config: Config = if yaml_string.trim().is_empty() {
        Config::default()
    } else {
        serde_yaml::from_str(&yaml_string)?
    };

    validate_config(&config)?;

    Ok(config)
}

fn validate_config(config: &Config) -> Result<(), ConfigError> {
    let mut errors = Vec::new();

    if config.tail.poll_interval.is_zero() {
        errors.push("tail.poll_interval must be greater than zero".to_string());
    }

    if config.query.poll_interval.is_zero() {
        errors.push("query.poll_interval must be greater than zero".to_string());
    }

    if let Err(e) = parse_time(&config.tail.default_start, Utc::now()) {
        errors.push(format!("tail.default_start: {}", e));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationList(errors))
    }
}
