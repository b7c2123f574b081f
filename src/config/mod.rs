pub mod parse;
pub mod types;

use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

pub use parse::{load_config, parse_config, ConfigError};
pub use types::{AwsConfig, Config, OutputConfig, QueryConfig, TailConfig};

fn env_var_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\$env\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("env var pattern is a valid regex")
    })
}

/// Expands environment variables in a string.
/// Supports $env{VAR_NAME} syntax.
/// If an environment variable is not set, it's left unchanged.
pub fn expand_env_vars(text: &str) -> String {
    env_var_pattern()
        .replace_all(text, |caps: &regex::Captures| {
            std::env::var(&caps[1]).unwrap_or_else(|_| caps[0].to_string())
        })
        .to_string()
}

/// Expands a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
    let path_str = path.to_string_lossy();

    if let Some(rest) = path_str.strip_prefix("~/") {
        if let Some(home_dir) = dirs::home_dir() {
            return home_dir.join(rest);
        }
    } else if path_str == "~" {
        if let Some(home_dir) = dirs::home_dir() {
            return home_dir;
        }
    }

    path.to_path_buf()
}

/// Resolves the config file path based on explicit argument or default locations.
/// Returns the first existing path from:
/// 1. Explicit path (if provided, with tilde expansion)
/// 2. ~/.config/saw/config.yml
/// 3. /etc/saw/config.yml
pub fn resolve_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(expand_tilde(path));
    }

    if let Some(home_dir) = dirs::home_dir() {
        let user_config = home_dir.join(".config/saw/config.yml");
        if user_config.exists() {
            return Some(user_config);
        }
    }

    let system_config = PathBuf::from("/etc/saw/config.yml");
    if system_config.exists() {
        return Some(system_config);
    }

    None
}

/// Load the config from the resolved location, or defaults when no file
/// exists. An explicit path that cannot be read is an error.
pub fn load(explicit: Option<&Path>) -> Result<Config, ConfigError> {
    match resolve_config_path(explicit) {
        Some(path) => {
            tracing::debug!(path = %path.display(), "Loading configuration");
            load_config(&path)
        }
        None => Ok(Config::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_expand_env_vars_single() {
        std::env::set_var("SAW_TEST_REGION", "us-west-2");
        let result = expand_env_vars("region: $env{SAW_TEST_REGION}");
        assert_eq!(result, "region: us-west-2");
        std::env::remove_var("SAW_TEST_REGION");
    }

    #[test]
    fn test_expand_env_vars_unset() {
        let result = expand_env_vars("profile: $env{SAW_NONEXISTENT_VAR}");
        // Unset variables are left unchanged
        assert_eq!(result, "profile: $env{SAW_NONEXISTENT_VAR}");
    }

    #[test]
    fn test_expand_tilde_with_path() {
        let expanded = expand_tilde(Path::new("~/saw/config.yml"));

        if let Some(home) = dirs::home_dir() {
            assert_eq!(expanded, home.join("saw/config.yml"));
        }
    }

    #[test]
    fn test_expand_tilde_no_expansion() {
        let expanded = expand_tilde(Path::new("/absolute/path"));
        assert_eq!(expanded, Path::new("/absolute/path"));
    }

    #[test]
    fn test_load_explicit_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "aws:\n  profile: staging").unwrap();

        let config = load(Some(file.path())).unwrap();
        assert_eq!(config.aws.profile.as_deref(), Some("staging"));
    }

    #[test]
    fn test_load_missing_explicit_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.yml");

        assert!(matches!(load(Some(&missing)), Err(ConfigError::Io(_))));
    }
}
