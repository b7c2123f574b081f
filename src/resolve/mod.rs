pub mod fuzzy;
pub mod multi;
pub mod streams;

use thiserror::Error;

pub use fuzzy::resolve_fuzzy;
pub use multi::{compile_pattern, expand_pattern};
pub use streams::{select_streams, StreamSelection, MAX_FILTER_STREAMS};

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("no log groups found")]
    NoGroups,

    #[error("no results for log group fuzzy search '{pattern}' in {} groups\n{}", .available.len(), .available.join("\n"))]
    NoMatches {
        pattern: String,
        available: Vec<String>,
    },

    #[error("too many results for log group fuzzy search '{pattern}'\n{}", .matches.join("\n"))]
    TooManyMatches {
        pattern: String,
        matches: Vec<String>,
    },

    #[error("invalid log group pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    #[error("no log groups match pattern '{pattern}'")]
    NoPatternMatches { pattern: String },
}
