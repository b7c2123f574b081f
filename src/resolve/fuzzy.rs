use super::ResolveError;
use crate::remote::LogGroup;

/// Resolve a substring query to exactly one group name.
///
/// Matching is a literal, case-sensitive substring test. The group list must
/// be fetched fresh by the caller right before resolving.
pub fn resolve_fuzzy(pattern: &str, groups: &[LogGroup]) -> Result<String, ResolveError> {
    if groups.is_empty() {
        return Err(ResolveError::NoGroups);
    }

    let mut matches: Vec<&str> = groups
        .iter()
        .map(|g| g.name.as_str())
        .filter(|name| name.contains(pattern))
        .collect();

    match matches.len() {
        0 => Err(ResolveError::NoMatches {
            pattern: pattern.to_string(),
            available: groups.iter().map(|g| g.name.clone()).collect(),
        }),
        1 => Ok(matches.remove(0).to_string()),
        _ => Err(ResolveError::TooManyMatches {
            pattern: pattern.to_string(),
            matches: matches.into_iter().map(str::to_string).collect(),
        }),
    }
}
