use super::ResolveError;
use crate::remote::LogGroup;
use regex::Regex;

/// Compile a multi-group pattern. Done before any group is listed so a bad
/// pattern never touches the service.
pub fn compile_pattern(pattern: &str) -> Result<Regex, ResolveError> {
    Ok(Regex::new(pattern)?)
}

/// Every group whose name contains a match for `pattern`, in listing order.
///
/// The search is unanchored; use `^` and `$` to match whole names.
pub fn expand_pattern(pattern: &Regex, groups: &[LogGroup]) -> Result<Vec<String>, ResolveError> {
    let matched: Vec<String> = groups
        .iter()
        .filter(|g| pattern.is_match(&g.name))
        .map(|g| g.name.clone())
        .collect();

    if matched.is_empty() {
        return Err(ResolveError::NoPatternMatches {
            pattern: pattern.as_str().to_string(),
        });
    }

    Ok(matched)
}
