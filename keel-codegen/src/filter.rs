//! Table inclusion and exclusion policy.

use std::fmt;

use regex_lite::Regex;

use crate::error::{CodegenError, CodegenResult};

/// A table name pattern: a literal name, or a regular expression when the
/// source string is wrapped in slashes (`/^auth_/`).
///
/// Regular expressions are matched from the start of the table name.
#[derive(Clone)]
pub enum TablePattern {
    /// Exact table name.
    Exact(String),
    /// Regular expression anchored at the start of the name.
    Regex(Regex),
}

impl TablePattern {
    /// Parse a pattern string.
    pub fn parse(pattern: &str) -> CodegenResult<Self> {
        let trimmed = pattern.trim();
        match trimmed
            .strip_prefix('/')
            .and_then(|rest| rest.strip_suffix('/'))
        {
            Some(source) if trimmed.len() >= 2 => {
                let regex = Regex::new(source).map_err(|e| CodegenError::InvalidPattern {
                    pattern: pattern.to_string(),
                    message: e.to_string(),
                })?;
                Ok(Self::Regex(regex))
            }
            _ => Ok(Self::Exact(trimmed.to_string())),
        }
    }

    /// Check whether a table name matches.
    pub fn matches(&self, table: &str) -> bool {
        match self {
            Self::Exact(name) => name == table,
            Self::Regex(regex) => regex.find(table).is_some_and(|m| m.start() == 0),
        }
    }
}

impl fmt::Debug for TablePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(name) => write!(f, "Exact({:?})", name),
            Self::Regex(regex) => write!(f, "Regex(/{}/)", regex.as_str()),
        }
    }
}

/// Include/exclude policy applied to table names.
///
/// A non-empty include list acts as a whitelist. The exclude list is applied
/// afterwards and always wins.
#[derive(Debug, Clone, Default)]
pub struct TableFilter {
    include: Vec<TablePattern>,
    exclude: Vec<TablePattern>,
}

impl TableFilter {
    /// A filter that keeps every table.
    pub fn allow_all() -> Self {
        Self::default()
    }

    /// Build a filter from pattern strings.
    pub fn new<I, E, S, T>(include: I, exclude: E) -> CodegenResult<Self>
    where
        I: IntoIterator<Item = S>,
        E: IntoIterator<Item = T>,
        S: AsRef<str>,
        T: AsRef<str>,
    {
        Ok(Self {
            include: parse_all(include)?,
            exclude: parse_all(exclude)?,
        })
    }

    /// Whether a table is filtered out.
    pub fn is_skipped(&self, table: &str) -> bool {
        if !self.include.is_empty() && !self.include.iter().any(|p| p.matches(table)) {
            return true;
        }
        self.exclude.iter().any(|p| p.matches(table))
    }
}

fn parse_all<I, S>(patterns: I) -> CodegenResult<Vec<TablePattern>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    patterns
        .into_iter()
        .filter(|p| !p.as_ref().trim().is_empty())
        .map(|p| TablePattern::parse(p.as_ref()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pattern_parse() {
        assert!(matches!(TablePattern::parse("users").unwrap(), TablePattern::Exact(_)));
        assert!(matches!(TablePattern::parse("/^auth_/").unwrap(), TablePattern::Regex(_)));
        assert!(matches!(TablePattern::parse("/").unwrap(), TablePattern::Exact(_)));
        assert!(TablePattern::parse("/(/").is_err());
    }

    #[test]
    fn test_regex_matches_from_start() {
        let pattern = TablePattern::parse("/auth_/").unwrap();
        assert!(pattern.matches("auth_users"));
        assert!(!pattern.matches("legacy_auth_users"));
    }

    #[test]
    fn test_empty_filter_keeps_everything() {
        let filter = TableFilter::allow_all();
        assert!(!filter.is_skipped("anything"));
    }

    #[test]
    fn test_include_is_whitelist() {
        let filter = TableFilter::new(["users", "/post/"], Vec::<String>::new()).unwrap();
        assert!(!filter.is_skipped("users"));
        assert!(!filter.is_skipped("posts"));
        assert!(filter.is_skipped("comments"));
    }

    #[test]
    fn test_exclude_wins() {
        let filter = TableFilter::new(["/.*/"], ["users", "/^tmp_/"]).unwrap();
        assert!(filter.is_skipped("users"));
        assert!(filter.is_skipped("tmp_import"));
        assert!(!filter.is_skipped("posts"));
    }
}
