//! Record selection
//!
//! A [`Selection`] defines the record set a job operates on. It is handed to
//! the record store, which resolves it to an ordered list of URIs.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::{DatamoveError, Result};

/// The query that selects a job's records
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Selection {
    /// An explicit list of URIs
    Uris(Vec<String>),
    /// Every record belonging to at least one of the collections
    Collections(Vec<String>),
    /// Every URI matching a wildcard pattern (`*` any run, `?` one character)
    UriPattern(String),
}

impl Selection {
    /// Parse a comma-delimited property value into a list, dropping blanks
    pub fn split_list(value: &str) -> Vec<String> {
        value
            .split(',')
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(|s| s.to_string())
            .collect()
    }

    /// Compile a wildcard pattern into an anchored regex
    ///
    /// # Examples
    ///
    /// ```
    /// use datamove::domain::Selection;
    ///
    /// let re = Selection::wildcard_regex("/orders/*.json").unwrap();
    /// assert!(re.is_match("/orders/2024/1.json"));
    /// assert!(!re.is_match("/customers/1.json"));
    /// ```
    pub fn wildcard_regex(pattern: &str) -> Result<Regex> {
        let mut expr = String::with_capacity(pattern.len() + 8);
        expr.push('^');
        for c in pattern.chars() {
            match c {
                '*' => expr.push_str(".*"),
                '?' => expr.push('.'),
                other => expr.push_str(&regex::escape(&other.to_string())),
            }
        }
        expr.push('$');
        Regex::new(&expr).map_err(|e| {
            DatamoveError::Configuration(format!("Invalid URI pattern '{pattern}': {e}"))
        })
    }

    /// Check the selection can be resolved
    pub fn validate(&self) -> Result<()> {
        match self {
            Selection::Uris(uris) if uris.is_empty() => Err(DatamoveError::Validation(
                "URI selection cannot be empty".to_string(),
            )),
            Selection::Collections(collections) if collections.is_empty() => Err(
                DatamoveError::Validation("Collection selection cannot be empty".to_string()),
            ),
            Selection::UriPattern(pattern) => {
                if pattern.trim().is_empty() {
                    return Err(DatamoveError::Validation(
                        "URI pattern cannot be empty".to_string(),
                    ));
                }
                Self::wildcard_regex(pattern).map(|_| ())
            }
            _ => Ok(()),
        }
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selection::Uris(uris) => write!(f, "with URIs {uris:?}"),
            Selection::Collections(collections) => write!(f, "in collections {collections:?}"),
            Selection::UriPattern(pattern) => write!(f, "matching URI pattern [{pattern}]"),
        }
    }
}
