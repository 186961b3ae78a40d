//! Record permissions
//!
//! A permission grants one capability on a record to one role. Permissions
//! are written as a comma-delimited list of role and capability pairs, for
//! example `reader,read,writer,update`.

use super::errors::DatamoveError;
use super::result::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// What a role may do with a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Capability {
    /// Read the record
    Read,
    /// Replace the record
    Update,
    /// Create the record
    Insert,
    /// Execute the record as a module
    Execute,
    /// Change properties and metadata without replacing content
    NodeUpdate,
}

impl FromStr for Capability {
    type Err = DatamoveError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "read" => Ok(Capability::Read),
            "update" => Ok(Capability::Update),
            "insert" => Ok(Capability::Insert),
            "execute" => Ok(Capability::Execute),
            "node-update" => Ok(Capability::NodeUpdate),
            other => Err(DatamoveError::Validation(format!(
                "'{other}' is not a capability; expected read, update, insert, execute or node-update"
            ))),
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Capability::Read => "read",
            Capability::Update => "update",
            Capability::Insert => "insert",
            Capability::Execute => "execute",
            Capability::NodeUpdate => "node-update",
        };
        f.write_str(name)
    }
}

/// A role and the capability it is granted
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Permission {
    /// Role name
    pub role: String,

    /// Granted capability
    pub capability: Capability,
}

impl Permission {
    /// Create a permission
    pub fn new(role: impl Into<String>, capability: Capability) -> Self {
        Self {
            role: role.into(),
            capability,
        }
    }

    /// Parse `role1,capability1,role2,capability2,...`
    ///
    /// # Errors
    ///
    /// Returns a validation error when the list is empty, has an odd number
    /// of tokens, names a blank role, or names an unknown capability.
    ///
    /// # Examples
    ///
    /// ```
    /// use datamove::domain::{Capability, Permission};
    ///
    /// let permissions = Permission::parse_list("reader,read,writer,update").unwrap();
    /// assert_eq!(permissions[1], Permission::new("writer", Capability::Update));
    /// ```
    pub fn parse_list(value: &str) -> Result<Vec<Permission>> {
        let tokens: Vec<&str> = value.split(',').map(str::trim).collect();
        if value.trim().is_empty() {
            return Err(DatamoveError::Validation(
                "at least one role and capability pair is required".to_string(),
            ));
        }
        if tokens.len() % 2 != 0 {
            return Err(DatamoveError::Validation(format!(
                "permissions must be role and capability pairs, got {} values",
                tokens.len()
            )));
        }

        tokens
            .chunks(2)
            .map(|pair| {
                if pair[0].is_empty() {
                    return Err(DatamoveError::Validation(
                        "permission role cannot be empty".to_string(),
                    ));
                }
                Ok(Permission::new(pair[0], pair[1].parse()?))
            })
            .collect()
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.role, self.capability)
    }
}
