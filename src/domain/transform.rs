//! Named record transforms
//!
//! A [`ServerTransform`] names a transform the record store applies while
//! fetching records, plus its parameters. Jobs receive it as a property
//! value of the form `name,param1,value1,param2,value2`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::{DatamoveError, Result};

/// A transform name and its ordered parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerTransform {
    /// Transform name
    pub name: String,

    /// Parameter name/value pairs, in the order given
    pub parameters: Vec<(String, String)>,
}

impl ServerTransform {
    /// Create a transform without parameters
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parameters: Vec::new(),
        }
    }

    /// Add a parameter
    pub fn with_parameter(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.push((name.into(), value.into()));
        self
    }

    /// Look up a parameter value by name
    pub fn parameter(&self, name: &str) -> Option<&str> {
        self.parameters
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Parse a property value such as `myTransform,param1,value1`
    ///
    /// # Errors
    ///
    /// Returns a configuration error when the name is empty or a parameter
    /// name has no matching value.
    ///
    /// # Examples
    ///
    /// ```
    /// use datamove::domain::ServerTransform;
    ///
    /// let t = ServerTransform::parse_property_value("myTransform,param1,value1").unwrap();
    /// assert_eq!(t.name, "myTransform");
    /// assert_eq!(t.parameter("param1"), Some("value1"));
    /// ```
    pub fn parse_property_value(value: &str) -> Result<Self> {
        let mut tokens = value.split(',');
        let name = tokens.next().unwrap_or_default().trim();
        if name.is_empty() {
            return Err(DatamoveError::Configuration(
                "Transform name cannot be empty".to_string(),
            ));
        }

        let rest: Vec<&str> = tokens.collect();
        if rest.len() % 2 != 0 {
            return Err(DatamoveError::Configuration(format!(
                "Transform parameter '{}' has no value",
                rest[rest.len() - 1]
            )));
        }

        let parameters = rest
            .chunks(2)
            .map(|pair| (pair[0].to_string(), pair[1].to_string()))
            .collect();

        Ok(Self {
            name: name.to_string(),
            parameters,
        })
    }
}

impl FromStr for ServerTransform {
    type Err = DatamoveError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse_property_value(s)
    }
}

impl fmt::Display for ServerTransform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        for (name, value) in &self.parameters {
            write!(f, ",{name},{value}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_two_params() {
        let t = ServerTransform::parse_property_value("myTransform,param1,value1,param2,value2")
            .unwrap();
        assert_eq!(t.name, "myTransform");
        assert_eq!(t.parameter("param1"), Some("value1"));
        assert_eq!(t.parameter("param2"), Some("value2"));
        assert_eq!(t.to_string(), "myTransform,param1,value1,param2,value2");
    }

    #[test]
    fn test_parse_no_params() {
        let t = ServerTransform::parse_property_value("myTransform").unwrap();
        assert_eq!(t.name, "myTransform");
        assert!(t.parameters.is_empty());
    }

    #[test]
    fn test_parse_dangling_param_is_error() {
        let err = ServerTransform::parse_property_value("t,param1").unwrap_err();
        assert!(err.to_string().contains("param1"));
    }

    #[test]
    fn test_parse_empty_name_is_error() {
        assert!(ServerTransform::parse_property_value("").is_err());
        assert!(ServerTransform::parse_property_value(",a,b").is_err());
    }

    #[test]
    fn test_builder() {
        let t = ServerTransform::new("upper").with_parameter("field", "name");
        assert_eq!(t.parameter("field"), Some("name"));
        assert_eq!(t.parameter("missing"), None);
    }
}
