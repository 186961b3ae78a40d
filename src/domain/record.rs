//! Retrieved records
//!
//! A [`Record`] is owned by an export listener for the duration of one batch
//! export and dropped afterwards.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Format tag of a record's content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordFormat {
    /// Structured JSON content
    Json,
    /// Structured XML content
    Xml,
    /// Unstructured text
    Text,
    /// Opaque bytes
    Binary,
}

impl RecordFormat {
    /// Infer the format from the extension of a URI
    ///
    /// # Examples
    ///
    /// ```
    /// use datamove::domain::RecordFormat;
    ///
    /// assert_eq!(RecordFormat::from_uri("/a/b/c.json"), RecordFormat::Json);
    /// assert_eq!(RecordFormat::from_uri("/doc.XML"), RecordFormat::Xml);
    /// assert_eq!(RecordFormat::from_uri("/image.png"), RecordFormat::Binary);
    /// ```
    pub fn from_uri(uri: &str) -> Self {
        let name = uri.rsplit('/').next().unwrap_or(uri);
        let extension = match name.rsplit_once('.') {
            Some((_, ext)) => ext.to_ascii_lowercase(),
            None => return RecordFormat::Binary,
        };
        match extension.as_str() {
            "json" => RecordFormat::Json,
            "xml" => RecordFormat::Xml,
            "txt" | "csv" | "md" | "html" | "text" => RecordFormat::Text,
            _ => RecordFormat::Binary,
        }
    }

    /// Whether the format carries structured content
    pub fn is_structured(&self) -> bool {
        matches!(self, RecordFormat::Json | RecordFormat::Xml)
    }
}

impl fmt::Display for RecordFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RecordFormat::Json => "json",
            RecordFormat::Xml => "xml",
            RecordFormat::Text => "text",
            RecordFormat::Binary => "binary",
        };
        write!(f, "{s}")
    }
}

impl FromStr for RecordFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(RecordFormat::Json),
            "xml" => Ok(RecordFormat::Xml),
            "text" => Ok(RecordFormat::Text),
            "binary" => Ok(RecordFormat::Binary),
            _ => Err(format!(
                "Invalid record format '{s}'. Must be one of: json, xml, text, binary"
            )),
        }
    }
}

/// A single retrieved document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// Identifying key
    pub uri: String,

    /// Raw content bytes
    pub content: Vec<u8>,

    /// Format tag
    pub format: RecordFormat,
}

impl Record {
    /// Create a record, inferring its format from the URI
    pub fn new(uri: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        let uri = uri.into();
        let format = RecordFormat::from_uri(&uri);
        Self {
            uri,
            content: content.into(),
            format,
        }
    }

    /// Override the inferred format
    pub fn with_format(mut self, format: RecordFormat) -> Self {
        self.format = format;
        self
    }

    /// Content interpreted as UTF-8
    pub fn content_as_str(&self) -> crate::domain::Result<&str> {
        std::str::from_utf8(&self.content).map_err(|e| {
            crate::domain::DatamoveError::Serialization(format!(
                "Record {} is not valid UTF-8: {e}",
                self.uri
            ))
        })
    }
}
