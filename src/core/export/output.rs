//! Record output generation

use crate::domain::{DatamoveError, Record, RecordFormat, Result};
use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

/// Declaration written by [`OutputFormat::XmlWithDeclaration`] when a record has none
pub const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;

/// How a record's bytes are written to an output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Bytes unchanged
    #[default]
    Raw,

    /// JSON records re-serialized with indentation; other formats unchanged
    PrettyJson,

    /// XML records without a leading `<?xml ...?>` declaration
    XmlWithoutDeclaration,

    /// XML records with a leading declaration, added when missing
    XmlWithDeclaration,
}

impl OutputFormat {
    /// Bytes to write for a record
    ///
    /// # Errors
    ///
    /// Returns an error if a JSON or XML record cannot be decoded for rewriting.
    pub fn render<'a>(&self, record: &'a Record) -> Result<Cow<'a, [u8]>> {
        match (self, record.format) {
            (OutputFormat::PrettyJson, RecordFormat::Json) => {
                let value: serde_json::Value =
                    serde_json::from_slice(&record.content).map_err(|e| {
                        DatamoveError::Serialization(format!(
                            "Record {} is not valid JSON: {e}",
                            record.uri
                        ))
                    })?;
                Ok(Cow::Owned(serde_json::to_vec_pretty(&value)?))
            }
            (OutputFormat::XmlWithoutDeclaration, RecordFormat::Xml) => {
                let text = record.content_as_str()?;
                match strip_xml_declaration(text) {
                    Some(body) => Ok(Cow::Owned(body.as_bytes().to_vec())),
                    None => Ok(Cow::Borrowed(&record.content)),
                }
            }
            (OutputFormat::XmlWithDeclaration, RecordFormat::Xml) => {
                let text = record.content_as_str()?;
                if strip_xml_declaration(text).is_some() {
                    Ok(Cow::Borrowed(&record.content))
                } else {
                    Ok(Cow::Owned(format!("{XML_DECLARATION}\n{text}").into_bytes()))
                }
            }
            _ => Ok(Cow::Borrowed(&record.content)),
        }
    }
}

/// Text following a leading XML declaration, or `None` if there is none
fn strip_xml_declaration(text: &str) -> Option<&str> {
    let trimmed = text.trim_start_matches('\u{feff}').trim_start();
    if !trimmed.starts_with("<?xml") {
        return None;
    }
    let end = trimmed.find("?>")?;
    Some(trimmed[end + 2..].trim_start())
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OutputFormat::Raw => "raw",
            OutputFormat::PrettyJson => "pretty-json",
            OutputFormat::XmlWithoutDeclaration => "xml",
            OutputFormat::XmlWithDeclaration => "xml-with-declaration",
        };
        f.write_str(name)
    }
}

impl FromStr for OutputFormat {
    type Err = DatamoveError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "raw" => Ok(OutputFormat::Raw),
            "pretty-json" | "json" => Ok(OutputFormat::PrettyJson),
            "xml" => Ok(OutputFormat::XmlWithoutDeclaration),
            "xml-with-declaration" => Ok(OutputFormat::XmlWithDeclaration),
            other => Err(DatamoveError::Configuration(format!(
                "Invalid output format: {other}. Must be one of: raw, pretty-json, xml, xml-with-declaration"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_is_unchanged() {
        let record = Record::new("/a.json", r#"{"a":1}"#);
        assert_eq!(&*OutputFormat::Raw.render(&record).unwrap(), br#"{"a":1}"#);
    }

    #[test]
    fn test_pretty_json() {
        let record = Record::new("/a.json", r#"{"a":1}"#);
        let out = OutputFormat::PrettyJson.render(&record).unwrap();
        assert_eq!(std::str::from_utf8(&out).unwrap(), "{\n  \"a\": 1\n}");

        let text = Record::new("/a.txt", "not json");
        assert_eq!(&*OutputFormat::PrettyJson.render(&text).unwrap(), b"not json");

        let broken = Record::new("/b.json", "{");
        assert!(OutputFormat::PrettyJson.render(&broken).is_err());
    }

    #[test]
    fn test_xml_declaration_removed() {
        let record = Record::new(
            "/a.xml",
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<doc>1</doc>",
        );
        let out = OutputFormat::XmlWithoutDeclaration.render(&record).unwrap();
        assert_eq!(&*out, b"<doc>1</doc>");

        let bare = Record::new("/b.xml", "<doc>2</doc>");
        let out = OutputFormat::XmlWithoutDeclaration.render(&bare).unwrap();
        assert_eq!(&*out, b"<doc>2</doc>");
    }

    #[test]
    fn test_xml_declaration_added() {
        let bare = Record::new("/b.xml", "<doc>2</doc>");
        let out = OutputFormat::XmlWithDeclaration.render(&bare).unwrap();
        assert_eq!(
            std::str::from_utf8(&out).unwrap(),
            format!("{XML_DECLARATION}\n<doc>2</doc>")
        );
    }

    #[test]
    fn test_from_str() {
        assert_eq!("xml".parse::<OutputFormat>().unwrap(), OutputFormat::XmlWithoutDeclaration);
        assert_eq!("RAW".parse::<OutputFormat>().unwrap(), OutputFormat::Raw);
        assert!("yaml".parse::<OutputFormat>().is_err());
    }
}
