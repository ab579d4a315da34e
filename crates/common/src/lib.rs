// ================
// common/src/lib.rs
// ================
//! Wire types for the balance gateway XML protocol.
//! This module defines the request and response envelopes exchanged
//! over the single HTTP endpoint, plus their XML codecs.

use quick_xml::events::{attributes::AttrError, BytesStart, Event};
use quick_xml::Reader;
use serde::Serialize;
use thiserror::Error;

/// Wire name of the account creation request type
pub const CREATE_AGT: &str = "CREATE-AGT";
/// Wire name of the balance query request type
pub const GET_BALANCE: &str = "GET-BALANCE";

/// XML declaration written ahead of every response body
pub const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;

const REQUEST_TYPE_TAG: &[u8] = b"request-type";
const EXTRA_TAG: &[u8] = b"extra";
const NAME_ATTR: &[u8] = b"name";

/// A named string value carried in either envelope
///
/// ```xml
/// <extra name="login">123456</extra>
/// ```
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Extra {
    /// Name attribute; extras without one are ignored on lookup
    #[serde(rename = "@name", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Element text, exactly as sent
    #[serde(rename = "$text")]
    pub value: String,
}

impl Extra {
    /// Create a named extra
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            value: value.into(),
        }
    }
}

/// Reasons a request document is not a usable envelope
#[derive(Error, Debug)]
pub enum EnvelopeError {
    #[error(transparent)]
    Xml(#[from] quick_xml::Error),

    #[error(transparent)]
    Attribute(#[from] AttrError),

    #[error(transparent)]
    Encoding(#[from] std::str::Utf8Error),

    #[error("document has no root element")]
    MissingRoot,

    #[error("unexpected end of document")]
    UnexpectedEof,

    #[error("unexpected content after the root element")]
    TrailingContent,

    #[error("unexpected text outside the root element")]
    StrayText,

    #[error("<{0}> must not contain child elements")]
    NestedElement(&'static str),

    #[error("<request-type> given more than once")]
    DuplicateRequestType,
}

/// Inbound envelope, as read off the wire
///
/// Text values are kept byte for byte, whitespace included. Unknown
/// elements under the root are skipped. Nothing here is validated beyond
/// the envelope shape; field checks happen one layer up.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestEnvelope {
    /// Declared request type (`CREATE-AGT`, `GET-BALANCE`, ...)
    pub request_type: Option<String>,
    /// Extras in document order
    pub extras: Vec<Extra>,
}

impl RequestEnvelope {
    /// Parse an envelope from an XML document.
    ///
    /// The document holds exactly one root element. Only whitespace,
    /// comments and processing instructions may follow it.
    pub fn from_xml(xml: &str) -> Result<Self, EnvelopeError> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(false);

        let mut envelope = None;
        loop {
            match reader.read_event()? {
                Event::Start(_) if envelope.is_none() => {
                    envelope = Some(Self::read_root(&mut reader)?);
                },
                Event::Empty(_) if envelope.is_none() => envelope = Some(Self::default()),
                Event::Start(_) | Event::Empty(_) | Event::End(_) | Event::CData(_) => {
                    return Err(EnvelopeError::TrailingContent);
                },
                Event::Text(text) if !is_blank(&text) => {
                    return Err(match envelope {
                        Some(_) => EnvelopeError::TrailingContent,
                        None => EnvelopeError::StrayText,
                    });
                },
                Event::Eof => break,
                _ => {},
            }
        }

        envelope.ok_or(EnvelopeError::MissingRoot)
    }

    fn read_root(reader: &mut Reader<&[u8]>) -> Result<Self, EnvelopeError> {
        let mut envelope = Self::default();
        loop {
            match reader.read_event()? {
                Event::Start(element) => match element.name().as_ref() {
                    REQUEST_TYPE_TAG => {
                        let value = read_text(reader, "request-type")?;
                        envelope.set_request_type(value)?;
                    },
                    EXTRA_TAG => {
                        let name = extra_name(&element)?;
                        let value = read_text(reader, "extra")?;
                        envelope.extras.push(Extra { name, value });
                    },
                    _ => {
                        reader.read_to_end(element.name())?;
                    },
                },
                Event::Empty(element) => match element.name().as_ref() {
                    REQUEST_TYPE_TAG => envelope.set_request_type(String::new())?,
                    EXTRA_TAG => {
                        let name = extra_name(&element)?;
                        envelope.extras.push(Extra {
                            name,
                            value: String::new(),
                        });
                    },
                    _ => {},
                },
                Event::End(_) => return Ok(envelope),
                Event::Eof => return Err(EnvelopeError::UnexpectedEof),
                _ => {},
            }
        }
    }

    fn set_request_type(&mut self, value: String) -> Result<(), EnvelopeError> {
        if self.request_type.is_some() {
            return Err(EnvelopeError::DuplicateRequestType);
        }
        self.request_type = Some(value);
        Ok(())
    }

    /// Value of the first extra with the given name
    pub fn extra(&self, name: &str) -> Option<&str> {
        self.extras
            .iter()
            .find(|extra| extra.name.as_deref() == Some(name))
            .map(|extra| extra.value.as_str())
    }
}

/// Collect the text of a leaf element up to its end tag
fn read_text(reader: &mut Reader<&[u8]>, element: &'static str) -> Result<String, EnvelopeError> {
    let mut value = String::new();
    loop {
        match reader.read_event()? {
            Event::Text(text) => value.push_str(&text.unescape()?),
            Event::CData(data) => value.push_str(std::str::from_utf8(&data)?),
            Event::Start(_) | Event::Empty(_) => return Err(EnvelopeError::NestedElement(element)),
            Event::End(_) => return Ok(value),
            Event::Eof => return Err(EnvelopeError::UnexpectedEof),
            _ => {},
        }
    }
}

fn extra_name(element: &BytesStart<'_>) -> Result<Option<String>, EnvelopeError> {
    for attribute in element.attributes() {
        let attribute = attribute?;
        if attribute.key.as_ref() == NAME_ATTR {
            return Ok(Some(attribute.unescape_value()?.into_owned()));
        }
    }
    Ok(None)
}

fn is_blank(text: &[u8]) -> bool {
    text.iter().all(u8::is_ascii_whitespace)
}

/// Outbound envelope
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename = "response")]
pub struct ResponseEnvelope {
    /// Numeric result code
    #[serde(rename = "result-code")]
    pub result_code: u8,
    /// Extras in insertion order
    #[serde(rename = "extra", skip_serializing_if = "Vec::is_empty")]
    pub extras: Vec<Extra>,
}

impl ResponseEnvelope {
    pub fn new(result_code: u8) -> Self {
        Self {
            result_code,
            extras: Vec::new(),
        }
    }

    /// Append an extra; duplicate names are kept
    pub fn add_extra(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.extras.push(Extra::new(name, value));
    }

    /// Serialize to a full XML document, declaration included
    pub fn to_xml(&self) -> Result<String, quick_xml::SeError> {
        let body = quick_xml::se::to_string(self)?;
        Ok(format!("{XML_DECLARATION}{body}"))
    }
}
